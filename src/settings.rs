//! Functions for loading runtime settings.

use serde::{Deserialize, Serialize};

use crate::errors::*;

/// A structure containing configuration data for the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Whether `create` and `destroy` emit entity notifications. The `_silent`
    /// variants never do.
    pub notify: bool,
    /// Sets the number of entity slots pre-allocated for the default world.
    pub entity_capacity: usize,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        RuntimeSettings {
            notify: true,
            entity_capacity: 0,
        }
    }
}

impl RuntimeSettings {
    /// Parses settings from a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Options recorded on a world when it is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldOptions {
    /// Hint that the world is meant to be driven from its own thread. Access is
    /// still serialized by the caller.
    pub supports_multithreading: bool,
    /// Sets the number of entity slots pre-allocated, rounded up to a power of two.
    pub entity_capacity: usize,
    pub name: Option<String>,
}

impl Default for WorldOptions {
    fn default() -> Self {
        WorldOptions {
            supports_multithreading: false,
            entity_capacity: 0,
            name: None,
        }
    }
}

impl WorldOptions {
    pub fn named<T: Into<String>>(name: T) -> Self {
        WorldOptions {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Parses options from a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let settings = RuntimeSettings::from_json("{}").unwrap();
        assert_eq!(settings, RuntimeSettings::default());
        assert!(settings.notify);

        let options = WorldOptions::from_json(r#"{ "name": "arena", "entity_capacity": 100 }"#).unwrap();
        assert_eq!(options.name.as_ref().map(|v| v.as_str()), Some("arena"));
        assert_eq!(options.entity_capacity, 100);
        assert!(!options.supports_multithreading);
    }

    #[test]
    fn malformed() {
        match RuntimeSettings::from_json("{ notify: }") {
            Err(Error::Settings(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}

use crate::ecs::{ComponentHandle, Entity};

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Entity {} is not alive.", _0)]
    InvalidEntity(Entity),
    #[fail(display = "Component {} is not present on {}.", component, owner)]
    ComponentNotPresent {
        owner: String,
        component: &'static str,
    },
    #[fail(display = "Component type {} has never been registered.", _0)]
    UnknownComponentType(String),
    #[fail(display = "Index {} is out of range (len: {}).", index, len)]
    OutOfRange { index: usize, len: usize },
    #[fail(
        display = "{} does not fit in presence masks of {} blocks.",
        handle, stride
    )]
    MaskTooLarge {
        handle: ComponentHandle,
        stride: usize,
    },
    #[fail(display = "Value is not of component type {}.", _0)]
    TypeMismatch(&'static str),
    #[fail(display = "Prefab {} already exists.", _0)]
    DuplicatePrefab(String),
    #[fail(display = "Malformed settings: {}", _0)]
    Settings(String),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<::serde_json::Error> for Error {
    fn from(err: ::serde_json::Error) -> Self {
        Error::Settings(err.to_string())
    }
}

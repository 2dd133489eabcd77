//! # What is This?
//!
//! A small, data-oriented entity component system. Components are plain data,
//! attached to generational entity handles that live in isolated worlds. Each
//! world tracks component presence with 256-bit wide bitsets and stores values in
//! sparse sets, so queries boil down to scanning bitsets.
//!
//! ```
//! # use signals::prelude::*;
//! #[derive(Debug, Clone, PartialEq)]
//! struct Position(i32, i32);
//! declare_component!(Position);
//!
//! let mut runtime = Runtime::new();
//! let e = runtime.create(World::DEFAULT).unwrap();
//! runtime.set(e, Position(1, 2)).unwrap();
//!
//! assert_eq!(*runtime.get::<Position>(e).unwrap(), Position(1, 2));
//! assert_eq!(runtime.query(World::DEFAULT).with::<Position>().iter().count(), 1);
//!
//! runtime.destroy(e);
//! assert!(!runtime.is_valid(e));
//! ```

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

#[macro_use]
pub mod ecs;
pub mod errors;
pub mod prelude;
pub mod settings;

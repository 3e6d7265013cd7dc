//! Error types shared by every subsystem.
//!
//! Each concern has its own enum in [`types`]; errors are converted into a
//! status event or a typed result at the nearest component boundary.

pub mod types;

pub use types::{
    ConfigError, ConnectionError, ControllerError, FetchError, ParseError, TransportError,
};

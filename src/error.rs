//! Error taxonomy for registry and engine operations.
//!
//! These are surfaced to the caller of the failing operation; the event loop
//! itself never dies on one of them. Geometry never errors at all, it clamps.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A group with this name already exists
    #[error("group '{0}' already exists")]
    DuplicateName(String),

    /// Lookup of an unknown group or window
    #[error("no such {kind}: '{name}'")]
    NotFound { kind: &'static str, name: String },
}

impl Error {
    pub fn group_not_found(name: impl Into<String>) -> Self {
        Error::NotFound { kind: "group", name: name.into() }
    }

    pub fn window_not_found(id: u32) -> Self {
        Error::NotFound { kind: "window", name: format!("0x{:x}", id) }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! Core types & traits: error taxonomy and capability contracts.

pub mod capability;
pub mod error;

pub use error::{ErrorKind, Result, SolvedAcError};

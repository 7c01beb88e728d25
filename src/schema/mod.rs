//! Schema descriptor and dataset bootstrap.

pub mod builtin;

pub use builtin::{bootstrap, SCHEMA_DESCRIPTOR};

//! Core data types for the question pipeline.
//!
//! Defines the values that flow through a single request:
//! - `Question`: Validated user input
//! - `SyntheticQuery`: Untrusted SQL produced by the language model
//! - `QueryResult`: Column names plus ordered row tuples
//! - `Summary`: Natural-language answer derived from the three above
//! - `FinqError`: Error taxonomy for every stage
//! - `Result`: Convenient result type alias

pub mod error;
pub mod query;

pub use error::{FinqError, Result, Stage};
pub use query::{Question, QueryResult, Scalar, Summary, SyntheticQuery};

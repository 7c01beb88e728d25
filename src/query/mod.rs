//! Safety gate, store boundary and gated executor.

pub mod executor;
pub mod gate;
pub mod store;

pub use executor::QueryExecutor;
pub use gate::{is_safe_read, GateMode, SafetyGate};
pub use store::{ReadableStore, SqliteStore};

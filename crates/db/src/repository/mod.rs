//! Repository functions — one function per database operation.
//!
//! Every function takes a `&DbPool` and returns a `Result<T, DbError>`.
//! No business logic, no domain types — pure SQL.
//!
//! Queries here use the runtime-checked `sqlx::query[_as]` API rather than
//! the compile-time `query!`/`query_as!` macros: those require either a live
//! database or a checked-in `.sqlx` offline cache at compile time, which
//! this workspace does not assume. See DESIGN.md.

pub mod access_logs;
pub mod execution_logs;
pub mod logs;
pub mod node_call_records;
pub mod node_properties;
pub mod nodes;
pub mod steps;
pub mod tasks;
pub mod workflow_usage_records;
pub mod workflows;

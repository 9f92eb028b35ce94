//! Daily cross-database metrics transfer.
//!
//! Once per day, at a configured wall-clock time, the [`scheduler::DailyScheduler`]
//! triggers one [`pipeline::TransferPipeline`] run: every metric in the
//! [`catalog`] is evaluated against the analytical Postgres source and the
//! resulting count is appended as a `(date, count)` row to the matching
//! table in the operational MySQL destination.

pub mod catalog;
pub mod destination;
pub mod error;
pub mod pipeline;
pub mod scheduler;
pub mod shutdown;
pub mod source;
pub mod types;

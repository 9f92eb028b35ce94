mod tracing;

pub use tracing::*;

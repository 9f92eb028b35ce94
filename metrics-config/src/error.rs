use thiserror::Error;

/// Errors raised while assembling or validating the startup configuration.
///
/// All of these are fatal: the process refuses to start with a broken
/// configuration instead of degrading into an unusable scheduler.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The source DSN flag was provided but empty.
    #[error("the source DSN must not be empty")]
    MissingSourceDsn,

    /// The destination DSN flag was provided but empty.
    #[error("the destination DSN must not be empty")]
    MissingDestinationDsn,

    /// The source DSN could not be parsed as a Postgres connection URL.
    #[error("invalid source DSN: {0}")]
    InvalidSourceDsn(#[source] sqlx::Error),

    /// The destination DSN could not be parsed as a MySQL connection URL.
    #[error("invalid destination DSN: {0}")]
    InvalidDestinationDsn(#[source] sqlx::Error),

    /// The execution time string is not a valid `HH:MM` wall-clock time.
    #[error("invalid execution time `{value}`: {reason}")]
    InvalidExecutionTime {
        value: String,
        reason: &'static str,
    },
}

use thiserror::Error;

/// Convenient result type for transfer operations using [`TransferError`].
pub type TransferResult<T> = Result<T, TransferError>;

/// Errors raised while moving metrics from the source to the destination.
///
/// Connection variants are fatal for the process: a scheduler with no usable
/// connections has nothing left to do and an external supervisor restart is
/// the intended recovery path. Query and write variants stay isolated to a
/// single metric and are downgraded to per-metric outcomes by the pipeline.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Opening the connection to the source database failed.
    #[error("failed to connect to the source database: {0}")]
    SourceConnection(#[source] sqlx::Error),

    /// Opening the connection to the destination database failed.
    #[error("failed to connect to the destination database: {0}")]
    DestinationConnection(#[source] sqlx::Error),

    /// A source query failed to execute or returned an undecodable value.
    #[error("source query for metric `{key}` failed: {source}")]
    SourceQuery {
        key: String,
        #[source]
        source: sqlx::Error,
    },

    /// A source query returned no rows. Absence is treated as a failure,
    /// never as a count of zero.
    #[error("source query for metric `{key}` returned no rows")]
    MissingCount { key: String },

    /// A source query returned more than one row where a single scalar was
    /// expected.
    #[error("source query for metric `{key}` returned {rows} rows, expected exactly one")]
    UnexpectedRowCount { key: String, rows: usize },

    /// A source query produced a negative value where a count was expected.
    #[error("source query for metric `{key}` returned a negative count: {count}")]
    NegativeCount { key: String, count: i64 },

    /// Inserting a row into a destination table failed for a reason other
    /// than a duplicate date.
    #[error("failed to insert into destination table `{table}`: {source}")]
    DestinationWrite {
        table: String,
        #[source]
        source: sqlx::Error,
    },
}

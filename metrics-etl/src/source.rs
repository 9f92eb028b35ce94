use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection};
use std::future::Future;

use crate::catalog::MetricDefinition;
use crate::error::{TransferError, TransferResult};

/// Capability to evaluate one metric query into a scalar count.
///
/// Split out as a trait so the pipeline orchestration can be exercised with
/// in-memory fakes.
pub trait CountSource {
    /// Evaluates the metric's query and returns its count.
    fn read_count(
        &mut self,
        metric: &MetricDefinition,
    ) -> impl Future<Output = TransferResult<u64>> + Send;
}

/// Reads scalar counts from the analytical Postgres database.
///
/// Owns a dedicated connection for the duration of one pipeline run; the
/// pipeline closes it unconditionally at run end.
#[derive(Debug)]
pub struct SourceReader {
    conn: PgConnection,
}

impl SourceReader {
    /// Opens a fresh connection to the source database.
    pub async fn connect(options: &PgConnectOptions) -> TransferResult<Self> {
        let conn = options
            .connect()
            .await
            .map_err(TransferError::SourceConnection)?;

        Ok(Self { conn })
    }

    /// Closes the underlying connection.
    pub async fn close(self) -> Result<(), sqlx::Error> {
        self.conn.close().await
    }
}

impl CountSource for SourceReader {
    /// Expects exactly one row with one integer column.
    ///
    /// Zero rows, multiple rows, a NULL value, or a negative value are
    /// failures: absence is never coerced into a count of zero.
    async fn read_count(&mut self, metric: &MetricDefinition) -> TransferResult<u64> {
        let rows: Vec<i64> = sqlx::query_scalar(&metric.query)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|source| TransferError::SourceQuery {
                key: metric.key.clone(),
                source,
            })?;

        scalar_count(&metric.key, &rows)
    }
}

/// Reduces a result set to the single non-negative count it must contain.
fn scalar_count(key: &str, rows: &[i64]) -> TransferResult<u64> {
    let count = match rows {
        [] => {
            return Err(TransferError::MissingCount {
                key: key.to_string(),
            });
        }
        [count] => *count,
        _ => {
            return Err(TransferError::UnexpectedRowCount {
                key: key.to_string(),
                rows: rows.len(),
            });
        }
    };

    u64::try_from(count).map_err(|_| TransferError::NegativeCount {
        key: key.to_string(),
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_row_yields_the_count() {
        assert_eq!(scalar_count("active_machines_count", &[7]).unwrap(), 7);
        assert_eq!(scalar_count("lost_users_count", &[0]).unwrap(), 0);
    }

    #[test]
    fn test_no_rows_is_a_failure_not_zero() {
        assert!(matches!(
            scalar_count("lost_users_count", &[]),
            Err(TransferError::MissingCount { .. })
        ));
    }

    #[test]
    fn test_multiple_rows_are_rejected() {
        assert!(matches!(
            scalar_count("active_machines_count", &[7, 8]),
            Err(TransferError::UnexpectedRowCount { rows: 2, .. })
        ));
    }

    #[test]
    fn test_negative_count_is_rejected() {
        assert!(matches!(
            scalar_count("active_machines_count", &[-1]),
            Err(TransferError::NegativeCount { count: -1, .. })
        ));
    }
}

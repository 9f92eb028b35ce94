use chrono::NaiveDate;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};
use std::future::Future;

use crate::error::{TransferError, TransferResult};

/// Result of a destination insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new `(date, count)` row was inserted.
    Inserted,
    /// The table already holds a row for this date. The destination schema
    /// keys each table by date, so a same-day re-run lands here.
    DuplicateDate,
}

/// Capability to append one `(date, count)` row to a named table.
///
/// Split out as a trait so the pipeline orchestration can be exercised with
/// in-memory fakes.
pub trait CountSink {
    /// Inserts one row into the table identified by `table`.
    fn write_count(
        &mut self,
        table: &str,
        date: NaiveDate,
        count: u64,
    ) -> impl Future<Output = TransferResult<WriteOutcome>> + Send;
}

/// Appends daily counter rows to the operational MySQL database.
///
/// Owns a dedicated connection for the duration of one pipeline run; the
/// pipeline closes it unconditionally at run end.
#[derive(Debug)]
pub struct DestinationWriter {
    conn: MySqlConnection,
}

impl DestinationWriter {
    /// Opens a fresh connection to the destination database.
    pub async fn connect(options: &MySqlConnectOptions) -> TransferResult<Self> {
        let conn = options
            .connect()
            .await
            .map_err(TransferError::DestinationConnection)?;

        Ok(Self { conn })
    }

    /// Closes the underlying connection.
    pub async fn close(self) -> Result<(), sqlx::Error> {
        self.conn.close().await
    }
}

impl CountSink for DestinationWriter {
    /// A unique-key violation maps to [`WriteOutcome::DuplicateDate`] instead
    /// of an error; any other database failure is a genuine write error.
    async fn write_count(
        &mut self,
        table: &str,
        date: NaiveDate,
        count: u64,
    ) -> TransferResult<WriteOutcome> {
        // Table names come from the fixed catalog, never from user input.
        let statement = format!("INSERT INTO {table} (date, count) VALUES (?, ?)");

        match sqlx::query(&statement)
            .bind(date)
            .bind(count)
            .execute(&mut self.conn)
            .await
        {
            Ok(_) => Ok(WriteOutcome::Inserted),
            Err(sqlx::Error::Database(db_error)) if db_error.is_unique_violation() => {
                Ok(WriteOutcome::DuplicateDate)
            }
            Err(source) => Err(TransferError::DestinationWrite {
                table: table.to_string(),
                source,
            }),
        }
    }
}

use chrono::{Local, NaiveDate};
use sqlx::mysql::MySqlConnectOptions;
use sqlx::postgres::PgConnectOptions;
use tracing::{error, info, warn};

use crate::catalog::{MetricDefinition, metric_catalog};
use crate::destination::{CountSink, DestinationWriter, WriteOutcome};
use crate::error::TransferResult;
use crate::source::{CountSource, SourceReader};
use crate::types::{MetricOutcome, MetricReport, RunReport};

/// One-run orchestrator: evaluates every catalog metric against the source
/// and appends the results to the destination.
///
/// Each run opens its own pair of connections and closes them on every exit
/// path; nothing is shared or reused across runs. A metric failure never
/// prevents evaluation of the metrics after it — only a failure to open a
/// connection escalates out of [`TransferPipeline::run`].
#[derive(Debug)]
pub struct TransferPipeline {
    source_options: PgConnectOptions,
    destination_options: MySqlConnectOptions,
    catalog: Vec<MetricDefinition>,
}

impl TransferPipeline {
    /// Creates a pipeline over the fixed metric catalog.
    pub fn new(source_options: PgConnectOptions, destination_options: MySqlConnectOptions) -> Self {
        Self {
            source_options,
            destination_options,
            catalog: metric_catalog(),
        }
    }

    /// Executes one full pass over the catalog.
    ///
    /// The run date is computed once here and applied to every metric, so
    /// all rows of a run share one date even if the run spans midnight.
    pub async fn run(&self) -> TransferResult<RunReport> {
        let date = Local::now().date_naive();
        info!(%date, metrics = self.catalog.len(), "starting metrics transfer run");

        let mut reader = SourceReader::connect(&self.source_options).await?;
        let mut writer = match DestinationWriter::connect(&self.destination_options).await {
            Ok(writer) => writer,
            Err(err) => {
                close_source(reader).await;
                return Err(err);
            }
        };

        let metrics = run_catalog(&mut reader, &mut writer, &self.catalog, date).await;

        close_source(reader).await;
        if let Err(err) = writer.close().await {
            warn!("failed to close the destination connection: {err}");
        }

        let report = RunReport { date, metrics };
        info!(
            %date,
            recorded = report.recorded(),
            failed = report.failed(),
            "metrics transfer run completed"
        );

        Ok(report)
    }
}

async fn close_source(reader: SourceReader) {
    if let Err(err) = reader.close().await {
        warn!("failed to close the source connection: {err}");
    }
}

/// Evaluates the catalog in order, recording one report per metric.
///
/// Failures stay isolated to their metric; the loop always visits the whole
/// catalog.
async fn run_catalog<S, D>(
    source: &mut S,
    sink: &mut D,
    catalog: &[MetricDefinition],
    date: NaiveDate,
) -> Vec<MetricReport>
where
    S: CountSource + Send,
    D: CountSink + Send,
{
    let mut reports = Vec::with_capacity(catalog.len());

    for metric in catalog {
        let outcome = transfer_metric(source, sink, metric, date).await;
        log_outcome(&metric.key, date, &outcome);
        reports.push(MetricReport {
            key: metric.key.clone(),
            date,
            outcome,
        });
    }

    reports
}

/// Moves one metric from source to destination.
async fn transfer_metric<S, D>(
    source: &mut S,
    sink: &mut D,
    metric: &MetricDefinition,
    date: NaiveDate,
) -> MetricOutcome
where
    S: CountSource + Send,
    D: CountSink + Send,
{
    let count = match source.read_count(metric).await {
        Ok(count) => count,
        Err(err) => {
            return MetricOutcome::SourceQueryFailed {
                reason: err.to_string(),
            };
        }
    };

    match sink.write_count(&metric.key, date, count).await {
        Ok(WriteOutcome::Inserted) => MetricOutcome::Written { count },
        Ok(WriteOutcome::DuplicateDate) => MetricOutcome::AlreadyRecorded { count },
        Err(err) => MetricOutcome::DestinationWriteFailed {
            count,
            reason: err.to_string(),
        },
    }
}

fn log_outcome(key: &str, date: NaiveDate, outcome: &MetricOutcome) {
    match outcome {
        MetricOutcome::Written { count } => {
            info!(key, %date, count, "metric written to destination");
        }
        MetricOutcome::AlreadyRecorded { count } => {
            info!(key, %date, count, "metric already recorded for this date");
        }
        MetricOutcome::SourceQueryFailed { reason } => {
            warn!(key, %date, reason, "source query failed, skipping metric");
        }
        MetricOutcome::DestinationWriteFailed { count, reason } => {
            error!(key, %date, count, reason, "destination write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransferError;
    use metrics_telemetry::init_test_tracing;
    use std::collections::{HashMap, HashSet};

    /// Source fake returning canned per-key results.
    struct FakeSource {
        counts: HashMap<String, u64>,
        failing: HashSet<String>,
    }

    impl FakeSource {
        fn new(counts: &[(&str, u64)]) -> Self {
            Self {
                counts: counts
                    .iter()
                    .map(|(key, count)| (key.to_string(), *count))
                    .collect(),
                failing: HashSet::new(),
            }
        }

        fn failing_on(mut self, key: &str) -> Self {
            self.failing.insert(key.to_string());
            self
        }
    }

    impl CountSource for FakeSource {
        async fn read_count(&mut self, metric: &MetricDefinition) -> TransferResult<u64> {
            if self.failing.contains(&metric.key) {
                return Err(TransferError::MissingCount {
                    key: metric.key.clone(),
                });
            }

            Ok(*self.counts.get(&metric.key).unwrap_or(&0))
        }
    }

    /// Sink fake enforcing one row per table per date, like the destination
    /// schema does.
    #[derive(Default)]
    struct MemorySink {
        rows: Vec<(String, NaiveDate, u64)>,
        rejecting: HashSet<String>,
    }

    impl MemorySink {
        fn rejecting_on(mut self, table: &str) -> Self {
            self.rejecting.insert(table.to_string());
            self
        }
    }

    impl CountSink for MemorySink {
        async fn write_count(
            &mut self,
            table: &str,
            date: NaiveDate,
            count: u64,
        ) -> TransferResult<WriteOutcome> {
            if self.rejecting.contains(table) {
                return Err(TransferError::DestinationWrite {
                    table: table.to_string(),
                    source: sqlx::Error::PoolClosed,
                });
            }

            if self.rows.iter().any(|(t, d, _)| t == table && *d == date) {
                return Ok(WriteOutcome::DuplicateDate);
            }

            self.rows.push((table.to_string(), date, count));
            Ok(WriteOutcome::Inserted)
        }
    }

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn catalog_of(keys: &[&str]) -> Vec<MetricDefinition> {
        keys.iter()
            .map(|key| MetricDefinition {
                key: key.to_string(),
                query: format!("SELECT count(*) FROM {key}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_successful_run_writes_one_row_per_metric() {
        init_test_tracing();

        let catalog = catalog_of(&["active_machines_count", "lost_users_count"]);
        let mut source = FakeSource::new(&[
            ("active_machines_count", 7),
            ("lost_users_count", 3),
        ]);
        let mut sink = MemorySink::default();

        let reports = run_catalog(&mut source, &mut sink, &catalog, test_date()).await;

        assert_eq!(
            sink.rows,
            vec![
                ("active_machines_count".to_string(), test_date(), 7),
                ("lost_users_count".to_string(), test_date(), 3),
            ]
        );
        assert!(
            reports
                .iter()
                .all(|report| report.outcome.is_recorded() && report.date == test_date())
        );
    }

    #[tokio::test]
    async fn test_source_failure_is_isolated_to_its_metric() {
        init_test_tracing();

        let catalog = catalog_of(&["a", "b", "c"]);
        let mut source = FakeSource::new(&[("a", 1), ("c", 3)]).failing_on("b");
        let mut sink = MemorySink::default();

        let reports = run_catalog(&mut source, &mut sink, &catalog, test_date()).await;

        assert_eq!(reports.len(), 3);
        assert!(matches!(
            reports[1].outcome,
            MetricOutcome::SourceQueryFailed { .. }
        ));
        // The metrics around the failing one still land.
        assert_eq!(
            sink.rows,
            vec![
                ("a".to_string(), test_date(), 1),
                ("c".to_string(), test_date(), 3),
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_date_is_benign() {
        init_test_tracing();

        let catalog = catalog_of(&["active_machines_count"]);
        let mut source = FakeSource::new(&[("active_machines_count", 7)]);
        let mut sink = MemorySink::default();

        let first = run_catalog(&mut source, &mut sink, &catalog, test_date()).await;
        let second = run_catalog(&mut source, &mut sink, &catalog, test_date()).await;

        assert!(matches!(
            first[0].outcome,
            MetricOutcome::Written { count: 7 }
        ));
        assert!(matches!(
            second[0].outcome,
            MetricOutcome::AlreadyRecorded { count: 7 }
        ));
        // Still exactly one row per metric per date.
        assert_eq!(sink.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_write_failure_is_isolated_to_its_metric() {
        init_test_tracing();

        let catalog = catalog_of(&["a", "b"]);
        let mut source = FakeSource::new(&[("a", 1), ("b", 2)]);
        let mut sink = MemorySink::default().rejecting_on("a");

        let reports = run_catalog(&mut source, &mut sink, &catalog, test_date()).await;

        assert!(matches!(
            reports[0].outcome,
            MetricOutcome::DestinationWriteFailed { count: 1, .. }
        ));
        assert_eq!(sink.rows, vec![("b".to_string(), test_date(), 2)]);
    }
}

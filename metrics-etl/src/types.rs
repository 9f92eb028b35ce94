use chrono::NaiveDate;

/// Outcome of transferring a single metric within one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricOutcome {
    /// The count was read and a new row was inserted.
    Written { count: u64 },
    /// The count was read but the destination already holds a row for this
    /// date. Benign: the metric is considered recorded for the day.
    AlreadyRecorded { count: u64 },
    /// The source query failed; nothing was written.
    SourceQueryFailed { reason: String },
    /// The count was read but the destination insert failed.
    DestinationWriteFailed { count: u64, reason: String },
}

impl MetricOutcome {
    /// Returns whether the metric ended up recorded in the destination for
    /// the run's date, either by this run or by an earlier one.
    pub fn is_recorded(&self) -> bool {
        matches!(
            self,
            MetricOutcome::Written { .. } | MetricOutcome::AlreadyRecorded { .. }
        )
    }
}

/// Report for a single metric, produced once per metric per run and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricReport {
    /// Catalog key, which is also the destination table name.
    pub key: String,
    /// Calendar date shared by every metric in the run.
    pub date: NaiveDate,
    /// What happened to this metric.
    pub outcome: MetricOutcome,
}

/// Report for one full pass over the metric catalog.
///
/// Held only long enough to emit the completion log line; no in-memory
/// history is kept across runs.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Calendar date computed once at run start and applied to every metric.
    pub date: NaiveDate,
    /// Per-metric reports in catalog order.
    pub metrics: Vec<MetricReport>,
}

impl RunReport {
    /// Number of metrics recorded in the destination for the run's date.
    pub fn recorded(&self) -> usize {
        self.metrics
            .iter()
            .filter(|report| report.outcome.is_recorded())
            .count()
    }

    /// Number of metrics that failed on either side.
    pub fn failed(&self) -> usize {
        self.metrics.len() - self.recorded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_report_tallies() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let report = RunReport {
            date,
            metrics: vec![
                MetricReport {
                    key: "a".into(),
                    date,
                    outcome: MetricOutcome::Written { count: 7 },
                },
                MetricReport {
                    key: "b".into(),
                    date,
                    outcome: MetricOutcome::AlreadyRecorded { count: 7 },
                },
                MetricReport {
                    key: "c".into(),
                    date,
                    outcome: MetricOutcome::SourceQueryFailed {
                        reason: "timeout".into(),
                    },
                },
            ],
        };

        assert_eq!(report.recorded(), 2);
        assert_eq!(report.failed(), 1);
    }
}

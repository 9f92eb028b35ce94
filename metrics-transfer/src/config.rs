use clap::Parser;
use metrics_config::{DestinationConfig, ExecutionTime, SourceConfig, TransferConfig};

/// Moves daily aggregate counts from the analytical Postgres database into
/// the reporting MySQL database, once per day at a fixed time.
#[derive(Debug, Parser)]
#[command(name = "metrics-transfer", version)]
pub struct Args {
    /// Postgres connection URL of the analytical source database.
    #[arg(long, value_name = "URL")]
    pub source_dsn: String,

    /// MySQL connection URL of the reporting destination database.
    #[arg(long, value_name = "URL")]
    pub destination_dsn: String,

    /// Wall-clock time of day at which the transfer runs, as HH:MM.
    #[arg(long, value_name = "HH:MM", default_value = "23:00")]
    pub execution_time: String,
}

impl Args {
    /// Turns parsed flags into a validated [`TransferConfig`].
    pub fn into_config(self) -> anyhow::Result<TransferConfig> {
        let execution_time: ExecutionTime = self.execution_time.parse()?;

        let config = TransferConfig {
            source: SourceConfig {
                dsn: self.source_dsn.into(),
            },
            destination: DestinationConfig {
                dsn: self.destination_dsn.into(),
            },
            execution_time,
        };
        config.validate()?;

        Ok(config)
    }
}

/// Loads the [`TransferConfig`] from the command line and validates it.
pub fn load_transfer_config() -> anyhow::Result<TransferConfig> {
    Args::parse().into_config()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("metrics-transfer").chain(args.iter().copied()))
    }

    #[test]
    fn test_both_dsns_are_required() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--source-dsn", "postgres://localhost/analytics"]).is_err());
        assert!(parse(&["--destination-dsn", "mysql://localhost/reporting"]).is_err());
    }

    #[test]
    fn test_execution_time_defaults_to_eleven_pm() {
        let config = parse(&[
            "--source-dsn",
            "postgres://localhost/analytics",
            "--destination-dsn",
            "mysql://localhost/reporting",
        ])
        .unwrap()
        .into_config()
        .unwrap();

        assert_eq!(config.execution_time, ExecutionTime::new(23, 0).unwrap());
    }

    #[test]
    fn test_malformed_execution_time_is_a_startup_error() {
        let result = parse(&[
            "--source-dsn",
            "postgres://localhost/analytics",
            "--destination-dsn",
            "mysql://localhost/reporting",
            "--execution-time",
            "25:00",
        ])
        .unwrap()
        .into_config();

        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_dsn_is_a_startup_error() {
        let result = parse(&[
            "--source-dsn",
            "postgres://localhost/analytics",
            "--destination-dsn",
            "not a url",
        ])
        .unwrap()
        .into_config();

        assert!(result.is_err());
    }
}

//! The fixed catalog of daily metrics.
//!
//! Each definition pairs a destination table name with the analytical query
//! producing its count. Per-project metrics share one query template,
//! expanded over [`Project::ALL`].

/// Destination table for the lost-users metric.
const LOST_USERS_KEY: &str = "lost_users_count";

/// Tracked mining projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Project {
    Aleo,
    QuaiGarden,
}

impl Project {
    /// All tracked projects, in catalog expansion order.
    pub const ALL: [Project; 2] = [Project::Aleo, Project::QuaiGarden];

    /// Project tag as stored in the source database.
    pub fn tag(&self) -> &'static str {
        match self {
            Project::Aleo => "ALEO",
            Project::QuaiGarden => "Quai_Garden",
        }
    }

    /// Lowercase suffix used in destination table names.
    pub fn slug(&self) -> &'static str {
        match self {
            Project::Aleo => "aleo",
            Project::QuaiGarden => "quai_garden",
        }
    }
}

/// A named metric: destination table identity plus the source query that
/// computes it.
///
/// The query must return exactly one row with one integer column.
#[derive(Debug, Clone)]
pub struct MetricDefinition {
    /// Destination table name, unique across the catalog.
    pub key: String,
    /// Source-side query text.
    pub query: String,
}

impl MetricDefinition {
    fn new(key: String, query: String) -> Self {
        Self { key, query }
    }
}

/// Returns the fixed ordered catalog evaluated on every run.
///
/// Order determines execution order only; metrics are independent of each
/// other.
pub fn metric_catalog() -> Vec<MetricDefinition> {
    let mut catalog = Vec::new();

    for project in Project::ALL {
        catalog.push(active_machines(project));
    }
    catalog.push(lost_users());
    for project in Project::ALL {
        catalog.push(active_channel_machines(project));
    }

    catalog
}

/// Machines that committed a solution since the start of the current day,
/// per project.
fn active_machines(project: Project) -> MetricDefinition {
    let query = format!(
        "SELECT count(*) FROM machine m \
         WHERE to_timestamp(m.last_commit_solution) >= DATE(NOW()) \
         AND project = '{}'",
        project.tag()
    );

    MetricDefinition::new(format!("active_machines_count_{}", project.slug()), query)
}

/// Users whose machines have all been silent for more than one day.
fn lost_users() -> MetricDefinition {
    let query = r#"WITH machine_activity AS (
    SELECT ma.main_user_id, MAX(m.last_commit_solution) AS max_last_commit_solution
    FROM miner_account ma
    JOIN machine m ON m.miner_account_id = ma.id
    GROUP BY ma.main_user_id
)
SELECT COUNT(distinct u.email) FROM public."user" u
LEFT JOIN machine_activity ma ON ma.main_user_id = u.id
WHERE to_timestamp(ma.max_last_commit_solution) < (DATE_TRUNC('day', NOW()) - INTERVAL '1 days')"#;

    MetricDefinition::new(LOST_USERS_KEY.to_string(), query.to_string())
}

/// Active machines belonging to users who signed up through a non-default
/// invitation channel, per project.
fn active_channel_machines(project: Project) -> MetricDefinition {
    let query = format!(
        r#"WITH select_user AS (
    SELECT u.email, ma.id, ma.name
    FROM miner_account ma
    LEFT JOIN "public"."user" u ON u.id = ma.main_user_id
    LEFT JOIN invitation_code ic ON ic."id" = u.invitation_code_id
    WHERE ic.tag in (
        SELECT tag
        FROM bonus_obj
        WHERE user_id IS NULL
            AND project = '{}'
            AND tag != 'default'
    )
)
SELECT count(*) FROM machine m
JOIN select_user su ON m.miner_account_id = su.id
WHERE to_timestamp(m.last_commit_solution) >= DATE(NOW())"#,
        project.tag()
    );

    MetricDefinition::new(
        format!("active_channel_machines_count_{}", project.slug()),
        query,
    )
}

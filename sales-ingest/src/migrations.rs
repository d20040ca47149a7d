//! Embedded schema migrations.
//!
//! Each script is applied at most once per database; applied names are
//! recorded in `schema_migrations`. The scripts themselves are written to be
//! re-runnable as well, so a database migrated by hand is picked up cleanly.

use tokio_postgres::Client;

use crate::error::{IngestError, IngestResult};

/// A named migration script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub name: &'static str,
    pub sql: &'static str,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "001_init",
        sql: include_str!("../migrations/001_init.sql"),
    },
    Migration {
        name: "002_helpers",
        sql: include_str!("../migrations/002_helpers.sql"),
    },
];

const CREATE_HISTORY: &str = "\
CREATE TABLE IF NOT EXISTS schema_migrations (
    name       TEXT PRIMARY KEY,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

/// Apply every pending migration, each in its own transaction.
///
/// Returns the names applied by this call (empty when already up to date).
pub async fn run_migrations(client: &mut Client) -> IngestResult<Vec<&'static str>> {
    client.batch_execute(CREATE_HISTORY).await?;

    let mut applied = Vec::new();
    for migration in MIGRATIONS {
        let done = client
            .query_opt(
                "SELECT 1 FROM schema_migrations WHERE name = $1",
                &[&migration.name],
            )
            .await?
            .is_some();
        if done {
            tracing::debug!(migration = migration.name, "Migration already applied");
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql)
            .await
            .map_err(|source| IngestError::Migration {
                name: migration.name,
                source,
            })?;
        tx.execute(
            "INSERT INTO schema_migrations (name) VALUES ($1)",
            &[&migration.name],
        )
        .await?;
        tx.commit().await?;

        tracing::info!(migration = migration.name, "Migration applied");
        applied.push(migration.name);
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered() {
        let names: Vec<_> = MIGRATIONS.iter().map(|m| m.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_init_defines_partitioned_sales() {
        let init = MIGRATIONS[0].sql;
        assert!(init.contains("PARTITION BY RANGE (sale_date)"));
        assert!(init.contains("CHECK (quantity > 0)"));
        assert!(init.contains("CHECK (unit_price >= 0)"));
    }

    #[test]
    fn test_helpers_define_partition_function() {
        assert!(MIGRATIONS[1].sql.contains("create_month_partition"));
    }
}

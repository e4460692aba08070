//! Schema upgrades for the diary database.
//!
//! Each step is an embedded SQL script tagged with the `user_version` it
//! produces. Pending steps run together in one transaction so a failed
//! upgrade leaves the previous schema intact.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    label: &'static str,
    script: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        label: "notes_table",
        script: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        label: "note_image_uris",
        script: include_str!("0002_image_uris.sql"),
    },
];

/// Newest schema version this build can produce.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.iter().map(|step| step.version).max().unwrap_or(0)
}

/// Schema version currently recorded in the database header.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}

/// Brings `conn` up to `latest_version()`.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the file was written by a newer
///   build.
/// - `DbError::Sqlite` when a script fails; nothing is committed then.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    let target = latest_version();

    match found.cmp(&target) {
        std::cmp::Ordering::Greater => Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: target,
        }),
        std::cmp::Ordering::Equal => Ok(()),
        std::cmp::Ordering::Less => {
            let tx = conn.transaction()?;
            let pending = SCHEMA_STEPS.iter().filter(|step| step.version > found);
            for step in pending {
                run_step(&tx, step)?;
            }
            tx.commit()?;
            info!(
                "event=db_migrate module=db status=ok from_version={found} to_version={target}"
            );
            Ok(())
        }
    }
}

fn run_step(tx: &Transaction<'_>, step: &SchemaStep) -> DbResult<()> {
    tx.execute_batch(step.script)?;
    tx.pragma_update(None, "user_version", step.version)?;
    debug!(
        "event=db_migrate_step module=db status=ok version={} label={}",
        step.version, step.label
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, schema_version, SCHEMA_STEPS};
    use rusqlite::Connection;

    #[test]
    fn steps_are_strictly_increasing() {
        for pair in SCHEMA_STEPS.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
        assert_eq!(latest_version(), 2);
    }

    #[test]
    fn upgrades_version_one_database_in_place() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_STEPS[0].script).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();
        conn.execute(
            "INSERT INTO notes (date, title, content) VALUES (20240101, 'kept', 'body');",
            [],
        )
        .unwrap();

        apply_migrations(&mut conn).unwrap();

        assert_eq!(schema_version(&conn).unwrap(), 2);
        let images: Option<String> = conn
            .query_row("SELECT image_uris_json FROM notes WHERE title = 'kept';", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(images.is_none());
    }
}

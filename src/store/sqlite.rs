use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, SyncError};
use crate::domain::{PageKey, RevisionRecord};
use crate::store::RevisionStore;

/// On-disk copy of the revision bookkeeping, so that separate invocations
/// share baselines.
pub struct StateDb {
    conn: Mutex<Connection>,
}

impl StateDb {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.run_migrations()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            SyncError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| SyncError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    /// Copy every stored record into `store`. Returns the number loaded.
    pub fn load_into(&self, store: &RevisionStore) -> Result<usize> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT wiki, page, revision, last_modified FROM revisions")?;

        let records = stmt
            .query_map([], |row| {
                Ok(RevisionRecord {
                    key: PageKey::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?),
                    revision: row.get(2)?,
                    last_modified: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let count = records.len();
        for record in records {
            store.put_record(record);
        }
        Ok(count)
    }

    pub fn save_from(&self, store: &RevisionStore) -> Result<usize> {
        let records = store.snapshot();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        for record in &records {
            tx.execute(
                "INSERT INTO revisions (wiki, page, revision, last_modified, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(wiki, page) DO UPDATE SET
                    revision = excluded.revision,
                    last_modified = excluded.last_modified,
                    updated_at = excluded.updated_at",
                params![
                    record.key.wiki,
                    record.key.page,
                    record.revision,
                    record.last_modified,
                    now
                ],
            )?;
        }

        tx.commit()?;
        Ok(records.len())
    }
}

//! SQLite persistence for destination folders and written bodies.

use crate::Result;
use rusqlite::{Connection, params};
use splitpaste_types::{FolderRecord, HistoryRecord};
use std::path::{Path, PathBuf};
use tracing::debug;

/// SQLite-backed folder and history log.
///
/// Every operation opens its own connection, so no transaction outlives a call.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self {
            path: path.to_path_buf(),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS folders (
                id INTEGER PRIMARY KEY,
                path TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS parsed_items (
                id INTEGER PRIMARY KEY,
                filename TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Remember a destination folder. Already-known paths are ignored.
    pub fn record_folder(&self, folder: &Path) -> Result<()> {
        let conn = self.connect()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO folders (path) VALUES (?1)",
            params![folder.to_string_lossy()],
        )?;
        if inserted > 0 {
            debug!(target: "splitpaste::store", "Saved folder {}", folder.display());
        }
        Ok(())
    }

    /// All remembered folders, oldest first.
    pub fn list_folders(&self) -> Result<Vec<FolderRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT id, path FROM folders ORDER BY id")?;
        let folders = stmt
            .query_map([], |row| {
                let path: String = row.get(1)?;
                Ok(FolderRecord {
                    id: row.get(0)?,
                    path: PathBuf::from(path),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(folders)
    }

    /// Append a written body to the history log.
    pub fn record_parsed_item(&self, filename: &str, content: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO parsed_items (filename, content, created_at) VALUES (?1, ?2, ?3)",
            params![filename, content, chrono::Utc::now().to_rfc3339()],
        )?;
        debug!(target: "splitpaste::store", "Logged parsed item {}", filename);
        Ok(())
    }

    /// History entries, most recent first.
    pub fn list_parsed_items(&self, limit: Option<usize>) -> Result<Vec<HistoryRecord>> {
        let conn = self.connect()?;
        let limit = limit.map(|n| n as i64).unwrap_or(-1);
        let mut stmt = conn.prepare(
            "SELECT id, filename, content, created_at FROM parsed_items ORDER BY id DESC LIMIT ?1",
        )?;
        let items = stmt
            .query_map(params![limit], |row| {
                let created_at: String = row.get(3)?;
                Ok(HistoryRecord {
                    id: row.get(0)?,
                    filename: row.get(1)?,
                    content: row.get(2)?,
                    created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
                        .map(|dt| dt.with_timezone(&chrono::Utc))
                        .unwrap_or_default(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (SessionStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::open(&temp_dir.path().join("nested").join("folders.db")).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_folders_are_unique() {
        let (store, _dir) = create_test_store();
        store.record_folder(Path::new("/tmp/a")).unwrap();
        store.record_folder(Path::new("/tmp/b")).unwrap();
        store.record_folder(Path::new("/tmp/a")).unwrap();

        let folders = store.list_folders().unwrap();
        let paths: Vec<_> = folders.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("/tmp/a"), PathBuf::from("/tmp/b")]);
    }

    #[test]
    fn test_history_newest_first_with_limit() {
        let (store, _dir) = create_test_store();
        store.record_parsed_item("a.txt", "one").unwrap();
        store.record_parsed_item("b.txt", "two").unwrap();
        store.record_parsed_item("a.txt", "three").unwrap();

        let all = store.list_parsed_items(None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].content, "three");
        assert_eq!(all[2].filename, "a.txt");

        let latest = store.list_parsed_items(Some(1)).unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].content, "three");
    }

    #[test]
    fn test_reopen_keeps_data() {
        let (store, _dir) = create_test_store();
        store.record_folder(Path::new("/srv/out")).unwrap();

        let reopened = SessionStore::open(store.path()).unwrap();
        assert_eq!(reopened.list_folders().unwrap().len(), 1);
    }
}

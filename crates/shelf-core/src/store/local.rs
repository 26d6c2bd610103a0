//! SQLite item store

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use shelf_domain::{ItemId, LibraryItem};

use super::schema::{Schema, SCHEMA_VERSION};
use super::ItemStore;
use crate::error::StoreError;

/// Owner of items created without a session
pub const LOCAL_OWNER: &str = "local";

/// Items for one owner in a shared SQLite database
#[derive(Clone)]
pub struct LocalStore {
    conn: Arc<Mutex<Connection>>,
    owner: String,
}

impl LocalStore {
    /// Open (or create) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Database(format!("Cannot create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "Opened local item store");
        Self::with_connection(conn)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        initialize(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            owner: LOCAL_OWNER.to_string(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    fn exists(conn: &Connection, owner: &str, key: &str) -> Result<bool, StoreError> {
        let found = conn
            .query_row(
                "SELECT 1 FROM items WHERE owner = ?1 AND id = ?2",
                params![owner, key],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

fn initialize(conn: &Connection) -> Result<(), StoreError> {
    let current_version = get_schema_version(conn).unwrap_or(0);

    if current_version == 0 {
        conn.execute_batch(Schema::create_tables())?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version != SCHEMA_VERSION {
        return Err(StoreError::Database(format!(
            "Unsupported schema version {} (expected {})",
            current_version, SCHEMA_VERSION
        )));
    }

    Ok(())
}

fn get_schema_version(conn: &Connection) -> Option<u32> {
    conn.query_row(
        "SELECT version FROM schema_version ORDER BY rowid DESC LIMIT 1",
        [],
        |row| row.get(0),
    )
    .ok()
}

fn set_schema_version(conn: &Connection, version: u32) -> Result<(), StoreError> {
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

#[async_trait]
impl ItemStore for LocalStore {
    fn backend(&self) -> &'static str {
        "local"
    }

    async fn get_all(&self) -> Result<Vec<LibraryItem>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT data FROM items WHERE owner = ?1 ORDER BY seq")?;

        let rows = stmt
            .query_map([&self.owner], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|data| serde_json::from_str(data).map_err(StoreError::from))
            .collect()
    }

    async fn insert(&self, item: &LibraryItem) -> Result<LibraryItem, StoreError> {
        let mut item = item.clone();
        if item.id.is_unassigned() {
            item.id = ItemId::generate();
        }
        let key = item.id.as_key();

        let conn = self.lock()?;
        if Self::exists(&conn, &self.owner, &key)? {
            return Err(StoreError::Duplicate(key));
        }

        conn.execute(
            r#"
            INSERT INTO items (owner, id, item_type, title, data, date_added, date_modified)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                self.owner,
                key,
                item.item_type.map(|t| t.as_str()),
                item.title,
                serde_json::to_string(&item)?,
                item.date_added.map(|d| d.to_rfc3339()),
                item.date_modified.map(|d| d.to_rfc3339()),
            ],
        )?;

        Ok(item)
    }

    async fn update(&self, id: &ItemId, item: &LibraryItem) -> Result<LibraryItem, StoreError> {
        let mut item = item.clone();
        item.id = id.clone();
        let key = id.as_key();

        let conn = self.lock()?;
        let changed = conn.execute(
            r#"
            UPDATE items
            SET item_type = ?3, title = ?4, data = ?5, date_added = ?6, date_modified = ?7
            WHERE owner = ?1 AND id = ?2
            "#,
            params![
                self.owner,
                key,
                item.item_type.map(|t| t.as_str()),
                item.title,
                serde_json::to_string(&item)?,
                item.date_added.map(|d| d.to_rfc3339()),
                item.date_modified.map(|d| d.to_rfc3339()),
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(key));
        }
        Ok(item)
    }

    async fn delete(&self, id: &ItemId) -> Result<(), StoreError> {
        let key = id.as_key();
        let conn = self.lock()?;
        let changed = conn.execute(
            "DELETE FROM items WHERE owner = ?1 AND id = ?2",
            params![self.owner, key],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(key));
        }
        Ok(())
    }
}

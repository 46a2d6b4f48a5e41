use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::db::queries;
use crate::models::Session;

/// Keyed per-user dialogue state. Callers serialize access per user.
pub trait SessionStore: Send + Sync {
    fn get(&self, user_id: &str) -> anyhow::Result<Option<Session>>;
    fn put(&self, user_id: &str, session: &Session) -> anyhow::Result<()>;
    fn reset_to_empty(&self, user_id: &str) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .lock()
            .map_err(|_| anyhow::anyhow!("session map lock poisoned"))
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, user_id: &str) -> anyhow::Result<Option<Session>> {
        Ok(self.lock()?.get(user_id).cloned())
    }

    fn put(&self, user_id: &str, session: &Session) -> anyhow::Result<()> {
        self.lock()?.insert(user_id.to_string(), session.clone());
        Ok(())
    }

    fn reset_to_empty(&self, user_id: &str) -> anyhow::Result<()> {
        self.lock()?.remove(user_id);
        Ok(())
    }
}

pub struct SqliteSessionStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteSessionStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> anyhow::Result<T>) -> anyhow::Result<T> {
        let conn = self
            .db
            .lock()
            .map_err(|_| anyhow::anyhow!("session database lock poisoned"))?;
        f(&conn)
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self, user_id: &str) -> anyhow::Result<Option<Session>> {
        self.with_conn(|conn| queries::get_session(conn, user_id))
    }

    fn put(&self, user_id: &str, session: &Session) -> anyhow::Result<()> {
        self.with_conn(|conn| queries::save_session(conn, user_id, session))
    }

    fn reset_to_empty(&self, user_id: &str) -> anyhow::Result<()> {
        self.with_conn(|conn| queries::delete_session(conn, user_id).map(|_| ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{Category, DialogueState, Slot};
    use chrono::{NaiveDate, NaiveTime};

    fn sqlite_store() -> SqliteSessionStore {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        SqliteSessionStore::new(Arc::new(Mutex::new(conn)))
    }

    fn sample() -> Session {
        Session {
            name: Some("Ravi".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 6, 19),
            time: NaiveTime::from_hms_opt(15, 0, 0),
            category: Some(Category::LabTest),
            awaiting_field: Some(Slot::Age),
            state: DialogueState::Collecting,
            ..Session::default()
        }
    }

    fn exercise(store: &dyn SessionStore) {
        assert_eq!(store.get("u1").unwrap(), None);

        store.put("u1", &sample()).unwrap();
        assert_eq!(store.get("u1").unwrap(), Some(sample()));
        assert_eq!(store.get("u2").unwrap(), None);

        let mut updated = sample();
        updated.age = Some(33);
        store.put("u1", &updated).unwrap();
        assert_eq!(store.get("u1").unwrap().and_then(|s| s.age), Some(33));

        store.reset_to_empty("u1").unwrap();
        assert_eq!(store.get("u1").unwrap(), None);
        store.reset_to_empty("never-seen").unwrap();
    }

    #[test]
    fn test_memory_store_contract() {
        exercise(&MemorySessionStore::new());
    }

    #[test]
    fn test_sqlite_store_contract() {
        exercise(&sqlite_store());
    }

    #[test]
    fn test_sqlite_discards_unreadable_rows() {
        let store = sqlite_store();
        store
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO sessions (user_id, data, updated_at) VALUES ('u1', '{\"age\": \"old\"}', 'now')",
                    [],
                )?;
                Ok(())
            })
            .unwrap();
        assert_eq!(store.get("u1").unwrap(), None);
    }
}

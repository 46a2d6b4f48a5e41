use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::Session;

// ── Sessions ──

pub fn get_session(conn: &Connection, user_id: &str) -> anyhow::Result<Option<Session>> {
    let data: Option<String> = conn
        .query_row(
            "SELECT data FROM sessions WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;

    match data {
        Some(json) => match serde_json::from_str(&json) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                // A snapshot from an older schema starts over rather than failing the turn.
                tracing::warn!(user_id = %user_id, error = %e, "discarding unreadable session");
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

pub fn save_session(conn: &Connection, user_id: &str, session: &Session) -> anyhow::Result<()> {
    let data = serde_json::to_string(session)?;
    let now = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();
    conn.execute(
        "INSERT INTO sessions (user_id, data, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        params![user_id, data, now],
    )?;
    Ok(())
}

pub fn delete_session(conn: &Connection, user_id: &str) -> anyhow::Result<bool> {
    let deleted = conn.execute("DELETE FROM sessions WHERE user_id = ?1", params![user_id])?;
    Ok(deleted > 0)
}

use crate::api::models::{Conversation, ConversationId, ConversationKind};
use crate::error::{ClientError, Result};
use directories::ProjectDirs;
use rusqlite::{Connection, params};
use std::fs;
use std::path::PathBuf;

// Caching the conversation list so the sidebar renders before the API answers
pub struct ConversationCache {
    path: PathBuf,
}

impl ConversationCache {
    pub fn default_path() -> Option<PathBuf> {
        let proj = ProjectDirs::from("com", "example", "BlogDesk")?;
        Some(proj.data_dir().join("cache.sqlite"))
    }

    pub fn open_default() -> Result<Self> {
        let path = Self::default_path().ok_or_else(|| ClientError::Storage("no data dir".into()))?;
        Self::open(path)
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let cache = Self { path: path.into() };
        cache.init()?;
        Ok(cache)
    }

    fn conn(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Connection::open(&self.path)?)
    }

    fn init(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            CREATE TABLE IF NOT EXISTS conversations (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                position INTEGER NOT NULL,
                cached_at INTEGER NOT NULL,
                raw_json TEXT
            );
            "#,
        )?;
        Ok(())
    }

    /// Replaces the cached list, keeping the server's ordering.
    pub fn replace_all(&self, conversations: &[Conversation]) -> Result<()> {
        let now = crate::utils::now_secs();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM conversations", [])?;
        for (idx, c) in conversations.iter().enumerate() {
            let raw = serde_json::to_string(c).ok();
            tx.execute(
                "INSERT INTO conversations (id, title, position, cached_at, raw_json) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![c.id, c.title, idx as i64, now, raw],
            )?;
        }
        tx.commit()?;
        log::debug!("cached {} conversations", conversations.len());
        Ok(())
    }

    pub fn list(&self, limit: Option<usize>) -> Result<Vec<Conversation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, raw_json FROM conversations ORDER BY position ASC LIMIT ?1",
        )?;
        let lim = limit.unwrap_or(500) as i64;
        let rows = stmt.query_map(params![lim], |row| {
            let id: ConversationId = row.get(0)?;
            let title: String = row.get(1)?;
            let raw: Option<String> = row.get(2)?;
            Ok((id, title, raw))
        })?;
        let mut out = Vec::new();
        for r in rows {
            let (id, title, raw) = r?;
            let conv = raw
                .and_then(|raw| serde_json::from_str::<Conversation>(&raw).ok())
                .unwrap_or(Conversation { id, title, kind: ConversationKind::Assistant, updated_at: None });
            out.push(conv);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(id: i64, title: &str) -> Conversation {
        Conversation { id, title: title.into(), kind: ConversationKind::Assistant, updated_at: None }
    }

    #[test]
    fn keeps_server_order_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ConversationCache::open(dir.path().join("data").join("cache.sqlite")).unwrap();

        cache.replace_all(&[conv(9, "newest"), conv(2, "older")]).unwrap();
        let ids: Vec<_> = cache.list(None).unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![9, 2]);

        cache.replace_all(&[conv(2, "older")]).unwrap();
        assert_eq!(cache.list(None).unwrap(), vec![conv(2, "older")]);
    }

    #[test]
    fn limit_applies() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ConversationCache::open(dir.path().join("cache.sqlite")).unwrap();
        cache.replace_all(&[conv(1, "a"), conv(2, "b"), conv(3, "c")]).unwrap();
        assert_eq!(cache.list(Some(2)).unwrap().len(), 2);
    }
}

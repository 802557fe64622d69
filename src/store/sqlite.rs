use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppError, AppResult};

use super::{ContactEntry, ContactStore, Message, RequestEntry, UserRef, now_millis, ordered_pair};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS requests (
        id TEXT PRIMARY KEY,
        emisor TEXT NOT NULL,
        receptor TEXT NOT NULL,
        UNIQUE (emisor, receptor)
    )",
    "CREATE TABLE IF NOT EXISTS contacts (
        id TEXT PRIMARY KEY,
        user_a TEXT NOT NULL,
        user_b TEXT NOT NULL,
        UNIQUE (user_a, user_b)
    )",
    "CREATE TABLE IF NOT EXISTS likes (
        emisor TEXT NOT NULL,
        receptor TEXT NOT NULL,
        PRIMARY KEY (emisor, receptor)
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        contact_id TEXT NOT NULL,
        sender_id TEXT NOT NULL,
        body TEXT NOT NULL,
        sent_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_messages_contact ON messages (contact_id, sent_at, id)",
];

/// Production [`ContactStore`] on SQLite. Ids are stored as TEXT; the
/// `contacts` pair is stored in canonical order so the UNIQUE constraint
/// covers both directions.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init(&self) -> AppResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Accounts are owned by the HTTP CRUD service; this exists for tests and
    /// local seeding against the shared database.
    pub async fn add_user(&self, name: &str, email: &str) -> AppResult<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query("INSERT INTO users (id,name,email) VALUES (?,?,?)")
            .bind(id.to_string())
            .bind(name)
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }
}

fn map_unique_violation(err: sqlx::Error, what: &'static str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::AlreadyExists(what),
        _ => err.into(),
    }
}

#[async_trait]
impl ContactStore for SqliteStore {
    async fn user_by_email(&self, email: &str) -> AppResult<Option<UserRef>> {
        let row: Option<(String, String, String)> =
            sqlx::query_as("SELECT id,name,email FROM users WHERE email=?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        let Some((id, name, email)) = row else {
            return Ok(None);
        };
        Ok(Some(UserRef {
            id: Uuid::parse_str(&id)?,
            name,
            email,
        }))
    }

    async fn user_exists(&self, user_id: Uuid) -> AppResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id=?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn pending_request(&self, emisor: Uuid, receptor: Uuid) -> AppResult<Option<Uuid>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT id FROM requests WHERE emisor=? AND receptor=?")
                .bind(emisor.to_string())
                .bind(receptor.to_string())
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some((id,)) => Ok(Some(Uuid::parse_str(&id)?)),
            None => Ok(None),
        }
    }

    async fn insert_request(&self, emisor: Uuid, receptor: Uuid) -> AppResult<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query("INSERT INTO requests (id,emisor,receptor) VALUES (?,?,?)")
            .bind(id.to_string())
            .bind(emisor.to_string())
            .bind(receptor.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "request"))?;
        Ok(id)
    }

    async fn request_emisor(&self, request_id: Uuid) -> AppResult<Option<Uuid>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT emisor FROM requests WHERE id=?")
            .bind(request_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some((emisor,)) => Ok(Some(Uuid::parse_str(&emisor)?)),
            None => Ok(None),
        }
    }

    async fn delete_request(&self, request_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM requests WHERE id=?")
            .bind(request_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn requests_for(&self, receptor: Uuid) -> AppResult<Vec<RequestEntry>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            "SELECT r.id, u.id, u.name, u.email
             FROM requests r JOIN users u ON u.id = r.emisor
             WHERE r.receptor=?
             ORDER BY r.id",
        )
        .bind(receptor.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for (request_id, emisor_id, emisor_name, emisor_email) in rows {
            entries.push(RequestEntry {
                request_id: Uuid::parse_str(&request_id)?,
                emisor_id: Uuid::parse_str(&emisor_id)?,
                emisor_name,
                emisor_email,
            });
        }
        Ok(entries)
    }

    async fn has_contact(&self, a: Uuid, b: Uuid) -> AppResult<bool> {
        let (a, b) = ordered_pair(a, b);
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM contacts WHERE user_a=? AND user_b=?")
                .bind(a.to_string())
                .bind(b.to_string())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    async fn insert_contact(&self, a: Uuid, b: Uuid) -> AppResult<Uuid> {
        let (a, b) = ordered_pair(a, b);
        let id = Uuid::now_v7();
        sqlx::query("INSERT INTO contacts (id,user_a,user_b) VALUES (?,?,?)")
            .bind(id.to_string())
            .bind(a.to_string())
            .bind(b.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "contact"))?;
        Ok(id)
    }

    async fn contact_members(&self, contact_id: Uuid) -> AppResult<Option<(Uuid, Uuid)>> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT user_a,user_b FROM contacts WHERE id=?")
                .bind(contact_id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some((a, b)) => Ok(Some((Uuid::parse_str(&a)?, Uuid::parse_str(&b)?))),
            None => Ok(None),
        }
    }

    async fn delete_contact(&self, contact_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id=?")
            .bind(contact_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn contacts_for(&self, user_id: Uuid) -> AppResult<Vec<ContactEntry>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            "SELECT c.id, u.id, u.name, u.email
             FROM contacts c JOIN users u
               ON u.id = CASE WHEN c.user_a=? THEN c.user_b ELSE c.user_a END
             WHERE c.user_a=? OR c.user_b=?
             ORDER BY c.id",
        )
        .bind(user_id.to_string())
        .bind(user_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for (contact_id, peer_id, peer_name, peer_email) in rows {
            entries.push(ContactEntry {
                contact_id: Uuid::parse_str(&contact_id)?,
                peer_id: Uuid::parse_str(&peer_id)?,
                peer_name,
                peer_email,
            });
        }
        Ok(entries)
    }

    async fn insert_like(&self, emisor: Uuid, receptor: Uuid) -> AppResult<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO likes (emisor,receptor) VALUES (?,?)")
            .bind(emisor.to_string())
            .bind(receptor.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_like(&self, emisor: Uuid, receptor: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE emisor=? AND receptor=?")
            .bind(emisor.to_string())
            .bind(receptor.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn has_like(&self, emisor: Uuid, receptor: Uuid) -> AppResult<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM likes WHERE emisor=? AND receptor=?")
                .bind(emisor.to_string())
                .bind(receptor.to_string())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    async fn append_message(
        &self,
        contact_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> AppResult<Message> {
        let message = Message {
            id: Uuid::now_v7(),
            contact_id,
            sender_id,
            body: body.to_owned(),
            sent_at: now_millis(),
        };
        sqlx::query("INSERT INTO messages (id,contact_id,sender_id,body,sent_at) VALUES (?,?,?,?,?)")
            .bind(message.id.to_string())
            .bind(message.contact_id.to_string())
            .bind(message.sender_id.to_string())
            .bind(&message.body)
            .bind(message.sent_at)
            .execute(&self.pool)
            .await?;
        Ok(message)
    }

    async fn messages_for(&self, contact_id: Uuid) -> AppResult<Vec<Message>> {
        let rows: Vec<(String, String, String, String, i64)> = sqlx::query_as(
            "SELECT id,contact_id,sender_id,body,sent_at
             FROM messages WHERE contact_id=?
             ORDER BY sent_at ASC, id ASC",
        )
        .bind(contact_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut messages = Vec::with_capacity(rows.len());
        for (id, contact_id, sender_id, body, sent_at) in rows {
            messages.push(Message {
                id: Uuid::parse_str(&id)?,
                contact_id: Uuid::parse_str(&contact_id)?,
                sender_id: Uuid::parse_str(&sender_id)?,
                body,
                sent_at,
            });
        }
        Ok(messages)
    }
}

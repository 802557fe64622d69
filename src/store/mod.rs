#[cfg(test)]
mod faulty;
mod memory;
mod sqlite;

#[cfg(test)]
pub(crate) use faulty::FaultyStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Pending request as seen by its receptor; the emisor's identity is joined in
/// so the client can render the row without another lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEntry {
    pub request_id: Uuid,
    pub emisor_id: Uuid,
    pub emisor_name: String,
    pub emisor_email: String,
}

/// Active relationship as seen by one of its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactEntry {
    pub contact_id: Uuid,
    pub peer_id: Uuid,
    pub peer_name: String,
    pub peer_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub contact_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    /// Unix milliseconds at insertion; messages in one contact are ordered by
    /// (sent_at, id).
    pub sent_at: i64,
}

pub(crate) fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Everything the realtime core needs from persistence. The production
/// implementation is [`SqliteStore`]; tests run against [`MemoryStore`].
///
/// Pairwise invariants (one active contact per unordered pair, one pending
/// request per ordered pair, one like per ordered pair) are enforced here, by
/// constraint; callers see violations as `AlreadyExists`, not corruption.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn user_by_email(&self, email: &str) -> AppResult<Option<UserRef>>;
    async fn user_exists(&self, user_id: Uuid) -> AppResult<bool>;

    /// Id of the pending request emisor → receptor, if any.
    async fn pending_request(&self, emisor: Uuid, receptor: Uuid) -> AppResult<Option<Uuid>>;
    async fn insert_request(&self, emisor: Uuid, receptor: Uuid) -> AppResult<Uuid>;
    async fn request_emisor(&self, request_id: Uuid) -> AppResult<Option<Uuid>>;
    /// Returns false when the request was already gone.
    async fn delete_request(&self, request_id: Uuid) -> AppResult<bool>;
    async fn requests_for(&self, receptor: Uuid) -> AppResult<Vec<RequestEntry>>;

    async fn has_contact(&self, a: Uuid, b: Uuid) -> AppResult<bool>;
    /// Fails with `AlreadyExists` when the unordered pair already has an
    /// active contact.
    async fn insert_contact(&self, a: Uuid, b: Uuid) -> AppResult<Uuid>;
    async fn contact_members(&self, contact_id: Uuid) -> AppResult<Option<(Uuid, Uuid)>>;
    async fn delete_contact(&self, contact_id: Uuid) -> AppResult<bool>;
    async fn contacts_for(&self, user_id: Uuid) -> AppResult<Vec<ContactEntry>>;

    /// Returns false on a duplicate ordered pair (insert skipped).
    async fn insert_like(&self, emisor: Uuid, receptor: Uuid) -> AppResult<bool>;
    async fn delete_like(&self, emisor: Uuid, receptor: Uuid) -> AppResult<bool>;
    async fn has_like(&self, emisor: Uuid, receptor: Uuid) -> AppResult<bool>;

    async fn append_message(
        &self,
        contact_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> AppResult<Message>;
    /// Ascending by insertion time; always a prefix-consistent snapshot.
    async fn messages_for(&self, contact_id: Uuid) -> AppResult<Vec<Message>>;
}

/// Contacts are undirected; one canonical order keeps the pair unique under a
/// plain two-column constraint.
pub(crate) fn ordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b { (a, b) } else { (b, a) }
}

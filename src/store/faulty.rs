//! Test-only store that delegates to [`MemoryStore`] but fails selected
//! operations, for exercising failure paths.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{AppError, AppResult};

use super::{ContactEntry, ContactStore, MemoryStore, Message, RequestEntry, UserRef};

pub(crate) struct FaultyStore {
    inner: MemoryStore,
    fail_append_message: bool,
    fail_insert_contact: bool,
}

impl FaultyStore {
    pub(crate) fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_append_message: false,
            fail_insert_contact: false,
        }
    }

    pub(crate) fn fail_append_message(mut self) -> Self {
        self.fail_append_message = true;
        self
    }

    pub(crate) fn fail_insert_contact(mut self) -> Self {
        self.fail_insert_contact = true;
        self
    }

    pub(crate) fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl ContactStore for FaultyStore {
    async fn user_by_email(&self, email: &str) -> AppResult<Option<UserRef>> {
        self.inner.user_by_email(email).await
    }

    async fn user_exists(&self, user_id: Uuid) -> AppResult<bool> {
        self.inner.user_exists(user_id).await
    }

    async fn pending_request(&self, emisor: Uuid, receptor: Uuid) -> AppResult<Option<Uuid>> {
        self.inner.pending_request(emisor, receptor).await
    }

    async fn insert_request(&self, emisor: Uuid, receptor: Uuid) -> AppResult<Uuid> {
        self.inner.insert_request(emisor, receptor).await
    }

    async fn request_emisor(&self, request_id: Uuid) -> AppResult<Option<Uuid>> {
        self.inner.request_emisor(request_id).await
    }

    async fn delete_request(&self, request_id: Uuid) -> AppResult<bool> {
        self.inner.delete_request(request_id).await
    }

    async fn requests_for(&self, receptor: Uuid) -> AppResult<Vec<RequestEntry>> {
        self.inner.requests_for(receptor).await
    }

    async fn has_contact(&self, a: Uuid, b: Uuid) -> AppResult<bool> {
        self.inner.has_contact(a, b).await
    }

    async fn insert_contact(&self, a: Uuid, b: Uuid) -> AppResult<Uuid> {
        if self.fail_insert_contact {
            return Err(AppError::Persistence("contact insert refused".to_owned()));
        }
        self.inner.insert_contact(a, b).await
    }

    async fn contact_members(&self, contact_id: Uuid) -> AppResult<Option<(Uuid, Uuid)>> {
        self.inner.contact_members(contact_id).await
    }

    async fn delete_contact(&self, contact_id: Uuid) -> AppResult<bool> {
        self.inner.delete_contact(contact_id).await
    }

    async fn contacts_for(&self, user_id: Uuid) -> AppResult<Vec<ContactEntry>> {
        self.inner.contacts_for(user_id).await
    }

    async fn insert_like(&self, emisor: Uuid, receptor: Uuid) -> AppResult<bool> {
        self.inner.insert_like(emisor, receptor).await
    }

    async fn delete_like(&self, emisor: Uuid, receptor: Uuid) -> AppResult<bool> {
        self.inner.delete_like(emisor, receptor).await
    }

    async fn has_like(&self, emisor: Uuid, receptor: Uuid) -> AppResult<bool> {
        self.inner.has_like(emisor, receptor).await
    }

    async fn append_message(
        &self,
        contact_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> AppResult<Message> {
        if self.fail_append_message {
            return Err(AppError::Persistence("message insert refused".to_owned()));
        }
        self.inner.append_message(contact_id, sender_id, body).await
    }

    async fn messages_for(&self, contact_id: Uuid) -> AppResult<Vec<Message>> {
        self.inner.messages_for(contact_id).await
    }
}

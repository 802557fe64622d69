use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{AppError, AppResult};

use super::{ContactEntry, ContactStore, Message, RequestEntry, UserRef, now_millis, ordered_pair};

#[derive(Debug, Clone)]
struct RequestRow {
    id: Uuid,
    emisor: Uuid,
    receptor: Uuid,
}

#[derive(Debug, Clone)]
struct ContactRow {
    id: Uuid,
    user_a: Uuid,
    user_b: Uuid,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, UserRef>,
    requests: Vec<RequestRow>,
    contacts: Vec<ContactRow>,
    likes: HashSet<(Uuid, Uuid)>,
    messages: Vec<Message>,
}

/// In-memory [`ContactStore`], mainly for tests. Same invariants as the
/// SQLite store, minus durability.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account creation lives outside this subsystem; tests seed users here.
    pub fn add_user(&self, name: &str, email: &str) -> Uuid {
        let id = Uuid::now_v7();
        self.inner.lock().unwrap().users.insert(
            id,
            UserRef {
                id,
                name: name.to_owned(),
                email: email.to_owned(),
            },
        );
        id
    }

    pub fn pending_request_count(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }

    pub fn contact_count(&self) -> usize {
        self.inner.lock().unwrap().contacts.len()
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn user_by_email(&self, email: &str) -> AppResult<Option<UserRef>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn user_exists(&self, user_id: Uuid) -> AppResult<bool> {
        Ok(self.inner.lock().unwrap().users.contains_key(&user_id))
    }

    async fn pending_request(&self, emisor: Uuid, receptor: Uuid) -> AppResult<Option<Uuid>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .requests
            .iter()
            .find(|r| r.emisor == emisor && r.receptor == receptor)
            .map(|r| r.id))
    }

    async fn insert_request(&self, emisor: Uuid, receptor: Uuid) -> AppResult<Uuid> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .requests
            .iter()
            .any(|r| r.emisor == emisor && r.receptor == receptor)
        {
            return Err(AppError::AlreadyExists("request"));
        }
        let id = Uuid::now_v7();
        inner.requests.push(RequestRow {
            id,
            emisor,
            receptor,
        });
        Ok(id)
    }

    async fn request_emisor(&self, request_id: Uuid) -> AppResult<Option<Uuid>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .requests
            .iter()
            .find(|r| r.id == request_id)
            .map(|r| r.emisor))
    }

    async fn delete_request(&self, request_id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.requests.len();
        inner.requests.retain(|r| r.id != request_id);
        Ok(inner.requests.len() < before)
    }

    async fn requests_for(&self, receptor: Uuid) -> AppResult<Vec<RequestEntry>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .requests
            .iter()
            .filter(|r| r.receptor == receptor)
            .filter_map(|r| {
                let emisor = inner.users.get(&r.emisor)?;
                Some(RequestEntry {
                    request_id: r.id,
                    emisor_id: emisor.id,
                    emisor_name: emisor.name.clone(),
                    emisor_email: emisor.email.clone(),
                })
            })
            .collect())
    }

    async fn has_contact(&self, a: Uuid, b: Uuid) -> AppResult<bool> {
        let (a, b) = ordered_pair(a, b);
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .contacts
            .iter()
            .any(|c| c.user_a == a && c.user_b == b))
    }

    async fn insert_contact(&self, a: Uuid, b: Uuid) -> AppResult<Uuid> {
        let (a, b) = ordered_pair(a, b);
        let mut inner = self.inner.lock().unwrap();
        if inner
            .contacts
            .iter()
            .any(|c| c.user_a == a && c.user_b == b)
        {
            return Err(AppError::AlreadyExists("contact"));
        }
        let id = Uuid::now_v7();
        inner.contacts.push(ContactRow {
            id,
            user_a: a,
            user_b: b,
        });
        Ok(id)
    }

    async fn contact_members(&self, contact_id: Uuid) -> AppResult<Option<(Uuid, Uuid)>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .contacts
            .iter()
            .find(|c| c.id == contact_id)
            .map(|c| (c.user_a, c.user_b)))
    }

    async fn delete_contact(&self, contact_id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.contacts.len();
        inner.contacts.retain(|c| c.id != contact_id);
        Ok(inner.contacts.len() < before)
    }

    async fn contacts_for(&self, user_id: Uuid) -> AppResult<Vec<ContactEntry>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .contacts
            .iter()
            .filter(|c| c.user_a == user_id || c.user_b == user_id)
            .filter_map(|c| {
                let peer_id = if c.user_a == user_id { c.user_b } else { c.user_a };
                let peer = inner.users.get(&peer_id)?;
                Some(ContactEntry {
                    contact_id: c.id,
                    peer_id,
                    peer_name: peer.name.clone(),
                    peer_email: peer.email.clone(),
                })
            })
            .collect())
    }

    async fn insert_like(&self, emisor: Uuid, receptor: Uuid) -> AppResult<bool> {
        Ok(self.inner.lock().unwrap().likes.insert((emisor, receptor)))
    }

    async fn delete_like(&self, emisor: Uuid, receptor: Uuid) -> AppResult<bool> {
        Ok(self.inner.lock().unwrap().likes.remove(&(emisor, receptor)))
    }

    async fn has_like(&self, emisor: Uuid, receptor: Uuid) -> AppResult<bool> {
        Ok(self.inner.lock().unwrap().likes.contains(&(emisor, receptor)))
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
        self.inner.lock().unwrap().messages.push(message.clone());
        Ok(message)
    }

    async fn messages_for(&self, contact_id: Uuid) -> AppResult<Vec<Message>> {
        let inner = self.inner.lock().unwrap();
        let mut messages: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| m.contact_id == contact_id)
            .cloned()
            .collect();
        messages.sort_by(|x, y| (x.sent_at, x.id).cmp(&(y.sent_at, y.id)));
        Ok(messages)
    }
}

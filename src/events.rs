use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{ContactEntry, Message, RequestEntry};

/// One JSON text frame from a client: `{"event": "...", "data": {...}}`.
///
/// `contactId` and `matchId` name the same thing on the wire; older clients
/// from the room/profile variant send `matchId`, so both are accepted.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum InboundEvent {
    SendRequest {
        email: String,
    },
    #[serde(rename_all = "camelCase")]
    AcceptRequest {
        request_id: Uuid,
    },
    #[serde(rename_all = "camelCase")]
    RejectRequest {
        request_id: Uuid,
    },
    #[serde(rename_all = "camelCase")]
    DeleteContact {
        contact_id: Uuid,
    },
    GetAllContacts,
    GetAllRequests,
    #[serde(rename_all = "camelCase")]
    SendMessage {
        new_message: String,
        #[serde(alias = "matchId")]
        contact_id: Uuid,
        /// Legacy field; the session identity wins.
        #[serde(rename = "id_emisor", default)]
        id_emisor: Option<Uuid>,
    },
    #[serde(rename_all = "camelCase")]
    GetAllMessages {
        #[serde(alias = "matchId")]
        contact_id: Uuid,
    },
    #[serde(rename_all = "camelCase")]
    SendLike {
        receptor_id: Uuid,
    },
    #[serde(rename_all = "camelCase")]
    DeleteLike {
        receptor_id: Uuid,
    },
}

/// One JSON text frame pushed to a client session.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OutboundEvent {
    RequestList(Vec<RequestEntry>),
    ContactsList(Vec<ContactEntry>),
    MessagesList(Vec<Message>),
    SendRequestError { error: String },
    MessageError { error: String },
    Error { error: String },
}

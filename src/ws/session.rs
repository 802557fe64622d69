//! Per-connection loop: register the session, forward pushed events to the
//! socket, and dispatch inbound frames until the peer goes away.

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::events::{InboundEvent, OutboundEvent};
use crate::registry::SessionHandle;
use crate::{AppState, chat, contacts, fanout};

pub(crate) async fn run(socket: WebSocket, state: AppState, user_id: Uuid) {
    let (mut sink, mut stream) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = SessionHandle::new(tx);
    let session_id = handle.session_id();
    state.registry.register(user_id, handle).await;
    tracing::info!(%user_id, %session_id, "user connected");

    let forward_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = stream.next().await {
        let text = match frame {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<InboundEvent>(&text) {
            Ok(event) => dispatch(&state, user_id, event).await,
            Err(err) => {
                tracing::debug!(%user_id, %err, "dropping malformed event frame");
                state
                    .registry
                    .push(
                        user_id,
                        OutboundEvent::Error {
                            error: "malformed event".to_owned(),
                        },
                    )
                    .await;
            }
        }
    }

    state.registry.unregister_if(user_id, session_id).await;
    forward_task.abort();
    tracing::info!(%user_id, %session_id, "user disconnected");
}

/// Failures never escape a handler: the initiator gets a named error event,
/// everyone else sees nothing.
async fn dispatch(state: &AppState, user_id: Uuid, event: InboundEvent) {
    let store = state.store.as_ref();
    let registry = &state.registry;

    match event {
        InboundEvent::SendRequest { email } => {
            if let Err(err) = contacts::send_request(store, registry, user_id, &email).await {
                tracing::warn!(%user_id, %err, "sendRequest failed");
                registry
                    .push(
                        user_id,
                        OutboundEvent::SendRequestError {
                            error: err.to_string(),
                        },
                    )
                    .await;
            }
        }
        InboundEvent::AcceptRequest { request_id } => {
            if let Err(err) = contacts::accept_request(store, registry, user_id, request_id).await {
                report(state, user_id, "acceptRequest", err).await;
            }
        }
        InboundEvent::RejectRequest { request_id } => {
            if let Err(err) = contacts::reject_request(store, registry, user_id, request_id).await {
                report(state, user_id, "rejectRequest", err).await;
            }
        }
        InboundEvent::DeleteContact { contact_id } => {
            if let Err(err) = contacts::delete_contact(store, registry, contact_id).await {
                report(state, user_id, "deleteContact", err).await;
            }
        }
        InboundEvent::GetAllContacts => {
            if let Err(err) = fanout::push_contacts(store, registry, user_id).await {
                report(state, user_id, "getAllContacts", err).await;
            }
        }
        InboundEvent::GetAllRequests => {
            if let Err(err) = fanout::push_requests(store, registry, user_id).await {
                report(state, user_id, "getAllRequests", err).await;
            }
        }
        InboundEvent::SendMessage {
            new_message,
            contact_id,
            id_emisor: _,
        } => {
            if let Err(err) =
                chat::post_message(store, registry, contact_id, user_id, &new_message).await
            {
                tracing::warn!(%user_id, %contact_id, %err, "sendMessage failed");
                registry
                    .push(
                        user_id,
                        OutboundEvent::MessageError {
                            error: err.to_string(),
                        },
                    )
                    .await;
            }
        }
        InboundEvent::GetAllMessages { contact_id } => {
            match chat::list_messages(store, contact_id).await {
                Ok(messages) => {
                    registry
                        .push(user_id, OutboundEvent::MessagesList(messages))
                        .await;
                }
                Err(err) => {
                    tracing::warn!(%user_id, %contact_id, %err, "getAllMessages failed");
                    registry
                        .push(
                            user_id,
                            OutboundEvent::MessageError {
                                error: err.to_string(),
                            },
                        )
                        .await;
                }
            }
        }
        InboundEvent::SendLike { receptor_id } => {
            if let Err(err) = contacts::send_like(store, registry, user_id, receptor_id).await {
                report(state, user_id, "sendLike", err).await;
            }
        }
        InboundEvent::DeleteLike { receptor_id } => {
            if let Err(err) = contacts::delete_like(store, user_id, receptor_id).await {
                report(state, user_id, "deleteLike", err).await;
            }
        }
    }
}

async fn report(state: &AppState, user_id: Uuid, op: &str, err: crate::AppError) {
    tracing::warn!(%user_id, op, %err, "event handler failed");
    state
        .registry
        .push(
            user_id,
            OutboundEvent::Error {
                error: err.to_string(),
            },
        )
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ContactStore, MemoryStore};
    use std::sync::Arc;
    use tokio::sync::mpsc::UnboundedReceiver;

    async fn connected_state(
        store: MemoryStore,
        user: Uuid,
    ) -> (AppState, UnboundedReceiver<OutboundEvent>) {
        let state = AppState::new(Arc::new(store));
        let (tx, rx) = mpsc::unbounded_channel();
        state.registry.register(user, SessionHandle::new(tx)).await;
        (state, rx)
    }

    #[tokio::test]
    async fn failed_send_request_reaches_only_the_initiator() {
        let store = MemoryStore::new();
        let ana = store.add_user("Ana", "ana@test.com");
        let (state, mut ana_rx) = connected_state(store, ana).await;

        dispatch(
            &state,
            ana,
            InboundEvent::SendRequest {
                email: "nobody@test.com".to_owned(),
            },
        )
        .await;

        let Ok(OutboundEvent::SendRequestError { error }) = ana_rx.try_recv() else {
            panic!("initiator should see a sendRequestError");
        };
        assert!(error.contains("not found"));
    }

    #[tokio::test]
    async fn get_all_messages_goes_to_the_requester_only() {
        let store = MemoryStore::new();
        let ana = store.add_user("Ana", "ana@test.com");
        let ben = store.add_user("Ben", "ben@test.com");
        let contact_id = store.insert_contact(ana, ben).await.unwrap();
        store.append_message(contact_id, ana, "hi").await.unwrap();

        let (state, mut ana_rx) = connected_state(store, ana).await;
        let (ben_tx, mut ben_rx) = mpsc::unbounded_channel();
        state
            .registry
            .register(ben, SessionHandle::new(ben_tx))
            .await;

        dispatch(&state, ana, InboundEvent::GetAllMessages { contact_id }).await;

        let Ok(OutboundEvent::MessagesList(messages)) = ana_rx.try_recv() else {
            panic!("requester should receive the log");
        };
        assert_eq!(messages.len(), 1);
        assert!(ben_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_message_persist_errors_the_sender_without_fanout() {
        let memory = MemoryStore::new();
        let ana = memory.add_user("Ana", "ana@test.com");
        let ben = memory.add_user("Ben", "ben@test.com");
        let store = Arc::new(crate::store::FaultyStore::new(memory).fail_append_message());
        let contact_id = store.insert_contact(ana, ben).await.unwrap();

        let state = AppState::new(store.clone());
        let (ana_tx, mut ana_rx) = mpsc::unbounded_channel();
        let (ben_tx, mut ben_rx) = mpsc::unbounded_channel();
        state
            .registry
            .register(ana, SessionHandle::new(ana_tx))
            .await;
        state
            .registry
            .register(ben, SessionHandle::new(ben_tx))
            .await;

        dispatch(
            &state,
            ana,
            InboundEvent::SendMessage {
                new_message: "hi".to_owned(),
                contact_id,
                id_emisor: None,
            },
        )
        .await;

        let Ok(OutboundEvent::MessageError { error }) = ana_rx.try_recv() else {
            panic!("sender should see a messageError");
        };
        assert!(error.contains("persistence failure"));
        assert!(ana_rx.try_recv().is_err());
        assert!(ben_rx.try_recv().is_err());
        assert!(
            store
                .inner()
                .messages_for(contact_id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn reject_of_unknown_request_reports_error() {
        let store = MemoryStore::new();
        let ana = store.add_user("Ana", "ana@test.com");
        let (state, mut ana_rx) = connected_state(store, ana).await;

        dispatch(
            &state,
            ana,
            InboundEvent::RejectRequest {
                request_id: Uuid::now_v7(),
            },
        )
        .await;

        assert!(matches!(
            ana_rx.try_recv(),
            Ok(OutboundEvent::Error { .. })
        ));
    }
}

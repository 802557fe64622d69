//! Match-scoped chat. A message is persisted first; only then is the full
//! refreshed log pushed to both members. Nothing is delivered for a post
//! that failed to persist.

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::fanout;
use crate::registry::Registry;
use crate::store::{ContactStore, Message};

pub async fn post_message(
    store: &dyn ContactStore,
    registry: &Registry,
    contact_id: Uuid,
    sender_id: Uuid,
    body: &str,
) -> AppResult<()> {
    let members = store
        .contact_members(contact_id)
        .await?
        .ok_or(AppError::NotFound("contact"))?;

    store.append_message(contact_id, sender_id, body).await?;

    fanout::push_messages(store, registry, contact_id, members).await
}

/// Pure read; the dispatcher sends the result to the requesting session only.
pub async fn list_messages(
    store: &dyn ContactStore,
    contact_id: Uuid,
) -> AppResult<Vec<Message>> {
    store.messages_for(contact_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::OutboundEvent;
    use crate::registry::SessionHandle;
    use crate::store::MemoryStore;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    async fn connect(registry: &Registry, user: Uuid) -> UnboundedReceiver<OutboundEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        registry.register(user, SessionHandle::new(tx)).await;
        rx
    }

    #[tokio::test]
    async fn both_members_receive_the_full_refreshed_log() {
        let store = MemoryStore::new();
        let registry = Registry::new();
        let ana = store.add_user("Ana", "ana@test.com");
        let ben = store.add_user("Ben", "ben@test.com");
        let contact_id = store.insert_contact(ana, ben).await.unwrap();

        let mut ana_rx = connect(&registry, ana).await;
        let mut ben_rx = connect(&registry, ben).await;

        post_message(&store, &registry, contact_id, ana, "hi")
            .await
            .unwrap();

        for rx in [&mut ana_rx, &mut ben_rx] {
            let Ok(OutboundEvent::MessagesList(messages)) = rx.try_recv() else {
                panic!("both members should receive the log");
            };
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].body, "hi");
            assert_eq!(messages[0].sender_id, ana);
        }

        post_message(&store, &registry, contact_id, ben, "hey")
            .await
            .unwrap();

        for rx in [&mut ana_rx, &mut ben_rx] {
            let Ok(OutboundEvent::MessagesList(messages)) = rx.try_recv() else {
                panic!("both members should receive the refreshed log");
            };
            assert_eq!(
                messages.iter().map(|m| m.body.as_str()).collect::<Vec<_>>(),
                ["hi", "hey"]
            );
        }
    }

    #[tokio::test]
    async fn new_message_lists_last_with_nondecreasing_timestamps() {
        let store = MemoryStore::new();
        let registry = Registry::new();
        let ana = store.add_user("Ana", "ana@test.com");
        let ben = store.add_user("Ben", "ben@test.com");
        let contact_id = store.insert_contact(ana, ben).await.unwrap();

        for body in ["one", "two", "three"] {
            post_message(&store, &registry, contact_id, ana, body)
                .await
                .unwrap();
        }

        let messages = list_messages(&store, contact_id).await.unwrap();
        assert_eq!(messages.last().unwrap().body, "three");
        assert!(messages.windows(2).all(|w| w[0].sent_at <= w[1].sent_at));
    }

    #[tokio::test]
    async fn post_to_missing_contact_fails_without_fanout() {
        let store = MemoryStore::new();
        let registry = Registry::new();
        let ana = store.add_user("Ana", "ana@test.com");
        let mut ana_rx = connect(&registry, ana).await;

        let missing = Uuid::now_v7();
        let err = post_message(&store, &registry, missing, ana, "hello?")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound("contact")));
        assert!(ana_rx.try_recv().is_err());
        assert!(list_messages(&store, missing).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn offline_member_is_skipped_silently() {
        let store = MemoryStore::new();
        let registry = Registry::new();
        let ana = store.add_user("Ana", "ana@test.com");
        let ben = store.add_user("Ben", "ben@test.com");
        let contact_id = store.insert_contact(ana, ben).await.unwrap();

        let mut ana_rx = connect(&registry, ana).await;
        // ben never connects

        post_message(&store, &registry, contact_id, ana, "hi")
            .await
            .unwrap();

        assert!(matches!(
            ana_rx.try_recv(),
            Ok(OutboundEvent::MessagesList(_))
        ));
        assert_eq!(list_messages(&store, contact_id).await.unwrap().len(), 1);
    }
}

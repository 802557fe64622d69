//! Push refreshed state to live sessions. Sessions are resolved before any
//! query runs, so nothing is fetched for users who are offline; an offline
//! party is always a silent no-op.

use uuid::Uuid;

use crate::AppResult;
use crate::events::OutboundEvent;
use crate::registry::Registry;
use crate::store::ContactStore;

pub async fn push_contacts(
    store: &dyn ContactStore,
    registry: &Registry,
    user_id: Uuid,
) -> AppResult<()> {
    let Some(handle) = registry.resolve(user_id).await else {
        return Ok(());
    };
    let contacts = store.contacts_for(user_id).await?;
    handle.send(OutboundEvent::ContactsList(contacts));
    Ok(())
}

pub async fn push_requests(
    store: &dyn ContactStore,
    registry: &Registry,
    user_id: Uuid,
) -> AppResult<()> {
    let Some(handle) = registry.resolve(user_id).await else {
        return Ok(());
    };
    let requests = store.requests_for(user_id).await?;
    handle.send(OutboundEvent::RequestList(requests));
    Ok(())
}

/// Full refreshed log to every connected member; clients replace, never patch.
pub async fn push_messages(
    store: &dyn ContactStore,
    registry: &Registry,
    contact_id: Uuid,
    members: (Uuid, Uuid),
) -> AppResult<()> {
    let mut handles = Vec::with_capacity(2);
    for member in [members.0, members.1] {
        if let Some(handle) = registry.resolve(member).await {
            handles.push(handle);
        }
    }
    if handles.is_empty() {
        return Ok(());
    }

    let messages = store.messages_for(contact_id).await?;
    for handle in handles {
        handle.send(OutboundEvent::MessagesList(messages.clone()));
    }
    Ok(())
}

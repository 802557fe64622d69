//! Request → contact lifecycle, plus the like → match variant.
//!
//! Per unordered pair the states are: none, one pending request (directed),
//! or one active contact. The store's constraints keep concurrent writers
//! honest; anything they reject surfaces as `AlreadyExists`.

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::fanout;
use crate::registry::Registry;
use crate::store::ContactStore;

/// Resolve the target by email and open a pending request towards them.
///
/// A pending request in the opposite direction counts as mutual interest:
/// the second request accepts the first instead of creating a parallel edge.
pub async fn send_request(
    store: &dyn ContactStore,
    registry: &Registry,
    emisor: Uuid,
    email: &str,
) -> AppResult<()> {
    let target = store
        .user_by_email(email)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    if target.id == emisor {
        return Err(AppError::SelfReference);
    }
    if store.has_contact(emisor, target.id).await? {
        return Err(AppError::AlreadyExists("contact"));
    }

    if let Some(request_id) = store.pending_request(target.id, emisor).await? {
        return accept_request(store, registry, emisor, request_id).await;
    }
    if store.pending_request(emisor, target.id).await?.is_some() {
        return Err(AppError::AlreadyExists("request"));
    }

    store.insert_request(emisor, target.id).await?;
    tracing::debug!(%emisor, target = %target.id, "request sent");

    fanout::push_requests(store, registry, target.id).await
}

/// The contact is created before the request is deleted: a failure in between
/// leaves the request pending rather than half of a relationship.
pub async fn accept_request(
    store: &dyn ContactStore,
    registry: &Registry,
    receptor: Uuid,
    request_id: Uuid,
) -> AppResult<()> {
    let emisor = store
        .request_emisor(request_id)
        .await?
        .ok_or(AppError::NotFound("request"))?;

    store.insert_contact(emisor, receptor).await?;
    store.delete_request(request_id).await?;
    tracing::debug!(%emisor, %receptor, "request accepted");

    fanout::push_contacts(store, registry, emisor).await?;
    fanout::push_contacts(store, registry, receptor).await?;
    fanout::push_requests(store, registry, receptor).await
}

pub async fn reject_request(
    store: &dyn ContactStore,
    registry: &Registry,
    user_id: Uuid,
    request_id: Uuid,
) -> AppResult<()> {
    if !store.delete_request(request_id).await? {
        return Err(AppError::NotFound("request"));
    }
    fanout::push_requests(store, registry, user_id).await
}

/// Members are resolved before the delete; they are gone from the store after.
pub async fn delete_contact(
    store: &dyn ContactStore,
    registry: &Registry,
    contact_id: Uuid,
) -> AppResult<()> {
    let (member_a, member_b) = store
        .contact_members(contact_id)
        .await?
        .ok_or(AppError::NotFound("contact"))?;

    if !store.delete_contact(contact_id).await? {
        return Err(AppError::NotFound("contact"));
    }
    tracing::debug!(%contact_id, "contact deleted");

    fanout::push_contacts(store, registry, member_a).await?;
    fanout::push_contacts(store, registry, member_b).await
}

/// Directed interest edge. A reciprocal like promotes the pair to an active
/// match; both parties then get their refreshed contact lists.
pub async fn send_like(
    store: &dyn ContactStore,
    registry: &Registry,
    emisor: Uuid,
    receptor: Uuid,
) -> AppResult<()> {
    if emisor == receptor {
        return Err(AppError::SelfReference);
    }
    if !store.user_exists(emisor).await? || !store.user_exists(receptor).await? {
        return Err(AppError::NotFound("user"));
    }

    if !store.insert_like(emisor, receptor).await? {
        return Err(AppError::AlreadyExists("like"));
    }

    if store.has_like(receptor, emisor).await? && !store.has_contact(emisor, receptor).await? {
        store.insert_contact(emisor, receptor).await?;
        tracing::debug!(%emisor, %receptor, "reciprocal likes promoted to match");
        fanout::push_contacts(store, registry, emisor).await?;
        fanout::push_contacts(store, registry, receptor).await?;
    }
    Ok(())
}

pub async fn delete_like(
    store: &dyn ContactStore,
    emisor: Uuid,
    receptor: Uuid,
) -> AppResult<()> {
    if !store.delete_like(emisor, receptor).await? {
        return Err(AppError::NotFound("like"));
    }
    Ok(())
}

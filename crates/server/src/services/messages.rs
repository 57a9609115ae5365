//! Direct messages between accounts.

use tracing::{info, instrument};

use supplyhub_core::{Actor, MessageId, UserId};

use super::LifecycleError;
use crate::db::Store;
use crate::models::{Message, NewMessage};

/// Sends and lists direct messages.
#[derive(Debug, Clone)]
pub struct MessageService<S> {
    store: S,
}

impl<S: Store> MessageService<S> {
    /// Create the service over `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Send `text` from the actor to `receiver`.
    ///
    /// # Errors
    ///
    /// - `EmptyMessage` if `text` is blank
    /// - `NotFound` if the receiver does not exist
    #[instrument(skip(self, text), fields(actor = %actor.id))]
    pub async fn send(
        &self,
        actor: Actor,
        receiver: UserId,
        text: &str,
    ) -> Result<Message, LifecycleError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LifecycleError::EmptyMessage);
        }

        let message = self
            .store
            .insert_message(&NewMessage {
                sender_id: actor.id,
                receiver_id: receiver,
                message: text.to_string(),
            })
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("user {receiver}")))?;

        info!(message_id = %message.id, %receiver, "Message sent");
        Ok(message)
    }

    /// The actor's messages.
    ///
    /// With `with` set, the conversation with that account, oldest first.
    /// Otherwise everything the actor sent or received, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the store fails.
    pub async fn list(
        &self,
        actor: Actor,
        with: Option<UserId>,
    ) -> Result<Vec<Message>, LifecycleError> {
        Ok(self.store.list_messages(actor.id, with).await?)
    }

    /// Mark a message the actor received as read.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the message does not exist or was sent to
    /// someone else.
    pub async fn mark_read(&self, actor: Actor, id: MessageId) -> Result<(), LifecycleError> {
        if self.store.mark_message_read(id, actor.id).await? {
            Ok(())
        } else {
            Err(LifecycleError::NotFound(format!("message {id}")))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use supplyhub_core::{Email, Role};

    use super::*;
    use crate::db::{MemoryStore, UserStore};
    use crate::models::NewUser;

    async fn account(store: &MemoryStore, email: &str, role: Role) -> Actor {
        let user = store
            .create_user(&NewUser {
                email: Email::parse(email).unwrap(),
                name: email.to_string(),
                role,
                is_approved: true,
            })
            .await
            .unwrap();
        Actor::new(user.id, role)
    }

    #[tokio::test]
    async fn test_send_trims_and_stores() {
        let store = MemoryStore::new();
        let buyer = account(&store, "buyer@example.com", Role::User).await;
        let admin = account(&store, "admin@example.com", Role::Admin).await;
        let service = MessageService::new(store);

        let sent = service.send(buyer, admin.id, "  Need 20 more bags  ").await.unwrap();
        assert_eq!(sent.message, "Need 20 more bags");
        assert_eq!(sent.receiver.role, Role::Admin);
        assert!(!sent.is_read);

        let thread = service.list(admin, Some(buyer.id)).await.unwrap();
        assert_eq!(thread, vec![sent]);
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let store = MemoryStore::new();
        let buyer = account(&store, "buyer@example.com", Role::User).await;
        let admin = account(&store, "admin@example.com", Role::Admin).await;

        let err = MessageService::new(store)
            .send(buyer, admin.id, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::EmptyMessage));
    }

    #[tokio::test]
    async fn test_unknown_receiver() {
        let store = MemoryStore::new();
        let buyer = account(&store, "buyer@example.com", Role::User).await;

        let err = MessageService::new(store)
            .send(buyer, UserId::new(404), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_only_receiver_marks_read() {
        let store = MemoryStore::new();
        let buyer = account(&store, "buyer@example.com", Role::User).await;
        let admin = account(&store, "admin@example.com", Role::Admin).await;
        let service = MessageService::new(store);

        let sent = service.send(buyer, admin.id, "hello").await.unwrap();
        let err = service.mark_read(buyer, sent.id).await.unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(_)));
        service.mark_read(admin, sent.id).await.unwrap();
        assert!(service.list(admin, None).await.unwrap().first().unwrap().is_read);
    }
}

//! Account approval and the account directory.

use tracing::{info, instrument};

use supplyhub_core::{Actor, NotificationKind, Role, UserId};

use super::LifecycleError;
use super::notifications::{NotificationEmitter, account_approved_message};
use crate::db::Store;
use crate::models::User;

/// Approves newly registered accounts and lists accounts by role.
#[derive(Debug, Clone)]
pub struct AccountService<S> {
    store: S,
    notifier: NotificationEmitter<S>,
}

impl<S: Store> AccountService<S> {
    /// Create the service over `store`.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            notifier: NotificationEmitter::new(store.clone()),
            store,
        }
    }

    /// Approve an account. Only super admins may do this.
    ///
    /// The account owner is notified the first time only; approving an
    /// already approved account is a silent no-op.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor is a super admin
    /// - `NotFound` if the account does not exist
    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn approve_account(
        &self,
        actor: Actor,
        user_id: UserId,
    ) -> Result<User, LifecycleError> {
        if actor.role != Role::SuperAdmin {
            return Err(LifecycleError::Forbidden(
                "only super admins may approve accounts".to_string(),
            ));
        }
        Ok(self.approve(user_id).await?.user)
    }

    /// Mark an account approved and notify its owner on the first approval.
    ///
    /// Performs no role check. Used by `approve_account` and by operator
    /// tooling that already runs with full privileges.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist.
    #[instrument(skip(self))]
    pub async fn approve(&self, user_id: UserId) -> Result<Approval, LifecycleError> {
        let before = self
            .store
            .approve_user(user_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("user {user_id}")))?;

        let newly_approved = !before.is_approved;
        if newly_approved {
            info!(%user_id, "Account approved");
            self.notifier
                .emit(
                    user_id,
                    NotificationKind::AccountApproved,
                    account_approved_message(),
                    None,
                )
                .await;
        }

        Ok(Approval {
            user: User {
                is_approved: true,
                ..before
            },
            newly_approved,
        })
    }

    /// List accounts, newest first.
    ///
    /// Anyone signed in may look up accounts by role (to find a staff member
    /// to message, say). Listing every account is reserved to super admins.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` for an unfiltered listing by anyone but a super
    /// admin.
    pub async fn directory(
        &self,
        actor: Actor,
        roles: Option<&[Role]>,
    ) -> Result<Vec<User>, LifecycleError> {
        if roles.is_none() && actor.role != Role::SuperAdmin {
            return Err(LifecycleError::Forbidden(
                "only super admins may list every account".to_string(),
            ));
        }
        Ok(self.store.list_users(roles).await?)
    }
}

/// Result of [`AccountService::approve`].
#[derive(Debug, Clone)]
pub struct Approval {
    /// The account after approval.
    pub user: User,
    /// False when the account was already approved.
    pub newly_approved: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use supplyhub_core::Email;

    use super::*;
    use crate::db::{MemoryStore, NotificationStore, UserStore};
    use crate::models::NewUser;

    async fn account(store: &MemoryStore, email: &str, role: Role, approved: bool) -> Actor {
        let user = store
            .create_user(&NewUser {
                email: Email::parse(email).unwrap(),
                name: email.to_string(),
                role,
                is_approved: approved,
            })
            .await
            .unwrap();
        Actor::new(user.id, role)
    }

    #[tokio::test]
    async fn test_super_admin_approves_once() {
        let store = MemoryStore::new();
        let root = account(&store, "root@example.com", Role::SuperAdmin, true).await;
        let buyer = account(&store, "buyer@example.com", Role::User, false).await;
        let service = AccountService::new(store.clone());

        let user = service.approve_account(root, buyer.id).await.unwrap();
        assert!(user.is_approved);
        assert!(store.get_user(buyer.id).await.unwrap().unwrap().is_approved);

        service.approve_account(root, buyer.id).await.unwrap();
        assert_eq!(store.unread_count(buyer.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_admin_cannot_approve() {
        let store = MemoryStore::new();
        let admin = account(&store, "admin@example.com", Role::Admin, true).await;
        let buyer = account(&store, "buyer@example.com", Role::User, false).await;

        let err = AccountService::new(store.clone())
            .approve_account(admin, buyer.id)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Forbidden(_)));
        assert!(!store.get_user(buyer.id).await.unwrap().unwrap().is_approved);
    }

    #[tokio::test]
    async fn test_approve_without_actor_reports_first_approval() {
        let store = MemoryStore::new();
        let buyer = account(&store, "buyer@example.com", Role::User, false).await;
        let service = AccountService::new(store.clone());

        assert!(service.approve(buyer.id).await.unwrap().newly_approved);
        let again = service.approve(buyer.id).await.unwrap();
        assert!(!again.newly_approved);
        assert!(again.user.is_approved);
        assert_eq!(store.unread_count(buyer.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_directory_filters_by_role() {
        let store = MemoryStore::new();
        let root = account(&store, "root@example.com", Role::SuperAdmin, true).await;
        let admin = account(&store, "admin@example.com", Role::Admin, true).await;
        let buyer = account(&store, "buyer@example.com", Role::User, true).await;
        let service = AccountService::new(store);

        let staff = service
            .directory(buyer, Some(&[Role::Admin, Role::SuperAdmin]))
            .await
            .unwrap();
        let ids: Vec<_> = staff.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![admin.id, root.id]);

        let everyone = service.directory(root, None).await.unwrap();
        assert_eq!(everyone.len(), 3);
        assert_eq!(everyone.first().unwrap().id, buyer.id);
    }

    #[tokio::test]
    async fn test_unfiltered_directory_is_super_admin_only() {
        let store = MemoryStore::new();
        let admin = account(&store, "admin@example.com", Role::Admin, true).await;
        let err = AccountService::new(store)
            .directory(admin, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let store = MemoryStore::new();
        let root = account(&store, "root@example.com", Role::SuperAdmin, true).await;
        let err = AccountService::new(store)
            .approve_account(root, UserId::new(77))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(_)));
    }
}

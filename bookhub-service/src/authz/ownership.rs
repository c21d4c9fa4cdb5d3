use std::sync::Arc;

use super::error::AuthzError;
use super::identity::Identity;
use crate::services::store::OwnershipStore;

/// Admits the owner of a resource, or any admin.
///
/// Existence is resolved before ownership so that a missing resource is
/// always reported as absent, never as forbidden.
#[derive(Clone)]
pub struct OwnershipAuthorizer {
    store: Arc<dyn OwnershipStore>,
    resource: &'static str,
}

impl OwnershipAuthorizer {
    pub fn new(store: Arc<dyn OwnershipStore>, resource: &'static str) -> Self {
        Self { store, resource }
    }

    pub async fn authorize(&self, identity: &Identity, resource_id: i64) -> Result<(), AuthzError> {
        let record = self
            .store
            .find_ownership_record(resource_id)
            .await
            .map_err(AuthzError::InternalFault)?
            .ok_or(AuthzError::ResourceNotFound {
                resource: self.resource,
                resource_id: Some(resource_id),
            })?;

        if record.owner_id == identity.subject_id || identity.is_admin() {
            Ok(())
        } else {
            Err(AuthzError::OwnershipDenied {
                resource: self.resource,
                subject_id: identity.subject_id,
                resource_id,
            })
        }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::Role;
    use crate::services::store::MemoryStore;

    fn authorizer(store: &Arc<MemoryStore>) -> OwnershipAuthorizer {
        OwnershipAuthorizer::new(store.clone(), "Review")
    }

    #[tokio::test]
    async fn owner_is_allowed() {
        let store = Arc::new(MemoryStore::new());
        store.insert_review_owner(7, 1);

        let result = authorizer(&store)
            .authorize(&Identity::new(1, Role::User), 7)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn other_user_is_denied() {
        let store = Arc::new(MemoryStore::new());
        store.insert_review_owner(7, 1);

        let result = authorizer(&store)
            .authorize(&Identity::new(2, Role::User), 7)
            .await;
        assert!(matches!(
            result,
            Err(AuthzError::OwnershipDenied {
                subject_id: 2,
                resource_id: 7,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn admin_bypasses_ownership() {
        let store = Arc::new(MemoryStore::new());
        store.insert_review_owner(7, 1);

        let result = authorizer(&store)
            .authorize(&Identity::new(2, Role::Admin), 7)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn missing_resource_is_not_found_for_everyone() {
        let store = Arc::new(MemoryStore::new());
        let authz = authorizer(&store);

        for identity in [Identity::new(1, Role::User), Identity::new(2, Role::Admin)] {
            let result = authz.authorize(&identity, 999).await;
            assert!(matches!(
                result,
                Err(AuthzError::ResourceNotFound {
                    resource_id: Some(999),
                    ..
                })
            ));
        }
    }

    #[tokio::test]
    async fn store_fault_is_internal_not_denial() {
        let store = Arc::new(MemoryStore::new());
        store.insert_review_owner(7, 1);
        store.set_failing(true);

        let result = authorizer(&store)
            .authorize(&Identity::new(1, Role::User), 7)
            .await;
        assert!(matches!(result, Err(AuthzError::InternalFault(_))));
    }

    #[tokio::test]
    async fn repeated_decisions_agree() {
        let store = Arc::new(MemoryStore::new());
        store.insert_review_owner(7, 1);
        let authz = authorizer(&store);
        let stranger = Identity::new(2, Role::User);

        for _ in 0..3 {
            assert!(matches!(
                authz.authorize(&stranger, 7).await,
                Err(AuthzError::OwnershipDenied { .. })
            ));
        }
    }
}

//! Upload authorization
//!
//! Experiments are private: only their owner may attach files. Items (database entries
//! such as reagents or equipment) accept uploads from any authenticated user, so no
//! lookup is made for them.
//!
//! The item rule is inherited behaviour, not a reviewed policy. Whether items really are
//! shared resources or should also be owner-restricted needs a product decision; until
//! then the rule stays as it is.

use std::sync::Arc;

use labstore_core::{EntityType, PrincipalId, TargetReference, UploadError};
use labstore_db::OwnershipLookup;

#[derive(Clone)]
pub struct PermissionGuard {
    ownership: Arc<dyn OwnershipLookup>,
}

impl PermissionGuard {
    pub fn new(ownership: Arc<dyn OwnershipLookup>) -> Self {
        Self { ownership }
    }

    /// Check that `principal` may attach content to `target`.
    pub async fn authorize(
        &self,
        target: &TargetReference,
        principal: PrincipalId,
    ) -> Result<(), UploadError> {
        match target.entity_type() {
            EntityType::Item => Ok(()),
            EntityType::Experiment => {
                let owned = self
                    .ownership
                    .is_owned_by(target.entity_id(), target.entity_type(), principal)
                    .await
                    .map_err(|e| {
                        tracing::error!(
                            error = %e,
                            entity_id = target.entity_id(),
                            principal = %principal,
                            "Ownership lookup failed"
                        );
                        UploadError::OwnershipLookupFailed(format!("{:#}", e))
                    })?;

                if !owned {
                    tracing::warn!(
                        entity_type = %target.entity_type(),
                        entity_id = target.entity_id(),
                        principal = %principal,
                        "Rejected upload to experiment not owned by principal"
                    );
                    return Err(UploadError::PermissionDenied {
                        entity_type: target.entity_type(),
                        entity_id: target.entity_id(),
                        principal,
                    });
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Experiment 1 belongs to principal 10; everything else to nobody.
    struct FixedOwners {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FixedOwners {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl OwnershipLookup for FixedOwners {
        async fn is_owned_by(
            &self,
            entity_id: i64,
            _entity_type: EntityType,
            principal: PrincipalId,
        ) -> anyhow::Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(entity_id == 1 && principal.get() == 10)
        }
    }

    fn principal(id: i64) -> PrincipalId {
        PrincipalId::new(id).unwrap()
    }

    #[tokio::test]
    async fn owner_may_upload_to_experiment() {
        let guard = PermissionGuard::new(Arc::new(FixedOwners::new(false)));
        let target = TargetReference::new(EntityType::Experiment, 1).unwrap();
        assert!(guard.authorize(&target, principal(10)).await.is_ok());
    }

    #[tokio::test]
    async fn non_owner_is_denied() {
        let guard = PermissionGuard::new(Arc::new(FixedOwners::new(false)));
        let target = TargetReference::new(EntityType::Experiment, 1).unwrap();
        let err = guard.authorize(&target, principal(11)).await.unwrap_err();
        assert!(matches!(err, UploadError::PermissionDenied { entity_id: 1, .. }));
    }

    #[tokio::test]
    async fn items_are_open_to_everyone_without_lookup() {
        let owners = Arc::new(FixedOwners::new(false));
        let guard = PermissionGuard::new(owners.clone());
        for (item, user) in [(1, 10), (1, 11), (99, 3)] {
            let target = TargetReference::new(EntityType::Item, item).unwrap();
            assert!(guard.authorize(&target, principal(user)).await.is_ok());
        }
        assert_eq!(owners.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn lookup_failure_is_not_a_grant() {
        let guard = PermissionGuard::new(Arc::new(FixedOwners::new(true)));
        let target = TargetReference::new(EntityType::Experiment, 1).unwrap();
        let err = guard.authorize(&target, principal(10)).await.unwrap_err();
        assert!(matches!(err, UploadError::OwnershipLookupFailed(_)));
    }
}

//! In-memory policy store shared by administrative and issuance callers.
//!
//! # Design
//! - One `RwLock` guards the whole record so multi-field updates commit together.
//! - Updates are staged on a copy and swapped in only when every present field validates.
//! - Committed revisions are published on a `watch` channel so issuance caches can refresh.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::error::PolicyResult;
use crate::model::{AllowedClaims, PolicyConfig, PolicySnapshot, PolicyUpdate};
use crate::schema;
use crate::validate::{compile_pattern, parse_positive_duration};

/// Read/write surface consumed by the administrative interface and the issuance engine.
pub trait PolicyFacade: Send + Sync {
    /// Copy out the current policy.
    fn snapshot(&self) -> PolicySnapshot;
    /// Validate and apply a sparse update, returning the resulting policy.
    ///
    /// # Errors
    ///
    /// Returns the first validation error in field order; nothing is applied in that case.
    fn apply_update(&self, update: PolicyUpdate) -> PolicyResult<PolicySnapshot>;
}

/// Cloneable handle to a single policy record.
#[derive(Clone)]
pub struct PolicyStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: RwLock<PolicySnapshot>,
    revisions: watch::Sender<u64>,
}

impl PolicyStore {
    /// Create a store holding the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PolicyConfig::default())
    }

    /// Create a store holding the supplied policy at revision `0`.
    #[must_use]
    pub fn with_config(config: PolicyConfig) -> Self {
        let snapshot = PolicySnapshot {
            revision: 0,
            updated_at: Utc::now(),
            config,
        };
        let (revisions, _) = watch::channel(snapshot.revision);
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(snapshot),
                revisions,
            }),
        }
    }

    /// Create a store from the defaults overlaid with `seed`, still at revision `0`.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found in `seed`.
    pub fn seeded(seed: PolicyUpdate) -> PolicyResult<Self> {
        let config = stage(&PolicyConfig::default(), seed)?;
        Ok(Self::with_config(config))
    }

    /// Copy out the current policy under the shared lock.
    #[must_use]
    pub fn snapshot(&self) -> PolicySnapshot {
        self.read_state().clone()
    }

    /// Revision of the current policy.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.read_state().revision
    }

    /// Validate and apply a sparse update under the exclusive lock.
    ///
    /// Fields are validated in wire order (`key_ttl` through `allowed_claims`). The first
    /// failure is returned and the stored policy is left untouched. An empty update is a
    /// no-op that returns the current policy without bumping the revision.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PolicyError::InvalidDuration`] or
    /// [`crate::PolicyError::InvalidPattern`] for the first rejected field.
    #[instrument(name = "policy_store.apply_update", skip_all)]
    pub fn apply_update(&self, update: PolicyUpdate) -> PolicyResult<PolicySnapshot> {
        let mut state = self.write_state();
        if update.is_empty() {
            return Ok(state.clone());
        }

        let fields = update.field_names();
        let staged = stage(&state.config, update).inspect_err(|err| {
            warn!(field = err.field(), error = %err, "rejected policy update");
        })?;

        state.revision = state.revision.saturating_add(1);
        state.updated_at = Utc::now();
        state.config = staged;
        let snapshot = state.clone();
        self.inner.revisions.send_replace(snapshot.revision);
        drop(state);

        info!(revision = snapshot.revision, ?fields, "applied policy update");
        Ok(snapshot)
    }

    /// Subscribe to committed updates.
    #[must_use]
    pub fn watch(&self) -> PolicyWatcher {
        PolicyWatcher {
            store: self.clone(),
            receiver: self.inner.revisions.subscribe(),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, PolicySnapshot> {
        // The record is only ever replaced whole, so a poisoned guard still holds a consistent value.
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, PolicySnapshot> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyFacade for PolicyStore {
    fn snapshot(&self) -> PolicySnapshot {
        Self::snapshot(self)
    }

    fn apply_update(&self, update: PolicyUpdate) -> PolicyResult<PolicySnapshot> {
        Self::apply_update(self, update)
    }
}

/// Receiver that resolves once per committed update (coalescing bursts).
pub struct PolicyWatcher {
    store: PolicyStore,
    receiver: watch::Receiver<u64>,
}

impl PolicyWatcher {
    /// Wait for the next committed update and return the policy as of that moment.
    ///
    /// Returns `None` if the revision channel has closed.
    pub async fn changed(&mut self) -> Option<PolicySnapshot> {
        self.receiver.changed().await.ok()?;
        let seen = *self.receiver.borrow_and_update();
        let snapshot = self.store.snapshot();
        debug!(
            notified_revision = seen,
            revision = snapshot.revision,
            "policy change observed"
        );
        Some(snapshot)
    }

    /// Last revision this watcher has observed.
    #[must_use]
    pub fn last_seen_revision(&self) -> u64 {
        *self.receiver.borrow()
    }
}

fn stage(current: &PolicyConfig, update: PolicyUpdate) -> PolicyResult<PolicyConfig> {
    let mut staged = current.clone();

    if let Some(value) = update.key_ttl {
        staged.key_rotation_period = parse_positive_duration(schema::KEY_TTL, &value)?;
    }
    if let Some(value) = update.jwt_ttl {
        staged.token_ttl = parse_positive_duration(schema::JWT_TTL, &value)?;
    }
    if let Some(value) = update.set_iat {
        staged.set_iat = value;
    }
    if let Some(value) = update.set_jti {
        staged.set_jti = value;
    }
    if let Some(value) = update.set_nbf {
        staged.set_nbf = value;
    }
    if let Some(value) = update.issuer {
        staged.issuer = value;
    }
    if let Some(value) = update.audience_pattern {
        staged.audience_pattern = compile_pattern(schema::AUDIENCE_PATTERN, &value)?;
    }
    if let Some(value) = update.subject_pattern {
        staged.subject_pattern = compile_pattern(schema::SUBJECT_PATTERN, &value)?;
    }
    if let Some(value) = update.max_audiences {
        staged.max_audiences = value;
    }
    if let Some(claims) = update.allowed_claims {
        staged.allowed_claims = AllowedClaims::from_list(claims);
    }

    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PolicyError;
    use std::time::Duration;

    fn issuer_update(issuer: &str) -> PolicyUpdate {
        PolicyUpdate {
            issuer: Some(issuer.to_string()),
            ..PolicyUpdate::default()
        }
    }

    #[test]
    fn partial_update_leaves_other_fields_untouched() {
        let store = PolicyStore::new();
        let before = store.snapshot().to_document();

        let after = store
            .apply_update(issuer_update("foo"))
            .expect("issuer update should apply")
            .to_document();

        assert_eq!(after.issuer, "foo");
        assert_eq!(after.key_ttl, before.key_ttl);
        assert_eq!(after.jwt_ttl, before.jwt_ttl);
        assert_eq!(after.set_iat, before.set_iat);
        assert_eq!(after.set_jti, before.set_jti);
        assert_eq!(after.set_nbf, before.set_nbf);
        assert_eq!(after.audience_pattern, before.audience_pattern);
        assert_eq!(after.subject_pattern, before.subject_pattern);
        assert_eq!(after.max_audiences, before.max_audiences);
        assert_eq!(after.allowed_claims, before.allowed_claims);
    }

    #[test]
    fn returned_snapshot_matches_subsequent_read() {
        let store = PolicyStore::new();
        let written = store
            .apply_update(PolicyUpdate {
                key_ttl: Some("24h".to_string()),
                audience_pattern: Some("^svc-".to_string()),
                ..PolicyUpdate::default()
            })
            .expect("update should apply");
        let read = store.snapshot();

        assert_eq!(written.revision, 1);
        assert_eq!(read.revision, 1);
        assert_eq!(written.to_document(), read.to_document());
        assert_eq!(read.config.key_rotation_period, Duration::from_secs(86_400));
    }

    #[test]
    fn invalid_duration_is_rejected_without_side_effects() {
        let store = PolicyStore::new();
        let before = store.snapshot();

        let err = store
            .apply_update(PolicyUpdate {
                key_ttl: Some("not-a-duration".to_string()),
                ..PolicyUpdate::default()
            })
            .unwrap_err();

        assert!(matches!(err, PolicyError::InvalidDuration { field: "key_ttl", .. }));
        let after = store.snapshot();
        assert_eq!(after.config.key_rotation_period, before.config.key_rotation_period);
        assert_eq!(after.revision, before.revision);
    }

    #[test]
    fn invalid_pattern_is_rejected_without_side_effects() {
        let store = PolicyStore::new();

        let err = store
            .apply_update(PolicyUpdate {
                audience_pattern: Some("[unterminated".to_string()),
                ..PolicyUpdate::default()
            })
            .unwrap_err();

        assert!(matches!(
            err,
            PolicyError::InvalidPattern {
                field: "audience_pattern",
                ..
            }
        ));
        assert_eq!(store.snapshot().config.audience_pattern.as_str(), ".*");
    }

    #[test]
    fn failing_field_discards_earlier_fields_in_the_same_update() {
        let store = PolicyStore::new();

        let err = store
            .apply_update(PolicyUpdate {
                key_ttl: Some("24h".to_string()),
                issuer: Some("changed".to_string()),
                subject_pattern: Some("(".to_string()),
                allowed_claims: Some(vec!["custom".to_string()]),
                ..PolicyUpdate::default()
            })
            .unwrap_err();

        assert_eq!(err.field(), "subject_pattern");
        let snapshot = store.snapshot();
        assert_eq!(snapshot.revision, 0);
        assert_eq!(snapshot.to_document().key_ttl, "15m0s");
        assert_ne!(snapshot.config.issuer, "changed");
        assert!(!snapshot.config.allows_claim("custom"));
    }

    #[test]
    fn first_error_in_field_order_wins() {
        let store = PolicyStore::new();
        let err = store
            .apply_update(PolicyUpdate {
                key_ttl: Some("bogus".to_string()),
                audience_pattern: Some("[".to_string()),
                ..PolicyUpdate::default()
            })
            .unwrap_err();
        assert_eq!(err.field(), "key_ttl");
    }

    #[test]
    fn allowed_claims_replacement_rebuilds_lookup() {
        let store = PolicyStore::new();
        let snapshot = store
            .apply_update(PolicyUpdate {
                allowed_claims: Some(vec![
                    "aud".to_string(),
                    "sub".to_string(),
                    "custom".to_string(),
                ]),
                ..PolicyUpdate::default()
            })
            .expect("claims update should apply");

        assert!(snapshot.config.allows_claim("custom"));
        assert!(!snapshot.config.allows_claim("other"));

        let snapshot = store
            .apply_update(PolicyUpdate {
                allowed_claims: Some(vec!["other".to_string()]),
                ..PolicyUpdate::default()
            })
            .expect("claims update should apply");
        assert!(!snapshot.config.allows_claim("custom"));
        assert!(snapshot.config.allows_claim("other"));
    }

    #[test]
    fn empty_update_is_a_no_op() {
        let store = PolicyStore::new();
        let snapshot = store
            .apply_update(PolicyUpdate::default())
            .expect("empty update should succeed");
        assert_eq!(snapshot.revision, 0);
        assert_eq!(store.revision(), 0);
        assert_eq!(snapshot.to_document(), store.snapshot().to_document());
    }

    #[test]
    fn snapshots_are_independent_of_later_writes() {
        let store = PolicyStore::new();
        let earlier = store.snapshot();
        store
            .apply_update(issuer_update("later"))
            .expect("issuer update should apply");
        assert_ne!(earlier.config.issuer, "later");
        assert_eq!(store.snapshot().config.issuer, "later");
    }

    #[test]
    fn seeded_store_starts_at_revision_zero() {
        let store = PolicyStore::seeded(PolicyUpdate {
            jwt_ttl: Some("1h".to_string()),
            ..PolicyUpdate::default()
        })
        .expect("seed should validate");
        let snapshot = store.snapshot();
        assert_eq!(snapshot.revision, 0);
        assert_eq!(snapshot.to_document().jwt_ttl, "1h0m0s");

        let err = PolicyStore::seeded(PolicyUpdate {
            jwt_ttl: Some("0".to_string()),
            ..PolicyUpdate::default()
        })
        .err()
        .expect("zero ttl should be rejected");
        assert_eq!(err.field(), "jwt_ttl");
    }

    #[test]
    fn facade_delegates_to_store() {
        let store = PolicyStore::new();
        let facade: &dyn PolicyFacade = &store;
        let snapshot = facade
            .apply_update(issuer_update(""))
            .expect("empty issuer is allowed");
        assert!(snapshot.config.issuer.is_empty());
        assert!(facade.snapshot().config.issuer.is_empty());
    }

    #[tokio::test]
    async fn watcher_observes_committed_updates_only() {
        let store = PolicyStore::new();
        let mut watcher = store.watch();
        assert_eq!(watcher.last_seen_revision(), 0);

        let _ = store.apply_update(PolicyUpdate {
            jwt_ttl: Some("nope".to_string()),
            ..PolicyUpdate::default()
        });
        store
            .apply_update(issuer_update("watched"))
            .expect("issuer update should apply");

        let snapshot = watcher.changed().await.expect("store is alive");
        assert_eq!(snapshot.revision, 1);
        assert_eq!(snapshot.config.issuer, "watched");
        assert_eq!(watcher.last_seen_revision(), 1);
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use jwt_policy_config::{
    FIELDS, PolicyDocument, PolicyError, PolicyFacade, PolicyStore, PolicyUpdate, duration,
};
use jwt_policy_test_support::assert::{document_tag, has_fields};
use jwt_policy_test_support::fixtures::{aliased_update, issuer_only, tagged_update};

fn update_from(value: serde_json::Value) -> PolicyUpdate {
    serde_json::from_value(value).expect("fixture should deserialize")
}

fn field_names() -> Vec<&'static str> {
    FIELDS.iter().map(|spec| spec.name).collect()
}

#[test]
fn default_read_returns_complete_document() -> anyhow::Result<()> {
    let store = PolicyStore::new();
    let document = serde_json::to_value(store.snapshot().to_document())?;
    has_fields(&document, &field_names())?;
    assert_eq!(document["key_ttl"], "15m0s");
    assert_eq!(document["audience_pattern"], ".*");
    Ok(())
}

#[test]
fn write_then_read_round_trips_through_the_wire_format() -> anyhow::Result<()> {
    let store = PolicyStore::new();
    let written = store.apply_update(update_from(tagged_update(41)))?;
    let document = serde_json::to_value(written.to_document())?;
    assert_eq!(document_tag(&document)?, 41);
    assert_eq!(
        duration::parse(document["key_ttl"].as_str().unwrap_or_default()),
        Ok(Duration::from_secs(42 * 60))
    );
    assert_eq!(
        duration::parse(document["jwt_ttl"].as_str().unwrap_or_default()),
        Ok(Duration::from_secs(42))
    );

    // Feeding the rendered document back in must leave the policy unchanged.
    let rendered: PolicyDocument = serde_json::from_value(document)?;
    let replayed = store.apply_update(PolicyUpdate::from(rendered.clone()))?;
    assert_eq!(replayed.to_document(), rendered);
    assert_eq!(replayed.revision, 2);
    Ok(())
}

#[test]
fn aliases_are_accepted_on_write() -> anyhow::Result<()> {
    let store = PolicyStore::new();
    let snapshot = store.apply_update(update_from(aliased_update()))?;
    let document = snapshot.to_document();

    assert_eq!(document.key_ttl, "24h0m0s");
    assert_eq!(document.jwt_ttl, "15m0s");
    assert!(!document.set_iat);
    assert!(document.set_jti);
    assert!(!document.set_nbf);
    assert_eq!(document.max_audiences, 2);
    assert!(snapshot.config.allows_claim("scope"));
    assert!(snapshot.config.audience_matches("api.billing"));
    assert!(!snapshot.config.subject_matches("user:abc"));
    Ok(())
}

#[test]
fn issuer_only_update_is_partial() -> anyhow::Result<()> {
    let store = PolicyStore::new();
    store.apply_update(update_from(tagged_update(3)))?;
    let snapshot = store.apply_update(update_from(issuer_only("foo")))?;
    let document = snapshot.to_document();

    assert_eq!(document.issuer, "foo");
    assert_eq!(document.audience_pattern, "^aud-3$");
    assert_eq!(document.max_audiences, 3);
    Ok(())
}

#[test]
fn rejected_updates_report_the_error_kind() {
    let store = PolicyStore::new();

    let err = store
        .apply_update(update_from(serde_json::json!({ "key_ttl": "not-a-duration" })))
        .unwrap_err();
    assert!(matches!(err, PolicyError::InvalidDuration { .. }));

    let err = store
        .apply_update(update_from(serde_json::json!({ "audience_pattern": "[unterminated" })))
        .unwrap_err();
    assert!(matches!(err, PolicyError::InvalidPattern { .. }));

    let document = store.snapshot().to_document();
    assert_eq!(document.key_ttl, "15m0s");
    assert_eq!(document.audience_pattern, ".*");
}

#[test]
fn concurrent_readers_never_observe_torn_records() {
    const READERS: usize = 8;
    const WRITES: u64 = 500;

    let store = PolicyStore::new();
    store
        .apply_update(update_from(tagged_update(0)))
        .expect("initial tagged write");
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let store = store.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut reads = 0_u64;
                let mut last_revision = 0;
                while !done.load(Ordering::Acquire) {
                    let snapshot = store.snapshot();
                    assert!(snapshot.revision >= last_revision, "revision went backwards");
                    last_revision = snapshot.revision;

                    let document =
                        serde_json::to_value(snapshot.to_document()).expect("document json");
                    let tag = document_tag(&document).expect("snapshot mixes two writes");
                    let claim = format!("claim-{tag}");
                    assert!(snapshot.config.allows_claim(&claim));
                    assert_eq!(snapshot.config.allowed_claims.as_slice()[0], claim);
                    reads += 1;
                }
                reads
            })
        })
        .collect();

    let writer = {
        let store = store.clone();
        thread::spawn(move || {
            for tag in 1..=WRITES {
                store
                    .apply_update(update_from(tagged_update(tag)))
                    .expect("tagged write");
                if tag % 10 == 0 {
                    // Rejected writes must not leak partial state either.
                    let mut broken = tagged_update(tag + 1_000_000);
                    broken["subject_pattern"] = serde_json::json!("(");
                    assert!(store.apply_update(update_from(broken)).is_err());
                }
            }
        })
    };

    writer.join().expect("writer thread");
    done.store(true, Ordering::Release);
    let total_reads: u64 = readers
        .into_iter()
        .map(|reader| reader.join().expect("reader thread"))
        .sum();

    assert!(total_reads > 0);
    let final_snapshot = store.snapshot();
    assert_eq!(final_snapshot.revision, WRITES + 1);
    let document = serde_json::to_value(final_snapshot.to_document()).expect("document json");
    assert_eq!(document_tag(&document).expect("final tag"), WRITES);
}

#[tokio::test]
async fn watchers_follow_updates_through_the_facade() -> anyhow::Result<()> {
    let store = PolicyStore::new();
    let facade: Arc<dyn PolicyFacade> = Arc::new(store.clone());
    let mut watcher = store.watch();

    let waiter = tokio::spawn(async move { watcher.changed().await });
    facade.apply_update(update_from(tagged_update(9)))?;

    let snapshot = waiter.await?.expect("store is alive");
    assert_eq!(snapshot.revision, 1);
    assert_eq!(snapshot.config.issuer, "issuer-9");
    Ok(())
}

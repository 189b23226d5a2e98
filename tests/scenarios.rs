//! End-to-end flows over the public API, on the system clock.

use chrono::Utc;
use skillgate::store::{Account, ArtifactRecord, TrustStore};
use skillgate::{
    CertLevel, FileTrustStore, MemoryTrustStore, Permission, QualitySignals, Role, TrustConfig,
    TrustError, TrustManager,
};
use std::sync::Arc;
use std::time::Duration;

const SECRET: &str = "scenario-secret-0123456789abcdef01";

fn seed(store: &dyn TrustStore) {
    store
        .upsert_account(Account {
            id: "buyer-1".to_string(),
            role: Role::Buyer,
            email: "buyer@example.com".to_string(),
            email_confirmed: false,
        })
        .unwrap();
    store
        .upsert_artifact(ArtifactRecord {
            id: "art-1".to_string(),
            slug: "csv-wrangler".to_string(),
            title: "CSV Wrangler".to_string(),
            version: "1.4.2".to_string(),
            creator_id: "creator-1".to_string(),
            storage_url: Some("s3://skills/csv-wrangler-1.4.2.zip".to_string()),
            cert_level: CertLevel::None,
            quality_score: 0.0,
        })
        .unwrap();
    store
        .record_purchase("buyer-1", "art-1", Utc::now())
        .unwrap();
}

fn marketplace(config: TrustConfig) -> (Arc<MemoryTrustStore>, TrustManager) {
    let store = Arc::new(MemoryTrustStore::new());
    seed(store.as_ref());
    let manager = TrustManager::new(config, Arc::clone(&store) as Arc<dyn TrustStore>).unwrap();
    (store, manager)
}

// Issue an identity token, verify it, wait past its TTL, verify again.
#[test]
fn identity_token_expires_in_real_time() {
    let mut config = TrustConfig::new(SECRET);
    config.token_ttl = Duration::from_millis(500);
    let (store, manager) = marketplace(config);

    let token = manager.issue_identity_token("buyer-1");
    manager.confirm_email(&token).unwrap();
    assert!(store.find_account("buyer-1").unwrap().unwrap().email_confirmed);

    std::thread::sleep(Duration::from_millis(700));
    assert!(matches!(
        manager.confirm_email(&token),
        Err(TrustError::InvalidToken)
    ));
}

// Purchase, take a 3-use grant, redeem it down to exhaustion.
#[test]
fn grant_lifecycle_through_exhaustion() {
    let (_store, manager) = marketplace(TrustConfig::new(SECRET));

    let ticket = manager.issue_download_grant("buyer-1", "art-1").unwrap();
    let found = manager.active_download_grant("buyer-1", "art-1").unwrap();
    assert_eq!(found.unwrap().token, ticket.token);

    for remaining in [2u32, 1, 0] {
        let download = manager.redeem_download(&ticket.token).unwrap();
        assert_eq!(download.remaining_uses, remaining);
        assert_eq!(download.storage_url, "s3://skills/csv-wrangler-1.4.2.zip");
        assert_eq!(
            download.headers.content_disposition,
            "attachment; filename=\"csv-wrangler-1.4.2.zip\""
        );
    }

    assert!(matches!(
        manager.redeem_download(&ticket.token),
        Err(TrustError::GrantExhausted)
    ));
    // A spent grant no longer counts as active.
    assert!(manager.active_download_grant("buyer-1", "art-1").unwrap().is_none());
}

// A valid key without the certify capability gets an authorization error;
// a garbage key gets an authentication error.
#[test]
fn download_only_agent_key_cannot_certify() {
    let (_store, manager) = marketplace(TrustConfig::new(SECRET));

    let (key, credential) = manager
        .create_agent_key("buyer-1", [Permission::Download].into_iter().collect())
        .unwrap();

    let ticket = manager.issue_download_grant("buyer-1", "art-1").unwrap();
    let download = manager.agent_redeem_download(&key, &ticket.token).unwrap();
    assert_eq!(download.artifact_id, "art-1");

    assert!(matches!(
        manager.agent_certify(&key, "art-1"),
        Err(TrustError::PermissionDenied { permission }) if permission == "certify"
    ));
    assert!(matches!(
        manager.agent_certify("agent_00000000000000000000000000000000", "art-1"),
        Err(TrustError::AuthenticationFailed)
    ));

    // After revocation the same key fails authentication outright.
    assert!(manager.revoke_agent_key(&credential.id).unwrap());
    assert!(matches!(
        manager.agent_redeem_download(&key, &ticket.token),
        Err(TrustError::AuthenticationFailed)
    ));
}

// Race N threads over a single-use grant; exactly one redemption wins.
#[test]
fn concurrent_redemption_of_single_use_grant() {
    let mut config = TrustConfig::new(SECRET);
    config.grant_max_uses = 1;
    let (_store, manager) = marketplace(config);
    let manager = Arc::new(manager);

    let ticket = manager.issue_download_grant("buyer-1", "art-1").unwrap();
    let token = Arc::new(ticket.token);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let token = Arc::clone(&token);
            std::thread::spawn(move || manager.redeem_download(&token).is_ok())
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(successes, 1);
}

// Climb the ladder: signals that satisfy Bronze promote exactly one level,
// and Gold stays gated on the manual security review.
#[test]
fn certification_promotion_and_manual_review_gate() {
    let (_store, manager) = marketplace(TrustConfig::new(SECRET));

    manager
        .record_quality_signals(
            "art-1",
            QualitySignals {
                documentation: Some(true),
                test_coverage: Some(95.0),
                sales_count: Some(500),
                average_rating: Some(4.8),
                days_since_critical_defect: Some(200),
                localization_complete: Some(true),
            },
        )
        .unwrap();

    // Everything automatic passes, so promotion runs straight to Silver and
    // stops at the Gold review gate.
    assert_eq!(manager.promote_certification("art-1").unwrap(), CertLevel::Silver);

    let status = manager.evaluate_certification("art-1").unwrap();
    assert_eq!(status.level, CertLevel::Silver);
    assert_eq!(status.target_level, Some(CertLevel::Gold));

    // Approving the security review unlocks Gold.
    let request = manager
        .request_certification_review("art-1", "creator-1", CertLevel::Gold)
        .unwrap();
    let decided = manager
        .review_certification(&request.id, "admin-1", true)
        .unwrap();
    assert!(decided.reviewed_by.is_some());

    let status = manager.evaluate_certification("art-1").unwrap();
    assert_eq!(status.level, CertLevel::Gold);
    assert_eq!(status.target_level, None);

    // Deciding the same request twice is rejected.
    assert!(matches!(
        manager.review_certification(&request.id, "admin-1", false),
        Err(TrustError::RequestAlreadyReviewed)
    ));
}

// Grants survive a process restart when backed by the file store.
#[test]
fn file_backed_grants_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trust.json");

    let ticket = {
        let store = Arc::new(FileTrustStore::open_at(&path).unwrap());
        seed(store.as_ref());
        let manager =
            TrustManager::new(TrustConfig::new(SECRET), store as Arc<dyn TrustStore>).unwrap();
        manager.issue_download_grant("buyer-1", "art-1").unwrap()
    };

    let store = Arc::new(FileTrustStore::open_at(&path).unwrap());
    let manager =
        TrustManager::new(TrustConfig::new(SECRET), store as Arc<dyn TrustStore>).unwrap();
    let download = manager.redeem_download(&ticket.token).unwrap();
    assert_eq!(download.remaining_uses, 2);
}

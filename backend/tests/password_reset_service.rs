//! Reset token lifecycle exercised against an in-memory store with a
//! manually advanced clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use motorlot_backend::error::AppError;
use motorlot_backend::models::password_reset::PasswordReset;
use motorlot_backend::models::user::{User, UserRole};
use motorlot_backend::services::password_reset::{PasswordResetService, ResetStore};
use motorlot_backend::types::{PasswordResetId, UserId};
use motorlot_backend::utils::clock::ManualClock;
use motorlot_backend::utils::password::verify_password;

const TTL_MINUTES: i64 = 30;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

fn test_user(email: &str, active: bool) -> User {
    let now = start();
    User {
        id: UserId::new(),
        email: email.to_string(),
        username: "casey".to_string(),
        first_name: "Casey".to_string(),
        last_name: "Doe".to_string(),
        password_hash: "old-hash".to_string(),
        role: UserRole::Customer,
        is_active: active,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
struct InMemoryResetStore {
    users: Mutex<Vec<User>>,
    resets: Mutex<Vec<PasswordReset>>,
    fail_consume: AtomicBool,
}

impl InMemoryResetStore {
    fn with_user(user: User) -> Self {
        let store = Self::default();
        store.users.lock().unwrap().push(user);
        store
    }

    fn password_hash(&self, user_id: UserId) -> String {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.password_hash.clone())
            .expect("user exists")
    }

    fn stored_resets(&self) -> Vec<PasswordReset> {
        self.resets.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResetStore for InMemoryResetStore {
    async fn find_active_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email) && u.is_active)
            .cloned())
    }

    async fn insert_reset(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<PasswordReset, AppError> {
        let reset = PasswordReset {
            id: PasswordResetId::new(),
            user_id,
            token_hash: token_hash.to_string(),
            expires_at,
            created_at,
            used_at: None,
        };
        self.resets.lock().unwrap().push(reset.clone());
        Ok(reset)
    }

    async fn find_valid_reset(
        &self,
        user_id: UserId,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>, AppError> {
        Ok(self
            .resets
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user_id == user_id && r.token_hash == token_hash && r.is_redeemable(now))
            .cloned())
    }

    async fn update_password(
        &self,
        user_id: UserId,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| u.id == user_id).expect("user");
        user.password_hash = password_hash.to_string();
        user.updated_at = now;
        Ok(())
    }

    async fn consume_reset(
        &self,
        id: PasswordResetId,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        if self.fail_consume.load(Ordering::SeqCst) {
            return Err(AppError::Persistence(anyhow::anyhow!("update refused")));
        }
        let mut resets = self.resets.lock().unwrap();
        let reset = resets.iter_mut().find(|r| r.id == id).expect("reset row");
        if reset.used_at.is_some() {
            return Ok(false);
        }
        reset.used_at = Some(now);
        Ok(true)
    }
}

fn service(store: Arc<InMemoryResetStore>) -> (PasswordResetService, ManualClock) {
    let clock = ManualClock::new(start());
    let svc = PasswordResetService::with_parts(store, Arc::new(clock.clone()), TTL_MINUTES);
    (svc, clock)
}

#[tokio::test]
async fn issue_stores_hash_not_token() {
    let store = Arc::new(InMemoryResetStore::with_user(test_user(
        "casey@example.com",
        true,
    )));
    let (svc, _clock) = service(store.clone());

    let token = svc
        .issue("casey@example.com")
        .await
        .expect("issue")
        .expect("known account yields a token");

    let resets = store.stored_resets();
    assert_eq!(resets.len(), 1);
    assert_ne!(resets[0].token_hash, token);
    assert_eq!(resets[0].expires_at, start() + Duration::minutes(TTL_MINUTES));
}

#[tokio::test]
async fn issue_for_unknown_account_is_silent() {
    let store = Arc::new(InMemoryResetStore::default());
    let (svc, _clock) = service(store.clone());

    let issued = svc.issue("nobody@example.com").await.expect("no error");
    assert!(issued.is_none());
    assert!(store.stored_resets().is_empty());
}

#[tokio::test]
async fn issue_for_inactive_account_is_silent() {
    let store = Arc::new(InMemoryResetStore::with_user(test_user(
        "casey@example.com",
        false,
    )));
    let (svc, _clock) = service(store.clone());

    let issued = svc.issue("casey@example.com").await.expect("no error");
    assert!(issued.is_none());
    assert!(store.stored_resets().is_empty());
}

#[tokio::test]
async fn redeem_changes_password_and_consumes_token() {
    let user = test_user("casey@example.com", true);
    let user_id = user.id;
    let store = Arc::new(InMemoryResetStore::with_user(user));
    let (svc, _clock) = service(store.clone());

    let token = svc.issue("casey@example.com").await.unwrap().unwrap();
    svc.redeem("casey@example.com", &token, "NewPassw0rd")
        .await
        .expect("redeem succeeds");

    let hash = store.password_hash(user_id);
    assert_ne!(hash, "old-hash");
    assert!(verify_password("NewPassw0rd", &hash).unwrap());
    assert!(store.stored_resets()[0].used_at.is_some());
}

#[tokio::test]
async fn token_is_single_use() {
    let store = Arc::new(InMemoryResetStore::with_user(test_user(
        "casey@example.com",
        true,
    )));
    let (svc, _clock) = service(store.clone());

    let token = svc.issue("casey@example.com").await.unwrap().unwrap();
    svc.redeem("casey@example.com", &token, "NewPassw0rd")
        .await
        .expect("first redemption");

    let err = svc
        .redeem("casey@example.com", &token, "OtherPassw0rd")
        .await
        .expect_err("second redemption must fail");
    assert!(matches!(err, AppError::InvalidOrExpiredToken));
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let store = Arc::new(InMemoryResetStore::with_user(test_user(
        "casey@example.com",
        true,
    )));
    let (svc, clock) = service(store.clone());

    let token = svc.issue("casey@example.com").await.unwrap().unwrap();
    clock.advance(Duration::minutes(TTL_MINUTES + 1));

    let err = svc
        .redeem("casey@example.com", &token, "NewPassw0rd")
        .await
        .expect_err("expired token must fail");
    assert!(matches!(err, AppError::InvalidOrExpiredToken));
    assert_eq!(store.password_hash(store.stored_resets()[0].user_id), "old-hash");
}

#[tokio::test]
async fn wrong_token_and_wrong_email_fail_the_same_way() {
    let store = Arc::new(InMemoryResetStore::with_user(test_user(
        "casey@example.com",
        true,
    )));
    let (svc, _clock) = service(store.clone());
    svc.issue("casey@example.com").await.unwrap().unwrap();

    let bad_token = svc
        .redeem("casey@example.com", "deadbeef", "NewPassw0rd")
        .await
        .expect_err("bad token");
    assert!(matches!(bad_token, AppError::InvalidOrExpiredToken));

    let bad_email = svc
        .redeem("other@example.com", "deadbeef", "NewPassw0rd")
        .await
        .expect_err("unknown email");
    assert!(matches!(bad_email, AppError::InvalidResetRequest));

    // Internally distinct variants, but the HTTP rendering must be the same
    // so a caller cannot tell a bad token from an unregistered email.
    use axum::response::IntoResponse;
    let token_resp = bad_token.into_response();
    let email_resp = bad_email.into_response();
    assert_eq!(token_resp.status(), email_resp.status());
    let token_body = axum::body::to_bytes(token_resp.into_body(), usize::MAX)
        .await
        .expect("body");
    let email_body = axum::body::to_bytes(email_resp.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(token_body, email_body);
}

#[tokio::test]
async fn weak_password_does_not_consume_the_token() {
    let store = Arc::new(InMemoryResetStore::with_user(test_user(
        "casey@example.com",
        true,
    )));
    let (svc, _clock) = service(store.clone());

    let token = svc.issue("casey@example.com").await.unwrap().unwrap();
    let err = svc
        .redeem("casey@example.com", &token, "short")
        .await
        .expect_err("weak password");
    assert!(matches!(err, AppError::Validation(_)));
    assert!(store.stored_resets()[0].used_at.is_none());

    // Same link still works with an acceptable password.
    svc.redeem("casey@example.com", &token, "NewPassw0rd")
        .await
        .expect("retry succeeds");
}

#[tokio::test]
async fn consume_failure_still_reports_success() {
    let user = test_user("casey@example.com", true);
    let user_id = user.id;
    let store = Arc::new(InMemoryResetStore::with_user(user));
    let (svc, _clock) = service(store.clone());

    let token = svc.issue("casey@example.com").await.unwrap().unwrap();
    store.fail_consume.store(true, Ordering::SeqCst);

    svc.redeem("casey@example.com", &token, "NewPassw0rd")
        .await
        .expect("password change reported as success");

    let hash = store.password_hash(user_id);
    assert!(verify_password("NewPassw0rd", &hash).unwrap());
    assert!(store.stored_resets()[0].used_at.is_none());
}

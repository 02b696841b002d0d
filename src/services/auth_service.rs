//! Account lifecycle: registration, login, the OTP password-reset flow and
//! the admin user listing.
//!
//! # Reset flow
//!
//! 1. `forgot_password` stores an Argon2 hash of a 6-digit code for the email
//!    (10 minute expiry, zero attempts) and mails the code with a reset link.
//! 2. `verify_otp` exchanges a correct code for a 1-hour reset token. Each
//!    call counts as an attempt; the 6th attempt fails even with the right
//!    code and discards the record.
//! 3. `reset_password` accepts the reset token and stores the new hash.

use std::{sync::Arc, time::Duration};

use chrono::{TimeDelta, Utc};
use rand::Rng;

use crate::{
    error::AppError,
    models::{
        pagination::{ListQuery, Paginated},
        role::Role,
        user::{NewUser, PublicUser, RegisterRequest, User, UserSummary},
    },
    services::{
        mailer::{Mailer, ResetMail},
        password::SecretHasher,
        token_service::TokenService,
    },
    stores::{
        otp_store::{OtpRecord, OtpStore},
        user_store::UserStore,
    },
};

/// How long a mailed code stays valid.
pub const OTP_TTL: Duration = Duration::from_secs(10 * 60);

/// Verification attempts allowed per issued code.
pub const MAX_OTP_ATTEMPTS: u32 = 5;

/// Default page size of the users listing.
pub const USERS_PAGE_SIZE: u32 = 20;

/// A signed-in user: the session token and the account it belongs to.
#[derive(Debug)]
pub struct Session {
    pub token: String,
    pub user: User,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    otps: Arc<dyn OtpStore>,
    mailer: Arc<dyn Mailer>,
    tokens: TokenService,
    hasher: SecretHasher,
    frontend_base: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        otps: Arc<dyn OtpStore>,
        mailer: Arc<dyn Mailer>,
        tokens: TokenService,
        hasher: SecretHasher,
        frontend_base: impl Into<String>,
    ) -> Self {
        Self {
            users,
            otps,
            mailer,
            tokens,
            hasher,
            frontend_base: frontend_base.into(),
        }
    }

    /// Create an account and sign it in. `role` defaults to `User`.
    ///
    /// # Errors
    ///
    /// `DuplicateEmail` / `DuplicateUsername` when either is already taken.
    pub async fn register(&self, request: RegisterRequest) -> Result<Session, AppError> {
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash(&request.password).await?;
        let user = self
            .users
            .create(NewUser {
                username: request.username,
                email: request.email,
                password_hash,
                role: request.role.unwrap_or_default(),
            })
            .await?;

        tracing::info!(user_id = user.id, role = %user.role, "User registered");

        let token = self.tokens.issue_session(&user)?;
        Ok(Session { token, user })
    }

    /// # Errors
    ///
    /// `UserNotFound` for an unknown email, `InvalidCredentials` for a wrong
    /// password. Handlers conceal the difference on the wire.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            self.hasher.verify_decoy(password).await?;
            return Err(AppError::UserNotFound);
        };

        if !self.hasher.verify(password, &user.password).await? {
            tracing::warn!(user_id = user.id, "Login failed: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.issue_session(&user)?;
        Ok(Session { token, user })
    }

    /// Start a reset for `email`. Succeeds whether or not the email is
    /// registered; mail delivery failures are logged, not returned.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            // Same hashing work as a real request.
            self.hasher.hash(&generate_otp()).await?;
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let reset_token = self.tokens.issue_reset(&user)?;
        let reset_url = format!("{}/reset-password/{}", self.frontend_base, reset_token);

        let otp = generate_otp();
        let record = OtpRecord {
            code_hash: self.hasher.hash(&otp).await?,
            expires_at: Utc::now() + otp_ttl(),
            attempts: 0,
            user_id: user.id,
        };
        // A newer request replaces any pending code for the same email.
        self.otps.put(email, record, OTP_TTL).await?;
        tracing::info!(user_id = user.id, "Password reset OTP issued");

        let mail = ResetMail {
            to: user.email.clone(),
            username: user.username.clone(),
            otp,
            reset_url,
        };
        if let Err(e) = self.mailer.send_reset(&mail).await {
            tracing::error!(user_id = user.id, error = %e, "Failed to send password reset email");
        }

        Ok(())
    }

    /// Exchange a mailed code for a reset token. A code works once.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<String, AppError> {
        // Counted before anything else, so concurrent guesses cannot share a slot.
        let record = self
            .otps
            .record_attempt(email)
            .await?
            .ok_or(AppError::InvalidOrExpiredOtp)?;

        if record.is_expired(Utc::now()) {
            self.otps.take(email, &record.code_hash).await?;
            return Err(AppError::InvalidOrExpiredOtp);
        }

        if record.attempts > MAX_OTP_ATTEMPTS {
            self.otps.take(email, &record.code_hash).await?;
            tracing::warn!(user_id = record.user_id, "OTP attempt limit exceeded");
            return Err(AppError::TooManyAttempts);
        }

        if !self.hasher.verify(code, &record.code_hash).await? {
            return Err(AppError::InvalidOtp);
        }

        // The account may have been deleted or re-addressed since the code was sent.
        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .filter(|user| user.email == email);
        let Some(user) = user else {
            self.otps.take(email, &record.code_hash).await?;
            return Err(AppError::InvalidOtp);
        };

        if !self.otps.take(email, &record.code_hash).await? {
            // Consumed by a concurrent verification, or replaced by a newer code.
            return Err(AppError::InvalidOrExpiredOtp);
        }

        self.tokens.issue_reset(&user)
    }

    /// # Errors
    ///
    /// `InvalidOrExpiredToken` if the token is bad, expired, not a reset
    /// token, or its user no longer exists.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let claims = self.tokens.verify_reset(token)?;

        let user = self
            .users
            .find_by_id(claims.uid)
            .await?
            .ok_or(AppError::InvalidOrExpiredToken)?;

        let password_hash = self.hasher.hash(new_password).await?;
        if !self.users.update_password(user.id, &password_hash).await? {
            return Err(AppError::InvalidOrExpiredToken);
        }

        tracing::info!(user_id = user.id, "Password reset");
        Ok(())
    }

    pub async fn list_users(&self, query: &ListQuery) -> Result<Paginated<UserSummary>, AppError> {
        let window = query.window(USERS_PAGE_SIZE);
        let pattern = query.pattern();

        let (users, total) = self.users.list(pattern.as_deref(), window).await?;
        let data = users.into_iter().map(UserSummary::from).collect();

        Ok(Paginated::new(data, window, total))
    }

    /// Delete `id` on behalf of `caller_id`.
    ///
    /// # Errors
    ///
    /// `UserNotFound`, or `ProtectedAccount` when the target is a SuperAdmin
    /// or the caller themself.
    pub async fn delete_user(&self, caller_id: i32, id: i32) -> Result<PublicUser, AppError> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if user.role == Role::SuperAdmin {
            return Err(AppError::ProtectedAccount(
                "Cannot delete a SuperAdmin account".to_string(),
            ));
        }
        if user.id == caller_id {
            return Err(AppError::ProtectedAccount(
                "You cannot delete your own account".to_string(),
            ));
        }

        if !self.users.delete(user.id).await? {
            return Err(AppError::UserNotFound);
        }

        tracing::info!(user_id = user.id, deleted_by = caller_id, "User deleted");
        Ok(PublicUser::from(&user))
    }
}

fn otp_ttl() -> TimeDelta {
    TimeDelta::seconds(OTP_TTL.as_secs() as i64)
}

/// Zero-padded 6-digit decimal code.
fn generate_otp() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000u32))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        stores::otp_store::InMemoryOtpStore,
        test_support::{
            FRONTEND, FailingMailer, MemoryUserStore, RecordingMailer, auth_harness as harness,
            tokens,
        },
    };

    /// Yields before every call, like a store behind a network hop.
    struct YieldingOtpStore(Arc<InMemoryOtpStore>);

    #[async_trait]
    impl OtpStore for YieldingOtpStore {
        async fn put(&self, email: &str, record: OtpRecord, ttl: Duration) -> Result<(), AppError> {
            tokio::task::yield_now().await;
            self.0.put(email, record, ttl).await
        }

        async fn record_attempt(&self, email: &str) -> Result<Option<OtpRecord>, AppError> {
            tokio::task::yield_now().await;
            self.0.record_attempt(email).await
        }

        async fn take(&self, email: &str, code_hash: &str) -> Result<bool, AppError> {
            tokio::task::yield_now().await;
            self.0.take(email, code_hash).await
        }
    }

    /// Alice registered with a pending code, behind a yielding store.
    async fn concurrent_setup() -> (Arc<AuthService>, Arc<InMemoryOtpStore>, String) {
        let otps = Arc::new(InMemoryOtpStore::new());
        let mail = Arc::new(RecordingMailer::default());
        let auth = Arc::new(AuthService::new(
            Arc::new(MemoryUserStore::default()),
            Arc::new(YieldingOtpStore(otps.clone())),
            mail.clone(),
            tokens(),
            SecretHasher::fast_for_tests(),
            FRONTEND,
        ));
        auth.register(registration("alice", "alice@example.com", "secret1"))
            .await
            .unwrap();
        auth.forgot_password("alice@example.com").await.unwrap();
        (auth, otps, mail.last().otp)
    }

    fn registration(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            role: None,
        }
    }

    fn wrong_code(code: &str) -> &'static str {
        if code == "000000" { "111111" } else { "000000" }
    }

    #[tokio::test]
    async fn full_reset_scenario() {
        let h = harness();
        let session = h
            .auth
            .register(registration("alice", "alice@example.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(session.user.role, Role::User);

        assert!(h.auth.login("alice@example.com", "secret1").await.is_ok());
        assert!(matches!(
            h.auth.login("alice@example.com", "secret2").await,
            Err(AppError::InvalidCredentials)
        ));

        h.auth.forgot_password("alice@example.com").await.unwrap();
        let mail = h.mail.last();
        assert_eq!(mail.otp.len(), 6);
        assert!(mail.reset_url.starts_with("http://localhost:5173/reset-password/"));

        let token = h
            .auth
            .verify_otp("alice@example.com", &mail.otp)
            .await
            .unwrap();
        h.auth.reset_password(&token, "newpass1").await.unwrap();

        assert!(h.auth.login("alice@example.com", "newpass1").await.is_ok());
        assert!(matches!(
            h.auth.login("alice@example.com", "secret1").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn reset_link_token_also_resets_password() {
        let h = harness();
        h.auth
            .register(registration("alice", "alice@example.com", "secret1"))
            .await
            .unwrap();

        h.auth.forgot_password("alice@example.com").await.unwrap();
        let url = h.mail.last().reset_url;
        let token = url.rsplit('/').next().unwrap();

        h.auth.reset_password(token, "newpass1").await.unwrap();
        assert!(h.auth.login("alice@example.com", "newpass1").await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let h = harness();
        h.auth
            .register(registration("alice", "alice@example.com", "secret1"))
            .await
            .unwrap();

        let second = h
            .auth
            .register(registration("alice2", "alice@example.com", "secret1"))
            .await;
        assert!(matches!(second, Err(AppError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn unknown_email_login_is_user_not_found() {
        let h = harness();
        let result = h.auth.login("nobody@example.com", "secret1").await;

        assert!(matches!(result, Err(AppError::UserNotFound)));
    }

    #[tokio::test]
    async fn forgot_password_for_unknown_email_sends_nothing() {
        let h = harness();
        h.auth.forgot_password("nobody@example.com").await.unwrap();

        assert_eq!(h.mail.count(), 0);
        assert!(h.otps.get("nobody@example.com").is_none());
    }

    #[tokio::test]
    async fn forgot_password_survives_mail_failure() {
        let otps = Arc::new(InMemoryOtpStore::new());
        let auth = AuthService::new(
            Arc::new(MemoryUserStore::default()),
            otps.clone(),
            Arc::new(FailingMailer),
            TokenService::new("s", "r"),
            SecretHasher::fast_for_tests(),
            FRONTEND,
        );
        auth.register(registration("alice", "alice@example.com", "secret1"))
            .await
            .unwrap();

        assert!(auth.forgot_password("alice@example.com").await.is_ok());
        assert!(otps.get("alice@example.com").is_some());
    }

    #[tokio::test]
    async fn sixth_attempt_fails_even_with_correct_code() {
        let h = harness();
        h.auth
            .register(registration("alice", "alice@example.com", "secret1"))
            .await
            .unwrap();
        h.auth.forgot_password("alice@example.com").await.unwrap();
        let otp = h.mail.last().otp;

        for _ in 0..MAX_OTP_ATTEMPTS {
            let result = h.auth.verify_otp("alice@example.com", wrong_code(&otp)).await;
            assert!(matches!(result, Err(AppError::InvalidOtp)));
        }

        let sixth = h.auth.verify_otp("alice@example.com", &otp).await;
        assert!(matches!(sixth, Err(AppError::TooManyAttempts)));
        assert!(h.otps.get("alice@example.com").is_none());

        let after = h.auth.verify_otp("alice@example.com", &otp).await;
        assert!(matches!(after, Err(AppError::InvalidOrExpiredOtp)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_guesses_share_the_attempt_limit() {
        let (auth, otps, otp) = concurrent_setup().await;
        let guess = wrong_code(&otp);

        let tasks: Vec<_> = (0..40)
            .map(|_| {
                let auth = auth.clone();
                tokio::spawn(async move { auth.verify_otp("alice@example.com", guess).await })
            })
            .collect();

        let mut compared = 0;
        let mut refused = 0;
        for task in tasks {
            match task.await.unwrap() {
                Err(AppError::InvalidOtp) => compared += 1,
                Err(AppError::TooManyAttempts | AppError::InvalidOrExpiredOtp) => refused += 1,
                other => panic!("unexpected outcome: {other:?}"),
            }
        }

        assert_eq!(compared, MAX_OTP_ATTEMPTS);
        assert_eq!(refused, 40 - MAX_OTP_ATTEMPTS);
        assert!(otps.get("alice@example.com").is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_correct_codes_issue_one_token() {
        let (auth, otps, otp) = concurrent_setup().await;

        let tasks: Vec<_> = (0..MAX_OTP_ATTEMPTS)
            .map(|_| {
                let auth = auth.clone();
                let otp = otp.clone();
                tokio::spawn(async move { auth.verify_otp("alice@example.com", &otp).await })
            })
            .collect();

        let mut issued = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => issued += 1,
                Err(AppError::InvalidOrExpiredOtp) => {}
                other => panic!("unexpected outcome: {other:?}"),
            }
        }

        assert_eq!(issued, 1);
        assert!(otps.get("alice@example.com").is_none());
    }

    #[tokio::test]
    async fn unknown_email_login_still_verifies_a_hash() {
        let h = harness();
        assert!(!h.auth.hasher.decoy_ready());

        let result = h.auth.login("nobody@example.com", "secret1").await;

        assert!(matches!(result, Err(AppError::UserNotFound)));
        assert!(h.auth.hasher.decoy_ready());
    }

    #[tokio::test]
    async fn failed_attempts_are_counted() {
        let h = harness();
        h.auth
            .register(registration("alice", "alice@example.com", "secret1"))
            .await
            .unwrap();
        h.auth.forgot_password("alice@example.com").await.unwrap();
        let otp = h.mail.last().otp;

        let _ = h.auth.verify_otp("alice@example.com", wrong_code(&otp)).await;
        let _ = h.auth.verify_otp("alice@example.com", wrong_code(&otp)).await;

        let record = h.otps.get("alice@example.com").unwrap();
        assert_eq!(record.attempts, 2);
    }

    #[tokio::test]
    async fn expired_code_is_rejected_and_discarded() {
        let h = harness();
        let hasher = SecretHasher::fast_for_tests();
        let record = OtpRecord {
            code_hash: hasher.hash("123456").await.unwrap(),
            expires_at: Utc::now() - TimeDelta::seconds(1),
            attempts: 0,
            user_id: 1,
        };
        h.otps
            .put("alice@example.com", record, OTP_TTL)
            .await
            .unwrap();

        let result = h.auth.verify_otp("alice@example.com", "123456").await;

        assert!(matches!(result, Err(AppError::InvalidOrExpiredOtp)));
        assert!(h.otps.get("alice@example.com").is_none());
    }

    #[tokio::test]
    async fn code_works_only_once() {
        let h = harness();
        h.auth
            .register(registration("alice", "alice@example.com", "secret1"))
            .await
            .unwrap();
        h.auth.forgot_password("alice@example.com").await.unwrap();
        let otp = h.mail.last().otp;

        assert!(h.auth.verify_otp("alice@example.com", &otp).await.is_ok());
        assert!(matches!(
            h.auth.verify_otp("alice@example.com", &otp).await,
            Err(AppError::InvalidOrExpiredOtp)
        ));
    }

    #[tokio::test]
    async fn newer_request_replaces_pending_code() {
        let h = harness();
        h.auth
            .register(registration("alice", "alice@example.com", "secret1"))
            .await
            .unwrap();

        h.auth.forgot_password("alice@example.com").await.unwrap();
        let first = h.mail.last().otp;
        h.auth.forgot_password("alice@example.com").await.unwrap();
        let second = h.mail.last().otp;

        if first != second {
            assert!(matches!(
                h.auth.verify_otp("alice@example.com", &first).await,
                Err(AppError::InvalidOtp)
            ));
        }
        assert!(h.auth.verify_otp("alice@example.com", &second).await.is_ok());
    }

    #[tokio::test]
    async fn code_is_void_once_account_email_changes() {
        let h = harness();
        let session = h
            .auth
            .register(registration("alice", "alice@example.com", "secret1"))
            .await
            .unwrap();
        h.auth.forgot_password("alice@example.com").await.unwrap();
        let otp = h.mail.last().otp;

        h.users.set_email(session.user.id, "alice@new.example.com");

        let result = h.auth.verify_otp("alice@example.com", &otp).await;
        assert!(matches!(result, Err(AppError::InvalidOtp)));
        assert!(h.otps.get("alice@example.com").is_none());
    }

    #[tokio::test]
    async fn reset_rejects_session_tokens_and_garbage() {
        let h = harness();
        let session = h
            .auth
            .register(registration("alice", "alice@example.com", "secret1"))
            .await
            .unwrap();

        assert!(matches!(
            h.auth.reset_password(&session.token, "newpass1").await,
            Err(AppError::InvalidOrExpiredToken)
        ));
        assert!(matches!(
            h.auth.reset_password("garbage", "newpass1").await,
            Err(AppError::InvalidOrExpiredToken)
        ));
    }

    #[tokio::test]
    async fn delete_user_protects_super_admins_and_caller() {
        let h = harness();
        let mut root = registration("root", "root@example.com", "secret1");
        root.role = Some(Role::SuperAdmin);
        let root = h.auth.register(root).await.unwrap().user;
        let mut admin = registration("admin", "admin@example.com", "secret1");
        admin.role = Some(Role::Admin);
        let admin = h.auth.register(admin).await.unwrap().user;

        assert!(matches!(
            h.auth.delete_user(admin.id, root.id).await,
            Err(AppError::ProtectedAccount(_))
        ));
        assert!(matches!(
            h.auth.delete_user(admin.id, admin.id).await,
            Err(AppError::ProtectedAccount(_))
        ));
        assert!(matches!(
            h.auth.delete_user(root.id, 999).await,
            Err(AppError::UserNotFound)
        ));

        let deleted = h.auth.delete_user(root.id, admin.id).await.unwrap();
        assert_eq!(deleted.username, "admin");
        assert!(h.users.find_by_id(admin.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_users_pages_with_default_limit() {
        let h = harness();
        for i in 0..3 {
            h.auth
                .register(registration(
                    &format!("user{i}"),
                    &format!("user{i}@example.com"),
                    "secret1",
                ))
                .await
                .unwrap();
        }

        let page = h.auth.list_users(&ListQuery::default()).await.unwrap();
        assert_eq!(page.meta.limit, USERS_PAGE_SIZE);
        assert_eq!(page.meta.total, 3);
        assert_eq!(page.meta.pages, 1);
        assert_eq!(page.data.len(), 3);

        let query = ListQuery {
            q: Some("user1".into()),
            ..Default::default()
        };
        let page = h.auth.list_users(&query).await.unwrap();
        assert_eq!(page.meta.total, 1);
        assert_eq!(page.data[0].username, "user1");
    }

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.bytes().all(|b| b.is_ascii_digit()));
        }
    }
}

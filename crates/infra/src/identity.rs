//! Registration, sign-in and bearer-token verification.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use ledgerbook_auth::{
    Account, AccountProfile, Email, JwtError, JwtIssuer, JwtValidator, NewAccount, PasswordHasher,
};
use ledgerbook_core::OwnerId;

use crate::accounts::AccountStore;
use crate::service::{ServiceError, ServiceResult};

/// A signed-in account and the token that proves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub account: AccountProfile,
}

/// Issuing and validating side of the token scheme.
pub trait TokenSigner: JwtIssuer + JwtValidator {}

impl<T: JwtIssuer + JwtValidator> TokenSigner for T {}

#[derive(Clone)]
pub struct IdentityService {
    accounts: Arc<dyn AccountStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenSigner>,
}

impl IdentityService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenSigner>,
    ) -> Self {
        Self {
            accounts,
            hasher,
            tokens,
        }
    }

    #[instrument(skip(self, name, password), err)]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> ServiceResult<Session> {
        let new = NewAccount::parse(name, email, password)?;

        let password_hash = self
            .hasher
            .hash(&new.password)
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;

        let account = self
            .accounts
            .insert_account(Account {
                id: OwnerId::new(),
                name: new.name,
                email: new.email,
                password_hash,
                created_at: Utc::now(),
            })
            .await?;

        info!(owner_id = %account.id, "account registered");
        self.open_session(&account)
    }

    #[instrument(skip(self, password), err)]
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<Session> {
        // A malformed address cannot belong to anyone: same answer as a wrong password.
        let email = Email::parse(email).map_err(|_| ServiceError::InvalidCredentials)?;

        let Some(account) = self.accounts.find_by_email(&email).await? else {
            return Err(ServiceError::InvalidCredentials);
        };

        let matches = self
            .hasher
            .verify(password, &account.password_hash)
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;
        if !matches {
            warn!(owner_id = %account.id, "password mismatch");
            return Err(ServiceError::InvalidCredentials);
        }

        self.open_session(&account)
    }

    /// Resolve a bearer token to the owner it was issued for.
    pub fn verify(&self, token: &str) -> Result<OwnerId, JwtError> {
        self.tokens.validate(token, Utc::now()).map(|claims| claims.sub)
    }

    fn open_session(&self, account: &Account) -> ServiceResult<Session> {
        let issued = self
            .tokens
            .issue(account.id, Utc::now())
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;
        Ok(Session {
            token: issued.token,
            account: account.profile(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::InMemoryAccountStore;
    use chrono::Duration;
    use ledgerbook_auth::{Argon2Hasher, Hs256Jwt};

    fn identity() -> IdentityService {
        IdentityService::new(
            Arc::new(InMemoryAccountStore::new()),
            Arc::new(Argon2Hasher::new()),
            Arc::new(Hs256Jwt::new(b"test-secret", Duration::hours(10))),
        )
    }

    #[tokio::test]
    async fn register_then_login_yields_same_owner() {
        let svc = identity();
        let registered = svc
            .register("Alex", "Alex@Example.com", "password123")
            .await
            .unwrap();
        assert_eq!(registered.account.email.as_str(), "alex@example.com");

        let session = svc.login("alex@example.com", "password123").await.unwrap();
        assert_eq!(session.account, registered.account);
        assert_eq!(svc.verify(&session.token).unwrap(), registered.account.id);
        assert_eq!(svc.verify(&registered.token).unwrap(), registered.account.id);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let svc = identity();
        svc.register("Alex", "alex@example.com", "password123")
            .await
            .unwrap();
        let err = svc
            .register("Other", " ALEX@example.com ", "password456")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn bad_credentials_are_indistinguishable() {
        let svc = identity();
        svc.register("Alex", "alex@example.com", "password123")
            .await
            .unwrap();

        let wrong_password = svc.login("alex@example.com", "nope-nope").await.unwrap_err();
        let unknown_email = svc.login("sam@example.com", "password123").await.unwrap_err();
        let malformed = svc.login("not-an-email", "password123").await.unwrap_err();

        assert_eq!(wrong_password, ServiceError::InvalidCredentials);
        assert_eq!(unknown_email, ServiceError::InvalidCredentials);
        assert_eq!(malformed, ServiceError::InvalidCredentials);
    }

    #[tokio::test]
    async fn registration_input_is_validated() {
        let svc = identity();
        for (name, email, password) in [
            ("", "alex@example.com", "password123"),
            ("Alex", "alex.example.com", "password123"),
            ("Alex", "alex@example.com", "short"),
        ] {
            let err = svc.register(name, email, password).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{name}/{email}");
        }
    }

    #[test]
    fn garbage_token_does_not_verify() {
        assert!(identity().verify("garbage").is_err());
    }
}

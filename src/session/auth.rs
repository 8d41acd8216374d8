use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use uuid::Uuid;

use crate::city::permission::Role;
use crate::session::Identity;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("an account with this email already exists")]
    EmailInUse,
    #[error("password must be at least 6 characters")]
    WeakPassword,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("no profile for user {0}")]
    UnknownUser(String),
}

/// The identity provider plus the profile store that holds each user's role.
pub trait Authenticator: Send + Sync + 'static {
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Identity, AuthError>> + Send;

    /// Creates the account and records `role` in the user's profile.
    fn signup(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> impl Future<Output = Result<Identity, AuthError>> + Send;

    fn logout(&self, user_id: &str) -> impl Future<Output = ()> + Send;

    /// Reads the role back from the profile store.
    fn fetch_role(&self, user_id: &str) -> impl Future<Output = Result<Role, AuthError>> + Send;
}

pub fn confirm_password(password: &str, confirm: &str) -> Result<(), AuthError> {
    if password != confirm {
        return Err(AuthError::PasswordMismatch);
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct Account {
    user_id: String,
    password: String,
    role: Role,
}

/// In-process accounts and profiles.
#[derive(Debug, Default)]
pub struct MemoryAuthenticator {
    accounts: Mutex<HashMap<String, Account>>,
    role_delay: Option<Duration>,
}

impl MemoryAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every role lookup, standing in for a slow profile store.
    pub fn with_role_delay(mut self, delay: Duration) -> Self {
        self.role_delay = Some(delay);
        self
    }

    fn normalize(email: &str) -> Result<String, AuthError> {
        let email = email.trim().to_lowercase();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
            _ => Err(AuthError::InvalidEmail),
        }
    }
}

impl Authenticator for MemoryAuthenticator {
    async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = Self::normalize(email).map_err(|_| AuthError::InvalidCredentials)?;
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(&email) {
            Some(account) if account.password == password => Ok(Identity {
                user_id: account.user_id.clone(),
                email,
            }),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn signup(&self, email: &str, password: &str, role: Role) -> Result<Identity, AuthError> {
        let email = Self::normalize(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&email) {
            return Err(AuthError::EmailInUse);
        }

        let user_id = Uuid::new_v4().simple().to_string();
        accounts.insert(
            email.clone(),
            Account {
                user_id: user_id.clone(),
                password: password.to_string(),
                role,
            },
        );
        tracing::info!(%user_id, %role, "account created");
        Ok(Identity { user_id, email })
    }

    async fn logout(&self, user_id: &str) {
        tracing::debug!(%user_id, "signed out");
    }

    async fn fetch_role(&self, user_id: &str) -> Result<Role, AuthError> {
        if let Some(delay) = self.role_delay {
            tokio::time::sleep(delay).await;
        }
        let accounts = self.accounts.lock().unwrap();
        accounts
            .values()
            .find(|account| account.user_id == user_id)
            .map(|account| account.role)
            .ok_or_else(|| AuthError::UnknownUser(user_id.to_string()))
    }
}

//! Auth service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::{
    auth::{
        AuthServiceError,
        models::{NewUser, Permission, Session, User, UserTable},
        repository::FileUsersRepository,
    },
    sequence::{SequenceGenerator, SequenceKind},
    store::RecordStore,
};

#[derive(Debug, Clone)]
pub struct FileAuthService {
    repository: FileUsersRepository,
    sequence: SequenceGenerator,
}

impl FileAuthService {
    #[must_use]
    pub fn new(
        users: RecordStore<UserTable>,
        session: RecordStore<Session>,
        sequence: SequenceGenerator,
    ) -> Self {
        Self {
            repository: FileUsersRepository::new(users, session),
            sequence,
        }
    }
}

#[async_trait]
impl AuthService for FileAuthService {
    #[tracing::instrument(
        name = "auth.service.register",
        skip(self, user),
        fields(username = %user.username),
        err
    )]
    async fn register(&self, user: NewUser) -> Result<User, AuthServiceError> {
        if user.username.trim().is_empty() {
            return Err(AuthServiceError::MissingRequiredData("username"));
        }

        if user.password.is_empty() {
            return Err(AuthServiceError::MissingRequiredData("password"));
        }

        if self.repository.find_by_username(&user.username).await?.is_some() {
            return Err(AuthServiceError::AlreadyExists);
        }

        let now = Timestamp::now();

        let created = User {
            user_id: self.sequence.next_id(SequenceKind::User).await?,
            username: user.username,
            email: String::new(),
            is_admin: false,
            first_name: String::new(),
            last_name: String::new(),
            created_at: now,
            updated_at: now,
            roles: user.permissions.clone(),
            password: hash_password(&user.password),
            permissions: user.permissions,
        };

        if !self.repository.insert_unique(created.clone()).await? {
            return Err(AuthServiceError::AlreadyExists);
        }

        info!(user_id = %created.user_id, "registered user");

        Ok(created)
    }

    #[tracing::instrument(name = "auth.service.login", skip(self, password), err)]
    async fn login(&self, username: String, password: String) -> Result<User, AuthServiceError> {
        let user = self
            .repository
            .find_by_username(&username)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if user.password != hash_password(&password) {
            return Err(AuthServiceError::InvalidCredentials);
        }

        self.repository.set_session(Some(user.clone())).await?;

        info!(user_id = %user.user_id, "logged in");

        Ok(user)
    }

    async fn logout(&self) -> Result<(), AuthServiceError> {
        self.repository.set_session(None).await?;

        Ok(())
    }

    async fn session_user(&self) -> Result<Option<User>, AuthServiceError> {
        Ok(self.repository.session_user().await?)
    }

    async fn has_permission(&self, permission: Permission) -> bool {
        match self.repository.session_user().await {
            Ok(Some(user)) => user.grants(permission),
            Ok(None) => false,
            Err(error) => {
                warn!(%permission, %error, "failed to read session, denying permission");

                false
            }
        }
    }

    async fn resolve_user_id(&self, user_id: String) -> Result<String, AuthServiceError> {
        self.repository
            .find_by_id(&user_id)
            .await?
            .map(|user| user.user_id)
            .ok_or(AuthServiceError::NotFound)
    }
}

fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

#[automock]
#[async_trait]
/// User registry and session operations.
pub trait AuthService: Send + Sync {
    /// Registers a new user with the given permissions.
    async fn register(&self, user: NewUser) -> Result<User, AuthServiceError>;

    /// Verifies credentials and records the user as the session user.
    async fn login(&self, username: String, password: String) -> Result<User, AuthServiceError>;

    /// Clears the session.
    async fn logout(&self) -> Result<(), AuthServiceError>;

    /// The logged-in user, if any.
    async fn session_user(&self) -> Result<Option<User>, AuthServiceError>;

    /// Whether the session user holds `permission`. Anything short of a
    /// session user with that permission is a denial.
    async fn has_permission(&self, permission: Permission) -> bool;

    /// Validates that a user with `user_id` exists.
    async fn resolve_user_id(&self, user_id: String) -> Result<String, AuthServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::TestContext;

    use super::*;

    fn new_user(username: &str, permissions: &[&str]) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "hunter2".to_string(),
            permissions: permissions.iter().map(ToString::to_string).collect(),
        }
    }

    #[tokio::test]
    async fn register_assigns_sequential_ids_and_hashes_password() -> TestResult {
        let ctx = TestContext::new().await;

        let first = ctx.auth.register(new_user("ada", &[])).await?;
        let second = ctx.auth.register(new_user("grace", &[])).await?;

        assert_eq!(first.user_id, "1");
        assert_eq!(second.user_id, "2");
        assert_ne!(first.password, "hunter2");
        assert_eq!(first.password.len(), 64);

        Ok(())
    }

    #[tokio::test]
    async fn register_duplicate_username_returns_already_exists() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.auth.register(new_user("ada", &[])).await?;

        let result = ctx.auth.register(new_user("ada", &[])).await;

        assert!(
            matches!(result, Err(AuthServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.auth.register(new_user("ada", &[])).await?;

        let result = ctx.auth.login("ada".to_string(), "wrong".to_string()).await;

        assert!(
            matches!(result, Err(AuthServiceError::InvalidCredentials)),
            "expected InvalidCredentials, got {result:?}"
        );
        assert!(ctx.auth.session_user().await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn permissions_follow_the_session_user() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.auth.register(new_user("ada", &["cart:add"])).await?;

        assert!(!ctx.auth.has_permission(Permission::CartAdd).await);

        ctx.auth.login("ada".to_string(), "hunter2".to_string()).await?;

        assert!(ctx.auth.has_permission(Permission::CartAdd).await);
        assert!(!ctx.auth.has_permission(Permission::OrderDelete).await);

        ctx.auth.logout().await?;

        assert!(!ctx.auth.has_permission(Permission::CartAdd).await);

        Ok(())
    }

    #[tokio::test]
    async fn resolve_unknown_user_returns_not_found() -> TestResult {
        let ctx = TestContext::new().await;

        let user = ctx.auth.register(new_user("ada", &[])).await?;

        assert_eq!(ctx.auth.resolve_user_id(user.user_id.clone()).await?, user.user_id);

        let result = ctx.auth.resolve_user_id("404".to_string()).await;

        assert!(
            matches!(result, Err(AuthServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }
}

use crate::domain::ports::UserStoreBox;
use crate::domain::user::{PasswordDigest, PasswordReset, Role, User};
use crate::error::{PortalError, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

/// User administration and password authentication.
pub struct AccountService {
    users: UserStoreBox,
}

impl AccountService {
    pub fn new(users: UserStoreBox) -> Self {
        Self { users }
    }

    pub async fn create_user(
        &self,
        email: &str,
        name: &str,
        role: Role,
        password: &str,
    ) -> Result<User> {
        let user = User::new(email, name, role, password)?;
        if self.users.find_by_email(&user.email).await?.is_some() {
            return Err(PortalError::Conflict(format!(
                "A user with email '{}' already exists",
                user.email
            )));
        }
        self.users.store(user.clone()).await?;
        info!(email = %user.email, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.users.get_all().await
    }

    pub async fn remove_user(&self, email: &str) -> Result<()> {
        let user = self.user_by_email(email).await?;
        self.users.delete(user.id).await?;
        info!(email = %user.email, "User removed");
        Ok(())
    }

    /// Unknown emails and wrong passwords fail the same way.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        match self.users.find_by_email(email).await? {
            Some(user) if user.password.verify(password) => Ok(user),
            _ => {
                warn!(email = %email.trim(), "Failed login attempt");
                Err(PortalError::Unauthorized)
            }
        }
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<PasswordReset> {
        self.request_password_reset_at(email, Utc::now()).await
    }

    pub async fn request_password_reset_at(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<PasswordReset> {
        let user = self.user_by_email(email).await?;
        let reset = PasswordReset::issue(user.id, now);
        self.users.store_reset(reset.clone()).await?;
        info!(email = %user.email, expires_at = %reset.expires_at, "Password reset issued");
        Ok(reset)
    }

    pub async fn reset_password(&self, token: Uuid, new_password: &str) -> Result<()> {
        self.reset_password_at(token, new_password, Utc::now()).await
    }

    pub async fn reset_password_at(
        &self,
        token: Uuid,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let reset = self
            .users
            .get_reset(token)
            .await?
            .filter(|r| r.is_usable(now))
            .ok_or_else(|| {
                PortalError::ValidationError("Reset token is invalid or expired".to_string())
            })?;

        let mut user = self
            .users
            .get(reset.user_id)
            .await?
            .ok_or_else(|| PortalError::NotFound(format!("User {}", reset.user_id)))?;

        user.password = PasswordDigest::create(new_password)?;
        self.users.store(user).await?;
        self.users
            .store_reset(PasswordReset {
                used: true,
                ..reset
            })
            .await?;
        Ok(())
    }

    async fn user_by_email(&self, email: &str) -> Result<User> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or_else(|| PortalError::NotFound(format!("User '{}'", email.trim())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::RESET_TOKEN_TTL_MINUTES;
    use crate::infrastructure::in_memory::InMemoryUserStore;
    use chrono::Duration;

    async fn service_with_user() -> AccountService {
        let service = AccountService::new(Box::new(InMemoryUserStore::new()));
        service
            .create_user("ana@broker.mx", "Ana", Role::Admin, "first-password")
            .await
            .unwrap();
        service
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let service = service_with_user().await;
        let result = service
            .create_user(" ANA@broker.mx", "Otra", Role::Broker, "another-password")
            .await;
        assert!(matches!(result, Err(PortalError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let service = service_with_user().await;
        assert!(service.authenticate("ana@broker.mx", "first-password").await.is_ok());
        assert!(matches!(
            service.authenticate("ana@broker.mx", "wrong-password").await,
            Err(PortalError::Unauthorized)
        ));
        assert!(matches!(
            service.authenticate("nobody@broker.mx", "first-password").await,
            Err(PortalError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_password_reset_is_single_use() {
        let service = service_with_user().await;
        let reset = service.request_password_reset("ana@broker.mx").await.unwrap();

        service
            .reset_password(reset.token, "second-password")
            .await
            .unwrap();
        assert!(service.authenticate("ana@broker.mx", "second-password").await.is_ok());
        assert!(service.authenticate("ana@broker.mx", "first-password").await.is_err());

        let reuse = service.reset_password(reset.token, "third-password").await;
        assert!(matches!(reuse, Err(PortalError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_expired_reset_token_rejected() {
        let service = service_with_user().await;
        let issued_at = Utc::now();
        let reset = service
            .request_password_reset_at("ana@broker.mx", issued_at)
            .await
            .unwrap();

        let later = issued_at + Duration::minutes(RESET_TOKEN_TTL_MINUTES + 1);
        let result = service
            .reset_password_at(reset.token, "second-password", later)
            .await;
        assert!(matches!(result, Err(PortalError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_remove_user() {
        let service = service_with_user().await;
        service.remove_user("ana@broker.mx").await.unwrap();
        assert!(service.list_users().await.unwrap().is_empty());
        assert!(matches!(
            service.remove_user("ana@broker.mx").await,
            Err(PortalError::NotFound(_))
        ));
    }
}

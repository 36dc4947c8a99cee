use crate::application::list_service::ListService;
use crate::domain::error::{CredentialFailure, DomainError, check_length};
use crate::domain::repository::UserRepository;
use crate::domain::user::{
    ChangePasswordRequest, CreateUser, LoginRequest, SessionIdentity, User, normalize_email,
};
use crate::infrastructure::security::{
    generate_token, hash_password, validate_token, verify_password,
};
use anyhow::Result;
use chrono::Utc;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

/// A successful login: the user and the signed session token for the cookie.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
    list_service: Arc<ListService>,
    jwt_secret: String,
    session_ttl_secs: i64,
}

/// Hash checked when the email is unknown, so a miss costs a full
/// verification like a hit does.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("cinelist-unknown-account").ok())
        .as_deref()
}

async fn hash_blocking(password: String) -> Result<String> {
    let hashed = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| DomainError::Internal(format!("Hashing task failed: {}", e)))?;
    hashed.map_err(|e| {
        error!(error = %e, "Failed to hash password");
        DomainError::Internal(format!("Failed to hash password: {}", e)).into()
    })
}

async fn verify_blocking(password: String, hash: Option<String>) -> Result<bool> {
    let verified = tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            if let Some(dummy) = dummy_hash() {
                let _ = verify_password(&password, dummy);
            }
            Ok(false)
        }
    })
    .await
    .map_err(|e| DomainError::Internal(format!("Verification task failed: {}", e)))?;
    verified.map_err(|e| {
        error!(error = %e, "Failed to verify password");
        DomainError::Internal(format!("Failed to verify password: {}", e)).into()
    })
}

fn require(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(message.to_string()).into());
    }
    Ok(())
}

impl AuthService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        list_service: Arc<ListService>,
        jwt_secret: String,
        session_ttl_secs: i64,
    ) -> Self {
        Self {
            user_repository,
            list_service,
            jwt_secret,
            session_ttl_secs,
        }
    }

    /// Creates an account and its default lists.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn register(&self, req: CreateUser) -> Result<User> {
        trace!("Starting user registration");
        require(&req.name, "Name is required.")?;
        require(&req.email, "Email is required.")?;
        require(&req.password, "Password is required.")?;
        let email = normalize_email(&req.email);
        let name = req.name.trim().to_string();
        check_length("Name", &name)?;
        check_length("Email", &email)?;

        let password_hash = hash_blocking(req.password).await?;
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash,
            name,
            created_at: Utc::now(),
        };

        debug!(user_id = %user.id, "Saving user to repository");
        self.user_repository.insert_user(user.clone()).await?;
        self.list_service.ensure_default_lists(user.id).await?;

        info!(user_id = %user.id, email = %user.email, "User registered successfully");
        Ok(user)
    }

    /// Checks credentials. Unknown email and wrong password both fail with
    /// `InvalidCredentials`.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let email = normalize_email(email);
        let user = self.user_repository.find_user_by_email(&email).await?;
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let is_valid = verify_blocking(password.to_string(), stored_hash).await?;

        match user {
            None => {
                warn!(email = %email, "User not found during login");
                Err(DomainError::InvalidCredentials(CredentialFailure::UnknownEmail).into())
            }
            Some(user) if !is_valid => {
                warn!(user_id = %user.id, "Invalid password during login");
                Err(DomainError::InvalidCredentials(CredentialFailure::WrongPassword).into())
            }
            Some(user) => Ok(user),
        }
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn login(&self, req: LoginRequest) -> Result<Session> {
        trace!("Starting login");
        require(&req.email, "Email is required.")?;
        require(&req.password, "Password is required.")?;

        let user = self.authenticate(&req.email, &req.password).await?;
        // Restores lists lost to a registration that failed halfway
        self.list_service.ensure_default_lists(user.id).await?;
        let token = self.issue_session(&user)?;

        info!(user_id = %user.id, "Login successful");
        Ok(Session { user, token })
    }

    /// Signs a session token for an authenticated user.
    pub fn issue_session(&self, user: &User) -> Result<String> {
        generate_token(user.id, &self.jwt_secret, self.session_ttl_secs).map_err(|e| {
            error!(error = %e, "Failed to generate token");
            DomainError::Internal(format!("Failed to generate token: {}", e)).into()
        })
    }

    /// Decodes a session token; `None` for anything invalid or expired.
    pub fn resolve_session(&self, token: &str) -> Option<SessionIdentity> {
        match validate_token(token, &self.jwt_secret) {
            Ok(user_id) => Some(SessionIdentity { user_id }),
            Err(e) => {
                debug!(error = %e, "Rejected session token");
                None
            }
        }
    }

    /// Loads the user behind a session identity.
    #[instrument(skip(self))]
    pub async fn current_user(&self, user_id: Uuid) -> Result<User> {
        self.user_repository
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| {
                warn!("Session refers to unknown user");
                DomainError::AuthenticationRequired.into()
            })
    }

    /// Replaces the password after verifying the current one. The stored
    /// hash is left untouched on every failure path.
    #[instrument(skip(self, req))]
    pub async fn change_password(&self, user_id: Uuid, req: ChangePasswordRequest) -> Result<()> {
        require(&req.current_password, "Current password is required.")?;
        require(&req.new_password, "New password is required.")?;
        require(&req.confirm_new_password, "Please confirm the new password.")?;

        let user = self.current_user(user_id).await?;
        let matches = verify_blocking(req.current_password, Some(user.password_hash)).await?;
        if !matches {
            warn!("Current password mismatch");
            return Err(DomainError::PasswordMismatch.into());
        }
        if req.new_password != req.confirm_new_password {
            warn!("New password confirmation mismatch");
            return Err(DomainError::Confirmation.into());
        }

        let password_hash = hash_blocking(req.new_password).await?;
        self.user_repository
            .update_password_hash(user_id, &password_hash)
            .await?;

        info!("Password changed");
        Ok(())
    }
}

//! Authentication and user lifecycle service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{
        PasswordChange, RegisterUser, Role, UpdateUser, User, UserClaims, UserQuery, UserSummary,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by username or email and issue a JWT. The previous
    /// current token is revoked, so at most one token per account is usable
    /// at any time.
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<(String, User)> {
        let user = if login.contains('@') {
            self.repository.users.get_by_email(login).await?
        } else {
            self.repository.users.get_by_username(login).await?
        }
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !user.is_active {
            return Err(AppError::Forbidden(
                "Your account is deactivated, please contact the library".to_string(),
            ));
        }

        if !self.verify_password(&user, password)? {
            return Err(AppError::Forbidden("Invalid password".to_string()));
        }

        let jti = Uuid::new_v4();
        let token = self.create_token(&user, jti)?;

        if let Some(previous) = self.repository.tokens.current_jti(user.id).await? {
            self.repository.tokens.revoke(previous).await?;
        }
        self.repository.tokens.set_current(user.id, jti).await?;

        Ok((token, user))
    }

    fn create_token(&self, user: &User, jti: Uuid) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            role: user.role,
            active: user.is_active,
            jti,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Blocklist membership check, consulted by the request extractor
    pub async fn is_token_revoked(&self, jti: Uuid) -> AppResult<bool> {
        self.repository.tokens.is_revoked(jti).await
    }

    /// Revoke the presented token
    pub async fn logout(&self, jti: Uuid) -> AppResult<()> {
        self.repository.tokens.revoke(jti).await
    }

    /// Create a user account (Librarian+). The requested role is honored
    /// only when the caller is an administrator.
    pub async fn register(&self, claims: &UserClaims, mut req: RegisterUser) -> AppResult<User> {
        req.username = req.username.trim().to_lowercase();
        req.email = req.email.trim().to_lowercase();
        req.first_name = req.first_name.trim().to_lowercase();
        req.last_name = req.last_name.trim().to_lowercase();
        req.address = req.address.map(|a| a.trim().to_lowercase());
        req.phone = req.phone.map(|p| p.trim().to_string());

        if req.password1 != req.password2 {
            return Err(AppError::Conflict(
                "Password and confirm password don't match, please try again".to_string(),
            ));
        }

        let role = if claims.is_admin() {
            req.role.unwrap_or(Role::Public)
        } else {
            Role::Public
        };

        let full_name = format!("{} {}", req.first_name, req.last_name);
        let password_hash = self.hash_password(&req.password1)?;

        self.repository
            .users
            .create(&req, &password_hash, role, &full_name, Some(claims.user_id))
            .await
    }

    /// Get a user record, subject to the resource-level rule
    pub async fn get_user(&self, claims: &UserClaims, id: Uuid) -> AppResult<User> {
        let user = self.repository.users.get_by_id(id).await?;
        claims.require_manage_user(user.id, user.role)?;
        Ok(user)
    }

    /// List users. Librarians only ever see Public accounts.
    pub async fn list_users(
        &self,
        claims: &UserClaims,
        query: &UserQuery,
    ) -> AppResult<(Vec<UserSummary>, i64)> {
        let force_role = (claims.role == Role::Librarian).then_some(Role::Public);
        self.repository.users.search(query, force_role).await
    }

    /// Update a user record, subject to the resource-level rule. Identity
    /// fields (username, email, role) only change for admin callers;
    /// the active flag needs admin or librarian-over-public.
    pub async fn update_user(
        &self,
        claims: &UserClaims,
        id: Uuid,
        mut req: UpdateUser,
    ) -> AppResult<User> {
        let target = self.repository.users.get_by_id(id).await?;
        claims.require_manage_user(target.id, target.role)?;

        if !claims.is_admin() {
            req.username = None;
            req.email = None;
            req.role = None;
        }
        let may_toggle_active = claims.is_admin()
            || (claims.role == Role::Librarian && target.role == Role::Public);
        if !may_toggle_active {
            req.is_active = None;
        }

        req.username = req.username.map(|u| u.trim().to_lowercase());
        req.email = req.email.map(|e| e.trim().to_lowercase());
        req.first_name = req.first_name.map(|n| n.trim().to_lowercase());
        req.last_name = req.last_name.map(|n| n.trim().to_lowercase());
        req.address = req.address.map(|a| a.trim().to_lowercase());
        req.phone = req.phone.map(|p| p.trim().to_string());

        let full_name = if req.first_name.is_some() || req.last_name.is_some() {
            let first = req.first_name.as_deref().unwrap_or(&target.first_name);
            let last = req.last_name.as_deref().unwrap_or(&target.last_name);
            Some(format!("{} {}", first, last))
        } else {
            None
        };

        let activated_by = req.is_active.is_some().then_some(claims.user_id);

        self.repository
            .users
            .update(id, &req, full_name, &claims.sub, activated_by)
            .await
    }

    /// Toggle the active flag: Librarian over Public accounts, Admin over anyone
    pub async fn set_active(
        &self,
        claims: &UserClaims,
        id: Uuid,
        is_active: bool,
    ) -> AppResult<User> {
        let target = self.repository.users.get_by_id(id).await?;

        let permitted = claims.is_admin()
            || (claims.role == Role::Librarian && target.role == Role::Public);
        if !permitted {
            return Err(AppError::Forbidden(
                "You don't have the permission to access this".to_string(),
            ));
        }

        self.repository
            .users
            .set_active(id, is_active, &claims.sub, claims.user_id)
            .await
    }

    /// Change the caller's own password
    pub async fn change_password(&self, user_id: Uuid, req: &PasswordChange) -> AppResult<()> {
        let user = self.repository.users.get_by_id(user_id).await?;

        if !self.verify_password(&user, &req.current_password)? {
            return Err(AppError::Forbidden("Invalid password".to_string()));
        }
        if req.new_password1 != req.new_password2 {
            return Err(AppError::Conflict(
                "Password and confirm password don't match, please try again".to_string(),
            ));
        }

        let hash = self.hash_password(&req.new_password1)?;
        self.repository.users.set_password(user_id, &hash).await
    }

    /// Delete a user: the live token is revoked before the row goes away,
    /// so a deleted account cannot keep an authenticated session.
    pub async fn delete_user(&self, claims: &UserClaims, id: Uuid) -> AppResult<()> {
        let target = self.repository.users.get_by_id(id).await?;
        claims.require_librarian()?;
        claims.require_manage_user(target.id, target.role)?;

        if let Some(jti) = self.repository.tokens.current_jti(id).await? {
            self.repository.tokens.revoke(jti).await?;
        }
        self.repository.tokens.clear_current(id).await?;
        self.repository.users.delete(id).await
    }

    /// Create the bootstrap administrator on first start
    pub async fn ensure_admin(&self) -> AppResult<()> {
        if self.repository.users.admin_exists().await? {
            return Ok(());
        }

        let req = RegisterUser {
            username: self.config.admin_username.trim().to_lowercase(),
            email: self.config.admin_email.trim().to_lowercase(),
            first_name: "admin".to_string(),
            last_name: String::new(),
            address: None,
            phone: None,
            password1: self.config.admin_password.clone(),
            password2: self.config.admin_password.clone(),
            role: Some(Role::Admin),
        };
        let password_hash = self.hash_password(&req.password1)?;
        self.repository
            .users
            .create(&req, &password_hash, Role::Admin, "admin", None)
            .await?;

        tracing::info!("Bootstrap administrator '{}' created", self.config.admin_username);
        Ok(())
    }

    /// Verify a password against the stored argon2 hash
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}

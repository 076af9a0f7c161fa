//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// User roles, ordered from least to most privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Public,
    Librarian,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Public => "public",
            Role::Librarian => "librarian",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Role::Public),
            "librarian" => Ok(Role::Librarian),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// SQLx conversion for Role (stored as text)
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    /// Who created or last (de)activated this account
    pub activated_by: Option<Uuid>,
}

/// Short user representation for lists
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub role: Role,
}

/// User list query parameters; unrecognized parameters are ignored
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct UserQuery {
    /// Comma-separated role set (`admin,librarian,public`)
    pub role: Option<String>,
    /// Exact email match
    pub email: Option<String>,
    /// Username substring
    pub username: Option<String>,
    /// Full name substring
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    pub page_num: Option<i64>,
    pub per_page: Option<i64>,
}

/// Registration request (Librarian+ only)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password1: String,
    pub password2: String,
    /// Honored only when the caller is an administrator
    pub role: Option<Role>,
}

/// Update user request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Admin only
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: Option<String>,
    /// Admin only
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    /// Admin only
    pub role: Option<Role>,
    /// Admin, or Librarian over a Public account
    pub is_active: Option<bool>,
}

/// Login request: `user` is a username or an email address
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub user: String,
    pub password: String,
}

/// Login response payload
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub name: String,
    pub role: Role,
    pub access_token: String,
}

/// Own password change request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordChange {
    pub current_password: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub new_password1: String,
    pub new_password2: String,
}

/// Activation toggle request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ActivationRequest {
    pub is_active: bool,
}

/// JWT claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: Uuid,
    pub role: Role,
    pub active: bool,
    /// Unique token id, checked against the revocation list on every request
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse and verify a JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_librarian(&self) -> bool {
        matches!(self.role, Role::Librarian | Role::Admin)
    }

    /// Require Librarian or Admin role
    pub fn require_librarian(&self) -> Result<(), AppError> {
        if self.is_librarian() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You don't have the permission to access this".to_string(),
            ))
        }
    }

    /// Require Admin role
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You don't have the permission to access this".to_string(),
            ))
        }
    }

    /// Resource-level rule for operating on another user record: permitted
    /// for Admin over anyone, Librarian over Public accounts, or self.
    pub fn can_manage_user(&self, target_id: Uuid, target_role: Role) -> bool {
        self.is_admin()
            || (self.role == Role::Librarian && target_role == Role::Public)
            || self.user_id == target_id
    }

    pub fn require_manage_user(&self, target_id: Uuid, target_role: Role) -> Result<(), AppError> {
        if self.can_manage_user(target_id, target_role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You don't have the permission to access this".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn claims(role: Role, user_id: Uuid) -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: "test".to_string(),
            user_id,
            role,
            active: true,
            jti: Uuid::new_v4(),
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("librarian".parse::<Role>().unwrap(), Role::Librarian);
        assert_eq!("PUBLIC".parse::<Role>().unwrap(), Role::Public);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let original = claims(Role::Librarian, Uuid::new_v4());
        let token = original.create_token("secret").unwrap();
        let decoded = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(decoded.user_id, original.user_id);
        assert_eq!(decoded.role, Role::Librarian);
        assert_eq!(decoded.jti, original.jti);
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = claims(Role::Public, Uuid::new_v4())
            .create_token("secret")
            .unwrap();
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn admin_manages_anyone() {
        let c = claims(Role::Admin, Uuid::new_v4());
        assert!(c.can_manage_user(Uuid::new_v4(), Role::Admin));
        assert!(c.can_manage_user(Uuid::new_v4(), Role::Librarian));
        assert!(c.can_manage_user(Uuid::new_v4(), Role::Public));
    }

    #[test]
    fn librarian_manages_public_and_self_only() {
        let id = Uuid::new_v4();
        let c = claims(Role::Librarian, id);
        assert!(c.can_manage_user(Uuid::new_v4(), Role::Public));
        assert!(!c.can_manage_user(Uuid::new_v4(), Role::Librarian));
        assert!(!c.can_manage_user(Uuid::new_v4(), Role::Admin));
        assert!(c.can_manage_user(id, Role::Librarian));
    }

    #[test]
    fn public_manages_self_only() {
        let id = Uuid::new_v4();
        let c = claims(Role::Public, id);
        assert!(c.can_manage_user(id, Role::Public));
        assert!(!c.can_manage_user(Uuid::new_v4(), Role::Public));
        assert!(c.require_librarian().is_err());
        assert!(c.require_admin().is_err());
    }

    #[test]
    fn admin_gate_admits_admins_only() {
        assert!(claims(Role::Admin, Uuid::new_v4()).require_admin().is_ok());
        assert!(claims(Role::Librarian, Uuid::new_v4()).require_admin().is_err());
        assert!(claims(Role::Public, Uuid::new_v4()).require_admin().is_err());
    }
}

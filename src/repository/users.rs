//! Users repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{RegisterUser, Role, UpdateUser, User, UserQuery, UserSummary},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(username) = LOWER($1)")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Get user by email
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Check whether any administrator account exists
    pub async fn admin_exists(&self) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin')")
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Search users with pagination. `force_role` narrows results to a single
    /// role regardless of the caller's filters (Librarian listing).
    pub async fn search(
        &self,
        query: &UserQuery,
        force_role: Option<Role>,
    ) -> AppResult<(Vec<UserSummary>, i64)> {
        let (_, per_page, offset) = super::page_bounds(query.page_num, query.per_page);

        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(role) = force_role {
            conditions.push(format!("role = '{}'", role.as_str()));
        } else if let Some(ref roles) = query.role {
            let set: Vec<String> = roles
                .split(',')
                .filter_map(|r| r.trim().parse::<Role>().ok())
                .map(|r| format!("'{}'", r.as_str()))
                .collect();
            if !set.is_empty() {
                conditions.push(format!("role IN ({})", set.join(", ")));
            }
        }

        if let Some(ref email) = query.email {
            params.push(email.to_lowercase());
            conditions.push(format!("LOWER(email) = ${}", params.len()));
        }

        if let Some(ref username) = query.username {
            params.push(format!("%{}%", username.to_lowercase()));
            conditions.push(format!("LOWER(username) LIKE ${}", params.len()));
        }

        if let Some(ref full_name) = query.full_name {
            params.push(format!("%{}%", full_name.to_lowercase()));
            conditions.push(format!("LOWER(full_name) LIKE ${}", params.len()));
        }

        if let Some(is_active) = query.is_active {
            conditions.push(format!("is_active = {}", is_active));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM users {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            r#"
            SELECT id, full_name, username, email, is_active, role
            FROM users {}
            ORDER BY username
            LIMIT {} OFFSET {}
            "#,
            where_clause, per_page, offset
        );

        let mut select_builder = sqlx::query_as::<_, UserSummary>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let users = select_builder.fetch_all(&self.pool).await?;

        Ok((users, total))
    }

    /// Create a new user. Fields are expected pre-normalized by the service.
    pub async fn create(
        &self,
        user: &RegisterUser,
        password_hash: &str,
        role: Role,
        full_name: &str,
        activated_by: Option<Uuid>,
    ) -> AppResult<User> {
        let now = Utc::now();

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (
                username, email, phone, password_hash, role,
                first_name, last_name, full_name, address,
                is_active, created_at, updated_at, activated_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, $10, $10, $11)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(password_hash)
        .bind(role)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(full_name)
        .bind(&user.address)
        .bind(now)
        .bind(activated_by)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from_constraint)?;

        self.get_by_id(id).await
    }

    /// Update an existing user; only the fields present in `user` change.
    /// `full_name` is recomputed by the service when a name part changes.
    pub async fn update(
        &self,
        id: Uuid,
        user: &UpdateUser,
        full_name: Option<String>,
        updated_by: &str,
        activated_by: Option<Uuid>,
    ) -> AppResult<User> {
        let now = Utc::now();

        let mut sets = vec!["updated_at = $1".to_string(), "updated_by = $2".to_string()];
        let mut param_idx = 3;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, param_idx));
                    param_idx += 1;
                }
            };
        }

        add_field!(user.first_name, "first_name");
        add_field!(user.last_name, "last_name");
        add_field!(user.address, "address");
        add_field!(user.phone, "phone");
        add_field!(user.username, "username");
        add_field!(user.email, "email");
        add_field!(user.role, "role");
        add_field!(user.is_active, "is_active");
        add_field!(full_name, "full_name");
        if activated_by.is_some() {
            sets.push(format!("activated_by = ${}", param_idx));
        }

        let query = format!("UPDATE users SET {} WHERE id = '{}'", sets.join(", "), id);

        let mut builder = sqlx::query(&query).bind(now).bind(updated_by);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(user.first_name);
        bind_field!(user.last_name);
        bind_field!(user.address);
        bind_field!(user.phone);
        bind_field!(user.username);
        bind_field!(user.email);
        bind_field!(user.role);
        bind_field!(user.is_active);
        bind_field!(full_name);
        bind_field!(activated_by);

        builder
            .execute(&self.pool)
            .await
            .map_err(AppError::from_constraint)?;

        self.get_by_id(id).await
    }

    /// Toggle the active flag
    pub async fn set_active(
        &self,
        id: Uuid,
        is_active: bool,
        updated_by: &str,
        activated_by: Uuid,
    ) -> AppResult<User> {
        sqlx::query(
            r#"
            UPDATE users
            SET is_active = $1, activated_by = $2, updated_by = $3, updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(is_active)
        .bind(activated_by)
        .bind(updated_by)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Replace the stored password hash
    pub async fn set_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Hard delete a user row
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

use crate::auth::repo_types::{Role, User};
use sqlx::PgPool;
use uuid::Uuid;

impl User {
    /// Find a user by email. The lookup is case-sensitive, matching how
    /// emails are stored.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, password_hash, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, password_hash, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password. The unique index on email is
    /// the real duplicate guard; callers pre-check only for a friendlier
    /// error.
    pub async fn create(
        db: &PgPool,
        full_name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (full_name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, full_name, email, password_hash, role, created_at
            "#,
        )
        .bind(full_name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Apply only the provided fields. Returns `None` when no row matched.
    pub async fn update_fields(
        db: &PgPool,
        id: Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                email = COALESCE($3, email)
            WHERE id = $1
            RETURNING id, full_name, email, password_hash, role, created_at
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn update_password_hash(
        db: &PgPool,
        id: Uuid,
        new_hash: &str,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(new_hash)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Every record, oldest first. No pagination: the service assumes small
    /// user populations.
    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, password_hash, role, created_at
            FROM users
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(users)
    }
}

// src/db/user_repo.rs

use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::auth::{Role, User},
};

const USER_COLUMNS: &str = "id, username, email, password_hash, full_name, role, is_active, \
                            last_login_at, created_at, updated_at";

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    // Trava a tabela até o fim da transação: dois "setup" simultâneos não criam dois admins
    pub async fn lock_and_count(&self, conn: &mut PgConnection) -> Result<i64, AppError> {
        sqlx::query("LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *conn)
            .await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        username: &str,
        email: &str,
        password_hash: &str,
        full_name: &str,
        role: Role,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, full_name, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .bind(full_name)
            .bind(role)
            .fetch_one(executor)
            .await
            .map_err(map_unique_violation)?;

        Ok(user)
    }

    pub async fn touch_last_login(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<User, AppError> {
        let sql = format!(
            "UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::UserNotFound)
    }
}

// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{AuthResponse, ChangePasswordPayload, Claims, CreateUserPayload, Role, SetupAdminPayload, User},
};

async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

// Hash descartável: login de usuário inexistente paga o mesmo bcrypt
static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

async fn dummy_hash() -> Result<&'static str, AppError> {
    let hashed = DUMMY_HASH
        .get_or_try_init(|| hash_password("vayon-login-placeholder"))
        .await?;
    Ok(hashed.as_str())
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    jwt_expiration_hours: i64,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, jwt_expiration_hours: i64, pool: PgPool) -> Self {
        Self {
            user_repo,
            jwt_secret,
            jwt_expiration_hours,
            pool,
        }
    }

    /// Cria o primeiro ADMIN. Recusa se já existir qualquer usuário.
    pub async fn setup(&self, payload: &SetupAdminPayload) -> Result<AuthResponse, AppError> {
        let password_hash = hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;

        if self.user_repo.lock_and_count(&mut tx).await? > 0 {
            return Err(AppError::SetupAlreadyCompleted);
        }

        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                payload.username.trim(),
                payload.email.trim(),
                &password_hash,
                payload.full_name.trim(),
                Role::Admin,
            )
            .await?;

        tx.commit().await?;

        tracing::info!("👑 Administrador inicial criado: {}", user.username);
        let token = self.create_token(user.id)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, AppError> {
        let Some(user) = self.user_repo.find_by_username(username.trim()).await? else {
            verify_password(password, dummy_hash().await?).await?;
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AppError::InactiveUser);
        }

        self.user_repo.touch_last_login(user.id).await?;

        let token = self.create_token(user.id)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if !user.is_active {
            return Err(AppError::InactiveUser);
        }
        Ok(user)
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.jwt_expiration_hours);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    // --- GESTÃO DE USUÁRIOS ---

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list_users().await
    }

    pub async fn create_user(&self, payload: &CreateUserPayload) -> Result<User, AppError> {
        let password_hash = hash_password(&payload.password).await?;
        let user = self
            .user_repo
            .create_user(
                &self.pool,
                payload.username.trim(),
                payload.email.trim(),
                &password_hash,
                payload.full_name.trim(),
                payload.role,
            )
            .await?;
        tracing::info!("Usuário {} criado com papel {:?}", user.username, user.role);
        Ok(user)
    }

    pub async fn change_password(&self, user: &User, payload: &ChangePasswordPayload) -> Result<(), AppError> {
        if !verify_password(&payload.current_password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }
        let password_hash = hash_password(&payload.new_password).await?;
        self.user_repo.update_password(user.id, &password_hash).await
    }

    pub async fn deactivate_user(&self, id: Uuid, current_user_id: Uuid) -> Result<User, AppError> {
        if id == current_user_id {
            return Err(AppError::CannotDeactivateSelf);
        }
        self.user_repo.deactivate(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(hours: i64) -> AuthService {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/vayon_test")
            .unwrap();
        AuthService::new(UserRepository::new(pool.clone()), "segredo-de-teste".into(), hours, pool)
    }

    #[tokio::test]
    async fn token_carries_user_and_lifetime() {
        let svc = service(24);
        let user_id = Uuid::new_v4();
        let token = svc.create_token(user_id).unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"segredo-de-teste"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, user_id);
        assert_eq!(data.claims.exp - data.claims.iat, 24 * 3600);
    }

    #[tokio::test]
    async fn garbage_token_is_rejected_before_touching_the_database() {
        let svc = service(1);
        assert!(matches!(svc.validate_token("not.a.jwt").await, Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn hash_and_verify_roundtrip() {
        let hashed = hash_password("segredo123").await.unwrap();
        assert!(verify_password("segredo123", &hashed).await.unwrap());
        assert!(!verify_password("outra", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn cannot_deactivate_self() {
        let svc = service(1);
        let id = Uuid::new_v4();
        assert!(matches!(svc.deactivate_user(id, id).await, Err(AppError::CannotDeactivateSelf)));
    }

    #[tokio::test]
    async fn unknown_user_hash_is_stable_and_matches_nothing() {
        let first = dummy_hash().await.unwrap();
        let second = dummy_hash().await.unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(first.starts_with("$2"));
        assert!(!verify_password("admin123", first).await.unwrap());
    }
}

// src/services/auth.rs
//
// Provedor de identidade: registro, login e validação de sessão (JWT).

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::{
        auth::{AuthResponse, Claims, NewUser, RegisterUserPayload, Role, User},
        business::NewBusiness,
        status::clean,
    },
};

/// Hash de senha numa thread separada (bcrypt é CPU-bound).
pub(crate) async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, cost))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

/// Valor provisório e único para a coluna `whatsapp` de um negócio recém-registrado,
/// que ainda não tem número real.
pub(crate) fn placeholder_whatsapp() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("temp_{}_{}", Utc::now().timestamp_millis(), &suffix[..9])
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt_secret: String,
    session_ttl: chrono::Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        jwt_secret: String,
        session_ttl: chrono::Duration,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            jwt_secret,
            session_ttl,
            bcrypt_cost,
        }
    }

    /// Cria o negócio e o seu usuário ADMIN numa transação e já devolve a sessão.
    pub async fn register(&self, payload: &RegisterUserPayload) -> Result<AuthResponse, AppError> {
        let email = payload.email.trim();

        if self.users.find_by_email(email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        // 1. Hashing (fora da transação, não toca no banco)
        let password_hash = hash_password(&payload.password, self.bcrypt_cost).await?;

        let business = NewBusiness {
            name: payload.business_name.trim().to_string(),
            description: clean(payload.business_description.as_deref()),
            whatsapp: Some(placeholder_whatsapp()),
            ..Default::default()
        };
        let owner = NewUser {
            name: clean(Some(&payload.name)),
            email: email.to_string(),
            password_hash,
            role: Role::Admin,
            business_id: None,
        };

        // 2. Negócio + usuário na mesma transação
        let (user, business) = self.users.create_owner(&business, &owner).await?;

        tracing::info!(
            user_id = %user.id,
            business_id = %business.id,
            "🆕 Usuário ADMIN e negócio registrados"
        );

        let token = self.create_token(&user)?;
        Ok(AuthResponse {
            token,
            user,
            business: Some(business),
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .users
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "🔑 Login efetuado");
        let token = self.create_token(&user)?;
        Ok(AuthResponse {
            token,
            user,
            business: None,
        })
    }

    /// Valida o token e recarrega o usuário, para que papel e negócio estejam atualizados.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthenticated)?;

        self.users
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::Unauthenticated)
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.session_ttl;

        let claims = Claims {
            sub: user.id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, BusinessRepository};
    use crate::models::status::Visibility;

    fn service(store: Arc<MemoryStore>) -> AuthService {
        AuthService::new(store, "segredo".into(), chrono::Duration::hours(1), 4)
    }

    fn ana() -> RegisterUserPayload {
        RegisterUserPayload {
            name: "Ana".into(),
            email: "ana@x.com".into(),
            password: "secret1".into(),
            business_name: "Ana Shop".into(),
            business_description: None,
        }
    }

    #[test]
    fn placeholder_whatsapp_is_unique_and_tagged() {
        let a = placeholder_whatsapp();
        let b = placeholder_whatsapp();
        assert!(a.starts_with("temp_"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn register_creates_admin_owner_with_placeholder_whatsapp() {
        let store = Arc::new(MemoryStore::new());
        let auth = service(store.clone());

        let response = auth.register(&ana()).await.unwrap();
        let business = response.business.unwrap();

        assert_eq!(response.user.role, Role::Admin);
        assert_eq!(response.user.business_id, Some(business.id));
        assert_eq!(business.name, "Ana Shop");
        assert!(business.whatsapp.as_deref().is_some_and(|w| w.starts_with("temp_")));

        let stored =
            BusinessRepository::find_by_id(store.as_ref(), business.id, Visibility::ActiveOnly)
                .await
                .unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let auth = service(Arc::new(MemoryStore::new()));
        auth.register(&ana()).await.unwrap();
        assert!(matches!(auth.register(&ana()).await, Err(AppError::EmailAlreadyExists)));
    }

    #[tokio::test]
    async fn login_round_trips_through_token_validation() {
        let auth = service(Arc::new(MemoryStore::new()));
        let registered = auth.register(&ana()).await.unwrap();

        let session = auth.login("ana@x.com", "secret1").await.unwrap();
        let user = auth.validate_token(&session.token).await.unwrap();
        assert_eq!(user.id, registered.user.id);

        assert!(matches!(
            auth.login("ana@x.com", "errada").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("ninguem@x.com", "secret1").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn tokens_signed_with_another_secret_are_rejected() {
        let store = Arc::new(MemoryStore::new());
        let auth = service(store.clone());
        let registered = auth.register(&ana()).await.unwrap();

        let other = AuthService::new(store, "outro".into(), chrono::Duration::hours(1), 4);
        let forged = other.create_token(&registered.user).unwrap();

        assert!(matches!(auth.validate_token(&forged).await, Err(AppError::Unauthenticated)));
        assert!(matches!(auth.validate_token("lixo").await, Err(AppError::Unauthenticated)));
    }
}

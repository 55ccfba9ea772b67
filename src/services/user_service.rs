// src/services/user_service.rs

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{BusinessRepository, UserRepository},
    models::{
        auth::{CreateMemberPayload, NewUser, Role, UpdateProfilePayload, User},
        status::{clean, Visibility},
    },
    services::{
        access::{self, Actor, Target},
        auth::hash_password,
    },
};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    businesses: Arc<dyn BusinessRepository>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        businesses: Arc<dyn BusinessRepository>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            businesses,
            bcrypt_cost,
        }
    }

    /// Atualiza nome e e-mail do próprio usuário.
    pub async fn update_profile(
        &self,
        session: Option<&Actor>,
        payload: &UpdateProfilePayload,
    ) -> Result<User, AppError> {
        let actor = access::authenticated(session)?;
        payload.validate()?;
        let email = payload.email.trim();

        // O e-mail não pode pertencer a outro usuário
        if let Some(existing) = self.users.find_by_email(email).await? {
            if existing.id != actor.user_id {
                return Err(AppError::EmailAlreadyExists);
            }
        }

        let current = self
            .users
            .find_by_id(actor.user_id)
            .await?
            .ok_or_else(user_not_found)?;
        // Nome ausente mantém o atual; string vazia apaga.
        let name = match payload.name.as_deref() {
            Some(name) => clean(Some(name)),
            None => current.name,
        };

        let user = self
            .users
            .update_profile(actor.user_id, name.as_deref(), email)
            .await?
            .ok_or_else(user_not_found)?;

        tracing::info!(user_id = %user.id, "✏️ Perfil atualizado");
        Ok(user)
    }

    /// ADMIN cria um usuário comum, opcionalmente já ligado a um negócio.
    pub async fn create_member(
        &self,
        session: Option<&Actor>,
        payload: &CreateMemberPayload,
    ) -> Result<User, AppError> {
        access::authorize(session, Target::Membership)?;
        payload.validate()?;

        if let Some(business_id) = payload.business_id {
            self.require_business(business_id).await?;
        }

        let email = payload.email.trim();
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        let password_hash = hash_password(&payload.password, self.bcrypt_cost).await?;
        let user = self
            .users
            .create_user(&NewUser {
                name: clean(payload.name.as_deref()),
                email: email.to_string(),
                password_hash,
                role: Role::User,
                business_id: payload.business_id,
            })
            .await?;

        tracing::info!(user_id = %user.id, business_id = ?user.business_id, "👤 Membro criado");
        Ok(user)
    }

    /// ADMIN associa (ou desassocia) um usuário a um negócio.
    pub async fn assign_business(
        &self,
        session: Option<&Actor>,
        user_id: Uuid,
        business_id: Option<Uuid>,
    ) -> Result<User, AppError> {
        access::authorize(session, Target::Membership)?;

        if let Some(business_id) = business_id {
            self.require_business(business_id).await?;
        }

        let user = self
            .users
            .assign_business(user_id, business_id)
            .await?
            .ok_or_else(user_not_found)?;

        tracing::info!(user_id = %user.id, business_id = ?business_id, "🔗 Negócio do usuário alterado");
        Ok(user)
    }

    async fn require_business(&self, business_id: Uuid) -> Result<(), AppError> {
        self.businesses
            .find_by_id(business_id, Visibility::IncludeArchived)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("Negócio não encontrado."))
    }
}

fn user_not_found() -> AppError {
    AppError::not_found("Usuário não encontrado.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::business::NewBusiness;

    fn service(store: &Arc<MemoryStore>) -> UserService {
        UserService::new(store.clone(), store.clone(), 4)
    }

    fn admin() -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
            business_id: None,
        }
    }

    fn member(email: &str, business_id: Option<Uuid>) -> CreateMemberPayload {
        CreateMemberPayload {
            name: Some("Membro".into()),
            email: email.into(),
            password: "secret1".into(),
            business_id,
        }
    }

    #[tokio::test]
    async fn admin_creates_members_and_users_cannot() {
        let store = Arc::new(MemoryStore::new());
        let users = service(&store);
        let business = store
            .create_business(
                &NewBusiness {
                    name: "Loja".into(),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        let created = users
            .create_member(Some(&admin()), &member("m@x.com", Some(business.id)))
            .await
            .unwrap();
        assert_eq!(created.role, Role::User);
        assert_eq!(created.business_id, Some(business.id));

        let as_user = Actor::from(&created);
        assert!(matches!(
            users.create_member(Some(&as_user), &member("n@x.com", None)).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn profile_update_rejects_email_of_another_user() {
        let store = Arc::new(MemoryStore::new());
        let users = service(&store);
        let a = users.create_member(Some(&admin()), &member("a@x.com", None)).await.unwrap();
        users.create_member(Some(&admin()), &member("b@x.com", None)).await.unwrap();

        let actor = Actor::from(&a);
        let taken = UpdateProfilePayload {
            name: None,
            email: "b@x.com".into(),
        };
        assert!(matches!(
            users.update_profile(Some(&actor), &taken).await,
            Err(AppError::EmailAlreadyExists)
        ));

        // Manter o próprio e-mail é permitido
        let same = UpdateProfilePayload {
            name: Some("Ana".into()),
            email: "a@x.com".into(),
        };
        let updated = users.update_profile(Some(&actor), &same).await.unwrap();
        assert_eq!(updated.name.as_deref(), Some("Ana"));

        assert!(matches!(
            users.update_profile(None, &same).await,
            Err(AppError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn profile_update_without_name_keeps_the_stored_one() {
        let store = Arc::new(MemoryStore::new());
        let users = service(&store);
        let m = users.create_member(Some(&admin()), &member("m@x.com", None)).await.unwrap();
        let actor = Actor::from(&m);

        let email_only = UpdateProfilePayload {
            name: None,
            email: "novo@x.com".into(),
        };
        let updated = users.update_profile(Some(&actor), &email_only).await.unwrap();
        assert_eq!(updated.email, "novo@x.com");
        assert_eq!(updated.name.as_deref(), Some("Membro"));

        // String vazia apaga o nome
        let cleared = UpdateProfilePayload {
            name: Some("  ".into()),
            email: "novo@x.com".into(),
        };
        let updated = users.update_profile(Some(&actor), &cleared).await.unwrap();
        assert_eq!(updated.name, None);
    }

    #[tokio::test]
    async fn access_is_decided_before_the_payload_is_validated() {
        let store = Arc::new(MemoryStore::new());
        let users = service(&store);
        let invalid = CreateMemberPayload {
            name: None,
            email: "sem-arroba".into(),
            password: "123".into(),
            business_id: None,
        };

        let as_user = Actor {
            user_id: Uuid::new_v4(),
            role: Role::User,
            business_id: None,
        };
        assert!(matches!(
            users.create_member(Some(&as_user), &invalid).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            users.create_member(Some(&admin()), &invalid).await,
            Err(AppError::ValidationError(_))
        ));

        let bad_email = UpdateProfilePayload {
            name: None,
            email: "nope".into(),
        };
        assert!(matches!(
            users.update_profile(None, &bad_email).await,
            Err(AppError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn assigning_unknown_business_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let users = service(&store);
        let m = users.create_member(Some(&admin()), &member("m@x.com", None)).await.unwrap();

        assert!(matches!(
            users.assign_business(Some(&admin()), m.id, Some(Uuid::new_v4())).await,
            Err(AppError::NotFound(_))
        ));
        let cleared = users.assign_business(Some(&admin()), m.id, None).await.unwrap();
        assert_eq!(cleared.business_id, None);
    }
}

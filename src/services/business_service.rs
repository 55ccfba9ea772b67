// src/services/business_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{repository::WHATSAPP_TAKEN, BusinessRepository},
    models::{
        business::{
            Business, BusinessList, CreateBusinessPayload, DeletedBusiness, OwnBusiness,
            UpdateBusinessPayload,
        },
        status::Visibility,
    },
    services::access::{self, Actor, BusinessAction, Target},
};

#[derive(Clone)]
pub struct BusinessService {
    businesses: Arc<dyn BusinessRepository>,
}

impl BusinessService {
    pub fn new(businesses: Arc<dyn BusinessRepository>) -> Self {
        Self { businesses }
    }

    pub async fn get(&self, session: Option<&Actor>, id: Uuid) -> Result<Business, AppError> {
        access::authorize(session, Target::business(BusinessAction::Read, id))?;

        self.businesses
            .find_by_id(id, Visibility::IncludeArchived)
            .await?
            .ok_or_else(not_found)
    }

    /// O negócio associado ao próprio usuário (pode não existir).
    pub async fn get_own(&self, session: Option<&Actor>) -> Result<OwnBusiness, AppError> {
        let actor = access::authenticated(session)?;

        let Some(own) = actor.business_id else {
            return Ok(OwnBusiness {
                has_business: false,
                business: None,
            });
        };
        access::authorize(session, Target::business(BusinessAction::Read, own))?;

        let business = self.businesses.find_by_id(own, Visibility::IncludeArchived).await?;
        Ok(OwnBusiness {
            has_business: business.is_some(),
            business,
        })
    }

    pub async fn list(
        &self,
        session: Option<&Actor>,
        include_archived: bool,
    ) -> Result<BusinessList, AppError> {
        access::authorize(session, Target::businesses(BusinessAction::List))?;

        let visibility = if include_archived {
            Visibility::IncludeArchived
        } else {
            Visibility::ActiveOnly
        };
        let businesses = self.businesses.list(visibility).await?;
        Ok(BusinessList {
            count: businesses.len(),
            businesses,
        })
    }

    pub async fn create(
        &self,
        session: Option<&Actor>,
        payload: CreateBusinessPayload,
    ) -> Result<Business, AppError> {
        access::authorize(session, Target::businesses(BusinessAction::Create))?;
        let actor = access::authenticated(session)?;

        let new_business = payload.into_new_business()?;
        if let Some(whatsapp) = new_business.whatsapp.as_deref() {
            if self.businesses.find_by_whatsapp(whatsapp).await?.is_some() {
                return Err(AppError::conflict(WHATSAPP_TAKEN));
            }
        }

        // Quem cria passa a pertencer ao novo negócio, inclusive um ADMIN que já
        // tinha outro: o tenant padrão dele acompanha o negócio mais recente.
        let business = self
            .businesses
            .create_business(&new_business, Some(actor.user_id))
            .await?;

        tracing::info!(
            business_id = %business.id,
            user_id = %actor.user_id,
            previous_business_id = ?actor.business_id,
            "🏪 Negócio criado"
        );
        Ok(business)
    }

    /// Atualização parcial. Também serve para (des)arquivar.
    pub async fn update(
        &self,
        session: Option<&Actor>,
        id: Uuid,
        payload: UpdateBusinessPayload,
    ) -> Result<Business, AppError> {
        let action = if payload.archived.is_some() {
            BusinessAction::Archive
        } else {
            BusinessAction::Update
        };
        access::authorize(session, Target::business(action, id))?;

        let changes = payload.into_changes()?;

        let mut business = self
            .businesses
            .find_by_id(id, Visibility::IncludeArchived)
            .await?
            .ok_or_else(not_found)?;

        // WhatsApp novo não pode estar em uso por outro negócio
        if let Some(Some(whatsapp)) = &changes.whatsapp {
            if business.whatsapp.as_deref() != Some(whatsapp.as_str()) {
                if let Some(other) = self.businesses.find_by_whatsapp(whatsapp).await? {
                    if other.id != id {
                        return Err(AppError::conflict(WHATSAPP_TAKEN));
                    }
                }
            }
        }

        business.apply(&changes);
        let updated = self
            .businesses
            .update_business(&business)
            .await?
            .ok_or_else(not_found)?;

        tracing::info!(business_id = %updated.id, archived = updated.archived, "✏️ Negócio atualizado");
        Ok(updated)
    }

    /// Atualização do próprio negócio, sem id na rota.
    pub async fn update_own(
        &self,
        session: Option<&Actor>,
        payload: UpdateBusinessPayload,
    ) -> Result<Business, AppError> {
        let actor = access::authenticated(session)?;
        let own = actor.business_id.ok_or(AppError::NoTenantAssigned)?;
        self.update(session, own, payload).await
    }

    /// Exclusão definitiva (só ADMIN). Os usuários do negócio ficam sem negócio.
    pub async fn delete(
        &self,
        session: Option<&Actor>,
        business_id: Option<Uuid>,
    ) -> Result<DeletedBusiness, AppError> {
        access::authorize(
            session,
            Target::Business {
                action: BusinessAction::Delete,
                business_id,
            },
        )?;
        let id = business_id
            .ok_or_else(|| AppError::bad_request("O ID do negócio é obrigatório."))?;

        let detached_users = self
            .businesses
            .delete_detaching_users(id)
            .await?
            .ok_or_else(not_found)?;

        tracing::info!(business_id = %id, detached_users, "🗑️ Negócio excluído");
        Ok(DeletedBusiness {
            deleted_business_id: id,
            detached_users,
        })
    }
}

fn not_found() -> AppError {
    AppError::not_found("Negócio não encontrado.")
}

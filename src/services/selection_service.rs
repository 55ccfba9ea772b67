// src/services/selection_service.rs
//
// Mantém o negócio "selecionado": no máximo uma linha com `is_selected = true`
// no banco inteiro. A troca é sempre feita por `select_exclusive`, que desmarca e
// marca numa única transação.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::BusinessRepository,
    models::{
        business::{Business, SelectedBusiness},
        status::Visibility,
    },
    services::access::{self, Actor, BusinessAction, Target},
};

#[derive(Clone)]
pub struct SelectionService {
    businesses: Arc<dyn BusinessRepository>,
}

impl SelectionService {
    pub fn new(businesses: Arc<dyn BusinessRepository>) -> Self {
        Self { businesses }
    }

    /// Seleciona `business_id`. USER só pode selecionar o próprio negócio.
    pub async fn select(
        &self,
        session: Option<&Actor>,
        business_id: Option<Uuid>,
    ) -> Result<Business, AppError> {
        access::authorize(
            session,
            Target::Business {
                action: BusinessAction::Select,
                business_id,
            },
        )?;
        let id = business_id
            .ok_or_else(|| AppError::bad_request("O ID do negócio é obrigatório."))?;

        // Arquivado conta como inexistente: nunca seria devolvido como selecionado.
        let selected = self
            .businesses
            .select_exclusive(id)
            .await?
            .ok_or_else(|| AppError::not_found("Negócio não encontrado."))?;

        tracing::info!(business_id = %selected.id, "📌 Negócio selecionado");
        Ok(selected)
    }

    /// Devolve o negócio selecionado. Se não houver (primeiro uso, ou o selecionado
    /// foi arquivado), escolhe um automaticamente e persiste a escolha.
    pub async fn current(&self, session: Option<&Actor>) -> Result<SelectedBusiness, AppError> {
        let actor = access::authenticated(session)?;

        if let Some(selected) = self.businesses.find_selected().await? {
            return Ok(SelectedBusiness {
                selected_business: Some(selected),
                auto_selected: false,
                message: None,
            });
        }

        if let Some(candidate) = self.fallback_for(actor).await? {
            // Pode ter sido arquivado ou removido entre a leitura e a seleção.
            if let Some(selected) = self.businesses.select_exclusive(candidate.id).await? {
                tracing::info!(business_id = %selected.id, "📌 Negócio selecionado automaticamente");
                return Ok(SelectedBusiness {
                    selected_business: Some(selected),
                    auto_selected: true,
                    message: None,
                });
            }
        }

        Ok(SelectedBusiness {
            selected_business: None,
            auto_selected: false,
            message: Some("Nenhum negócio disponível.".to_string()),
        })
    }

    // ADMIN: o negócio ativo mais antigo. USER: o próprio negócio, se ativo.
    async fn fallback_for(&self, actor: &Actor) -> Result<Option<Business>, AppError> {
        if actor.is_admin() {
            return self.businesses.find_oldest_active().await;
        }
        match actor.business_id {
            Some(own) => self.businesses.find_by_id(own, Visibility::ActiveOnly).await,
            None => Ok(None),
        }
    }
}

// src/services/client_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Pagination},
    db::{repository::CLIENT_EMAIL_TAKEN, BusinessRepository, ClientFilter, ClientRepository},
    models::{
        client::{ArchivedClient, Client, ClientFields, ClientPage, ClientPayload, ListClientsQuery},
        status::Visibility,
    },
    services::access::{self, Actor, ClientAction, Scope, Target},
};

#[derive(Clone)]
pub struct ClientService {
    clients: Arc<dyn ClientRepository>,
    businesses: Arc<dyn BusinessRepository>,
}

impl ClientService {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        businesses: Arc<dyn BusinessRepository>,
    ) -> Self {
        Self {
            clients,
            businesses,
        }
    }

    pub async fn list(
        &self,
        session: Option<&Actor>,
        query: &ListClientsQuery,
    ) -> Result<ClientPage, AppError> {
        let scope = access::authorize(
            session,
            Target::client(ClientAction::List, query.business_id),
        )?;

        let page = query.page_request();
        let filter = ClientFilter {
            tenant: scope.tenant(),
            visibility: Visibility::ActiveOnly,
            search: query.search_term(),
            page,
        };
        let (clients, total) = self.clients.list_clients(&filter).await?;

        Ok(ClientPage {
            clients,
            pagination: Pagination::new(page, total),
        })
    }

    pub async fn get(&self, session: Option<&Actor>, id: Uuid) -> Result<Client, AppError> {
        let scope = access::authorize(session, Target::client(ClientAction::Read, None))?;
        self.find_active(scope, id).await
    }

    pub async fn create(
        &self,
        session: Option<&Actor>,
        payload: ClientPayload,
    ) -> Result<Client, AppError> {
        let scope = access::authorize(
            session,
            Target::client(ClientAction::Create, payload.business_id),
        )?;
        // Create sempre resolve para um tenant concreto
        let business_id = scope
            .tenant()
            .ok_or_else(|| AppError::bad_request("Negócio não especificado."))?;

        let fields = payload.fields()?;

        if self
            .businesses
            .find_by_id(business_id, Visibility::ActiveOnly)
            .await?
            .is_none()
        {
            return Err(AppError::not_found("Negócio não encontrado."));
        }
        self.ensure_email_free(business_id, &fields, None).await?;

        let client = self.clients.create_client(business_id, &fields).await?;
        tracing::info!(client_id = %client.id, business_id = %business_id, "🧾 Cliente criado");
        Ok(client)
    }

    /// Substitui os campos editáveis. O negócio do cliente nunca muda.
    pub async fn update(
        &self,
        session: Option<&Actor>,
        id: Uuid,
        payload: ClientPayload,
    ) -> Result<Client, AppError> {
        let scope = access::authorize(session, Target::client(ClientAction::Update, None))?;
        let fields = payload.fields()?;

        let current = self.find_active(scope, id).await?;
        self.ensure_email_free(current.business_id, &fields, Some(current.id))
            .await?;

        let client = self
            .clients
            .update_client(current.id, &fields)
            .await?
            .ok_or_else(not_found)?;

        tracing::info!(client_id = %client.id, "✏️ Cliente atualizado");
        Ok(client)
    }

    /// Arquivamento (soft delete): o registro fica, mas some das leituras.
    pub async fn archive(
        &self,
        session: Option<&Actor>,
        id: Uuid,
    ) -> Result<ArchivedClient, AppError> {
        let scope = access::authorize(session, Target::client(ClientAction::Archive, None))?;

        let current = self.find_active(scope, id).await?;
        if !self.clients.archive_client(current.id).await? {
            return Err(not_found());
        }

        tracing::info!(client_id = %current.id, "📦 Cliente arquivado");
        Ok(ArchivedClient {
            id: current.id,
            message: "Cliente arquivado com sucesso.".to_string(),
        })
    }

    // Clientes fora do tenant respondem como inexistentes.
    async fn find_active(&self, scope: Scope, id: Uuid) -> Result<Client, AppError> {
        self.clients
            .find_client(id, scope.tenant(), Visibility::ActiveOnly)
            .await?
            .ok_or_else(not_found)
    }

    async fn ensure_email_free(
        &self,
        business_id: Uuid,
        fields: &ClientFields,
        exclude: Option<Uuid>,
    ) -> Result<(), AppError> {
        let Some(email) = fields.email.as_deref() else {
            return Ok(());
        };
        match self.clients.find_active_by_email(business_id, email, exclude).await? {
            Some(_) => Err(AppError::conflict(CLIENT_EMAIL_TAKEN)),
            None => Ok(()),
        }
    }
}

fn not_found() -> AppError {
    AppError::not_found("Cliente não encontrado.")
}

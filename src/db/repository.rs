// src/db/repository.rs
//
// Contratos entre os serviços e o armazenamento. Existem duas implementações:
// Postgres (`Pg*Repository`) e o `MemoryStore` em processo.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageRequest},
    models::{
        auth::{NewUser, User},
        business::{Business, NewBusiness},
        client::{Client, ClientFields},
        status::Visibility,
    },
};

pub const WHATSAPP_TAKEN: &str = "Este número de WhatsApp já está registrado em outro negócio.";
pub const CLIENT_EMAIL_TAKEN: &str = "Já existe um cliente com este e-mail no negócio.";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// E-mail duplicado vira `AppError::EmailAlreadyExists`.
    async fn create_user(&self, new_user: &NewUser) -> Result<User, AppError>;

    /// Cria o negócio e o seu usuário dono numa única transação.
    /// O `business_id` de `owner` é ignorado e substituído pelo do negócio criado.
    async fn create_owner(
        &self,
        business: &NewBusiness,
        owner: &NewUser,
    ) -> Result<(User, Business), AppError>;

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: &str,
    ) -> Result<Option<User>, AppError>;

    async fn assign_business(
        &self,
        id: Uuid,
        business_id: Option<Uuid>,
    ) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait BusinessRepository: Send + Sync {
    /// Cria o negócio; se `owner` vier, associa esse usuário na mesma transação.
    async fn create_business(
        &self,
        business: &NewBusiness,
        owner: Option<Uuid>,
    ) -> Result<Business, AppError>;

    async fn find_by_id(
        &self,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Option<Business>, AppError>;

    async fn find_by_whatsapp(&self, whatsapp: &str) -> Result<Option<Business>, AppError>;

    /// Mais recentes primeiro.
    async fn list(&self, visibility: Visibility) -> Result<Vec<Business>, AppError>;

    /// Grava todos os campos editáveis; nunca altera `is_selected`.
    async fn update_business(&self, business: &Business) -> Result<Option<Business>, AppError>;

    /// Desassocia os usuários e remove o negócio (clientes vão junto).
    /// Retorna quantos usuários foram desassociados, ou `None` se o negócio não existe.
    async fn delete_detaching_users(&self, id: Uuid) -> Result<Option<u64>, AppError>;

    /// O negócio marcado como selecionado, se estiver ativo.
    async fn find_selected(&self) -> Result<Option<Business>, AppError>;

    /// O negócio ativo mais antigo (ordem de criação).
    async fn find_oldest_active(&self) -> Result<Option<Business>, AppError>;

    /// Desmarca todos e marca `id`, como uma unidade atômica.
    /// Retorna `None` (sem alterar nada) se `id` não existe ou está arquivado.
    async fn select_exclusive(&self, id: Uuid) -> Result<Option<Business>, AppError>;

    async fn count_selected(&self) -> Result<u64, AppError>;
}

/// Filtro da listagem de clientes. `tenant = None` só chega aqui para ADMIN.
#[derive(Debug, Clone)]
pub struct ClientFilter {
    pub tenant: Option<Uuid>,
    pub visibility: Visibility,
    pub search: Option<String>,
    pub page: PageRequest,
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn create_client(
        &self,
        business_id: Uuid,
        fields: &ClientFields,
    ) -> Result<Client, AppError>;

    async fn find_client(
        &self,
        id: Uuid,
        tenant: Option<Uuid>,
        visibility: Visibility,
    ) -> Result<Option<Client>, AppError>;

    async fn find_active_by_email(
        &self,
        business_id: Uuid,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<Client>, AppError>;

    /// Página de clientes (mais recentes primeiro) e o total do filtro.
    async fn list_clients(&self, filter: &ClientFilter) -> Result<(Vec<Client>, u64), AppError>;

    async fn update_client(
        &self,
        id: Uuid,
        fields: &ClientFields,
    ) -> Result<Option<Client>, AppError>;

    /// Marca como arquivado. `false` se não havia cliente ativo com esse id.
    async fn archive_client(&self, id: Uuid) -> Result<bool, AppError>;
}

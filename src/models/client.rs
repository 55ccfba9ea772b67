// src/models/client.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::pagination::{PageRequest, Pagination};
use crate::models::status::{clean, RecordStatus};

// Cliente (customer) de um negócio. Pertence a exatamente um tenant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    // Único por negócio entre os clientes não arquivados
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub document: Option<String>,
    pub document_type: Option<String>,
    pub notes: Option<String>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn status(&self) -> RecordStatus {
        RecordStatus::from_archived(self.archived)
    }

    /// Busca case-insensitive em nome, e-mail, telefone e documento.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        std::iter::once(Some(self.name.as_str()))
            .chain([
                self.email.as_deref(),
                self.phone.as_deref(),
                self.document.as_deref(),
            ])
            .flatten()
            .any(|value| value.to_lowercase().contains(&term))
    }
}

/// Campos editáveis de um cliente, já normalizados.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientFields {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub document: Option<String>,
    pub document_type: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayload {
    #[schema(example = "Maria da Silva")]
    pub name: Option<String>,
    #[schema(example = "maria@email.com")]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub document: Option<String>,
    pub document_type: Option<String>,
    pub notes: Option<String>,
    // Só considerado para ADMIN (ou se igual ao negócio do próprio USER)
    pub business_id: Option<Uuid>,
}

impl ClientPayload {
    pub fn fields(&self) -> Result<ClientFields, AppError> {
        let name = clean(self.name.as_deref())
            .ok_or_else(|| AppError::bad_request("O nome é obrigatório."))?;

        Ok(ClientFields {
            name,
            email: clean(self.email.as_deref()),
            phone: clean(self.phone.as_deref()),
            address: clean(self.address.as_deref()),
            document: clean(self.document.as_deref()),
            document_type: clean(self.document_type.as_deref()),
            notes: clean(self.notes.as_deref()),
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListClientsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub business_id: Option<Uuid>,
}

impl ListClientsQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    pub fn search_term(&self) -> Option<String> {
        clean(self.search.as_deref())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClientPage {
    pub clients: Vec<Client>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArchivedClient {
    pub id: Uuid,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_requires_a_name() {
        let payload = ClientPayload {
            name: Some("   ".into()),
            ..Default::default()
        };
        assert!(payload.fields().is_err());
    }

    #[test]
    fn payload_is_trimmed() {
        let payload = ClientPayload {
            name: Some(" Maria ".into()),
            email: Some(" maria@x.com ".into()),
            notes: Some("".into()),
            ..Default::default()
        };
        let fields = payload.fields().unwrap();
        assert_eq!(fields.name, "Maria");
        assert_eq!(fields.email.as_deref(), Some("maria@x.com"));
        assert_eq!(fields.notes, None);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            name: "Maria".into(),
            email: Some("MARIA@Shop.com".into()),
            phone: Some("5511".into()),
            address: Some("Rua X".into()),
            document: Some("ABC-123".into()),
            document_type: None,
            notes: None,
            archived: false,
            created_at: now,
            updated_at: now,
        };
        assert!(client.matches("shop"));
        assert!(client.matches("abc"));
        assert!(client.matches("551"));
        // endereço não entra na busca
        assert!(!client.matches("rua"));
    }
}

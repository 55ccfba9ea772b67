// src/models/business.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::status::{clean, RecordStatus};

// ---
// 1. Business (O "Negócio", o tenant)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    // Único quando presente
    pub whatsapp: Option<String>,
    pub logo: Option<String>,
    pub archived: bool,
    // Só o gerenciador de seleção altera este campo
    pub is_selected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Business {
    pub fn status(&self) -> RecordStatus {
        RecordStatus::from_archived(self.archived)
    }

    /// Aplica uma atualização parcial. `is_selected` nunca é tocado aqui.
    pub fn apply(&mut self, changes: &BusinessChanges) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(v) = &changes.description {
            self.description = v.clone();
        }
        if let Some(v) = &changes.address {
            self.address = v.clone();
        }
        if let Some(v) = &changes.phone {
            self.phone = v.clone();
        }
        if let Some(v) = &changes.email {
            self.email = v.clone();
        }
        if let Some(v) = &changes.website {
            self.website = v.clone();
        }
        if let Some(v) = &changes.whatsapp {
            self.whatsapp = v.clone();
        }
        if let Some(v) = &changes.logo {
            self.logo = v.clone();
        }
        if let Some(archived) = changes.archived {
            self.archived = archived;
        }
        self.updated_at = Utc::now();
    }
}

/// Dados para inserir um negócio.
#[derive(Debug, Clone, Default)]
pub struct NewBusiness {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub whatsapp: Option<String>,
    pub logo: Option<String>,
}

/// Atualização parcial já normalizada.
/// `None` = não mexe; `Some(None)` = limpa o campo.
#[derive(Debug, Clone, Default)]
pub struct BusinessChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub whatsapp: Option<Option<String>>,
    pub logo: Option<Option<String>>,
    pub archived: Option<bool>,
}

// ---
// 2. Payloads
// ---

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBusinessPayload {
    #[schema(example = "Padaria Central")]
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    #[schema(example = "+5511999990000")]
    pub whatsapp: Option<String>,
    pub logo: Option<String>,
}

impl CreateBusinessPayload {
    pub fn into_new_business(self) -> Result<NewBusiness, AppError> {
        let name = clean(self.name.as_deref())
            .ok_or_else(|| AppError::bad_request("O nome do negócio é obrigatório."))?;

        Ok(NewBusiness {
            name,
            description: clean(self.description.as_deref()),
            address: clean(self.address.as_deref()),
            phone: clean(self.phone.as_deref()),
            email: clean(self.email.as_deref()),
            website: clean(self.website.as_deref()),
            whatsapp: clean(self.whatsapp.as_deref()),
            logo: clean(self.logo.as_deref()),
        })
    }
}

// Campos ausentes não são alterados; string vazia limpa o campo.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBusinessPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub whatsapp: Option<String>,
    pub logo: Option<String>,
    pub archived: Option<bool>,
}

impl UpdateBusinessPayload {
    /// O nome é obrigatório, exceto quando a requisição só (des)arquiva.
    pub fn into_changes(self) -> Result<BusinessChanges, AppError> {
        let name = match self.name.as_deref() {
            Some(raw) => Some(
                clean(Some(raw))
                    .ok_or_else(|| AppError::bad_request("O nome do negócio é obrigatório."))?,
            ),
            None if self.archived.is_none() => {
                return Err(AppError::bad_request("O nome do negócio é obrigatório."));
            }
            None => None,
        };

        let field = |v: Option<String>| v.map(|s| clean(Some(&s)));

        Ok(BusinessChanges {
            name,
            description: field(self.description),
            address: field(self.address),
            phone: field(self.phone),
            email: field(self.email),
            website: field(self.website),
            whatsapp: field(self.whatsapp),
            logo: field(self.logo),
            archived: self.archived,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessIdPayload {
    pub business_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListBusinessQuery {
    #[serde(default)]
    pub include_archived: bool,
}

// ---
// 3. Respostas
// ---

#[derive(Debug, Serialize, ToSchema)]
pub struct BusinessList {
    pub businesses: Vec<Business>,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnBusiness {
    pub has_business: bool,
    pub business: Option<Business>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedBusiness {
    pub deleted_business_id: Uuid,
    pub detached_users: u64,
}

/// Resultado de `GET /business/select`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectedBusiness {
    pub selected_business: Option<Business>,
    pub auto_selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Business {
        let now = Utc::now();
        Business {
            id: Uuid::new_v4(),
            name: "Loja".into(),
            description: Some("antiga".into()),
            address: None,
            phone: None,
            email: None,
            website: None,
            whatsapp: Some("+55 11".into()),
            logo: None,
            archived: false,
            is_selected: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn archive_toggle_does_not_require_name() {
        let payload = UpdateBusinessPayload {
            archived: Some(true),
            ..Default::default()
        };
        let changes = payload.into_changes().unwrap();
        assert_eq!(changes.name, None);
        assert_eq!(changes.archived, Some(true));
    }

    #[test]
    fn update_without_name_is_rejected() {
        let payload = UpdateBusinessPayload {
            phone: Some("123".into()),
            ..Default::default()
        };
        assert!(matches!(payload.into_changes(), Err(AppError::BadRequest(_))));

        let blank = UpdateBusinessPayload {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert!(matches!(blank.into_changes(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn apply_clears_blank_fields_and_keeps_selection() {
        let mut business = sample();
        let changes = UpdateBusinessPayload {
            name: Some(" Loja Nova ".into()),
            description: Some("".into()),
            whatsapp: Some("".into()),
            ..Default::default()
        }
        .into_changes()
        .unwrap();

        business.apply(&changes);

        assert_eq!(business.name, "Loja Nova");
        assert_eq!(business.description, None);
        assert_eq!(business.whatsapp, None);
        assert!(business.is_selected);
        assert_eq!(business.status(), RecordStatus::Active);
    }

    #[test]
    fn create_requires_name() {
        let payload = CreateBusinessPayload {
            name: None,
            description: None,
            address: None,
            phone: None,
            email: None,
            website: None,
            whatsapp: Some(" ".into()),
            logo: None,
        };
        assert!(payload.into_new_business().is_err());
    }
}

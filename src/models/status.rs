// src/models/status.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Estado de arquivamento de um registro (soft-delete).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum RecordStatus {
    Active,
    Archived,
}

impl RecordStatus {
    pub fn from_archived(archived: bool) -> Self {
        if archived {
            RecordStatus::Archived
        } else {
            RecordStatus::Active
        }
    }
}

/// Quais registros uma consulta enxerga. Toda leitura recebe um valor explícito;
/// não existe filtro implícito de arquivados.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    ActiveOnly,
    IncludeArchived,
}

impl Visibility {
    pub fn admits(self, status: RecordStatus) -> bool {
        match self {
            Visibility::ActiveOnly => status == RecordStatus::Active,
            Visibility::IncludeArchived => true,
        }
    }

    /// Valor usado como parâmetro `$n` nas consultas: `true` libera arquivados.
    pub fn include_archived(self) -> bool {
        self == Visibility::IncludeArchived
    }
}

/// Remove espaços e transforma string vazia em `None`.
pub fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_only_hides_archived_rows() {
        assert!(Visibility::ActiveOnly.admits(RecordStatus::Active));
        assert!(!Visibility::ActiveOnly.admits(RecordStatus::Archived));
        assert!(Visibility::IncludeArchived.admits(RecordStatus::Archived));
    }

    #[test]
    fn clean_trims_and_drops_blank_strings() {
        assert_eq!(clean(Some("  ana  ")), Some("ana".to_string()));
        assert_eq!(clean(Some("   ")), None);
        assert_eq!(clean(None), None);
    }
}

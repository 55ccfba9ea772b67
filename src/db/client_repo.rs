// src/db/client_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    db::repository::{ClientFilter, ClientRepository, CLIENT_EMAIL_TAKEN},
    models::{
        client::{Client, ClientFields},
        status::Visibility,
    },
};

#[derive(Clone)]
pub struct PgClientRepository {
    pool: PgPool,
}

impl PgClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Escapa os curingas do LIKE para a busca tratar o termo literalmente.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl ClientRepository for PgClientRepository {
    async fn create_client(
        &self,
        business_id: Uuid,
        fields: &ClientFields,
    ) -> Result<Client, AppError> {
        sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (
                business_id, name, email, phone, address, document, document_type, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(business_id)
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.address)
        .bind(&fields.document)
        .bind(&fields.document_type)
        .bind(&fields.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, CLIENT_EMAIL_TAKEN))
    }

    async fn find_client(
        &self,
        id: Uuid,
        tenant: Option<Uuid>,
        visibility: Visibility,
    ) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT * FROM clients
            WHERE id = $1
              AND ($2::uuid IS NULL OR business_id = $2)
              AND ($3 OR NOT archived)
            "#,
        )
        .bind(id)
        .bind(tenant)
        .bind(visibility.include_archived())
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    async fn find_active_by_email(
        &self,
        business_id: Uuid,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT * FROM clients
            WHERE business_id = $1
              AND email = $2
              AND NOT archived
              AND ($3::uuid IS NULL OR id <> $3)
            LIMIT 1
            "#,
        )
        .bind(business_id)
        .bind(email)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    async fn list_clients(&self, filter: &ClientFilter) -> Result<(Vec<Client>, u64), AppError> {
        let pattern = filter.search.as_deref().map(like_pattern);
        let include_archived = filter.visibility.include_archived();

        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT * FROM clients
            WHERE ($1::uuid IS NULL OR business_id = $1)
              AND ($2 OR NOT archived)
              AND ($3::text IS NULL
                   OR name ILIKE $3 OR email ILIKE $3 OR phone ILIKE $3 OR document ILIKE $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.tenant)
        .bind(include_archived)
        .bind(&pattern)
        .bind(i64::from(filter.page.limit))
        .bind(filter.page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM clients
            WHERE ($1::uuid IS NULL OR business_id = $1)
              AND ($2 OR NOT archived)
              AND ($3::text IS NULL
                   OR name ILIKE $3 OR email ILIKE $3 OR phone ILIKE $3 OR document ILIKE $3)
            "#,
        )
        .bind(filter.tenant)
        .bind(include_archived)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok((clients, total as u64))
    }

    async fn update_client(
        &self,
        id: Uuid,
        fields: &ClientFields,
    ) -> Result<Option<Client>, AppError> {
        sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET name = $2, email = $3, phone = $4, address = $5,
                document = $6, document_type = $7, notes = $8, updated_at = NOW()
            WHERE id = $1 AND NOT archived
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.address)
        .bind(&fields.document)
        .bind(&fields.document_type)
        .bind(&fields.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, CLIENT_EMAIL_TAKEN))
    }

    async fn archive_client(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE clients SET archived = TRUE, updated_at = NOW() WHERE id = $1 AND NOT archived",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

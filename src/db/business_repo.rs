// src/db/business_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    db::repository::{BusinessRepository, WHATSAPP_TAKEN},
    models::{
        business::{Business, NewBusiness},
        status::Visibility,
    },
};

// Chave do advisory lock que serializa as trocas de seleção.
const SELECTION_LOCK_KEY: i64 = 0x5E1E_C7ED;

#[derive(Clone)]
pub struct PgBusinessRepository {
    pool: PgPool,
}

impl PgBusinessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Insere um negócio usando qualquer executor (pool ou transação).
pub(crate) async fn insert_business<'e, E>(
    executor: E,
    business: &NewBusiness,
) -> Result<Business, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, Business>(
        r#"
        INSERT INTO businesses (
            name, description, address, phone, email, website, whatsapp, logo
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(&business.name)
    .bind(&business.description)
    .bind(&business.address)
    .bind(&business.phone)
    .bind(&business.email)
    .bind(&business.website)
    .bind(&business.whatsapp)
    .bind(&business.logo)
    .fetch_one(executor)
    .await
    .map_err(|e| map_unique_violation(e, WHATSAPP_TAKEN))
}

#[async_trait]
impl BusinessRepository for PgBusinessRepository {
    async fn create_business(
        &self,
        business: &NewBusiness,
        owner: Option<Uuid>,
    ) -> Result<Business, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = insert_business(&mut *tx, business).await?;

        if let Some(owner_id) = owner {
            sqlx::query("UPDATE users SET business_id = $2, updated_at = NOW() WHERE id = $1")
                .bind(owner_id)
                .bind(created.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Option<Business>, AppError> {
        let business = sqlx::query_as::<_, Business>(
            "SELECT * FROM businesses WHERE id = $1 AND ($2 OR NOT archived)",
        )
        .bind(id)
        .bind(visibility.include_archived())
        .fetch_optional(&self.pool)
        .await?;
        Ok(business)
    }

    async fn find_by_whatsapp(&self, whatsapp: &str) -> Result<Option<Business>, AppError> {
        let business = sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE whatsapp = $1")
            .bind(whatsapp)
            .fetch_optional(&self.pool)
            .await?;
        Ok(business)
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<Business>, AppError> {
        let businesses = sqlx::query_as::<_, Business>(
            r#"
            SELECT * FROM businesses
            WHERE $1 OR NOT archived
            ORDER BY created_at DESC
            "#,
        )
        .bind(visibility.include_archived())
        .fetch_all(&self.pool)
        .await?;
        Ok(businesses)
    }

    async fn update_business(&self, business: &Business) -> Result<Option<Business>, AppError> {
        sqlx::query_as::<_, Business>(
            r#"
            UPDATE businesses
            SET name = $2, description = $3, address = $4, phone = $5, email = $6,
                website = $7, whatsapp = $8, logo = $9, archived = $10, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(business.id)
        .bind(&business.name)
        .bind(&business.description)
        .bind(&business.address)
        .bind(&business.phone)
        .bind(&business.email)
        .bind(&business.website)
        .bind(&business.whatsapp)
        .bind(&business.logo)
        .bind(business.archived)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, WHATSAPP_TAKEN))
    }

    async fn delete_detaching_users(&self, id: Uuid) -> Result<Option<u64>, AppError> {
        let mut tx = self.pool.begin().await?;

        let detached = sqlx::query(
            "UPDATE users SET business_id = NULL, updated_at = NOW() WHERE business_id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM businesses WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(detached))
    }

    async fn find_selected(&self) -> Result<Option<Business>, AppError> {
        let business = sqlx::query_as::<_, Business>(
            "SELECT * FROM businesses WHERE is_selected AND NOT archived LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(business)
    }

    async fn find_oldest_active(&self) -> Result<Option<Business>, AppError> {
        let business = sqlx::query_as::<_, Business>(
            "SELECT * FROM businesses WHERE NOT archived ORDER BY created_at ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(business)
    }

    async fn select_exclusive(&self, id: Uuid) -> Result<Option<Business>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Em READ COMMITTED duas transações concorrentes poderiam desmarcar
        // snapshots diferentes; o lock serializa o par desmarcar/marcar.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SELECTION_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE businesses SET is_selected = FALSE WHERE is_selected")
            .execute(&mut *tx)
            .await?;

        let selected = sqlx::query_as::<_, Business>(
            r#"
            UPDATE businesses
            SET is_selected = TRUE, updated_at = NOW()
            WHERE id = $1 AND NOT archived
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        match selected {
            Some(business) => {
                tx.commit().await?;
                Ok(Some(business))
            }
            None => {
                tx.rollback().await?;
                Ok(None)
            }
        }
    }

    async fn count_selected(&self) -> Result<u64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM businesses WHERE is_selected")
                .fetch_one(&self.pool)
                .await?;
        Ok(count as u64)
    }
}

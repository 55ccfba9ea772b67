// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{business_repo::insert_business, repository::UserRepository},
    models::{
        auth::{NewUser, User},
        business::{Business, NewBusiness},
    },
};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Converte erro de violação de chave única em um erro mais amigável
fn map_user_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::EmailAlreadyExists;
        }
    }
    e.into()
}

/// Insere um usuário usando qualquer executor (pool ou transação).
pub(crate) async fn insert_user<'e, E>(executor: E, new_user: &NewUser) -> Result<User, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password_hash, role, business_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(&new_user.name)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(new_user.role)
    .bind(new_user.business_id)
    .fetch_one(executor)
    .await
    .map_err(map_user_error)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<User, AppError> {
        insert_user(&self.pool, new_user).await
    }

    async fn create_owner(
        &self,
        business: &NewBusiness,
        owner: &NewUser,
    ) -> Result<(User, Business), AppError> {
        // Se qualquer passo falhar, o drop do `tx` faz o rollback.
        let mut tx = self.pool.begin().await?;

        let business = insert_business(&mut *tx, business).await?;

        let owner = NewUser {
            business_id: Some(business.id),
            ..owner.clone()
        };
        let user = insert_user(&mut *tx, &owner).await?;

        tx.commit().await?;
        Ok((user, business))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, email = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_user_error)
    }

    async fn assign_business(
        &self,
        id: Uuid,
        business_id: Option<Uuid>,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET business_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

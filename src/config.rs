// src/config.rs

use std::{env, time::Duration};

use anyhow::{anyhow, bail, Context};
use sqlx::postgres::PgPoolOptions;

use crate::{
    db::Store,
    services::{
        auth::AuthService, business_service::BusinessService, client_service::ClientService,
        selection_service::SelectionService, user_service::UserService,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub bind_addr: String,
}

impl Config {
    /// Lê a configuração das variáveis de ambiente (e do `.env`, se existir).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let storage = match lookup("STORAGE").as_deref().unwrap_or("postgres") {
            "postgres" => StorageBackend::Postgres,
            "memory" => StorageBackend::Memory,
            other => bail!("STORAGE inválido: '{other}' (use 'postgres' ou 'memory')"),
        };

        let database_url = lookup("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL deve ser definida quando STORAGE=postgres");
        }

        let jwt_secret =
            lookup("JWT_SECRET").ok_or_else(|| anyhow!("JWT_SECRET deve ser definido"))?;

        Ok(Self {
            storage,
            database_url,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            session_ttl_hours: parse_or(&lookup, "SESSION_TTL_HOURS", 24 * 7)?,
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} inválido: '{raw}'")),
        None => Ok(default),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub business_service: BusinessService,
    pub selection_service: SelectionService,
    pub client_service: ClientService,
}

impl AppState {
    /// Conecta ao armazenamento configurado e monta os serviços.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let store = match config.storage {
            StorageBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("DATABASE_URL deve ser definida"))?;

                // Se falhar, retorna um Err em vez de dar panic ou exit
                let db_pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!().run(&db_pool).await?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Store::postgres(db_pool)
            }
            StorageBackend::Memory => {
                tracing::warn!("⚠️ Usando armazenamento em memória: os dados somem ao reiniciar.");
                Store::in_memory()
            }
        };

        Ok(Self::from_store(store, config))
    }

    /// Monta o gráfico de dependências sobre um armazenamento já pronto.
    pub fn from_store(store: Store, config: &Config) -> Self {
        let auth_service = AuthService::new(
            store.users.clone(),
            config.jwt_secret.clone(),
            chrono::Duration::hours(config.session_ttl_hours),
            config.bcrypt_cost,
        );
        let user_service = UserService::new(
            store.users.clone(),
            store.businesses.clone(),
            config.bcrypt_cost,
        );
        let business_service = BusinessService::new(store.businesses.clone());
        let selection_service = SelectionService::new(store.businesses.clone());
        let client_service = ClientService::new(store.clients.clone(), store.businesses.clone());

        Self {
            auth_service,
            user_service,
            business_service,
            selection_service,
            client_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn memory_backend_needs_only_the_secret() {
        let config =
            Config::from_lookup(lookup(&[("STORAGE", "memory"), ("JWT_SECRET", "s")])).unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.session_ttl_hours, 168);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        assert!(Config::from_lookup(lookup(&[("JWT_SECRET", "s")])).is_err());
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s"),
            ("DATABASE_URL", "postgres://localhost/app"),
            ("BCRYPT_COST", "4"),
        ]))
        .unwrap();
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(config.bcrypt_cost, 4);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_lookup(lookup(&[("STORAGE", "redis"), ("JWT_SECRET", "s")])).is_err());
        assert!(Config::from_lookup(lookup(&[
            ("STORAGE", "memory"),
            ("JWT_SECRET", "s"),
            ("BCRYPT_COST", "muito"),
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup(&[("STORAGE", "memory")])).is_err());
    }
}

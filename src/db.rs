pub mod repository;
pub use repository::{BusinessRepository, ClientFilter, ClientRepository, UserRepository};
pub mod user_repo;
pub use user_repo::PgUserRepository;
pub mod business_repo;
pub use business_repo::PgBusinessRepository;
pub mod client_repo;
pub use client_repo::PgClientRepository;
pub mod memory;
pub use memory::MemoryStore;

use std::sync::Arc;

use sqlx::PgPool;

// Os repositórios usados pelos serviços, independentes do backend escolhido.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub businesses: Arc<dyn BusinessRepository>,
    pub clients: Arc<dyn ClientRepository>,
}

impl Store {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            businesses: Arc::new(PgBusinessRepository::new(pool.clone())),
            clients: Arc::new(PgClientRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            businesses: store.clone(),
            clients: store,
        }
    }
}

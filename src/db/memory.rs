// src/db/memory.rs
//
// Armazenamento em processo (`STORAGE=memory`). Aplica as mesmas restrições de
// unicidade do schema Postgres; todas as tabelas ficam sob um único RwLock, então
// cada operação (inclusive a troca de seleção) é atômica.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::repository::{
        BusinessRepository, ClientFilter, ClientRepository, UserRepository, CLIENT_EMAIL_TAKEN,
        WHATSAPP_TAKEN,
    },
    models::{
        auth::{NewUser, User},
        business::{Business, NewBusiness},
        client::{Client, ClientFields},
        status::{RecordStatus, Visibility},
    },
};

// Os vetores guardam a ordem de inserção, que é a ordem de criação.
#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    businesses: Vec<Business>,
    clients: Vec<Client>,
}

impl Tables {
    fn insert_user(&mut self, new_user: &NewUser) -> Result<User, AppError> {
        if self.users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::EmailAlreadyExists);
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            role: new_user.role,
            business_id: new_user.business_id,
            created_at: now,
            updated_at: now,
        };
        self.users.push(user.clone());
        Ok(user)
    }

    fn whatsapp_taken(&self, whatsapp: Option<&str>, except: Option<Uuid>) -> bool {
        let Some(whatsapp) = whatsapp else { return false };
        self.businesses
            .iter()
            .any(|b| b.whatsapp.as_deref() == Some(whatsapp) && Some(b.id) != except)
    }

    fn insert_business(&mut self, new: &NewBusiness) -> Result<Business, AppError> {
        if self.whatsapp_taken(new.whatsapp.as_deref(), None) {
            return Err(AppError::conflict(WHATSAPP_TAKEN));
        }
        let now = Utc::now();
        let business = Business {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            description: new.description.clone(),
            address: new.address.clone(),
            phone: new.phone.clone(),
            email: new.email.clone(),
            website: new.website.clone(),
            whatsapp: new.whatsapp.clone(),
            logo: new.logo.clone(),
            archived: false,
            is_selected: false,
            created_at: now,
            updated_at: now,
        };
        self.businesses.push(business.clone());
        Ok(business)
    }

    fn client_email_taken(
        &self,
        business_id: Uuid,
        email: Option<&str>,
        except: Option<Uuid>,
    ) -> bool {
        let Some(email) = email else { return false };
        self.clients.iter().any(|c| {
            c.business_id == business_id
                && !c.archived
                && c.email.as_deref() == Some(email)
                && Some(c.id) != except
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| anyhow::anyhow!("lock do armazenamento em memória envenenado").into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|_| anyhow::anyhow!("lock do armazenamento em memória envenenado").into())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.read()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<User, AppError> {
        let mut tables = self.write()?;
        if let Some(business_id) = new_user.business_id {
            if !tables.businesses.iter().any(|b| b.id == business_id) {
                return Err(AppError::not_found("Negócio não encontrado."));
            }
        }
        tables.insert_user(new_user)
    }

    async fn create_owner(
        &self,
        business: &NewBusiness,
        owner: &NewUser,
    ) -> Result<(User, Business), AppError> {
        let mut tables = self.write()?;

        // Valida tudo antes de gravar para não deixar meio registro.
        if tables.users.iter().any(|u| u.email == owner.email) {
            return Err(AppError::EmailAlreadyExists);
        }
        let business = tables.insert_business(business)?;
        let owner = NewUser {
            business_id: Some(business.id),
            ..owner.clone()
        };
        let user = tables.insert_user(&owner)?;
        Ok((user, business))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let mut tables = self.write()?;
        if tables.users.iter().any(|u| u.email == email && u.id != id) {
            return Err(AppError::EmailAlreadyExists);
        }
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.name = name.map(str::to_owned);
            user.email = email.to_owned();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn assign_business(
        &self,
        id: Uuid,
        business_id: Option<Uuid>,
    ) -> Result<Option<User>, AppError> {
        let mut tables = self.write()?;
        if let Some(business_id) = business_id {
            if !tables.businesses.iter().any(|b| b.id == business_id) {
                return Err(AppError::not_found("Negócio não encontrado."));
            }
        }
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.business_id = business_id;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

#[async_trait]
impl BusinessRepository for MemoryStore {
    async fn create_business(
        &self,
        business: &NewBusiness,
        owner: Option<Uuid>,
    ) -> Result<Business, AppError> {
        let mut tables = self.write()?;
        let created = tables.insert_business(business)?;
        if let Some(owner_id) = owner {
            if let Some(user) = tables.users.iter_mut().find(|u| u.id == owner_id) {
                user.business_id = Some(created.id);
                user.updated_at = Utc::now();
            }
        }
        Ok(created)
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Option<Business>, AppError> {
        Ok(self
            .read()?
            .businesses
            .iter()
            .find(|b| b.id == id && visibility.admits(b.status()))
            .cloned())
    }

    async fn find_by_whatsapp(&self, whatsapp: &str) -> Result<Option<Business>, AppError> {
        Ok(self
            .read()?
            .businesses
            .iter()
            .find(|b| b.whatsapp.as_deref() == Some(whatsapp))
            .cloned())
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<Business>, AppError> {
        Ok(self
            .read()?
            .businesses
            .iter()
            .rev()
            .filter(|b| visibility.admits(b.status()))
            .cloned()
            .collect())
    }

    async fn update_business(&self, business: &Business) -> Result<Option<Business>, AppError> {
        let mut tables = self.write()?;
        if tables.whatsapp_taken(business.whatsapp.as_deref(), Some(business.id)) {
            return Err(AppError::conflict(WHATSAPP_TAKEN));
        }
        Ok(tables.businesses.iter_mut().find(|b| b.id == business.id).map(|stored| {
            let is_selected = stored.is_selected;
            let created_at = stored.created_at;
            *stored = Business {
                is_selected,
                created_at,
                updated_at: Utc::now(),
                ..business.clone()
            };
            stored.clone()
        }))
    }

    async fn delete_detaching_users(&self, id: Uuid) -> Result<Option<u64>, AppError> {
        let mut tables = self.write()?;
        let Some(position) = tables.businesses.iter().position(|b| b.id == id) else {
            return Ok(None);
        };

        let mut detached = 0;
        for user in tables.users.iter_mut().filter(|u| u.business_id == Some(id)) {
            user.business_id = None;
            user.updated_at = Utc::now();
            detached += 1;
        }
        tables.clients.retain(|c| c.business_id != id);
        tables.businesses.remove(position);
        Ok(Some(detached))
    }

    async fn find_selected(&self) -> Result<Option<Business>, AppError> {
        Ok(self
            .read()?
            .businesses
            .iter()
            .find(|b| b.is_selected && b.status() == RecordStatus::Active)
            .cloned())
    }

    async fn find_oldest_active(&self) -> Result<Option<Business>, AppError> {
        Ok(self
            .read()?
            .businesses
            .iter()
            .filter(|b| b.status() == RecordStatus::Active)
            .min_by_key(|b| b.created_at)
            .cloned())
    }

    async fn select_exclusive(&self, id: Uuid) -> Result<Option<Business>, AppError> {
        let mut tables = self.write()?;
        if !tables.businesses.iter().any(|b| b.id == id && !b.archived) {
            return Ok(None);
        }

        let mut selected = None;
        for business in tables.businesses.iter_mut() {
            business.is_selected = business.id == id;
            if business.is_selected {
                business.updated_at = Utc::now();
                selected = Some(business.clone());
            }
        }
        Ok(selected)
    }

    async fn count_selected(&self) -> Result<u64, AppError> {
        Ok(self.read()?.businesses.iter().filter(|b| b.is_selected).count() as u64)
    }
}

#[async_trait]
impl ClientRepository for MemoryStore {
    async fn create_client(
        &self,
        business_id: Uuid,
        fields: &ClientFields,
    ) -> Result<Client, AppError> {
        let mut tables = self.write()?;
        if !tables.businesses.iter().any(|b| b.id == business_id) {
            return Err(AppError::not_found("Negócio não encontrado."));
        }
        if tables.client_email_taken(business_id, fields.email.as_deref(), None) {
            return Err(AppError::conflict(CLIENT_EMAIL_TAKEN));
        }

        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            business_id,
            name: fields.name.clone(),
            email: fields.email.clone(),
            phone: fields.phone.clone(),
            address: fields.address.clone(),
            document: fields.document.clone(),
            document_type: fields.document_type.clone(),
            notes: fields.notes.clone(),
            archived: false,
            created_at: now,
            updated_at: now,
        };
        tables.clients.push(client.clone());
        Ok(client)
    }

    async fn find_client(
        &self,
        id: Uuid,
        tenant: Option<Uuid>,
        visibility: Visibility,
    ) -> Result<Option<Client>, AppError> {
        Ok(self
            .read()?
            .clients
            .iter()
            .find(|c| {
                c.id == id
                    && tenant.is_none_or(|t| c.business_id == t)
                    && visibility.admits(c.status())
            })
            .cloned())
    }

    async fn find_active_by_email(
        &self,
        business_id: Uuid,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<Option<Client>, AppError> {
        Ok(self
            .read()?
            .clients
            .iter()
            .find(|c| {
                c.business_id == business_id
                    && !c.archived
                    && c.email.as_deref() == Some(email)
                    && Some(c.id) != exclude
            })
            .cloned())
    }

    async fn list_clients(&self, filter: &ClientFilter) -> Result<(Vec<Client>, u64), AppError> {
        let tables = self.read()?;
        let matching: Vec<&Client> = tables
            .clients
            .iter()
            .rev()
            .filter(|c| filter.tenant.is_none_or(|t| c.business_id == t))
            .filter(|c| filter.visibility.admits(c.status()))
            .filter(|c| filter.search.as_deref().is_none_or(|term| c.matches(term)))
            .collect();

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(filter.page.offset() as usize)
            .take(filter.page.limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn update_client(
        &self,
        id: Uuid,
        fields: &ClientFields,
    ) -> Result<Option<Client>, AppError> {
        let mut tables = self.write()?;
        let Some(business_id) = tables
            .clients
            .iter()
            .find(|c| c.id == id && !c.archived)
            .map(|c| c.business_id)
        else {
            return Ok(None);
        };
        if tables.client_email_taken(business_id, fields.email.as_deref(), Some(id)) {
            return Err(AppError::conflict(CLIENT_EMAIL_TAKEN));
        }

        Ok(tables.clients.iter_mut().find(|c| c.id == id).map(|client| {
            client.name = fields.name.clone();
            client.email = fields.email.clone();
            client.phone = fields.phone.clone();
            client.address = fields.address.clone();
            client.document = fields.document.clone();
            client.document_type = fields.document_type.clone();
            client.notes = fields.notes.clone();
            client.updated_at = Utc::now();
            client.clone()
        }))
    }

    async fn archive_client(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        match tables.clients.iter_mut().find(|c| c.id == id && !c.archived) {
            Some(client) => {
                client.archived = true;
                client.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::common::pagination::PageRequest;
    use crate::models::auth::Role;

    fn new_business(name: &str, whatsapp: Option<&str>) -> NewBusiness {
        NewBusiness {
            name: name.into(),
            whatsapp: whatsapp.map(str::to_owned),
            ..Default::default()
        }
    }

    fn new_user(email: &str, business_id: Option<Uuid>) -> NewUser {
        NewUser {
            name: None,
            email: email.into(),
            password_hash: "hash".into(),
            role: Role::User,
            business_id,
        }
    }

    fn fields(name: &str, email: Option<&str>) -> ClientFields {
        ClientFields {
            name: name.into(),
            email: email.map(str::to_owned),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn whatsapp_is_unique_when_present() {
        let store = MemoryStore::new();
        store.create_business(&new_business("A", Some("+1")), None).await.unwrap();
        store.create_business(&new_business("B", None), None).await.unwrap();
        store.create_business(&new_business("C", None), None).await.unwrap();

        let err = store
            .create_business(&new_business("D", Some("+1")), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn select_exclusive_keeps_a_single_selected_row() {
        let store = MemoryStore::new();
        let a = store.create_business(&new_business("A", None), None).await.unwrap();
        let b = store.create_business(&new_business("B", None), None).await.unwrap();

        store.select_exclusive(a.id).await.unwrap().unwrap();
        let selected = store.select_exclusive(b.id).await.unwrap().unwrap();

        assert_eq!(selected.id, b.id);
        assert_eq!(store.count_selected().await.unwrap(), 1);
        let a = BusinessRepository::find_by_id(&store, a.id, Visibility::ActiveOnly)
            .await
            .unwrap()
            .unwrap();
        assert!(!a.is_selected);
    }

    #[tokio::test]
    async fn selecting_missing_or_archived_business_changes_nothing() {
        let store = MemoryStore::new();
        let a = store.create_business(&new_business("A", None), None).await.unwrap();
        let mut b = store.create_business(&new_business("B", None), None).await.unwrap();
        store.select_exclusive(a.id).await.unwrap();

        b.archived = true;
        store.update_business(&b).await.unwrap();

        assert!(store.select_exclusive(b.id).await.unwrap().is_none());
        assert!(store.select_exclusive(Uuid::new_v4()).await.unwrap().is_none());
        assert_eq!(store.find_selected().await.unwrap().map(|s| s.id), Some(a.id));
    }

    #[tokio::test]
    async fn update_never_changes_selection_flag() {
        let store = MemoryStore::new();
        let a = store.create_business(&new_business("A", None), None).await.unwrap();

        let mut forged = a.clone();
        forged.is_selected = true;
        let updated = store.update_business(&forged).await.unwrap().unwrap();

        assert!(!updated.is_selected);
        assert_eq!(store.count_selected().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_selections_never_leave_two_selected() {
        let store = Arc::new(MemoryStore::new());
        let mut ids = Vec::new();
        for i in 0..5 {
            let b = store
                .create_business(&new_business(&format!("N{i}"), None), None)
                .await
                .unwrap();
            ids.push(b.id);
        }

        let mut handles = Vec::new();
        for round in 0..50 {
            let store = Arc::clone(&store);
            let id = ids[round % ids.len()];
            handles.push(tokio::spawn(async move {
                store.select_exclusive(id).await.unwrap();
                store.count_selected().await.unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 1);
        }
        assert_eq!(store.count_selected().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_detaches_users_and_drops_clients() {
        let store = MemoryStore::new();
        let biz = store.create_business(&new_business("A", None), None).await.unwrap();
        let u1 = store.create_user(&new_user("a@x.com", Some(biz.id))).await.unwrap();
        let u2 = store.create_user(&new_user("b@x.com", Some(biz.id))).await.unwrap();
        store.create_client(biz.id, &fields("Cli", None)).await.unwrap();

        assert_eq!(store.delete_detaching_users(biz.id).await.unwrap(), Some(2));
        for id in [u1.id, u2.id] {
            let user = UserRepository::find_by_id(&store, id).await.unwrap().unwrap();
            assert_eq!(user.business_id, None);
        }
        let filter = ClientFilter {
            tenant: None,
            visibility: Visibility::IncludeArchived,
            search: None,
            page: PageRequest::default(),
        };
        assert_eq!(store.list_clients(&filter).await.unwrap().1, 0);
        assert_eq!(store.delete_detaching_users(biz.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn client_email_is_unique_per_tenant_among_active_rows() {
        let store = MemoryStore::new();
        let a = store.create_business(&new_business("A", None), None).await.unwrap();
        let b = store.create_business(&new_business("B", None), None).await.unwrap();

        let first = store.create_client(a.id, &fields("Ana", Some("ana@x.com"))).await.unwrap();
        assert!(matches!(
            store.create_client(a.id, &fields("Ana 2", Some("ana@x.com"))).await,
            Err(AppError::Conflict(_))
        ));
        store.create_client(b.id, &fields("Ana", Some("ana@x.com"))).await.unwrap();

        // Depois de arquivado, o e-mail volta a ficar livre no tenant.
        assert!(store.archive_client(first.id).await.unwrap());
        store.create_client(a.id, &fields("Ana 3", Some("ana@x.com"))).await.unwrap();
    }

    #[tokio::test]
    async fn archived_clients_are_kept_but_hidden_from_active_reads() {
        let store = MemoryStore::new();
        let a = store.create_business(&new_business("A", None), None).await.unwrap();
        let client = store.create_client(a.id, &fields("Ana", None)).await.unwrap();

        assert!(store.archive_client(client.id).await.unwrap());
        assert!(!store.archive_client(client.id).await.unwrap());

        assert!(store
            .find_client(client.id, None, Visibility::ActiveOnly)
            .await
            .unwrap()
            .is_none());
        let kept = store
            .find_client(client.id, None, Visibility::IncludeArchived)
            .await
            .unwrap()
            .unwrap();
        assert!(kept.archived);
    }

    #[tokio::test]
    async fn list_clients_paginates_newest_first() {
        let store = MemoryStore::new();
        let a = store.create_business(&new_business("A", None), None).await.unwrap();
        for i in 0..5 {
            store.create_client(a.id, &fields(&format!("C{i}"), None)).await.unwrap();
        }

        let filter = ClientFilter {
            tenant: Some(a.id),
            visibility: Visibility::ActiveOnly,
            search: None,
            page: PageRequest::new(Some(2), Some(2)),
        };
        let (page, total) = store.list_clients(&filter).await.unwrap();
        assert_eq!(total, 5);
        let names: Vec<_> = page.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["C2", "C1"]);
    }

    #[tokio::test]
    async fn create_owner_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.create_user(&new_user("dono@x.com", None)).await.unwrap();

        let result = store
            .create_owner(&new_business("Loja", None), &new_user("dono@x.com", None))
            .await;
        assert!(matches!(result, Err(AppError::EmailAlreadyExists)));
        assert!(store.list(Visibility::IncludeArchived).await.unwrap().is_empty());
    }
}

// src/services/access.rs
//
// Regras de autorização e escopo de tenant. Função pura: recebe a sessão e o
// alvo, devolve a decisão. Quem chama executa a operação no repositório.

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{Role, User},
};

/// Quem está agindo, extraído da sessão.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
    pub business_id: Option<Uuid>,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            business_id: user.business_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessAction {
    Read,
    List,
    Create,
    Update,
    Archive,
    Delete,
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAction {
    Read,
    List,
    Create,
    Update,
    Archive,
}

/// O que está sendo pedido.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// `business_id` é o negócio alvo (ausente em List/Create).
    Business {
        action: BusinessAction,
        business_id: Option<Uuid>,
    },
    /// `requested_business` é o `businessId` explícito do payload ou da query.
    Client {
        action: ClientAction,
        requested_business: Option<Uuid>,
    },
    /// Gestão de usuários de um negócio (criar membros, atribuir negócio).
    Membership,
}

impl Target {
    pub fn business(action: BusinessAction, business_id: Uuid) -> Self {
        Target::Business {
            action,
            business_id: Some(business_id),
        }
    }

    pub fn businesses(action: BusinessAction) -> Self {
        Target::Business {
            action,
            business_id: None,
        }
    }

    pub fn client(action: ClientAction, requested_business: Option<Uuid>) -> Self {
        Target::Client {
            action,
            requested_business,
        }
    }
}

/// Filtro de tenant a aplicar nas consultas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Unrestricted,
    Tenant(Uuid),
}

impl Scope {
    pub fn tenant(self) -> Option<Uuid> {
        match self {
            Scope::Unrestricted => None,
            Scope::Tenant(id) => Some(id),
        }
    }

    pub fn admits(self, business_id: Uuid) -> bool {
        match self {
            Scope::Unrestricted => true,
            Scope::Tenant(id) => id == business_id,
        }
    }
}

/// Garante que há sessão. É a primeira verificação de todas as regras.
pub fn authenticated(session: Option<&Actor>) -> Result<&Actor, AppError> {
    session.ok_or(AppError::Unauthenticated)
}

/// Decide se a sessão pode executar a ação e com qual escopo.
pub fn authorize(session: Option<&Actor>, target: Target) -> Result<Scope, AppError> {
    let actor = authenticated(session)?;

    match target {
        Target::Business { action, business_id } => authorize_business(actor, action, business_id),
        Target::Client { action, requested_business } => {
            authorize_client(actor, action, requested_business)
        }
        Target::Membership if actor.is_admin() => Ok(Scope::Unrestricted),
        Target::Membership => Err(AppError::forbidden(
            "Apenas usuários ADMIN podem gerenciar usuários.",
        )),
    }
}

fn authorize_business(
    actor: &Actor,
    action: BusinessAction,
    business_id: Option<Uuid>,
) -> Result<Scope, AppError> {
    if actor.is_admin() {
        return Ok(business_id.map_or(Scope::Unrestricted, Scope::Tenant));
    }

    match action {
        BusinessAction::List => Err(AppError::forbidden(
            "Apenas usuários ADMIN podem gerenciar vários negócios.",
        )),
        BusinessAction::Delete => Err(AppError::forbidden(
            "Apenas usuários ADMIN podem excluir negócios.",
        )),
        // Um USER sem negócio pode criar o seu primeiro; nunca um segundo.
        BusinessAction::Create => match actor.business_id {
            None => Ok(Scope::Unrestricted),
            Some(_) => Err(AppError::forbidden(
                "Usuários não ADMIN só podem ter um negócio associado.",
            )),
        },
        BusinessAction::Read
        | BusinessAction::Update
        | BusinessAction::Archive
        | BusinessAction::Select => match (actor.business_id, business_id) {
            (Some(own), Some(target)) if own == target => Ok(Scope::Tenant(own)),
            _ => Err(AppError::forbidden("Você não tem acesso a este negócio.")),
        },
    }
}

fn authorize_client(
    actor: &Actor,
    action: ClientAction,
    requested_business: Option<Uuid>,
) -> Result<Scope, AppError> {
    if actor.is_admin() {
        return match action {
            // Criar exige um tenant concreto: o pedido ou o do próprio ADMIN.
            ClientAction::Create => requested_business
                .or(actor.business_id)
                .map(Scope::Tenant)
                .ok_or_else(|| AppError::bad_request("Negócio não especificado.")),
            _ => Ok(requested_business.map_or(Scope::Unrestricted, Scope::Tenant)),
        };
    }

    let own = actor.business_id.ok_or(AppError::NoTenantAssigned)?;

    match requested_business {
        Some(requested) if requested != own => Err(AppError::forbidden(
            "Você não tem acesso aos clientes deste negócio.",
        )),
        _ => Ok(Scope::Tenant(own)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUSINESS_ACTIONS: [BusinessAction; 7] = [
        BusinessAction::Read,
        BusinessAction::List,
        BusinessAction::Create,
        BusinessAction::Update,
        BusinessAction::Archive,
        BusinessAction::Delete,
        BusinessAction::Select,
    ];

    const CLIENT_ACTIONS: [ClientAction; 5] = [
        ClientAction::Read,
        ClientAction::List,
        ClientAction::Create,
        ClientAction::Update,
        ClientAction::Archive,
    ];

    fn admin(business_id: Option<Uuid>) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
            business_id,
        }
    }

    fn user(business_id: Option<Uuid>) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            role: Role::User,
            business_id,
        }
    }

    #[test]
    fn missing_session_is_unauthenticated_for_every_target() {
        let id = Uuid::new_v4();
        for action in BUSINESS_ACTIONS {
            assert!(matches!(
                authorize(None, Target::business(action, id)),
                Err(AppError::Unauthenticated)
            ));
        }
        for action in CLIENT_ACTIONS {
            assert!(matches!(
                authorize(None, Target::client(action, None)),
                Err(AppError::Unauthenticated)
            ));
        }
        assert!(matches!(authorize(None, Target::Membership), Err(AppError::Unauthenticated)));
    }

    #[test]
    fn admin_is_allowed_on_every_business() {
        let actor = admin(None);
        for action in BUSINESS_ACTIONS {
            let target = Uuid::new_v4();
            assert_eq!(
                authorize(Some(&actor), Target::business(action, target)).unwrap(),
                Scope::Tenant(target)
            );
        }
        assert_eq!(
            authorize(Some(&actor), Target::businesses(BusinessAction::List)).unwrap(),
            Scope::Unrestricted
        );
    }

    #[test]
    fn user_is_forbidden_on_foreign_business_for_every_action() {
        let own = Uuid::new_v4();
        let other = Uuid::new_v4();
        let actor = user(Some(own));

        for action in BUSINESS_ACTIONS {
            assert!(
                matches!(
                    authorize(Some(&actor), Target::business(action, other)),
                    Err(AppError::Forbidden(_))
                ),
                "{action:?} deveria ser negado"
            );
        }
        for action in CLIENT_ACTIONS {
            assert!(matches!(
                authorize(Some(&actor), Target::client(action, Some(other))),
                Err(AppError::Forbidden(_))
            ));
        }
    }

    #[test]
    fn user_may_act_on_own_business_but_not_list_or_delete() {
        let own = Uuid::new_v4();
        let actor = user(Some(own));

        for action in [
            BusinessAction::Read,
            BusinessAction::Update,
            BusinessAction::Archive,
            BusinessAction::Select,
        ] {
            assert_eq!(
                authorize(Some(&actor), Target::business(action, own)).unwrap(),
                Scope::Tenant(own)
            );
        }
        assert!(authorize(Some(&actor), Target::business(BusinessAction::Delete, own)).is_err());
        assert!(authorize(Some(&actor), Target::businesses(BusinessAction::List)).is_err());
    }

    #[test]
    fn user_creates_only_a_first_business() {
        assert_eq!(
            authorize(Some(&user(None)), Target::businesses(BusinessAction::Create)).unwrap(),
            Scope::Unrestricted
        );
        assert!(matches!(
            authorize(
                Some(&user(Some(Uuid::new_v4()))),
                Target::businesses(BusinessAction::Create)
            ),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn user_without_tenant_gets_no_tenant_error_on_client_actions() {
        let actor = user(None);
        for action in CLIENT_ACTIONS {
            for requested in [None, Some(Uuid::new_v4())] {
                assert!(matches!(
                    authorize(Some(&actor), Target::client(action, requested)),
                    Err(AppError::NoTenantAssigned)
                ));
            }
        }
    }

    #[test]
    fn user_client_scope_is_always_own_tenant() {
        let own = Uuid::new_v4();
        let actor = user(Some(own));
        for action in CLIENT_ACTIONS {
            assert_eq!(
                authorize(Some(&actor), Target::client(action, None)).unwrap(),
                Scope::Tenant(own)
            );
            assert_eq!(
                authorize(Some(&actor), Target::client(action, Some(own))).unwrap(),
                Scope::Tenant(own)
            );
        }
    }

    #[test]
    fn admin_client_scope_follows_explicit_filter() {
        let own = Uuid::new_v4();
        let requested = Uuid::new_v4();
        let actor = admin(Some(own));

        assert_eq!(
            authorize(Some(&actor), Target::client(ClientAction::List, None)).unwrap(),
            Scope::Unrestricted
        );
        assert_eq!(
            authorize(Some(&actor), Target::client(ClientAction::List, Some(requested))).unwrap(),
            Scope::Tenant(requested)
        );
        assert_eq!(
            authorize(Some(&actor), Target::client(ClientAction::Create, None)).unwrap(),
            Scope::Tenant(own)
        );
        assert_eq!(
            authorize(Some(&actor), Target::client(ClientAction::Create, Some(requested))).unwrap(),
            Scope::Tenant(requested)
        );
    }

    #[test]
    fn admin_without_business_must_name_tenant_on_client_create() {
        let actor = admin(None);
        assert!(matches!(
            authorize(Some(&actor), Target::client(ClientAction::Create, None)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn membership_is_admin_only() {
        assert!(authorize(Some(&admin(None)), Target::Membership).is_ok());
        assert!(matches!(
            authorize(Some(&user(Some(Uuid::new_v4()))), Target::Membership),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn scope_admits_only_its_tenant() {
        let id = Uuid::new_v4();
        assert!(Scope::Unrestricted.admits(id));
        assert!(Scope::Tenant(id).admits(id));
        assert!(!Scope::Tenant(id).admits(Uuid::new_v4()));
        assert_eq!(Scope::Tenant(id).tenant(), Some(id));
    }
}

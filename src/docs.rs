// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::common;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::users::get_me,
        handlers::users::update_me,
        handlers::users::create_member,
        handlers::users::assign_business,

        // --- Business ---
        handlers::business::list_businesses,
        handlers::business::create_business,
        handlers::business::update_own_business,
        handlers::business::delete_business,
        handlers::business::get_own_business,
        handlers::business::get_business,
        handlers::business::update_business,
        handlers::business::get_selected_business,
        handlers::business::select_business,

        // --- Clients ---
        handlers::clients::list_clients,
        handlers::clients::create_client,
        handlers::clients::get_client,
        handlers::clients::update_client,
        handlers::clients::archive_client,
    ),
    components(
        schemas(
            common::pagination::Pagination,

            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::UpdateProfilePayload,
            models::auth::CreateMemberPayload,
            models::auth::AssignBusinessPayload,
            models::auth::AuthResponse,

            // --- Business ---
            models::business::Business,
            models::business::CreateBusinessPayload,
            models::business::UpdateBusinessPayload,
            models::business::BusinessIdPayload,
            models::business::BusinessList,
            models::business::OwnBusiness,
            models::business::DeletedBusiness,
            models::business::SelectedBusiness,

            // --- Clients ---
            models::client::Client,
            models::client::ClientPayload,
            models::client::ClientPage,
            models::client::ArchivedClient,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Membros"),
        (name = "Business", description = "Gestão de Negócios e Negócio Selecionado"),
        (name = "Clients", description = "Clientes do Negócio")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_and_the_bearer_scheme() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/register",
            "/api/business/select",
            "/api/business/{id}",
            "/api/clients/{id}",
            "/api/users/{id}/business",
        ] {
            assert!(doc.paths.paths.contains_key(path), "faltando {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}

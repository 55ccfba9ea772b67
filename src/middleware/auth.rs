// src/middleware/auth.rs

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    extract::cookie::CookieJar,
    headers::{authorization::Bearer, Authorization, HeaderMapExt},
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::User,
    services::access::Actor,
};

pub const SESSION_COOKIE: &str = "session_token";

/// Token da requisição: `Authorization: Bearer` tem precedência sobre o cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

// Resolve a sessão de toda requisição. Não rejeita nada: rotas públicas seguem
// funcionando e as protegidas decidem via `access::authorize`.
pub async fn session_resolver(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let mut session = Session::default();

    if let Some(token) = session_token(request.headers()) {
        match app_state.auth_service.validate_token(&token).await {
            Ok(user) => {
                session.actor = Some(Actor::from(&user));
                session.user = Some(user);
            }
            Err(AppError::Unauthenticated) => {
                tracing::debug!("Token de sessão inválido ou expirado ignorado");
            }
            // Falha de banco, por exemplo, não deve virar "sem sessão"
            Err(e) => return Err(e),
        }
    }

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

// Guarda das rotas protegidas. Roda antes dos extratores do handler, então um
// pedido sem sessão recebe 401 mesmo com corpo ausente ou inválido.
pub async fn require_session(request: Request, next: Next) -> Result<Response, AppError> {
    let signed_in = request
        .extensions()
        .get::<Session>()
        .is_some_and(|session| session.actor().is_some());
    if !signed_in {
        return Err(AppError::Unauthenticated);
    }
    Ok(next.run(request).await)
}

// Extrator com a sessão resolvida (possivelmente vazia)
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<User>,
    actor: Option<Actor>,
}

impl Session {
    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    pub fn user(&self) -> Result<&User, AppError> {
        self.user.as_ref().ok_or(AppError::Unauthenticated)
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Session>().cloned().unwrap_or_default())
    }
}

pub mod access;
pub mod auth;
pub mod business_service;
pub mod client_service;
pub mod selection_service;
pub mod user_service;

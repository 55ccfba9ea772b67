pub mod auth;
pub mod business;
pub mod clients;
pub mod users;

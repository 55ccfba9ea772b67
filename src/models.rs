pub mod auth;
pub mod business;
pub mod client;
pub mod status;

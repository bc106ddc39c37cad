// Accounts and roles. Only the email, display name and role are kept.

pub mod handlers;
pub mod models;
pub mod repository;

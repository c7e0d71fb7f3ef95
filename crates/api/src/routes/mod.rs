pub mod admin_users;
pub mod auth;
pub mod chat;
pub mod clients;
pub mod dashboard;
pub mod files;
pub mod followers;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod statuses;

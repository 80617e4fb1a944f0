pub mod activity;
pub mod auth;
pub mod files;
pub mod groups;
pub mod health;

pub mod account;
pub mod auth;
pub mod dashboard;
pub mod emails;
pub mod index;
pub mod posts;
pub mod profile;

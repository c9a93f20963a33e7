pub mod admin;
pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod models;
pub mod search;
pub mod session;
pub mod validation;

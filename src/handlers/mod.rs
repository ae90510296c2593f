pub mod auth;
pub mod catalog;
pub mod common;
pub mod settings;
pub mod uploads;

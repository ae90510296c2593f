pub mod catalog;
pub mod settings;
pub mod uploads;

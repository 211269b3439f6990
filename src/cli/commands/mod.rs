pub mod admin;
pub mod auth;
pub mod open;
pub mod uploads;

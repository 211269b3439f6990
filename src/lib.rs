pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod routing;
pub mod session;
pub mod upload;
pub mod validation;
pub mod views;

pub use error::{ClientError, ClientResult};

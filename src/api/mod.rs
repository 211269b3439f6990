pub mod client;
pub mod credentials;

pub use client::ApiClient;
pub use credentials::{Credential, CredentialStore};

//! Secret handling for provider API keys.

mod credentials;

pub use credentials::{ProviderCredentials, SecretString};

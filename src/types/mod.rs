//! Public types for the Bifrost API.

mod provider;
mod request;

pub use provider::{Credential, ProviderConfig, ProviderKind};
pub use request::{AttemptRecord, GenerateRequest, MAX_TEMPERATURE};

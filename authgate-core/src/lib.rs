//! Session and authorization core for HTTP services.
//!
//! The crate issues paired access/refresh tokens, keeps their cross-reference
//! records in a key-value store, gates requests on a bearer token and drives
//! the OAuth 2.0 login handshake against third-party identity providers.
//!
//! The building blocks, leaf first:
//! - [`store::TokenStore`] and [`codec::TokenCodec`]: collaborator contracts
//! - [`session::SessionManager`]: token issuance, refresh and revocation
//! - [`gate::Gate`]: per-request authorization decision
//! - [`oauth::OAuthFlow`]: redirect, callback and identity resolution

pub mod claims;
pub mod codec;
pub mod error;
pub mod gate;
pub mod oauth;
pub mod policy;
pub mod session;
pub mod store;
#[cfg(test)]
pub(crate) mod test_utils;

pub use claims::{Claims, SubjectId};
pub use codec::{CodecError, JwtCodec, TokenCodec};
pub use error::AuthError;
pub use gate::{bearer_token, Authorized, Gate};
pub use oauth::{OAuthFlow, Provider, ProviderRegistry, UserInfo, UserResolver};
pub use policy::{PolicyDecider, PolicyError};
pub use session::{SessionManager, TokenPair, TokenSettings};
pub use store::{StoreError, StoreItem, TokenStore};

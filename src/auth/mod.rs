//! # Auth Module
//!
//! Session handling on top of an external identity provider:
//! - ID token verification through the identity provider, memoized in a
//!   token cache until each token's expiry
//! - Role claim repair (admin promotion, default `user` role)
//! - `AuthedUser` / `AdminUser` extractors and the role gate

pub mod cache;
pub mod extractors;
pub mod firebase;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod roles;
pub mod routes;
pub mod session;

#[cfg(test)]
mod tests;

pub use cache::TokenCache;
pub use extractors::{AdminUser, AuthedUser};
pub use firebase::{FirebaseIdentityProvider, ServiceAccountKey};
pub use identity::{IdentityError, IdentityProvider};
pub use models::{Role, User};
pub use roles::{authorize, ensure_owner_or_admin};
pub use routes::auth_routes;
pub use session::SessionResolver;

pub mod authorizer;
pub mod bearer;
pub mod claims;
pub mod error;
pub mod factory;
pub mod jwks;
pub mod key_set;

#[cfg(test)]
pub(crate) mod test_keys;

pub use authorizer::{AuthPolicy, Authorizer};
pub use claims::ClaimSet;
pub use error::{AuthError, AuthErrorKind};
pub use factory::build_authorizer;

/*!
 * Request extractors
 *
 * - AuthClaims: verified token claims placed by the permission middleware
 */
mod auth_claims;

pub use auth_claims::AuthClaims;

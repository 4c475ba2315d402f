/*
 * Responsibility
 * - Public interface of the middleware layer
 *   - http: request id / trace / limits / timeout
 *   - cors: browser origin policy
 *   - auth: per-route permission guard
 */
pub mod auth;
pub mod cors;
pub mod http;

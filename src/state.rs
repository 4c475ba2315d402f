/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 *   - db pool, authorizer
 * - Cheap to Clone (Arc / pool handles inside)
 */
use std::sync::Arc;

use crate::services::auth::Authorizer;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub auth: Arc<Authorizer>,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, auth: Arc<Authorizer>) -> Self {
        Self { db, auth }
    }
}

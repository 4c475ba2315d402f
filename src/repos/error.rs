/*
 * Responsibility
 * - What a repo failure means to the layers above
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error("conflict")]
    Conflict,
}

impl RepoError {
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(dbe) = &e
            && dbe.is_unique_violation()
        {
            return RepoError::Conflict;
        }
        RepoError::Db(e)
    }
}

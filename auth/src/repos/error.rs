use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("refresh token store unavailable: {0}")]
    Unavailable(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

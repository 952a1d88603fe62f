use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("AuthError - MissingSecret: auth.jwt_secret is not set")]
    MissingSecret,
    #[error("AuthError - MissingToken")]
    MissingToken,
    #[error("AuthError - Jwt: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("AuthError - InvalidSubject: {0}")]
    InvalidSubject(String),
    #[error("AuthError - PasswordHash: {0}")]
    PasswordHash(String),
    #[error("AuthError - Join: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::PasswordHash(err.to_string())
    }
}

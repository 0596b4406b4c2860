pub mod access_jwt;
pub mod factory;

pub use access_jwt::{JwtVerifier, TokenVerifier, VerifyError};
pub use factory::build_verifier;

pub mod access_token_issuer;
pub mod jwt;
pub mod refresh_token_issuer;
pub mod token_service;

pub use access_token_issuer::AccessTokenService;
pub use jwt::JwtIssuer;
pub use refresh_token_issuer::RefreshTokenService;
pub use token_service::TokenService;

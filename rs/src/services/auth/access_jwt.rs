use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use session_core::Claims;

/// Outcome of a failed access-token verification.
///
/// The guard maps these onto `RejectionKind`; keeping a separate type lets a verifier
/// report *why* without knowing about HTTP.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// Signature and claims are valid but `exp` is in the past.
    #[error("access token expired")]
    Expired,
    /// Bad signature, malformed payload, wrong issuer, ...
    #[error("access token rejected: {0}")]
    Invalid(String),
    /// The verifier itself failed (key material, crypto provider).
    #[error("access token verifier failure: {0}")]
    Internal(String),
}

/// Verifies an access token and returns its claims.
///
/// Implementations must be pure: no I/O side effects beyond the check itself.
pub trait TokenVerifier: Send + Sync + std::fmt::Debug {
    fn verify(&self, token: &str) -> Result<Claims, VerifyError>;
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            // jsonwebtoken checks exp only after the signature, so an expired token with a
            // bad signature lands in `Invalid`.
            ErrorKind::ExpiredSignature => Self::Expired,
            // Key material or crypto backend trouble: nothing the caller's token did.
            ErrorKind::InvalidKeyFormat
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidEddsaKey
            | ErrorKind::RsaFailedSigning
            | ErrorKind::Signing(_)
            | ErrorKind::Provider(_) => Self::Internal(e.to_string()),
            _ => Self::Invalid(e.to_string()),
        }
    }
}

/// HS256 access-token verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("JwtVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtVerifier {
    pub fn new(secret: &str, issuer: Option<&str>, leeway_seconds: u64) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        validation.leeway = leeway_seconds;

        Self {
            decoding_key,
            validation,
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        if claims.sub.trim().is_empty() {
            return Err(VerifyError::Invalid("empty 'sub' claim".to_string()));
        }

        Ok(claims)
    }
}

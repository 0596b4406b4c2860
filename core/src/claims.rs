use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Access-token claims.
///
/// `iat`/`exp` are seconds since the unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    #[error("token is not a three-part compact JWS")]
    Structure,
    #[error("payload is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("payload is not a claims object: {0}")]
    Payload(#[from] serde_json::Error),
}

impl Claims {
    /// Decode the payload segment WITHOUT checking the signature.
    ///
    /// Only for display and routing on the client (e.g. reading the subject id).
    /// Trust comes from the server-side verifier, never from this.
    pub fn decode_unverified(token: &str) -> Result<Self, ClaimsError> {
        let mut parts = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ClaimsError::Structure);
        };

        let bytes = URL_SAFE_NO_PAD.decode(payload)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(json: &str) -> String {
        URL_SAFE_NO_PAD.encode(json)
    }

    #[test]
    fn decodes_payload_without_signature_check() {
        let token = format!(
            "{}.{}.not-a-real-signature",
            segment(r#"{"alg":"HS256","typ":"JWT"}"#),
            segment(r#"{"sub":"user-42","iat":100,"exp":700,"jti":"j-1"}"#),
        );

        let claims = Claims::decode_unverified(&token).unwrap();
        assert_eq!(claims.sub, "user-42");
        assert_eq!(claims.iat, 100);
        assert_eq!(claims.exp, 700);
        assert_eq!(claims.iss, None);
        assert_eq!(claims.jti.as_deref(), Some("j-1"));
        assert!(!claims.is_expired_at(700));
        assert!(claims.is_expired_at(701));
    }

    #[test]
    fn rejects_wrong_shapes() {
        assert!(matches!(
            Claims::decode_unverified("only.two"),
            Err(ClaimsError::Structure)
        ));
        assert!(matches!(
            Claims::decode_unverified("a.b.c.d"),
            Err(ClaimsError::Structure)
        ));
        assert!(matches!(
            Claims::decode_unverified("a.!!!.c"),
            Err(ClaimsError::Encoding(_))
        ));

        let token = format!("h.{}.s", segment(r#"{"sub":"x"}"#));
        assert!(matches!(
            Claims::decode_unverified(&token),
            Err(ClaimsError::Payload(_))
        ));
    }
}

use std::fmt;

/// Outcome of a failed credential check.
///
/// Produced once by the guard, consumed once by the client. Each kind has exactly one
/// wire status and body message:
///
/// | kind            | status | message                  |
/// |-----------------|--------|--------------------------|
/// | `Missing`       | 401    | `Token not provided`     |
/// | `Malformed`     | 401    | `Invalid token format`   |
/// | `Expired`       | 401    | `Token expired`          |
/// | `Invalid`       | 403    | `Invalid token`          |
/// | `InternalError` | 500    | `Authentication error`   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionKind {
    Missing,
    Malformed,
    Expired,
    Invalid,
    InternalError,
}

impl RejectionKind {
    pub const ALL: [RejectionKind; 5] = [
        Self::Missing,
        Self::Malformed,
        Self::Expired,
        Self::Invalid,
        Self::InternalError,
    ];

    pub fn status(self) -> u16 {
        match self {
            Self::Missing | Self::Malformed | Self::Expired => 401,
            Self::Invalid => 403,
            Self::InternalError => 500,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Missing => "Token not provided",
            Self::Malformed => "Invalid token format",
            Self::Expired => "Token expired",
            Self::Invalid => "Invalid token",
            Self::InternalError => "Authentication error",
        }
    }

    /// Machine-readable code for the JSON error envelope.
    pub fn code(self) -> &'static str {
        match self {
            Self::Missing => "TOKEN_MISSING",
            Self::Malformed => "TOKEN_MALFORMED",
            Self::Expired => "TOKEN_EXPIRED",
            Self::Invalid => "TOKEN_INVALID",
            Self::InternalError => "AUTHENTICATION_ERROR",
        }
    }

    /// RFC 6750 `WWW-Authenticate` value. `InternalError` carries no challenge.
    pub fn challenge(self) -> Option<&'static str> {
        match self {
            Self::Missing => Some(r#"Bearer error="invalid_request", error_description="Token not provided""#),
            Self::Malformed => Some(r#"Bearer error="invalid_request", error_description="Invalid token format""#),
            Self::Expired => Some(r#"Bearer error="invalid_token", error_description="Token expired""#),
            Self::Invalid => Some(r#"Bearer error="invalid_token", error_description="Invalid token""#),
            Self::InternalError => None,
        }
    }

    /// True for the kinds a client may answer with a refresh (401 and 403).
    pub fn is_auth_rejection(self) -> bool {
        is_auth_status(self.status())
    }

    /// Recover the kind from a response status and its `WWW-Authenticate` value.
    ///
    /// 401 responses are disambiguated by `error_description`; a 401 from something other
    /// than the guard (no recognizable challenge) yields `None`.
    pub fn from_wire(status: u16, challenge: Option<&str>) -> Option<Self> {
        match status {
            403 => Some(Self::Invalid),
            500 => Some(Self::InternalError),
            401 => {
                let description = challenge.and_then(error_description)?;
                [Self::Missing, Self::Malformed, Self::Expired]
                    .into_iter()
                    .find(|kind| kind.message() == description)
            }
            _ => None,
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Statuses the client treats as authentication rejections.
pub fn is_auth_status(status: u16) -> bool {
    matches!(status, 401 | 403)
}

fn error_description(challenge: &str) -> Option<&str> {
    const KEY: &str = "error_description=\"";
    let start = challenge.find(KEY)? + KEY.len();
    let rest = &challenge[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

//! Shared session model used on both sides of the credential boundary.
//!
//! - `wire`: header/cookie/route names and the bearer prefix rule
//! - `rejection`: the closed `RejectionKind` taxonomy and its status/message mapping
//! - `claims`: access-token claims and unverified structural decoding

pub mod claims;
pub mod rejection;
pub mod wire;

pub use claims::{Claims, ClaimsError};
pub use rejection::RejectionKind;
pub use wire::TokenGrant;

//! Client half of the session pipeline.
//!
//! Every call goes through [`SessionClient::send`]: the current access token is attached on
//! the way out, and an authentication rejection on the way back triggers at most one refresh
//! followed by one replay of the same request.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod refresh;
pub mod register;
pub mod request;
pub mod storage;

pub use client::SessionClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{AuthRejection, RefreshError, SessionError};
pub use events::{EndReason, SessionEvent};
pub use refresh::{RefreshMode, RefreshTrigger};
pub use register::{CredentialRegister, Snapshot};
pub use request::{Attempt, SessionRequest};
pub use storage::{FileStorage, MemoryStorage, StorageError, TokenStorage};

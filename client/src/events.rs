/// Session lifecycle notifications, fanned out over a `tokio::sync::broadcast` channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A token was stored by `login` or `establish`.
    Established,
    /// A refresh replaced the stored token.
    Refreshed,
    /// The stored token is gone; the UI should return to its login entry point.
    Ended(EndReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    RefreshFailed,
    LoggedOut,
}

pub(crate) const EVENT_CAPACITY: usize = 32;

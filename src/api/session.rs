//! Purpose: Hold the mutable per-login state for one registrar endpoint.
//! Exports: `Session`.
//! Role: Explicit, exclusively owned session handle passed to the client.
//! Invariants: The token changes only through `update_from` or `clear`,
//! never as a hidden side effect of a request.

use crate::core::reply::ReplyHead;

#[derive(Clone, Debug, Default)]
pub struct Session {
    token: Option<String>,
    balance: Option<String>,
    server_version: Option<String>,
}

impl Session {
    /// Fresh, unauthenticated session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a session from a previously stored token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            balance: None,
            server_version: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Last account balance the endpoint reported, verbatim.
    pub fn balance(&self) -> Option<&str> {
        self.balance.as_deref()
    }

    pub fn server_version(&self) -> Option<&str> {
        self.server_version.as_deref()
    }

    /// Absorb head fields from a successful reply. The token is replaced
    /// only when the head carries one; balance and version follow suit.
    pub fn update_from(&mut self, head: &ReplyHead) {
        if let Some(token) = &head.session_id {
            self.token = Some(token.clone());
        }
        if let Some(balance) = &head.account_balance {
            self.balance = Some(balance.clone());
        }
        if let Some(version) = &head.version {
            self.server_version = Some(version.clone());
        }
    }

    pub fn clear(&mut self) {
        self.token = None;
        self.balance = None;
        self.server_version = None;
    }
}

//! Mock session: an in-memory authenticated flag with no credential
//! check and no persistence. The core pipeline only ever reads it to
//! gate the analyze operation; mutation belongs to the login/logout
//! commands alone.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct Session {
    authenticated: AtomicBool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    /// Mark the session authenticated. Mock — accepts unconditionally.
    pub fn login(&self) {
        self.authenticated.store(true, Ordering::SeqCst);
        tracing::info!("Session authenticated");
    }

    pub fn logout(&self) {
        self.authenticated.store(false, Ordering::SeqCst);
        tracing::info!("Session ended");
    }
}

//! Explicit dependencies shared by the repository and services.
//!
//! # Invariants
//! - The core never reads account identity or storage handles from ambient
//!   state; everything arrives through `CoreContext`.
//! - Cloning a context shares the same adapters.

use crate::clock::{Clock, SystemClock};
use crate::config::CoreConfig;
use crate::store::local::LocalStore;
use crate::store::remote::RemoteStore;
use std::rc::Rc;

/// Account identity, adapters, clock and tunables for one signed-in session.
#[derive(Clone)]
pub struct CoreContext {
    pub account_id: String,
    pub local: Rc<dyn LocalStore>,
    pub remote: Rc<dyn RemoteStore>,
    pub clock: Rc<dyn Clock>,
    pub config: CoreConfig,
}

impl CoreContext {
    /// Context using wall-clock time and default config.
    pub fn new(
        account_id: impl Into<String>,
        local: Rc<dyn LocalStore>,
        remote: Rc<dyn RemoteStore>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            local,
            remote,
            clock: Rc::new(SystemClock),
            config: CoreConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: CoreConfig) -> Self {
        self.config = config;
        self
    }
}

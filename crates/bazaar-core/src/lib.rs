//! # bazaar-core
//!
//! The marketplace store: the authoritative in-memory collections (users,
//! assets, tags, messages, channel chat, support tickets) and the transition
//! functions that mutate them. All state is volatile and resets on process
//! restart.
//!
//! The [`Marketplace`] facade is constructed once by the top-level
//! application process and passed by reference to every consumer; there are
//! no ambient singletons. Presentation layers call the operations here and
//! re-render from the returned state; they never mutate entities directly.

pub mod auth;
pub mod capability;
pub mod catalog;
pub mod messaging;
pub mod otp;
pub mod social;
pub mod support;

mod error;

pub use error::{MarketError, Result};

use std::collections::HashMap;

use uuid::Uuid;

use bazaar_db::Database;
use bazaar_types::models::{Asset, SupportTicket, Tag, User};

use crate::otp::{IssuedOtp, OtpPurpose};

/// The marketplace store. Single-threaded, single-session: every transition
/// runs to completion before the next user action is processed.
pub struct Marketplace {
    db: Database,
    /// The currently-authenticated user, if any.
    session: Option<Uuid>,
    /// One outstanding verification code per flow; reissuing replaces it.
    otps: HashMap<OtpPurpose, IssuedOtp>,
}

impl Marketplace {
    /// Open a fresh store with only the seeded owner account and default
    /// tags in it.
    pub fn open() -> Result<Self> {
        Ok(Self::with_database(Database::open_in_memory()?))
    }

    pub fn with_database(db: Database) -> Self {
        Self {
            db,
            session: None,
            otps: HashMap::new(),
        }
    }

    pub fn session_user(&self) -> Option<Uuid> {
        self.session
    }

    pub fn current_user(&self) -> Result<Option<User>> {
        match self.session {
            Some(id) => Ok(self.db.get_user(id)?),
            None => Ok(None),
        }
    }

    // -- Read queries exposed to the presentation layer --

    pub fn user(&self, id: Uuid) -> Result<User> {
        self.require_user(id)
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.db.get_user_by_username(username)?)
    }

    pub fn users(&self) -> Result<Vec<User>> {
        Ok(self.db.list_users()?)
    }

    pub fn asset(&self, id: Uuid) -> Result<Asset> {
        self.require_asset(id)
    }

    pub fn tags(&self) -> Result<Vec<Tag>> {
        Ok(self.db.list_tags()?)
    }

    // -- Internal lookups --

    pub(crate) fn require_user(&self, id: Uuid) -> Result<User> {
        self.db.get_user(id)?.ok_or(MarketError::NotFound("user"))
    }

    pub(crate) fn require_asset(&self, id: Uuid) -> Result<Asset> {
        self.db.get_asset(id)?.ok_or(MarketError::NotFound("asset"))
    }

    pub(crate) fn require_ticket(&self, id: Uuid) -> Result<SupportTicket> {
        self.db.get_ticket(id)?.ok_or(MarketError::NotFound("ticket"))
    }
}

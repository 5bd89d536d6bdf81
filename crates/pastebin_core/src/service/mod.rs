//! Domain services built on the shared database handle and clock.
//!
//! Services hold no entity state between calls; every operation reads and
//! writes through [`Database`].

/// Admin operations.
pub mod admin;
/// API key issuance and validation.
pub mod api_key;
/// Registration, login and sessions.
pub mod auth;
/// Paste lifecycle with dedup and access control.
pub mod paste;

use crate::{clock::Clock, db::Database};
use std::sync::Arc;

pub use admin::AdminService;
pub use api_key::ApiKeyService;
pub use auth::AuthService;
pub use paste::PasteService;

/// Bundle of every service over one database and clock.
#[derive(Clone)]
pub struct Services {
    pub pastes: PasteService,
    pub auth: AuthService,
    pub api_keys: ApiKeyService,
    pub admin: AdminService,
}

impl Services {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self {
            pastes: PasteService::new(db.clone(), clock.clone()),
            auth: AuthService::new(db.clone(), clock.clone()),
            api_keys: ApiKeyService::new(db.clone(), clock.clone()),
            admin: AdminService::new(db, clock),
        }
    }
}

#[cfg(test)]
mod tests;

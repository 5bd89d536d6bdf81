//! Service-level tests over a temp database and a manual clock.

use crate::clock::Clock;
use crate::error::AppError;
use crate::models::paste::{NewPaste, PasteUpdate};
use crate::models::user::{ApiKeyId, UserDeletion, UserId};
use crate::test_support::Harness;
use chrono::Duration;

mod paste;

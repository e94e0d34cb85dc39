//! `walkin` - A walk-in check-in kiosk for an IT help desk
//!
//! Visitors enter their details and join a first-come, first-served queue.
//! Staff unlock an admin view with a PIN to resolve entries, export the day's
//! check-ins to CSV, and clear data. Everything is stored on the device.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod admin;
pub mod cli;
pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod export;
pub mod form;
pub mod kiosk;
pub mod logging;
pub mod storage;
pub mod store;
pub mod view;

pub use admin::AdminGate;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use entry::{EmplId, Entry, NewEntry, Purpose, Role};
pub use error::{Error, Result};
pub use export::CsvExport;
pub use form::{CheckInForm, FormErrors};
pub use kiosk::KioskSession;
pub use logging::init_logging;
pub use storage::{MemoryStorage, Repository, Storage};
pub use store::{Store, StoreStats};

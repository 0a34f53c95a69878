//! `requesttracker` - Track request records in a flat JSON file
//!
//! This library provides the record model, an owned in-memory store that
//! persists after every change, the JSON persistence layer, and query
//! filtering over the stored records.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod query;
pub mod record;
pub mod storage;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use query::{filter, Criteria, FilteredView};
pub use record::{RequestRecord, RequestStatus};
pub use storage::{load_all, save_all, JsonFile, OnLoadError, SaveOptions};
pub use store::{RecordStore, StoreStats};

#![allow(clippy::missing_errors_doc)]

mod error;
mod registry;
mod store;
mod validate;

pub use error::{ErrorCode, InputError};
pub use registry::{Registry, UpsertOutcome, WorkdirEntry};
pub use store::{ConfigStore, MAX_BACKUPS, StoreError, StorePaths};
pub use validate::{PathContext, validate_path, validate_path_in, validate_version};

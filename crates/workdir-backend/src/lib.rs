mod detection;
mod error;
mod manager;
mod types;

pub use detection::{ManagerDetection, detect_manager, detect_managers, recommend_manager};
pub use error::BackendError;
pub use manager::{
    NVM_SCRIPT_LOCATIONS, Verb, Verbs, VersionManager, ensure_supported, supported_managers,
};
pub use types::{ShellDialect, ShellType};

mod paths;
mod probe;

pub use paths::{AppPaths, AppPathsError, CONFIG_DIR_ENV};
pub use probe::{
    CommandProbe, DEFAULT_PROBE_TIMEOUT, HideWindow, ProbeError, ProbeOutput, SystemProbe,
};

use std::path::PathBuf;

use treetally_core::config::TreetallyConfig;

use crate::Services;

/// A validated config together with where it was loaded from.
#[derive(Debug, Clone)]
pub struct ReadyConfig {
    pub path: PathBuf,
    pub config: TreetallyConfig,
}

impl ReadyConfig {
    pub fn services(&self) -> Services {
        Services::from_config(&self.config, &self.path)
    }
}

use std::sync::Arc;

use log::Logger;

use crate::gateway::Gateway;

#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub gateway: Arc<Gateway>,
    pub config: Config,
}

impl Environment {
    pub fn new(logger: Arc<Logger>, gateway: Arc<Gateway>, config: Config) -> Self {
        Self {
            logger,
            gateway,
            config,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub(crate) max_content_length: u64,
}

impl Config {
    pub fn new(max_content_length: u64) -> Self {
        Self { max_content_length }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(64 * 1024)
    }
}

use std::time::Duration;

use crate::configuration::Configuration;

pub struct Context {
    pub config: Configuration,
}

impl Context {
    pub fn from_cli(cli: &crate::cli::Cli) -> Self {
        let cfg = Configuration {
            data_dir: cli.data_dir.clone(),
            database: cli.database.clone(),
            busy_timeout: Duration::from_millis(cli.busy_timeout_ms),
            api_listen: cli.api_listen,
            log_file: cli.log_file.clone(),
            reset: cli.reset,
        };
        Self { config: cfg }
    }
}

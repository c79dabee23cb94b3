use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Clone, Debug)]
pub struct Configuration {
    pub data_dir: String,
    pub database: String,
    pub busy_timeout: Duration,
    pub api_listen: SocketAddr,
    pub log_file: Option<String>,
    pub reset: bool,
}

impl Configuration {
    /// Location of the SQLite file. An absolute `database` ignores `data_dir`.
    pub fn database_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.database)
    }
}

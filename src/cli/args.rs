use clap::Parser;
use std::env;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Serve a product catalog over HTTP",
    long_about = "Product catalog REST service backed by SQLite. Categories and products are \
                  stored in a single database file under the data directory."
)]
pub struct Cli {
    #[arg(
        long,
        default_value_t = false,
        help = "Reset all persisted state (delete the SQLite database) before starting"
    )]
    pub reset: bool,

    #[arg(
        long,
        env = "CATALOG_DATA_DIR",
        default_value = ".catalog/",
        value_name = "DIR",
        help = "Directory to store persistent data"
    )]
    pub data_dir: String,

    #[arg(
        long,
        env = "CATALOG_DATABASE",
        default_value = "catalog.sqlite",
        value_name = "FILE",
        help = "SQLite database file name, relative to the data directory"
    )]
    pub database: String,

    #[arg(
        long = "busy-timeout-ms",
        default_value_t = 500u64,
        value_name = "MS",
        help = "How long a connection waits on a locked database before failing"
    )]
    pub busy_timeout_ms: u64,

    #[arg(
        long = "log-file",
        env = "CATALOG_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,

    #[arg(
        long = "api-listen",
        env = "CATALOG_API_LISTEN",
        value_name = "ADDR",
        default_value = "127.0.0.1:8080",
        help = "REST API listen address (host:port)"
    )]
    pub api_listen: std::net::SocketAddr,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    dotenvy::from_filename(&dotenv_path).ok();

    log::debug!("Loaded env from {}", dotenv_path);
    Cli::parse()
}

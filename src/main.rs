use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use plain_http::{Server, ServerConfig, ServerError, site};

/// Minimal HTTP/1.1 server: one request per connection, fixed worker pool.
#[derive(Debug, Parser)]
#[command(name = "plain-http", version)]
struct Cli {
    /// JSON config file; flags and environment variables override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, env = "PLAIN_HTTP_HOST")]
    host: Option<String>,

    #[arg(short, long, env = "PLAIN_HTTP_PORT")]
    port: Option<u16>,

    /// Size of the connection worker pool
    #[arg(short, long, env = "PLAIN_HTTP_WORKERS")]
    workers: Option<usize>,

    /// Bytes read for the request line and headers
    #[arg(long, env = "PLAIN_HTTP_REQUEST_LIMIT")]
    request_limit: Option<usize>,

    #[arg(long, env = "PLAIN_HTTP_PUBLIC_DIR")]
    public_dir: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<ServerConfig, ServerError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_json_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(request_limit) = self.request_limit {
            config.request_limit = request_limit;
        }
        if let Some(public_dir) = self.public_dir {
            config.public_dir = public_dir;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(cause = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ServerError> {
    let config = cli.into_config()?;
    info!(
        workers = config.workers,
        request_limit = config.request_limit,
        public_dir = %config.public_dir.display(),
        "starting server"
    );

    let router = site::router(
        &config.public_dir,
        &config.static_paths,
        &config.host,
        config.port,
    );
    let server = Server::bind(&config, router)?;
    server.listen()
}

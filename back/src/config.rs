use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;

/// Todo tracking HTTP service.
#[derive(Clone, Debug, Parser)]
#[command(version, about)]
pub struct Config {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Snapshot file the todos are loaded from and saved to.
    #[arg(long, env = "DATA_FILE", default_value = "data.ron")]
    pub data_file: PathBuf,

    /// Seconds between snapshots.
    #[arg(long, env = "SNAPSHOT_INTERVAL", default_value_t = 300)]
    pub snapshot_interval: u64,

    /// PEM certificate. TLS is enabled when both this and `--ssl-key` are set.
    #[arg(long, env = "SSL_CERT", requires = "ssl_key")]
    pub ssl_cert: Option<PathBuf>,

    /// PEM private key.
    #[arg(long, env = "SSL_KEY", requires = "ssl_cert")]
    pub ssl_key: Option<PathBuf>,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0; 4], self.port))
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval.max(1))
    }

    pub fn tls(&self) -> Option<(&PathBuf, &PathBuf)> {
        self.ssl_cert.as_ref().zip(self.ssl_key.as_ref())
    }
}

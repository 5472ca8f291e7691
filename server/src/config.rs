use std::time::Duration;

use clap::Parser;

/// Reference record store for taskflow clients.
#[derive(Parser, Debug, Clone)]
#[command(name = "taskflow-server", about = "In-memory taskflow record store")]
pub struct Args {
    /// Address to listen on.
    #[arg(long, env = "TASKFLOW_BIND", default_value = "127.0.0.1:3000")]
    pub bind: String,

    /// Artificial delay added to every request, in milliseconds.
    #[arg(long, env = "TASKFLOW_LATENCY_MS", default_value_t = 0)]
    pub latency_ms: u64,

    /// Start with empty collections.
    #[arg(long)]
    pub no_seed: bool,
}

impl Args {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

//! `portico wait-port` — block until the HTTP port accepts connections.

use anyhow::{Context, Result};
use clap::Args;

use portico_core::Settings;
use portico_supervisor::{block_on, wait_for_port};

#[derive(Args, Debug)]
pub struct WaitPortArgs {
    /// Host to connect to.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
}

impl WaitPortArgs {
    pub fn run(self, settings: &Settings) -> Result<()> {
        block_on(wait_for_port(&self.host, settings.http_port, settings.port_wait))?
            .with_context(|| format!("{}:{} never became reachable", self.host, settings.http_port))?;
        println!("✓ {}:{} is accepting connections", self.host, settings.http_port);
        Ok(())
    }
}

//! `portico get <domain|email>…` — one-off certificate request.

use anyhow::{Context, Result};
use clap::Args;

use portico_core::Settings;
use portico_supervisor::{certbot, SystemRunner};

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Domains to certify; arguments containing `@` are passed as the account email.
    #[arg(required = true, value_name = "DOMAIN|EMAIL")]
    pub targets: Vec<String>,
}

impl GetArgs {
    pub fn run(self, settings: &Settings) -> Result<()> {
        certbot::get(&SystemRunner, settings, &self.targets)
            .context("certificate request failed")?;
        println!("✓ certificate requested for {}", self.targets.join(", "));
        Ok(())
    }
}

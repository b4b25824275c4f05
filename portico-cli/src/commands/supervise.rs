//! Default mode — run nginx in the foreground and keep it configured.

use anyhow::{Context, Result};

use portico_core::Settings;
use portico_supervisor::{block_on, supervise};

use super::load_collection;

pub fn run(settings: Settings) -> Result<()> {
    let collection = load_collection(&settings)?;
    block_on(supervise(settings, collection))?.context("supervised nginx failed")
}

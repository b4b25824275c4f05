//! `portico diff` — show unified diffs for what `build` would write.

use anyhow::{Context, Result};
use clap::Args;

use portico_core::{Selector, Settings};
use portico_renderer::{TemplateEngine, TemplateKind};
use portico_sync::{diff_managed, diff_single_file, ManagedDir};

use super::load_collection;

#[derive(Args, Debug)]
pub struct DiffArgs {}

impl DiffArgs {
    pub fn run(self, settings: &Settings) -> Result<()> {
        let collection = load_collection(settings)?;
        let engine = TemplateEngine::new(settings).context("failed to load templates")?;

        let mut diffs = Vec::new();
        for (kind, dir) in [
            (TemplateKind::Https, settings.vhosts_dir()),
            (TemplateKind::Stream, settings.stream_vhosts_dir()),
        ] {
            let target = ManagedDir::vhosts(&dir);
            diffs.extend(
                diff_managed(&engine, kind, &target, &collection, kind.selector())
                    .with_context(|| format!("diff failed for {}", dir.display()))?,
            );
        }
        let script = settings.cert_script();
        diffs.extend(
            diff_single_file(
                &engine,
                TemplateKind::CertScript,
                &script,
                &collection,
                Selector::All,
            )
            .with_context(|| format!("diff failed for {}", script.display()))?,
        );

        if diffs.is_empty() {
            println!("No differences.");
            return Ok(());
        }

        for diff in diffs {
            println!("# {}", diff.path.display());
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }
        Ok(())
    }
}

//! `portico list` — show the loaded endpoint definitions.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use portico_core::{EndpointCollection, EndpointRecord, Protocol, Settings};

use super::load_collection;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    pub fn run(self, settings: &Settings) -> Result<()> {
        let collection = load_collection(settings)?;
        if self.json {
            let entries: Vec<EndpointJson> = collection.iter().map(EndpointJson::from).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&entries).context("failed to serialize endpoints")?
            );
            return Ok(());
        }
        print_table(settings, &collection);
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EndpointJson {
    id: String,
    source: String,
    protocol: String,
    domain: String,
    aliases: Vec<String>,
    url: String,
    port: u16,
    admin: String,
    key_auth: bool,
    clients: Vec<String>,
}

impl From<&EndpointRecord> for EndpointJson {
    fn from(record: &EndpointRecord) -> Self {
        let def = &record.definition;
        Self {
            id: record.id.to_string(),
            source: record.source_path.display().to_string(),
            protocol: def.protocol.to_string(),
            domain: def.domain.clone(),
            aliases: def.aliases.clone(),
            url: def.url.clone(),
            port: def.port,
            admin: def.admin.clone(),
            key_auth: def.key_auth,
            clients: def.clients.iter().map(|c| c.common_name.clone()).collect(),
        }
    }
}

#[derive(Tabled)]
struct EndpointRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "protocol")]
    protocol: String,
    #[tabled(rename = "domain")]
    domain: String,
    #[tabled(rename = "aliases")]
    aliases: String,
    #[tabled(rename = "port")]
    port: u16,
    #[tabled(rename = "key auth")]
    key_auth: String,
    #[tabled(rename = "clients")]
    clients: String,
}

fn print_table(settings: &Settings, collection: &EndpointCollection) {
    let https = collection
        .iter()
        .filter(|r| r.definition.protocol == Protocol::Https)
        .count();
    println!(
        "{} | {} endpoints | {} https | {} tls",
        settings.backends_dir.display().to_string().bold(),
        collection.len(),
        https,
        collection.len() - https,
    );

    if collection.is_empty() {
        println!("{}", "No endpoint definitions found.".yellow());
        return;
    }

    let rows: Vec<EndpointRow> = collection
        .iter()
        .map(|record| {
            let def = &record.definition;
            EndpointRow {
                id: record.id.to_string(),
                protocol: def.protocol.to_string(),
                domain: def.domain.clone(),
                aliases: def.aliases.join(", "),
                port: def.port,
                key_auth: if def.key_auth { "yes" } else { "no" }.to_string(),
                clients: def
                    .clients
                    .iter()
                    .map(|c| c.common_name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

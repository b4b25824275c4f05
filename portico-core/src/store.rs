//! Loads a backends directory into an [`EndpointCollection`].
//!
//! # Load contract
//!
//! 1. Enumerate regular files with a recognised extension (`.json`, `.yaml`, `.yml`),
//!    in filename order.
//! 2. Parse each file on its own.
//! 3. Apply defaults in order: version → protocol → admin → port → keyAuth.
//! 4. Validate required fields and enumerated values.
//!
//! The first invalid file aborts the whole load; callers never see a partial
//! collection.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{io_err, StoreError, ValidationError};
use crate::types::{
    ClientDefinition, EndpointCollection, EndpointDefinition, EndpointId, EndpointRecord,
    Protocol,
};

pub const SUPPORTED_VERSION: &str = "1.0";
pub const DEFAULT_PORT: u16 = 443;

// ---------------------------------------------------------------------------
// Raw (pre-default) shape
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawDefinition {
    #[serde(alias = "Version")]
    version: Option<String>,
    #[serde(alias = "Domain")]
    domain: Option<String>,
    #[serde(alias = "URL", alias = "Url")]
    url: Option<String>,
    #[serde(alias = "Protocol")]
    protocol: Option<String>,
    #[serde(alias = "Aliases")]
    aliases: Option<Vec<String>>,
    #[serde(alias = "Admin")]
    admin: Option<String>,
    #[serde(alias = "Port")]
    port: Option<u16>,
    #[serde(alias = "Clients")]
    clients: Option<Vec<RawClient>>,
    #[serde(alias = "KeyAuth")]
    key_auth: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawClient {
    #[serde(alias = "CommonName")]
    common_name: Option<String>,
}

/// On-disk encoding of a definition file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Json,
    Yaml,
}

impl DefinitionFormat {
    /// Format implied by a path's extension, or `None` if the file is not a definition.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(DefinitionFormat::Json),
            Some("yaml") | Some("yml") => Some(DefinitionFormat::Yaml),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load every definition in `dir`.
///
/// Returns `StoreError::Io` if the directory or a file cannot be read and
/// `StoreError::Validation` (with the offending path) for the first bad file.
pub fn load(dir: &Path) -> Result<EndpointCollection, StoreError> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .map(|entry| entry.map(|e| e.path()).map_err(|e| io_err(dir, e)))
        .collect::<Result<_, _>>()?;
    entries.sort();

    let mut records: BTreeMap<EndpointId, EndpointRecord> = BTreeMap::new();
    for path in entries {
        let Some(format) = DefinitionFormat::from_path(&path) else {
            continue;
        };
        // Follows symlinks so mounted config maps load like plain files.
        let meta = std::fs::metadata(&path).map_err(|e| io_err(&path, e))?;
        if !meta.is_file() {
            continue;
        }
        let Some(id) = endpoint_id(&path) else {
            continue;
        };
        if id.as_str().chars().any(char::is_control) {
            return Err(ValidationError::new(&path, "file name contains control characters").into());
        }

        if let Some(existing) = records.get(&id) {
            return Err(ValidationError::new(
                &path,
                format!(
                    "duplicate endpoint id '{id}' (also defined by {})",
                    existing.source_path.display()
                ),
            )
            .into());
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let definition = parse_definition(&path, &contents, format)?;
        tracing::debug!(id = %id, path = %path.display(), "loaded endpoint definition");
        records.insert(
            id.clone(),
            EndpointRecord {
                id,
                source_path: path,
                definition,
            },
        );
    }

    tracing::info!(
        dir = %dir.display(),
        endpoints = records.len(),
        "loaded endpoint definitions"
    );
    Ok(EndpointCollection::from_records(records))
}

/// Parse, default, and validate one definition. `path` is used for error context only.
pub fn parse_definition(
    path: &Path,
    contents: &str,
    format: DefinitionFormat,
) -> Result<EndpointDefinition, ValidationError> {
    let raw: RawDefinition = match format {
        DefinitionFormat::Json => {
            serde_json::from_str(contents).map_err(|e| ValidationError::new(path, e.to_string()))?
        }
        DefinitionFormat::Yaml => {
            serde_yaml::from_str(contents).map_err(|e| ValidationError::new(path, e.to_string()))?
        }
    };
    apply_defaults(path, raw)
}

fn endpoint_id(path: &Path) -> Option<EndpointId> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(EndpointId::from)
}

// ---------------------------------------------------------------------------
// Defaults + validation
// ---------------------------------------------------------------------------

fn apply_defaults(path: &Path, raw: RawDefinition) -> Result<EndpointDefinition, ValidationError> {
    let domain = non_empty(raw.domain);
    let url = non_empty(raw.url);

    let version = non_empty(raw.version).unwrap_or_else(|| SUPPORTED_VERSION.to_string());
    let protocol = non_empty(raw.protocol).unwrap_or_else(|| "https".to_string());
    let admin = non_empty(raw.admin)
        .unwrap_or_else(|| format!("admin@{}", domain.as_deref().unwrap_or_default()));
    let port = match raw.port {
        None | Some(0) => DEFAULT_PORT,
        Some(port) => port,
    };
    let raw_clients = raw.clients.unwrap_or_default();
    let key_auth = raw.key_auth.unwrap_or(false) || !raw_clients.is_empty();

    let domain = domain.ok_or_else(|| ValidationError::new(path, "domain is a required field"))?;
    let url = url.ok_or_else(|| ValidationError::new(path, "url is a required field"))?;

    let mut clients = Vec::with_capacity(raw_clients.len());
    for (index, client) in raw_clients.into_iter().enumerate() {
        let common_name = non_empty(client.common_name).ok_or_else(|| {
            ValidationError::new(
                path,
                format!("clients[{index}].commonName is a required field"),
            )
        })?;
        clients.push(ClientDefinition { common_name });
    }

    if version != SUPPORTED_VERSION {
        return Err(ValidationError::new(
            path,
            format!("unsupported version '{version}'"),
        ));
    }
    let protocol = protocol
        .parse::<Protocol>()
        .map_err(|reason: String| ValidationError::new(path, reason))?;

    Ok(EndpointDefinition {
        version,
        domain,
        url,
        protocol,
        aliases: raw.aliases.unwrap_or_default(),
        admin,
        port,
        clients,
        key_auth,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

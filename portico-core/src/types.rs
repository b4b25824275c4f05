//! Domain types for endpoint definitions.
//!
//! An [`EndpointDefinition`] is the fully defaulted, validated form of one
//! definition file. Raw parsing and defaulting live in [`crate::store`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Reconciliation key of an endpoint: the definition filename without extension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EndpointId(pub String);

impl EndpointId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for EndpointId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EndpointId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How the proxy fronts an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// HTTP virtual host with TLS termination.
    #[default]
    Https,
    /// Stream (TCP) virtual host with TLS termination.
    Tls,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Https => "https",
            Protocol::Tls => "tls",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "https" => Ok(Protocol::Https),
            "tls" => Ok(Protocol::Tls),
            other => Err(format!("unsupported protocol '{other}'")),
        }
    }
}

/// Which records a rendering pass applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// Every record.
    All,
    /// Records whose protocol equals the given variant.
    Protocol(Protocol),
}

impl Selector {
    pub fn matches(&self, definition: &EndpointDefinition) -> bool {
        match self {
            Selector::All => true,
            Selector::Protocol(protocol) => definition.protocol == *protocol,
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A client certificate allowed to reach a key-authenticated endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDefinition {
    pub common_name: String,
}

/// One proxied domain, after defaults have been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDefinition {
    pub version: String,
    pub domain: String,
    pub url: String,
    pub protocol: Protocol,
    pub aliases: Vec<String>,
    pub admin: String,
    pub port: u16,
    pub clients: Vec<ClientDefinition>,
    pub key_auth: bool,
}

impl EndpointDefinition {
    /// The primary domain followed by every alias.
    pub fn server_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.domain.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// A validated definition plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRecord {
    pub id: EndpointId,
    pub source_path: PathBuf,
    pub definition: EndpointDefinition,
}

/// Immutable snapshot of every endpoint loaded in one invocation, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointCollection {
    records: BTreeMap<EndpointId, EndpointRecord>,
}

impl EndpointCollection {
    pub(crate) fn from_records(records: BTreeMap<EndpointId, EndpointRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &EndpointId) -> Option<&EndpointRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &EndpointId) -> bool {
        self.records.contains_key(id)
    }

    /// All records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &EndpointRecord> {
        self.records.values()
    }

    /// Records accepted by `selector`, in id order.
    pub fn select(&self, selector: Selector) -> impl Iterator<Item = &EndpointRecord> {
        self.records
            .values()
            .filter(move |record| selector.matches(&record.definition))
    }
}

impl FromIterator<EndpointRecord> for EndpointCollection {
    fn from_iter<I: IntoIterator<Item = EndpointRecord>>(iter: I) -> Self {
        Self {
            records: iter
                .into_iter()
                .map(|record| (record.id.clone(), record))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(domain: &str, protocol: Protocol) -> EndpointDefinition {
        EndpointDefinition {
            version: "1.0".to_string(),
            domain: domain.to_string(),
            url: "http://backend".to_string(),
            protocol,
            aliases: vec![format!("www.{domain}")],
            admin: format!("admin@{domain}"),
            port: 443,
            clients: vec![],
            key_auth: false,
        }
    }

    fn record(id: &str, protocol: Protocol) -> EndpointRecord {
        EndpointRecord {
            id: EndpointId::from(id),
            source_path: PathBuf::from(format!("/backends/{id}.json")),
            definition: definition(&format!("{id}.example"), protocol),
        }
    }

    #[test]
    fn protocol_parse_and_display() {
        assert_eq!("https".parse::<Protocol>(), Ok(Protocol::Https));
        assert_eq!("tls".parse::<Protocol>(), Ok(Protocol::Tls));
        assert!("http".parse::<Protocol>().is_err());
        assert_eq!(Protocol::Tls.to_string(), "tls");
    }

    #[test]
    fn collection_iterates_in_id_order() {
        let collection: EndpointCollection = vec![
            record("zeta", Protocol::Https),
            record("alpha", Protocol::Tls),
            record("mid", Protocol::Https),
        ]
        .into_iter()
        .collect();
        let ids: Vec<_> = collection.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn selector_filters_by_protocol() {
        let collection: EndpointCollection =
            vec![record("a", Protocol::Https), record("b", Protocol::Tls)]
                .into_iter()
                .collect();
        let https: Vec<_> = collection
            .select(Selector::Protocol(Protocol::Https))
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(https, vec!["a"]);
        assert_eq!(collection.select(Selector::All).count(), 2);
    }

    #[test]
    fn server_names_lead_with_domain() {
        let def = definition("a.com", Protocol::Https);
        let names: Vec<_> = def.server_names().collect();
        assert_eq!(names, vec!["a.com", "www.a.com"]);
    }
}

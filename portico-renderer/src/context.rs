//! Serializable rendering payload built from one [`EndpointRecord`].

use serde::{Deserialize, Serialize};

use portico_core::{EndpointRecord, Settings};

use crate::error::RenderError;

/// Everything a template can reference for one endpoint.
///
/// Definition fields are exposed flat (`domain`, `url`, `port`, …); derived
/// values live under `tls` and `acme`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateContext {
    pub id: String,
    pub source_path: String,
    pub version: String,
    pub domain: String,
    pub url: String,
    pub protocol: String,
    pub aliases: Vec<String>,
    pub admin: String,
    pub port: u16,
    pub clients: Vec<ClientCtx>,
    pub key_auth: bool,
    /// `domain` followed by every alias.
    pub server_names: Vec<String>,
    pub tls: TlsCtx,
    pub acme: AcmeCtx,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCtx {
    pub common_name: String,
}

/// Certificate locations for the vhost templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsCtx {
    pub certificate: String,
    pub certificate_key: String,
    /// CA bundle used to verify client certificates when `key_auth` is set.
    pub client_ca: String,
}

/// Inputs for the certificate script stanza.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcmeCtx {
    pub certbot: String,
    pub webroot: String,
    pub cert_name: String,
}

impl TemplateContext {
    pub fn from_record(record: &EndpointRecord, settings: &Settings) -> Self {
        let def = &record.definition;
        let live = settings.live_dir(&def.domain);

        TemplateContext {
            id: record.id.0.clone(),
            source_path: record.source_path.display().to_string(),
            version: def.version.clone(),
            domain: def.domain.clone(),
            url: def.url.clone(),
            protocol: def.protocol.to_string(),
            aliases: def.aliases.clone(),
            admin: def.admin.clone(),
            port: def.port,
            clients: def
                .clients
                .iter()
                .map(|c| ClientCtx {
                    common_name: c.common_name.clone(),
                })
                .collect(),
            key_auth: def.key_auth,
            server_names: def.server_names().map(str::to_owned).collect(),
            tls: TlsCtx {
                certificate: live.join("fullchain.pem").display().to_string(),
                certificate_key: live.join("privkey.pem").display().to_string(),
                client_ca: settings
                    .certbot_root
                    .join("clients")
                    .join("ca.pem")
                    .display()
                    .to_string(),
            },
            acme: AcmeCtx {
                certbot: settings.programs.certbot.display().to_string(),
                webroot: settings.webroot.display().to_string(),
                cert_name: def.domain.clone(),
            },
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

//! Tera rendering engine — [`TemplateKind`] enum and [`TemplateEngine`].
//!
//! # Templates
//!
//! | Kind       | Template name      | Output                                   |
//! |------------|--------------------|------------------------------------------|
//! | Https      | `https.conf.tera`  | `<nginx>/conf.d/derived_<id>.conf`        |
//! | Stream     | `stream.conf.tera` | `<nginx>/stream-conf.d/derived_<id>.conf` |
//! | CertScript | `cert.sh.tera`     | one stanza of `<certbot>/cert.sh`         |

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::Tera;

use portico_core::{EndpointCollection, EndpointId, EndpointRecord, Protocol, Selector, Settings};

use crate::context::TemplateContext;
use crate::error::RenderError;
use crate::filters;

// ---------------------------------------------------------------------------
// Embedded templates
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    ("https.conf.tera", include_str!("templates/https.conf.tera")),
    ("stream.conf.tera", include_str!("templates/stream.conf.tera")),
    ("cert.sh.tera", include_str!("templates/cert.sh.tera")),
];

/// Written once at the top of the certificate script, before any stanza.
pub const CERT_SCRIPT_PREAMBLE: &str =
    "#!/bin/sh\n# Managed by portico; regenerated on every rebuild.\nset -e\n\n";

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RenderError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn load_override_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        tracing::warn!(dir = %dir.display(), "template override directory does not exist");
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    let mut templates = Vec::new();
    for path in files {
        if path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        tracing::debug!(template = %name, path = %path.display(), "template override loaded");
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(override_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert((*name).to_string(), (*content).to_string());
    }
    if let Some(dir) = override_dir {
        for (name, content) in load_override_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    tera.register_filter("nginx_escape", filters::nginx_escape);
    tera.register_filter("regex_escape", filters::regex_escape);
    tera.register_filter("shell_quote", filters::shell_quote);
    tera.add_raw_templates(templates.into_iter().collect::<Vec<_>>())?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// TemplateKind
// ---------------------------------------------------------------------------

/// The three artifacts generated from endpoint definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Https,
    Stream,
    CertScript,
}

impl TemplateKind {
    /// All kinds in a stable order.
    pub fn all() -> &'static [TemplateKind] {
        &[TemplateKind::Https, TemplateKind::Stream, TemplateKind::CertScript]
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            TemplateKind::Https => "https.conf.tera",
            TemplateKind::Stream => "stream.conf.tera",
            TemplateKind::CertScript => "cert.sh.tera",
        }
    }

    /// Records this kind is rendered for.
    pub fn selector(&self) -> Selector {
        match self {
            TemplateKind::Https => Selector::Protocol(Protocol::Https),
            TemplateKind::Stream => Selector::Protocol(Protocol::Tls),
            TemplateKind::CertScript => Selector::All,
        }
    }
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine for the embedded templates plus optional overrides.
///
/// Create once per invocation with [`TemplateEngine::new`] and reuse.
pub struct TemplateEngine {
    tera: Tera,
    settings: Settings,
}

impl TemplateEngine {
    /// Load embedded templates plus any overrides found in `settings.template_dir`.
    pub fn new(settings: &Settings) -> Result<Self, RenderError> {
        let tera = build_tera(settings.template_dir.as_deref())?;
        Ok(TemplateEngine {
            tera,
            settings: settings.clone(),
        })
    }

    /// Render one record with the template for `kind`.
    pub fn render(&self, kind: TemplateKind, record: &EndpointRecord) -> Result<String, RenderError> {
        let ctx = TemplateContext::from_record(record, &self.settings);
        let tera_ctx = ctx.to_tera_context()?;
        let rendered = self.tera.render(kind.template_name(), &tera_ctx)?;
        Ok(rendered.replace("\r\n", "\n"))
    }

    /// Render every record accepted by `selector`, one entry per record, in id order.
    pub fn render_selected(
        &self,
        kind: TemplateKind,
        collection: &EndpointCollection,
        selector: Selector,
    ) -> Result<Vec<(EndpointId, String)>, RenderError> {
        collection
            .select(selector)
            .map(|record| -> Result<_, RenderError> {
                Ok((record.id.clone(), self.render(kind, record)?))
            })
            .collect()
    }

    /// Render every selected record into one text, in id order.
    ///
    /// The certificate script additionally gets [`CERT_SCRIPT_PREAMBLE`].
    pub fn render_concatenated(
        &self,
        kind: TemplateKind,
        collection: &EndpointCollection,
        selector: Selector,
    ) -> Result<String, RenderError> {
        let mut out = String::new();
        if kind == TemplateKind::CertScript {
            out.push_str(CERT_SCRIPT_PREAMBLE);
        }
        for (_, stanza) in self.render_selected(kind, collection, selector)? {
            out.push_str(&stanza);
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::{ClientDefinition, EndpointDefinition};

    fn record(id: &str, protocol: Protocol) -> EndpointRecord {
        let domain = format!("{id}.example");
        EndpointRecord {
            id: EndpointId::from(id),
            source_path: PathBuf::from(format!("/backends/{id}.json")),
            definition: EndpointDefinition {
                version: "1.0".to_string(),
                domain: domain.clone(),
                url: "http://backend:8080".to_string(),
                protocol,
                aliases: vec![],
                admin: format!("admin@{domain}"),
                port: 443,
                clients: vec![],
                key_auth: false,
            },
        }
    }

    fn engine() -> TemplateEngine {
        TemplateEngine::new(&Settings::default()).expect("engine")
    }

    #[test]
    fn engine_new_succeeds() {
        engine();
    }

    #[test]
    fn every_kind_renders() {
        let engine = engine();
        let rec = record("shop", Protocol::Https);
        for kind in TemplateKind::all() {
            let out = engine
                .render(*kind, &rec)
                .unwrap_or_else(|e| panic!("render failed for {kind:?}: {e}"));
            assert!(out.contains("shop.example"), "{kind:?} output lacks domain");
        }
    }

    #[test]
    fn selectors_match_template_kinds() {
        assert_eq!(
            TemplateKind::Https.selector(),
            Selector::Protocol(Protocol::Https)
        );
        assert_eq!(TemplateKind::Stream.selector(), Selector::Protocol(Protocol::Tls));
        assert_eq!(TemplateKind::CertScript.selector(), Selector::All);
    }

    #[test]
    fn https_vhost_lists_every_server_name() {
        let mut rec = record("shop", Protocol::Https);
        rec.definition.aliases = vec!["www.shop.example".to_string()];
        let out = engine().render(TemplateKind::Https, &rec).unwrap();
        assert!(out.contains(r#"server_name "shop.example" "www.shop.example";"#));
        assert!(out.contains(r#"proxy_pass "http://backend:8080";"#));
        assert!(!out.contains("ssl_verify_client"));
    }

    #[test]
    fn key_auth_enables_client_verification() {
        let mut rec = record("vault", Protocol::Https);
        rec.definition.key_auth = true;
        rec.definition.clients = vec![
            ClientDefinition { common_name: "ops".to_string() },
            ClientDefinition { common_name: "ci.bot".to_string() },
        ];
        let out = engine().render(TemplateKind::Https, &rec).unwrap();
        assert!(out.contains("ssl_verify_client on;"));
        assert!(out.contains(r#"CN=(ops|ci\\.bot)"#), "got:\n{out}");
        assert!(out.contains("return 403;"));
    }

    #[test]
    fn stream_vhost_has_no_http_directives() {
        let rec = record("db", Protocol::Tls);
        let out = engine().render(TemplateKind::Stream, &rec).unwrap();
        assert!(out.contains("listen 443 ssl;"));
        assert!(!out.contains("location"));
    }

    #[test]
    fn injected_quote_stays_inside_the_string() {
        let mut rec = record("evil", Protocol::Https);
        rec.definition.aliases = vec![r#"x.com"; include /etc/passwd; #"#.to_string()];
        let out = engine().render(TemplateKind::Https, &rec).unwrap();
        assert!(out.contains(r#""x.com\"; include /etc/passwd; #""#), "got:\n{out}");
    }

    #[test]
    fn newline_in_domain_fails_the_render() {
        let mut rec = record("evil", Protocol::Https);
        rec.definition.domain = "a.com;\n    listen 8080".to_string();
        assert!(engine().render(TemplateKind::Https, &rec).is_err());
    }

    #[test]
    fn cert_script_quotes_shell_words() {
        let mut rec = record("shop", Protocol::Https);
        rec.definition.aliases = vec!["$(touch pwned)".to_string()];
        let out = engine().render(TemplateKind::CertScript, &rec).unwrap();
        assert!(out.contains("-d 'shop.example'"));
        assert!(out.contains("-d '$(touch pwned)'"));
        assert!(out.contains("--email 'admin@shop.example'"));
        assert!(out.contains("-w '/webroot'"));
    }

    #[test]
    fn concatenated_output_is_ordered_by_id() {
        let collection: EndpointCollection = vec![
            record("zulu", Protocol::Https),
            record("alpha", Protocol::Tls),
        ]
        .into_iter()
        .collect();
        let out = engine()
            .render_concatenated(TemplateKind::CertScript, &collection, Selector::All)
            .unwrap();
        assert!(out.starts_with(CERT_SCRIPT_PREAMBLE));
        let alpha = out.find("alpha.example").expect("alpha stanza");
        let zulu = out.find("zulu.example").expect("zulu stanza");
        assert!(alpha < zulu);
    }

    #[test]
    fn override_directory_replaces_embedded_template() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("https.conf.tera"),
            "# custom {{ domain | nginx_escape }}\n",
        )
        .unwrap();
        let mut settings = Settings::default();
        settings.template_dir = Some(dir.path().to_path_buf());
        let engine = TemplateEngine::new(&settings).unwrap();
        let out = engine
            .render(TemplateKind::Https, &record("shop", Protocol::Https))
            .unwrap();
        assert_eq!(out, "# custom shop.example\n");
    }

    #[test]
    fn no_crlf_in_any_rendered_output() {
        let engine = engine();
        let rec = record("lineend", Protocol::Https);
        for kind in TemplateKind::all() {
            let out = engine.render(*kind, &rec).unwrap();
            assert!(!out.contains('\r'), "{kind:?} output contains CR");
        }
    }
}

//! Explicit runtime configuration.
//!
//! [`Settings`] is built once at process entry and handed to every component.
//! Nothing below the binary reads the environment.
//!
//! # Derived layout
//!
//! ```text
//! <nginx_root>/
//!   conf.d/               (HTTPS vhosts — derived_<id>.conf)
//!   stream-conf.d/        (stream/TLS vhosts — derived_<id>.conf)
//! <certbot_root>/
//!   cert.sh               (certificate issuance script, mode 0755)
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_NGINX_ROOT: &str = "/etc/nginx";
pub const DEFAULT_CERTBOT_ROOT: &str = "/etc/letsencrypt";
pub const DEFAULT_BACKENDS_DIR: &str = "/backends";
pub const DEFAULT_WEBROOT: &str = "/webroot";

/// Prefix reserved for generated files; anything else in an output directory is left alone.
pub const MANAGED_PREFIX: &str = "derived_";
pub const VHOST_EXTENSION: &str = ".conf";

pub const DEFAULT_HTTP_PORT: u16 = 80;
pub const DEFAULT_PORT_ATTEMPTS: u32 = 10;
pub const DEFAULT_PORT_INTERVAL: Duration = Duration::from_millis(250);
pub const DEFAULT_RENEW_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Fixed-interval polling budget for readiness waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortWaitPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PortWaitPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_PORT_ATTEMPTS,
            interval: DEFAULT_PORT_INTERVAL,
        }
    }
}

/// External programs the supervisor drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Programs {
    pub nginx: PathBuf,
    pub certbot: PathBuf,
    pub shell: PathBuf,
}

impl Default for Programs {
    fn default() -> Self {
        Self {
            nginx: PathBuf::from("nginx"),
            certbot: PathBuf::from("certbot"),
            shell: PathBuf::from("sh"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub nginx_root: PathBuf,
    pub certbot_root: PathBuf,
    pub backends_dir: PathBuf,
    /// ACME webroot served by the bootstrap proxy configuration.
    pub webroot: PathBuf,
    /// Optional directory whose `.tera` files override the embedded templates.
    pub template_dir: Option<PathBuf>,
    pub http_port: u16,
    pub port_wait: PortWaitPolicy,
    pub renew_interval: Duration,
    pub programs: Programs,
}

impl Settings {
    /// Settings rooted at the three configurable directories, everything else defaulted.
    pub fn new(
        nginx_root: impl Into<PathBuf>,
        certbot_root: impl Into<PathBuf>,
        backends_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            nginx_root: nginx_root.into(),
            certbot_root: certbot_root.into(),
            backends_dir: backends_dir.into(),
            webroot: PathBuf::from(DEFAULT_WEBROOT),
            template_dir: None,
            http_port: DEFAULT_HTTP_PORT,
            port_wait: PortWaitPolicy::default(),
            renew_interval: DEFAULT_RENEW_INTERVAL,
            programs: Programs::default(),
        }
    }

    /// `<nginx_root>/conf.d`
    pub fn vhosts_dir(&self) -> PathBuf {
        self.nginx_root.join("conf.d")
    }

    /// `<nginx_root>/stream-conf.d`
    pub fn stream_vhosts_dir(&self) -> PathBuf {
        self.nginx_root.join("stream-conf.d")
    }

    /// `<certbot_root>/cert.sh`
    pub fn cert_script(&self) -> PathBuf {
        self.certbot_root.join("cert.sh")
    }

    /// `<certbot_root>/live/<domain>`, where certbot places issued certificates.
    pub fn live_dir(&self, domain: &str) -> PathBuf {
        self.certbot_root.join("live").join(domain)
    }

    pub fn backends_dir(&self) -> &Path {
        &self.backends_dir
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(DEFAULT_NGINX_ROOT, DEFAULT_CERTBOT_ROOT, DEFAULT_BACKENDS_DIR)
    }
}

//! Global flags, resolved once into [`Settings`].

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use portico_core::settings::{
    DEFAULT_BACKENDS_DIR, DEFAULT_CERTBOT_ROOT, DEFAULT_HTTP_PORT, DEFAULT_NGINX_ROOT,
    DEFAULT_PORT_ATTEMPTS, DEFAULT_WEBROOT,
};
use portico_core::{PortWaitPolicy, Programs, Settings};

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// nginx configuration root [default: /etc/nginx]
    #[arg(long, env = "NGINX", global = true, value_name = "DIR")]
    pub nginx: Option<PathBuf>,

    /// certbot root holding live certificates and cert.sh [default: /etc/letsencrypt]
    #[arg(long, env = "CERTBOT", global = true, value_name = "DIR")]
    pub certbot: Option<PathBuf>,

    /// Directory of endpoint definitions [default: /backends]
    #[arg(long, env = "BACKENDS", global = true, value_name = "DIR")]
    pub backends: Option<PathBuf>,

    /// ACME webroot passed to certbot.
    #[arg(long, global = true, value_name = "DIR", default_value = DEFAULT_WEBROOT)]
    pub webroot: PathBuf,

    /// Directory of `.tera` files overriding the built-in templates.
    #[arg(long, global = true, value_name = "DIR")]
    pub templates: Option<PathBuf>,

    /// Port polled by `wait-port` and supervised startup.
    #[arg(long, global = true, default_value_t = DEFAULT_HTTP_PORT)]
    pub http_port: u16,

    /// Connection attempts before giving up on the port.
    #[arg(long, global = true, default_value_t = DEFAULT_PORT_ATTEMPTS)]
    pub port_attempts: u32,

    /// Delay between connection attempts, in milliseconds.
    #[arg(long, global = true, default_value_t = 250)]
    pub port_interval_ms: u64,

    /// Hours between certificate renewals in supervised mode.
    #[arg(
        long,
        global = true,
        default_value_t = 168,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub renew_interval_hours: u64,

    /// nginx executable.
    #[arg(long, global = true, value_name = "PATH", default_value = "nginx")]
    pub nginx_bin: PathBuf,

    /// certbot executable.
    #[arg(long, global = true, value_name = "PATH", default_value = "certbot")]
    pub certbot_bin: PathBuf,

    /// Shell used to run the certificate script.
    #[arg(long, global = true, value_name = "PATH", default_value = "sh")]
    pub shell: PathBuf,
}

impl ConfigArgs {
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::new(
            non_empty(&self.nginx).unwrap_or_else(|| PathBuf::from(DEFAULT_NGINX_ROOT)),
            non_empty(&self.certbot).unwrap_or_else(|| PathBuf::from(DEFAULT_CERTBOT_ROOT)),
            non_empty(&self.backends).unwrap_or_else(|| PathBuf::from(DEFAULT_BACKENDS_DIR)),
        );
        settings.webroot = self.webroot.clone();
        settings.template_dir = non_empty(&self.templates);
        settings.http_port = self.http_port;
        settings.port_wait = PortWaitPolicy {
            attempts: self.port_attempts,
            interval: Duration::from_millis(self.port_interval_ms),
        };
        settings.renew_interval = Duration::from_secs(self.renew_interval_hours * 60 * 60);
        settings.programs = Programs {
            nginx: self.nginx_bin.clone(),
            certbot: self.certbot_bin.clone(),
            shell: self.shell.clone(),
        };
        settings
    }
}

/// An empty value (e.g. `NGINX=`) counts as unset.
fn non_empty(path: &Option<PathBuf>) -> Option<PathBuf> {
    path.as_ref()
        .filter(|p| !p.as_os_str().is_empty())
        .cloned()
}

//! Scan orchestration — owns configuration and wires the pieces together.
//!
//! A run moves through three phases: configuring (target construction,
//! CIDR expansion, liveness filtering, optional login), scanning (the
//! dispatcher drains the wordlist per target), and done (results handed
//! to the sink). Zero live targets is a reported outcome, not an error;
//! a failed login or malformed configuration is fatal before any probe
//! is sent.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use colored::Colorize;
use uuid::Uuid;

use crate::scanner::dispatcher::Dispatcher;
use crate::scanner::liveness::{expand_cidr, filter_live, is_alive};
use crate::scanner::probe::Classifier;
use crate::{Hit, OutputFormat, ScanReport, StatusPolicy, Target};

/// Connect timeout for liveness probes.
const LIVENESS_TIMEOUT: Duration = Duration::from_secs(2);

/// Worker pool size for CIDR liveness filtering (independent of the scan
/// pool; capped at the host count inside `filter_live`).
const LIVENESS_WORKERS: usize = 32;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Fatal configuration errors. Anything here stops the run before (or
/// during) setup; transport errors during scanning never surface as this.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no target: provide a URL or a CIDR block")]
    MissingTarget,

    #[error("cannot read wordlist '{path}': {source}")]
    Wordlist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Cidr(String),

    #[error("invalid status list: {0}")]
    Status(String),

    #[error("invalid delay window [{0}, {1}]: min must be >= 0 and <= max")]
    Delay(f64, f64),

    #[error("login requires --login-url, --username and --password together")]
    PartialCredentials,

    #[error("login to '{url}' rejected with status {status}")]
    LoginFailed { url: String, status: u16 },

    #[error("login request failed: {0}")]
    Login(#[source] reqwest::Error),

    #[error("HTTP client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid proxy URL '{url}': {source}")]
    Proxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Credentials for pre-scan session establishment. All-or-nothing.
#[derive(Debug, Clone)]
pub struct LoginConfig {
    pub url: String,
    pub username: String,
    pub password: String,
}

/// Full configuration for one run, produced by the CLI layer.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Single-URL target. Mutually exclusive with `cidr`.
    pub url: Option<String>,
    /// CIDR sweep target. Mutually exclusive with `url`.
    pub cidr: Option<String>,
    pub wordlist: PathBuf,
    pub output: PathBuf,
    pub workers: usize,
    pub policy: StatusPolicy,
    pub format: OutputFormat,
    pub proxy: Option<String>,
    pub bypass_403: bool,
    pub login: Option<LoginConfig>,
    pub oob_domain: Option<String>,
    /// Origin port for CIDR-built targets.
    pub port: u16,
    /// Scheme for CIDR-built targets.
    pub scheme: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Post-probe jitter window in seconds.
    pub delay: (f64, f64),
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            url: None,
            cidr: None,
            wordlist: PathBuf::from("wordlists/common.txt"),
            output: PathBuf::from("output/results.txt"),
            workers: 5,
            policy: StatusPolicy::default(),
            format: OutputFormat::Txt,
            proxy: None,
            bypass_403: false,
            login: None,
            oob_domain: None,
            port: 80,
            scheme: "http".to_string(),
            timeout_secs: 8,
            delay: (0.5, 2.0),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────────────────────────────────────

/// One completed per-target scan, ready for the result sink.
#[derive(Debug)]
pub struct CompletedScan {
    pub target: Target,
    /// Sink destination; per-host-suffixed for CIDR sweeps.
    pub dest: PathBuf,
    pub hits: Vec<Hit>,
    pub report: ScanReport,
}

/// Owns the run configuration and drives configuring -> scanning -> done.
#[derive(Debug)]
pub struct Orchestrator {
    config: ScanConfig,
    client: reqwest::Client,
}

impl Orchestrator {
    /// Validate the configuration and build the shared HTTP client.
    pub fn new(config: ScanConfig) -> Result<Self, ConfigError> {
        if config.url.is_none() && config.cidr.is_none() {
            return Err(ConfigError::MissingTarget);
        }
        let (min, max) = config.delay;
        if min < 0.0 || min > max {
            return Err(ConfigError::Delay(min, max));
        }

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true);
        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| ConfigError::Proxy {
                url: proxy_url.clone(),
                source: e,
            })?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(ConfigError::Client)?;

        Ok(Self { config, client })
    }

    /// Run the full scan: build the live target list, drain the wordlist
    /// against each target, and return the per-target results for the
    /// sink. An unreachable single target or an all-dead CIDR range is a
    /// normal zero-hit outcome, not an error.
    pub async fn run(&self) -> Result<Vec<CompletedScan>, ConfigError> {
        let paths = load_wordlist(&self.config.wordlist)?;

        if let Some(login) = &self.config.login {
            self.establish_session(login).await?;
        }

        let targets = self.build_targets().await?;
        if targets.is_empty() {
            println!("{} No live targets; nothing to scan.", "[!]".yellow());
            return Ok(Vec::new());
        }

        let mut completed = Vec::with_capacity(targets.len());
        for target in targets {
            completed.push(self.scan_target(target, &paths).await);
        }
        Ok(completed)
    }

    /// Configuring phase: turn the URL or CIDR input into live targets.
    async fn build_targets(&self) -> Result<Vec<Target>, ConfigError> {
        if let Some(url) = &self.config.url {
            let target = Target::new(url);
            let mut ports = vec![80, 443];
            if let Some(port) = target.explicit_port() {
                if !ports.contains(&port) {
                    ports.push(port);
                }
            }
            if !is_alive(target.host(), &ports, LIVENESS_TIMEOUT).await {
                tracing::warn!(origin = %target, ?ports, "target unreachable on probed ports");
                println!(
                    "{} Target {target} is unreachable on {ports:?}; run ends with zero hits.",
                    "[!]".yellow()
                );
                return Ok(Vec::new());
            }
            return Ok(vec![target]);
        }

        // CIDR mode. Malformed input is fatal; an all-dead range is not.
        let cidr = self.config.cidr.as_deref().ok_or(ConfigError::MissingTarget)?;
        let hosts = expand_cidr(cidr).map_err(ConfigError::Cidr)?;
        tracing::info!(cidr, hosts = hosts.len(), "expanded CIDR block");

        let mut ports = vec![80, 443, self.config.port];
        ports.sort_unstable();
        ports.dedup();

        let live = filter_live(
            hosts.iter().map(|ip| ip.to_string()).collect(),
            ports,
            LIVENESS_WORKERS,
            LIVENESS_TIMEOUT,
        )
        .await;
        tracing::info!(live = live.len(), "liveness filter complete");

        Ok(live
            .iter()
            .map(|host| Target::from_host(&self.config.scheme, host, self.config.port))
            .collect())
    }

    /// Scanning phase for one target.
    async fn scan_target(&self, target: Target, paths: &[String]) -> CompletedScan {
        let started_at = Utc::now();
        let start = Instant::now();
        let scan_id = Uuid::new_v4();

        println!(
            "{} Starting warren on {target} with {} paths using {} workers.",
            "[+]".green(),
            paths.len(),
            self.config.workers
        );

        let classifier = Arc::new(Classifier::new(
            self.client.clone(),
            target.clone(),
            self.config.policy.clone(),
            self.config.bypass_403,
            self.config.oob_domain.clone(),
            self.config.delay,
        ));

        let dispatcher = Dispatcher::new(self.config.workers);
        let hits = dispatcher.run(classifier, paths.to_vec()).await;

        let report = ScanReport {
            scan_id,
            target: target.origin().to_string(),
            started_at,
            paths_total: paths.len(),
            hits: hits.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        let dest = per_host_dest(&self.config.output, target.ip_label());
        CompletedScan {
            target,
            dest,
            hits,
            report,
        }
    }

    /// Establish the authenticated session with a single login POST.
    ///
    /// Anything but a final 200 or 302 is fatal — scanning with an
    /// unauthenticated session would silently produce garbage.
    async fn establish_session(&self, login: &LoginConfig) -> Result<(), ConfigError> {
        let response = self
            .client
            .post(&login.url)
            .form(&[
                ("username", login.username.as_str()),
                ("password", login.password.as_str()),
            ])
            .send()
            .await
            .map_err(ConfigError::Login)?;

        let status = response.status().as_u16();
        if status != 200 && status != 302 {
            return Err(ConfigError::LoginFailed {
                url: login.url.clone(),
                status,
            });
        }
        tracing::info!(url = %login.url, status, "authenticated session established");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Read the wordlist: one path per line, trimmed, blank lines dropped.
pub fn load_wordlist(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Wordlist {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Suffix the sink destination with the host label for CIDR sweeps, so
/// each live host gets its own artifact (`results.txt` ->
/// `results_10_0_0_5.txt`).
pub fn per_host_dest(base: &Path, ip_label: Option<&str>) -> PathBuf {
    let Some(label) = ip_label else {
        return base.to_path_buf();
    };
    let label = label.replace(['.', ':'], "_");
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("results");
    let name = match base.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_{label}.{ext}"),
        None => format!("{stem}_{label}"),
    };
    base.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_wordlist_trims_and_drops_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "admin\n\n  login  \n\nbackup").unwrap();
        let paths = load_wordlist(file.path()).unwrap();
        assert_eq!(paths, vec!["admin", "login", "backup"]);
    }

    #[test]
    fn test_load_wordlist_missing_is_config_error() {
        let err = load_wordlist(Path::new("/nonexistent/words.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::Wordlist { .. }));
    }

    #[test]
    fn test_per_host_dest_suffix() {
        assert_eq!(
            per_host_dest(Path::new("out/results.txt"), Some("10.0.0.5")),
            PathBuf::from("out/results_10_0_0_5.txt")
        );
        assert_eq!(
            per_host_dest(Path::new("results"), Some("10.0.0.5")),
            PathBuf::from("results_10_0_0_5")
        );
        assert_eq!(
            per_host_dest(Path::new("out/results.json"), None),
            PathBuf::from("out/results.json")
        );
    }

    #[test]
    fn test_orchestrator_requires_target() {
        let err = Orchestrator::new(ScanConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingTarget));
    }

    #[test]
    fn test_orchestrator_rejects_inverted_delay() {
        let config = ScanConfig {
            url: Some("http://example.com".to_string()),
            delay: (3.0, 1.0),
            ..ScanConfig::default()
        };
        let err = Orchestrator::new(config).unwrap_err();
        assert!(matches!(err, ConfigError::Delay(_, _)));
    }

    #[test]
    fn test_orchestrator_rejects_negative_delay_min() {
        // A negative minimum with a positive maximum must not reach the
        // workers; the jitter draw has to stay non-negative.
        let config = ScanConfig {
            url: Some("http://example.com".to_string()),
            delay: (-5.0, 0.001),
            ..ScanConfig::default()
        };
        let err = Orchestrator::new(config).unwrap_err();
        assert!(matches!(err, ConfigError::Delay(_, _)));
    }

    #[test]
    fn test_orchestrator_is_debuggable() {
        let config = ScanConfig {
            url: Some("http://example.com".to_string()),
            ..ScanConfig::default()
        };
        let orchestrator = Orchestrator::new(config).unwrap();
        assert!(format!("{orchestrator:?}").contains("Orchestrator"));
    }

    #[test]
    fn test_orchestrator_rejects_bad_proxy() {
        let config = ScanConfig {
            url: Some("http://example.com".to_string()),
            proxy: Some("::not a url::".to_string()),
            ..ScanConfig::default()
        };
        let err = Orchestrator::new(config).unwrap_err();
        assert!(matches!(err, ConfigError::Proxy { .. }));
    }
}

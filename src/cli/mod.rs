//! CLI entrypoint for warren.
//!
//! Parses arguments, applies built-in profiles, and hands a validated
//! `ScanConfig` to the engine. Output rendering lives in [`output`].

pub mod output;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::engine::{LoginConfig, ScanConfig};
use crate::{ConfigError, OutputFormat, StatusPolicy};

pub use output::{render, write_results};

// ─────────────────────────────────────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────────────────────────────────────

/// Warren — concurrent hidden-path discovery scanner.
#[derive(Parser, Debug)]
#[command(name = "warren", version, about)]
#[command(
    long_about = "Warren probes an HTTP target (or a CIDR range of hosts) with a wordlist, \
    classifies responses against a valid-status policy, and can retry HTTP 403 responses \
    through common WAF-bypass headers. Results go to txt, json or csv."
)]
pub struct Cli {
    /// Target base URL (e.g. http://example.com)
    #[arg(short, long, conflicts_with = "cidr")]
    pub url: Option<String>,

    /// IPv4 CIDR block to sweep (e.g. 10.0.0.0/24)
    #[arg(long, conflicts_with = "url")]
    pub cidr: Option<String>,

    /// Path to the wordlist file (one path per line)
    #[arg(short, long, default_value = "wordlists/common.txt")]
    pub wordlist: PathBuf,

    /// Output file path (per-host suffixed in CIDR mode)
    #[arg(short, long, default_value = "output/results.txt")]
    pub output: PathBuf,

    /// Number of concurrent workers
    #[arg(long)]
    pub threads: Option<usize>,

    /// Comma-separated status codes accepted as hits (e.g. 200,301,403)
    #[arg(long)]
    pub status: Option<String>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Apply a built-in profile before explicit flags
    #[arg(long, value_enum)]
    pub profile: Option<ProfileArg>,

    /// Proxy URL (e.g. http://127.0.0.1:8080)
    #[arg(long)]
    pub proxy: Option<String>,

    /// On HTTP 403, retry with common WAF-bypass headers
    #[arg(long = "bypass-403")]
    pub bypass_403: bool,

    /// Login URL for authenticated scanning (POST credentials first)
    #[arg(long)]
    pub login_url: Option<String>,

    /// Username for the login request
    #[arg(long)]
    pub username: Option<String>,

    /// Password for the login request
    #[arg(long)]
    pub password: Option<String>,

    /// OOB collaborator domain for blind callback tagging
    #[arg(long)]
    pub oob_domain: Option<String>,

    /// Origin port for CIDR-built targets
    #[arg(long, default_value = "80")]
    pub port: u16,

    /// Scheme for CIDR-built targets
    #[arg(long, default_value = "http")]
    pub scheme: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "8")]
    pub timeout: u64,

    /// Minimum post-probe delay in seconds
    #[arg(long, default_value = "0.5")]
    pub delay_min: f64,

    /// Maximum post-probe delay in seconds
    #[arg(long, default_value = "2.0")]
    pub delay_max: f64,
}

/// Output format argument.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Txt,
    Json,
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Txt => OutputFormat::Txt,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

/// Built-in scan profiles.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileArg {
    /// 5 workers, statuses 200,301, txt output
    Basic,
    /// 3 workers, status 403 only, json output
    Stealth,
    /// 10 workers, statuses 200,301,403, csv output
    Aggressive,
}

impl ProfileArg {
    fn settings(self) -> (usize, &'static str, OutputFormat) {
        match self {
            Self::Basic => (5, "200,301", OutputFormat::Txt),
            Self::Stealth => (3, "403", OutputFormat::Json),
            Self::Aggressive => (10, "200,301,403", OutputFormat::Csv),
        }
    }
}

impl Cli {
    /// Resolve the parsed arguments into a validated `ScanConfig`.
    ///
    /// Profile values apply first; explicit flags override them. The
    /// credential triple is all-or-nothing.
    pub fn into_config(self) -> Result<ScanConfig, ConfigError> {
        let mut workers = 5;
        let mut status = StatusPolicy::default();
        let mut format = OutputFormat::Txt;

        if let Some(profile) = self.profile {
            let (w, s, f) = profile.settings();
            workers = w;
            status = StatusPolicy::parse(s).map_err(ConfigError::Status)?;
            format = f;
        }
        if let Some(threads) = self.threads {
            workers = threads.max(1);
        }
        if let Some(s) = &self.status {
            status = StatusPolicy::parse(s).map_err(ConfigError::Status)?;
        }
        if let Some(f) = self.format {
            format = f.into();
        }

        let login = match (self.login_url, self.username, self.password) {
            (Some(url), Some(username), Some(password)) => Some(LoginConfig {
                url,
                username,
                password,
            }),
            (None, None, None) => None,
            _ => return Err(ConfigError::PartialCredentials),
        };

        Ok(ScanConfig {
            url: self.url,
            cidr: self.cidr,
            wordlist: self.wordlist,
            output: self.output,
            workers,
            policy: status,
            format,
            proxy: self.proxy,
            bypass_403: self.bypass_403,
            login,
            oob_domain: self.oob_domain,
            port: self.port,
            scheme: self.scheme,
            timeout_secs: self.timeout,
            delay: (self.delay_min, self.delay_max),
        })
    }
}

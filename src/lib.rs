//! Warren — concurrent hidden-path discovery scanner.
//!
//! Probes an HTTP target (or a CIDR range of hosts) with a wordlist,
//! classifies responses against a valid-status policy, optionally retries
//! HTTP 403 through a fixed sequence of header-spoofing bypass variants,
//! and tags requests with out-of-band callback tokens. Usable as a library
//! or via the CLI.

pub mod cli;
pub mod engine;
pub mod scanner;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export key types for library users.
pub use engine::{ConfigError, Orchestrator, ScanConfig};
pub use scanner::bypass::BYPASS_VARIANTS;
pub use scanner::dispatcher::Dispatcher;
pub use scanner::liveness::{expand_cidr, filter_live, is_alive};
pub use scanner::probe::Classifier;

// ─────────────────────────────────────────────────────────────────────────────
// Target
// ─────────────────────────────────────────────────────────────────────────────

/// One scannable origin (scheme + host + optional port).
///
/// Immutable once constructed; the trailing slash is stripped exactly once
/// here so path joining is always `origin + "/" + path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    origin: String,
    /// IP label for CIDR sweeps; drives the per-host output suffix.
    ip_label: Option<String>,
}

impl Target {
    /// Construct from a base URL, stripping any trailing slash.
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            ip_label: None,
        }
    }

    /// Construct one sweep target from a live CIDR host.
    pub fn from_host(scheme: &str, host: &str, port: u16) -> Self {
        let origin = match (scheme, port) {
            ("http", 80) | ("https", 443) => format!("{scheme}://{host}"),
            _ => format!("{scheme}://{host}:{port}"),
        };
        Self {
            origin,
            ip_label: Some(host.to_string()),
        }
    }

    /// The origin string, without a trailing slash.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// IP label for CIDR sweeps, `None` for single-URL scans.
    pub fn ip_label(&self) -> Option<&str> {
        self.ip_label.as_deref()
    }

    /// Build the probe URL for one candidate path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.origin, path)
    }

    /// Hostname portion of the origin (no scheme, no port, no path).
    pub fn host(&self) -> &str {
        let rest = self
            .origin
            .split_once("://")
            .map(|(_, r)| r)
            .unwrap_or(&self.origin);
        let rest = rest.split('/').next().unwrap_or(rest);
        match rest.rsplit_once(':') {
            Some((h, p)) if p.parse::<u16>().is_ok() => h,
            _ => rest,
        }
    }

    /// Explicit port in the origin, if any.
    pub fn explicit_port(&self) -> Option<u16> {
        let rest = self.origin.split_once("://").map(|(_, r)| r)?;
        let rest = rest.split('/').next()?;
        rest.rsplit_once(':')?.1.parse().ok()
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.origin)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Valid-status policy
// ─────────────────────────────────────────────────────────────────────────────

/// The set of HTTP status codes accepted as "found". Configured once per
/// run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPolicy(Vec<u16>);

impl StatusPolicy {
    /// Parse a comma-separated status list ("200,301,403").
    pub fn parse(s: &str) -> Result<Self, String> {
        let codes: Result<Vec<u16>, _> = s
            .split(',')
            .map(|c| {
                c.trim()
                    .parse::<u16>()
                    .map_err(|_| format!("invalid status code: '{}'", c.trim()))
            })
            .collect();
        let mut codes = codes?;
        if codes.is_empty() {
            return Err("empty status list".to_string());
        }
        codes.sort_unstable();
        codes.dedup();
        Ok(Self(codes))
    }

    /// Whether a response status counts as a hit.
    pub fn accepts(&self, status: u16) -> bool {
        self.0.binary_search(&status).is_ok()
    }

    /// The accepted codes, sorted ascending.
    pub fn codes(&self) -> &[u16] {
        &self.0
    }
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self(vec![200, 301, 302])
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hit record
// ─────────────────────────────────────────────────────────────────────────────

/// One accepted probe outcome — the unit the result sink consumes.
///
/// Appended under exclusive access by workers, never removed; collection
/// order is append order, not request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    pub url: String,
    pub status: u16,
    pub title: Option<String>,
    pub server: Option<String>,
    /// Which bypass header unlocked a 403, if any.
    pub bypass_header: Option<String>,
    /// The `<token>.<domain>` value attached to the request, if OOB
    /// tagging was configured.
    pub oob_token: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Output format
// ─────────────────────────────────────────────────────────────────────────────

/// Result sink encoding. A closed set, resolved once at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
    Csv,
}

impl OutputFormat {
    /// String identifier for this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scan report
// ─────────────────────────────────────────────────────────────────────────────

/// Per-target run summary. Drives the console summary line; the hit
/// records themselves go to the sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub paths_total: usize,
    pub hits: usize,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_strips_trailing_slash_once() {
        let t = Target::new("http://example.com/");
        assert_eq!(t.origin(), "http://example.com");
        assert_eq!(t.url_for("admin"), "http://example.com/admin");
    }

    #[test]
    fn test_target_from_host_elides_default_port() {
        assert_eq!(
            Target::from_host("http", "10.0.0.5", 80).origin(),
            "http://10.0.0.5"
        );
        assert_eq!(
            Target::from_host("https", "10.0.0.5", 443).origin(),
            "https://10.0.0.5"
        );
        assert_eq!(
            Target::from_host("http", "10.0.0.5", 8080).origin(),
            "http://10.0.0.5:8080"
        );
    }

    #[test]
    fn test_target_host_and_port() {
        let t = Target::new("http://example.com:8080/");
        assert_eq!(t.host(), "example.com");
        assert_eq!(t.explicit_port(), Some(8080));

        let t = Target::new("https://example.com");
        assert_eq!(t.host(), "example.com");
        assert_eq!(t.explicit_port(), None);
    }

    #[test]
    fn test_status_policy_parse() {
        let p = StatusPolicy::parse("200, 301,403").unwrap();
        assert_eq!(p.codes(), &[200, 301, 403]);
        assert!(p.accepts(403));
        assert!(!p.accepts(302));
    }

    #[test]
    fn test_status_policy_rejects_garbage() {
        assert!(StatusPolicy::parse("200,abc").is_err());
        assert!(StatusPolicy::parse("").is_err());
    }

    #[test]
    fn test_scan_report_json_round_trip() {
        let report = ScanReport {
            scan_id: Uuid::new_v4(),
            target: "http://example.com".to_string(),
            started_at: Utc::now(),
            paths_total: 42,
            hits: 3,
            duration_ms: 1234,
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: ScanReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.scan_id, report.scan_id);
        assert_eq!(back.paths_total, 42);
    }

    #[test]
    fn test_status_policy_default() {
        let p = StatusPolicy::default();
        assert!(p.accepts(200));
        assert!(p.accepts(301));
        assert!(p.accepts(302));
        assert!(!p.accepts(403));
    }
}

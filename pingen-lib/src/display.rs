//! Human-readable and JSON formatting of pin reports.

use crate::generator::PinReport;
use crate::PinError;
use serde::Serialize;

/// Format a report as text: one `label/digest` line per certificate, leaf
/// first. Entries with a recorded subject are preceded by a
/// `Subject : <DN>` line.
pub fn display_text(report: &PinReport) -> String {
    let mut out = String::new();
    for entry in &report.entries {
        if let Some(subject) = &entry.subject {
            out.push_str(&format!("Subject : {}\n", subject));
        }
        out.push_str(&format!("{}\n", entry.pin));
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    host: &'a str,
    port: u16,
    algorithm: &'static str,
    pins: Vec<JsonPin<'a>>,
}

#[derive(Serialize)]
struct JsonPin<'a> {
    index: usize,
    pin: String,
    algorithm: &'static str,
    digest: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<&'a str>,
}

/// Format a report as pretty-printed JSON.
pub fn to_json(report: &PinReport) -> Result<String, PinError> {
    let json = JsonReport {
        host: report.endpoint.hostname(),
        port: report.endpoint.port(),
        algorithm: report.algorithm.label(),
        pins: report
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| JsonPin {
                index,
                pin: entry.pin.to_string(),
                algorithm: entry.pin.label(),
                digest: entry.pin.digest_base64(),
                subject: entry.subject.as_deref(),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&json).map_err(PinError::Json)
}

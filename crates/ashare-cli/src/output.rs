use ashare_core::{Outcome, ProgressEvent, ProgressSink};
use serde_json::{json, Value};

use crate::error::CliError;

/// Print the terminal envelope as a single JSON line.
///
/// Every diagnostic line printed before it carries a `status` key and
/// never a `success` key; the terminal line is the only one with
/// `success`, so line-oriented callers can tell them apart.
pub fn render(envelope: &Outcome<Value>) -> Result<(), CliError> {
    let payload = serde_json::to_string(envelope)?;
    println!("{payload}");
    Ok(())
}

/// Chain progress rendered as NDJSON diagnostic lines on stdout.
pub struct ProgressWriter {
    enabled: bool,
}

impl ProgressWriter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn emit_line(&self, line: &Value) {
        if self.enabled {
            println!("{line}");
        }
    }
}

impl ProgressSink for ProgressWriter {
    fn emit(&self, event: &ProgressEvent) {
        let line = match event {
            ProgressEvent::TierStart { provider, endpoint } => json!({
                "status": "progress",
                "provider": provider.as_str(),
                "endpoint": endpoint.as_str(),
            }),
            ProgressEvent::TierFailed {
                provider,
                endpoint,
                code,
                message,
            } => json!({
                "status": "error",
                "provider": provider.as_str(),
                "endpoint": endpoint.as_str(),
                "code": code,
                "message": message,
            }),
        };
        self.emit_line(&line);
    }
}

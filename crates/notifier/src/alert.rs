// crates/notifier/src/alert.rs
//! The structured alert body: title, message, optional details/error/
//! traceback sections, rendered into one MarkdownV2 message.

use activity_types::AlertLevel;
use chrono::{DateTime, Utc};

use crate::markdown::escape_markdown;

const MAX_TRACEBACK_LINES: usize = 15;
const MAX_ERROR_MESSAGE_CHARS: usize = 500;

#[derive(Debug, Clone, Default)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub level: AlertLevel,
    pub details: Vec<(String, String)>,
    pub error: Option<(String, String)>,
    pub traceback: Option<String>,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>, level: AlertLevel) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            level,
            details: Vec::new(),
            error: None,
            traceback: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    pub fn with_error(mut self, error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        self.error = Some((error_type.into(), error_message.into()));
        self
    }

    pub fn with_traceback(mut self, traceback: impl Into<String>) -> Self {
        self.traceback = Some(traceback.into());
        self
    }

    pub fn disable_notification(&self) -> bool {
        self.level == AlertLevel::Info
    }

    /// Renders the final MarkdownV2 text sent to the chat API.
    pub fn render(&self, environment: &str, now: DateTime<Utc>) -> String {
        let mut lines = Vec::new();
        lines.push(format!("{} *{}*", self.level.emoji(), escape_markdown(&self.title)));
        lines.push(format!("_{}_", escape_markdown(&environment.to_uppercase())));
        lines.push(String::new());
        lines.push(escape_markdown(&self.message));

        if !self.details.is_empty() {
            lines.push(String::new());
            lines.push("*Details:*".to_string());
            for (key, value) in &self.details {
                lines.push(format!("\u{2022} {}: `{}`", escape_markdown(key), escape_markdown(value)));
            }
        }

        if let Some((error_type, error_message)) = &self.error {
            let truncated: String = error_message.chars().take(MAX_ERROR_MESSAGE_CHARS).collect();
            lines.push(String::new());
            lines.push(format!("*Error:* `{}: {}`", escape_markdown(error_type), escape_markdown(&truncated)));
        }

        if let Some(traceback) = &self.traceback {
            let tb_lines: Vec<&str> = traceback.lines().collect();
            let truncated = tb_lines.len() > MAX_TRACEBACK_LINES;
            let mut kept: Vec<&str> = tb_lines.into_iter().take(MAX_TRACEBACK_LINES).collect();
            if truncated {
                kept.push("... (truncated)");
            }
            lines.push(String::new());
            lines.push("*Traceback:*".to_string());
            lines.push(format!("```\n{}\n```", kept.join("\n")));
        }

        lines.push(String::new());
        lines.push(format!("\u{23F0} _{}_", now.format("%Y-%m-%d %H:%M:%S UTC")));

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn renders_title_message_and_timestamp() {
        let alert = Alert::new("ERROR 500", "something broke", AlertLevel::Critical);
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 12, 0, 0).unwrap();
        let rendered = alert.render("production", now);
        assert!(rendered.contains("ERROR 500"));
        assert!(rendered.contains("something broke"));
        assert!(rendered.contains("2026-07-28 12:00:00 UTC"));
    }

    #[test]
    fn details_are_escaped_and_backticked() {
        let alert = Alert::new("t", "m", AlertLevel::Warning).with_detail("Endpoint", "/api/v1.projects");
        let now = Utc::now();
        let rendered = alert.render("staging", now);
        assert!(rendered.contains("`/api/v1\\.projects`"));
    }

    #[test]
    fn traceback_fence_is_not_escaped() {
        let alert = Alert::new("t", "m", AlertLevel::Critical).with_traceback("line1.\nline2!");
        let now = Utc::now();
        let rendered = alert.render("production", now);
        assert!(rendered.contains("```\nline1.\nline2!\n```"));
    }

    #[test]
    fn long_traceback_is_truncated() {
        let lines: Vec<String> = (0..30).map(|i| format!("frame {i}")).collect();
        let alert = Alert::new("t", "m", AlertLevel::Critical).with_traceback(lines.join("\n"));
        let rendered = alert.render("production", Utc::now());
        assert!(rendered.contains("... (truncated)"));
    }

    #[test]
    fn info_level_disables_notification() {
        assert!(Alert::new("t", "m", AlertLevel::Info).disable_notification());
        assert!(!Alert::new("t", "m", AlertLevel::Warning).disable_notification());
    }
}

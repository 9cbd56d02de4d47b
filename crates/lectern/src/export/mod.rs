//! Read-only reports of a memory's contents
//!
//! JSON for machines, plain text, Markdown and HTML for people. Exports cover
//! what the memory still holds: L1 turns verbatim, L2 summaries, the L3
//! question index and a stats snapshot. Folded turns are gone and never
//! appear.

use std::str::FromStr;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::error::{LecternError, Result};
use crate::memory::{MemoryStats, QuestionIndexEntry, SummaryBlock, TieredMemory, Turn};

const RULE_WIDTH: usize = 60;

/// Output format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Text,
    Markdown,
    Html,
}

impl FromStr for ExportFormat {
    type Err = LecternError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            "html" | "htm" => Ok(Self::Html),
            other => Err(LecternError::General(format!(
                "Unknown export format '{other}', expected json, text, markdown or html"
            ))),
        }
    }
}

#[derive(Serialize)]
struct JsonExport<'a> {
    export_time: DateTime<Utc>,
    conversations: &'a [Turn],
    summaries: &'a [SummaryBlock],
    questions: &'a [QuestionIndexEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<MemoryStats>,
}

/// Renders one memory in the supported formats
pub struct Exporter<'a> {
    memory: &'a TieredMemory,
}

impl<'a> Exporter<'a> {
    pub fn new(memory: &'a TieredMemory) -> Self {
        Self { memory }
    }

    /// Render in `format` with default options
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Json => self.to_json(true),
            ExportFormat::Text => Ok(self.to_text(true)),
            ExportFormat::Markdown => Ok(self.to_markdown()),
            ExportFormat::Html => Ok(self.to_html()),
        }
    }

    /// Resident turns whose text contains `keyword`, oldest first
    ///
    /// A blank keyword matches nothing.
    pub fn search(&self, keyword: &str, case_sensitive: bool) -> Vec<&'a Turn> {
        if keyword.trim().is_empty() {
            return Vec::new();
        }
        let needle = if case_sensitive {
            keyword.to_string()
        } else {
            keyword.to_lowercase()
        };

        self.memory
            .l1_turns()
            .iter()
            .filter(|turn| {
                if case_sensitive {
                    turn.text().contains(&needle)
                } else {
                    turn.text().to_lowercase().contains(&needle)
                }
            })
            .collect()
    }

    /// Pretty-printed JSON document
    pub fn to_json(&self, include_stats: bool) -> Result<String> {
        let export = JsonExport {
            export_time: Utc::now(),
            conversations: self.memory.l1_turns(),
            summaries: self.memory.l2_summaries(),
            questions: self.memory.question_index(),
            stats: include_stats.then(|| self.memory.stats()),
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Plain transcript with a stats footer
    pub fn to_text(&self, include_timestamps: bool) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut lines = vec![
            rule.clone(),
            "Conversation record".to_string(),
            format!("Exported: {}", Local::now().format("%Y-%m-%d %H:%M:%S")),
            rule.clone(),
            String::new(),
        ];

        for summary in self.memory.l2_summaries() {
            lines.push(format!(
                "[Summary of {} turns]",
                summary.original_turn_count()
            ));
            lines.push(format!("  {}", summary.summary_text()));
            lines.push(String::new());
        }

        for turn in self.memory.l1_turns() {
            if include_timestamps {
                lines.push(format!(
                    "[{}] {}:",
                    local_time(turn.created_at()),
                    turn.role().label()
                ));
            } else {
                lines.push(format!("{}:", turn.role().label()));
            }
            lines.push(format!("  {}", turn.text()));
            lines.push(String::new());
        }

        let stats = self.memory.stats();
        lines.push(rule.clone());
        lines.push("Statistics".to_string());
        lines.push(rule);
        lines.push(format!("Total turns: {}", stats.total_turns));
        lines.push(format!("Total tokens: {}", stats.total_tokens));
        lines.push(format!("L1: {} turns", stats.l1_size));
        lines.push(format!("L2: {} summaries", stats.l2_size));
        lines.push(format!("L3: {} questions", stats.l3_size));

        lines.join("\n")
    }

    /// Markdown document with per-turn headings
    pub fn to_markdown(&self) -> String {
        let mut lines = vec![
            "# Conversation record".to_string(),
            String::new(),
            format!(
                "**Exported**: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            ),
            String::new(),
            "---".to_string(),
            String::new(),
        ];

        let summaries = self.memory.l2_summaries();
        if !summaries.is_empty() {
            lines.push("## Earlier in the session".to_string());
            lines.push(String::new());
            for summary in summaries {
                lines.push(format!(
                    "> {} _({} turns)_",
                    summary.summary_text(),
                    summary.original_turn_count()
                ));
                lines.push(String::new());
            }
        }

        for turn in self.memory.l1_turns() {
            lines.push(format!(
                "### {} `{}`",
                turn.role().label(),
                local_time(turn.created_at())
            ));
            lines.push(String::new());
            lines.push(turn.text().to_string());
            lines.push(String::new());
        }

        let questions = self.memory.question_index();
        if !questions.is_empty() {
            lines.push("## Indexed questions".to_string());
            lines.push(String::new());
            for entry in questions {
                lines.push(format!(
                    "- `{}` {}",
                    local_time(entry.asked_at),
                    entry.question_text
                ));
            }
            lines.push(String::new());
        }

        let stats = self.memory.stats();
        lines.push("---".to_string());
        lines.push(String::new());
        lines.push("## Statistics".to_string());
        lines.push(String::new());
        lines.push(format!("- **Total turns**: {}", stats.total_turns));
        lines.push(format!("- **Total tokens**: {}", stats.total_tokens));
        lines.push(format!(
            "- **L1**: {} turns ({} tokens)",
            stats.l1_size, stats.l1_tokens
        ));
        lines.push(format!(
            "- **L2**: {} summaries ({} tokens)",
            stats.l2_size, stats.l2_tokens
        ));
        lines.push(format!("- **L3**: {} questions", stats.l3_size));

        lines.join("\n")
    }

    /// Standalone HTML page; all memory text is escaped
    pub fn to_html(&self) -> String {
        let mut html = String::from(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <title>Conversation record</title>\n<style>\n\
             body { font-family: sans-serif; max-width: 48em; margin: 2em auto; }\n\
             .turn { margin: 1em 0; padding: 0.5em 1em; border-left: 4px solid #ccc; }\n\
             .primary { border-color: #2b6cb0; }\n\
             .secondary { border-color: #2f855a; }\n\
             .summary { color: #555; font-style: italic; }\n\
             .time { color: #888; font-size: 0.85em; }\n\
             </style>\n</head>\n<body>\n<h1>Conversation record</h1>\n",
        );
        html.push_str(&format!(
            "<p class=\"time\">Exported: {}</p>\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        let summaries = self.memory.l2_summaries();
        if !summaries.is_empty() {
            html.push_str("<h2>Earlier in the session</h2>\n");
            for summary in summaries {
                html.push_str(&format!(
                    "<p class=\"summary\">{} ({} turns)</p>\n",
                    escape_html(summary.summary_text()),
                    summary.original_turn_count()
                ));
            }
        }

        for turn in self.memory.l1_turns() {
            html.push_str(&format!(
                "<div class=\"turn {}\">\n<strong>{}</strong> \
                 <span class=\"time\">{}</span>\n<p>{}</p>\n</div>\n",
                turn.role().as_str(),
                turn.role().label(),
                local_time(turn.created_at()),
                escape_html(turn.text())
            ));
        }

        let questions = self.memory.question_index();
        if !questions.is_empty() {
            html.push_str("<h2>Indexed questions</h2>\n<ul>\n");
            for entry in questions {
                html.push_str(&format!(
                    "<li><span class=\"time\">{}</span> {}</li>\n",
                    local_time(entry.asked_at),
                    escape_html(&entry.question_text)
                ));
            }
            html.push_str("</ul>\n");
        }

        let stats = self.memory.stats();
        html.push_str("<h2>Statistics</h2>\n<ul>\n");
        html.push_str(&format!("<li>Total turns: {}</li>\n", stats.total_turns));
        html.push_str(&format!("<li>Total tokens: {}</li>\n", stats.total_tokens));
        html.push_str(&format!(
            "<li>L1: {} turns ({} tokens)</li>\n",
            stats.l1_size, stats.l1_tokens
        ));
        html.push_str(&format!(
            "<li>L2: {} summaries ({} tokens)</li>\n",
            stats.l2_size, stats.l2_tokens
        ));
        html.push_str(&format!("<li>L3: {} questions</li>\n", stats.l3_size));
        html.push_str("</ul>\n</body>\n</html>\n");

        html
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

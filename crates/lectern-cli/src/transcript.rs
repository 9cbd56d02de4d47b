//! JSON Lines transcript input
//!
//! One `{"role": "...", "text": "..."}` object per line. Roles accept the
//! wire names (`primary`, `secondary`, `unknown`) and the classroom names
//! (`teacher`, `student`). Blank lines are skipped.

use std::path::Path;

use lectern::Role;
use serde::Deserialize;

use crate::error::{CliError, CliResult};

#[derive(Debug, Deserialize)]
struct RawLine {
    role: String,
    text: String,
}

/// A parsed transcript line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub role: Role,
    pub text: String,
}

pub fn parse_transcript(content: &str) -> CliResult<Vec<TranscriptLine>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            let raw: RawLine = serde_json::from_str(line)
                .map_err(|e| CliError(format!("line {}: {e}", idx + 1)))?;
            let role = Role::parse(&raw.role).ok_or_else(|| {
                CliError(format!("line {}: unknown role '{}'", idx + 1, raw.role))
            })?;
            Ok(TranscriptLine {
                role,
                text: raw.text,
            })
        })
        .collect()
}

pub fn read_transcript(path: &Path) -> CliResult<Vec<TranscriptLine>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError(format!("Failed to read {}: {e}", path.display())))?;
    parse_transcript(&content)
}

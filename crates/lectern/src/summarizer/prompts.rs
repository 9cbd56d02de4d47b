//! Prompts for LLM-backed summaries

/// System prompt for folding a stretch of classroom dialogue
pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You are a conversation summarization assistant for a live classroom.
Compress the dialogue you are given into a concise summary that keeps:
1. The main topics under discussion
2. The key questions students asked
3. Important points of knowledge the teacher explained

Keep the summary under 100 words. Reply with the summary text only."#;

/// User prompt wrapping the rendered dialogue
///
/// Placeholder: {conversation} - one `Label: text` line per turn
pub const SUMMARY_USER_PROMPT: &str = r#"Dialogue to summarize:
{conversation}"#;

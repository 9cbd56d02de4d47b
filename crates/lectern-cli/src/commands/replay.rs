use std::path::PathBuf;

use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use lectern::config::Config;
use lectern::export::{ExportFormat, Exporter};
use lectern::{CompressionReport, MemoryStats, SessionMemory};
use tracing::debug;

use crate::error::CliResult;
use crate::output::{OutputFormat, format_timestamp, truncate_string};
use crate::transcript::{TranscriptLine, read_transcript};

const QUESTION_WIDTH: usize = 60;

#[derive(Parser)]
pub struct ReplayCommand {
    #[clap(help = "Transcript in JSON Lines: one {\"role\", \"text\"} object per line")]
    pub transcript: PathBuf,

    #[clap(long, help = "Print the assembled context after the replay")]
    pub context: bool,

    #[clap(long, requires = "context", help = "Token budget for --context")]
    pub max_tokens: Option<usize>,

    #[clap(long, value_name = "N", help = "Show the N most recent student turns")]
    pub questions: Option<usize>,

    #[clap(
        long,
        value_name = "FORMAT",
        help = "Print an export instead of the report (json, text, markdown, html)"
    )]
    pub export: Option<String>,

    #[clap(long, value_name = "KEYWORD", help = "List L1 turns containing KEYWORD")]
    pub search: Option<String>,

    #[clap(long, requires = "search", help = "Match --search case-sensitively")]
    pub case_sensitive: bool,
}

/// An L1 turn matched by `--search`
#[derive(Debug, Clone, serde::Serialize)]
struct SearchHit {
    role: String,
    text: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

/// Turns offered and accepted by a replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub offered: usize,
    pub accepted: usize,
}

/// Feed transcript lines through the session in order
pub async fn replay(session: &SessionMemory, lines: &[TranscriptLine]) -> ReplaySummary {
    let mut accepted = 0;
    for line in lines {
        if session.add(line.role, &line.text).await {
            accepted += 1;
        } else {
            debug!("Skipped blank {} turn", line.role);
        }
    }
    ReplaySummary {
        offered: lines.len(),
        accepted,
    }
}

impl ReplayCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> CliResult<()> {
        let export_format = self
            .export
            .as_deref()
            .map(str::parse::<ExportFormat>)
            .transpose()?;

        let lines = read_transcript(&self.transcript)?;
        let session = SessionMemory::from_config(config)?;
        let summary = replay(&session, &lines).await;

        if let Some(export_format) = export_format {
            let rendered = session
                .read(|memory| Exporter::new(memory).export(export_format))
                .await?;
            println!("{rendered}");
            session.teardown().await;
            return Ok(());
        }

        let stats = session.stats().await;
        let (compression, prompt_tokens) = session
            .read(|memory| {
                (
                    memory.compression_totals(),
                    memory.prompt_tokens(self.max_tokens),
                )
            })
            .await;
        let context = if self.context {
            Some(session.assemble_context(self.max_tokens).await)
        } else {
            None
        };
        let hits = match &self.search {
            Some(keyword) => Some(
                session
                    .read(|memory| {
                        Exporter::new(memory)
                            .search(keyword, self.case_sensitive)
                            .into_iter()
                            .map(|turn| SearchHit {
                                role: turn.role().to_string(),
                                text: turn.text().to_string(),
                                created_at: turn.created_at(),
                            })
                            .collect::<Vec<_>>()
                    })
                    .await,
            ),
            None => None,
        };
        let recent = match self.questions {
            Some(limit) => Some(session.recent_questions(limit).await),
            None => None,
        };
        let indexed = session
            .read(|memory| memory.question_index().to_vec())
            .await;

        match format {
            OutputFormat::Json => {
                let mut output = serde_json::json!({
                    "session_id": session.id().to_string(),
                    "turns_offered": summary.offered,
                    "turns_accepted": summary.accepted,
                    "stats": stats,
                    "compression": compression,
                });
                if let Some(context) = &context {
                    output["context"] = serde_json::to_value(context)?;
                    output["prompt_tokens"] = serde_json::to_value(prompt_tokens)?;
                }
                if let Some(hits) = &hits {
                    output["search"] = serde_json::to_value(hits)?;
                }
                if let Some(recent) = &recent {
                    output["recent_questions"] = serde_json::to_value(recent)?;
                    output["indexed_questions"] = serde_json::to_value(&indexed)?;
                }
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!("Lectern Replay");
                println!("======================\n");
                println!(
                    "Replayed {} of {} turns from {}\n",
                    summary.accepted,
                    summary.offered,
                    self.transcript.display()
                );
                println!("{}\n", stats_table(&stats));
                println!("{}\n", compression_line(&compression));

                if let Some(context) = &context {
                    let budget = context
                        .budget
                        .map_or_else(|| "unbounded".to_string(), |b| b.to_string());
                    println!(
                        "Context ({} tokens, {} as a prompt, budget {}, {} turns and {} summaries dropped):",
                        context.tokens_used,
                        prompt_tokens,
                        budget,
                        context.turns_dropped,
                        context.summaries_dropped
                    );
                    println!("{}\n", context.text);
                }

                if let Some(recent) = &recent {
                    if recent.is_empty() {
                        println!("No student turns in L1.");
                    } else {
                        println!("Recent student turns:");
                        for (i, question) in recent.iter().enumerate() {
                            println!("  {}. {}", i + 1, truncate_string(question, QUESTION_WIDTH));
                        }
                    }

                    if !indexed.is_empty() {
                        let mut table = Table::new();
                        table
                            .load_preset(UTF8_FULL_CONDENSED)
                            .set_content_arrangement(ContentArrangement::Dynamic)
                            .set_header(["Asked", "Indexed question"]);
                        for entry in &indexed {
                            table.add_row([
                                format_timestamp(&entry.asked_at),
                                truncate_string(&entry.question_text, QUESTION_WIDTH),
                            ]);
                        }
                        println!("\n{table}");
                    }
                }

                if let Some(hits) = &hits {
                    if hits.is_empty() {
                        println!("\nNo L1 turns match the search.");
                    } else {
                        let mut table = Table::new();
                        table
                            .load_preset(UTF8_FULL_CONDENSED)
                            .set_content_arrangement(ContentArrangement::Dynamic)
                            .set_header(["Time", "Role", "Text"]);
                        for hit in hits {
                            table.add_row([
                                format_timestamp(&hit.created_at),
                                hit.role.clone(),
                                truncate_string(&hit.text, QUESTION_WIDTH),
                            ]);
                        }
                        println!("\n{table}");
                    }
                }
            }
        }

        session.teardown().await;
        Ok(())
    }
}

fn compression_line(report: &CompressionReport) -> String {
    format!(
        "Compression: {} passes, {} batches folded ({} local fallbacks), {} summaries evicted, {} questions indexed",
        report.passes,
        report.batches_folded,
        report.fallbacks_used,
        report.summaries_evicted,
        report.questions_indexed
    )
}

fn stats_table(stats: &MemoryStats) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["Tier", "Entries", "Tokens"]);

    table.add_row([
        "L1 turns".to_string(),
        stats.l1_size.to_string(),
        stats.l1_tokens.to_string(),
    ]);
    table.add_row([
        "L2 summaries".to_string(),
        stats.l2_size.to_string(),
        stats.l2_tokens.to_string(),
    ]);
    table.add_row([
        "L3 questions".to_string(),
        stats.l3_size.to_string(),
        "-".to_string(),
    ]);
    table.add_row([
        "Total".to_string(),
        format!("{} turns seen", stats.total_turns),
        stats.total_tokens.to_string(),
    ]);
    table
}

//! End-to-end classroom scenarios through the public API
//!
//! All scenarios price turns by word count with `l1_capacity = 2`,
//! `l2_capacity = 1` and a threshold of 6 tokens. The summarizer always
//! answers with a five-word summary unless a test says otherwise.

use std::sync::Arc;

use lectern::memory::{Role, TieredMemory};
use lectern::testing::{ScriptedSummarizer, word_count_memory};

fn classroom() -> TieredMemory {
    word_count_memory(
        2,
        1,
        6,
        Arc::new(ScriptedSummarizer::always("s1 s2 s3 s4 s5")),
    )
}

/// Memory after the three opening turns: one folded batch, one raw turn
async fn after_first_fold() -> TieredMemory {
    let mut memory = classroom();
    memory.add(Role::Primary, "hello class today").await;
    memory.add(Role::Secondary, "what is this exactly").await;
    memory.add(Role::Secondary, "please explain more now").await;
    memory
}

#[tokio::test]
async fn test_first_turn_is_recorded_verbatim() {
    let mut memory = classroom();
    memory.add(Role::Primary, "hello class today").await;

    let stats = memory.stats();
    assert_eq!(stats.l1_size, 1);
    assert_eq!(stats.total_tokens, 3);
    assert_eq!(memory.get_context(None), "Teacher: hello class today");
}

#[tokio::test]
async fn test_over_budget_with_l1_at_capacity_leaves_l1_alone() {
    let mut memory = classroom();
    memory.add(Role::Primary, "hello class today").await;
    memory.add(Role::Secondary, "what is this exactly").await;

    let stats = memory.stats();
    assert_eq!(stats.total_tokens, 7);
    assert_eq!(stats.l1_size, 2);
    assert_eq!(stats.l2_size, 0);
}

#[tokio::test]
async fn test_third_turn_folds_the_opening_pair() {
    let memory = after_first_fold().await;

    let stats = memory.stats();
    assert_eq!(stats.l1_size, 1);
    assert_eq!(stats.l2_size, 1);
    assert_eq!(stats.total_tokens, 9);
    assert_eq!(stats.total_turns, 3);
    assert_eq!(
        memory.get_context(None),
        "[Summary]: s1 s2 s3 s4 s5\nStudent: please explain more now"
    );
}

#[tokio::test]
async fn test_second_fold_evicts_first_summary_and_indexes_resident_question() {
    let mut memory = after_first_fold().await;
    memory.add(Role::Secondary, "is that right?").await;
    memory.add(Role::Secondary, "why does it work?").await;

    let stats = memory.stats();
    assert_eq!(stats.l2_size, 1);
    assert_eq!(stats.l3_size, 1);
    assert_eq!(stats.total_tokens, stats.l1_tokens + stats.l2_tokens);
    assert_eq!(memory.question_index()[0].question_text, "why does it work?");
}

#[tokio::test]
async fn test_tight_budget_keeps_only_newest_turn() {
    let memory = after_first_fold().await;
    assert_eq!(
        memory.get_context(Some(4)),
        "Student: please explain more now"
    );

    let assembled = memory.assemble_context(Some(4));
    assert_eq!(assembled.tokens_used, 4);
    assert_eq!(assembled.summaries_dropped, 1);
}

#[tokio::test]
async fn test_budget_below_newest_turn_gives_empty_context() {
    let memory = after_first_fold().await;
    assert_eq!(memory.get_context(Some(3)), "");
    assert_eq!(memory.get_context(Some(0)), "");
}

#[tokio::test]
async fn test_recent_questions_after_fold_lists_resident_student_turns() {
    let memory = after_first_fold().await;
    assert_eq!(memory.recent_questions(1), vec!["please explain more now"]);
}

#[tokio::test]
async fn test_failing_summarizer_produces_local_summary() {
    let mut memory = word_count_memory(2, 1, 6, Arc::new(ScriptedSummarizer::failing()));
    memory.add(Role::Primary, "hello class today").await;
    memory.add(Role::Secondary, "what is this exactly").await;
    memory.add(Role::Secondary, "please explain more now").await;

    assert_eq!(
        memory.get_context(None),
        "[Summary]: Teacher: hello class today | Student: what is this exactly\n\
         Student: please explain more now"
    );
    assert_eq!(memory.stats().total_tokens, 14);
}

#[tokio::test]
async fn test_long_turns_are_capped_in_local_summary() {
    let mut memory = word_count_memory(1, 3, 0, Arc::new(ScriptedSummarizer::failing()));
    let long = "word ".repeat(30);
    memory.add(Role::Primary, long.trim_end()).await;
    memory.add(Role::Secondary, "ok").await;

    let summary = memory.l2_summaries()[0].summary_text();
    assert!(summary.starts_with("Teacher: "));
    assert!(summary.ends_with("..."));
    assert_eq!(summary.chars().count(), "Teacher: ".len() + 50 + 3);
}

#[tokio::test]
async fn test_chinese_classroom_questions_are_indexed() {
    let mut memory = word_count_memory(1, 1, 0, Arc::new(ScriptedSummarizer::always("摘要")));
    memory.add(Role::Primary, "今天 讲 函数").await;
    memory.add(Role::Secondary, "老师 这个 难 吗").await;
    memory.add(Role::Secondary, "那 参数 呢").await;

    // Two folds; the second evicts and scans the turn left in L1
    let index = memory.question_index();
    assert_eq!(index.len(), 1);
    assert_eq!(index[0].question_text, "那 参数 呢");
}

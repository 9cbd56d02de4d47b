//! Invariant checks over seeded random classroom transcripts
//!
//! Each seed picks tier sizes, a threshold and a summarizer behaviour, then
//! feeds a few hundred turns while checking the memory's accounting after
//! every operation.

use std::sync::Arc;

use lectern::config::MemoryConfig;
use lectern::memory::{Role, TieredMemory};
use lectern::testing::{ScriptedSummarizer, WordCounter, word_count_memory};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SEEDS: u64 = 40;
const TURNS_PER_SEED: usize = 250;

const VOCAB: [&str; 12] = [
    "today", "we", "learn", "loops", "why", "does", "it", "stop", "吗", "函数", "ok", "again",
];

struct Setup {
    l1_capacity: usize,
    l2_capacity: usize,
    threshold: usize,
    memory: TieredMemory,
}

fn setup(rng: &mut StdRng) -> Setup {
    let l1_capacity = rng.gen_range(1..=4);
    let l2_capacity = rng.gen_range(1..=4);
    let threshold = rng.gen_range(0..40);

    let memory = match rng.gen_range(0..3) {
        0 => word_count_memory(
            l1_capacity,
            l2_capacity,
            threshold,
            Arc::new(ScriptedSummarizer::always("brief recap")),
        ),
        1 => word_count_memory(
            l1_capacity,
            l2_capacity,
            threshold,
            Arc::new(ScriptedSummarizer::failing()),
        ),
        _ => TieredMemory::local(
            MemoryConfig::new(l1_capacity, l2_capacity, threshold),
            Arc::new(WordCounter),
        )
        .unwrap(),
    };

    Setup {
        l1_capacity,
        l2_capacity,
        threshold,
        memory,
    }
}

fn random_role(rng: &mut StdRng) -> Role {
    match rng.gen_range(0..5) {
        0 | 1 => Role::Primary,
        2 | 3 => Role::Secondary,
        _ => Role::Unknown,
    }
}

fn random_text(rng: &mut StdRng) -> String {
    if rng.gen_range(0..20) == 0 {
        return "   ".to_string();
    }
    let words = rng.gen_range(1..=8);
    let mut text = (0..words)
        .map(|_| VOCAB[rng.gen_range(0..VOCAB.len())])
        .collect::<Vec<_>>()
        .join(" ");
    if rng.gen_bool(1.0 / 3.0) {
        text.push('?');
    }
    text
}

#[tokio::test]
async fn test_token_accounting_and_capacities_hold_after_every_add() {
    for seed in 1..=SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let Setup {
            l1_capacity,
            l2_capacity,
            threshold,
            mut memory,
        } = setup(&mut rng);

        let mut accepted = 0u64;
        let mut last_l3 = 0;

        for _ in 0..TURNS_PER_SEED {
            let role = random_role(&mut rng);
            let text = random_text(&mut rng);
            if memory.add(role, &text).await {
                accepted += 1;
            }

            let stats = memory.stats();
            assert_eq!(
                stats.total_tokens,
                stats.l1_tokens + stats.l2_tokens,
                "seed {seed}: token total drifted"
            );
            assert!(stats.l2_size <= l2_capacity, "seed {seed}: L2 over capacity");
            assert!(
                stats.l1_size <= l1_capacity || stats.total_tokens <= threshold,
                "seed {seed}: L1 over capacity while over budget"
            );
            assert_eq!(stats.total_turns, accepted, "seed {seed}: turn count");
            assert!(stats.l3_size >= last_l3, "seed {seed}: L3 shrank");
            last_l3 = stats.l3_size;

            assert!(
                memory
                    .l2_summaries()
                    .iter()
                    .all(|s| s.original_turn_count() == l1_capacity),
                "seed {seed}: batch size differs from l1_capacity"
            );
        }
    }
}

#[tokio::test]
async fn test_context_respects_budget() {
    for seed in 1..=SEEDS {
        let mut rng = StdRng::seed_from_u64(seed * 7919);
        let Setup { mut memory, .. } = setup(&mut rng);

        for _ in 0..60 {
            let role = random_role(&mut rng);
            let text = random_text(&mut rng);
            memory.add(role, &text).await;

            let budget = rng.gen_range(0..30);
            let assembled = memory.assemble_context(Some(budget));
            assert!(assembled.tokens_used <= budget, "seed {seed}: over budget");
            assert_eq!(
                assembled.turns_included + assembled.turns_dropped,
                memory.l1_turns().len()
            );

            let unbounded = memory.assemble_context(None);
            assert_eq!(unbounded.tokens_used, memory.stats().total_tokens);
            assert_eq!(unbounded.turns_dropped, 0);
            assert_eq!(unbounded.summaries_dropped, 0);
        }
    }
}

#[tokio::test]
async fn test_question_index_only_holds_student_questions() {
    for seed in 1..=SEEDS {
        let mut rng = StdRng::seed_from_u64(seed + 1000);
        let Setup { mut memory, .. } = setup(&mut rng);

        let mut student_texts = Vec::new();
        for _ in 0..TURNS_PER_SEED {
            let role = random_role(&mut rng);
            let text = random_text(&mut rng);
            if role == Role::Secondary {
                student_texts.push(text.clone());
            }
            memory.add(role, &text).await;
        }

        for entry in memory.question_index() {
            assert!(student_texts.contains(&entry.question_text));
            assert!(entry.question_text.contains('?') || entry.question_text.contains('吗'));
        }
    }
}

#[tokio::test]
async fn test_reads_are_side_effect_free() {
    let mut rng = StdRng::seed_from_u64(99);
    let Setup { mut memory, .. } = setup(&mut rng);
    for _ in 0..100 {
        let role = random_role(&mut rng);
        let text = random_text(&mut rng);
        memory.add(role, &text).await;
    }

    let before = memory.stats();
    let context = memory.get_context(Some(12));
    for _ in 0..5 {
        assert_eq!(memory.get_context(Some(12)), context);
        memory.recent_questions(10);
        memory.stats();
    }
    assert_eq!(memory.stats(), before);
}

#[tokio::test]
async fn test_clear_restores_fresh_state_and_memory_is_reusable() {
    let mut rng = StdRng::seed_from_u64(5);
    let Setup { mut memory, .. } = setup(&mut rng);
    for _ in 0..80 {
        let role = random_role(&mut rng);
        let text = random_text(&mut rng);
        memory.add(role, &text).await;
    }

    memory.clear();
    let stats = memory.stats();
    assert_eq!(stats.total_turns, 0);
    assert_eq!(stats.total_tokens, 0);
    assert_eq!((stats.l1_size, stats.l2_size, stats.l3_size), (0, 0, 0));

    assert!(memory.add(Role::Secondary, "fresh start?").await);
    assert_eq!(memory.stats().total_turns, 1);
}

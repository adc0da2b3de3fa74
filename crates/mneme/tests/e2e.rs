// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete Mneme pipeline.
//!
//! Each test creates an isolated TestHarness with a temp-dir ledger, a real
//! SQLite vector index over a mock embedder, and a mock completion adapter.

use mneme_agent::Dispatch;
use mneme_core::{MnemeError, Role};
use mneme_test_utils::TestHarness;

// ---- Plain turns ----

#[tokio::test]
async fn plain_turn_streams_and_persists() {
    let mut harness = TestHarness::builder()
        .with_mock_responses(vec!["Hello from Mneme!".to_string()])
        .build()
        .await
        .unwrap();

    let (dispatch, chunks) = harness.send("Hi there").await.unwrap();

    assert_eq!(chunks.concat(), "Hello from Mneme!");
    let Dispatch::Responded(outcome) = dispatch else {
        panic!("expected a response, got {dispatch:?}");
    };
    assert!(outcome.completed);

    let turns = harness.turns();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].id, 1);
    assert_eq!(turns[0].prompt, "Hi there");
    assert_eq!(turns[0].response, "Hello from Mneme!");
    assert_eq!(outcome.persisted, Some(turns[0].clone()));
}

#[tokio::test]
async fn consecutive_turns_share_the_session() {
    let mut harness = TestHarness::builder()
        .with_mock_responses(vec!["First".to_string(), "Second".to_string()])
        .build()
        .await
        .unwrap();

    harness.send("one").await.unwrap();
    harness.send("two").await.unwrap();

    let prompts = harness.completion.stream_prompts().await;
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("USER: one"));
    assert!(prompts[1].contains("ASSISTANT: First"));
    assert!(prompts[1].contains("USER: two"));

    // system + two user/assistant pairs
    assert_eq!(harness.dispatcher().session().len(), 5);
    let ids: Vec<u64> = harness.turns().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

// ---- Recall ----

#[tokio::test]
async fn recall_finds_seeded_history_without_persisting() {
    let mut harness = TestHarness::builder()
        .with_history(&[
            ("my dog is called rex", "rex is a fine name"),
            ("favourite colour", "blue"),
        ])
        .with_mock_responses(vec!["Your dog is Rex.".to_string()])
        .build()
        .await
        .unwrap();
    harness.completion.add_reply("[]").await;

    let (dispatch, chunks) = harness
        .send("/recall my dog is called rex rex is a fine name")
        .await
        .unwrap();

    assert_eq!(chunks.concat(), "Your dog is Rex.");
    let Dispatch::Recalled {
        recollection,
        outcome,
    } = dispatch
    else {
        panic!("expected a recall, got {dispatch:?}");
    };
    assert!(
        recollection
            .memories
            .contains(&"my dog is called rex rex is a fine name".to_string())
    );
    assert!(recollection.fused_prompt.starts_with("MEMORIES: - "));
    assert!(recollection.fused_prompt.ends_with(
        "USER PROMPT: my dog is called rex rex is a fine name"
    ));
    assert!(outcome.persisted.is_none());

    // Recall isolation: the ledger is untouched.
    assert_eq!(harness.turns().len(), 2);

    let session = harness.dispatcher().session().messages();
    let fused = &session[session.len() - 2];
    assert_eq!(fused.role, Role::User);
    assert_eq!(fused.content, recollection.fused_prompt);
}

#[tokio::test]
async fn recall_on_empty_history_reports_nothing_found() {
    let mut harness = TestHarness::builder()
        .with_mock_responses(vec!["I don't know.".to_string()])
        .build()
        .await
        .unwrap();

    let (dispatch, _) = harness.send("/recall anything at all").await.unwrap();

    let Dispatch::Recalled { recollection, .. } = dispatch else {
        panic!("expected a recall, got {dispatch:?}");
    };
    assert_eq!(
        recollection.memories,
        vec![mneme_memory::NO_RELEVANT_INFORMATION.to_string()]
    );
    assert!(harness.turns().is_empty());
}

#[tokio::test]
async fn recall_then_plain_turn_adds_exactly_one() {
    let mut harness = TestHarness::builder()
        .with_history(&[("hi", "hello")])
        .with_mock_responses(vec!["recalled".to_string(), "plain".to_string()])
        .build()
        .await
        .unwrap();

    harness.send("/recall hi").await.unwrap();
    assert_eq!(harness.turns().len(), 1);

    harness.send("and now?").await.unwrap();
    let turns = harness.turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].id, 2);
    assert_eq!(turns[1].response, "plain");
}

// ---- Forget ----

#[tokio::test]
async fn forget_removes_the_newest_turn() {
    let mut harness = TestHarness::builder()
        .with_history(&[("a", "1"), ("b", "2"), ("c", "3")])
        .build()
        .await
        .unwrap();

    let (dispatch, chunks) = harness.send("/forget").await.unwrap();

    assert!(chunks.is_empty());
    assert_eq!(
        dispatch,
        Dispatch::Forgot {
            target_id: 3,
            removed: 1
        }
    );
    let ids: Vec<u64> = harness.turns().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn forget_on_empty_history_is_a_no_op() {
    let mut harness = TestHarness::builder().build().await.unwrap();

    let (dispatch, _) = harness.send("/FORGET").await.unwrap();

    assert_eq!(
        dispatch,
        Dispatch::Forgot {
            target_id: 0,
            removed: 0
        }
    );
    assert!(harness.turns().is_empty());
}

// ---- Failures and control ----

#[tokio::test]
async fn provider_failure_commits_nothing() {
    let mut harness = TestHarness::builder().build().await.unwrap();
    harness.completion.fail_streams(true);

    let err = harness.send("hello?").await.unwrap_err();

    assert!(matches!(err, MnemeError::Provider { .. }));
    assert!(harness.turns().is_empty());
    let last = harness.dispatcher().session().last().unwrap();
    assert_eq!(last.role, Role::User);
    assert_eq!(last.content, "hello?");
}

#[tokio::test]
async fn exit_commands_touch_nothing() {
    let mut harness = TestHarness::builder().build().await.unwrap();

    assert_eq!(harness.send("/Quit").await.unwrap().0, Dispatch::Exit);
    assert_eq!(harness.send("/exit").await.unwrap().0, Dispatch::Exit);

    assert_eq!(harness.dispatcher().session().len(), 1);
    assert!(harness.completion.stream_prompts().await.is_empty());
}

#[tokio::test]
async fn blank_line_gets_an_answer() {
    let mut harness = TestHarness::builder()
        .with_mock_responses(vec!["Did you mean to say something?".to_string()])
        .build()
        .await
        .unwrap();

    let (dispatch, chunks) = harness.send("").await.unwrap();

    assert!(matches!(dispatch, Dispatch::Responded(_)));
    assert_eq!(chunks.concat(), "Did you mean to say something?");
    let turns = harness.turns();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].prompt, "");
}

#[tokio::test]
async fn custom_system_prompt_leads_the_transcript() {
    let mut harness = TestHarness::builder()
        .with_system_prompt("Remember everything.")
        .with_mock_responses(vec!["ok".to_string()])
        .build()
        .await
        .unwrap();

    harness.send("hi").await.unwrap();

    let prompts = harness.completion.stream_prompts().await;
    assert!(prompts[0].starts_with("SYSTEM: Remember everything."));
}

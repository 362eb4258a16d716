mod common;

use common::TestApp;
use serde_json::json;
use std::sync::Arc;
use tutor_service::models::Mode;
use tutor_service::prompts::{citation, CHAT_SYSTEM_PROMPT, QUIZ_SYSTEM_PROMPT};
use tutor_service::services::providers::mock::{MockFailure, MockProvider};

#[tokio::test]
async fn empty_query_is_rejected_without_upstream_call() {
    let provider = Arc::new(MockProvider::replying("unused"));
    let app = TestApp::spawn(provider.clone()).await;

    for query in ["", "   \n"] {
        let response = app.post_json("/ask", json!({ "user_query": query })).await;

        assert_eq!(response.status().as_u16(), 400);
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["error"], "user_query cannot be empty");
    }

    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn chat_question_returns_answer_verbatim() {
    let answer = "Article 21 protects life and personal liberty. What do you think \"procedure established by law\" means?";
    let provider = Arc::new(MockProvider::replying(answer));
    let app = TestApp::spawn(provider.clone()).await;

    let response = app
        .post_json("/ask", json!({ "user_query": "What is Article 21?", "mode": "chat" }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["answer"], answer);
    assert_eq!(body["citation"], citation(Mode::Chat));
    assert_eq!(body["progress_boost"], 5);
    assert_eq!(body["mode"], "chat");
    assert_eq!(body["phase"], "introducing");

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].system_prompt.starts_with(CHAT_SYSTEM_PROMPT));
    assert_eq!(calls[0].user_message, "What is Article 21?");
}

#[tokio::test]
async fn missing_mode_defaults_to_chat() {
    let provider = Arc::new(MockProvider::replying("ok"));
    let app = TestApp::spawn(provider.clone()).await;

    let response = app
        .post_json("/ask", json!({ "user_query": "Who appoints the President?" }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    assert!(provider.calls()[0].system_prompt.starts_with(CHAT_SYSTEM_PROMPT));
}

#[tokio::test]
async fn quiz_mode_uses_quiz_template_and_returns_raw_text() {
    let quiz = r#"[{"question":"Which Article abolishes untouchability?","options":["14","15","17","21"],"answer":"17","explanation":"Article 17."}]"#;
    let provider = Arc::new(MockProvider::replying(quiz));
    let app = TestApp::spawn(provider.clone()).await;

    let response = app
        .post_json("/ask", json!({ "user_query": "Fundamental Rights", "mode": "quiz" }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["answer"], quiz);
    assert_eq!(body["citation"], citation(Mode::Quiz));
    assert_eq!(body["phase"], "awaiting_answer");
    assert!(provider.calls()[0].system_prompt.starts_with(QUIZ_SYSTEM_PROMPT));
}

#[tokio::test]
async fn chat_alias_behaves_like_ask() {
    let provider = Arc::new(MockProvider::new("mock-tutor"));
    let app = TestApp::spawn(provider.clone()).await;

    let response = app
        .post_json("/chat", json!({ "user_query": "What is the Preamble?" }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["answer"], "Mock response for: What is the Preamble?");
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn history_is_prepended_to_the_question() {
    let provider = Arc::new(MockProvider::replying("ok"));
    let app = TestApp::spawn(provider.clone()).await;

    let response = app
        .post_json(
            "/ask",
            json!({
                "user_query": "Why?",
                "history": "Student: Is Article 14 absolute?\nTutor: Not quite.",
                "phase": "teaching",
                "turn": "question"
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["phase"], "teaching");

    let message = &provider.calls()[0].user_message;
    assert!(message.starts_with("Conversation so far:\nStudent: Is Article 14 absolute?"));
    assert!(message.ends_with("Student: Why?"));
}

#[tokio::test]
async fn answer_turn_moves_to_evaluating() {
    let provider = Arc::new(MockProvider::replying("Correct."));
    let app = TestApp::spawn(provider.clone()).await;

    let response = app
        .post_json(
            "/ask",
            json!({ "user_query": "17", "phase": "awaiting_answer", "turn": "answer" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["phase"], "evaluating");
}

#[tokio::test]
async fn quiz_answers_are_marked_in_prose() {
    let provider = Arc::new(MockProvider::replying("1: correct. 2: incorrect, Article 17."));
    let app = TestApp::spawn(provider.clone()).await;

    let response = app
        .post_json(
            "/ask",
            json!({
                "user_query": "1: A, 2: C",
                "mode": "quiz",
                "phase": "awaiting_answer",
                "turn": "answer"
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["phase"], "evaluating");

    let system_prompt = &provider.calls()[0].system_prompt;
    assert!(system_prompt.starts_with(QUIZ_SYSTEM_PROMPT));
    assert!(system_prompt.contains("overrides the output format above"));
}

#[tokio::test]
async fn invalid_transition_is_conflict() {
    let provider = Arc::new(MockProvider::replying("unused"));
    let app = TestApp::spawn(provider.clone()).await;

    let response = app
        .post_json(
            "/ask",
            json!({ "user_query": "That was right!", "phase": "teaching", "turn": "dispute" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 409);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn oversized_query_is_unprocessable() {
    let provider = Arc::new(MockProvider::replying("unused"));
    let app = TestApp::spawn(provider.clone()).await;

    let response = app
        .post_json("/ask", json!({ "user_query": "a".repeat(4001) }))
        .await;

    assert_eq!(response.status().as_u16(), 422);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Validation error");
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn upstream_failure_does_not_leak_provider_text() {
    let provider = Arc::new(MockProvider::failing(MockFailure::ApiError));
    let app = TestApp::spawn(provider.clone()).await;

    let response = app
        .post_json("/ask", json!({ "user_query": "What is Article 32?" }))
        .await;

    assert_eq!(response.status().as_u16(), 502);
    let text = response.text().await.expect("Failed to read body");
    assert!(text.contains("Upstream completion provider request failed"));
    assert!(!text.contains("0xdeadbeef"));
    assert!(!text.contains("upstream exploded"));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn rate_limited_upstream_is_unavailable() {
    let provider = Arc::new(MockProvider::failing(MockFailure::RateLimited));
    let app = TestApp::spawn(provider).await;

    let response = app
        .post_json("/ask", json!({ "user_query": "What is Article 32?" }))
        .await;

    assert_eq!(response.status().as_u16(), 503);
    assert_eq!(response.headers()["retry-after"], "30");
}

#[tokio::test]
async fn concurrent_requests_are_independent() {
    let provider = Arc::new(MockProvider::new("mock-tutor"));
    let app = TestApp::spawn(provider.clone()).await;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = app.client.clone();
            let url = format!("{}/ask", app.address);
            let question = format!("Question {}", i);
            tokio::spawn(async move {
                let response = client
                    .post(url)
                    .json(&json!({ "user_query": question }))
                    .send()
                    .await
                    .expect("Failed to execute request");
                (question, response)
            })
        })
        .collect();

    for handle in handles {
        let (question, response) = handle.await.expect("request task panicked");
        assert_eq!(response.status().as_u16(), 200);
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["answer"], format!("Mock response for: {}", question));
    }
    assert_eq!(provider.call_count(), 8);
}

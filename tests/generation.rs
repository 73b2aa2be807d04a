//! Generation Integration Tests
//!
//! Bounded retry and response extraction through the public generator API.

mod common;

use std::sync::Arc;

use cleantitle::core::parse_title_response;
use cleantitle::domain::ParsedTitle;
use common::{fast_generator, ScriptedModel};

#[tokio::test]
async fn test_malformed_then_valid_succeeds() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply("Rook endgame", "Sure! Here is a title.")
            .reply("Rook endgame", r#"{"tag": "Endgame", "title": "Lucena Position"}"#),
    );
    let generator = fast_generator(model.clone());

    let parsed = generator
        .generate("Rook endgame", None, "Winning with the rook")
        .await
        .unwrap();

    assert_eq!(parsed.clean_title(), "[Endgame] Lucena Position");
    assert_eq!(model.calls().len(), 2);
}

#[tokio::test]
async fn test_two_malformed_replies_give_up() {
    let model = Arc::new(
        ScriptedModel::new()
            .reply("Puzzle", "no json")
            .reply("Puzzle", "still no json")
            .reply("Puzzle", r#"{"tag": "Puzzle", "title": "Never asked"}"#),
    );
    let generator = fast_generator(model.clone());

    assert!(generator.generate("Puzzle", None, "").await.is_none());
    assert_eq!(model.calls().len(), 2);
}

#[tokio::test]
async fn test_api_error_is_retried() {
    let model = Arc::new(ScriptedModel::new().error("Gambit"));
    let generator = fast_generator(model.clone());

    let parsed = generator.generate("Gambit", None, "").await.unwrap();
    assert_eq!(parsed.title, "Clean Gambit");
    assert_eq!(model.calls().len(), 2);
}

#[tokio::test]
async fn test_object_embedded_in_prose() {
    let model = Arc::new(ScriptedModel::new().reply(
        "Top 10 traps",
        "Here you go: {\"tag\": \"Opening\", \"title\": \"Ten Traps To Know\"} Hope that helps!",
    ));
    let generator = fast_generator(model.clone());

    let parsed = generator.generate("Top 10 traps", None, "").await.unwrap();
    assert_eq!(
        parsed,
        ParsedTitle {
            tag: "Opening".to_string(),
            title: "Ten Traps To Know".to_string(),
        }
    );
    assert_eq!(model.calls().len(), 1);
}

#[test]
fn test_fallback_extraction_takes_first_object() {
    let text = "First {\"tag\": \"A\", \"title\": \"One\"} then {\"tag\": \"B\", \"title\": \"Two\"}";
    let parsed = parse_title_response(text).unwrap();
    assert_eq!(parsed.tag, "A");
    assert_eq!(parsed.title, "One");
}

#[test]
fn test_whole_body_object_preferred() {
    let text = r#"{"tag": "Analysis", "title": "Game Review"}"#;
    let parsed = parse_title_response(text).unwrap();
    assert_eq!(parsed.clean_title(), "[Analysis] Game Review");
}

#[test]
fn test_object_missing_title_is_rejected() {
    assert!(parse_title_response(r#"{"tag": "Analysis"}"#).is_err());
    assert!(parse_title_response(r#"{"tag": "", "title": "x"}"#).is_err());
}

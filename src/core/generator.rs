//! Title generation: prompt assembly, bounded retry and response parsing.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::adapters::TitleModel;
use crate::domain::ParsedTitle;

use super::retry::RetryPolicy;

/// System prompt used when no prompt file is configured
pub const DEFAULT_SYSTEM_PROMPT: &str = "You rewrite clickbait chess video titles into accurate, descriptive ones. \
Pick a short category tag (for example Opening, Game Review, Puzzle, Tournament, Speedrun, Misc) and write a plain title \
of at most 80 characters that says what the video actually covers. \
Respond with only a JSON object of the form {\"tag\": \"...\", \"title\": \"...\"}.";

/// Why a model response was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("no JSON object found in response")]
    NoObject,

    #[error("JSON object lacks a non-empty string `{0}` field")]
    MissingField(&'static str),
}

/// Settings for prompt construction
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    /// System instruction sent with every request
    pub system_prompt: String,

    /// Characters of description kept when no transcript is available
    pub description_char_limit: usize,

    /// Retry policy for invalid output and API errors
    pub retry: RetryPolicy,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            description_char_limit: 500,
            retry: RetryPolicy::default(),
        }
    }
}

/// Produces `{tag, title}` pairs from a generative model
pub struct TitleGenerator {
    model: Box<dyn TitleModel>,
    settings: GeneratorSettings,
}

impl TitleGenerator {
    /// Create a generator around a model client
    pub fn new(model: Box<dyn TitleModel>, settings: GeneratorSettings) -> Self {
        Self { model, settings }
    }

    /// Generate a title, retrying within the policy bound.
    ///
    /// Returns `None` once attempts are exhausted; never errors.
    pub async fn generate(
        &self,
        original_title: &str,
        transcript: Option<&str>,
        description: &str,
    ) -> Option<ParsedTitle> {
        let user_prompt = build_user_prompt(
            original_title,
            transcript,
            description,
            self.settings.description_char_limit,
        );
        let policy = &self.settings.retry;
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match self
                .model
                .complete(&self.settings.system_prompt, &user_prompt)
                .await
            {
                Ok(text) => match parse_title_response(&text) {
                    Ok(parsed) => {
                        debug!(attempt, tag = %parsed.tag, "Model returned a valid title");
                        return Some(parsed);
                    }
                    Err(failure) => {
                        warn!(attempt, reason = %failure, response = %text, "Invalid response format");
                    }
                },
                Err(e) => {
                    warn!(attempt, model = %self.model.name(), error = %e, "Model API error");
                }
            }

            if !policy.should_retry(attempt) {
                return None;
            }

            let delay = policy.delay_for_attempt(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Build the user message for one item
pub fn build_user_prompt(
    original_title: &str,
    transcript: Option<&str>,
    description: &str,
    description_char_limit: usize,
) -> String {
    match transcript {
        Some(transcript) => format!(
            "Original title: {}\n\nTranscript excerpt:\n{}\n\nGenerate the clean title JSON.",
            original_title, transcript
        ),
        None => {
            let description = if description.trim().is_empty() {
                "No description available.".to_string()
            } else {
                description.chars().take(description_char_limit).collect()
            };
            format!(
                "Original title: {}\n\nDescription: {}\n\nNote: No transcript available for this video. \
Generate the best title you can from the original title and description.\n\nGenerate the clean title JSON.",
                original_title, description
            )
        }
    }
}

fn embedded_object_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{[^}]+\}").expect("object pattern is valid"))
}

/// Parse a model reply into a validated title.
///
/// The whole body is tried as a JSON object first; only if that fails is the
/// first `{...}` substring extracted and parsed.
pub fn parse_title_response(text: &str) -> Result<ParsedTitle, ParseFailure> {
    let body = text.trim();

    if let Ok(object) = serde_json::from_str::<Map<String, Value>>(body) {
        return validate(&object);
    }

    let candidate = embedded_object_pattern()
        .find(body)
        .ok_or(ParseFailure::NoObject)?;

    let object = serde_json::from_str::<Map<String, Value>>(candidate.as_str())
        .map_err(|_| ParseFailure::NoObject)?;
    validate(&object)
}

fn validate(object: &Map<String, Value>) -> Result<ParsedTitle, ParseFailure> {
    let field = |name: &'static str| -> Result<String, ParseFailure> {
        object
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or(ParseFailure::MissingField(name))
    };

    Ok(ParsedTitle {
        tag: field("tag")?,
        title: field("title")?,
    })
}

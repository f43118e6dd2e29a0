//! AI enrichment client, the adapter between the catalog and the LLM.
//!
//! `GameAi` is the seam: the enrichment worker and the FAQ service depend on
//! the trait, not on the concrete client, so tests can script responses.
//! `AppState` carries it as `Arc<dyn GameAi>`.

pub mod prompts;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::llm_client::{ChatMessage, LlmClient, LlmError};

/// Failure of an AI call, distinct from "successful but empty" content
/// (an empty summary on a parsed response is the caller's concern).
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI client error: {0}")]
    Client(String),

    #[error("AI returned empty content")]
    EmptyResponse,

    #[error("AI returned an unparseable response: {0}")]
    Parse(String),
}

impl From<LlmError> for AiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::EmptyContent => AiError::EmptyResponse,
            LlmError::Parse(e) => AiError::Parse(e.to_string()),
            other => AiError::Client(other.to_string()),
        }
    }
}

/// Structured game data returned by the model. Field names are parsed
/// leniently: camelCase as prompted, with snake_case accepted as a fallback.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAiData {
    pub complexity: f64,
    #[serde(alias = "time_to_setup_minutes")]
    pub time_to_setup_minutes: i32,
    #[serde(default, alias = "average_playtime_minutes")]
    pub average_playtime_minutes: Option<i32>,
    pub summary: String,
    #[serde(default, alias = "game_type")]
    pub game_type: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default, alias = "player_interaction_level")]
    pub player_interaction_level: Option<String>,
    #[serde(default, alias = "skill_requirements")]
    pub skill_requirements: Option<String>,
    #[serde(default, alias = "randomness_level")]
    pub randomness_level: Option<String>,
    #[serde(default, alias = "complexity_tier")]
    pub complexity_tier: Option<String>,
    #[serde(default, alias = "target_audience")]
    pub target_audience: Option<String>,
    #[serde(default, alias = "replayability_score")]
    pub replayability_score: Option<i32>,
    #[serde(default, alias = "learning_curve")]
    pub learning_curve: Option<String>,
    #[serde(default, alias = "typical_play_style")]
    pub typical_play_style: Option<String>,
}

impl GameAiData {
    /// True when any classification field is present, i.e. there is something
    /// to write into the metadata record.
    pub fn has_classification(&self) -> bool {
        self.game_type.is_some()
            || self.theme.is_some()
            || self.player_interaction_level.is_some()
            || self.skill_requirements.is_some()
            || self.randomness_level.is_some()
            || self.complexity_tier.is_some()
            || self.target_audience.is_some()
            || self.replayability_score.is_some()
            || self.learning_curve.is_some()
            || self.typical_play_style.is_some()
    }
}

/// The AI enrichment client contract.
#[async_trait]
pub trait GameAi: Send + Sync {
    /// Generates structured metadata for a game by name.
    async fn generate_game_data(&self, game_name: &str) -> Result<GameAiData, AiError>;

    /// Answers a free-form question about a game, given prior conversation turns.
    async fn answer_question(
        &self,
        game_name: &str,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<String, AiError>;
}

/// Production implementation over the shared [`LlmClient`].
pub struct LlmGameAi {
    llm: LlmClient,
}

impl LlmGameAi {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl GameAi for LlmGameAi {
    async fn generate_game_data(&self, game_name: &str) -> Result<GameAiData, AiError> {
        info!("Generating AI data for board game: {game_name}");
        let prompt = prompts::game_data_prompt(game_name);
        let data: GameAiData = self.llm.call_json(&prompt, prompts::GAME_DATA_SYSTEM).await?;
        Ok(data)
    }

    async fn answer_question(
        &self,
        game_name: &str,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<String, AiError> {
        let system = prompts::faq_system(game_name);
        let mut messages = history.to_vec();
        messages.push(ChatMessage::user(question));

        let response = self.llm.chat(&system, &messages).await?;
        let answer = response.text().ok_or(AiError::EmptyResponse)?.trim();
        if answer.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_fields() {
        let raw = r#"{
            "complexity": 3.5,
            "timeToSetupMinutes": 15,
            "averagePlaytimeMinutes": 90,
            "summary": "A game.",
            "gameType": "Strategy",
            "complexityTier": "Heavy"
        }"#;
        let data: GameAiData = serde_json::from_str(raw).unwrap();
        assert_eq!(data.time_to_setup_minutes, 15);
        assert_eq!(data.average_playtime_minutes, Some(90));
        assert_eq!(data.game_type.as_deref(), Some("Strategy"));
        assert!(data.has_classification());
    }

    #[test]
    fn accepts_snake_case_aliases() {
        let raw = r#"{
            "complexity": 2.0,
            "time_to_setup_minutes": 5,
            "summary": "A lighter game."
        }"#;
        let data: GameAiData = serde_json::from_str(raw).unwrap();
        assert_eq!(data.time_to_setup_minutes, 5);
        assert!(!data.has_classification());
    }

    #[test]
    fn missing_required_field_is_a_parse_error() {
        let raw = r#"{"timeToSetupMinutes": 5, "summary": "No complexity."}"#;
        assert!(serde_json::from_str::<GameAiData>(raw).is_err());
    }
}

//! Prompt builders for the board-game AI adapter.
//! Each module that needs LLM calls keeps its prompts alongside it.

/// System prompt for structured game-data generation.
pub const GAME_DATA_SYSTEM: &str = "You are a board game expert. \
    Provide accurate, concise information about board games in JSON format. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Builds the game-data prompt for a single game.
pub fn game_data_prompt(game_name: &str) -> String {
    format!(
        r#"Analyze the board game "{game_name}" and provide the following information as a JSON object:
{{
  "complexity": <a decimal from 1.0 to 5.0, where 1.0 is very simple and 5.0 is very complex>,
  "timeToSetupMinutes": <an integer, estimated minutes to set up the game>,
  "averagePlaytimeMinutes": <an integer, typical play time in minutes>,
  "summary": "<a brief 2-3 sentence summary of the game, its mechanics, and what makes it interesting>",
  "gameType": "<e.g. Strategy, Party, Cooperative>",
  "theme": "<e.g. Fantasy, Sci-fi, Horror>",
  "playerInteractionLevel": "<Low, Medium or High>",
  "skillRequirements": "<comma-separated, e.g. Planning, Negotiation, Bluffing>",
  "randomnessLevel": "<Low, Medium or High>",
  "complexityTier": "<Light, Medium or Heavy>",
  "targetAudience": "<e.g. Casual players, Families, Hardcore gamers>",
  "replayabilityScore": <an integer from 1 to 10>,
  "learningCurve": "<Easy, Moderate or Steep>",
  "typicalPlayStyle": "<Competitive, Cooperative, Team-based or Solo-friendly>"
}}

Only return valid JSON, no additional text or markdown formatting."#
    )
}

/// System prompt for FAQ answers about a specific game.
pub fn faq_system(game_name: &str) -> String {
    format!(
        "You are a helpful board game expert. Answer questions about the board game \
         \"{game_name}\" in a clear, concise, and friendly manner. \
         Keep responses to 2-3 paragraphs maximum."
    )
}

//! AI-backed FAQ: cached answers per (game, question) plus a per-user
//! conversation thread per game for follow-up questions.
//!
//! AI failures here degrade to a friendly fallback answer instead of an
//! error response.

pub mod handlers;

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ai::GameAi;
use crate::errors::AppError;
use crate::llm_client::ChatMessage;
use crate::models::faq::{ConversationMessageRow, ConversationRow, FaqCacheRow};
use crate::models::game::BoardGameRow;

const FALLBACK_ANSWER: &str =
    "Sorry, I couldn't generate an answer at this time. Please try again later.";

/// Questions offered as one-click prompts in the UI.
pub fn common_questions() -> &'static [&'static str] {
    &[
        "Explain the setup to me",
        "What type of game is this?",
        "How long does it take to play?",
        "How many players is it best for?",
        "What is the complexity level?",
        "What are the main strategies or tips?",
        "Is this game suitable for children?",
        "Can you summarize the rules?",
        "What expansions are available?",
        "How do I win the game?",
    ]
}

#[derive(Debug, Serialize)]
pub struct FaqAnswer {
    pub answer: String,
    /// Absent when the answer is the AI-failure fallback and no conversation
    /// was started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<Uuid>,
}

/// Answers a question about a game, serving from the cache when the same
/// question was asked before. Both turns are appended to the user's
/// conversation with this game.
pub async fn get_answer(
    pool: &PgPool,
    ai: &dyn GameAi,
    game: &BoardGameRow,
    question: &str,
    user_id: &str,
) -> Result<FaqAnswer, AppError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("Question cannot be empty".to_string()));
    }

    let cached: Option<FaqCacheRow> = sqlx::query_as(
        "SELECT * FROM board_game_faq_cache WHERE board_game_id = $1 AND question = $2",
    )
    .bind(game.id)
    .bind(question)
    .fetch_optional(pool)
    .await?;

    if let Some(cached) = cached {
        info!("Returning cached FAQ answer for game {}", game.name);
        let conversation = get_or_create_conversation(pool, game.id, user_id).await?;
        append_turns(pool, conversation.id, question, &cached.answer).await?;
        return Ok(FaqAnswer {
            answer: cached.answer,
            conversation_id: Some(conversation.id),
        });
    }

    let answer = match ai.answer_question(&game.name, question, &[]).await {
        Ok(answer) => answer,
        Err(e) => {
            warn!("FAQ answer generation failed for game {}: {e}", game.name);
            return Ok(FaqAnswer {
                answer: FALLBACK_ANSWER.to_string(),
                conversation_id: None,
            });
        }
    };

    sqlx::query(
        "INSERT INTO board_game_faq_cache
             (id, board_game_id, question, answer, created_at, last_updated_at)
         VALUES ($1, $2, $3, $4, now(), now())
         ON CONFLICT (board_game_id, question) DO UPDATE SET
             answer = EXCLUDED.answer,
             last_updated_at = now()",
    )
    .bind(Uuid::new_v4())
    .bind(game.id)
    .bind(question)
    .bind(&answer)
    .execute(pool)
    .await?;

    let conversation = get_or_create_conversation(pool, game.id, user_id).await?;
    append_turns(pool, conversation.id, question, &answer).await?;

    Ok(FaqAnswer {
        answer,
        conversation_id: Some(conversation.id),
    })
}

/// Continues an existing conversation, replaying its history to the model.
pub async fn follow_up(
    pool: &PgPool,
    ai: &dyn GameAi,
    game: &BoardGameRow,
    conversation_id: Uuid,
    question: &str,
    user_id: &str,
) -> Result<String, AppError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("Question cannot be empty".to_string()));
    }

    let conversation: Option<ConversationRow> = sqlx::query_as(
        "SELECT * FROM board_game_conversations WHERE id = $1 AND user_id = $2",
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    let conversation = conversation.ok_or_else(|| {
        AppError::NotFound(format!("Conversation {conversation_id} not found"))
    })?;

    let history: Vec<ChatMessage> = conversation_history(pool, conversation.id)
        .await?
        .into_iter()
        .map(|m| match m.role.as_str() {
            "assistant" => ChatMessage::assistant(m.content),
            _ => ChatMessage::user(m.content),
        })
        .collect();

    let answer = match ai.answer_question(&game.name, question, &history).await {
        Ok(answer) => answer,
        Err(e) => {
            warn!(
                "FAQ follow-up generation failed for conversation {conversation_id}: {e}"
            );
            return Ok(FALLBACK_ANSWER.to_string());
        }
    };

    append_turns(pool, conversation.id, question, &answer).await?;
    sqlx::query("UPDATE board_game_conversations SET last_updated_at = now() WHERE id = $1")
        .bind(conversation.id)
        .execute(pool)
        .await?;

    Ok(answer)
}

pub async fn conversation_history(
    pool: &PgPool,
    conversation_id: Uuid,
) -> Result<Vec<ConversationMessageRow>, AppError> {
    let messages = sqlx::query_as(
        "SELECT * FROM board_game_conversation_messages
         WHERE conversation_id = $1
         ORDER BY created_at",
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;
    Ok(messages)
}

pub async fn get_conversation(
    pool: &PgPool,
    conversation_id: Uuid,
) -> Result<ConversationRow, AppError> {
    let conversation: Option<ConversationRow> =
        sqlx::query_as("SELECT * FROM board_game_conversations WHERE id = $1")
            .bind(conversation_id)
            .fetch_optional(pool)
            .await?;
    conversation
        .ok_or_else(|| AppError::NotFound(format!("Conversation {conversation_id} not found")))
}

async fn get_or_create_conversation(
    pool: &PgPool,
    board_game_id: Uuid,
    user_id: &str,
) -> Result<ConversationRow, AppError> {
    sqlx::query(
        "INSERT INTO board_game_conversations
             (id, board_game_id, user_id, created_at, last_updated_at)
         VALUES ($1, $2, $3, now(), now())
         ON CONFLICT (board_game_id, user_id) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(board_game_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    let conversation = sqlx::query_as(
        "SELECT * FROM board_game_conversations WHERE board_game_id = $1 AND user_id = $2",
    )
    .bind(board_game_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(conversation)
}

async fn append_turns(
    pool: &PgPool,
    conversation_id: Uuid,
    question: &str,
    answer: &str,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    for (role, content) in [("user", question), ("assistant", answer)] {
        sqlx::query(
            "INSERT INTO board_game_conversation_messages
                 (id, conversation_id, role, content, created_at)
             VALUES ($1, $2, $3, $4, now())",
        )
        .bind(Uuid::new_v4())
        .bind(conversation_id)
        .bind(role)
        .bind(content)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_questions_cover_the_basics() {
        let questions = common_questions();
        assert_eq!(questions.len(), 10);
        assert!(questions.contains(&"How do I win the game?"));
    }

    #[test]
    fn fallback_answer_omits_the_conversation_id() {
        let fallback = FaqAnswer {
            answer: FALLBACK_ANSWER.to_string(),
            conversation_id: None,
        };
        let json = serde_json::to_value(&fallback).unwrap();
        assert!(json.get("conversation_id").is_none());

        let real = FaqAnswer {
            answer: "It plays in about an hour.".to_string(),
            conversation_id: Some(Uuid::new_v4()),
        };
        let json = serde_json::to_value(&real).unwrap();
        assert!(json.get("conversation_id").is_some());
    }
}

//! Game-night sessions: scheduling, registrations, attendees, and
//! per-session game interest.

pub mod handlers;

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::games;
use crate::models::session::{RegistrationRow, SessionRow};

/// Sessions cannot be scheduled in the past.
pub fn validate_session_date(date: NaiveDate, today: NaiveDate) -> Result<(), AppError> {
    if date < today {
        return Err(AppError::Validation(
            "Cannot schedule sessions in the past".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_session(pool: &PgPool, date: NaiveDate) -> Result<SessionRow, AppError> {
    validate_session_date(date, Utc::now().date_naive())?;

    // At most one non-cancelled session per day.
    let existing: Option<SessionRow> = sqlx::query_as(
        "SELECT * FROM sessions WHERE session_date = $1 AND NOT is_cancelled",
    )
    .bind(date)
    .fetch_optional(pool)
    .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "A session already exists on {date}"
        )));
    }

    let session = sqlx::query_as(
        "INSERT INTO sessions (id, session_date, is_cancelled, created_at)
         VALUES ($1, $2, FALSE, now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(date)
    .fetch_one(pool)
    .await?;

    Ok(session)
}

pub async fn get_session(pool: &PgPool, id: Uuid) -> Result<SessionRow, AppError> {
    let session: Option<SessionRow> = sqlx::query_as("SELECT * FROM sessions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    session.ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

pub async fn list_sessions(pool: &PgPool) -> Result<Vec<SessionRow>, AppError> {
    let sessions =
        sqlx::query_as("SELECT * FROM sessions WHERE NOT is_cancelled ORDER BY session_date")
            .fetch_all(pool)
            .await?;
    Ok(sessions)
}

pub async fn upcoming_sessions(pool: &PgPool) -> Result<Vec<SessionRow>, AppError> {
    let sessions = sqlx::query_as(
        "SELECT * FROM sessions
         WHERE NOT is_cancelled AND session_date >= $1
         ORDER BY session_date",
    )
    .bind(Utc::now().date_naive())
    .fetch_all(pool)
    .await?;
    Ok(sessions)
}

pub async fn cancel_session(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE sessions SET is_cancelled = TRUE WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Session {id} not found")));
    }
    Ok(())
}

/// Registers a user for a session with the games they want to play.
/// Games are created on first reference by name.
pub async fn register(
    pool: &PgPool,
    session_id: Uuid,
    user_id: &str,
    user_display_name: &str,
    food_requirements: Option<String>,
    game_names: &[String],
) -> Result<RegistrationRow, AppError> {
    let session = get_session(pool, session_id).await?;
    if session.is_cancelled {
        return Err(AppError::Conflict(
            "Cannot register for a cancelled session".to_string(),
        ));
    }

    let mut game_ids = Vec::with_capacity(game_names.len());
    for name in game_names {
        let game = games::get_or_create_by_name(pool, name).await?;
        game_ids.push(game.id);
    }

    let mut tx = pool.begin().await?;

    let registration: RegistrationRow = sqlx::query_as(
        "INSERT INTO registrations
             (id, session_id, user_id, user_display_name, food_requirements, created_at)
         VALUES ($1, $2, $3, $4, $5, now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(session_id)
    .bind(user_id)
    .bind(user_display_name)
    .bind(&food_requirements)
    .fetch_one(&mut *tx)
    .await?;

    for game_id in game_ids {
        sqlx::query(
            "INSERT INTO game_registrations (id, registration_id, board_game_id)
             VALUES ($1, $2, $3)",
        )
        .bind(Uuid::new_v4())
        .bind(registration.id)
        .bind(game_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(registration)
}

pub async fn attendees(pool: &PgPool, session_id: Uuid) -> Result<Vec<RegistrationRow>, AppError> {
    get_session(pool, session_id).await?;

    let rows = sqlx::query_as(
        "SELECT * FROM registrations WHERE session_id = $1 ORDER BY created_at",
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Records interest in playing a game at a session. Re-recording the same
/// interest is a no-op.
pub async fn record_interest(
    pool: &PgPool,
    session_id: Uuid,
    board_game_id: Uuid,
    user_id: &str,
) -> Result<(), AppError> {
    get_session(pool, session_id).await?;
    games::get_game(pool, board_game_id).await?;

    sqlx::query(
        "INSERT INTO session_game_interests (id, session_id, board_game_id, user_id, created_at)
         VALUES ($1, $2, $3, $4, now())
         ON CONFLICT (session_id, board_game_id, user_id) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(session_id)
    .bind(board_game_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(Debug, Serialize)]
pub struct GameHistoryItem {
    pub board_game_id: Uuid,
    pub game_name: String,
    pub user_rating: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct SessionHistoryItem {
    pub session: SessionRow,
    pub attendee_count: i64,
    pub games: Vec<GameHistoryItem>,
}

/// The user's view of past sessions, most recent first, with attendee
/// counts, the games played, and the user's own ratings. Optional date
/// bounds; an optional game-name filter drops sessions where no game
/// matched.
pub async fn session_history(
    pool: &PgPool,
    user_id: &str,
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
    game_name_filter: Option<&str>,
) -> Result<Vec<SessionHistoryItem>, AppError> {
    let sessions: Vec<SessionRow> = sqlx::query_as(
        "SELECT * FROM sessions
         WHERE NOT is_cancelled
           AND session_date < $1
           AND ($2::date IS NULL OR session_date >= $2)
           AND ($3::date IS NULL OR session_date <= $3)
         ORDER BY session_date DESC",
    )
    .bind(Utc::now().date_naive())
    .bind(from_date)
    .bind(to_date)
    .fetch_all(pool)
    .await?;

    if sessions.is_empty() {
        return Ok(Vec::new());
    }
    let session_ids: Vec<Uuid> = sessions.iter().map(|s| s.id).collect();

    let attendee_counts: HashMap<Uuid, i64> = sqlx::query_as::<_, (Uuid, i64)>(
        "SELECT session_id, COUNT(DISTINCT user_id)
         FROM registrations
         WHERE session_id = ANY($1)
         GROUP BY session_id",
    )
    .bind(&session_ids)
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    let session_games: Vec<(Uuid, Uuid, String)> = sqlx::query_as(
        "SELECT DISTINCT r.session_id, gr.board_game_id, g.name
         FROM game_registrations gr
         JOIN registrations r ON r.id = gr.registration_id
         JOIN board_games g ON g.id = gr.board_game_id
         WHERE r.session_id = ANY($1)",
    )
    .bind(&session_ids)
    .fetch_all(pool)
    .await?;

    let user_ratings: HashMap<(Uuid, Uuid), i32> = sqlx::query_as::<_, (Uuid, Uuid, i32)>(
        "SELECT session_id, board_game_id, rating
         FROM game_ratings
         WHERE user_id = $1 AND session_id = ANY($2)",
    )
    .bind(user_id)
    .bind(&session_ids)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|(session_id, game_id, rating)| ((session_id, game_id), rating))
    .collect();

    Ok(assemble_history(
        sessions,
        &attendee_counts,
        &session_games,
        &user_ratings,
        game_name_filter,
    ))
}

/// Joins the per-session pieces into history items. Pure so the filter and
/// ordering rules are testable without a database.
fn assemble_history(
    sessions: Vec<SessionRow>,
    attendee_counts: &HashMap<Uuid, i64>,
    session_games: &[(Uuid, Uuid, String)],
    user_ratings: &HashMap<(Uuid, Uuid), i32>,
    game_name_filter: Option<&str>,
) -> Vec<SessionHistoryItem> {
    let filter = game_name_filter
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_lowercase);

    let mut items = Vec::with_capacity(sessions.len());
    for session in sessions {
        let mut games: Vec<GameHistoryItem> = session_games
            .iter()
            .filter(|(session_id, _, _)| *session_id == session.id)
            .filter(|(_, _, name)| {
                filter
                    .as_deref()
                    .map_or(true, |f| name.to_lowercase().contains(f))
            })
            .map(|(session_id, game_id, name)| GameHistoryItem {
                board_game_id: *game_id,
                game_name: name.clone(),
                user_rating: user_ratings.get(&(*session_id, *game_id)).copied(),
            })
            .collect();
        games.sort_by(|a, b| a.game_name.cmp(&b.game_name));

        // With a filter active, sessions where nothing matched are dropped.
        if games.is_empty() && filter.is_some() {
            continue;
        }

        items.push(SessionHistoryItem {
            attendee_count: attendee_counts.get(&session.id).copied().unwrap_or(0),
            games,
            session,
        });
    }
    items
}

#[derive(Debug, Serialize)]
pub struct GameInterestCount {
    pub board_game_id: Uuid,
    pub interested_count: i64,
}

pub async fn interest_for_session(
    pool: &PgPool,
    session_id: Uuid,
) -> Result<Vec<GameInterestCount>, AppError> {
    let rows: Vec<(Uuid, i64)> = sqlx::query_as(
        "SELECT board_game_id, COUNT(*)
         FROM session_game_interests
         WHERE session_id = $1
         GROUP BY board_game_id
         ORDER BY COUNT(*) DESC",
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(board_game_id, interested_count)| GameInterestCount {
            board_game_id,
            interested_count,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_past_dates() {
        let today = day(2026, 8, 23);
        assert!(matches!(
            validate_session_date(day(2026, 8, 22), today),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn accepts_today_and_future_dates() {
        let today = day(2026, 8, 23);
        assert!(validate_session_date(today, today).is_ok());
        assert!(validate_session_date(day(2026, 9, 1), today).is_ok());
    }

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn session(n: u128, date: NaiveDate) -> SessionRow {
        SessionRow {
            id: id(n),
            session_date: date,
            is_cancelled: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn history_attaches_counts_ratings_and_sorts_games_by_name() {
        let sessions = vec![session(1, day(2026, 8, 1))];
        let attendee_counts: HashMap<Uuid, i64> = [(id(1), 4i64)].into_iter().collect();
        let session_games = vec![
            (id(1), id(20), "Wingspan".to_string()),
            (id(1), id(21), "Azul".to_string()),
        ];
        let user_ratings: HashMap<(Uuid, Uuid), i32> =
            [((id(1), id(20)), 5)].into_iter().collect();

        let items = assemble_history(sessions, &attendee_counts, &session_games, &user_ratings, None);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].attendee_count, 4);
        assert_eq!(items[0].games[0].game_name, "Azul");
        assert_eq!(items[0].games[0].user_rating, None);
        assert_eq!(items[0].games[1].game_name, "Wingspan");
        assert_eq!(items[0].games[1].user_rating, Some(5));
    }

    #[test]
    fn history_filter_matches_case_insensitively_and_drops_empty_sessions() {
        let sessions = vec![session(1, day(2026, 8, 1)), session(2, day(2026, 7, 1))];
        let session_games = vec![
            (id(1), id(20), "Terraforming Mars".to_string()),
            (id(2), id(21), "Azul".to_string()),
        ];

        let items = assemble_history(
            sessions,
            &HashMap::new(),
            &session_games,
            &HashMap::new(),
            Some("MARS"),
        );

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].session.id, id(1));
        assert_eq!(items[0].games.len(), 1);
    }

    #[test]
    fn history_without_filter_keeps_sessions_that_had_no_games() {
        let sessions = vec![session(1, day(2026, 8, 1))];

        let with_blank_filter = assemble_history(
            sessions,
            &HashMap::new(),
            &[],
            &HashMap::new(),
            Some("   "),
        );

        assert_eq!(with_blank_filter.len(), 1);
        assert_eq!(with_blank_filter[0].attendee_count, 0);
        assert!(with_blank_filter[0].games.is_empty());
    }
}

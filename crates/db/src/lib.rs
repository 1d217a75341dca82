#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod error;

use alloc::boxed::Box;
use model::quiz::{Quiz, Submission, TRENDING_IMPRESSIONS};
use model::response::{Answer, Response};
use tokio_postgres::error::SqlState;
use tokio_postgres::types::Json;

pub use futures_util::{TryStream, TryStreamExt};
pub use model;
pub use tokio_postgres::{tls::NoTls, Client, Config};

// Bound as a statement parameter so the trending cutoff cannot drift
// from the model constant. Compared against the BIGINT impressions column.
const TRENDING_THRESHOLD: i64 = TRENDING_IMPRESSIONS as i64;

pub struct Database(Client);

impl From<Client> for Database {
    fn from(client: Client) -> Self {
        Self(client)
    }
}

fn deserialize_quiz_from_row(row: tokio_postgres::Row) -> error::Result<Quiz> {
    let id = row.try_get("id").map_err(|_| error::Error::Fatal)?;
    let creator = row.try_get("creator").map_err(|_| error::Error::Fatal)?;
    let title = row.try_get("title").map_err(|_| error::Error::Fatal)?;
    let structure: &str = row.try_get("structure").map_err(|_| error::Error::Fatal)?;
    let quiz_structure = structure.parse().map_err(|_| error::Error::Fatal)?;
    let category: &str = row.try_get("category").map_err(|_| error::Error::Fatal)?;
    let quiz_category = category.parse().map_err(|_| error::Error::Fatal)?;
    let Json(questions) = row.try_get("questions").map_err(|_| error::Error::Fatal)?;
    let impressions: i64 = row.try_get("impressions").map_err(|_| error::Error::Fatal)?;
    let impressions = u64::try_from(impressions).map_err(|_| error::Error::Fatal)?;
    let is_trending = row.try_get("is_trending").map_err(|_| error::Error::Fatal)?;
    let created_at = row.try_get("created_at").map_err(|_| error::Error::Fatal)?;
    Ok(Quiz {
        id,
        creator,
        impressions,
        is_trending,
        created_at,
        raw: Submission { title, questions, quiz_structure, quiz_category },
    })
}

fn deserialize_response_from_row(row: tokio_postgres::Row) -> error::Result<Response> {
    let id = row.try_get("id").map_err(|_| error::Error::Fatal)?;
    let quiz = row.try_get("quiz").map_err(|_| error::Error::Fatal)?;
    let user = row.try_get("responder").map_err(|_| error::Error::Fatal)?;
    let Json(answers) = row.try_get("answers").map_err(|_| error::Error::Fatal)?;
    let submitted_at = row.try_get("submitted_at").map_err(|_| error::Error::Fatal)?;
    Ok(Response { id, quiz, user, answers, submitted_at })
}

fn quiz_constraint_error(err: tokio_postgres::Error) -> error::Error {
    let err = match err.as_db_error() {
        Some(err) => err,
        _ => return error::Error::Fatal,
    };
    let constraint = match err.constraint() {
        Some(constraint) => constraint,
        _ => return error::Error::Fatal,
    };
    match (err.code(), constraint) {
        // More than `MAX_QUESTIONS` embedded questions.
        (&SqlState::CHECK_VIOLATION, "quizzes_questions_check") => error::Error::TooMany,
        (&SqlState::CHECK_VIOLATION, "quizzes_title_check") => error::Error::BadInput,
        (&SqlState::STRING_DATA_RIGHT_TRUNCATION, _) => error::Error::BadInput,
        _ => error::Error::Fatal,
    }
}

impl Database {
    pub async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> error::Result<i64> {
        let err = match self
            .0
            .query_opt(
                "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
                &[&username, &email, &password_hash],
            )
            .await
        {
            Ok(row) => {
                let row = row.ok_or(error::Error::Fatal)?;
                return row.try_get("id").map_err(|_| error::Error::Fatal);
            }
            Err(err) => err,
        };

        let err = err.as_db_error().ok_or(error::Error::Fatal)?;
        Err(if *err.code() == SqlState::UNIQUE_VIOLATION {
            error::Error::AlreadyExists
        } else {
            error::Error::Fatal
        })
    }

    /// Looks up the ID and password digest registered for an email address.
    pub async fn get_user_by_email(&self, email: &str) -> error::Result<(i64, Box<str>)> {
        let row = self
            .0
            .query_opt("SELECT id, password_hash FROM users WHERE email = $1", &[&email])
            .await
            .map_err(|_| error::Error::Fatal)?
            .ok_or(error::Error::NotFound)?;
        let id = row.try_get("id").map_err(|_| error::Error::Fatal)?;
        let hash = row.try_get("password_hash").map_err(|_| error::Error::Fatal)?;
        Ok((id, hash))
    }

    pub async fn create_quiz(&self, creator: i64, sub: &Submission) -> error::Result<Quiz> {
        let structure = sub.quiz_structure.as_str();
        let category = sub.quiz_category.as_str();
        let questions = Json(&sub.questions);
        let row = match self
            .0
            .query_opt(
                "INSERT INTO quizzes (creator, title, structure, category, questions) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, creator, title, structure, category, questions, impressions, is_trending, created_at",
                &[&creator, &sub.title, &structure, &category, &questions],
            )
            .await
        {
            Ok(row) => row.ok_or(error::Error::Fatal)?,
            Err(err) => return Err(quiz_constraint_error(err)),
        };
        deserialize_quiz_from_row(row)
    }

    pub async fn get_quiz(&self, quiz: i64) -> error::Result<Quiz> {
        let row = self
            .0
            .query_opt(
                "SELECT id, creator, title, structure, category, questions, impressions, is_trending, created_at \
                 FROM quizzes WHERE id = $1",
                &[&quiz],
            )
            .await
            .map_err(|_| error::Error::Fatal)?
            .ok_or(error::Error::NotFound)?;
        deserialize_quiz_from_row(row)
    }

    pub async fn get_quizzes_by_creator(
        &self,
        creator: i64,
    ) -> error::Result<impl TryStream<Ok = Quiz, Error = error::Error> + '_> {
        Ok(self
            .0
            .query_raw(
                "SELECT id, creator, title, structure, category, questions, impressions, is_trending, created_at \
                 FROM quizzes WHERE creator = $1 ORDER BY created_at",
                &[&creator],
            )
            .await
            .map_err(|_| error::Error::Fatal)?
            .map_err(|_| error::Error::Fatal)
            .and_then(|row| core::future::ready(deserialize_quiz_from_row(row))))
    }

    /// Replaces the quiz definition in place. Impressions survive the update,
    /// and the trending flag is re-derived from them.
    pub async fn update_quiz(&self, quiz: i64, sub: &Submission) -> error::Result<Quiz> {
        let structure = sub.quiz_structure.as_str();
        let category = sub.quiz_category.as_str();
        let questions = Json(&sub.questions);
        let row = match self
            .0
            .query_opt(
                "UPDATE quizzes SET title = $2, structure = $3, category = $4, questions = $5, \
                 is_trending = impressions > $6 \
                 WHERE id = $1 \
                 RETURNING id, creator, title, structure, category, questions, impressions, is_trending, created_at",
                &[&quiz, &sub.title, &structure, &category, &questions, &TRENDING_THRESHOLD],
            )
            .await
        {
            Ok(row) => row.ok_or(error::Error::NotFound)?,
            Err(err) => return Err(quiz_constraint_error(err)),
        };
        deserialize_quiz_from_row(row)
    }

    pub async fn delete_quiz(&self, quiz: i64) -> error::Result<()> {
        match self.0.execute("DELETE FROM quizzes WHERE id = $1", &[&quiz]).await {
            Ok(1) => Ok(()),
            Ok(0) => Err(error::Error::NotFound),
            _ => Err(error::Error::Fatal),
        }
    }

    /// Bumps the impression counter and re-derives the trending flag in a
    /// single statement. Concurrent submissions serialize on the row, so no
    /// increment is lost. Returns whether the quiz still exists.
    pub async fn add_impression(&self, quiz: i64) -> error::Result<bool> {
        match self
            .0
            .execute(
                "UPDATE quizzes SET impressions = impressions + 1, is_trending = impressions + 1 > $2 WHERE id = $1",
                &[&quiz, &TRENDING_THRESHOLD],
            )
            .await
        {
            Ok(1) => Ok(true),
            Ok(0) => Ok(false),
            _ => Err(error::Error::Fatal),
        }
    }

    pub async fn create_response(&self, quiz: i64, user: Option<i64>, answers: &[Answer]) -> error::Result<Response> {
        let answers = Json(answers);
        let row = self
            .0
            .query_opt(
                "INSERT INTO responses (quiz, responder, answers) VALUES ($1, $2, $3) \
                 RETURNING id, quiz, responder, answers, submitted_at",
                &[&quiz, &user, &answers],
            )
            .await
            .map_err(|_| error::Error::Fatal)?
            .ok_or(error::Error::Fatal)?;
        deserialize_response_from_row(row)
    }

    pub async fn get_responses_by_quiz(
        &self,
        quiz: i64,
    ) -> error::Result<impl TryStream<Ok = Response, Error = error::Error> + '_> {
        Ok(self
            .0
            .query_raw(
                "SELECT id, quiz, responder, answers, submitted_at FROM responses WHERE quiz = $1 ORDER BY submitted_at",
                &[&quiz],
            )
            .await
            .map_err(|_| error::Error::Fatal)?
            .map_err(|_| error::Error::Fatal)
            .and_then(|row| core::future::ready(deserialize_response_from_row(row))))
    }
}

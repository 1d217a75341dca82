use crate::auth::{self, Issuer};
use crate::util;
use db::{Database, TryStreamExt};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{HeaderMap, Response, StatusCode};
use model::quiz::{Quiz, Submission, MAX_QUESTIONS};

/// Checks a quiz payload before anything touches the database.
fn validate_submission(sub: &Submission) -> Result<(), StatusCode> {
    if sub.title.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if sub.questions.is_empty() || sub.questions.len() > MAX_QUESTIONS {
        return Err(StatusCode::BAD_REQUEST);
    }
    for question in &sub.questions {
        if question.options().is_empty() {
            return Err(StatusCode::BAD_REQUEST);
        }
        // Mixed questions would make per-question tallies undefined.
        if question.category() != sub.quiz_category {
            return Err(StatusCode::BAD_REQUEST);
        }
        if let Some(correct) = question.correct_option() {
            if usize::from(correct) >= question.options().len() {
                return Err(StatusCode::BAD_REQUEST);
            }
        }
    }
    Ok(())
}

/// Loads a quiz and checks that the caller owns it.
async fn fetch_owned(db: &Database, quiz: i64, caller: i64) -> Result<Quiz, StatusCode> {
    let quiz = match db.get_quiz(quiz).await {
        Ok(quiz) => quiz,
        Err(db::error::Error::NotFound) => return Err(StatusCode::NOT_FOUND),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };
    if quiz.creator == caller {
        Ok(quiz)
    } else {
        Err(StatusCode::FORBIDDEN)
    }
}

pub async fn try_create<B: Body>(
    body: B,
    headers: &HeaderMap,
    db: &Database,
    issuer: &Issuer,
) -> Result<Response<Full<Bytes>>, StatusCode> {
    let creator = auth::authenticate(headers, issuer)?;
    let bytes = util::aggregate(body).await?;
    let sub = serde_json::from_slice(&bytes).map_err(|_| StatusCode::BAD_REQUEST)?;
    validate_submission(&sub)?;

    let quiz = match db.create_quiz(creator, &sub).await {
        Ok(quiz) => quiz,
        Err(db::error::Error::TooMany | db::error::Error::BadInput) => return Err(StatusCode::BAD_REQUEST),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };
    log::info!("user {creator} created quiz {}", quiz.id);
    crate::json_response(StatusCode::CREATED, &quiz)
}

pub async fn try_list(headers: &HeaderMap, db: &Database, issuer: &Issuer) -> Result<Response<Full<Bytes>>, StatusCode> {
    let creator = auth::authenticate(headers, issuer)?;
    let quizzes: alloc::vec::Vec<_> = db
        .get_quizzes_by_creator(creator)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .try_collect()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    crate::json_response(StatusCode::OK, &quizzes)
}

/// Public fetch-for-taking. Deliberately does not touch the impression
/// counter: only a submitted response counts as an impression.
pub async fn try_fetch(quiz: i64, db: &Database) -> Result<Response<Full<Bytes>>, StatusCode> {
    let quiz = match db.get_quiz(quiz).await {
        Ok(quiz) => quiz,
        Err(db::error::Error::NotFound) => return Err(StatusCode::NOT_FOUND),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };
    crate::json_response(StatusCode::OK, &quiz)
}

pub async fn try_update<B: Body>(
    body: B,
    headers: &HeaderMap,
    quiz: i64,
    db: &Database,
    issuer: &Issuer,
) -> Result<Response<Full<Bytes>>, StatusCode> {
    let caller = auth::authenticate(headers, issuer)?;
    fetch_owned(db, quiz, caller).await?;

    let bytes = util::aggregate(body).await?;
    let sub = serde_json::from_slice(&bytes).map_err(|_| StatusCode::BAD_REQUEST)?;
    validate_submission(&sub)?;

    let updated = match db.update_quiz(quiz, &sub).await {
        Ok(updated) => updated,
        Err(db::error::Error::NotFound) => return Err(StatusCode::NOT_FOUND),
        Err(db::error::Error::TooMany | db::error::Error::BadInput) => return Err(StatusCode::BAD_REQUEST),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };
    crate::json_response(StatusCode::OK, &updated)
}

pub async fn try_delete(
    headers: &HeaderMap,
    quiz: i64,
    db: &Database,
    issuer: &Issuer,
) -> Result<Response<Full<Bytes>>, StatusCode> {
    let caller = auth::authenticate(headers, issuer)?;
    fetch_owned(db, quiz, caller).await?;

    match db.delete_quiz(quiz).await {
        Ok(()) => {}
        Err(db::error::Error::NotFound) => return Err(StatusCode::NOT_FOUND),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
    log::info!("user {caller} deleted quiz {quiz}");
    crate::json_response(StatusCode::OK, &serde_json::json!({ "message": "Quiz deleted successfully" }))
}

pub async fn try_share(
    headers: &HeaderMap,
    quiz: i64,
    db: &Database,
    issuer: &Issuer,
    frontend: &str,
) -> Result<Response<Full<Bytes>>, StatusCode> {
    let caller = auth::authenticate(headers, issuer)?;
    let quiz = fetch_owned(db, quiz, caller).await?;
    let link = alloc::format!("{frontend}/quiz/{}", quiz.id);
    crate::json_response(StatusCode::OK, &serde_json::json!({ "link": link }))
}

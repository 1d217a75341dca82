use crate::auth::{self, Issuer};
use crate::util;
use db::Database;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::AUTHORIZATION;
use hyper::{HeaderMap, Response, StatusCode};
use model::quiz::{Quiz, MAX_QUESTIONS};
use model::response::Answer;

/// Rejects answer sets that do not line up with the quiz's questions:
/// unknown question indices, duplicate answers for one question, and
/// out-of-range option selections all fail before anything is persisted.
fn validate_answers(quiz: &Quiz, answers: &[Answer]) -> Result<(), StatusCode> {
    if answers.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mut seen = [false; MAX_QUESTIONS];
    for answer in answers {
        let index = usize::from(answer.question);
        let question = quiz.raw.questions.get(index).ok_or(StatusCode::BAD_REQUEST)?;
        if core::mem::replace(&mut seen[index], true) {
            return Err(StatusCode::BAD_REQUEST);
        }
        if usize::from(answer.selected_option) >= question.options().len() {
            return Err(StatusCode::BAD_REQUEST);
        }
    }
    Ok(())
}

pub async fn try_submit<B: Body>(
    body: B,
    headers: &HeaderMap,
    quiz_id: i64,
    db: &Database,
    issuer: &Issuer,
) -> Result<Response<Full<Bytes>>, StatusCode> {
    // Anonymous submissions are allowed, but a credential that is present
    // must still be valid.
    let user = match headers.get(AUTHORIZATION) {
        Some(_) => Some(auth::authenticate(headers, issuer)?),
        _ => None,
    };

    let bytes = util::aggregate(body).await?;
    let model::response::Submission { answers } = serde_json::from_slice(&bytes).map_err(|_| StatusCode::BAD_REQUEST)?;

    let quiz = match db.get_quiz(quiz_id).await {
        Ok(quiz) => quiz,
        Err(db::error::Error::NotFound) => return Err(StatusCode::NOT_FOUND),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };
    validate_answers(&quiz, &answers)?;

    let response = db.create_response(quiz_id, user, &answers).await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // A submitted response is the only event that counts as an impression.
    // The response above stays persisted even if the quiz vanished in the
    // meantime or the counter update fails; the counter may under-count.
    match db.add_impression(quiz_id).await {
        Ok(true) => {}
        Ok(false) => log::warn!("quiz {quiz_id} disappeared before its impression counter was bumped"),
        Err(_) => log::error!("failed to bump the impression counter of quiz {quiz_id}"),
    }

    crate::json_response(StatusCode::CREATED, &response)
}

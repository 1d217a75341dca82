use crate::auth::{self, Issuer};
use alloc::vec::Vec;
use db::{Database, TryStreamExt};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{HeaderMap, Response, StatusCode};
use model::analysis::{Dashboard, OptionCount, QuestionAnalysis};
use model::quiz::{Category, Quiz};
use model::response::Response as QuizResponse;

/// Tallies every question of a quiz over a snapshot of its responses,
/// in the quiz's declared question order.
///
/// A response that carries no answer for some question contributes nothing
/// to that question's tallies.
pub fn analyze(quiz: &Quiz, responses: &[QuizResponse]) -> Vec<QuestionAnalysis> {
    quiz.raw
        .questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let answers: Vec<_> = responses
                .iter()
                .filter_map(|response| {
                    response.answers.iter().find(|answer| usize::from(answer.question) == index)
                })
                .collect();

            let mut analysis = QuestionAnalysis {
                question: question.text().into(),
                attempted: answers.len() as u64,
                correct: 0,
                incorrect: 0,
                options: Vec::new(),
            };
            match quiz.raw.quiz_category {
                Category::Answered => {
                    let correct = question.correct_option();
                    for answer in &answers {
                        if Some(answer.selected_option) == correct {
                            analysis.correct += 1;
                        } else {
                            analysis.incorrect += 1;
                        }
                    }
                }
                Category::Poll => {
                    analysis.options = question
                        .options()
                        .iter()
                        .enumerate()
                        .map(|(option_index, option)| OptionCount {
                            option: option.clone(),
                            count: answers
                                .iter()
                                .filter(|answer| usize::from(answer.selected_option) == option_index)
                                .count() as u64,
                        })
                        .collect();
                }
            }
            analysis
        })
        .collect()
}

/// Folds a creator's quizzes into the dashboard rollup.
pub fn dashboard(quizzes: Vec<Quiz>) -> Dashboard {
    let mut stats =
        Dashboard { total_quizzes: 0, total_questions: 0, total_impressions: 0, trending_quizzes: Vec::new() };
    for quiz in quizzes {
        stats.total_quizzes += 1;
        stats.total_questions += quiz.raw.questions.len() as u64;
        stats.total_impressions += quiz.impressions;
        if quiz.is_trending {
            stats.trending_quizzes.push(quiz);
        }
    }
    stats
}

pub async fn try_analysis(
    headers: &HeaderMap,
    quiz_id: i64,
    db: &Database,
    issuer: &Issuer,
) -> Result<Response<Full<Bytes>>, StatusCode> {
    auth::authenticate(headers, issuer)?;

    let quiz = match db.get_quiz(quiz_id).await {
        Ok(quiz) => quiz,
        Err(db::error::Error::NotFound) => return Err(StatusCode::NOT_FOUND),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };
    let responses: Vec<_> = db
        .get_responses_by_quiz(quiz_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .try_collect()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    crate::json_response(StatusCode::OK, &analyze(&quiz, &responses))
}

pub async fn try_dashboard(
    headers: &HeaderMap,
    db: &Database,
    issuer: &Issuer,
) -> Result<Response<Full<Bytes>>, StatusCode> {
    let creator = auth::authenticate(headers, issuer)?;
    let quizzes: Vec<_> = db
        .get_quizzes_by_creator(creator)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .try_collect()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    crate::json_response(StatusCode::OK, &dashboard(quizzes))
}

#[cfg(test)]
mod tests {
    use super::{analyze, dashboard};
    use model::analysis::OptionCount;
    use model::quiz::{Category, Question, QuestionOption, Quiz, Structure, Submission};
    use model::response::{Answer, Response};
    use model::DateTime;

    fn text_option(index: usize) -> QuestionOption {
        QuestionOption::Text { text: format!("Option {index}") }
    }

    fn quiz(category: Category, questions: Vec<Question>) -> Quiz {
        Quiz {
            id: 1,
            creator: 7,
            impressions: 0,
            is_trending: false,
            created_at: DateTime::from_timestamp(0, 0).unwrap(),
            raw: Submission {
                title: "Quiz".into(),
                questions,
                quiz_structure: Structure::MultipleQuestions,
                quiz_category: category,
            },
        }
    }

    fn response(id: i64, answers: &[Answer]) -> Response {
        Response {
            id,
            quiz: 1,
            user: None,
            answers: answers.to_vec(),
            submitted_at: DateTime::from_timestamp(id, 0).unwrap(),
        }
    }

    fn single_answer_responses(selections: &[u16]) -> Vec<Response> {
        selections
            .iter()
            .enumerate()
            .map(|(id, &selected_option)| response(id as i64, &[Answer { question: 0, selected_option }]))
            .collect()
    }

    #[test]
    fn answered_quizzes_tally_correct_and_incorrect() {
        let quiz = quiz(
            Category::Answered,
            vec![Question::Answered {
                text: "Largest planet?".into(),
                options: (0..3).map(text_option).collect(),
                correct_option: 1,
                timer: None,
            }],
        );
        let responses = single_answer_responses(&[1, 0, 1]);

        let tallies = analyze(&quiz, &responses);
        assert_eq!(tallies.len(), 1);
        assert_eq!(tallies[0].question, "Largest planet?");
        assert_eq!(tallies[0].attempted, 3);
        assert_eq!(tallies[0].correct, 2);
        assert_eq!(tallies[0].incorrect, 1);
        assert!(tallies[0].options.is_empty());
    }

    #[test]
    fn poll_quizzes_tally_per_option_in_declared_order() {
        let quiz = quiz(
            Category::Poll,
            vec![Question::Poll { text: "Hm?".into(), options: (0..3).map(text_option).collect(), timer: None }],
        );
        let responses = single_answer_responses(&[0, 0, 2]);

        let tallies = analyze(&quiz, &responses);
        assert_eq!(tallies[0].attempted, 3);
        assert_eq!(
            tallies[0].options,
            [
                OptionCount { option: text_option(0), count: 2 },
                OptionCount { option: text_option(1), count: 0 },
                OptionCount { option: text_option(2), count: 1 },
            ]
        );
    }

    #[test]
    fn zero_responses_yield_all_zero_tallies() {
        let quiz = quiz(
            Category::Answered,
            vec![Question::Answered {
                text: "Hm?".into(),
                options: (0..2).map(text_option).collect(),
                correct_option: 0,
                timer: None,
            }],
        );
        let tallies = analyze(&quiz, &[]);
        assert_eq!(tallies[0].attempted, 0);
        assert_eq!(tallies[0].correct, 0);
        assert_eq!(tallies[0].incorrect, 0);
    }

    #[test]
    fn responses_only_count_toward_questions_they_answered() {
        let questions = vec![
            Question::Answered {
                text: "First?".into(),
                options: (0..2).map(text_option).collect(),
                correct_option: 0,
                timer: None,
            },
            Question::Answered {
                text: "Second?".into(),
                options: (0..2).map(text_option).collect(),
                correct_option: 1,
                timer: None,
            },
        ];
        let quiz = quiz(Category::Answered, questions);
        let responses = [
            response(0, &[Answer { question: 0, selected_option: 0 }, Answer { question: 1, selected_option: 1 }]),
            response(1, &[Answer { question: 0, selected_option: 1 }]),
        ];

        let tallies = analyze(&quiz, &responses);
        assert_eq!((tallies[0].attempted, tallies[0].correct, tallies[0].incorrect), (2, 1, 1));
        assert_eq!((tallies[1].attempted, tallies[1].correct, tallies[1].incorrect), (1, 1, 0));
    }

    #[test]
    fn analysis_is_deterministic_over_a_snapshot() {
        let quiz = quiz(
            Category::Poll,
            vec![Question::Poll { text: "Hm?".into(), options: (0..2).map(text_option).collect(), timer: None }],
        );
        let responses = single_answer_responses(&[0, 1, 1, 0, 0]);
        assert_eq!(analyze(&quiz, &responses), analyze(&quiz, &responses));
    }

    #[test]
    fn dashboard_folds_totals_and_trending() {
        let questions = |count: usize| {
            (0..count)
                .map(|_| Question::Poll { text: "Hm?".into(), options: vec![text_option(0)], timer: None })
                .collect()
        };
        let mut quiet = quiz(Category::Poll, questions(3));
        quiet.impressions = 5;
        let mut popular = quiz(Category::Poll, questions(2));
        popular.id = 2;
        popular.impressions = 12;
        popular.is_trending = true;

        let stats = dashboard(vec![quiet, popular.clone()]);
        assert_eq!(stats.total_quizzes, 2);
        assert_eq!(stats.total_questions, 5);
        assert_eq!(stats.total_impressions, 17);
        assert_eq!(stats.trending_quizzes, [popular]);
    }

    #[test]
    fn empty_dashboards_are_all_zero() {
        let stats = dashboard(Vec::new());
        assert_eq!(stats.total_quizzes, 0);
        assert_eq!(stats.total_questions, 0);
        assert_eq!(stats.total_impressions, 0);
        assert!(stats.trending_quizzes.is_empty());
    }
}

use crate::quiz::{QuestionOption, Quiz};
use alloc::{string::String, vec::Vec};
use serde::{Deserialize, Serialize};

/// How many respondents selected one particular option of a poll question.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct OptionCount {
    pub option: QuestionOption,
    pub count: u64,
}

/// Tally for a single question, in the quiz's declared question order.
///
/// Q&A questions fill in `correct`/`incorrect` and leave `options` empty;
/// poll questions do the opposite.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct QuestionAnalysis {
    pub question: String,
    pub attempted: u64,
    pub correct: u64,
    pub incorrect: u64,
    pub options: Vec<OptionCount>,
}

/// Rollup over all quizzes owned by one creator.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_quizzes: u64,
    pub total_questions: u64,
    pub total_impressions: u64,
    pub trending_quizzes: Vec<Quiz>,
}

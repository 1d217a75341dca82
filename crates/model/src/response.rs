use alloc::vec::Vec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A respondent's selection for one question of a quiz.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    /// Index of the question within the quiz's ordered question list.
    pub question: u16,
    /// Index of the selection within that question's options.
    pub selected_option: u16,
}

/// Acceptable schema for submitted responses.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Submission {
    pub answers: Vec<Answer>,
}

/// A stored response. Never mutated after submission.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: i64,
    /// The quiz this response was submitted to. The quiz may have been
    /// deleted since.
    pub quiz: i64,
    /// Submitting user, if the respondent was logged in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<i64>,
    pub answers: Vec<Answer>,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::{Answer, Submission};

    #[test]
    fn answers_use_original_field_names() {
        let Submission { answers } = serde_json::from_str(
            r#"{"answers":[{"question":0,"selectedOption":2},{"question":1,"selectedOption":0}]}"#,
        )
        .unwrap();
        assert_eq!(
            answers,
            [
                Answer { question: 0, selected_option: 2 },
                Answer { question: 1, selected_option: 0 }
            ]
        );
    }
}

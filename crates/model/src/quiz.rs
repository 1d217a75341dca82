use alloc::{string::String, vec::Vec};
use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Upper bound on the number of questions embedded in a quiz.
pub const MAX_QUESTIONS: usize = 5;

/// Impression count beyond which a quiz counts as trending.
pub const TRENDING_IMPRESSIONS: u64 = 10;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Category {
    /// Every question has a single correct answer.
    #[serde(rename = "Q&A")]
    Answered,
    /// Opinion polls with no correct answer.
    Poll,
}

impl Category {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Answered => "Q&A",
            Self::Poll => "Poll",
        }
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "Q&A" => Ok(Self::Answered),
            "Poll" => Ok(Self::Poll),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Structure {
    #[serde(rename = "Single Question")]
    SingleQuestion,
    #[serde(rename = "Multiple Questions")]
    MultipleQuestions,
}

impl Structure {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SingleQuestion => "Single Question",
            Self::MultipleQuestions => "Multiple Questions",
        }
    }
}

impl FromStr for Structure {
    type Err = ();

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "Single Question" => Ok(Self::SingleQuestion),
            "Multiple Questions" => Ok(Self::MultipleQuestions),
            _ => Err(()),
        }
    }
}

/// What a selectable option displays. Each kind carries exactly the
/// fields that are valid for it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum QuestionOption {
    Text { text: String },
    Image { image: String },
    #[serde(rename = "Text & Image")]
    TextImage { text: String, image: String },
}

/// A single prompt embedded in a quiz. The `correctOption` index only
/// exists on the Q&A variant.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Question {
    #[serde(rename = "Q&A")]
    Answered {
        /// Prompt to be displayed to the respondent.
        text: String,
        /// Possible answers to select from.
        options: Vec<QuestionOption>,
        /// Index of the selection with the correct answer.
        #[serde(rename = "correctOption")]
        correct_option: u16,
        /// How long the respondent has to answer (in seconds).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timer: Option<u16>,
    },
    Poll {
        text: String,
        options: Vec<QuestionOption>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timer: Option<u16>,
    },
}

impl Question {
    pub fn text(&self) -> &str {
        match self {
            Self::Answered { text, .. } | Self::Poll { text, .. } => text,
        }
    }

    pub fn options(&self) -> &[QuestionOption] {
        match self {
            Self::Answered { options, .. } | Self::Poll { options, .. } => options,
        }
    }

    pub const fn correct_option(&self) -> Option<u16> {
        match *self {
            Self::Answered { correct_option, .. } => Some(correct_option),
            Self::Poll { .. } => None,
        }
    }

    pub const fn category(&self) -> Category {
        match self {
            Self::Answered { .. } => Category::Answered,
            Self::Poll { .. } => Category::Poll,
        }
    }
}

/// Acceptable schema for new and updated quizzes.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub title: String,
    pub questions: Vec<Question>,
    pub quiz_structure: Structure,
    pub quiz_category: Category,
}

/// A stored quiz as returned to clients.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    /// Owner of the quiz. Only the owner may mutate it.
    pub creator: i64,
    /// Engagement counter, bumped once per submitted response.
    pub impressions: u64,
    /// Derived flag: `impressions > TRENDING_IMPRESSIONS`.
    pub is_trending: bool,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub raw: Submission,
}

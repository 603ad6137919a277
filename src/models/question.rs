use serde::{Deserialize, Serialize};

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

/// A single multiple-choice question.
///
/// Records are loaded once into the [`QuestionRepository`](crate::services::QuestionRepository)
/// and never mutated afterwards. `correct_index` always points into `options`;
/// the repository rejects records that violate this on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: u32,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub category: String,
    /// 1 = easy, 2 = medium, 3 = hard
    pub difficulty: u8,
    #[serde(default)]
    pub explanation: String,
}

impl QuestionRecord {
    /// Check whether `index` is a valid option for this question.
    pub fn is_valid_option(&self, index: usize) -> bool {
        index < self.options.len()
    }

    /// Check whether `index` is the correct option.
    pub fn is_correct(&self, index: usize) -> bool {
        self.correct_index == index
    }

    /// Text of the correct option.
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_index).map(String::as_str)
    }

    /// Option label as shown to players ("A", "B", ...).
    pub fn option_label(index: usize) -> char {
        (b'A' + (index as u8 % 26)) as char
    }
}

/// A question without an id, used for dynamic insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub category: String,
    pub difficulty: u8,
    #[serde(default)]
    pub explanation: String,
}

impl QuestionDraft {
    pub fn into_record(self, id: u32) -> QuestionRecord {
        QuestionRecord {
            id,
            text: self.text,
            options: self.options,
            correct_index: self.correct_index,
            category: self.category,
            difficulty: self.difficulty,
            explanation: self.explanation,
        }
    }
}

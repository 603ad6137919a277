//! Question repository: the fixed bank of questions a session draws from.
//!
//! The bank is loaded once (from the built-in MANITAS data or a YAML file) and
//! validated eagerly: an empty bank, a duplicate id or a malformed record fails the
//! load instead of surfacing mid-session.

use crate::models::{OPTION_COUNT, QuestionDraft, QuestionRecord};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use thiserror::Error;

/// Built-in MANITAS question bank (hand hygiene and workplace safety).
const BUILTIN_QUESTIONS_YAML: &str = include_str!("../../data/questions.yaml");

/// Explanation reported when an answer is checked against an unknown id.
pub const QUESTION_NOT_FOUND: &str = "Question not found";

/// Errors raised while building the question bank
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Question bank is empty")]
    EmptyBank,

    #[error("Duplicate question id {0}")]
    DuplicateId(u32),

    #[error("Question id is zero or out of range")]
    InvalidId,

    #[error("Question {id} has {count} options, expected 4")]
    InvalidOptionCount { id: u32, count: usize },

    #[error("Question {id} marks option {index} as correct, which does not exist")]
    CorrectIndexOutOfRange { id: u32, index: usize },

    #[error("Question {id} has difficulty {difficulty}, expected 1, 2 or 3")]
    InvalidDifficulty { id: u32, difficulty: u8 },
}

/// Outcome of checking a selected option against the bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerCheck {
    /// False when the question id is not in the bank
    pub found: bool,
    pub correct: bool,
    pub correct_index: Option<usize>,
    pub explanation: String,
}

/// Summary counts for the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepositoryStats {
    pub total: usize,
    pub categories: usize,
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

/// Read-only question bank keyed by id, in load order.
#[derive(Debug, Clone)]
pub struct QuestionRepository {
    questions: IndexMap<u32, QuestionRecord>,
}

impl QuestionRepository {
    /// Build a repository from records, validating every one of them.
    pub fn new(records: Vec<QuestionRecord>) -> Result<Self, RepositoryError> {
        if records.is_empty() {
            return Err(RepositoryError::EmptyBank);
        }

        let mut questions = IndexMap::with_capacity(records.len());
        for record in records {
            validate_record(&record)?;
            let id = record.id;
            if questions.insert(id, record).is_some() {
                return Err(RepositoryError::DuplicateId(id));
            }
        }

        Ok(Self { questions })
    }

    /// Load the built-in MANITAS question bank.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_QUESTIONS_YAML).context("Failed to load built-in question bank")
    }

    /// Parse and validate a YAML list of questions.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let records: Vec<QuestionRecord> =
            serde_yaml_ng::from_str(yaml).context("Failed to parse question bank YAML")?;
        let repository = Self::new(records)?;

        tracing::debug!("Loaded {} questions", repository.len());
        Ok(repository)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// All questions in load order.
    pub fn all(&self) -> impl Iterator<Item = &QuestionRecord> {
        self.questions.values()
    }

    /// All question ids in load order.
    pub fn ids(&self) -> Vec<u32> {
        self.questions.keys().copied().collect()
    }

    pub fn by_id(&self, id: u32) -> Option<&QuestionRecord> {
        self.questions.get(&id)
    }

    /// Up to `limit` questions of the given category, in load order.
    pub fn by_category(&self, category: &str, limit: usize) -> Vec<&QuestionRecord> {
        self.questions
            .values()
            .filter(|q| q.category == category)
            .take(limit)
            .collect()
    }

    /// Up to `limit` questions of the given difficulty level, in load order.
    pub fn by_difficulty(&self, level: u8, limit: usize) -> Vec<&QuestionRecord> {
        self.questions
            .values()
            .filter(|q| q.difficulty == level)
            .take(limit)
            .collect()
    }

    /// Up to `count` distinct questions in random order.
    pub fn random<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<&QuestionRecord> {
        let records: Vec<&QuestionRecord> = self.questions.values().collect();
        records.choose_multiple(rng, count).copied().collect()
    }

    /// Unique categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.questions
            .values()
            .map(|q| q.category.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }

    pub fn stats(&self) -> RepositoryStats {
        let count_level = |level| self.questions.values().filter(|q| q.difficulty == level).count();

        RepositoryStats {
            total: self.questions.len(),
            categories: self.categories().len(),
            easy: count_level(1),
            medium: count_level(2),
            hard: count_level(3),
        }
    }

    /// Check a selected option. Unknown ids report `found = false` and `correct = false`.
    pub fn check_answer(&self, id: u32, selected: usize) -> AnswerCheck {
        match self.questions.get(&id) {
            Some(question) => AnswerCheck {
                found: true,
                correct: question.is_correct(selected),
                correct_index: Some(question.correct_index),
                explanation: question.explanation.clone(),
            },
            None => {
                tracing::warn!("Answer check for unknown question id {}", id);
                AnswerCheck {
                    found: false,
                    correct: false,
                    correct_index: None,
                    explanation: QUESTION_NOT_FOUND.to_string(),
                }
            }
        }
    }

    /// Add a question, assigning the next free id.
    pub fn insert(&mut self, draft: QuestionDraft) -> Result<&QuestionRecord, RepositoryError> {
        let id = self
            .questions
            .keys()
            .max()
            .copied()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or(RepositoryError::InvalidId)?;
        let record = draft.into_record(id);
        validate_record(&record)?;

        tracing::debug!("Inserted question {}", id);
        let (index, _) = self.questions.insert_full(id, record);
        Ok(&self.questions[index])
    }
}

fn validate_record(record: &QuestionRecord) -> Result<(), RepositoryError> {
    if record.id == 0 {
        return Err(RepositoryError::InvalidId);
    }
    if record.options.len() != OPTION_COUNT {
        return Err(RepositoryError::InvalidOptionCount {
            id: record.id,
            count: record.options.len(),
        });
    }
    if !record.is_valid_option(record.correct_index) {
        return Err(RepositoryError::CorrectIndexOutOfRange {
            id: record.id,
            index: record.correct_index,
        });
    }
    if !(1..=3).contains(&record.difficulty) {
        return Err(RepositoryError::InvalidDifficulty {
            id: record.id,
            difficulty: record.difficulty,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn record(id: u32, category: &str, difficulty: u8) -> QuestionRecord {
        QuestionRecord {
            id,
            text: format!("Question {}", id),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index: 1,
            category: category.to_string(),
            difficulty,
            explanation: format!("Explanation {}", id),
        }
    }

    #[test]
    fn test_rejects_empty_bank() {
        assert_eq!(
            QuestionRepository::new(Vec::new()).unwrap_err(),
            RepositoryError::EmptyBank
        );
    }

    #[test]
    fn test_rejects_duplicate_id() {
        let err = QuestionRepository::new(vec![record(1, "A", 1), record(1, "B", 2)]).unwrap_err();
        assert_eq!(err, RepositoryError::DuplicateId(1));
    }

    #[test]
    fn test_rejects_malformed_records() {
        let mut bad = record(2, "A", 1);
        bad.options.pop();
        assert!(matches!(
            QuestionRepository::new(vec![bad]).unwrap_err(),
            RepositoryError::InvalidOptionCount { id: 2, count: 3 }
        ));

        let mut bad = record(3, "A", 1);
        bad.correct_index = 4;
        assert!(matches!(
            QuestionRepository::new(vec![bad]).unwrap_err(),
            RepositoryError::CorrectIndexOutOfRange { id: 3, index: 4 }
        ));

        assert!(matches!(
            QuestionRepository::new(vec![record(4, "A", 0)]).unwrap_err(),
            RepositoryError::InvalidDifficulty { id: 4, difficulty: 0 }
        ));

        assert_eq!(
            QuestionRepository::new(vec![record(0, "A", 1)]).unwrap_err(),
            RepositoryError::InvalidId
        );
    }

    #[test]
    fn test_lookups() {
        let repo = QuestionRepository::new(vec![
            record(1, "Hygiene", 1),
            record(2, "Safety", 2),
            record(3, "Hygiene", 3),
            record(4, "Hygiene", 1),
        ])
        .unwrap();

        assert_eq!(repo.len(), 4);
        assert_eq!(repo.by_id(2).unwrap().category, "Safety");
        assert!(repo.by_id(99).is_none());

        let hygiene: Vec<u32> = repo.by_category("Hygiene", 2).iter().map(|q| q.id).collect();
        assert_eq!(hygiene, vec![1, 3]);

        let easy: Vec<u32> = repo.by_difficulty(1, 10).iter().map(|q| q.id).collect();
        assert_eq!(easy, vec![1, 4]);

        assert_eq!(repo.categories(), vec!["Hygiene", "Safety"]);
        assert_eq!(
            repo.stats(),
            RepositoryStats {
                total: 4,
                categories: 2,
                easy: 2,
                medium: 1,
                hard: 1,
            }
        );
    }

    #[test]
    fn test_check_answer() {
        let repo = QuestionRepository::new(vec![record(1, "Hygiene", 1)]).unwrap();

        let hit = repo.check_answer(1, 1);
        assert!(hit.found);
        assert!(hit.correct);
        assert_eq!(hit.correct_index, Some(1));
        assert_eq!(hit.explanation, "Explanation 1");

        let miss = repo.check_answer(1, 0);
        assert!(miss.found);
        assert!(!miss.correct);

        let unknown = repo.check_answer(42, 1);
        assert!(!unknown.found);
        assert!(!unknown.correct);
        assert_eq!(unknown.explanation, QUESTION_NOT_FOUND);
    }

    #[test]
    fn test_insert_assigns_next_id() {
        let mut repo = QuestionRepository::new(vec![record(1, "A", 1), record(7, "A", 1)]).unwrap();
        let draft = QuestionDraft {
            text: "New".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index: 3,
            category: "B".into(),
            difficulty: 2,
            explanation: String::new(),
        };

        let inserted = repo.insert(draft).unwrap();
        assert_eq!(inserted.id, 8);
        assert_eq!(repo.len(), 3);
        assert_eq!(repo.ids(), vec![1, 7, 8]);
    }

    #[test]
    fn test_insert_fails_when_ids_are_exhausted() {
        let mut repo = QuestionRepository::new(vec![record(u32::MAX, "A", 1)]).unwrap();
        let draft = QuestionDraft {
            text: "One too many".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index: 0,
            category: "A".into(),
            difficulty: 1,
            explanation: String::new(),
        };

        assert_eq!(repo.insert(draft).unwrap_err(), RepositoryError::InvalidId);
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_insert_rejects_invalid_draft() {
        let mut repo = QuestionRepository::new(vec![record(1, "A", 1)]).unwrap();
        let draft = QuestionDraft {
            text: "Broken".into(),
            options: vec!["a".into()],
            correct_index: 0,
            category: "B".into(),
            difficulty: 1,
            explanation: String::new(),
        };
        assert!(repo.insert(draft).is_err());
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_random_is_distinct_and_bounded() {
        let repo = QuestionRepository::new((1..=6).map(|id| record(id, "A", 1)).collect()).unwrap();
        let mut rng = Pcg64::seed_from_u64(7);

        let picked = repo.random(4, &mut rng);
        let ids: HashSet<u32> = picked.iter().map(|q| q.id).collect();
        assert_eq!(ids.len(), 4);

        assert_eq!(repo.random(20, &mut rng).len(), 6);
    }

    #[test]
    fn test_builtin_bank_loads() {
        let repo = QuestionRepository::builtin().unwrap();
        assert_eq!(repo.len(), 50);
        assert!(repo.all().all(|q| q.options.len() == OPTION_COUNT));
    }
}

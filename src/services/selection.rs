//! Question selection policy.
//!
//! Draws questions without repetition until every id in the current draw order has
//! been used, then reshuffles. The walk for an unused id is bounded to twice the
//! draw-order length; if it finds nothing the policy falls back to a uniformly random
//! id, so `next()` always terminates.

use super::repository::QuestionRepository;
use crate::models::QuestionRecord;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::collections::HashSet;
use std::sync::Arc;

/// Non-repeating draw order over a [`QuestionRepository`].
#[derive(Debug, Clone)]
pub struct SelectionPolicy {
    repository: Arc<QuestionRepository>,
    /// Current permutation of all question ids
    draw_order: Vec<u32>,
    cursor: usize,
    /// Ids drawn since the last reshuffle
    used_ids: HashSet<u32>,
    rng: Pcg64,
}

impl SelectionPolicy {
    /// Create a policy with an entropy-seeded generator and an initial shuffle.
    pub fn new(repository: Arc<QuestionRepository>) -> Self {
        Self::with_rng(repository, Pcg64::from_entropy())
    }

    /// Create a policy with a fixed seed, for reproducible draw orders.
    pub fn with_seed(repository: Arc<QuestionRepository>, seed: u64) -> Self {
        Self::with_rng(repository, Pcg64::seed_from_u64(seed))
    }

    fn with_rng(repository: Arc<QuestionRepository>, rng: Pcg64) -> Self {
        let mut policy = Self {
            repository,
            draw_order: Vec::new(),
            cursor: 0,
            used_ids: HashSet::new(),
            rng,
        };
        policy.reshuffle();
        policy
    }

    /// Produce a fresh uniformly random permutation of all ids and clear usage tracking.
    pub fn reshuffle(&mut self) {
        self.draw_order = self.repository.ids();
        self.draw_order.shuffle(&mut self.rng);
        self.cursor = 0;
        self.used_ids.clear();

        tracing::debug!("Reshuffled {} questions", self.draw_order.len());
    }

    /// Draw the next question.
    ///
    /// Returns `None` only when the repository holds no questions at all.
    pub fn next(&mut self) -> Option<&QuestionRecord> {
        if self.used_ids.len() >= self.draw_order.len() {
            self.reshuffle();
        }

        let len = self.draw_order.len();
        if len == 0 {
            return None;
        }
        let max_attempts = len * 2;
        let mut attempts = 0;
        let mut found = None;

        while attempts < max_attempts {
            let id = self.draw_order[self.cursor];
            self.cursor = (self.cursor + 1) % len;
            attempts += 1;

            if !self.used_ids.contains(&id) {
                found = Some(id);
                break;
            }
        }

        let id = found.unwrap_or_else(|| {
            tracing::debug!("No unused question after {} attempts, drawing at random", attempts);
            self.draw_order[self.rng.gen_range(0..len)]
        });

        self.used_ids.insert(id);
        self.repository.by_id(id)
    }

    /// Clear usage tracking and reshuffle.
    pub fn reset(&mut self) {
        self.reshuffle();
    }

    pub fn repository(&self) -> &Arc<QuestionRepository> {
        &self.repository
    }

    pub fn draw_order(&self) -> &[u32] {
        &self.draw_order
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of ids drawn since the last reshuffle.
    pub fn used_count(&self) -> usize {
        self.used_ids.len()
    }

    /// Number of draws left before the next reshuffle.
    pub fn remaining(&self) -> usize {
        self.draw_order.len().saturating_sub(self.used_ids.len())
    }
}

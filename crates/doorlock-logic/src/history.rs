use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use doorlock_core::DoorState;
use serde::{Deserialize, Serialize};

use crate::sound::TransitionOrigin;

/// Maximum number of transitions kept for diagnostics.
pub const MAX_HISTORY_SIZE: usize = 100;

/// A confirmed change of the door state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: DoorState,
    pub to: DoorState,
    pub origin: TransitionOrigin,
    pub at: DateTime<Utc>,
}

impl Transition {
    pub fn new(from: DoorState, to: DoorState, origin: TransitionOrigin) -> Self {
        Self {
            from,
            to,
            origin,
            at: Utc::now(),
        }
    }
}

/// Bounded log of transitions, oldest first.
#[derive(Debug, Clone, Default)]
pub struct TransitionHistory {
    entries: VecDeque<Transition>,
}

impl TransitionHistory {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn push(&mut self, transition: Transition) {
        self.entries.push_back(transition);
        if self.entries.len() > MAX_HISTORY_SIZE {
            self.entries.pop_front();
        }
    }

    pub fn last(&self) -> Option<&Transition> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Transition> {
        self.entries.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_bounded_and_ordered() {
        let mut history = TransitionHistory::new();
        let states = [DoorState::Open, DoorState::Closed];
        for i in 0..MAX_HISTORY_SIZE + 20 {
            let from = states[i % 2];
            let to = states[(i + 1) % 2];
            history.push(Transition::new(from, to, TransitionOrigin::Commanded));
        }

        assert_eq!(history.len(), MAX_HISTORY_SIZE);
        let entries = history.to_vec();
        // 20 oldest entries were dropped, so the first kept one starts at index 20.
        assert_eq!(entries[0].from, DoorState::Open);
        assert!(entries.windows(2).all(|pair| pair[0].at <= pair[1].at));
        assert_eq!(history.last().map(|t| t.to), Some(DoorState::Open));
    }
}

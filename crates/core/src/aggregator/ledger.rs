//! Per-item state tracking.

use std::collections::HashMap;
use thiserror::Error;

use crate::dispatcher::ItemState;
use crate::item::ItemId;

/// Rejected state change.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Item {0} is not part of this run")]
    UnknownItem(ItemId),

    #[error("Item {item} cannot move from {from:?} to {to:?}")]
    Illegal {
        item: ItemId,
        from: ItemState,
        to: ItemState,
    },
}

/// State of every item in a run.
#[derive(Debug, Clone, Default)]
pub struct ItemLedger {
    states: HashMap<ItemId, ItemState>,
}

impl ItemLedger {
    /// Creates a ledger with every item `Pending`. Duplicates collapse.
    pub fn new(items: &[ItemId]) -> Self {
        Self {
            states: items.iter().map(|i| (*i, ItemState::Pending)).collect(),
        }
    }

    /// Number of tracked items.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Current state of an item.
    pub fn state(&self, item: ItemId) -> Option<ItemState> {
        self.states.get(&item).copied()
    }

    /// Moves an item to `next`, returning its previous state.
    pub fn transition(&mut self, item: ItemId, next: ItemState) -> Result<ItemState, TransitionError> {
        let current = self
            .states
            .get_mut(&item)
            .ok_or(TransitionError::UnknownItem(item))?;

        if !current.can_transition_to(next) {
            return Err(TransitionError::Illegal {
                item,
                from: *current,
                to: next,
            });
        }

        let previous = *current;
        *current = next;
        Ok(previous)
    }

    /// Number of items in the given state.
    pub fn count(&self, state: ItemState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }

    /// Whether every item reached a terminal state.
    pub fn is_complete(&self) -> bool {
        self.states.values().all(ItemState::is_terminal)
    }

    /// Items not yet terminal, sorted by identifier.
    pub fn unfinished(&self) -> Vec<ItemId> {
        let mut items: Vec<ItemId> = self
            .states
            .iter()
            .filter(|(_, s)| !s.is_terminal())
            .map(|(i, _)| *i)
            .collect();
        items.sort();
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::item_range;

    fn id(i: u32) -> ItemId {
        ItemId::new(i).unwrap()
    }

    #[test]
    fn test_lifecycle() {
        let mut ledger = ItemLedger::new(&item_range(3));
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.count(ItemState::Pending), 3);

        ledger.transition(id(1), ItemState::InFlight).unwrap();
        ledger.transition(id(1), ItemState::Succeeded).unwrap();
        ledger.transition(id(2), ItemState::InFlight).unwrap();
        ledger.transition(id(2), ItemState::Failed).unwrap();
        assert!(!ledger.is_complete());
        assert_eq!(ledger.unfinished(), vec![id(3)]);

        ledger.transition(id(3), ItemState::InFlight).unwrap();
        ledger.transition(id(3), ItemState::Succeeded).unwrap();
        assert!(ledger.is_complete());
        assert_eq!(ledger.count(ItemState::Succeeded), 2);
        assert_eq!(ledger.count(ItemState::Failed), 1);
    }

    #[test]
    fn test_terminal_is_final() {
        let mut ledger = ItemLedger::new(&item_range(1));
        ledger.transition(id(1), ItemState::InFlight).unwrap();
        ledger.transition(id(1), ItemState::Failed).unwrap();

        let err = ledger.transition(id(1), ItemState::Succeeded).unwrap_err();
        assert_eq!(
            err,
            TransitionError::Illegal {
                item: id(1),
                from: ItemState::Failed,
                to: ItemState::Succeeded,
            }
        );
        assert_eq!(ledger.state(id(1)), Some(ItemState::Failed));
    }

    #[test]
    fn test_unknown_item() {
        let mut ledger = ItemLedger::new(&item_range(2));
        assert_eq!(
            ledger.transition(id(9), ItemState::InFlight),
            Err(TransitionError::UnknownItem(id(9)))
        );
    }

    #[test]
    fn test_empty_ledger_is_complete() {
        let ledger = ItemLedger::new(&[]);
        assert!(ledger.is_empty());
        assert!(ledger.is_complete());
    }
}

//! Modifier Ownership Tracking
//!
//! With several fingers on the keyboard at once, a modifier belongs to the
//! contact that pressed it. Only that contact can release it; a later press
//! by another contact takes ownership over.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;
use tracing::trace;

/// Active modifiers and their owning contacts
#[derive(Debug, Clone)]
pub struct ModifierState<O> {
    active: HashMap<String, O>,
}

impl<O: PartialEq + Clone + Debug> ModifierState<O> {
    /// No modifiers active
    pub fn new() -> Self {
        Self {
            active: HashMap::new(),
        }
    }

    /// Mark `modifier` pressed by `owner` (last writer wins)
    pub fn press(&mut self, modifier: &str, owner: O) {
        trace!("Modifier {} pressed by {:?}", modifier, owner);
        self.active.insert(modifier.to_string(), owner);
    }

    /// Release `modifier` if `owner` holds it
    ///
    /// Returns whether the modifier was released.
    pub fn release(&mut self, modifier: &str, owner: &O) -> bool {
        match self.active.get(modifier) {
            Some(current) if current == owner => {
                self.active.remove(modifier);
                true
            }
            Some(current) => {
                trace!(
                    "Modifier {} owned by {:?}, ignoring release by {:?}",
                    modifier,
                    current,
                    owner
                );
                false
            }
            None => false,
        }
    }

    /// Whether `modifier` is held by anyone
    pub fn is_active(&self, modifier: &str) -> bool {
        self.active.contains_key(modifier)
    }

    /// Current owner of `modifier`
    pub fn owner(&self, modifier: &str) -> Option<&O> {
        self.active.get(modifier)
    }

    /// Names of every active modifier
    pub fn active_modifiers(&self) -> BTreeSet<String> {
        self.active.keys().cloned().collect()
    }

    /// Drop every modifier regardless of owner
    pub fn clear(&mut self) {
        self.active.clear();
    }
}

impl<O: PartialEq + Clone + Debug> Default for ModifierState<O> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_owner_releases() {
        let mut state = ModifierState::new();
        state.press("shift", 1);

        assert!(!state.release("shift", &2));
        assert!(state.is_active("shift"));

        assert!(state.release("shift", &1));
        assert!(!state.is_active("shift"));
    }

    #[test]
    fn test_second_press_transfers_ownership() {
        let mut state = ModifierState::new();
        state.press("ctrl", 1);
        state.press("ctrl", 2);

        assert!(!state.release("ctrl", &1));
        assert_eq!(state.owner("ctrl"), Some(&2));
        assert!(state.release("ctrl", &2));
    }

    #[test]
    fn test_active_modifiers() {
        let mut state = ModifierState::new();
        assert!(state.active_modifiers().is_empty());

        state.press("shift", 'a');
        state.press("alt", 'b');
        let active: Vec<_> = state.active_modifiers().into_iter().collect();
        assert_eq!(active, vec!["alt".to_string(), "shift".to_string()]);

        state.clear();
        assert!(!state.is_active("alt"));
    }

    #[test]
    fn test_release_unknown_is_noop() {
        let mut state: ModifierState<u32> = ModifierState::new();
        assert!(!state.release("super", &7));
    }
}

//! Ids of the cells a game mode spawned and still owns.

use tracing::error;

#[derive(Debug, Default, Clone)]
pub struct Roster {
    ids: Vec<u32>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, id: u32) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    /// Stop tracking `id`. Returns false (and logs) if it was never tracked.
    pub fn untrack(&mut self, id: u32) -> bool {
        match self.ids.iter().position(|&tracked| tracked == id) {
            Some(index) => {
                self.ids.swap_remove(index);
                true
            }
            None => {
                error!("Roster::untrack: tried to remove untracked cell {}", id);
                false
            }
        }
    }

    #[inline]
    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Empty the roster, handing back what it held.
    pub fn clear(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.ids)
    }
}

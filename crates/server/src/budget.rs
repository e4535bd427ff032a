//! Field-wide food budget.

/// Counts live food against the configured maximum.
///
/// Ordinary food spawning checks the limit itself and calls [`FoodBudget::acquire`];
/// mother cells reserve each pellet up front so a shedding burst stops as soon
/// as the field is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoodBudget {
    current: usize,
    max: usize,
}

impl FoodBudget {
    pub fn new(max: usize) -> Self {
        Self { current: 0, max }
    }

    /// Live food currently accounted for.
    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn max(&self) -> usize {
        self.max
    }

    /// Remaining room before the limit.
    #[inline]
    pub fn available(&self) -> usize {
        self.max.saturating_sub(self.current)
    }

    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.current >= self.max
    }

    /// Take one slot if the budget is not saturated.
    #[inline]
    pub fn reserve(&mut self) -> bool {
        if self.is_saturated() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Count one more pellet regardless of the limit.
    #[inline]
    pub fn acquire(&mut self) {
        self.current += 1;
    }

    /// Return one slot (a pellet left the field).
    #[inline]
    pub fn release(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    /// Change the limit; live food above it stays counted.
    pub fn set_limit(&mut self, max: usize) {
        self.max = max;
    }
}

//! Per-type cell behaviors that game modes can override.
//!
//! A mode pushes a [`BehaviorOverlay`] when it starts and pops it when it ends.
//! The active behavior of each cell type is the topmost overlay that sets it,
//! falling back to the base set, so removing an overlay restores exactly what
//! was there before.

use crate::color::Color;
use rand::Rng;

/// How a virus reacts to eating ejected mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VirusFeeding {
    /// Absorb the prey; at max size reset and shoot a new virus.
    Grow,
    /// Absorb nothing, get pushed along the prey's heading (or its own).
    Push { distance: f32 },
}

/// How a cell is colored when it enters the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tint {
    /// Keep the color the creator assigned.
    Keep,
    /// Shift the base color by one random amount in `-spread..=spread` on every channel.
    Jitter { spread: i16 },
    /// Like `Jitter` on red and green, blue forced to 0.
    Themed { spread: i16 },
}

impl Tint {
    /// Resolve the color for a new cell.
    pub fn apply<R: Rng + ?Sized>(&self, current: Color, base: Color, rng: &mut R) -> Color {
        match *self {
            Tint::Keep => current,
            Tint::Jitter { spread } => base.shifted(rng.random_range(-spread..=spread)),
            Tint::Themed { spread } => {
                base.shifted(rng.random_range(-spread..=spread)).with_blue(0)
            }
        }
    }
}

/// Fully resolved behaviors, one per overridable slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorSet {
    pub virus_feeding: VirusFeeding,
    pub food_tint: Tint,
    pub mother_tint: Tint,
}

impl Default for BehaviorSet {
    fn default() -> Self {
        Self {
            virus_feeding: VirusFeeding::Grow,
            food_tint: Tint::Keep,
            mother_tint: Tint::Jitter { spread: 10 },
        }
    }
}

/// Partial behavior set installed by a game mode.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BehaviorOverlay {
    pub virus_feeding: Option<VirusFeeding>,
    pub food_tint: Option<Tint>,
    pub mother_tint: Option<Tint>,
}

/// Base behaviors plus a stack of mode overlays.
#[derive(Debug, Clone, Default)]
pub struct BehaviorRegistry {
    base: BehaviorSet,
    overlays: Vec<(u32, BehaviorOverlay)>,
}

impl BehaviorRegistry {
    /// Install an overlay owned by `mode_id` on top of the stack.
    pub fn push(&mut self, mode_id: u32, overlay: BehaviorOverlay) {
        self.overlays.push((mode_id, overlay));
    }

    /// Remove the topmost overlay owned by `mode_id`.
    pub fn pop(&mut self, mode_id: u32) -> Option<BehaviorOverlay> {
        let index = self.overlays.iter().rposition(|(id, _)| *id == mode_id)?;
        Some(self.overlays.remove(index).1)
    }

    /// Number of installed overlays.
    pub fn depth(&self) -> usize {
        self.overlays.len()
    }

    /// Resolve the behaviors in effect right now.
    pub fn active(&self) -> BehaviorSet {
        let mut set = self.base;
        for (_, overlay) in &self.overlays {
            if let Some(feeding) = overlay.virus_feeding {
                set.virus_feeding = feeding;
            }
            if let Some(tint) = overlay.food_tint {
                set.food_tint = tint;
            }
            if let Some(tint) = overlay.mother_tint {
                set.mother_tint = tint;
            }
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn themed() -> BehaviorOverlay {
        BehaviorOverlay {
            virus_feeding: Some(VirusFeeding::Push { distance: 320.0 }),
            food_tint: Some(Tint::Themed { spread: 20 }),
            mother_tint: Some(Tint::Themed { spread: 20 }),
        }
    }

    #[test]
    fn overlay_overrides_and_pop_restores() {
        let mut registry = BehaviorRegistry::default();
        let before = registry.active();

        registry.push(3, themed());
        let active = registry.active();
        assert_eq!(active.virus_feeding, VirusFeeding::Push { distance: 320.0 });
        assert_eq!(active.food_tint, Tint::Themed { spread: 20 });

        assert!(registry.pop(3).is_some());
        assert_eq!(registry.active(), before);
    }

    #[test]
    fn repeated_cycles_do_not_drift() {
        let mut registry = BehaviorRegistry::default();
        let before = registry.active();
        for _ in 0..10 {
            registry.push(3, themed());
            registry.pop(3);
        }
        assert_eq!(registry.active(), before);
        assert_eq!(registry.depth(), 0);
    }

    #[test]
    fn partial_overlay_keeps_lower_slots() {
        let mut registry = BehaviorRegistry::default();
        registry.push(3, themed());
        registry.push(
            7,
            BehaviorOverlay {
                food_tint: Some(Tint::Keep),
                ..Default::default()
            },
        );

        let active = registry.active();
        assert_eq!(active.food_tint, Tint::Keep);
        assert_eq!(active.mother_tint, Tint::Themed { spread: 20 });

        // Popping the lower overlay leaves the upper one in place.
        registry.pop(3);
        let active = registry.active();
        assert_eq!(active.food_tint, Tint::Keep);
        assert_eq!(active.virus_feeding, VirusFeeding::Grow);
    }

    #[test]
    fn pop_unknown_mode_is_none() {
        let mut registry = BehaviorRegistry::default();
        assert!(registry.pop(42).is_none());
    }

    #[test]
    fn tints_stay_near_base() {
        let mut rng = StdRng::seed_from_u64(7);
        let base = Color::new(230, 60, 10);
        let current = Color::new(1, 2, 3);
        assert_eq!(Tint::Keep.apply(current, base, &mut rng), current);

        for _ in 0..100 {
            let c = Tint::Themed { spread: 20 }.apply(current, base, &mut rng);
            assert_eq!(c.b, 0);
            assert!((210..=250).contains(&c.r));
            assert_eq!(c.g as i16 - 60, c.r as i16 - 230);

            let c = Tint::Jitter { spread: 10 }.apply(current, base, &mut rng);
            assert!((0..=20).contains(&c.b));
            assert!((220..=240).contains(&c.r));
        }
    }
}

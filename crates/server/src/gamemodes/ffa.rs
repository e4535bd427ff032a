use super::GameMode;

/// Free for all: the field runs with its base behaviors.
pub struct Ffa;

impl Ffa {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Ffa {
    fn default() -> Self {
        Self::new()
    }
}

impl GameMode for Ffa {
    fn name(&self) -> &str {
        "FFA"
    }

    fn id(&self) -> u32 {
        0
    }
}

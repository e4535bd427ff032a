use crate::entity::CellType;
use crate::game::GameState;

pub mod ffa;
pub mod halloween;
mod roster;

pub use roster::Roster;

pub trait GameMode: Send + Sync {
    fn name(&self) -> &str;
    fn id(&self) -> u32;

    /// Called once when the mode becomes active.
    fn on_server_init(&mut self, _state: &mut GameState) {}

    /// Called when the mode is replaced. Must undo everything `on_server_init` installed.
    fn on_change(&mut self, _state: &mut GameState) {}

    fn on_tick(&mut self, _state: &mut GameState) {}

    /// Called for every cell that left the field during the tick.
    fn on_node_removed(&mut self, _id: u32, _cell_type: CellType) {}
}

pub fn get_gamemode(id: u32) -> Box<dyn GameMode> {
    match id {
        3 => Box::new(halloween::Halloween::new()),
        _ => Box::new(ffa::Ffa::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ids_fall_back_to_ffa() {
        assert_eq!(get_gamemode(3).name(), "Halloween");
        assert_eq!(get_gamemode(3).id(), 3);
        assert_eq!(get_gamemode(0).name(), "FFA");
        assert_eq!(get_gamemode(17).id(), 0);
    }
}

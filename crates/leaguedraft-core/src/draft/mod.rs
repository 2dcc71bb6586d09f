pub mod order;
pub mod player;
pub mod snapshot;

//! Domain entities - immutable records fetched from the game API or created
//! during a conversation.

mod game;
mod level;
mod turn;

pub use game::Game;
pub use level::{Level, LevelCatalog};
pub use turn::{Role, Turn};

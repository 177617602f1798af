mod block;
mod coin;
mod goomba;
mod mushroom;
mod patrol;

pub use block::Block;
pub use coin::{Coin, CoinOrigin, COIN_SIZE};
pub use goomba::{Goomba, GoombaContact};
pub use mushroom::{Mushroom, MUSHROOM_SIZE};

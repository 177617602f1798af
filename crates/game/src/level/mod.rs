mod loader;
mod reward;
pub mod tile;

use engine::{
    tile_index, CollisionWorld, DrawList, Easing, EntityId, EntityIdAllocator, Rect, Sequence,
    SpriteDraw, TileCategory, TileGrid, TileQuery, TweenTarget, Vec2,
};
use tracing::{debug, info};

use crate::entities::{Block, Coin, CoinOrigin, Goomba, Mushroom, COIN_SIZE, MUSHROOM_SIZE};
use crate::sound::SoundEvent;

pub use loader::{load_level_grid, parse_level_grid, LevelLoadError};
pub use reward::{BlockReward, RewardPicker, POWER_UP_CHANCE};

const BUMP_HEIGHT: f32 = 5.0;
const BUMP_SECONDS: f32 = 0.1;
const BLOCK_COIN_RISE: f32 = 30.0;
const BLOCK_COIN_SETTLE: f32 = 20.0;
const BLOCK_COIN_PHASE_SECONDS: f32 = 0.5;
const MUSHROOM_POP_SECONDS: f32 = 0.3;
const MUSHROOM_LIFETIME_SECONDS: f32 = 7.0;
const MUSHROOM_FLICKER_SECONDS: f32 = 3.0;
const MUSHROOM_FLICKER_INTERVAL: f32 = 0.1;

/// Properties the level exposes to timed sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelProperty {
    BlockY(EntityId),
    CoinY(EntityId),
    MushroomY(EntityId),
    MushroomOpacity(EntityId),
}

/// Tile grid plus everything that lives on it apart from the player.
///
/// Entities that die or get collected are only flagged; they are dropped at
/// the start of the next `update`, so collections stay stable while the
/// player's interaction pass walks them.
pub struct Level {
    grid: TileGrid,
    pub blocks: Vec<Block>,
    pub goombas: Vec<Goomba>,
    pub coins: Vec<Coin>,
    pub mushrooms: Vec<Mushroom>,
    ids: EntityIdAllocator,
    sounds: Vec<SoundEvent>,
    started: Vec<Sequence<Level>>,
    rewards: RewardPicker,
}

impl Level {
    /// Turns special foreground tiles into entities. Block cells become
    /// `BLANK` so they stay solid; creature and coin cells are cleared.
    pub fn new(mut grid: TileGrid, rewards: RewardPicker) -> Self {
        let ts = grid.tile_size() as f32;
        let special: Vec<(i32, i32, u16)> = grid
            .occupied_cells()
            .filter(|(_, _, id)| matches!(*id, tile::BLOCK | tile::GOOMBA | tile::COIN))
            .collect();

        let mut ids = EntityIdAllocator::default();
        let mut blocks = Vec::new();
        let mut goombas = Vec::new();
        let mut coins = Vec::new();
        for (col, row, id) in special {
            let position = Vec2::new(col as f32 * ts, row as f32 * ts);
            match id {
                tile::BLOCK => {
                    blocks.push(Block::new(ids.allocate(), col, row, ts));
                    grid.set_tile(col, row, Some(tile::BLANK));
                }
                tile::GOOMBA => {
                    goombas.push(Goomba::new(ids.allocate(), position));
                    grid.set_tile(col, row, None);
                }
                _ => {
                    coins.push(Coin::new(ids.allocate(), position, CoinOrigin::Placed));
                    grid.set_tile(col, row, None);
                }
            }
        }

        let level = Self {
            grid,
            blocks,
            goombas,
            coins,
            mushrooms: Vec::new(),
            ids,
            sounds: Vec::new(),
            started: Vec::new(),
            rewards,
        };
        info!(
            width = level.grid.width(),
            height = level.grid.height(),
            blocks = level.blocks.len(),
            goombas = level.goombas.len(),
            coins = level.coins.len(),
            "level_built"
        );
        level
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn update(&mut self, dt: f32) {
        self.prune();
        for goomba in &mut self.goombas {
            goomba.update(&self.grid, dt);
        }
        for coin in &mut self.coins {
            coin.update(dt);
        }
        for mushroom in &mut self.mushrooms {
            mushroom.update(&self.grid, dt);
        }
    }

    fn prune(&mut self) {
        let before = (self.goombas.len(), self.coins.len(), self.mushrooms.len());
        self.goombas.retain(Goomba::is_alive);
        self.coins.retain(|coin| !coin.is_removed());
        self.mushrooms.retain(|mushroom| !mushroom.is_collected());
        let after = (self.goombas.len(), self.coins.len(), self.mushrooms.len());
        if before != after {
            debug!(
                goombas = before.0 - after.0,
                coins = before.1 - after.1,
                mushrooms = before.2 - after.2,
                "entities_pruned"
            );
        }
    }

    pub fn play(&mut self, sound: SoundEvent) {
        self.sounds.push(sound);
    }

    pub fn take_sounds(&mut self) -> Vec<SoundEvent> {
        std::mem::take(&mut self.sounds)
    }

    /// Queues a sequence for the scene's timer to pick up before its next tick.
    pub fn start_sequence(&mut self, sequence: Sequence<Level>) {
        self.started.push(sequence);
    }

    pub fn take_started_sequences(&mut self) -> Vec<Sequence<Level>> {
        std::mem::take(&mut self.started)
    }

    pub fn block(&self, id: EntityId) -> Option<&Block> {
        self.blocks.iter().find(|block| block.id == id)
    }

    pub fn coin(&self, id: EntityId) -> Option<&Coin> {
        self.coins.iter().find(|coin| coin.id == id)
    }

    pub fn mushroom(&self, id: EntityId) -> Option<&Mushroom> {
        self.mushrooms.iter().find(|mushroom| mushroom.id == id)
    }

    fn mushroom_mut(&mut self, id: EntityId) -> Option<&mut Mushroom> {
        self.mushrooms.iter_mut().find(|mushroom| mushroom.id == id)
    }

    /// Flags a coin for removal. Removing an already removed coin is a no-op.
    pub fn remove_coin(&mut self, id: EntityId) -> bool {
        self.coins
            .iter_mut()
            .find(|coin| coin.id == id)
            .is_some_and(Coin::remove)
    }

    /// First hit on a block bumps it and schedules its reward. Later hits
    /// return false and do nothing.
    pub fn hit_block_by_id(&mut self, id: EntityId) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|block| block.id == id) else {
            return false;
        };
        if !block.hit() {
            return false;
        }
        let (col, row) = block.tile();
        debug!(col, row, "block_hit");
        self.play(SoundEvent::Bump);
        self.start_sequence(
            Sequence::new("block_bump")
                .tween(
                    [(LevelProperty::BlockY(id), -BUMP_HEIGHT)],
                    BUMP_SECONDS,
                    Easing::EaseInOutQuad,
                )
                .tween(
                    [(LevelProperty::BlockY(id), BUMP_HEIGHT)],
                    BUMP_SECONDS,
                    Easing::EaseInOutQuad,
                )
                .then(move |level: &mut Level| level.reward_block(id)),
        );
        true
    }

    fn reward_block(&mut self, id: EntityId) {
        let Some(block) = self.blocks.iter_mut().find(|block| block.id == id) else {
            return;
        };
        block.show_hit_frame();
        let home = block.home();
        match self.rewards.roll() {
            BlockReward::PowerUp => {
                self.spawn_mushroom(Vec2::new(home.x, home.y - MUSHROOM_SIZE));
            }
            BlockReward::Coin => {
                self.spawn_block_coin(Vec2::new(home.x, home.y - COIN_SIZE));
            }
        }
    }

    /// Rise-then-settle coin that vanishes with a coin sound.
    pub fn spawn_block_coin(&mut self, position: Vec2) -> EntityId {
        let id = self.ids.allocate();
        self.coins
            .push(Coin::new(id, position, CoinOrigin::FromBlock));
        self.start_sequence(
            Sequence::new("block_coin")
                .tween(
                    [(LevelProperty::CoinY(id), -BLOCK_COIN_RISE)],
                    BLOCK_COIN_PHASE_SECONDS,
                    Easing::EaseOutQuad,
                )
                .tween(
                    [(LevelProperty::CoinY(id), BLOCK_COIN_SETTLE)],
                    BLOCK_COIN_PHASE_SECONDS,
                    Easing::EaseOutQuad,
                )
                .then(move |level: &mut Level| {
                    level.play(SoundEvent::Coin);
                    level.remove_coin(id);
                }),
        );
        id
    }

    /// Power-up that pops out, patrols, flickers near the end of its life and
    /// then expires. The sequence stops touching it once it is collected.
    pub fn spawn_mushroom(&mut self, position: Vec2) -> EntityId {
        let id = self.ids.allocate();
        self.mushrooms.push(Mushroom::new(id, position));
        self.play(SoundEvent::SproutItem);

        let flicker_toggles = (MUSHROOM_FLICKER_SECONDS / MUSHROOM_FLICKER_INTERVAL).round() as usize;
        let mut sequence = Sequence::new("mushroom_lifetime")
            .while_relevant(move |level: &Level| {
                level
                    .mushroom(id)
                    .is_some_and(|mushroom| !mushroom.is_collected())
            })
            .tween(
                [(LevelProperty::MushroomY(id), -MUSHROOM_SIZE)],
                MUSHROOM_POP_SECONDS,
                Easing::EaseOutQuad,
            )
            .then(move |level: &mut Level| {
                if let Some(mushroom) = level.mushroom_mut(id) {
                    mushroom.finish_spawning();
                }
            })
            .wait(MUSHROOM_LIFETIME_SECONDS);
        for _ in 0..flicker_toggles {
            sequence = sequence
                .then(move |level: &mut Level| {
                    if let Some(mushroom) = level.mushroom_mut(id) {
                        mushroom.toggle_opacity();
                    }
                })
                .wait(MUSHROOM_FLICKER_INTERVAL);
        }
        sequence = sequence.then(move |level: &mut Level| {
            if let Some(mushroom) = level.mushroom_mut(id) {
                mushroom.collect();
                debug!(mushroom = id.0, "mushroom_expired");
            }
        });
        self.start_sequence(sequence);
        id
    }

    pub fn draw(&self, frame: &mut DrawList) {
        self.draw_tiles(frame);
        for block in &self.blocks {
            block.draw(frame);
        }
        for coin in &self.coins {
            coin.draw(frame);
        }
        for goomba in &self.goombas {
            goomba.draw(frame);
        }
        for mushroom in &self.mushrooms {
            mushroom.draw(frame);
        }
    }

    fn draw_tiles(&self, frame: &mut DrawList) {
        let ts = self.grid.tile_size() as f32;
        for (col, row, id) in self.grid.occupied_cells() {
            // Blocks draw themselves so the bump offset shows.
            if id == tile::BLANK && self.block_at_tile(col, row).is_some() {
                continue;
            }
            let tint = match tile::category_for(id) {
                TileCategory::OneWayPlatform => [252, 188, 60, 255],
                _ => [200, 76, 12, 255],
            };
            frame.sprite(SpriteDraw {
                rect: Rect::new(
                    Vec2::new(col as f32 * ts, row as f32 * ts),
                    Vec2::new(ts, ts),
                ),
                sprite: "tiles",
                frame: id as usize,
                flip_x: false,
                opacity: 1.0,
                tint,
            });
        }
    }

    fn block_at_tile(&self, col: i32, row: i32) -> Option<&Block> {
        self.blocks.iter().find(|block| block.tile() == (col, row))
    }
}

impl TileQuery for Level {
    fn tile_size(&self) -> i32 {
        self.grid.tile_size()
    }

    fn width(&self) -> i32 {
        self.grid.width()
    }

    fn height(&self) -> i32 {
        self.grid.height()
    }

    fn category_at(&self, col: i32, row: i32) -> TileCategory {
        self.grid.category_at(col, row)
    }
}

impl CollisionWorld for Level {
    type BlockRef = EntityId;

    fn block_at(&self, pixel_x: f32, pixel_y: f32) -> Option<EntityId> {
        let ts = self.grid.tile_size();
        self.block_at_tile(tile_index(pixel_x, ts), tile_index(pixel_y, ts))
            .map(|block| block.id)
    }

    fn is_block_hit(&self, block: EntityId) -> bool {
        self.block(block).map_or(true, Block::is_hit)
    }

    fn hit_block(&mut self, block: EntityId) -> bool {
        self.hit_block_by_id(block)
    }
}

impl TweenTarget for Level {
    type Property = LevelProperty;

    fn read(&self, property: LevelProperty) -> Option<f32> {
        match property {
            LevelProperty::BlockY(id) => self.block(id).map(|block| block.body.position.y),
            LevelProperty::CoinY(id) => self.coin(id).map(|coin| coin.body.position.y),
            LevelProperty::MushroomY(id) => self.mushroom(id).map(|m| m.body.position.y),
            LevelProperty::MushroomOpacity(id) => self.mushroom(id).map(|m| m.opacity),
        }
    }

    fn write(&mut self, property: LevelProperty, value: f32) -> bool {
        let slot = match property {
            LevelProperty::BlockY(id) => self
                .blocks
                .iter_mut()
                .find(|block| block.id == id)
                .map(|block| &mut block.body.position.y),
            LevelProperty::CoinY(id) => self
                .coins
                .iter_mut()
                .find(|coin| coin.id == id)
                .map(|coin| &mut coin.body.position.y),
            LevelProperty::MushroomY(id) => self.mushroom_mut(id).map(|m| &mut m.body.position.y),
            LevelProperty::MushroomOpacity(id) => self.mushroom_mut(id).map(|m| &mut m.opacity),
        };
        match slot {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// Builds a grid from ASCII rows: `#` ground, `=` one-way platform, `B` block,
/// `G` goomba, `C` coin, anything else empty.
#[cfg(test)]
pub(crate) fn test_grid(rows: &[&str]) -> TileGrid {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |row| row.len()) as u32;
    let cells = rows
        .iter()
        .flat_map(|row| row.chars())
        .map(|ch| match ch {
            '#' => Some(0),
            '=' => Some(tile::PLATFORM_LEFT),
            'B' => Some(tile::BLOCK),
            'G' => Some(tile::GOOMBA),
            'C' => Some(tile::COIN),
            _ => None,
        })
        .collect();
    TileGrid::new(width, height, tile::TILE_SIZE, cells, tile::category_for).expect("test grid")
}

#[cfg(test)]
pub(crate) fn test_level(rows: &[&str], reward: BlockReward) -> Level {
    Level::new(test_grid(rows), RewardPicker::fixed(reward))
}

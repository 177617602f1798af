use engine::{
    Camera2D, DrawList, InputAction, InputSnapshot, Rect, Scene, SceneCommand, TileGrid,
    TileQuery, Timer, Vec2,
};
use tracing::{debug, info};

use crate::config::DebugOptions;
use crate::level::{Level, RewardPicker};
use crate::player::{Player, PlayerConfig, PLAYER_SPAWN};

const SKY: [u8; 4] = [92, 148, 252, 255];
const PLAYER_OUTLINE: [u8; 4] = [0, 0, 255, 255];
const CREATURE_OUTLINE: [u8; 4] = [255, 0, 0, 255];
const PICKUP_OUTLINE: [u8; 4] = [255, 255, 0, 255];

/// How a fresh run seeds its block rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardSeed {
    Entropy,
    Seeded(u64),
}

impl RewardSeed {
    fn picker(self) -> RewardPicker {
        match self {
            RewardSeed::Entropy => RewardPicker::from_entropy(),
            RewardSeed::Seeded(seed) => RewardPicker::seeded(seed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaySettings {
    pub player: PlayerConfig,
    pub rewards: RewardSeed,
    pub debug: DebugOptions,
    pub viewport: Vec2,
}

/// One playable level. Restarting rebuilds everything from the loaded map.
pub struct PlayScene {
    template: TileGrid,
    settings: PlaySettings,
    level: Level,
    player: Player,
    timer: Timer<Level>,
    ticks: u64,
}

impl PlayScene {
    pub fn new(template: TileGrid, settings: PlaySettings) -> Self {
        let (level, player) = fresh_run(&template, &settings);
        Self {
            template,
            settings,
            level,
            player,
            timer: Timer::new(),
            ticks: 0,
        }
    }

    /// Built with a fixed reward so tests see a known outcome.
    #[cfg(test)]
    fn with_rewards(template: TileGrid, settings: PlaySettings, rewards: RewardPicker) -> Self {
        let mut level = Level::new(template.clone(), rewards);
        let player = Player::new(PLAYER_SPAWN, settings.player, &mut level);
        Self {
            template,
            settings,
            level,
            player,
            timer: Timer::new(),
            ticks: 0,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Scheduler, then level entities, then the player and its contacts.
    pub fn step(&mut self, dt: f32, input: &InputSnapshot) {
        self.timer.adopt(self.level.take_started_sequences());
        self.timer.update(&mut self.level, dt);
        self.level.update(dt);
        self.player.update(dt, input, &mut self.level);

        for sound in self.level.take_sounds() {
            debug!(sound = sound.name(), tick = self.ticks, "sound_event");
        }
        self.ticks += 1;
    }

    fn camera(&self) -> Camera2D {
        let world = Vec2::new(self.level.pixel_width(), self.level.pixel_height());
        Camera2D::follow(
            self.player.body().rect().center(),
            self.settings.viewport,
            world,
        )
    }

    fn draw_debug(&self, frame: &mut DrawList) {
        frame.outline(self.player.body().rect(), PLAYER_OUTLINE);
        for goomba in &self.level.goombas {
            frame.outline(goomba.body.rect(), CREATURE_OUTLINE);
        }
        for mushroom in &self.level.mushrooms {
            frame.outline(mushroom.body.rect(), PICKUP_OUTLINE);
        }
        for coin in &self.level.coins {
            frame.outline(Rect::new(coin.body.position, coin.body.size), PICKUP_OUTLINE);
        }
    }
}

fn fresh_run(template: &TileGrid, settings: &PlaySettings) -> (Level, Player) {
    let mut level = Level::new(template.clone(), settings.rewards.picker());
    let player = Player::new(PLAYER_SPAWN, settings.player, &mut level);
    (level, player)
}

impl Scene for PlayScene {
    fn load(&mut self) {
        let (level, player) = fresh_run(&self.template, &self.settings);
        self.level = level;
        self.player = player;
        self.timer.clear();
        self.ticks = 0;
        info!(
            goombas = self.level.goombas.len(),
            blocks = self.level.blocks.len(),
            coins = self.level.coins.len(),
            "scene_loaded"
        );
    }

    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        if input.quit_requested() {
            return SceneCommand::Quit;
        }
        if input.is_pressed(InputAction::Restart) {
            return SceneCommand::HardReset;
        }
        self.step(fixed_dt_seconds, input);
        SceneCommand::None
    }

    fn render(&self, frame: &mut DrawList) {
        frame.set_clear_color(SKY);
        frame.set_camera(self.camera());
        self.level.draw(frame);
        self.player.draw(frame);
        if self.settings.debug.collision {
            self.draw_debug(frame);
        }
    }

    fn unload(&mut self) {
        info!(ticks = self.ticks, pending_sequences = self.timer.len(), "scene_unloaded");
    }

    fn debug_title(&self) -> Option<String> {
        let state = self
            .player
            .state()
            .map_or_else(|| "-".to_string(), |state| format!("{state:?}"));
        Some(format!(
            "Platformer | {state} | {}",
            if self.player.is_big() { "big" } else { "small" }
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{test_grid, BlockReward};
    use crate::player::PlayerStateName;
    use engine::DrawCommand;

    const DT: f32 = 1.0 / 60.0;

    fn settings(debug: DebugOptions) -> PlaySettings {
        PlaySettings {
            player: PlayerConfig::default(),
            rewards: RewardSeed::Seeded(1),
            debug,
            viewport: Vec2::new(320.0, 240.0),
        }
    }

    /// 40x15 tiles with ground from row 11 down and a block two tiles above
    /// the spawn point's head.
    fn course() -> TileGrid {
        let mut rows: Vec<String> = (0..15)
            .map(|row| if row >= 11 { "#" } else { "." }.repeat(40))
            .collect();
        rows[8].replace_range(3..4, "B");
        rows[10].replace_range(35..36, "G");
        rows[10].replace_range(10..11, "C");
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        test_grid(&refs)
    }

    fn scene(reward: BlockReward) -> PlayScene {
        PlayScene::with_rewards(
            course(),
            settings(DebugOptions::default()),
            RewardPicker::fixed(reward),
        )
    }

    fn run(scene: &mut PlayScene, input: &InputSnapshot, ticks: usize) {
        for _ in 0..ticks {
            assert_eq!(scene.update(DT, input), SceneCommand::None);
        }
    }

    #[test]
    fn player_settles_on_ground_at_spawn() {
        let mut scene = scene(BlockReward::Coin);
        run(&mut scene, &InputSnapshot::empty(), 60);
        assert_eq!(scene.player().body().bottom(), 176.0);
        assert_eq!(scene.player().state(), Some(PlayerStateName::Idling));
    }

    #[test]
    fn restart_press_requests_hard_reset() {
        let mut scene = scene(BlockReward::Coin);
        let restart = InputSnapshot::empty().with_action_pressed(InputAction::Restart);
        assert_eq!(scene.update(DT, &restart), SceneCommand::HardReset);
    }

    #[test]
    fn block_reward_mushroom_grows_player_under_it() {
        let mut scene = scene(BlockReward::PowerUp);
        run(&mut scene, &InputSnapshot::empty(), 60);
        let jump = InputSnapshot::empty().with_action_pressed(InputAction::Jump);
        run(&mut scene, &jump, 1);
        let held = InputSnapshot::empty().with_action_down(InputAction::Jump, true);
        run(&mut scene, &held, 30);
        assert!(scene.level().blocks[0].is_hit());

        let walk_right = InputSnapshot::empty().with_action_down(InputAction::MoveRight, true);
        let mut grew = false;
        for tick in 0..240 {
            let input = if tick < 90 {
                InputSnapshot::empty()
            } else {
                walk_right
            };
            scene.step(DT, &input);
            if scene.player().is_big() {
                grew = true;
                break;
            }
        }
        assert!(grew);
    }

    #[test]
    fn goombas_patrol_from_spawn() {
        let mut scene = scene(BlockReward::Coin);
        let start = scene.level().goombas[0].body.position.x;
        run(&mut scene, &InputSnapshot::empty(), 30);
        assert!(scene.level().goombas[0].body.position.x > start);
    }

    #[test]
    fn load_rebuilds_level_from_template() {
        let mut scene = scene(BlockReward::Coin);
        scene.level.goombas[0].die();
        run(&mut scene, &InputSnapshot::empty(), 1);
        assert!(scene.level().goombas.is_empty());

        scene.load();
        assert_eq!(scene.level().goombas.len(), 1);
        assert_eq!(scene.player().body().position, PLAYER_SPAWN);
    }

    #[test]
    fn render_follows_player_and_outlines_in_debug() {
        let plain = scene(BlockReward::Coin);
        let mut frame = DrawList::default();
        plain.render(&mut frame);
        assert!(!frame
            .commands()
            .iter()
            .any(|command| matches!(command, DrawCommand::Outline { .. })));
        assert_eq!(frame.camera().position.x, 0.0);

        let debug = PlayScene::with_rewards(
            course(),
            settings(DebugOptions { collision: true }),
            RewardPicker::fixed(BlockReward::Coin),
        );
        let mut frame = DrawList::default();
        debug.render(&mut frame);
        let outlines = frame
            .commands()
            .iter()
            .filter(|command| matches!(command, DrawCommand::Outline { .. }))
            .count();
        // Player, one goomba, one coin.
        assert_eq!(outlines, 3);
    }

    #[test]
    fn debug_title_names_state_and_size() {
        let scene = scene(BlockReward::Coin);
        assert_eq!(
            scene.debug_title().as_deref(),
            Some("Platformer | Idling | small")
        );
    }
}

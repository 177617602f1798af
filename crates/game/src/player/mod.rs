mod config;
mod physics;
mod states;

use engine::{
    Animation, Body, DrawList, EntityId, InputSnapshot, SpriteDraw, StateMachine, TileQuery,
    Vec2,
};
use tracing::{debug, info};

use crate::entities::GoombaContact;
use crate::level::Level;
use crate::sound::SoundEvent;

pub use config::{load_tuning, PlayerConfig, TuningError};
pub use states::{PlayerEnv, PlayerState, PlayerStateName};

pub const PLAYER_SPAWN: Vec2 = Vec2::new(50.0, 150.0);
pub const PLAYER_WIDTH: f32 = 16.0;
pub const SMALL_HEIGHT: f32 = 24.0;
pub const BIG_HEIGHT: f32 = 32.0;
pub const SHRINK_INVINCIBILITY_SECONDS: f32 = 2.0;

const WALK_FRAMES: usize = 3;
const WALK_INTERVAL: f32 = 0.07;
const RESIZE_FRAMES: usize = 11;
const RESIZE_INTERVAL: f32 = 0.1;
const FLICKER_RATE: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerClip {
    Idle,
    Walk,
    Jump,
    Fall,
    Skid,
    Grow,
    Shrink,
}

impl PlayerClip {
    fn animation(self) -> Animation {
        match self {
            PlayerClip::Walk => Animation::looping(WALK_FRAMES, WALK_INTERVAL),
            PlayerClip::Grow | PlayerClip::Shrink => Animation::once(RESIZE_FRAMES, RESIZE_INTERVAL),
            PlayerClip::Idle | PlayerClip::Jump | PlayerClip::Fall | PlayerClip::Skid => {
                Animation::still()
            }
        }
    }

    fn sprite(self, big: bool) -> &'static str {
        match (self, big) {
            (PlayerClip::Grow, _) => "player_grow",
            (PlayerClip::Shrink, _) => "player_shrink",
            (_, true) => "player_big",
            (_, false) => "player_small",
        }
    }
}

/// The player's data as driven by its state graph.
#[derive(Debug, Clone)]
pub struct Avatar {
    pub body: Body,
    pub facing_right: bool,
    pub big: bool,
    /// Seconds of invincibility left; zero when vulnerable.
    pub invincibility: f32,
    pub jump_time: f32,
    pub clip: PlayerClip,
    pub animation: Animation,
    pub config: PlayerConfig,
}

impl Avatar {
    pub fn new(position: Vec2, config: PlayerConfig) -> Self {
        Self {
            body: Body::new(position, Vec2::new(PLAYER_WIDTH, SMALL_HEIGHT)),
            facing_right: true,
            big: false,
            invincibility: 0.0,
            jump_time: 0.0,
            clip: PlayerClip::Idle,
            animation: PlayerClip::Idle.animation(),
            config,
        }
    }

    pub fn set_clip(&mut self, clip: PlayerClip) {
        self.clip = clip;
        self.animation = clip.animation();
    }

    /// Box height the current size flag calls for.
    pub fn target_height(&self) -> f32 {
        if self.big {
            BIG_HEIGHT
        } else {
            SMALL_HEIGHT
        }
    }

    pub fn is_invincible(&self) -> bool {
        self.invincibility > 0.0
    }

    pub fn draw(&self, frame: &mut DrawList) {
        let visible = !self.is_invincible() || (self.invincibility * FLICKER_RATE) as i32 % 2 == 0;
        frame.sprite(SpriteDraw {
            rect: self.body.rect(),
            sprite: self.clip.sprite(self.big),
            frame: self.animation.frame(),
            flip_x: self.facing_right,
            opacity: if visible { 1.0 } else { 0.35 },
            tint: [216, 40, 0, 255],
        });
    }
}

pub struct Player {
    avatar: Avatar,
    spawn: Vec2,
    fsm: StateMachine<PlayerState>,
}

impl Player {
    pub fn new(spawn: Vec2, config: PlayerConfig, level: &mut Level) -> Self {
        let mut fsm = StateMachine::new();
        for name in PlayerStateName::ALL {
            fsm.add(name, PlayerState::for_name(name));
        }
        let mut player = Self {
            avatar: Avatar::new(spawn, config),
            spawn,
            fsm,
        };
        let input = InputSnapshot::empty();
        player.change(PlayerStateName::Idling, &input, level);
        player
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn body(&self) -> &Body {
        &self.avatar.body
    }

    pub fn state(&self) -> Option<PlayerStateName> {
        self.fsm.current()
    }

    pub fn is_big(&self) -> bool {
        self.avatar.big
    }

    pub fn is_invincible(&self) -> bool {
        self.avatar.is_invincible()
    }

    pub fn invincibility_remaining(&self) -> f32 {
        self.avatar.invincibility
    }

    fn change(&mut self, name: PlayerStateName, input: &InputSnapshot, level: &mut Level) {
        let mut env = PlayerEnv { input, level };
        self.fsm.change(name, &mut self.avatar, &mut env);
    }

    /// One tick: the state graph moves the avatar, then the player resolves
    /// contacts with that tick's final positions.
    pub fn update(&mut self, dt: f32, input: &InputSnapshot, level: &mut Level) {
        {
            let mut env = PlayerEnv {
                input,
                level: &mut *level,
            };
            self.fsm.update(&mut self.avatar, &mut env, dt);
        }

        if self.avatar.body.top() > level.pixel_height() {
            info!("player_fell_out");
            self.die();
        }

        self.collect_coins(level);
        self.collect_mushrooms(input, level);
        if self.avatar.is_invincible() {
            self.avatar.invincibility = (self.avatar.invincibility - dt).max(0.0);
        }
        self.touch_goombas(input, level);
    }

    fn collect_coins(&mut self, level: &mut Level) {
        let touched: Vec<EntityId> = level
            .coins
            .iter()
            .filter(|coin| coin.is_collectible() && coin.body.overlaps(&self.avatar.body))
            .map(|coin| coin.id)
            .collect();
        for id in touched {
            if level.remove_coin(id) {
                level.play(SoundEvent::Coin);
            }
        }
    }

    fn collect_mushrooms(&mut self, input: &InputSnapshot, level: &mut Level) {
        let touched: Vec<usize> = level
            .mushrooms
            .iter()
            .enumerate()
            .filter(|(_, mushroom)| {
                !mushroom.is_collected() && mushroom.body.overlaps(&self.avatar.body)
            })
            .map(|(index, _)| index)
            .collect();
        for index in touched {
            if !level.mushrooms[index].collect() {
                continue;
            }
            if !self.avatar.big {
                level.play(SoundEvent::Powerup);
                self.grow(input, level);
            }
        }
    }

    fn is_vulnerable(&self) -> bool {
        !self.avatar.is_invincible() && self.fsm.current() != Some(PlayerStateName::Shrinking)
    }

    fn touch_goombas(&mut self, input: &InputSnapshot, level: &mut Level) {
        for index in 0..level.goombas.len() {
            if !self.is_vulnerable() {
                return;
            }
            match level.goombas[index].contact_with(&self.avatar.body) {
                Some(GoombaContact::Stomped) => {
                    level.goombas[index].die();
                    level.play(SoundEvent::Stomp);
                    debug!(goomba = level.goombas[index].id.0, "goomba_stomped");
                }
                Some(GoombaContact::HurtPlayer) => {
                    if self.avatar.big {
                        self.shrink(input, level);
                    } else {
                        self.die();
                    }
                }
                None => {}
            }
        }
    }

    pub fn grow(&mut self, input: &InputSnapshot, level: &mut Level) {
        self.change(PlayerStateName::Growing, input, level);
    }

    pub fn shrink(&mut self, input: &InputSnapshot, level: &mut Level) {
        self.change(PlayerStateName::Shrinking, input, level);
    }

    /// Back to the spawn point. Size and state graph position are kept.
    pub fn die(&mut self) {
        self.avatar.body.position = self.spawn;
        self.avatar.body.velocity = Vec2::default();
        self.avatar.invincibility = 0.0;
        info!(x = self.spawn.x, y = self.spawn.y, "player_died");
    }

    pub fn draw(&self, frame: &mut DrawList) {
        self.fsm.render(&self.avatar, frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{test_level, BlockReward};
    use engine::InputAction;

    const DT: f32 = 1.0 / 60.0;
    /// Ground top of `flat_rows`.
    const GROUND_Y: f32 = 144.0;
    const STANDING_Y: f32 = GROUND_Y - SMALL_HEIGHT;

    /// 20x10 tiles with solid ground on the last row and `extra` drawn over
    /// the empty rows as `(row, col, ch)`.
    fn rows_with(extra: &[(usize, usize, char)]) -> Vec<String> {
        let mut rows: Vec<Vec<char>> = (0..10)
            .map(|row| vec![if row == 9 { '#' } else { '.' }; 20])
            .collect();
        for &(row, col, ch) in extra {
            rows[row][col] = ch;
        }
        rows.into_iter().map(|row| row.into_iter().collect()).collect()
    }

    fn level_with(extra: &[(usize, usize, char)]) -> Level {
        let rows = rows_with(extra);
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        test_level(&refs, BlockReward::Coin)
    }

    fn standing_player(level: &mut Level) -> Player {
        let mut player = Player::new(Vec2::new(32.0, STANDING_Y), PlayerConfig::default(), level);
        player.update(DT, &idle(), level);
        assert!(player.body().grounded);
        player
    }

    fn idle() -> InputSnapshot {
        InputSnapshot::empty()
    }

    fn hold(action: InputAction) -> InputSnapshot {
        InputSnapshot::empty().with_action_down(action, true)
    }

    fn press(action: InputAction) -> InputSnapshot {
        InputSnapshot::empty().with_action_pressed(action)
    }

    fn run(player: &mut Player, level: &mut Level, input: &InputSnapshot, ticks: usize) {
        for _ in 0..ticks {
            player.update(DT, input, level);
        }
    }

    fn run_until_idle(player: &mut Player, level: &mut Level) {
        for _ in 0..200 {
            if player.state() == Some(PlayerStateName::Idling) {
                return;
            }
            player.update(DT, &idle(), level);
        }
        panic!("player never settled, still {:?}", player.state());
    }

    #[test]
    fn starts_idle_and_lands_on_ground() {
        let mut level = level_with(&[]);
        let player = standing_player(&mut level);
        assert_eq!(player.state(), Some(PlayerStateName::Idling));
        assert_eq!(player.body().bottom(), GROUND_Y);
        assert!(!player.is_big());
    }

    #[test]
    fn both_directions_held_never_leaves_idle() {
        let mut level = level_with(&[]);
        let mut player = standing_player(&mut level);
        let both = hold(InputAction::MoveLeft).with_action_down(InputAction::MoveRight, true);
        for _ in 0..30 {
            player.update(DT, &both, &mut level);
            assert_eq!(player.state(), Some(PlayerStateName::Idling));
        }
        assert_eq!(player.body().velocity.x, 0.0);
    }

    #[test]
    fn walking_then_reversing_skids_then_walks() {
        let mut level = level_with(&[]);
        let mut player = standing_player(&mut level);
        let right = hold(InputAction::MoveRight);
        player.update(DT, &right, &mut level);
        assert_eq!(player.state(), Some(PlayerStateName::Walking));
        run(&mut player, &mut level, &right, 12);
        assert_eq!(player.body().velocity.x, 100.0);

        let left = hold(InputAction::MoveLeft);
        player.update(DT, &left, &mut level);
        assert_eq!(player.state(), Some(PlayerStateName::Skidding));
        assert!(!player.avatar().facing_right);

        for _ in 0..20 {
            player.update(DT, &left, &mut level);
            if player.state() != Some(PlayerStateName::Skidding) {
                break;
            }
        }
        assert_eq!(player.state(), Some(PlayerStateName::Walking));
        assert_eq!(player.body().velocity.x, 0.0);
    }

    #[test]
    fn releasing_direction_walks_to_a_stop() {
        let mut level = level_with(&[]);
        let mut player = standing_player(&mut level);
        run(&mut player, &mut level, &hold(InputAction::MoveRight), 5);
        run(&mut player, &mut level, &idle(), 10);
        assert_eq!(player.state(), Some(PlayerStateName::Idling));
        assert_eq!(player.body().velocity.x, 0.0);
    }

    #[test]
    fn walking_off_a_ledge_falls() {
        let gap: Vec<(usize, usize, char)> = (4..8).map(|col| (9, col, '.')).collect();
        let mut level = level_with(&gap);
        let mut player = standing_player(&mut level);
        let right = hold(InputAction::MoveRight);
        let mut fell = false;
        for _ in 0..60 {
            player.update(DT, &right, &mut level);
            if player.state() == Some(PlayerStateName::Falling) {
                fell = true;
                break;
            }
        }
        assert!(fell);
        assert!(!player.body().grounded);
    }

    #[test]
    fn jump_press_enters_jumping_with_full_power() {
        let mut level = level_with(&[]);
        let mut player = standing_player(&mut level);
        let _ = level.take_sounds();
        player.update(DT, &press(InputAction::Jump), &mut level);
        assert_eq!(player.state(), Some(PlayerStateName::Jumping));
        assert_eq!(player.body().velocity.y, -350.0);
        assert_eq!(level.take_sounds(), vec![SoundEvent::Jump]);
    }

    #[test]
    fn held_jump_follows_boost_curve() {
        let mut level = level_with(&[]);
        let mut player = standing_player(&mut level);
        let config = PlayerConfig::default();
        player.update(DT, &press(InputAction::Jump), &mut level);

        let held = hold(InputAction::Jump);
        for _ in 0..15 {
            player.update(DT, &held, &mut level);
            let t = player.avatar().jump_time;
            assert!(t <= config.max_jump_time);
            let expected = config.jump_power * (1.0 - t / config.max_jump_time);
            assert_eq!(player.body().velocity.y, expected);
        }
        assert!((player.avatar().jump_time - 15.0 * DT).abs() < 1e-4);
    }

    #[test]
    fn releasing_jump_halves_velocity_once() {
        let mut level = level_with(&[]);
        let mut player = standing_player(&mut level);
        let config = PlayerConfig::default();
        player.update(DT, &press(InputAction::Jump), &mut level);
        run(&mut player, &mut level, &hold(InputAction::Jump), 2);

        let before = player.body().velocity.y;
        player.update(DT, &idle(), &mut level);
        let halved = ((before + config.gravity * DT).min(config.max_fall_speed)) * 0.5;
        assert_eq!(player.body().velocity.y, halved);

        player.update(DT, &idle(), &mut level);
        assert_eq!(player.state(), Some(PlayerStateName::Jumping));
        assert_eq!(player.body().velocity.y, halved + config.gravity * DT);

        // Pressing again mid-air neither re-halves nor re-boosts.
        let after = player.body().velocity.y;
        player.update(DT, &hold(InputAction::Jump), &mut level);
        assert_eq!(player.body().velocity.y, after + config.gravity * DT);
    }

    #[test]
    fn jump_lands_back_in_idle() {
        let mut level = level_with(&[]);
        let mut player = standing_player(&mut level);
        player.update(DT, &press(InputAction::Jump), &mut level);
        let mut saw_falling = false;
        for _ in 0..180 {
            player.update(DT, &idle(), &mut level);
            saw_falling |= player.state() == Some(PlayerStateName::Falling);
        }
        assert!(saw_falling);
        assert_eq!(player.state(), Some(PlayerStateName::Idling));
        assert_eq!(player.body().position.y, STANDING_Y);
        assert!(player.body().grounded);
    }

    #[test]
    fn jumping_into_block_hits_it_once() {
        let mut level = level_with(&[(6, 2, 'B')]);
        let mut player = standing_player(&mut level);
        let _ = level.take_sounds();

        player.update(DT, &press(InputAction::Jump), &mut level);
        run(&mut player, &mut level, &hold(InputAction::Jump), 3);

        assert!(level.blocks[0].is_hit());
        let sounds = level.take_sounds();
        assert_eq!(
            sounds.iter().filter(|s| **s == SoundEvent::Bump).count(),
            1
        );
        assert_eq!(player.body().top(), 112.0);
        assert_eq!(player.state(), Some(PlayerStateName::Falling));
        assert_eq!(level.take_started_sequences().len(), 1);
    }

    #[test]
    fn placed_coin_is_collected_and_block_coin_is_not() {
        let mut level = level_with(&[(8, 2, 'C')]);
        let mut player = standing_player(&mut level);
        let block_coin = level.spawn_block_coin(Vec2::new(32.0, 120.0));
        player.update(DT, &idle(), &mut level);

        assert!(level.coins.iter().any(|coin| coin.is_removed()));
        assert!(level
            .coin(block_coin)
            .is_some_and(|coin| !coin.is_removed()));
        assert!(level.take_sounds().contains(&SoundEvent::Coin));
        level.update(DT);
        assert_eq!(level.coins.len(), 1);
    }

    #[test]
    fn mushroom_grows_small_player() {
        let mut level = level_with(&[]);
        let mut player = standing_player(&mut level);
        let mushroom = level.spawn_mushroom(Vec2::new(32.0, 128.0));
        let _ = level.take_sounds();

        player.update(DT, &idle(), &mut level);
        assert_eq!(player.state(), Some(PlayerStateName::Growing));
        assert!(player.is_big());
        assert_eq!(player.body().size.y, BIG_HEIGHT);
        assert_eq!(player.body().bottom(), GROUND_Y);
        assert_eq!(level.take_sounds(), vec![SoundEvent::Powerup]);
        assert!(level.mushroom(mushroom).is_some_and(|m| m.is_collected()));

        run_until_idle(&mut player, &mut level);
        assert!(player.is_big());
        assert_eq!(player.body().size.y, BIG_HEIGHT);
    }

    #[test]
    fn mushroom_is_only_consumed_when_already_big() {
        let mut level = level_with(&[]);
        let mut player = standing_player(&mut level);
        player.grow(&idle(), &mut level);
        run_until_idle(&mut player, &mut level);
        let _ = level.take_sounds();

        let mushroom = level.spawn_mushroom(Vec2::new(32.0, 128.0));
        let _ = level.take_sounds();
        player.update(DT, &idle(), &mut level);
        assert_eq!(player.state(), Some(PlayerStateName::Idling));
        assert!(level.take_sounds().is_empty());
        assert!(level.mushroom(mushroom).is_some_and(|m| m.is_collected()));
    }

    #[test]
    fn grow_then_shrink_leaves_box_unchanged() {
        let mut level = level_with(&[]);
        let mut player = standing_player(&mut level);
        let start = *player.body();

        player.grow(&idle(), &mut level);
        assert_eq!(player.body().position.y, start.position.y - 8.0);
        run_until_idle(&mut player, &mut level);

        player.shrink(&idle(), &mut level);
        run_until_idle(&mut player, &mut level);
        assert_eq!(player.body().size, start.size);
        assert_eq!(player.body().position.y, start.position.y);
    }

    #[test]
    fn stomping_goomba_kills_it_and_spares_player() {
        let mut level = level_with(&[(8, 5, 'G')]);
        let mut player = standing_player(&mut level);
        let goomba_top = level.goombas[0].body.top();
        player.avatar.body.position = Vec2::new(80.0, goomba_top + 1.0 - SMALL_HEIGHT);
        let _ = level.take_sounds();

        player.update(DT, &idle(), &mut level);
        assert!(!level.goombas[0].is_alive());
        assert_eq!(level.take_sounds(), vec![SoundEvent::Stomp]);
        assert_eq!(player.body().position.x, 80.0);
        assert!(!player.is_big());
    }

    #[test]
    fn side_contact_while_small_resets_to_spawn() {
        let mut level = level_with(&[(8, 5, 'G')]);
        let mut player = standing_player(&mut level);
        player.avatar.body.position.x = 65.0;

        player.update(DT, &idle(), &mut level);
        assert_eq!(player.body().position, Vec2::new(32.0, STANDING_Y));
        assert_eq!(player.body().velocity, Vec2::default());
        assert!(level.goombas[0].is_alive());
    }

    #[test]
    fn side_contact_while_big_shrinks_with_invincibility() {
        let mut level = level_with(&[(8, 5, 'G')]);
        let mut player = standing_player(&mut level);
        player.grow(&idle(), &mut level);
        run_until_idle(&mut player, &mut level);
        let _ = level.take_sounds();

        player.avatar.body.position.x = 65.0;
        player.update(DT, &idle(), &mut level);
        assert_eq!(player.state(), Some(PlayerStateName::Shrinking));
        assert!(!player.is_big());
        assert_eq!(level.take_sounds(), vec![SoundEvent::Hit]);

        // Still overlapping while the shrink plays: ignored.
        let mut ticks = 0;
        while player.state() == Some(PlayerStateName::Shrinking) {
            player.update(DT, &idle(), &mut level);
            assert_eq!(player.body().position.x, 65.0);
            ticks += 1;
            assert!(ticks < 120);
        }
        assert_eq!(player.body().size.y, SMALL_HEIGHT);
        assert!(player.is_invincible());
        assert!((player.invincibility_remaining() - (SHRINK_INVINCIBILITY_SECONDS - DT)).abs() < 1e-4);

        let mut invincible_ticks = 1;
        while player.is_invincible() {
            player.update(DT, &idle(), &mut level);
            if player.is_invincible() {
                invincible_ticks += 1;
                assert_eq!(player.body().position.x, 65.0);
            }
            assert!(invincible_ticks <= 121);
        }
        assert!((118..=121).contains(&invincible_ticks), "{invincible_ticks}");

        // The tick invincibility runs out the goomba connects again.
        assert_eq!(player.body().position, Vec2::new(32.0, STANDING_Y));
    }

    #[test]
    fn falling_out_of_map_respawns() {
        let mut level = test_level(&["....", "....", "...."], BlockReward::Coin);
        let spawn = Vec2::new(16.0, 0.0);
        let mut player = Player::new(spawn, PlayerConfig::default(), &mut level);
        let mut respawned = false;
        let mut lowest: f32 = 0.0;
        for _ in 0..120 {
            player.update(DT, &idle(), &mut level);
            if player.body().position == spawn && lowest > 0.0 {
                respawned = true;
                break;
            }
            lowest = lowest.max(player.body().position.y);
        }
        assert!(respawned);
        assert_eq!(player.body().velocity, Vec2::default());
    }

    #[test]
    fn draw_emits_player_sprite() {
        let mut level = level_with(&[]);
        let player = standing_player(&mut level);
        let mut frame = DrawList::default();
        player.draw(&mut frame);
        assert_eq!(frame.commands().len(), 1);
    }
}

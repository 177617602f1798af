use engine::{DrawList, InputAction, InputSnapshot, State};

use super::physics::{self, STOP_EPSILON};
use super::{Avatar, PlayerClip, SHRINK_INVINCIBILITY_SECONDS};
use crate::level::Level;
use crate::sound::SoundEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerStateName {
    Idling,
    Walking,
    Skidding,
    Jumping,
    Falling,
    Growing,
    Shrinking,
}

impl PlayerStateName {
    pub const ALL: [PlayerStateName; 7] = [
        PlayerStateName::Idling,
        PlayerStateName::Walking,
        PlayerStateName::Skidding,
        PlayerStateName::Jumping,
        PlayerStateName::Falling,
        PlayerStateName::Growing,
        PlayerStateName::Shrinking,
    ];
}

/// Everything outside the avatar a player state may touch during one call.
pub struct PlayerEnv<'e> {
    pub input: &'e InputSnapshot,
    pub level: &'e mut Level,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerState {
    Idling,
    Walking,
    Skidding,
    Jumping { halved: bool, boosting: bool },
    Falling,
    Growing,
    Shrinking,
}

impl PlayerState {
    pub fn for_name(name: PlayerStateName) -> Self {
        match name {
            PlayerStateName::Idling => PlayerState::Idling,
            PlayerStateName::Walking => PlayerState::Walking,
            PlayerStateName::Skidding => PlayerState::Skidding,
            PlayerStateName::Jumping => PlayerState::Jumping {
                halved: false,
                boosting: true,
            },
            PlayerStateName::Falling => PlayerState::Falling,
            PlayerStateName::Growing => PlayerState::Growing,
            PlayerStateName::Shrinking => PlayerState::Shrinking,
        }
    }
}

impl State for PlayerState {
    type Key = PlayerStateName;
    type Actor = Avatar;
    type Env<'e> = PlayerEnv<'e>;

    fn enter<'e>(&mut self, avatar: &mut Avatar, env: &mut PlayerEnv<'e>) {
        match self {
            PlayerState::Idling => {
                avatar.body.velocity.x = 0.0;
                avatar.body.velocity.y = 0.0;
                avatar.set_clip(PlayerClip::Idle);
            }
            PlayerState::Walking => avatar.set_clip(PlayerClip::Walk),
            PlayerState::Skidding => avatar.set_clip(PlayerClip::Skid),
            PlayerState::Jumping { halved, boosting } => {
                *halved = false;
                *boosting = true;
                avatar.jump_time = 0.0;
                avatar.body.velocity.y = avatar.config.jump_power;
                avatar.set_clip(PlayerClip::Jump);
                env.level.play(SoundEvent::Jump);
            }
            PlayerState::Falling => avatar.set_clip(PlayerClip::Fall),
            PlayerState::Growing => {
                avatar.big = true;
                let grow_by = avatar.target_height() - avatar.body.size.y;
                avatar.body.position.y -= grow_by;
                avatar.body.size.y += grow_by;
                avatar.set_clip(PlayerClip::Grow);
            }
            PlayerState::Shrinking => {
                avatar.big = false;
                avatar.set_clip(PlayerClip::Shrink);
                env.level.play(SoundEvent::Hit);
            }
        }
    }

    fn exit<'e>(&mut self, avatar: &mut Avatar, _env: &mut PlayerEnv<'e>) {
        if matches!(self, PlayerState::Growing | PlayerState::Shrinking) {
            avatar.set_clip(PlayerClip::Idle);
        }
    }

    fn update<'e>(
        &mut self,
        avatar: &mut Avatar,
        env: &mut PlayerEnv<'e>,
        dt: f32,
    ) -> Option<PlayerStateName> {
        physics::step(avatar, env.level, dt);
        let input = env.input;

        match self {
            PlayerState::Idling => {
                if physics::held_direction(input).is_some() {
                    Some(PlayerStateName::Walking)
                } else if input.is_pressed(InputAction::Jump) {
                    Some(PlayerStateName::Jumping)
                } else {
                    None
                }
            }
            PlayerState::Walking => {
                let next = walking_transition(avatar, input);
                physics::horizontal_control(avatar, input);
                next
            }
            PlayerState::Skidding => {
                physics::slow_down(avatar);
                physics::snap_to_rest(avatar);
                if avatar.body.velocity.x.abs() < STOP_EPSILON {
                    if physics::any_direction_held(input) {
                        Some(PlayerStateName::Walking)
                    } else {
                        Some(PlayerStateName::Idling)
                    }
                } else if input.is_pressed(InputAction::Jump) {
                    Some(PlayerStateName::Jumping)
                } else {
                    None
                }
            }
            PlayerState::Jumping { halved, boosting } => {
                // Stopped by a ceiling or block: no more lift for this jump.
                if avatar.body.velocity.y >= 0.0 {
                    *boosting = false;
                }
                let held = input.is_held(InputAction::Jump);
                if !held && avatar.body.velocity.y < 0.0 && !*halved {
                    avatar.body.velocity.y *= 0.5;
                    *halved = true;
                    *boosting = false;
                }
                physics::horizontal_control(avatar, input);

                if held && *boosting {
                    avatar.jump_time += dt;
                    let config = avatar.config;
                    if avatar.jump_time <= config.max_jump_time {
                        avatar.body.velocity.y =
                            config.jump_power * (1.0 - avatar.jump_time / config.max_jump_time);
                    } else {
                        *boosting = false;
                    }
                }

                (avatar.body.velocity.y >= 0.0).then_some(PlayerStateName::Falling)
            }
            PlayerState::Falling => {
                physics::horizontal_control(avatar, input);
                if !avatar.body.grounded {
                    None
                } else if avatar.body.velocity.x.abs() < STOP_EPSILON {
                    Some(PlayerStateName::Idling)
                } else {
                    Some(PlayerStateName::Walking)
                }
            }
            PlayerState::Growing => avatar
                .animation
                .is_done()
                .then_some(PlayerStateName::Idling),
            PlayerState::Shrinking => {
                if !avatar.animation.is_done() {
                    return None;
                }
                let shrink_by = avatar.body.size.y - avatar.target_height();
                avatar.body.position.y += shrink_by;
                avatar.body.size.y -= shrink_by;
                avatar.invincibility = SHRINK_INVINCIBILITY_SECONDS;
                Some(PlayerStateName::Idling)
            }
        }
    }

    fn render(&self, avatar: &Avatar, frame: &mut DrawList) {
        avatar.draw(frame);
    }
}

fn walking_transition(avatar: &mut Avatar, input: &InputSnapshot) -> Option<PlayerStateName> {
    let vx = avatar.body.velocity.x;
    let idle = physics::held_direction(input).is_none() && vx.abs() < STOP_EPSILON;
    if idle {
        return Some(PlayerStateName::Idling);
    }

    let reversing = (input.is_held(InputAction::MoveLeft) && vx > 0.0)
        || (input.is_held(InputAction::MoveRight) && vx < 0.0);
    if avatar.body.grounded && vx.abs() > avatar.config.skid_threshold && reversing {
        avatar.facing_right = !avatar.facing_right;
        return Some(PlayerStateName::Skidding);
    }

    if !avatar.body.grounded {
        return Some(if avatar.body.velocity.y < 0.0 {
            PlayerStateName::Jumping
        } else {
            PlayerStateName::Falling
        });
    }

    input
        .is_pressed(InputAction::Jump)
        .then_some(PlayerStateName::Jumping)
}

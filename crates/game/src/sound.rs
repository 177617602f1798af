/// Discrete audio cues raised by the simulation; playback happens elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEvent {
    Jump,
    Bump,
    Stomp,
    Powerup,
    Coin,
    Hit,
    SproutItem,
}

impl SoundEvent {
    pub fn name(self) -> &'static str {
        match self {
            SoundEvent::Jump => "jump",
            SoundEvent::Bump => "bump",
            SoundEvent::Stomp => "stomp",
            SoundEvent::Powerup => "powerup",
            SoundEvent::Coin => "coin",
            SoundEvent::Hit => "hit",
            SoundEvent::SproutItem => "sprout_item",
        }
    }
}

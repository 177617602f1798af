use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chance that a block yields a power-up instead of a coin.
pub const POWER_UP_CHANCE: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReward {
    PowerUp,
    Coin,
}

#[derive(Debug, Clone)]
pub enum RewardPicker {
    Random(StdRng),
    Fixed(BlockReward),
}

impl RewardPicker {
    pub fn seeded(seed: u64) -> Self {
        Self::Random(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::Random(StdRng::from_entropy())
    }

    pub fn fixed(reward: BlockReward) -> Self {
        Self::Fixed(reward)
    }

    pub fn roll(&mut self) -> BlockReward {
        match self {
            Self::Random(rng) => {
                if rng.gen_bool(POWER_UP_CHANCE) {
                    BlockReward::PowerUp
                } else {
                    BlockReward::Coin
                }
            }
            Self::Fixed(reward) => *reward,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_rewards() {
        let mut a = RewardPicker::seeded(7);
        let mut b = RewardPicker::seeded(7);
        for _ in 0..32 {
            assert_eq!(a.roll(), b.roll());
        }
    }

    #[test]
    fn random_picker_yields_both_rewards_near_expected_ratio() {
        let mut picker = RewardPicker::seeded(42);
        let power_ups = (0..10_000)
            .filter(|_| picker.roll() == BlockReward::PowerUp)
            .count();
        assert!((3_500..4_500).contains(&power_ups), "{power_ups}");
    }

    #[test]
    fn fixed_picker_never_changes() {
        let mut picker = RewardPicker::fixed(BlockReward::Coin);
        assert_eq!(picker.roll(), BlockReward::Coin);
        assert_eq!(picker.roll(), BlockReward::Coin);
    }
}

//! Fractional (1/f^gamma) noise, simulated with a Voss dice game.
//!
//! A number of continuous dice is rolled following a binary counting pattern: the least
//! significant die is rolled on every move, the most significant one only once per cycle.
//! Weighting each die by its significance shapes the spectrum of the dice sum.

use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{
    error::{Error, Result},
    random::new_rand_gen,
    unit,
};

// -------------------------------------------------------------------------------------------------

/// Noise color, as gamma exponent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseColor(pub f64);

impl TryFrom<&str> for NoiseColor {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        let lower = value.trim().to_ascii_lowercase();
        match lower.as_str() {
            "white" | "w" => Ok(Self(0.0)),
            "pink" | "p" => Ok(Self(1.0)),
            "brown" | "b" => Ok(Self(2.0)),
            "black" => Ok(Self(3.0)),
            _ => lower
                .parse::<f64>()
                .map(|gamma| Self(gamma.abs()))
                .map_err(|_| format!("invalid noise color '{value}'")),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// The dice game producing 1/f noise in the unit interval.
#[derive(Debug, Clone)]
pub struct GameNoise {
    moves: Vec<Vec<bool>>,
    move_pos: usize,
    move_last: Vec<bool>,
    dice: Vec<f64>,
    seed: u64,
    rand_gen: Xoshiro256PlusPlus,
}

impl GameNoise {
    /// Create a new game with a resolution of at least `resolution` distinct moves.
    pub fn new(resolution: usize, seed: u64) -> Result<Self> {
        if resolution == 0 {
            return Err(Error::ParameterObjectSyntax(
                "noise resolution must be greater than zero".to_string(),
            ));
        }
        let mut dice_count = 0;
        while (1usize << dice_count) < resolution {
            dice_count += 1;
        }
        let dice_count = dice_count.max(1);
        let moves = (0..(1usize << dice_count))
            .map(|n| {
                (0..dice_count)
                    .rev()
                    .map(|bit| n & (1 << bit) != 0)
                    .collect()
            })
            .collect();
        let mut rand_gen = new_rand_gen(seed);
        let dice = (0..dice_count).map(|_| rand_gen.random::<f64>()).collect();
        Ok(Self {
            moves,
            move_pos: 0,
            move_last: vec![false; dice_count],
            dice,
            seed,
            rand_gen,
        })
    }

    /// Number of dice in the game.
    pub fn dice_count(&self) -> usize {
        self.dice.len()
    }

    /// Rewind to the initial state.
    pub fn reset(&mut self) {
        self.rand_gen = new_rand_gen(self.seed);
        for die in self.dice.iter_mut() {
            *die = self.rand_gen.random::<f64>();
        }
        self.move_pos = 0;
        self.move_last = vec![false; self.dice.len()];
    }

    /// Weights for each die for the given gamma, summing to 1.
    pub fn dice_weights(&self, gamma: f64) -> Vec<f64> {
        let gamma = -gamma.abs();
        let exp = (gamma + 1.0) * 0.5 * std::f64::consts::LN_2;
        let p = (-exp).exp();
        let mut weights = (0..self.dice.len())
            .map(|i| p.powi(i as i32))
            .collect::<Vec<_>>();
        weights.reverse();
        unit::norm_proportion(&weights).unwrap_or_else(|_| {
            vec![1.0 / self.dice.len() as f64; self.dice.len()]
        })
    }

    /// Play one move and return the weighted dice sum within the unit interval.
    pub fn step(&mut self, gamma: f64) -> f64 {
        let next = self.moves[self.move_pos].clone();
        for (i, roll) in next.iter().enumerate() {
            if *roll != self.move_last[i] {
                self.dice[i] = self.rand_gen.random::<f64>();
            }
        }
        self.move_last = next;
        self.move_pos = (self.move_pos + 1) % self.moves.len();
        self.dice_weights(gamma)
            .iter()
            .zip(&self.dice)
            .map(|(w, v)| w * v)
            .sum()
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn weights() -> Result<()> {
        let game = GameNoise::new(10, 0)?;
        assert_eq!(game.dice_count(), 4);
        let white = game.dice_weights(0.0);
        assert!((white[0] - 0.138_071_18).abs() < 1e-6);
        assert!((white[3] - 0.390_524_29).abs() < 1e-6);
        assert_eq!(game.dice_weights(1.0), vec![0.25; 4]);
        let black = game.dice_weights(3.0);
        assert!((black[0] - 0.533_333_34).abs() < 1e-6);
        assert!(GameNoise::new(0, 0).is_err());
        Ok(())
    }

    #[test]
    fn steps() -> Result<()> {
        let mut game = GameNoise::new(100, 2)?;
        let first = (0..50).map(|_| game.step(1.0)).collect::<Vec<_>>();
        assert!(first.iter().all(|v| (0.0..=1.0).contains(v)));
        game.reset();
        let second = (0..50).map(|_| game.step(1.0)).collect::<Vec<_>>();
        assert_eq!(first, second);
        assert_eq!(NoiseColor::try_from("pink"), Ok(NoiseColor(1.0)));
        assert_eq!(NoiseColor::try_from("-2.5"), Ok(NoiseColor(2.5)));
        Ok(())
    }
}

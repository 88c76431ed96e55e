//! Musically shaped random distributions, all producing values in the unit interval.
//!
//! Some of the distributions have tails outside of the unit interval: those are rejected
//! and redrawn, so every function here returns values within [0, 1].

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

// -------------------------------------------------------------------------------------------------

// upper bound for rejection sampling loops
const REJECTION_LIMIT: usize = 1000;

// -------------------------------------------------------------------------------------------------

/// Create a new random generator from the given seed.
pub fn new_rand_gen(seed: u64) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(seed)
}

/// Derive a seed for a child object from a parent seed and an index.
pub fn derive_seed(seed: u64, index: u64) -> u64 {
    // splitmix64 style scrambling
    let mut z = seed.wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// -------------------------------------------------------------------------------------------------

/// Probabilistic rounding: the fractional part is the probability of rounding up.
pub fn float_to_int_weight<R: Rng>(rand_gen: &mut R, value: f64) -> i64 {
    let floor = value.floor();
    let frac = value - floor;
    if frac == 0.0 {
        return floor as i64;
    }
    let q = rand_gen.random::<f64>();
    let up = if frac == 0.5 { q >= 0.5 } else { q <= frac };
    floor as i64 + up as i64
}

/// Round half away from zero into an integer.
pub fn float_to_int(value: f64) -> i64 {
    value.round() as i64
}

// -------------------------------------------------------------------------------------------------

pub fn uniform<R: Rng>(rand_gen: &mut R) -> f64 {
    rand_gen.random::<f64>()
}

pub fn linear<R: Rng>(rand_gen: &mut R) -> f64 {
    let a = rand_gen.random::<f64>();
    let b = rand_gen.random::<f64>();
    a.min(b)
}

pub fn inverse_linear<R: Rng>(rand_gen: &mut R) -> f64 {
    let a = rand_gen.random::<f64>();
    let b = rand_gen.random::<f64>();
    a.max(b)
}

pub fn triangular<R: Rng>(rand_gen: &mut R) -> f64 {
    for _ in 0..REJECTION_LIMIT {
        let a = rand_gen.random::<f64>();
        let b = rand_gen.random::<f64>() / 2.0;
        if (a < 0.5 && a > b) || (a >= 0.5 && (a - 0.5) < b) {
            return a;
        }
    }
    0.5
}

pub fn inverse_triangular<R: Rng>(rand_gen: &mut R) -> f64 {
    for _ in 0..REJECTION_LIMIT {
        let a = rand_gen.random::<f64>();
        let b = rand_gen.random::<f64>() / 2.0;
        if (a < 0.5 && a < b) || (a >= 0.5 && (a - 0.5) > b) {
            return a;
        }
    }
    0.0
}

fn expovariate<R: Rng>(rand_gen: &mut R, lambda: f64) -> f64 {
    let mut u = rand_gen.random::<f64>();
    while u <= 1e-7 {
        u = rand_gen.random::<f64>();
    }
    let lambda = if lambda == 0.0 { 1e-7 } else { lambda };
    -u.ln() / lambda
}

pub fn exponential<R: Rng>(rand_gen: &mut R, lambda: f64) -> f64 {
    for _ in 0..REJECTION_LIMIT {
        let r = expovariate(rand_gen, lambda);
        if r < 1.0 {
            return r;
        }
    }
    0.0
}

pub fn inverse_exponential<R: Rng>(rand_gen: &mut R, lambda: f64) -> f64 {
    for _ in 0..REJECTION_LIMIT {
        let r = 1.0 - expovariate(rand_gen, lambda);
        if r > 0.0 {
            return r;
        }
    }
    1.0
}

pub fn bilateral_exponential<R: Rng>(rand_gen: &mut R, lambda: f64) -> f64 {
    let r = exponential(rand_gen, lambda);
    if rand_gen.random::<f64>() > 0.5 {
        0.5 + r / 2.0
    } else {
        0.5 - r / 2.0
    }
}

pub fn gauss<R: Rng>(rand_gen: &mut R, mu: f64, sigma: f64) -> f64 {
    for _ in 0..REJECTION_LIMIT {
        let x2pi = rand_gen.random::<f64>() * std::f64::consts::TAU;
        let g2rad = (-2.0 * (1.0 - rand_gen.random::<f64>()).ln()).sqrt();
        let r = mu + x2pi.cos() * g2rad * sigma;
        if (0.0..=1.0).contains(&r) {
            return r;
        }
    }
    mu.clamp(0.0, 1.0)
}

pub fn cauchy<R: Rng>(rand_gen: &mut R, alpha: f64, mu: f64) -> f64 {
    for _ in 0..REJECTION_LIMIT {
        let mut x = 0.5;
        while x == 0.5 {
            x = rand_gen.random::<f64>();
        }
        let r = alpha * (x * std::f64::consts::PI).tan() + mu;
        if (0.0..=1.0).contains(&r) {
            return r;
        }
    }
    mu.clamp(0.0, 1.0)
}

pub fn beta<R: Rng>(rand_gen: &mut R, alpha: f64, beta: f64) -> f64 {
    let beta = if beta == 0.0 { 1e-7 } else { beta };
    let y = expovariate(rand_gen, alpha);
    let z = expovariate(rand_gen, 1.0 / beta);
    let r = if y + z == 0.0 { 0.5 } else { z / (y + z) };
    if rand_gen.random::<f64>() > 0.5 {
        1.0 - r
    } else {
        r
    }
}

pub fn weibull<R: Rng>(rand_gen: &mut R, alpha: f64, beta: f64) -> f64 {
    let beta = if beta == 0.0 { 1e-7 } else { beta };
    for _ in 0..REJECTION_LIMIT {
        let mut u = rand_gen.random::<f64>();
        while u <= 1e-7 {
            u = rand_gen.random::<f64>();
        }
        let r = alpha * (-u.ln()).powf(1.0 / beta);
        if (0.0..=1.0).contains(&r) {
            return r;
        }
    }
    alpha.clamp(0.0, 1.0)
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn distributions_stay_in_unit_interval() {
        let mut rand_gen = new_rand_gen(0x1234);
        for _ in 0..500 {
            for value in [
                uniform(&mut rand_gen),
                linear(&mut rand_gen),
                inverse_linear(&mut rand_gen),
                triangular(&mut rand_gen),
                inverse_triangular(&mut rand_gen),
                exponential(&mut rand_gen, 0.5),
                inverse_exponential(&mut rand_gen, 0.5),
                bilateral_exponential(&mut rand_gen, 0.5),
                gauss(&mut rand_gen, 0.5, 0.1),
                cauchy(&mut rand_gen, 0.1, 0.5),
                beta(&mut rand_gen, 0.5, 0.5),
                weibull(&mut rand_gen, 0.5, 2.0),
            ] {
                assert!((0.0..=1.0).contains(&value), "{value} out of range");
            }
        }
    }

    #[test]
    fn weighted_rounding() {
        let mut rand_gen = new_rand_gen(42);
        assert_eq!(float_to_int_weight(&mut rand_gen, 3.0), 3);
        let values = (0..200)
            .map(|_| float_to_int_weight(&mut rand_gen, 3.5))
            .collect::<Vec<_>>();
        assert!(values.iter().all(|v| *v == 3 || *v == 4));
        assert!(values.iter().filter(|v| **v == 3).count() > 50);
        assert!(values.iter().filter(|v| **v == 4).count() > 50);
    }

    #[test]
    fn seeds_are_reproducible() {
        let mut a = new_rand_gen(derive_seed(7, 1));
        let mut b = new_rand_gen(derive_seed(7, 1));
        assert_eq!(uniform(&mut a), uniform(&mut b));
        assert_ne!(derive_seed(7, 1), derive_seed(7, 2));
    }
}

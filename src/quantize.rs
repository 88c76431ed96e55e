//! Grid quantization with variable attraction, and binary funnels.

// -------------------------------------------------------------------------------------------------

const LOOP_LIMIT: usize = 999;

// -------------------------------------------------------------------------------------------------

/// What a binary funnel returns when a value hits the threshold exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMatch {
    Match,
    Upper,
    Lower,
}

impl TryFrom<&str> for ThresholdMatch {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "m" | "match" => Ok(Self::Match),
            "u" | "upper" => Ok(Self::Upper),
            "l" | "lower" => Ok(Self::Lower),
            _ => Err(format!("invalid threshold match '{value}'")),
        }
    }
}

/// Map `value` to the upper or lower of the boundaries `a` and `b`, depending on which side
/// of `threshold` it is.
pub fn funnel_binary(threshold: f64, a: f64, b: f64, value: f64, on_match: ThresholdMatch) -> f64 {
    let (min, max) = if a > b { (b, a) } else { (a, b) };
    if value > threshold {
        max
    } else if value < threshold {
        min
    } else {
        match on_match {
            ThresholdMatch::Match => threshold,
            ThresholdMatch::Upper => max,
            ThresholdMatch::Lower => min,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Attracts values to a repeating grid of step widths.
///
/// The grid is continued infinitely in both directions from a reference value.
#[derive(Debug, Clone, Default)]
pub struct Quantizer {
    grid: Vec<f64>,
}

impl Quantizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a new grid of step widths. Empty grids are ignored.
    pub fn update_grid(&mut self, grid: Vec<f64>) -> bool {
        if grid.is_empty() {
            return false;
        }
        self.grid = grid;
        true
    }

    fn find_lower_upper(&self, value: f64, grid_ref: f64) -> Option<(f64, f64)> {
        let len = self.grid.len();
        if len == 0 {
            return None;
        }
        let move_down = grid_ref >= value;
        let mut last = grid_ref;
        for n in 1..LOOP_LIMIT {
            let step = if move_down {
                last - self.grid[len - 1 - (n - 1) % len]
            } else {
                last + self.grid[n % len]
            };
            let (lower, upper) = if last <= step { (last, step) } else { (step, last) };
            if value >= lower && value <= upper {
                return Some((lower, upper));
            }
            last = step;
        }
        None
    }

    /// Move `value` towards the nearest grid point. A `pull` of 1 snaps onto the grid, smaller
    /// values only move the value part of the way.
    pub fn attract(&self, value: f64, pull: f64, grid_ref: f64) -> f64 {
        let Some((lower, upper)) = self.find_lower_upper(value, grid_ref) else {
            log::warn!("quantizer failed to find grid neighbors for {value}");
            return value;
        };
        if lower == upper {
            return lower;
        }
        let dif_lower = (lower - value).abs();
        let dif_upper = (upper - value).abs();
        if pull == 1.0 {
            return if dif_lower >= dif_upper { upper } else { lower };
        }
        if dif_lower >= dif_upper {
            upper - dif_upper * (1.0 - pull)
        } else {
            lower + dif_lower * (1.0 - pull)
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn funnel() {
        assert_eq!(funnel_binary(0.5, 1.0, 0.0, 0.7, ThresholdMatch::Match), 1.0);
        assert_eq!(funnel_binary(0.5, 1.0, 0.0, 0.2, ThresholdMatch::Match), 0.0);
        assert_eq!(funnel_binary(0.5, 1.0, 0.0, 0.5, ThresholdMatch::Match), 0.5);
        assert_eq!(funnel_binary(0.5, 1.0, 0.0, 0.5, ThresholdMatch::Upper), 1.0);
        assert_eq!(funnel_binary(0.5, 1.0, 0.0, 0.5, ThresholdMatch::Lower), 0.0);
    }

    #[test]
    fn attraction() {
        let mut quantizer = Quantizer::new();
        assert!(!quantizer.update_grid(vec![]));
        assert!(quantizer.update_grid(vec![0.25]));
        assert_eq!(quantizer.attract(0.3, 1.0, 0.0), 0.25);
        assert_eq!(quantizer.attract(0.4, 1.0, 0.0), 0.5);
        assert_eq!(quantizer.attract(-0.3, 1.0, 0.0), -0.25);
        assert!((quantizer.attract(0.3, 0.5, 0.0) - 0.275).abs() < 1e-9);
        assert_eq!(quantizer.attract(1.1, 1.0, 1.0), 1.0);
    }
}

//! Unit interval helpers: normalization, denormalization, boundaries and boundary fitting.

use crate::error::{Error, Result};

// -------------------------------------------------------------------------------------------------

/// How to bring a value back into a min/max boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMethod {
    Limit,
    Wrap,
    Reflect,
}

impl TryFrom<&str> for BoundaryMethod {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.to_ascii_lowercase().as_str() {
            "l" | "limit" => Ok(Self::Limit),
            "w" | "wrap" => Ok(Self::Wrap),
            "r" | "reflect" => Ok(Self::Reflect),
            _ => Err(format!("invalid boundary method '{value}'")),
        }
    }
}

impl std::fmt::Display for BoundaryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Limit => "limit",
            Self::Wrap => "wrap",
            Self::Reflect => "reflect",
        };
        f.write_str(name)
    }
}

// -------------------------------------------------------------------------------------------------

/// A unit interval boundary segment: (lower, mean, upper).
pub type Boundary = (f64, f64, f64);

// -------------------------------------------------------------------------------------------------

/// Min and max of a non empty series.
pub fn series_min_max(series: &[f64]) -> Option<(f64, f64)> {
    let first = *series.first()?;
    Some(series.iter().fold((first, first), |(min, max), v| {
        (min.min(*v), max.max(*v))
    }))
}

/// Clamp a value into the unit interval.
pub fn limit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Normalize a single value within the min and max of the given range.
pub fn norm(value: f64, range: &[f64]) -> f64 {
    match series_min_max(range) {
        Some((min, max)) if max - min != 0.0 => (value - min) / (max - min),
        _ => 0.0,
    }
}

/// Normalize all values within the min and max of the series, or within a fixed range.
/// A single value normalizes to 0.
pub fn norm_range(series: &[f64], fix_range: Option<(f64, f64)>) -> Vec<f64> {
    if series.len() <= 1 {
        return vec![0.0; series.len()];
    }
    let (min, max) = match fix_range {
        Some((a, b)) => (a.min(b), a.max(b)),
        None => series_min_max(series).unwrap_or((0.0, 0.0)),
    };
    let span = max - min;
    series
        .iter()
        .map(|v| if span != 0.0 { (v - min) / span } else { 0.0 })
        .collect()
}

/// Normalize a table (list of rows) within the min and max of all values.
pub fn norm_range_table(table: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let flat = table.iter().flatten().copied().collect::<Vec<_>>();
    let (min, max) = series_min_max(&flat).unwrap_or((0.0, 0.0));
    let span = max - min;
    table
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| if span != 0.0 { (v - min) / span } else { 0.0 })
                .collect()
        })
        .collect()
}

/// `parts` equally spaced values in the unit interval, 0 and 1 inclusive.
pub fn norm_equal(parts: usize) -> Vec<f64> {
    match parts {
        0 | 1 => vec![0.0],
        2 => vec![0.0, 1.0],
        _ => {
            let step = 1.0 / (parts - 1) as f64;
            let mut unit = (0..parts - 1).map(|i| i as f64 * step).collect::<Vec<_>>();
            unit.push(1.0);
            unit
        }
    }
}

/// Normalize values as proportions of their sum.
pub fn norm_proportion(series: &[f64]) -> Result<Vec<f64>> {
    if series.iter().any(|v| *v < 0.0) {
        return Err(Error::Argument(
            "proportional series members must be positive".to_string(),
        ));
    }
    let sum = series.iter().sum::<f64>();
    if sum == 0.0 {
        return Err(Error::Argument(
            "proportional series must not sum to zero".to_string(),
        ));
    }
    Ok(series.iter().map(|v| v / sum).collect())
}

/// Accumulate unit steps into proportional positions, starting at zero.
pub fn norm_accumulate(series: &[f64]) -> Vec<f64> {
    let mut t = 0.0;
    let mut accum = vec![t];
    for step in series {
        t += step;
        accum.push(t);
    }
    if t == 0.0 {
        return accum;
    }
    accum.into_iter().map(|pos| pos / t).collect()
}

/// Shift a unit interval value into the range between `a` and `b` (in any order).
/// Values outside of the unit interval are limited first.
pub fn denorm(value: f64, a: f64, b: f64) -> f64 {
    if a == b {
        return a;
    }
    let (min, max) = (a.min(b), a.max(b));
    limit(value) * (max - min) + min
}

/// Crossfade between `a` and `b` with a unit interval value.
pub fn interpolate(value: f64, a: f64, b: f64) -> f64 {
    let value = limit(value);
    if value == 0.0 {
        a
    } else if value == 1.0 {
        b
    } else {
        a * (1.0 - value) + b * value
    }
}

// -------------------------------------------------------------------------------------------------

/// Divide the unit interval into `parts` equal boundaries.
pub fn boundary_equal(parts: usize) -> Result<Vec<Boundary>> {
    if parts == 0 {
        return Err(Error::Argument("cannot process 0 parts".to_string()));
    }
    let step = 1.0 / parts as f64;
    let mut lower = 0.0;
    let mut bounds = Vec::with_capacity(parts);
    for face in 0..parts {
        let upper = if face != parts - 1 {
            step * (face + 1) as f64
        } else {
            1.0
        };
        bounds.push((lower, lower + step * 0.5, upper));
        lower = upper;
    }
    Ok(bounds)
}

/// Create one boundary per series member, sized in proportion to the member's value.
pub fn boundary_proportion(series: &[f64]) -> Result<Vec<Boundary>> {
    if series.iter().any(|v| *v == 0.0) {
        return Err(Error::Argument(
            "cannot process a proportional series that contains zero".to_string(),
        ));
    }
    let unit = norm_proportion(series)?;
    let mut bounds = Vec::with_capacity(unit.len());
    let mut sum = 0.0;
    for (i, value) in unit.iter().enumerate() {
        let lower = sum;
        let upper = if i != unit.len() - 1 { sum + value } else { 1.0 };
        sum += value;
        bounds.push((lower, (lower + upper) * 0.5, upper));
    }
    Ok(bounds)
}

/// Map a unit interval value to the index of the boundary containing it.
pub fn boundary_position(value: f64, bounds: &[Boundary]) -> usize {
    let value = limit(value);
    if bounds.is_empty() {
        return 0;
    }
    if value >= 1.0 {
        return bounds.len() - 1;
    }
    bounds
        .iter()
        .position(|(lower, _, upper)| value >= *lower && value < *upper)
        .unwrap_or(bounds.len() - 1)
}

// -------------------------------------------------------------------------------------------------

/// Pad an integer series into a binary series covering its min to max range.
pub fn discrete_binary_pad(series: &[i64], fix_range: Option<(i64, i64)>) -> Vec<i64> {
    let (min, max) = match fix_range {
        Some((a, b)) => (a.min(b), a.max(b)),
        None => match (series.iter().min(), series.iter().max()) {
            (Some(min), Some(max)) => (*min, *max),
            _ => return vec![],
        },
    };
    (min..=max)
        .map(|x| if series.contains(&x) { 1 } else { 0 })
        .collect()
}

// -------------------------------------------------------------------------------------------------

/// Fit `value` into the boundary between `a` and `b` with the given method.
pub fn boundary_fit(a: f64, b: f64, value: f64, method: BoundaryMethod) -> f64 {
    let (min, max) = (a.min(b), a.max(b));
    if value >= min && value <= max {
        return value;
    }
    let period = max - min;
    if period == 0.0 {
        return min;
    }
    match method {
        BoundaryMethod::Limit => value.clamp(min, max),
        BoundaryMethod::Wrap => {
            let mut value = (value - min) % period;
            if value < 0.0 {
                value += period;
            }
            min + value
        }
        BoundaryMethod::Reflect => {
            // reflect within a doubled period, then fold the upper half back
            let double = period * 2.0;
            let mut pos = (value - min) % double;
            if pos < 0.0 {
                pos += double;
            }
            if pos > period {
                pos = double - pos;
            }
            min + pos
        }
    }
}

/// Project `value` outside of the boundary between `a` and `b` with the given method.
pub fn boundary_reject(a: f64, b: f64, value: f64, method: BoundaryMethod) -> f64 {
    let (min, max) = (a.min(b), a.max(b));
    if value <= min || value >= max {
        return value;
    }
    let period = max - min;
    let center = min + period * 0.5;
    match method {
        BoundaryMethod::Limit => {
            if value >= center {
                max
            } else {
                min
            }
        }
        BoundaryMethod::Wrap => {
            if value >= center {
                value + period
            } else {
                value - period
            }
        }
        BoundaryMethod::Reflect => {
            if value >= center {
                max + (max - value)
            } else {
                min - (value - min)
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn normalize() {
        assert_eq!(norm_range(&[0.0, 5.0, 10.0], None), vec![0.0, 0.5, 1.0]);
        assert_eq!(norm_range(&[3.0], None), vec![0.0]);
        assert_eq!(norm_range(&[2.0, 2.0], None), vec![0.0, 0.0]);
        assert_eq!(norm_equal(5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(norm_equal(1), vec![0.0]);
        assert_eq!(
            norm_proportion(&[1.0, 1.0, 2.0]).unwrap(),
            vec![0.25, 0.25, 0.5]
        );
        assert!(norm_proportion(&[0.0, 0.0]).is_err());
        assert_eq!(norm_accumulate(&[1.0, 1.0, 2.0]), vec![0.0, 0.25, 0.5, 1.0]);
    }

    #[test]
    fn denormalize() {
        assert_eq!(denorm(0.5, 0.0, 10.0), 5.0);
        assert_eq!(denorm(0.5, 10.0, 0.0), 5.0);
        assert_eq!(denorm(2.0, 0.0, 10.0), 10.0);
        assert_eq!(denorm(0.3, 4.0, 4.0), 4.0);
        assert_eq!(interpolate(0.0, 3.0, 9.0), 3.0);
        assert_eq!(interpolate(0.5, 3.0, 9.0), 6.0);
    }

    #[test]
    fn boundaries() {
        let bounds = boundary_equal(4).unwrap();
        assert_eq!(bounds.len(), 4);
        assert_eq!(boundary_position(0.0, &bounds), 0);
        assert_eq!(boundary_position(0.3, &bounds), 1);
        assert_eq!(boundary_position(1.0, &bounds), 3);
        let bounds = boundary_proportion(&[3.0, 1.0]).unwrap();
        assert_eq!(boundary_position(0.7, &bounds), 0);
        assert_eq!(boundary_position(0.8, &bounds), 1);
        assert!(boundary_proportion(&[1.0, 0.0]).is_err());
    }

    #[test]
    fn binary_pad() {
        assert_eq!(discrete_binary_pad(&[1, 3, 4], None), vec![1, 0, 1, 1]);
        assert_eq!(
            discrete_binary_pad(&[1, 3], Some((0, 4))),
            vec![0, 1, 0, 1, 0]
        );
    }

    #[test]
    fn fit_and_reject() {
        assert_eq!(boundary_fit(0.0, 1.0, 1.5, BoundaryMethod::Limit), 1.0);
        assert!((boundary_fit(0.0, 1.0, 1.25, BoundaryMethod::Wrap) - 0.25).abs() < 1e-9);
        assert!((boundary_fit(0.0, 1.0, -0.25, BoundaryMethod::Wrap) - 0.75).abs() < 1e-9);
        assert!((boundary_fit(0.0, 1.0, 1.25, BoundaryMethod::Reflect) - 0.75).abs() < 1e-9);
        assert!((boundary_fit(0.0, 1.0, -0.25, BoundaryMethod::Reflect) - 0.25).abs() < 1e-9);
        assert_eq!(boundary_fit(2.0, 2.0, 5.0, BoundaryMethod::Wrap), 2.0);
        assert_eq!(boundary_reject(0.0, 1.0, 0.6, BoundaryMethod::Limit), 1.0);
        assert_eq!(boundary_reject(0.0, 1.0, 0.4, BoundaryMethod::Limit), 0.0);
        assert_eq!(boundary_reject(0.0, 1.0, 2.0, BoundaryMethod::Reflect), 2.0);
    }
}

//! Break-point functions: piecewise curves through (x, y) pairs, evaluated either once
//! (values before the first and after the last point are held) or periodically.

use crate::error::{Error, Result};

// -------------------------------------------------------------------------------------------------

/// Curve shape between two neighbouring break points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interpolation {
    Linear,
    /// Exponential curve with the given exponent. An exponent of 0 is linear.
    Power(f64),
    HalfCosine,
    /// Holds the value of the previous point.
    Flat,
}

impl Interpolation {
    /// Interpolate between `(x0, y0)` and `(x1, y1)` at `x`.
    pub fn apply(&self, x: f64, x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
        let span = x1 - x0;
        if span == 0.0 {
            return y1;
        }
        let r = (x - x0) / span;
        match *self {
            Self::Linear => y0 + r * (y1 - y0),
            Self::Flat => y0,
            Self::HalfCosine => {
                let x = r * std::f64::consts::PI + std::f64::consts::PI;
                y0 + (y1 - y0) * (1.0 + x.cos()) / 2.0
            }
            Self::Power(exponent) => {
                if y1 == y0 {
                    y0
                } else if exponent == 0.0 {
                    y0 + r * (y1 - y0)
                } else if exponent > 0.0 {
                    if y1 >= y0 {
                        y0 + r.powf(1.0 + exponent) * (y1 - y0)
                    } else {
                        y1 + (1.0 - r).powf(1.0 + exponent) * (y0 - y1)
                    }
                } else if y1 >= y0 {
                    y1 + (1.0 - r).powf(1.0 - exponent) * (y0 - y1)
                } else {
                    y0 + r.powf(1.0 - exponent) * (y1 - y0)
                }
            }
        }
    }
}

impl TryFrom<&str> for Interpolation {
    type Error = String;

    /// Parses interpolation names. Power curves use an exponent of 2.
    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "linear" | "l" => Ok(Self::Linear),
            "power" | "p" => Ok(Self::Power(2.0)),
            "halfcosine" | "hc" => Ok(Self::HalfCosine),
            "flat" | "f" => Ok(Self::Flat),
            _ => Err(format!("invalid interpolation method '{value}'")),
        }
    }
}

impl std::fmt::Display for Interpolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linear => f.write_str("linear"),
            Self::Power(_) => f.write_str("power"),
            Self::HalfCosine => f.write_str("halfCosine"),
            Self::Flat => f.write_str("flat"),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// A break-point function.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakPoints {
    points: Vec<(f64, f64)>,
    interpolation: Interpolation,
    periodic: bool,
}

impl BreakPoints {
    /// Create a new function from at least two points, sorted by x.
    pub fn new(
        points: Vec<(f64, f64)>,
        interpolation: Interpolation,
        periodic: bool,
    ) -> Result<Self> {
        if points.len() < 2 {
            return Err(Error::ParameterObjectSyntax(format!(
                "break point functions need at least two points, got {}",
                points.len()
            )));
        }
        if points.windows(2).any(|w| w[1].0 < w[0].0) {
            return Err(Error::ParameterObjectSyntax(
                "break points are not in sequential order".to_string(),
            ));
        }
        Ok(Self {
            points,
            interpolation,
            periodic,
        })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    /// Distance between the first and last point.
    pub fn period(&self) -> f64 {
        self.points[self.points.len() - 1].0 - self.points[0].0
    }

    /// Evaluate the function at `x`.
    pub fn value(&self, x: f64) -> f64 {
        if self.periodic {
            self.value_periodic(x)
        } else {
            self.value_aperiodic(x)
        }
    }

    fn value_aperiodic(&self, x: f64) -> f64 {
        let (mut x0, mut y0) = self.points[0];
        if x < x0 {
            return y0;
        }
        for &(x1, y1) in &self.points {
            if x < x1 {
                return self.interpolation.apply(x, x0, y0, x1, y1);
            }
            x0 = x1;
            y0 = y1;
        }
        y0
    }

    fn value_periodic(&self, x: f64) -> f64 {
        let period = self.period();
        if period <= 0.0 {
            return self.points[0].1;
        }
        let start = self.points[0].0;
        let x = start + (x - start).rem_euclid(period);
        let (mut x0, mut y0) = self.points[0];
        for &(x1, y1) in &self.points {
            if x < x1 {
                return self.interpolation.apply(x, x0, y0, x1, y1);
            }
            x0 = x1;
            y0 = y1;
        }
        y0
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn points() -> Vec<(f64, f64)> {
        vec![(0.0, 0.0), (4.0, 10.0), (7.0, 5.0), (9.0, 8.0)]
    }

    #[test]
    fn aperiodic() -> Result<()> {
        let linear = BreakPoints::new(points(), Interpolation::Linear, false)?;
        assert_eq!(linear.value(-1.0), 0.0);
        assert_eq!(linear.value(2.0), 5.0);
        assert_eq!(linear.value(4.0), 10.0);
        assert_eq!(linear.value(20.0), 8.0);

        let flat = BreakPoints::new(points(), Interpolation::Flat, false)?;
        assert_eq!(flat.value(3.9), 0.0);
        assert_eq!(flat.value(6.0), 10.0);

        let cosine = BreakPoints::new(points(), Interpolation::HalfCosine, false)?;
        assert!((cosine.value(2.0) - 5.0).abs() < 1e-9);
        assert!(cosine.value(1.0) < linear.value(1.0));

        let power = BreakPoints::new(points(), Interpolation::Power(2.0), false)?;
        assert!((power.value(2.0) - 1.25).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn periodic() -> Result<()> {
        let linear = BreakPoints::new(points(), Interpolation::Linear, true)?;
        assert_eq!(linear.value(11.0), linear.value(2.0));
        assert_eq!(linear.value(-7.0), linear.value(2.0));
        assert_eq!(linear.value(9.0), 0.0);
        Ok(())
    }

    #[test]
    fn errors() {
        assert!(BreakPoints::new(vec![(0.0, 1.0)], Interpolation::Linear, false).is_err());
        assert!(BreakPoints::new(
            vec![(3.0, 1.0), (1.0, 2.0)],
            Interpolation::Linear,
            false
        )
        .is_err());
        assert_eq!(Interpolation::try_from("hc"), Ok(Interpolation::HalfCosine));
    }
}

//! Break-point envelope archetypes: trapezoid, unit (linen) and ADSR shapes over a duration.

use crate::{
    error::{Error, Result},
    unit,
};

// -------------------------------------------------------------------------------------------------

/// Minimum spacing in seconds between envelope points.
pub const ENVELOPE_OFFSET: f64 = 0.000_000_001;

fn step(shift: f64) -> f64 {
    if shift <= 0.0 {
        ENVELOPE_OFFSET
    } else {
        shift
    }
}

// -------------------------------------------------------------------------------------------------

/// How envelope segment widths are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeUnits {
    /// Widths are in seconds. Falls back to proportional when they exceed the duration.
    Absolute,
    /// Widths are proportions of the duration.
    Proportional,
}

impl TryFrom<&str> for EnvelopeUnits {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "absolute" | "a" => Ok(Self::Absolute),
            "proportional" | "p" => Ok(Self::Proportional),
            _ => Err(format!("invalid envelope units '{value}'")),
        }
    }
}

/// Resolve segment widths to seconds, returning the widths and whether they're proportional.
fn segment_widths(units: EnvelopeUnits, dur: f64, widths: [f64; 4]) -> Result<([f64; 4], bool)> {
    if units == EnvelopeUnits::Absolute && widths.iter().sum::<f64>() <= dur {
        return Ok((widths, false));
    }
    let proportions = unit::norm_proportion(&widths)
        .map_err(|err| Error::ParameterObjectSyntax(err.to_string()))?;
    let mut result = [0.0; 4];
    for (r, p) in result.iter_mut().zip(proportions) {
        *r = p * dur;
    }
    Ok((result, true))
}

/// A trapezoid: ramp up, hold the peak, ramp down, then hold the nadir until the end.
#[allow(clippy::too_many_arguments)]
pub fn trapezoid(
    start: f64,
    units: EnvelopeUnits,
    dur: f64,
    ramp_up: f64,
    width_max: f64,
    ramp_down: f64,
    width_min: f64,
    min: f64,
    max: f64,
) -> Result<Vec<(f64, f64)>> {
    let peak = unit::denorm(1.0, min, max);
    let nadir = unit::denorm(0.0, min, max);
    let (widths, _) = segment_widths(units, dur, [ramp_up, width_max, ramp_down, width_min])?;
    let mut t = start;
    let mut envelope = vec![(t, nadir)];
    t += step(widths[0]);
    envelope.push((t, peak));
    t += step(widths[1]);
    envelope.push((t, peak));
    t += step(widths[2]);
    envelope.push((t, nadir));
    envelope.push((start + dur - ENVELOPE_OFFSET, nadir));
    Ok(envelope)
}

/// An attack, decay, sustain, release envelope. `sustain_level` is a unit interval position
/// between min and max.
#[allow(clippy::too_many_arguments)]
pub fn adsr(
    start: f64,
    units: EnvelopeUnits,
    dur: f64,
    attack: f64,
    decay: f64,
    sustain: f64,
    release: f64,
    sustain_level: f64,
    min: f64,
    max: f64,
) -> Result<Vec<(f64, f64)>> {
    let peak = unit::denorm(1.0, min, max);
    let nadir = unit::denorm(0.0, min, max);
    let level = nadir + (peak - nadir) * unit::limit(sustain_level);
    let (widths, proportional) =
        segment_widths(units, dur, [attack, decay, sustain, release])?;
    let mut t = start;
    let mut envelope = vec![(t, nadir)];
    t += step(widths[0]);
    envelope.push((t, peak));
    t += step(widths[1]);
    envelope.push((t, level));
    t += step(widths[2]);
    envelope.push((t, level));
    if !proportional {
        t += step(widths[3]);
        envelope.push((t, nadir));
    }
    envelope.push((start + dur - ENVELOPE_OFFSET, nadir));
    Ok(envelope)
}

/// A linen envelope: `width` is the sustained portion of the duration and `center` places it.
pub fn unit_envelope(
    start: f64,
    dur: f64,
    center: f64,
    width: f64,
    min: f64,
    max: f64,
) -> Vec<(f64, f64)> {
    let peak = unit::denorm(1.0, min, max);
    let nadir = unit::denorm(0.0, min, max);
    let clip = |value: f64| {
        let value = unit::limit(value);
        if value >= 1.0 {
            value - ENVELOPE_OFFSET
        } else if value <= 0.0 {
            value + ENVELOPE_OFFSET
        } else {
            value
        }
    };
    let center = clip(center);
    let width = clip(width);
    let ramp_up = (1.0 - width) * center * dur;
    let hold = width * dur;
    vec![
        (start, nadir),
        (start + ramp_up, peak),
        (start + ramp_up + hold, peak),
        (start + dur - ENVELOPE_OFFSET, nadir),
    ]
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn approx(a: &[(f64, f64)], b: &[(f64, f64)]) -> bool {
        a.len() == b.len()
            && a.iter()
                .zip(b)
                .all(|(x, y)| (x.0 - y.0).abs() < 1e-6 && (x.1 - y.1).abs() < 1e-6)
    }

    #[test]
    fn shapes() -> Result<()> {
        let env = trapezoid(0.0, EnvelopeUnits::Absolute, 10.0, 3.0, 3.0, 3.0, 0.5, 0.0, 1.0)?;
        assert!(approx(
            &env,
            &[(0.0, 0.0), (3.0, 1.0), (6.0, 1.0), (9.0, 0.0), (10.0, 0.0)]
        ));
        let env = adsr(
            0.0,
            EnvelopeUnits::Absolute,
            10.0,
            2.0,
            1.0,
            2.0,
            2.0,
            0.5,
            0.0,
            1.0,
        )?;
        assert!(approx(
            &env,
            &[(0.0, 0.0), (2.0, 1.0), (3.0, 0.5), (5.0, 0.5), (7.0, 0.0), (10.0, 0.0)]
        ));
        let env = unit_envelope(0.0, 10.0, 0.5, 0.5, 0.0, 1.0);
        assert!(approx(
            &env,
            &[(0.0, 0.0), (2.5, 1.0), (7.5, 1.0), (10.0, 0.0)]
        ));
        Ok(())
    }

    #[test]
    fn proportional() -> Result<()> {
        // absolute widths exceeding the duration become proportions
        let env = trapezoid(120.0, EnvelopeUnits::Absolute, 40.0, 10.0, 10.0, 10.0, 10.0, -2.0, 10.0)?;
        assert!(approx(
            &env,
            &[(120.0, -2.0), (130.0, 10.0), (140.0, 10.0), (150.0, -2.0), (160.0, -2.0)]
        ));
        assert!(env.windows(2).all(|w| w[0].0 < w[1].0));
        Ok(())
    }
}

//! Break-point functions, break graphs, line segments and envelope generators.

use crate::{
    breakpoint::{BreakPoints, Interpolation},
    envelope::{self, EnvelopeUnits},
    error::{Error, Result},
    parameter::{Args, Generator, GeneratorObject, RefDict, Value},
};

use super::{LoopMode, StepMode, Stepper};

// -------------------------------------------------------------------------------------------------

/// Interpolation of a break point or break graph generator, read from its name.
fn interpolation(args: &Args, exponent: usize) -> Result<Interpolation> {
    let name = args.name();
    if name.ends_with("Linear") {
        Ok(Interpolation::Linear)
    } else if name.ends_with("Power") {
        Ok(Interpolation::Power(args.number(exponent)?))
    } else if name.ends_with("HalfCosine") {
        Ok(Interpolation::HalfCosine)
    } else if name.ends_with("Flat") {
        Ok(Interpolation::Flat)
    } else {
        Err(Error::ParameterObjectSyntax(format!(
            "{name}: unknown interpolation"
        )))
    }
}

/// Remove points with duplicate x positions, keeping the first, and sort by x. A single point
/// is duplicated one unit further.
fn scrub_points(name: &str, points: Vec<(f64, f64)>) -> Result<Vec<(f64, f64)>> {
    let mut scrubbed: Vec<(f64, f64)> = Vec::with_capacity(points.len());
    for (x, y) in points {
        if !x.is_finite() || !y.is_finite() {
            return Err(Error::ParameterObjectSyntax(format!(
                "{name}: point ({x}, {y}) is not a finite number"
            )));
        }
        if !scrubbed.iter().any(|(other, _)| *other == x) {
            scrubbed.push((x, y));
        }
    }
    scrubbed.sort_by(|a, b| a.0.total_cmp(&b.0));
    match scrubbed.as_slice() {
        [] => Err(Error::ParameterObjectSyntax(format!(
            "{name}: no points given"
        ))),
        [(x, y)] => {
            let point = (x + 1.0, *y);
            scrubbed.push(point);
            Ok(scrubbed)
        }
        _ => Ok(scrubbed),
    }
}

// -------------------------------------------------------------------------------------------------

/// A break point function over events or seconds, looping or held at its edges.
#[derive(Debug, Clone)]
pub struct BreakPointFunction {
    stepper: Stepper,
    function: BreakPoints,
}

impl BreakPointFunction {
    pub fn from_args(args: &Args) -> Result<Self> {
        let stepper = Stepper::new(args.option::<StepMode>(0)?);
        let periodic = args.option::<LoopMode>(1)? == LoopMode::Loop;
        let points = scrub_points(args.name(), args.points(2)?)?;
        let function = BreakPoints::new(points, interpolation(args, 3)?, periodic)?;
        Ok(Self { stepper, function })
    }
}

impl Generator for BreakPointFunction {
    fn value(&mut self, t: f64, _context: &RefDict) -> Value {
        let x = self.stepper.next(t);
        Value::Number(self.function.value(x))
    }

    fn reset(&mut self) {
        self.stepper.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// A break point function through `count` generated points. X positions accumulate the
/// values of an x step generator, starting at zero.
#[derive(Debug, Clone)]
pub struct BreakGraph {
    stepper: Stepper,
    function: BreakPoints,
}

impl BreakGraph {
    pub fn from_args(args: &Args) -> Result<Self> {
        let stepper = Stepper::new(args.option::<StepMode>(0)?);
        let periodic = args.option::<LoopMode>(1)? == LoopMode::Loop;
        let mut x_step = args.generator(2)?;
        let mut y = args.generator(3)?;
        let count = args.count(4)?;
        if count == 0 {
            return Err(Error::ParameterObjectSyntax(format!(
                "{}: point count must be above zero",
                args.name()
            )));
        }
        let context = RefDict::default();
        let mut x = 0.0;
        let mut points = Vec::with_capacity(count);
        for i in 0..count {
            let t = i as f64;
            points.push((x, y.number(t, &context)));
            x += x_step.number(t, &context).abs();
        }
        let points = scrub_points(args.name(), points)?;
        let function = BreakPoints::new(points, interpolation(args, 5)?, periodic)?;
        Ok(Self { stepper, function })
    }
}

impl Generator for BreakGraph {
    fn value(&mut self, t: f64, _context: &RefDict) -> Value {
        let x = self.stepper.next(t);
        Value::Number(self.function.value(x))
    }

    fn reset(&mut self) {
        self.stepper.reset();
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Successive linear segments. Each segment spans a generated length and moves from a
/// generated start value to a generated end value.
#[derive(Debug, Clone)]
pub struct LineSegment {
    stepper: Stepper,
    span: GeneratorObject,
    start: GeneratorObject,
    end: GeneratorObject,
    segment: Option<((f64, f64), (f64, f64))>,
}

impl LineSegment {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            stepper: Stepper::new(args.option::<StepMode>(0)?),
            span: args.generator(1)?,
            start: args.generator(2)?,
            end: args.generator(3)?,
            segment: None,
        })
    }
}

impl Generator for LineSegment {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let x = self.stepper.next(t);
        let ((x0, y0), (x1, y1)) = match self.segment {
            Some(segment) if x >= segment.0 .0 && x < segment.1 .0 => segment,
            _ => {
                let mut span = self.span.number(t, context);
                if span <= 0.0 {
                    log::warn!("lineSegment: invalid segment length {span} at time {t}, using 1");
                    span = 1.0;
                }
                let segment = (
                    (x, self.start.number(t, context)),
                    (x + span, self.end.number(t, context)),
                );
                self.segment = Some(segment);
                segment
            }
        };
        Value::Number(Interpolation::Linear.apply(x, x0, y0, x1, y1))
    }

    fn reset(&mut self) {
        self.stepper.reset();
        self.span.reset();
        self.start.reset();
        self.end.reset();
        self.segment = None;
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

/// Envelope shapes of [`EnvelopeGenerator`], with their shape argument generators.
#[derive(Debug, Clone)]
enum EnvelopeShape {
    Trapezoid {
        units: EnvelopeUnits,
        ramp_up: GeneratorObject,
        width_max: GeneratorObject,
        ramp_down: GeneratorObject,
        width_min: GeneratorObject,
    },
    Unit {
        center: GeneratorObject,
        width: GeneratorObject,
    },
    Adsr {
        units: EnvelopeUnits,
        attack: GeneratorObject,
        decay: GeneratorObject,
        sustain: GeneratorObject,
        release: GeneratorObject,
        level: GeneratorObject,
    },
}

impl EnvelopeShape {
    fn points(
        &mut self,
        start: f64,
        context: &RefDict,
        dur: f64,
        min: f64,
        max: f64,
    ) -> Result<Vec<(f64, f64)>> {
        match self {
            Self::Trapezoid {
                units,
                ramp_up,
                width_max,
                ramp_down,
                width_min,
            } => envelope::trapezoid(
                start,
                *units,
                dur,
                ramp_up.number(start, context),
                width_max.number(start, context),
                ramp_down.number(start, context),
                width_min.number(start, context),
                min,
                max,
            ),
            Self::Unit { center, width } => Ok(envelope::unit_envelope(
                start,
                dur,
                center.number(start, context),
                width.number(start, context),
                min,
                max,
            )),
            Self::Adsr {
                units,
                attack,
                decay,
                sustain,
                release,
                level,
            } => envelope::adsr(
                start,
                *units,
                dur,
                attack.number(start, context),
                decay.number(start, context),
                sustain.number(start, context),
                release.number(start, context),
                level.number(start, context),
                min,
                max,
            ),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Trapezoid {
                ramp_up,
                width_max,
                ramp_down,
                width_min,
                ..
            } => {
                ramp_up.reset();
                width_max.reset();
                ramp_down.reset();
                width_min.reset();
            }
            Self::Unit { center, width } => {
                center.reset();
                width.reset();
            }
            Self::Adsr {
                attack,
                decay,
                sustain,
                release,
                level,
                ..
            } => {
                attack.reset();
                decay.reset();
                sustain.reset();
                release.reset();
                level.reset();
            }
        }
    }
}

/// Maximum number of envelopes skipped to reach a time.
const ENVELOPE_SKIP_LIMIT: usize = 10_000;

/// Envelopes laid end to end in time, each with a generated duration and shape.
#[derive(Debug, Clone)]
pub struct EnvelopeGenerator {
    name: &'static str,
    shape: EnvelopeShape,
    period: GeneratorObject,
    min: GeneratorObject,
    max: GeneratorObject,
    current: Option<Envelope>,
}

impl EnvelopeGenerator {
    pub fn from_args(args: &Args) -> Result<Self> {
        let (shape, period, min) = match args.name() {
            "envelopeGeneratorTrapezoid" => (
                EnvelopeShape::Trapezoid {
                    units: args.option(0)?,
                    ramp_up: args.generator(2)?,
                    width_max: args.generator(3)?,
                    ramp_down: args.generator(4)?,
                    width_min: args.generator(5)?,
                },
                args.generator(1)?,
                6,
            ),
            "envelopeGeneratorUnit" => (
                EnvelopeShape::Unit {
                    center: args.generator(1)?,
                    width: args.generator(2)?,
                },
                args.generator(0)?,
                3,
            ),
            "envelopeGeneratorAdsr" => (
                EnvelopeShape::Adsr {
                    units: args.option(0)?,
                    attack: args.generator(2)?,
                    decay: args.generator(3)?,
                    sustain: args.generator(4)?,
                    release: args.generator(5)?,
                    level: args.generator(6)?,
                },
                args.generator(1)?,
                7,
            ),
            name => {
                return Err(Error::ParameterObjectSyntax(format!(
                    "no envelope generator named '{name}'"
                )))
            }
        };
        Ok(Self {
            name: args.name(),
            shape,
            period,
            min: args.generator(min)?,
            max: args.generator(min + 1)?,
            current: None,
        })
    }

    fn next_envelope(&mut self, start: f64, context: &RefDict) -> Envelope {
        let mut dur = self.period.number(start, context);
        if dur <= 0.0 {
            log::warn!("{}: invalid duration {dur} at time {start}, using 1", self.name);
            dur = 1.0;
        }
        let min = self.min.number(start, context);
        let max = self.max.number(start, context);
        let function = self
            .shape
            .points(start, context, dur, min, max)
            .and_then(|mut points| {
                points.sort_by(|a, b| a.0.total_cmp(&b.0));
                BreakPoints::new(points, Interpolation::Linear, false)
            })
            .map_err(|err| log::warn!("{}: {err} at time {start}", self.name))
            .ok();
        Envelope {
            start,
            end: start + dur,
            function,
            fallback: min,
        }
    }
}

/// A single envelope of an [`EnvelopeGenerator`].
#[derive(Debug, Clone)]
struct Envelope {
    start: f64,
    end: f64,
    function: Option<BreakPoints>,
    fallback: f64,
}

impl Envelope {
    fn value(&self, t: f64) -> f64 {
        self.function
            .as_ref()
            .map_or(self.fallback, |function| function.value(t))
    }
}

impl Generator for EnvelopeGenerator {
    fn value(&mut self, t: f64, context: &RefDict) -> Value {
        let mut current = match self.current.take() {
            Some(current) if t >= current.start => current,
            _ => self.next_envelope(0.0, context),
        };
        for _ in 0..ENVELOPE_SKIP_LIMIT {
            if t < current.end {
                break;
            }
            current = self.next_envelope(current.end, context);
        }
        let value = current.value(t);
        self.current = Some(current);
        Value::Number(value)
    }

    fn reset(&mut self) {
        self.shape.reset();
        self.period.reset();
        self.min.reset();
        self.max.reset();
        self.current = None;
    }

    fn duplicate(&self) -> Box<dyn Generator> {
        Box::new(self.clone())
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbers(input: &str, times: &[f64]) -> Result<Vec<f64>> {
        let mut generator = GeneratorObject::parse(input, 1)?;
        let context = RefDict::default();
        Ok(times
            .iter()
            .map(|t| (generator.number(*t, &context) * 1e6).round() / 1e6)
            .collect())
    }

    fn events(count: usize) -> Vec<f64> {
        (0..count).map(|i| i as f64 * 10.0).collect()
    }

    #[test]
    fn break_points() -> Result<()> {
        assert_eq!(
            numbers("bpl, e, s, ((0, 0), (4, 1))", &events(6))?,
            vec![0.0, 0.25, 0.5, 0.75, 1.0, 1.0]
        );
        assert_eq!(
            numbers("bpl, e, l, ((0, 0), (4, 1))", &events(6))?,
            vec![0.0, 0.25, 0.5, 0.75, 0.0, 0.25]
        );
        assert_eq!(
            numbers("bpf, t, s, ((2, 5), (0, 1), (2, 9))", &[0.0, 1.0, 2.0, 3.0])?,
            vec![1.0, 1.0, 5.0, 5.0]
        );
        // single points are constant
        assert_eq!(numbers("bpl, e, l, ((3, 7))", &events(3))?, vec![7.0, 7.0, 7.0]);
        assert!(GeneratorObject::parse("bpl, e, l, ()", 1).is_err());
        Ok(())
    }

    #[test]
    fn break_graph() -> Result<()> {
        assert_eq!(
            numbers("bgl, e, s, (c, 2), (bg, oc, (0, 1, 0)), 3", &events(6))?,
            vec![0.0, 0.5, 1.0, 0.5, 0.0, 0.0]
        );
        assert!(GeneratorObject::parse("bgl, e, s, 2, 1, 0", 1).is_err());
        Ok(())
    }

    #[test]
    fn line_segment() -> Result<()> {
        assert_eq!(
            numbers("ls, e, 2, (bg, oc, (0, 10)), (bg, oc, (4, 20))", &events(4))?,
            vec![0.0, 2.0, 10.0, 15.0]
        );
        Ok(())
    }

    #[test]
    fn envelopes() -> Result<()> {
        let values = numbers("egu, (c, 4), .5, .5, 0, 1", &[0.0, 1.0, 2.0, 3.999, 4.0, 5.0])?;
        assert_eq!(values[0], 0.0);
        assert_eq!(values[1], 1.0);
        assert_eq!(values[2], 1.0);
        assert!(values[3] < 0.01);
        assert_eq!(values[4], 0.0);
        assert_eq!(values[5], 1.0);

        let values = numbers("egt, p, (c, 10), 1, 1, 1, 1, 0, 2", &[0.0, 2.5, 5.0, 12.5])?;
        assert_eq!(values, vec![0.0, 2.0, 2.0, 2.0]);

        let values = numbers("ega, a, (c, 10), 1, 1, 2, 1, .5, 0, 1", &[0.5, 1.0, 3.0, 4.5, 9.0])?;
        assert_eq!(values, vec![0.5, 1.0, 0.5, 0.25, 0.0]);
        Ok(())
    }
}

//! Generator implementations, grouped by family.

use crate::error::{Error, Result};

use super::{Args, Generator};

pub mod basic;
pub mod basket;
pub mod breakpoint;
pub mod chaos;
pub mod generative;
pub mod iterate;
pub mod mask;
pub mod operator;
pub mod random;
pub mod series;
pub mod wave;

// -------------------------------------------------------------------------------------------------

/// How time advances in generators with a notion of a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    /// One step per evaluation.
    Event,
    /// Steps follow the event time in seconds.
    Time,
}

impl TryFrom<&str> for StepMode {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "event" | "e" => Ok(Self::Event),
            "time" | "t" => Ok(Self::Time),
            _ => Err(format!("invalid step mode '{value}', expected 'event' or 'time'")),
        }
    }
}

/// Edge behavior of break point functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    Loop,
    Single,
}

impl TryFrom<&str> for LoopMode {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "loop" | "l" => Ok(Self::Loop),
            "single" | "s" => Ok(Self::Single),
            _ => Err(format!("invalid loop mode '{value}', expected 'loop' or 'single'")),
        }
    }
}

/// Tracks the step position of [`StepMode`] driven generators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Stepper {
    mode: StepMode,
    count: usize,
}

impl Stepper {
    pub fn new(mode: StepMode) -> Self {
        Self { mode, count: 0 }
    }

    /// Position of the current evaluation: the event index or the time.
    pub fn next(&mut self, t: f64) -> f64 {
        let position = match self.mode {
            StepMode::Event => self.count as f64,
            StepMode::Time => t,
        };
        self.count += 1;
        position
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

// -------------------------------------------------------------------------------------------------

/// Construct the generator with the given long name.
pub(crate) fn build(name: &str, args: &Args) -> Result<Box<dyn Generator>> {
    use wave::WaveShape;
    let generator: Box<dyn Generator> = match name {
        "constant" => Box::new(basic::Constant::from_args(args)?),
        "staticInst" => Box::new(basic::StaticInst::from_args(args)?),
        "staticRange" => Box::new(basic::StaticRange::from_args(args)?),
        "cyclicGen" => Box::new(basic::CyclicGen::from_args(args)?),
        "constantFile" => Box::new(basic::ConstantFile::from_args(args)?),
        "typeFormat" => Box::new(basic::TypeFormat::from_args(args)?),
        "oneOver" => Box::new(basic::OneOver::from_args(args)?),
        "pathRead" => Box::new(basic::PathRead::from_args(args)?),
        "directorySelect" => Box::new(basic::DirectorySelect::from_args(args)?),
        "basketGen" => Box::new(basket::BasketGen::from_args(args)?),
        "basketFill" => Box::new(basket::BasketFill::from_args(args)?),
        "basketFillSelect" => Box::new(basket::BasketFillSelect::from_args(args)?),
        "basketSelect" => Box::new(basket::BasketSelect::from_args(args)?),
        "fibonacciSeries" => Box::new(series::FibonacciSeries::from_args(args)?),
        "valueSieve" => Box::new(series::ValueSieve::from_args(args)?),
        "sieveFunnel" => Box::new(series::SieveFunnel::from_args(args)?),
        "sieveList" => Box::new(series::SieveList::from_args(args)?),
        "listPrime" => Box::new(series::ListPrime::from_args(args)?),
        "valuePrime" => Box::new(series::ValuePrime::from_args(args)?),
        "logisticMap" => Box::new(chaos::LogisticMap::from_args(args)?),
        "henonBasket" => Box::new(chaos::HenonBasket::from_args(args)?),
        "lorenzBasket" => Box::new(chaos::LorenzBasket::from_args(args)?),
        "noise" => Box::new(mask::Noise::from_args(args)?),
        "mask" => Box::new(mask::Mask::from_args(args, false)?),
        "maskReject" => Box::new(mask::Mask::from_args(args, true)?),
        "maskScale" => Box::new(mask::MaskScale::from_args(args)?),
        "funnelBinary" => Box::new(mask::FunnelBinary::from_args(args)?),
        "accumulator" => Box::new(mask::Accumulator::from_args(args)?),
        "quantize" => Box::new(mask::Quantize::from_args(args)?),
        "markovValue" => Box::new(generative::MarkovValue::from_args(args)?),
        "markovGeneratorAnalysis" => {
            Box::new(generative::MarkovGeneratorAnalysis::from_args(args)?)
        }
        "grammarTerminus" => Box::new(generative::GrammarTerminus::from_args(args)?),
        "feedbackModelLibrary" => Box::new(generative::FeedbackModelLibrary::from_args(args)?),
        "caValue" => Box::new(generative::CaValue::from_args(args)?),
        "caList" => Box::new(generative::CaList::from_args(args)?),
        "iterateGroup" => Box::new(iterate::IterateGroup::from_args(args)?),
        "iterateWindow" => Box::new(iterate::IterateWindow::from_args(args)?),
        "iterateHold" => Box::new(iterate::IterateHold::from_args(args)?),
        "iterateCross" => Box::new(iterate::IterateCross::from_args(args)?),
        "iterateSelect" => Box::new(iterate::IterateSelect::from_args(args)?),
        "sampleAndHold" => Box::new(iterate::SampleAndHold::from_args(args)?),
        "waveSine" => Box::new(wave::Wave::from_args(args, WaveShape::Sine)?),
        "waveCosine" => Box::new(wave::Wave::from_args(args, WaveShape::Cosine)?),
        "waveSawUp" => Box::new(wave::Wave::from_args(args, WaveShape::SawUp)?),
        "waveSawDown" => Box::new(wave::Wave::from_args(args, WaveShape::SawDown)?),
        "wavePulse" => Box::new(wave::Wave::from_args(args, WaveShape::Pulse)?),
        "waveTriangle" => Box::new(wave::Wave::from_args(args, WaveShape::Triangle)?),
        "wavePowerUp" => Box::new(wave::Wave::from_args(args, WaveShape::PowerUp)?),
        "wavePowerDown" => Box::new(wave::Wave::from_args(args, WaveShape::PowerDown)?),
        "waveHalfPeriodSine" => Box::new(wave::HalfPeriodWave::from_args(args, WaveShape::Sine)?),
        "waveHalfPeriodCosine" => {
            Box::new(wave::HalfPeriodWave::from_args(args, WaveShape::Cosine)?)
        }
        "waveHalfPeriodPulse" => {
            Box::new(wave::HalfPeriodWave::from_args(args, WaveShape::Pulse)?)
        }
        "waveHalfPeriodTriangle" => {
            Box::new(wave::HalfPeriodWave::from_args(args, WaveShape::Triangle)?)
        }
        "randomUniform" | "randomLinear" | "randomInverseLinear" | "randomTriangular"
        | "randomInverseTriangular" | "randomExponential" | "randomInverseExponential"
        | "randomBilateralExponential" | "randomGauss" | "randomCauchy" | "randomBeta"
        | "randomWeibull" => Box::new(random::Random::from_args(args)?),
        "breakPointLinear" | "breakPointPower" | "breakPointHalfCosine" | "breakPointFlat" => {
            Box::new(breakpoint::BreakPointFunction::from_args(args)?)
        }
        "breakGraphLinear" | "breakGraphPower" | "breakGraphHalfCosine" | "breakGraphFlat" => {
            Box::new(breakpoint::BreakGraph::from_args(args)?)
        }
        "lineSegment" => Box::new(breakpoint::LineSegment::from_args(args)?),
        "envelopeGeneratorTrapezoid" | "envelopeGeneratorUnit" | "envelopeGeneratorAdsr" => {
            Box::new(breakpoint::EnvelopeGenerator::from_args(args)?)
        }
        "operatorAdd" | "operatorSubtract" | "operatorMultiply" | "operatorDivide"
        | "operatorPower" | "operatorCongruence" => {
            Box::new(operator::Operator::from_args(args)?)
        }
        _ => {
            return Err(Error::ParameterObjectSyntax(format!(
                "no generator named '{name}'"
            )))
        }
    };
    Ok(generator)
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn modes() {
        assert_eq!(StepMode::try_from("T"), Ok(StepMode::Time));
        assert_eq!(LoopMode::try_from("single"), Ok(LoopMode::Single));
        assert!(StepMode::try_from("x").is_err());

        let mut stepper = Stepper::new(StepMode::Event);
        assert_eq!(stepper.next(5.0), 0.0);
        assert_eq!(stepper.next(6.0), 1.0);
        stepper.reset();
        assert_eq!(stepper.next(7.0), 0.0);
        let mut stepper = Stepper::new(StepMode::Time);
        assert_eq!(stepper.next(2.5), 2.5);
    }
}

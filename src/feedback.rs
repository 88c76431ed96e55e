//! Discrete feedback systems: environments of aging particles, regulated by sensors which
//! produce new particles whenever they sense too few of them.

use std::collections::HashMap;

use crate::error::{Error, Result};

// -------------------------------------------------------------------------------------------------

/// A particle passing through a sequence of states, each lasting a number of frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    // state name, first and last age of the state
    bounds: Vec<(char, usize, usize)>,
    life_span: usize,
    age: usize,
    state: Option<char>,
}

impl Particle {
    pub fn new(life_cycle: &[(char, usize)]) -> Result<Self> {
        if life_cycle.is_empty() || life_cycle.iter().any(|(_, frames)| *frames == 0) {
            return Err(Error::ParameterObjectSyntax(
                "particle life cycle states must last at least one frame".to_string(),
            ));
        }
        let mut bounds = Vec::with_capacity(life_cycle.len());
        // age zero is not counted
        let mut pos = 1;
        for (state, frames) in life_cycle {
            bounds.push((*state, pos, pos + frames - 1));
            pos += frames;
        }
        Ok(Self {
            bounds,
            life_span: pos - 1,
            age: 0,
            state: Some(life_cycle[0].0),
        })
    }

    pub fn state(&self) -> Option<char> {
        self.state
    }

    pub fn is_dead(&self) -> bool {
        self.age > self.life_span
    }

    /// Age by the rounded `age_step`. Returns false when the particle died.
    pub fn advance(&mut self, age_step: f64) -> bool {
        self.age += age_step.round().max(0.0) as usize;
        if self.is_dead() {
            self.state = None;
            return false;
        }
        if let Some((state, _, _)) = self
            .bounds
            .iter()
            .find(|(_, first, last)| self.age >= *first && self.age <= *last)
        {
            self.state = Some(*state);
        }
        true
    }
}

// -------------------------------------------------------------------------------------------------

/// Senses the number of particles in one state, and produces new particles while the count
/// is below its threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorProducer {
    life_cycle: Vec<(char, usize)>,
    sense_state: char,
    threshold: usize,
}

impl SensorProducer {
    pub fn new(life_cycle: Vec<(char, usize)>, sense_state: char, threshold: usize) -> Self {
        Self {
            life_cycle,
            sense_state,
            threshold,
        }
    }

    pub fn set_threshold(&mut self, threshold: usize) {
        self.threshold = threshold;
    }

    /// Number of new particles to produce for the given composition.
    pub fn process(&self, composition: &HashMap<char, usize>) -> usize {
        let level = composition.get(&self.sense_state).copied().unwrap_or(0);
        if level < self.threshold {
            1
        } else {
            0
        }
    }

    pub fn produce(&self) -> Result<Particle> {
        Particle::new(&self.life_cycle)
    }
}

// -------------------------------------------------------------------------------------------------

/// Available feedback system models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackModel {
    /// Ten sensors regulating a single particle type around a common threshold.
    ClimateControl,
    /// Three sensor groups regulating particles in the three states of their life cycle.
    SensorSpectrum,
}

impl TryFrom<&str> for FeedbackModel {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cc" | "climatecontrol" => Ok(Self::ClimateControl),
            "ss" | "sensorspectrum" => Ok(Self::SensorSpectrum),
            _ => Err(format!("invalid feedback model '{value}'")),
        }
    }
}

impl std::fmt::Display for FeedbackModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClimateControl => f.write_str("climateControl"),
            Self::SensorSpectrum => f.write_str("sensorSpectrum"),
        }
    }
}

/// A particle environment with its sensors.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackEnvironment {
    model: FeedbackModel,
    particles: Vec<Particle>,
    sensors: Vec<SensorProducer>,
    threshold: usize,
}

impl FeedbackEnvironment {
    const SENSOR_COUNT: usize = 10;

    pub fn new(model: FeedbackModel, threshold: usize) -> Self {
        let threshold = threshold.max(1);
        let sensors = match model {
            FeedbackModel::ClimateControl => (0..Self::SENSOR_COUNT)
                .map(|_| SensorProducer::new(vec![('a', 4)], 'a', threshold))
                .collect(),
            FeedbackModel::SensorSpectrum => {
                let life_cycle = vec![('a', 2), ('b', 3), ('c', 2)];
                (0..Self::SENSOR_COUNT)
                    .map(|i| {
                        let state = ['a', 'b', 'c'][i % 3];
                        SensorProducer::new(life_cycle.clone(), state, 1)
                    })
                    .collect()
            }
        };
        let mut environment = Self {
            model,
            particles: Vec::new(),
            sensors,
            threshold,
        };
        environment.set_threshold(threshold);
        environment
    }

    pub fn model(&self) -> FeedbackModel {
        self.model
    }

    /// Set the desired total particle count.
    pub fn set_threshold(&mut self, threshold: usize) {
        self.threshold = threshold.max(1);
        let threshold = self.threshold;
        match self.model {
            FeedbackModel::ClimateControl => {
                self.sensors
                    .iter_mut()
                    .for_each(|s| s.set_threshold(threshold));
            }
            FeedbackModel::SensorSpectrum => {
                // weight states by their life span
                let parts = [(2, 'a'), (3, 'b'), (2, 'c')];
                for sensor in self.sensors.iter_mut() {
                    let weight = parts
                        .iter()
                        .find(|(_, s)| *s == sensor.sense_state)
                        .map(|(w, _)| *w)
                        .unwrap_or(1);
                    sensor.set_threshold(((threshold * weight) as f64 / 7.0).round() as usize);
                }
            }
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of living particles per state.
    pub fn composition(&self) -> HashMap<char, usize> {
        let mut composition = HashMap::new();
        for state in self.particles.iter().filter_map(Particle::state) {
            *composition.entry(state).or_insert(0) += 1;
        }
        composition
    }

    /// Number of living particles.
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Remove all particles.
    pub fn reset(&mut self) {
        self.particles.clear();
    }

    /// Age all particles, remove dead ones and let sensors produce new ones.
    pub fn advance(&mut self, age_step: f64) -> Result<()> {
        self.particles.retain_mut(|particle| particle.advance(age_step));
        let composition = self.composition();
        let mut produced = Vec::new();
        for sensor in &self.sensors {
            for _ in 0..sensor.process(&composition) {
                produced.push(sensor.produce()?);
            }
        }
        self.particles.extend(produced);
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn particle() -> Result<()> {
        let mut particle = Particle::new(&[('a', 3), ('b', 4), ('c', 8)])?;
        assert_eq!(particle.state(), Some('a'));
        assert!(particle.advance(4.0));
        assert_eq!(particle.state(), Some('b'));
        assert!(particle.advance(4.0));
        assert_eq!(particle.state(), Some('c'));
        assert!(!particle.advance(8.0));
        assert!(particle.is_dead());
        assert!(Particle::new(&[('a', 0)]).is_err());
        Ok(())
    }

    #[test]
    fn thermostat() -> Result<()> {
        let mut environment = FeedbackEnvironment::new(FeedbackModel::ClimateControl, 30);
        let mut counts = Vec::new();
        for _ in 0..40 {
            environment.advance(1.0)?;
            counts.push(environment.particle_count());
        }
        // regulates around the threshold, not beyond one sensor batch
        assert!(counts[10..].iter().all(|c| *c > 0 && *c <= 40));
        environment.set_threshold(5);
        for _ in 0..10 {
            environment.advance(1.0)?;
        }
        assert!(environment.particle_count() <= 15);
        Ok(())
    }

    #[test]
    fn spectrum() -> Result<()> {
        let mut environment = FeedbackEnvironment::new(FeedbackModel::SensorSpectrum, 70);
        for _ in 0..30 {
            environment.advance(1.0)?;
        }
        assert!(environment.particle_count() > 0);
        assert_eq!(
            FeedbackModel::try_from("cc"),
            Ok(FeedbackModel::ClimateControl)
        );
        Ok(())
    }
}

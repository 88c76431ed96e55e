//! Clones: filtered variants of a texture's events.
//!
//! A clone never creates events on its own. It copies the events of its parent texture,
//! optionally reverses them, and runs filters over the event axes. All filters default to
//! `bypass`, so a new clone doubles its texture.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    event::{EventField, EventSequence, Retrograde},
    parameter::{
        registry, Arg, CloneStatic, FilterObject, RefDict, RetrogradeMethod, TimeReference, Value,
    },
    pitch::{join_ps_real, split_oct_ps},
    random::derive_seed,
    texture::{aux_index, aux_label, switch, validate_name},
};

// -------------------------------------------------------------------------------------------------

const SLOT_TIME: u64 = 0;
const SLOT_SUS: u64 = 1;
const SLOT_ACC: u64 = 2;
const SLOT_AMP: u64 = 3;
const SLOT_PAN: u64 = 4;
const SLOT_FIELD: u64 = 5;
const SLOT_OCTAVE: u64 = 6;
const SLOT_AUX: u64 = 100;

const DEFAULT_TIME_REFERENCE: &str = "timeReferenceSource, textureTime";
const DEFAULT_RETROGRADE: &str = "retrogradeMethodToggle, off";

/// Filtered event axes of a clone, in processing order.
const AXES: [&str; 7] = ["time", "sus", "acc", "ampQ", "panQ", "fieldQ", "octQ"];

// -------------------------------------------------------------------------------------------------

/// A clone of a texture: filters for all event axes plus the clone statics.
#[derive(Debug, Clone)]
pub struct TextureClone {
    name: String,
    texture: String,
    seed: u64,
    mute: bool,
    time: FilterObject,
    sus: FilterObject,
    acc: FilterObject,
    amp: FilterObject,
    pan: FilterObject,
    field: FilterObject,
    octave: FilterObject,
    aux: Vec<FilterObject>,
    time_reference: TimeReference,
    time_reference_arg: Arg,
    retrograde: RetrogradeMethod,
    retrograde_arg: Arg,
}

impl TextureClone {
    /// Create a bypassing clone of the given texture with `aux_count` auxiliary filters.
    pub fn new<S: Into<String>, T: Into<String>>(
        name: S,
        texture: T,
        aux_count: usize,
        seed: u64,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            texture: texture.into(),
            seed,
            mute: false,
            time: FilterObject::bypass(),
            sus: FilterObject::bypass(),
            acc: FilterObject::bypass(),
            amp: FilterObject::bypass(),
            pan: FilterObject::bypass(),
            field: FilterObject::bypass(),
            octave: FilterObject::bypass(),
            aux: (0..aux_count).map(|_| FilterObject::bypass()).collect(),
            time_reference: TimeReference::TextureTime,
            time_reference_arg: Arg::parse(DEFAULT_TIME_REFERENCE)?,
            retrograde: RetrogradeMethod::Off,
            retrograde_arg: Arg::parse(DEFAULT_RETROGRADE)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the parent texture.
    pub fn texture(&self) -> &str {
        &self.texture
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_muted(&self) -> bool {
        self.mute
    }

    pub fn time_reference(&self) -> TimeReference {
        self.time_reference
    }

    pub fn retrograde(&self) -> RetrogradeMethod {
        self.retrograde
    }

    pub fn aux_count(&self) -> usize {
        self.aux.len()
    }

    // ---------------------------------------------------------------------------------------------

    /// A copy of this clone with a new name.
    pub fn copy_as<S: Into<String>>(&self, name: S) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        let mut clone = self.clone();
        clone.name = name;
        Ok(clone)
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) -> Result<()> {
        let name = name.into();
        validate_name(&name)?;
        self.name = name;
        Ok(())
    }

    /// Move the clone to another parent texture.
    pub fn set_texture<S: Into<String>>(&mut self, texture: S) {
        self.texture = texture.into();
    }

    pub fn set_mute(&mut self, mute: bool) {
        self.mute = mute;
    }

    /// Resize the auxiliary filters, e.g. after the parent's instrument changed. Existing
    /// filters are kept, new ones bypass.
    pub fn set_aux_count(&mut self, aux_count: usize) {
        self.aux.resize_with(aux_count, FilterObject::bypass);
    }

    /// Edit a filter or static by attribute name.
    ///
    /// Attributes are the axes `time`, `sus`, `acc`, `ampQ`, `panQ`, `fieldQ`, `octQ` and
    /// `auxQ<n>`, clone statics as `cloneQ` (given as e.g. `(rmt, timeInverse)`) and `mute`.
    /// The clone is unchanged when the argument is invalid.
    pub fn edit(&mut self, attribute: &str, arg: &Arg) -> Result<()> {
        let seed = self.seed;
        match attribute {
            "time" => self.time = filter(arg, derive_seed(seed, SLOT_TIME), attribute)?,
            "sus" => self.sus = filter(arg, derive_seed(seed, SLOT_SUS), attribute)?,
            "acc" => self.acc = filter(arg, derive_seed(seed, SLOT_ACC), attribute)?,
            "ampQ" => self.amp = filter(arg, derive_seed(seed, SLOT_AMP), attribute)?,
            "panQ" => self.pan = filter(arg, derive_seed(seed, SLOT_PAN), attribute)?,
            "fieldQ" => self.field = filter(arg, derive_seed(seed, SLOT_FIELD), attribute)?,
            "octQ" => self.octave = filter(arg, derive_seed(seed, SLOT_OCTAVE), attribute)?,
            "cloneQ" => {
                match registry::load_clone_static(arg).map_err(|err| err.with_context(attribute))? {
                    CloneStatic::TimeReferenceSource(reference) => {
                        self.time_reference = reference;
                        self.time_reference_arg = arg.clone();
                    }
                    CloneStatic::RetrogradeMethodToggle(method) => {
                        self.retrograde = method;
                        self.retrograde_arg = arg.clone();
                    }
                }
            }
            "mute" => self.mute = switch(arg, attribute)?,
            _ => {
                let index = aux_index(attribute).ok_or_else(|| {
                    Error::Argument(format!(
                        "clone {} has no attribute '{attribute}'",
                        self.name
                    ))
                })?;
                let aux_count = self.aux.len();
                let slot = self.aux.get_mut(index).ok_or_else(|| {
                    Error::Argument(format!(
                        "{attribute}: clone has {aux_count} auxiliary parameters"
                    ))
                })?;
                *slot = filter(arg, derive_seed(seed, SLOT_AUX + index as u64), attribute)?;
            }
        }
        Ok(())
    }

    /// Argument trees of all filters, keyed by attribute name.
    pub fn parameters(&self) -> BTreeMap<String, Arg> {
        let mut parameters = BTreeMap::new();
        for (name, filter) in AXES.iter().zip(self.filters()) {
            parameters.insert(name.to_string(), filter.arg().clone());
        }
        for (i, aux) in self.aux.iter().enumerate() {
            parameters.insert(aux_label(i), aux.arg().clone());
        }
        parameters
    }

    /// Argument trees of the clone statics, keyed by their long names.
    pub fn static_parameters(&self) -> BTreeMap<String, Arg> {
        BTreeMap::from([
            (
                "timeReferenceSource".to_string(),
                self.time_reference_arg.clone(),
            ),
            (
                "retrogradeMethodToggle".to_string(),
                self.retrograde_arg.clone(),
            ),
        ])
    }

    fn filters(&self) -> [&FilterObject; 7] {
        [
            &self.time,
            &self.sus,
            &self.acc,
            &self.amp,
            &self.pan,
            &self.field,
            &self.octave,
        ]
    }

    // ---------------------------------------------------------------------------------------------

    /// Rewind all filters to their initial state.
    pub fn reset(&mut self) {
        self.time.reset();
        self.sus.reset();
        self.acc.reset();
        self.amp.reset();
        self.pan.reset();
        self.field.reset();
        self.octave.reset();
        self.aux.iter_mut().for_each(FilterObject::reset);
    }

    /// Transform the events of the parent texture. The source sequence is not modified.
    pub fn score(&mut self, source: &EventSequence) -> Result<EventSequence> {
        self.reset();
        let mut events = source.clone();
        events.sort();
        if events.is_empty() {
            return Ok(events);
        }
        match self.retrograde {
            RetrogradeMethod::Off => (),
            RetrogradeMethod::EventInverse => events.retrograde(Retrograde::EventInverse),
            RetrogradeMethod::TimeInverse => events.retrograde(Retrograde::TimeInverse),
        }
        let contexts = events
            .iter()
            .map(|e| RefDict::with_bpm(e.bpm))
            .collect::<Vec<_>>();

        let texture_times = events.get_array(EventField::Time);
        let times = self
            .time
            .filter(&texture_times, &texture_times, &contexts)
            .into_iter()
            .map(|t| t.max(0.0))
            .collect::<Vec<_>>();
        self.set_array(&mut events, EventField::Time, &times)?;
        let times = match self.time_reference {
            TimeReference::TextureTime => texture_times,
            TimeReference::CloneTime => times,
        };

        let sus = events
            .get_array(EventField::Sus)
            .into_iter()
            .map(f64::abs)
            .collect::<Vec<_>>();
        let sus = self.sus.filter(&sus, &times, &contexts);
        self.set_array(&mut events, EventField::Sus, &sus)?;

        let acc = self.acc.filter(&events.get_array(EventField::Acc), &times, &contexts);
        self.set_array(&mut events, EventField::Acc, &acc)?;

        let amp = self.amp.filter(&events.get_array(EventField::Amp), &times, &contexts);
        self.set_array(&mut events, EventField::Amp, &amp)?;

        let pan = self
            .pan
            .filter(&events.get_array(EventField::Pan), &times, &contexts)
            .into_iter()
            .map(|pan| {
                if (0.0..=1.0).contains(&pan) {
                    pan
                } else {
                    pan.rem_euclid(1.0)
                }
            })
            .collect::<Vec<_>>();
        self.set_array(&mut events, EventField::Pan, &pan)?;

        // the field filter transposes pitch space, the octave filter only the octaves
        let ps = self.field.filter(&events.get_array(EventField::Ps), &times, &contexts);
        let (octaves, pitch_classes): (Vec<f64>, Vec<f64>) = ps
            .iter()
            .map(|ps| {
                let (octave, pc) = split_oct_ps(*ps);
                (octave as f64, pc)
            })
            .unzip();
        let ps = self
            .octave
            .filter(&octaves, &times, &contexts)
            .into_iter()
            .zip(pitch_classes)
            .map(|(octave, pc)| join_ps_real(octave.round() as i64, pc, 0.0))
            .collect::<Vec<_>>();
        self.set_array(&mut events, EventField::Ps, &ps)?;

        for (index, filter) in self.aux.iter_mut().enumerate() {
            if filter.is_bypass() {
                continue;
            }
            let values = events.aux_array(index);
            if !values.iter().all(Value::is_number) {
                log::warn!(
                    "clone {}: auxQ{index} contains strings, which can't be filtered",
                    self.name
                );
                continue;
            }
            let numbers = values.iter().map(Value::as_f64).collect::<Vec<_>>();
            let filtered = filter
                .filter(&numbers, &times, &contexts)
                .into_iter()
                .map(Value::Number)
                .collect();
            events
                .set_aux_array(index, filtered)
                .map_err(|err| Error::Clone(format!("clone {}: {err}", self.name)))?;
        }

        events.update_post();
        Ok(events)
    }

    fn set_array(&self, events: &mut EventSequence, field: EventField, values: &[f64]) -> Result<()> {
        events
            .set_array(field, values)
            .map_err(|err| Error::Clone(format!("clone {}: {err}", self.name)))
    }

    // ---------------------------------------------------------------------------------------------

    /// Serializable form of the clone.
    pub fn to_data(&self) -> CloneData {
        CloneData {
            name: self.name.clone(),
            texture: self.texture.clone(),
            seed: self.seed,
            mute: self.mute,
            aux_count: self.aux.len(),
            parameters: self.parameters(),
            statics: self.static_parameters(),
        }
    }

    /// Restore a clone from its serialized form.
    pub fn from_data(data: &CloneData) -> Result<Self> {
        let mut clone = Self::new(
            data.name.clone(),
            data.texture.clone(),
            data.aux_count,
            data.seed,
        )?;
        for (attribute, arg) in &data.parameters {
            clone.edit(attribute, arg)?;
        }
        for arg in data.statics.values() {
            clone.edit("cloneQ", arg)?;
        }
        clone.mute = data.mute;
        Ok(clone)
    }
}

// -------------------------------------------------------------------------------------------------

/// Serialized form of a [`TextureClone`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneData {
    pub name: String,
    pub texture: String,
    pub seed: u64,
    pub mute: bool,
    pub aux_count: usize,
    pub parameters: BTreeMap<String, Arg>,
    pub statics: BTreeMap<String, Arg>,
}

fn filter(arg: &Arg, seed: u64, attribute: &str) -> Result<FilterObject> {
    registry::load_filter(arg, seed).map_err(|err| err.with_context(attribute))
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::Event;
    use pretty_assertions::assert_eq;

    fn source() -> EventSequence {
        EventSequence::from_events(
            [(0.0, 1.0, 0.0), (1.0, 1.0, 2.0), (2.0, 2.0, 14.0)]
                .iter()
                .map(|(time, dur, ps)| Event {
                    time: *time,
                    dur: *dur,
                    sus: *dur,
                    amp: 0.5,
                    ps: *ps,
                    aux: vec![Value::Number(1.0)],
                    ..Event::default()
                })
                .collect(),
        )
    }

    fn edit(clone: &mut TextureClone, attribute: &str, arg: &str) -> Result<()> {
        clone.edit(attribute, &Arg::parse(arg)?)
    }

    #[test]
    fn bypass() -> Result<()> {
        let source = source();
        let mut clone = TextureClone::new("c1", "t1", 1, 0)?;
        assert_eq!(clone.score(&source)?, source);
        assert!(TextureClone::new("c 1", "t1", 1, 0).is_err());
        Ok(())
    }

    #[test]
    fn filters() -> Result<()> {
        let source = source();
        let mut clone = TextureClone::new("c1", "t1", 1, 0)?;
        edit(&mut clone, "time", "fa, (c, -.5)")?;
        edit(&mut clone, "ampQ", "fm, (c, 2)")?;
        edit(&mut clone, "panQ", "fa, (c, .75)")?;
        edit(&mut clone, "octQ", "fa, (c, 1)")?;
        edit(&mut clone, "auxQ0", "fa, (c, 2)")?;
        let events = clone.score(&source)?;
        // times are limited to be non-negative
        assert_eq!(events.get_array(EventField::Time), vec![0.0, 0.5, 1.5]);
        assert_eq!(events.get_array(EventField::Amp), vec![1.0; 3]);
        assert_eq!(events.get_array(EventField::Pan), vec![0.25; 3]);
        assert_eq!(events.get_array(EventField::Ps), vec![12.0, 14.0, 26.0]);
        assert_eq!(events.aux_array(0), vec![Value::Number(3.0); 3]);
        // the source is untouched
        assert_eq!(source.get_array(EventField::Time), vec![0.0, 1.0, 2.0]);

        edit(&mut clone, "fieldQ", "fa, (c, -1)")?;
        let events = clone.score(&source)?;
        assert_eq!(events.get_array(EventField::Ps), vec![11.0, 13.0, 25.0]);
        Ok(())
    }

    #[test]
    fn retrograde() -> Result<()> {
        let source = source();
        let mut clone = TextureClone::new("c1", "t1", 1, 0)?;
        edit(&mut clone, "cloneQ", "rmt, ei")?;
        let events = clone.score(&source)?;
        assert_eq!(events.get_array(EventField::Time), vec![0.0, 1.0, 2.0]);
        assert_eq!(events.get_array(EventField::Ps), vec![14.0, 2.0, 0.0]);

        edit(&mut clone, "cloneQ", "rmt, ti")?;
        let events = clone.score(&source)?;
        assert_eq!(events.get_array(EventField::Ps), vec![14.0, 2.0, 0.0]);
        // the last duration is kept
        assert_eq!(events.get_array(EventField::Dur), vec![1.0, 1.0, 1.0]);
        Ok(())
    }

    #[test]
    fn edits_and_data() -> Result<()> {
        let mut clone = TextureClone::new("c1", "t1", 1, 3)?;
        assert!(edit(&mut clone, "auxQ1", "fa, (c, 2)").is_err());
        assert!(edit(&mut clone, "ampQ", "fa, (foo)").is_err());
        assert!(edit(&mut clone, "cloneQ", "rmt, sideways").is_err());
        assert!(edit(&mut clone, "nothing", "b").is_err());
        assert_eq!(clone.retrograde(), RetrogradeMethod::Off);

        edit(&mut clone, "sus", "fm, (c, .5)")?;
        edit(&mut clone, "cloneQ", "trs, ct")?;
        edit(&mut clone, "mute", "on")?;
        clone.set_aux_count(2);
        assert_eq!(clone.aux_count(), 2);

        let data = clone.to_data();
        let json = serde_json::to_string(&data)?;
        let restored = TextureClone::from_data(&serde_json::from_str(&json)?)?;
        assert_eq!(restored.to_data(), data);
        assert_eq!(restored.time_reference(), TimeReference::CloneTime);
        assert!(restored.is_muted());

        let copy = restored.copy_as("c2")?;
        assert_eq!(copy.name(), "c2");
        assert_eq!(copy.parameters(), restored.parameters());
        Ok(())
    }
}

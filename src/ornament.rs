//! Ornament library and realization: trills, turns, rises, falls and arcs around a base note.
//!
//! An ornament is described by a contour of scale steps relative to the base note. Scale steps
//! are interpreted as half steps, as steps of a scale collected from the current set or the
//! whole path, or as micro tones. The ornament takes a share of the base note's duration,
//! placed at its attack, its release, or anticipating it.

use std::collections::BTreeMap;

use rand::seq::IndexedRandom;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{
    error::{Error, Result},
    pitch::{ps_to_tempered, split_oct_ps},
    random::{gauss, new_rand_gen},
    temperament::Temperament,
    unit,
};

// -------------------------------------------------------------------------------------------------

/// Minimum duration of a base note in seconds.
const MIN_BASE_DURATION: f64 = 0.0001;
/// Gap between ornament notes in seconds.
const NOTE_GAP: f64 = 0.003;

/// How ornament durations relate to the available time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrnamentStyle {
    /// Played once with its own durations, scaled only when it does not fit.
    Single,
    /// Repeated until the available time is filled.
    Loop,
    /// Played once, scaled to the available time.
    Scale,
}

/// Where the ornament is placed relative to the base note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrnamentPosition {
    Attack,
    Release,
    Anticipate,
}

/// How contour steps are translated into pitches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchLanguage {
    Chromatic,
    Set,
    Path,
    Microtone,
}

/// A library ornament.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrnamentPreset {
    pub contour: &'static [i32],
    pub style: OrnamentStyle,
    /// Estimated share of the base note duration used by the ornament.
    pub note_percent: f64,
    /// Model durations in seconds.
    pub durations: &'static [f64],
    /// Maximum relative random deviation of each duration.
    pub duration_offset: f64,
    /// Amplitude of ornament notes relative to the base note.
    pub amp_scaler: f64,
    /// Maximum relative random deviation of each amplitude.
    pub amp_offset: f64,
}

const TRILL_DURATIONS: &[f64] = &[0.115, 0.110, 0.107, 0.101];
const TURN_DURATIONS: &[f64] = &[0.90, 0.088, 0.96, 0.086];

/// The ornament library by name.
pub const ORNAMENT_PRESETS: [(&str, OrnamentPreset); 17] = [
    ("trill.0,1.a", OrnamentPreset {
        contour: &[0, 1],
        style: OrnamentStyle::Loop,
        note_percent: 0.55,
        durations: &[0.095, 0.101, 0.095, 0.099],
        duration_offset: 0.034,
        amp_scaler: 0.920,
        amp_offset: 0.012,
    }),
    ("trill.0,1.b", OrnamentPreset {
        contour: &[0, 1],
        style: OrnamentStyle::Loop,
        note_percent: 0.60,
        durations: TRILL_DURATIONS,
        duration_offset: 0.042,
        amp_scaler: 0.930,
        amp_offset: 0.010,
    }),
    ("trillocto.0,12.a", OrnamentPreset {
        contour: &[0, 12],
        style: OrnamentStyle::Loop,
        note_percent: 0.60,
        durations: TRILL_DURATIONS,
        duration_offset: 0.042,
        amp_scaler: 0.930,
        amp_offset: 0.010,
    }),
    ("trillMin3.0,3.a", OrnamentPreset {
        contour: &[0, 3],
        style: OrnamentStyle::Loop,
        note_percent: 0.60,
        durations: TRILL_DURATIONS,
        duration_offset: 0.042,
        amp_scaler: 0.930,
        amp_offset: 0.010,
    }),
    ("trillMaj3.0,4.a", OrnamentPreset {
        contour: &[0, 4],
        style: OrnamentStyle::Loop,
        note_percent: 0.60,
        durations: TRILL_DURATIONS,
        duration_offset: 0.042,
        amp_scaler: 0.930,
        amp_offset: 0.010,
    }),
    ("trillP5.0,7.a", OrnamentPreset {
        contour: &[0, 5],
        style: OrnamentStyle::Loop,
        note_percent: 0.60,
        durations: &[0.115, 0.110, 0.101],
        duration_offset: 0.042,
        amp_scaler: 0.930,
        amp_offset: 0.015,
    }),
    ("turn.0,1,0,-1.a", OrnamentPreset {
        contour: &[0, 1, 0, -1],
        style: OrnamentStyle::Loop,
        note_percent: 0.47,
        durations: TURN_DURATIONS,
        duration_offset: 0.023,
        amp_scaler: 0.940,
        amp_offset: 0.025,
    }),
    ("turn.0,1,0,-1.b", OrnamentPreset {
        contour: &[0, 1, 0, -1],
        style: OrnamentStyle::Single,
        note_percent: 0.50,
        durations: &[0.110, 0.088, 0.105, 0.091],
        duration_offset: 0.023,
        amp_scaler: 0.940,
        amp_offset: 0.025,
    }),
    ("turn.0,3,0,-3.a", OrnamentPreset {
        contour: &[0, 1, 0, -1],
        style: OrnamentStyle::Loop,
        note_percent: 0.47,
        durations: TURN_DURATIONS,
        duration_offset: 0.023,
        amp_scaler: 0.940,
        amp_offset: 0.025,
    }),
    ("rise.-2,-1", OrnamentPreset {
        contour: &[-2, -1],
        style: OrnamentStyle::Single,
        note_percent: 0.45,
        durations: &[0.094],
        duration_offset: 0.020,
        amp_scaler: 0.940,
        amp_offset: 0.012,
    }),
    ("rise.1,2", OrnamentPreset {
        contour: &[1, 2],
        style: OrnamentStyle::Scale,
        note_percent: 0.50,
        durations: &[0.099, 0.105],
        duration_offset: 0.032,
        amp_scaler: 0.960,
        amp_offset: 0.025,
    }),
    ("rise.-1", OrnamentPreset {
        contour: &[-1],
        style: OrnamentStyle::Scale,
        note_percent: 0.30,
        durations: &[0.099, 0.105],
        duration_offset: 0.022,
        amp_scaler: 0.960,
        amp_offset: 0.025,
    }),
    ("fall.2,1", OrnamentPreset {
        contour: &[2, 1],
        style: OrnamentStyle::Single,
        note_percent: 0.50,
        durations: &[0.099, 0.110],
        duration_offset: 0.034,
        amp_scaler: 0.950,
        amp_offset: 0.008,
    }),
    ("fall.1,0,-1", OrnamentPreset {
        contour: &[1, 0, -1],
        style: OrnamentStyle::Single,
        note_percent: 0.50,
        durations: &[0.092, 0.094, 0.099],
        duration_offset: 0.025,
        amp_scaler: 0.950,
        amp_offset: 0.020,
    }),
    ("arc.-1,2,1", OrnamentPreset {
        contour: &[-1, 2, 1],
        style: OrnamentStyle::Scale,
        note_percent: 0.50,
        durations: &[0.100, 0.105, 0.110],
        duration_offset: 0.032,
        amp_scaler: 0.940,
        amp_offset: 0.023,
    }),
    ("arc.0,1", OrnamentPreset {
        contour: &[0, 1],
        style: OrnamentStyle::Single,
        note_percent: 0.50,
        durations: &[0.099, 0.097],
        duration_offset: 0.037,
        amp_scaler: 0.950,
        amp_offset: 0.018,
    }),
    ("fall.extended.a", OrnamentPreset {
        contour: &[2, 0, -1, -2, 2, 0, -1, -2, 0, -1, -2, 0, -1, -2, -1, -2, -1, -2],
        style: OrnamentStyle::Scale,
        note_percent: 0.70,
        durations: &[0.088, 0.094, 0.086, 0.094, 0.090],
        duration_offset: 0.022,
        amp_scaler: 0.950,
        amp_offset: 0.010,
    }),
];

/// Look up a library ornament by name.
pub fn ornament_preset(name: &str) -> Option<&'static OrnamentPreset> {
    ORNAMENT_PRESETS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, preset)| preset)
}

// -------------------------------------------------------------------------------------------------

/// A library ornament with its placement, pitch language and micro tone size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrnamentChoice {
    pub name: &'static str,
    pub position: OrnamentPosition,
    pub language: PitchLanguage,
    pub micro_tone: f64,
}

const fn choice(
    name: &'static str,
    position: OrnamentPosition,
    language: PitchLanguage,
    micro_tone: f64,
) -> OrnamentChoice {
    OrnamentChoice {
        name,
        position,
        language,
        micro_tone,
    }
}

use OrnamentPosition::{Attack, Release};
use PitchLanguage::{Chromatic, Microtone, Path};

const DIATONIC_GROUP_A: &[OrnamentChoice] = &[
    choice("turn.0,1,0,-1.b", Attack, Path, 0.5),
    choice("trill.0,1.b", Release, Path, 0.5),
    choice("rise.-2,-1", Attack, Path, 0.5),
    choice("trill.0,1.a", Release, Microtone, 0.125),
    choice("arc.-1,2,1", Attack, Path, 0.5),
    choice("fall.2,1", Attack, Path, 0.5),
    choice("trill.0,1.a", Release, Microtone, 0.092),
    choice("rise.1,2", Release, Path, 0.5),
    choice("arc.0,1", Attack, Path, 0.5),
    choice("fall.1,0,-1", Release, Path, 0.5),
];

const DIATONIC_GROUP_B: &[OrnamentChoice] = &[
    choice("turn.0,1,0,-1.b", Attack, Path, 0.5),
    choice("trill.0,1.b", Release, Path, 0.5),
    choice("fall.2,1", Attack, Path, 0.5),
    choice("arc.0,1", Attack, Path, 0.5),
];

const MICRO_GROUP_A: &[OrnamentChoice] = &[
    choice("turn.0,1,0,-1.b", Attack, Microtone, 0.11),
    choice("trill.0,1.b", Release, Microtone, 0.13),
    choice("rise.-1", Attack, Path, 0.09),
    choice("rise.-2,-1", Attack, Path, 0.05),
    choice("arc.-1,2,1", Attack, Microtone, 0.08),
    choice("fall.2,1", Attack, Path, 0.10),
    choice("rise.1,2", Release, Microtone, 0.02),
    choice("arc.0,1", Attack, Microtone, 0.034543),
    choice("fall.1,0,-1", Release, Microtone, 0.0654),
];

const MICRO_GROUP_B: &[OrnamentChoice] = &[
    choice("rise.-1", Attack, Path, 0.5),
    choice("arc.-1,2,1", Attack, Microtone, 0.13),
    choice("fall.2,1", Attack, Path, 0.5),
    choice("rise.-1", Attack, Microtone, 0.15),
    choice("arc.0,1", Attack, Microtone, 0.14543),
    choice("fall.1,0,-1", Release, Microtone, 0.07),
];

const MICRO_GROUP_C: &[OrnamentChoice] = &[
    choice("rise.-1", Attack, Microtone, 0.17),
    choice("arc.-1,2,1", Attack, Microtone, 0.065),
    choice("rise.-1", Attack, Microtone, 0.19),
    choice("arc.0,1", Attack, Microtone, 0.17),
    choice("fall.1,0,-1", Release, Microtone, 0.08),
    choice("fall.2,1", Attack, Microtone, 0.06),
];

const CHROMATIC_GROUP_A: &[OrnamentChoice] = &[
    choice("rise.-1", Attack, Chromatic, 0.17),
    choice("rise.-1", Attack, Chromatic, 0.13),
    choice("arc.0,1", Attack, Chromatic, 0.10),
    choice("fall.1,0,-1", Release, Chromatic, 0.08),
    choice("trill.0,1.a", Release, Chromatic, 0.092),
];

const CHROMATIC_GROUP_B: &[OrnamentChoice] = &[
    choice("turn.0,1,0,-1.b", Attack, Chromatic, 0.5),
    choice("trill.0,1.b", Release, Chromatic, 0.5),
    choice("fall.2,1", Attack, Chromatic, 0.5),
    choice("arc.0,1", Attack, Chromatic, 0.5),
];

const CHROMATIC_GROUP_C: &[OrnamentChoice] = &[
    choice("rise.-2,-1", Attack, Chromatic, 0.5),
    choice("rise.1,2", Release, Chromatic, 0.5),
    choice("arc.-1,2,1", Attack, Chromatic, 0.5),
    choice("fall.1,0,-1", Release, Chromatic, 0.5),
    choice("trill.0,1.b", Release, Chromatic, 0.5),
    choice("trillMin3.0,3.a", Release, Chromatic, 0.5),
];

const TRILL_GROUP_A: &[OrnamentChoice] = &[
    choice("rise.-1", Attack, Path, 0.17),
    choice("trill.0,1.a", Release, Microtone, 0.21),
    choice("trill.0,1.a", Release, Microtone, 0.15),
    choice("trill.0,1.b", Attack, Microtone, 0.12),
    choice("trill.0,1.b", Release, Microtone, 0.17),
    choice("turn.0,1,0,-1.a", Release, Microtone, 0.27),
    choice("turn.0,1,0,-1.a", Attack, Microtone, 0.05),
    choice("turn.0,1,0,-1.b", Release, Path, 0.18),
    choice("turn.0,1,0,-1.b", Attack, Path, 0.18),
];

/// Named groups of ornament choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrnamentGroup {
    Off,
    DiatonicGroupA,
    DiatonicGroupB,
    MicroGroupA,
    MicroGroupB,
    MicroGroupC,
    ChromaticGroupA,
    ChromaticGroupB,
    ChromaticGroupC,
    TrillGroupA,
}

impl OrnamentGroup {
    pub const ALL: [OrnamentGroup; 10] = [
        Self::Off,
        Self::DiatonicGroupA,
        Self::DiatonicGroupB,
        Self::MicroGroupA,
        Self::MicroGroupB,
        Self::MicroGroupC,
        Self::ChromaticGroupA,
        Self::ChromaticGroupB,
        Self::ChromaticGroupC,
        Self::TrillGroupA,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::DiatonicGroupA => "diatonicGroupA",
            Self::DiatonicGroupB => "diatonicGroupB",
            Self::MicroGroupA => "microGroupA",
            Self::MicroGroupB => "microGroupB",
            Self::MicroGroupC => "microGroupC",
            Self::ChromaticGroupA => "chromaticGroupA",
            Self::ChromaticGroupB => "chromaticGroupB",
            Self::ChromaticGroupC => "chromaticGroupC",
            Self::TrillGroupA => "trillGroupA",
        }
    }

    /// The group's ornament choices. Empty when off.
    pub fn choices(&self) -> &'static [OrnamentChoice] {
        match self {
            Self::Off => &[],
            Self::DiatonicGroupA => DIATONIC_GROUP_A,
            Self::DiatonicGroupB => DIATONIC_GROUP_B,
            Self::MicroGroupA => MICRO_GROUP_A,
            Self::MicroGroupB => MICRO_GROUP_B,
            Self::MicroGroupC => MICRO_GROUP_C,
            Self::ChromaticGroupA => CHROMATIC_GROUP_A,
            Self::ChromaticGroupB => CHROMATIC_GROUP_B,
            Self::ChromaticGroupC => CHROMATIC_GROUP_C,
            Self::TrillGroupA => TRILL_GROUP_A,
        }
    }
}

impl TryFrom<&str> for OrnamentGroup {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, String> {
        let lower = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|group| group.name().to_ascii_lowercase() == lower)
            .ok_or_else(|| format!("invalid ornament group '{value}'"))
    }
}

impl std::fmt::Display for OrnamentGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// -------------------------------------------------------------------------------------------------

/// Sorted, distinct pitch space values and pitch classes of a pitch group.
pub fn collect_scales(pitch_groups: &[Vec<f64>]) -> (Vec<f64>, Vec<f64>) {
    let mut space = Vec::<f64>::new();
    let mut classes = Vec::<f64>::new();
    for ps in pitch_groups.iter().flatten() {
        if !space.contains(ps) {
            space.push(*ps);
        }
        let pc = ps.rem_euclid(12.0);
        if !classes.contains(&pc) {
            classes.push(pc);
        }
    }
    space.sort_by(f64::total_cmp);
    classes.sort_by(f64::total_cmp);
    (space, classes)
}

/// Lower and upper scale neighbours of `base` within the given sorted pitch classes.
pub fn scale_neighbors(pitch_classes: &[f64], base: f64) -> (f64, f64) {
    if pitch_classes.is_empty() {
        return (base - 1.0, base + 1.0);
    }
    let (oct, pc) = split_oct_ps(base);
    let round2 = |v: f64| (v * 100.0).round();
    let index = pitch_classes
        .iter()
        .position(|p| *p == pc)
        .or_else(|| pitch_classes.iter().position(|p| round2(*p) == round2(pc)))
        .unwrap_or(0);
    let last = pitch_classes.len() - 1;
    let lower = if index == 0 {
        pitch_classes[last] - 12.0
    } else {
        pitch_classes[index - 1]
    };
    let upper = if index == last {
        pitch_classes[0] + 12.0
    } else {
        pitch_classes[index + 1]
    };
    (lower + 12.0 * oct as f64, upper + 12.0 * oct as f64)
}

/// Map scale steps around `base` to pitch space values.
pub fn map_scale_steps(pitch_classes: &[f64], base: f64, contour: &[i32]) -> BTreeMap<i32, f64> {
    let max = contour.iter().map(|c| c.abs()).max().unwrap_or(0);
    let mut steps = BTreeMap::from([(0, base)]);
    let mut last = base;
    for step in 1..=max {
        last = scale_neighbors(pitch_classes, last).1;
        steps.insert(step, last);
    }
    let mut last = base;
    for step in 1..=max {
        last = scale_neighbors(pitch_classes, last).0;
        steps.insert(-step, last);
    }
    steps
}

// -------------------------------------------------------------------------------------------------

/// Base note context for an ornament.
#[derive(Debug, Clone, Copy)]
pub struct OrnamentContext<'a> {
    pub time: f64,
    /// Untransposed, untempered pitch space value of the base note.
    pub ps_raw: f64,
    /// Rhythm duration of the base note.
    pub dur: f64,
    pub amp: f64,
    pub pan: f64,
    pub octave: f64,
    pub field: f64,
    pub chord: &'a [f64],
    pub path: &'a [Vec<f64>],
}

/// A realized base or ornament note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrnamentNote {
    pub time: f64,
    pub sus: f64,
    pub amp: f64,
    pub ps: f64,
    pub pan: f64,
}

/// Realizes ornaments with its own seeded random state.
#[derive(Debug, Clone)]
pub struct Ornamenter {
    seed: u64,
    rand_gen: Xoshiro256PlusPlus,
}

impl Ornamenter {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rand_gen: new_rand_gen(seed),
        }
    }

    pub fn reset(&mut self) {
        self.rand_gen = new_rand_gen(self.seed);
    }

    /// Randomly pick an ornament from the group. None when the group is off.
    pub fn choose(&mut self, group: OrnamentGroup) -> Option<OrnamentChoice> {
        group.choices().choose(&mut self.rand_gen).copied()
    }

    /// Random value in -1..=1, centered on 0.
    fn noise(&mut self) -> f64 {
        let value = gauss(&mut self.rand_gen, 0.5, 0.1);
        unit::denorm(value, -1.0, 1.0)
    }

    fn contour_pitches(
        &self,
        context: &OrnamentContext,
        preset: &OrnamentPreset,
        choice: &OrnamentChoice,
        mut temperament: Option<&mut Temperament>,
    ) -> Vec<f64> {
        let mut temper = |ps: f64, field: f64| {
            ps_to_tempered(ps, context.octave, temperament.as_deref_mut(), field)
        };
        match choice.language {
            PitchLanguage::Chromatic => preset
                .contour
                .iter()
                .map(|step| temper(context.ps_raw + *step as f64, context.field))
                .collect(),
            PitchLanguage::Microtone => preset
                .contour
                .iter()
                .map(|step| temper(context.ps_raw, context.field + *step as f64 * choice.micro_tone))
                .collect(),
            PitchLanguage::Set | PitchLanguage::Path => {
                let (_, classes) = if choice.language == PitchLanguage::Set {
                    collect_scales(&[context.chord.to_vec()])
                } else {
                    collect_scales(context.path)
                };
                let steps = map_scale_steps(&classes, context.ps_raw, preset.contour);
                preset
                    .contour
                    .iter()
                    .map(|step| {
                        temper(
                            steps.get(step).copied().unwrap_or(context.ps_raw),
                            context.field,
                        )
                    })
                    .collect()
            }
        }
    }

    /// Ornament note durations for the estimated ornament time.
    fn durations(&mut self, preset: &OrnamentPreset, estimate: f64) -> Vec<f64> {
        let goal = preset.durations;
        let contour_len = preset.contour.len();
        let sliced = goal.iter().cycle().take(contour_len).copied().collect::<Vec<_>>();
        let model_total = sliced.iter().sum::<f64>();
        let offset = preset.duration_offset;
        let mut durations = Vec::new();
        match preset.style {
            OrnamentStyle::Scale => {
                for dur in &sliced {
                    let dur = dur / model_total * estimate;
                    durations.push(dur + self.noise() * dur * offset);
                }
            }
            OrnamentStyle::Single => {
                let fits = model_total <= estimate;
                for dur in goal.iter().take(contour_len) {
                    let dur = if fits { *dur } else { dur / model_total * estimate };
                    durations.push(dur + self.noise() * dur * offset);
                }
            }
            OrnamentStyle::Loop => {
                let fits = model_total <= estimate;
                let scaled = |dur: f64| if fits { dur } else { dur / model_total * estimate };
                let mut index = 0;
                let mut total = 0.0;
                loop {
                    let dur = scaled(goal[index]);
                    index = (index + 1) % goal.len();
                    let next = scaled(goal[index]);
                    let dur = dur + self.noise() * dur * offset;
                    durations.push(dur);
                    total += dur;
                    if total > estimate - next || total >= estimate {
                        break;
                    }
                }
            }
        }
        durations
    }

    /// Realize an ornament for the given base note. Returns the base note and ornament notes.
    /// When the ornament does not fit, only the base note is returned.
    pub fn create(
        &mut self,
        context: &OrnamentContext,
        choice: &OrnamentChoice,
        mut temperament: Option<&mut Temperament>,
    ) -> Result<Vec<OrnamentNote>> {
        let preset = ornament_preset(choice.name).ok_or_else(|| {
            Error::ParameterObjectSyntax(format!("no such ornament '{}'", choice.name))
        })?;
        let ps_base = ps_to_tempered(
            context.ps_raw,
            context.octave,
            temperament.as_deref_mut(),
            context.field,
        );
        let base_only = vec![OrnamentNote {
            time: context.time,
            sus: context.dur,
            amp: context.amp,
            ps: ps_base,
            pan: context.pan,
        }];
        if context.dur <= 0.0 || preset.durations.is_empty() {
            return Ok(base_only);
        }
        let pitches = self.contour_pitches(context, preset, choice, temperament);
        let durations = self.durations(preset, context.dur * preset.note_percent);
        let total = durations.iter().sum::<f64>();
        if total > context.dur {
            log::warn!(
                "ornament '{}' at {:.3}s is longer than its base note, skipping",
                choice.name,
                context.time
            );
            return Ok(base_only);
        }
        let mut position = choice.position;
        if position == OrnamentPosition::Anticipate && context.time - total < 0.0 {
            position = OrnamentPosition::Attack;
        }
        let (base_dur, base_start, orn_start, orn_end) = match position {
            OrnamentPosition::Release => (
                context.dur - total,
                context.time,
                context.time + context.dur - total,
                context.time + context.dur,
            ),
            OrnamentPosition::Anticipate => (
                context.dur,
                context.time,
                context.time - total,
                context.time,
            ),
            OrnamentPosition::Attack => (
                context.dur - total,
                context.time + total,
                context.time,
                context.time + total,
            ),
        };
        if base_dur < MIN_BASE_DURATION {
            log::warn!(
                "ornament '{}' at {:.3}s leaves no time for its base note, skipping",
                choice.name,
                context.time
            );
            return Ok(base_only);
        }
        let base = OrnamentNote {
            time: base_start,
            sus: base_dur,
            amp: context.amp,
            ps: ps_base,
            pan: context.pan,
        };
        let amp = context.amp * preset.amp_scaler;
        let mut notes = Vec::new();
        let mut t = orn_start;
        let mut pitch_index = 0;
        let mut dur_index = 0;
        loop {
            let dur = durations[dur_index];
            let amp = amp + self.noise() * amp * preset.amp_offset;
            notes.push(OrnamentNote {
                time: t,
                sus: dur - NOTE_GAP,
                amp,
                ps: pitches[pitch_index],
                pan: context.pan,
            });
            t += dur;
            pitch_index = (pitch_index + 1) % pitches.len();
            dur_index = (dur_index + 1) % durations.len();
            if preset.style == OrnamentStyle::Loop {
                if t >= orn_end || t + durations[dur_index] >= orn_end {
                    break;
                }
            } else if dur_index == 0 {
                break;
            }
        }
        if position == OrnamentPosition::Release {
            notes.insert(0, base);
        } else {
            notes.push(base);
        }
        Ok(notes)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn neighbors() {
        let (space, classes) = collect_scales(&[vec![0.0, 4.0, 7.0], vec![14.0, 2.0]]);
        assert_eq!(space, vec![0.0, 2.0, 4.0, 7.0, 14.0]);
        assert_eq!(classes, vec![0.0, 2.0, 4.0, 7.0]);
        assert_eq!(scale_neighbors(&classes, 4.0), (2.0, 7.0));
        assert_eq!(scale_neighbors(&classes, 12.0), (7.0, 14.0));
        assert_eq!(scale_neighbors(&classes, 7.0), (4.0, 12.0));
        let steps = map_scale_steps(&classes, 0.0, &[-2, 0, 2]);
        assert_eq!(steps.get(&2), Some(&4.0));
        assert_eq!(steps.get(&-2), Some(&-5.0));
        assert_eq!(OrnamentGroup::try_from("chromaticgroupc"), Ok(OrnamentGroup::ChromaticGroupC));
        assert!(OrnamentGroup::Off.choices().is_empty());
        assert!(ORNAMENT_PRESETS
            .iter()
            .all(|(_, preset)| !preset.contour.is_empty() && !preset.durations.is_empty()));
        assert!(OrnamentGroup::ALL
            .iter()
            .flat_map(|g| g.choices())
            .all(|c| ornament_preset(c.name).is_some()));
    }

    #[test]
    fn create() -> Result<()> {
        let path = vec![vec![0.0, 2.0, 4.0, 5.0, 7.0]];
        let context = OrnamentContext {
            time: 1.0,
            ps_raw: 4.0,
            dur: 2.0,
            amp: 0.8,
            pan: 0.5,
            octave: 0.0,
            field: 0.0,
            chord: &path[0],
            path: &path,
        };
        let mut ornamenter = Ornamenter::new(1);
        for (_, preset_choice) in [
            ("attack", choice("turn.0,1,0,-1.b", Attack, Path, 0.5)),
            ("release", choice("trill.0,1.b", Release, Chromatic, 0.5)),
            ("anticipate", choice("arc.-1,2,1", OrnamentPosition::Anticipate, Microtone, 0.25)),
        ] {
            let notes = ornamenter.create(&context, &preset_choice, None)?;
            assert!(notes.len() > 1);
            let start = notes.iter().map(|n| n.time).fold(f64::MAX, f64::min);
            assert!(start >= 0.0);
            assert!(notes.iter().all(|n| n.sus > 0.0 && n.pan == 0.5));
        }
        // turn in path steps: base, upper, base, lower
        let notes = ornamenter.create(&context, &choice("turn.0,1,0,-1.b", Attack, Path, 0.5), None)?;
        let pitches = notes.iter().map(|n| n.ps).collect::<Vec<_>>();
        assert_eq!(pitches, vec![4.0, 5.0, 4.0, 2.0, 4.0]);
        assert!(ornamenter
            .create(&context, &choice("nope", Attack, Path, 0.5), None)
            .is_err());
        Ok(())
    }
}

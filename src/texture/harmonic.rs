//! Harmonic textures: simultaneities are assembled from multisets which are chosen
//! independently from the path order.

use crate::{error::Result, parameter::Level};

use super::{DynamicParameter, ModuleKind, Scorer, TextureModule, Transposition};

// -------------------------------------------------------------------------------------------------

/// Render simultaneities until the end of the texture. `choose_set` picks the next path
/// position, `choose_pitches` the chord positions of one simultaneity.
fn assemble<S, P>(scorer: &mut Scorer, mut choose_set: S, mut choose_pitches: P) -> Result<()>
where
    S: FnMut(&mut Scorer, f64) -> Result<usize>,
    P: FnMut(&mut Scorer, usize, usize, f64) -> Result<Vec<usize>>,
{
    let max_offset = scorer.statics().max_time_offset();
    let mut transposition = Transposition::new(scorer.statics(), true);
    let (mut t, t_end) = scorer.time_range();
    while t < t_end {
        let position = choose_set(scorer, t)?;
        let chord = scorer.enter_set(position)?;
        let count = scorer.dynamic_count("countPerMultiset", t)?.max(1);
        transposition.update(scorer, Level::Set, t);
        for _ in 0..count {
            if t > t_end {
                break;
            }
            let mut pitch_count = scorer.dynamic_count("countPerSimultaneity", t)?;
            if pitch_count == 0 || pitch_count > chord.len() {
                pitch_count = chord.len();
            }
            scorer.set_pitch(None);
            transposition.update(scorer, Level::Event, t);
            let beat = scorer.rhythm(t)?;
            if scorer.is_rest(&beat) {
                t += beat.dur;
                continue;
            }
            let amp = scorer.amp(t) * beat.acc;
            let pan = scorer.pan(t);
            for chord_position in choose_pitches(scorer, chord.len(), pitch_count, t)? {
                let ps = chord[chord_position % chord.len()];
                scorer.set_pitch(Some(ps));
                transposition.update(scorer, Level::Voice, t);
                let ps_real = transposition.realize(scorer, ps);
                let aux = scorer.aux(t);
                let mut time = t + scorer.offset_noise() * max_offset;
                if time < 0.0 {
                    time = t;
                }
                let event = scorer.event(time, &beat, amp, ps_real, pan, aux, None);
                scorer.store(event);
            }
            t += beat.dur;
        }
    }
    Ok(())
}

// -------------------------------------------------------------------------------------------------

/// Builds simultaneities from multisets and chord pitches which are selected by dynamic
/// position generators.
#[derive(Debug, Clone, Copy, Default)]
pub struct HarmonicAssembly;

impl TextureModule for HarmonicAssembly {
    fn kind(&self) -> ModuleKind {
        ModuleKind::HarmonicAssembly
    }

    fn static_names(&self) -> &'static [&'static str] {
        &[
            "maxTimeOffset",
            "levelFieldPolyphonic",
            "levelOctavePolyphonic",
        ]
    }

    fn dynamic_parameters(&self) -> &'static [DynamicParameter] {
        const PARAMETERS: &[DynamicParameter] = &[
            DynamicParameter::new("multisetPosition", "bg, oc, (0, 1, 2, 3, 4, 5, 6, 7, 8)"),
            DynamicParameter::new("pitchPosition", "bg, oc, (0, 1, 2, 3, 4, 5, 6, 7, 8)"),
            DynamicParameter::new("countPerMultiset", "c, 2"),
            // zero means all pitches of the multiset
            DynamicParameter::new("countPerSimultaneity", "c, 0"),
        ];
        PARAMETERS
    }

    fn score(&self, scorer: &mut Scorer) -> Result<()> {
        let path_len = scorer.path_len();
        assemble(
            scorer,
            |scorer, t| Ok(scorer.dynamic_count("multisetPosition", t)? % path_len),
            |scorer, _, count, t| {
                (0..count)
                    .map(|_| scorer.dynamic_count("pitchPosition", t))
                    .collect()
            },
        )
    }
}

// -------------------------------------------------------------------------------------------------

/// Builds simultaneities from multisets and chord pitches which are picked by selectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct HarmonicShuffle;

impl TextureModule for HarmonicShuffle {
    fn kind(&self) -> ModuleKind {
        ModuleKind::HarmonicShuffle
    }

    fn static_names(&self) -> &'static [&'static str] {
        &[
            "multisetSelectorControl",
            "pitchSelectorControl",
            "maxTimeOffset",
            "levelFieldPolyphonic",
            "levelOctavePolyphonic",
        ]
    }

    fn dynamic_parameters(&self) -> &'static [DynamicParameter] {
        const PARAMETERS: &[DynamicParameter] = &[
            DynamicParameter::new("countPerMultiset", "c, 2"),
            DynamicParameter::new("countPerSimultaneity", "c, 0"),
        ];
        PARAMETERS
    }

    fn score(&self, scorer: &mut Scorer) -> Result<()> {
        let pitch_selector = scorer.statics().pitch_selector();
        let multiset_selector = scorer.statics().multiset_selector();
        let positions = (0..scorer.path_len()).collect::<Vec<_>>();
        let mut set_selector = scorer.selector(positions, multiset_selector)?;
        assemble(
            scorer,
            |_, _| Ok(set_selector.next()),
            |scorer, len, count, _| {
                // a new selector for each simultaneity
                let mut selector = scorer.selector((0..len).collect(), pitch_selector)?;
                Ok((0..count).map(|_| selector.next()).collect())
            },
        )
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        event::EventField,
        parameter::Arg,
        path::Path,
        texture::{test::texture, ModuleKind, Texture},
    };
    use pretty_assertions::assert_eq;

    fn edit(texture: &mut Texture, edits: &[(&str, &str)]) -> Result<()> {
        for (attribute, arg) in edits {
            texture.edit(attribute, &Arg::parse(arg)?)?;
        }
        Ok(())
    }

    const SECONDS: &[(&str, &str)] = &[
        ("tRange", "0, 6"),
        ("beatT", "c, 60"),
        ("rhythmQ", "pt, (c, 1), (c, 1), (c, 1)"),
        ("textQ", "mto, 0"),
    ];

    #[test]
    fn harmonic_assembly() -> Result<()> {
        let path = Path::from_strings("a", &["c4,e4,g4", "d4,f4,a4"])?;
        let mut texture = texture(ModuleKind::HarmonicAssembly)?;
        edit(&mut texture, SECONDS)?;
        edit(
            &mut texture,
            &[
                ("multisetPosition", "bg, oc, (1, 0)"),
                ("countPerMultiset", "c, 1"),
                ("countPerSimultaneity", "c, 1"),
                ("pitchPosition", "bg, oc, (0, 1, 2)"),
            ],
        )?;
        let events = texture.score(&path, &[])?;
        // alternating multisets, one pitch per simultaneity
        assert_eq!(
            events.get_array(EventField::Ps),
            vec![2.0, 4.0, 9.0, 0.0, 5.0, 7.0]
        );
        assert_eq!(
            events.get_array(EventField::Time),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]
        );

        // zero pitches means the whole multiset
        edit(&mut texture, &[("countPerSimultaneity", "c, 0")])?;
        let events = texture.score(&path, &[])?;
        assert_eq!(events.len(), 18);
        Ok(())
    }

    #[test]
    fn harmonic_shuffle() -> Result<()> {
        let path = Path::from_strings("a", &["c4,e4,g4", "d4,f4,a4"])?;
        let mut texture = texture(ModuleKind::HarmonicShuffle)?;
        edit(&mut texture, SECONDS)?;
        edit(
            &mut texture,
            &[
                ("textQ", "msc, oc"),
                ("textQ", "psc, oc"),
                ("countPerMultiset", "c, 2"),
                ("countPerSimultaneity", "c, 2"),
            ],
        )?;
        let events = texture.score(&path, &[])?;
        assert_eq!(events.len(), 12);
        assert_eq!(
            events.get_array(EventField::Ps)[..8],
            [0.0, 4.0, 0.0, 4.0, 2.0, 5.0, 2.0, 5.0]
        );
        assert!(texture.edit("multisetPosition", &Arg::parse("c, 1")?).is_err());
        Ok(())
    }
}

//! Line textures: single voices which walk through the pitches of each multiset.

use crate::{
    error::Result,
    ornament::{OrnamentContext, Ornamenter},
    parameter::Level,
};

use super::{ModuleKind, Scorer, TextureModule, Transposition};

// -------------------------------------------------------------------------------------------------

/// One voice with one pitch per event, chosen from the current multiset with the pitch
/// selector. Parallel voices optionally double each event with a transposition and delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineGroove;

impl TextureModule for LineGroove {
    fn kind(&self) -> ModuleKind {
        ModuleKind::LineGroove
    }

    fn static_names(&self) -> &'static [&'static str] {
        &[
            "parallelMotionList",
            "pitchSelectorControl",
            "levelFieldMonophonic",
            "levelOctaveMonophonic",
        ]
    }

    fn score(&self, scorer: &mut Scorer) -> Result<()> {
        let (transpositions, delay) = scorer.statics().parallel_motion();
        let selector_kind = scorer.statics().pitch_selector();
        let mut transposition = Transposition::new(scorer.statics(), false);
        let (mut t, _) = scorer.time_range();
        for (position, (_, t_end_set)) in scorer.set_ranges().into_iter().enumerate() {
            let chord = scorer.enter_set(position)?;
            let mut selector = scorer.selector(chord, selector_kind)?;
            transposition.update(scorer, Level::Set, t);
            while t < t_end_set {
                let ps = selector.next();
                scorer.set_pitch(Some(ps));
                transposition.update(scorer, Level::Event, t);
                let ps_real = transposition.realize(scorer, ps);
                let beat = scorer.rhythm(t)?;
                if scorer.is_rest(&beat) {
                    t += beat.dur;
                    continue;
                }
                let amp = scorer.amp(t) * beat.acc;
                let pan = scorer.pan(t);
                let aux = scorer.aux(t);
                for (voice, offset) in transpositions.iter().enumerate() {
                    let time = t + delay * (voice + 1) as f64;
                    let event =
                        scorer.event(time, &beat, amp, ps_real + offset, pan, aux.clone(), None);
                    scorer.store(event);
                }
                let event = scorer.event(t, &beat, amp, ps_real, pan, aux, None);
                scorer.store(event);
                t += beat.dur;
            }
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// A chord on each event: the whole current multiset sounds at once. Parallel voices double
/// every chord member.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineCluster;

impl TextureModule for LineCluster {
    fn kind(&self) -> ModuleKind {
        ModuleKind::LineCluster
    }

    fn static_names(&self) -> &'static [&'static str] {
        &[
            "parallelMotionList",
            "pitchSelectorControl",
            "levelFieldPolyphonic",
            "levelOctavePolyphonic",
        ]
    }

    fn score(&self, scorer: &mut Scorer) -> Result<()> {
        let (transpositions, delay) = scorer.statics().parallel_motion();
        let selector_kind = scorer.statics().pitch_selector();
        let mut transposition = Transposition::new(scorer.statics(), true);
        let (mut t, _) = scorer.time_range();
        for (position, (_, t_end_set)) in scorer.set_ranges().into_iter().enumerate() {
            let chord = scorer.enter_set(position)?;
            let mut selector = scorer.selector(chord.clone(), selector_kind)?;
            transposition.update(scorer, Level::Set, t);
            while t < t_end_set {
                let beat = scorer.rhythm(t)?;
                if scorer.is_rest(&beat) {
                    t += beat.dur;
                    continue;
                }
                // the selected pitch is the chord's reference pitch
                let root = selector.next();
                scorer.set_pitch(Some(root));
                transposition.update(scorer, Level::Event, t);
                let mut voices = Vec::with_capacity(chord.len());
                for ps in &chord {
                    transposition.update(scorer, Level::Voice, t);
                    voices.push((*ps, transposition.realize(scorer, *ps)));
                }
                let amp = scorer.amp(t) * beat.acc;
                let pan = scorer.pan(t);
                for (ps, ps_real) in voices {
                    scorer.set_pitch(Some(ps));
                    let aux = scorer.aux(t);
                    for (voice, offset) in transpositions.iter().enumerate() {
                        let time = t + delay * (voice + 1) as f64;
                        let event = scorer.event(
                            time,
                            &beat,
                            amp,
                            ps_real + offset,
                            pan,
                            aux.clone(),
                            None,
                        );
                        scorer.store(event);
                    }
                    let event = scorer.event(t, &beat, amp, ps_real, pan, aux, None);
                    scorer.store(event);
                }
                t += beat.dur;
            }
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// A single voice which plays the current multiset in order and decorates notes with
/// ornaments from an ornament library.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonophonicOrnament;

impl TextureModule for MonophonicOrnament {
    fn kind(&self) -> ModuleKind {
        ModuleKind::MonophonicOrnament
    }

    fn static_names(&self) -> &'static [&'static str] {
        &[
            "loopWithinSet",
            "ornamentLibrarySelect",
            "ornamentMaxDensity",
            "levelFieldMonophonic",
            "levelOctaveMonophonic",
        ]
    }

    fn score(&self, scorer: &mut Scorer) -> Result<()> {
        let loop_within_set = scorer.statics().loop_within_set();
        let library = scorer.statics().ornament_library();
        let density = scorer.statics().ornament_max_density();
        let mut transposition = Transposition::new(scorer.statics(), false);
        let mut ornamenter = Ornamenter::new(scorer.next_seed());
        let path_pitches = scorer.path_pitches();
        let (path_field, path_octave) = scorer.path_transposition();
        let (mut t, _) = scorer.time_range();
        for (position, (_, t_end_set)) in scorer.set_ranges().into_iter().enumerate() {
            let chord = scorer.enter_set(position)?;
            let mut index = 0;
            let mut played = 0;
            transposition.update(scorer, Level::Set, t);
            while t < t_end_set {
                let ps = chord[index];
                scorer.set_pitch(Some(ps));
                transposition.update(scorer, Level::Event, t);
                let ps_real = transposition.realize(scorer, ps);
                let mut beat = scorer.rhythm(t)?;
                if !loop_within_set && played >= chord.len() {
                    beat.acc = 0.0;
                }
                if scorer.is_rest(&beat) {
                    t += beat.dur;
                    continue;
                }
                index = (index + 1) % chord.len();
                played += 1;
                let amp = scorer.amp(t) * beat.acc;
                let pan = scorer.pan(t);
                let aux = scorer.aux(t);
                let choice = if library.choices().is_empty() || scorer.unit_random() > density {
                    None
                } else {
                    ornamenter.choose(library)
                };
                match choice {
                    Some(choice) => {
                        let context = OrnamentContext {
                            time: t,
                            ps_raw: ps,
                            dur: beat.dur,
                            amp,
                            pan,
                            octave: transposition.octave + path_octave,
                            field: transposition.field + path_field,
                            chord: &chord,
                            path: &path_pitches,
                        };
                        let notes = ornamenter.create(&context, &choice, Some(scorer.temperament()))?;
                        for note in notes {
                            let mut event = scorer.event(
                                note.time,
                                &beat,
                                note.amp,
                                note.ps,
                                note.pan,
                                aux.clone(),
                                Some("orn"),
                            );
                            event.sus = note.sus;
                            scorer.store(event);
                        }
                    }
                    None => {
                        let event = scorer.event(t, &beat, amp, ps_real, pan, aux, None);
                        scorer.store(event);
                    }
                }
                t += beat.dur;
            }
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        event::EventField,
        orchestra::OrchestraKind,
        parameter::Arg,
        path::Path,
        texture::{ModuleKind, Texture},
    };
    use pretty_assertions::assert_eq;

    fn texture(module: ModuleKind, edits: &[(&str, &str)]) -> Result<Texture> {
        let mut texture = Texture::new("t1", module, "a", OrchestraKind::GeneralMidi, 0, 7)?;
        for (attribute, arg) in edits {
            texture.edit(attribute, &Arg::parse(arg)?)?;
        }
        Ok(texture)
    }

    const QUARTERS: &[(&str, &str)] = &[
        ("tRange", "0, 5"),
        ("beatT", "c, 60"),
        ("rhythmQ", "pt, (c, 4), (c, 1), (c, 1)"),
        ("ampQ", "c, .9"),
        ("textQ", "psc, oc"),
    ];

    #[test]
    fn line_groove() -> Result<()> {
        let path = Path::from_strings("a", &["3-4"])?;
        let events = texture(ModuleKind::LineGroove, QUARTERS)?.score(&path, &[])?;
        assert_eq!(events.len(), 20);
        let times = events.get_array(EventField::Time);
        let expected = (0..20).map(|i| i as f64 * 0.25).collect::<Vec<_>>();
        assert_eq!(times, expected);
        assert!(events.iter().all(|e| e.sus == 0.25 && e.amp == 0.9 && e.pan == 0.5));
        let pitches = events.get_array(EventField::Ps);
        assert_eq!(pitches[..6], [0.0, 1.0, 5.0, 0.0, 1.0, 5.0]);
        Ok(())
    }

    #[test]
    fn silence_mode() -> Result<()> {
        let path = Path::from_strings("a", &["3-4"])?;
        let mut edits = QUARTERS.to_vec();
        edits.push(("rhythmQ", "pt, (c, 4), (c, 1), (bg, oc, (1, 0, 1, 0))"));
        let mut texture = texture(ModuleKind::LineGroove, &edits)?;
        let events = texture.score(&path, &[])?;
        assert_eq!(events.len(), 10);
        assert!(events.iter().all(|e| e.acc == 1.0));

        texture.edit("silenceMode", &Arg::parse("on")?)?;
        let events = texture.score(&path, &[])?;
        assert_eq!(events.len(), 20);
        let rests = events.iter().filter(|e| e.is_rest()).count();
        assert_eq!(rests, 10);
        assert!(events.iter().skip(1).step_by(2).all(|e| e.amp == 0.0));
        Ok(())
    }

    #[test]
    fn parallel_motion() -> Result<()> {
        let path = Path::from_strings("a", &["3-4"])?;
        let mut edits = QUARTERS.to_vec();
        edits.push(("textQ", "pml, (12, 7), .01"));
        let events = texture(ModuleKind::LineGroove, &edits)?.score(&path, &[])?;
        assert_eq!(events.len(), 60);
        let first = &events.events()[..3];
        assert_eq!(
            first.iter().map(|e| (e.time, e.ps)).collect::<Vec<_>>(),
            vec![(0.0, 0.0), (0.01, 12.0), (0.02, 7.0)]
        );
        Ok(())
    }

    #[test]
    fn line_cluster() -> Result<()> {
        let path = Path::from_strings("a", &["3-4", "4-z15"])?;
        let events = texture(ModuleKind::LineCluster, QUARTERS)?.score(&path, &[])?;
        // default duration fractions split the range equally: 10 chords per set
        assert_eq!(events.len(), 10 * 3 + 10 * 4);
        assert!(events.iter().take(3).all(|e| e.time == 0.0));
        Ok(())
    }

    #[test]
    fn monophonic_ornament() -> Result<()> {
        let path = Path::from_strings("a", &["c4,e4,g4"])?;
        let mut edits = QUARTERS.to_vec();
        edits.push(("rhythmQ", "pt, (c, 1), (c, 1), (c, 1)"));
        edits.push(("textQ", "ols, off"));
        edits.push(("textQ", "lws, off"));
        let mut plain = texture(ModuleKind::MonophonicOrnament, &edits)?;
        let events = plain.score(&path, &[])?;
        // without looping, each pitch sounds once
        assert_eq!(events.get_array(EventField::Ps), vec![0.0, 4.0, 7.0]);

        edits.push(("textQ", "ols, chromaticGroupC"));
        edits.push(("textQ", "omd, 1"));
        let mut ornamented = texture(ModuleKind::MonophonicOrnament, &edits)?;
        let events = ornamented.score(&path, &[])?;
        assert!(events.len() >= 3);
        assert!(events
            .iter()
            .all(|e| e.comment.last().map(String::as_str) == Some("orn")));
        Ok(())
    }
}

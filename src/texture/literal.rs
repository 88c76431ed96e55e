//! Literal textures: multisets are played exactly as written, either horizontally as a melody
//! or vertically as chords.

use crate::{error::Result, parameter::Level};

use super::{ModuleKind, Scorer, TextureModule, Transposition};

// -------------------------------------------------------------------------------------------------

/// Plays the pitches of each multiset in their written order. When looping within sets is
/// off, the remaining time of a set is silent once all pitches have been played.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralHorizontal;

impl TextureModule for LiteralHorizontal {
    fn kind(&self) -> ModuleKind {
        ModuleKind::LiteralHorizontal
    }

    fn static_names(&self) -> &'static [&'static str] {
        &[
            "loopWithinSet",
            "levelFieldMonophonic",
            "levelOctaveMonophonic",
        ]
    }

    fn score(&self, scorer: &mut Scorer) -> Result<()> {
        let loop_within_set = scorer.statics().loop_within_set();
        let mut transposition = Transposition::new(scorer.statics(), false);
        let (mut t, _) = scorer.time_range();
        for (position, (_, t_end_set)) in scorer.set_ranges().into_iter().enumerate() {
            let chord = scorer.enter_set(position)?;
            transposition.update(scorer, Level::Set, t);
            let mut index = 0;
            while t < t_end_set {
                let mut beat = scorer.rhythm(t)?;
                let exhausted = index >= chord.len() && !loop_within_set;
                if exhausted {
                    beat.acc = 0.0;
                }
                if scorer.is_rest(&beat) {
                    t += beat.dur;
                    continue;
                }
                let ps = chord[index % chord.len()];
                if !exhausted {
                    index += 1;
                }
                scorer.set_pitch(Some(ps));
                transposition.update(scorer, Level::Event, t);
                let ps_real = transposition.realize(scorer, ps);
                let amp = scorer.amp(t) * beat.acc;
                let pan = scorer.pan(t);
                let aux = scorer.aux(t);
                let event = scorer.event(t, &beat, amp, ps_real, pan, aux, None);
                scorer.store(event);
                t += beat.dur;
            }
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// Plays each multiset as a chord on every beat. Chord members are slightly displaced in
/// time by up to the maximum time offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralVertical;

impl TextureModule for LiteralVertical {
    fn kind(&self) -> ModuleKind {
        ModuleKind::LiteralVertical
    }

    fn static_names(&self) -> &'static [&'static str] {
        &[
            "maxTimeOffset",
            "levelFieldPolyphonic",
            "levelOctavePolyphonic",
        ]
    }

    fn score(&self, scorer: &mut Scorer) -> Result<()> {
        let max_offset = scorer.statics().max_time_offset();
        let mut transposition = Transposition::new(scorer.statics(), true);
        let (mut t, _) = scorer.time_range();
        for (position, (t_start_set, t_end_set)) in scorer.set_ranges().into_iter().enumerate() {
            let chord = scorer.enter_set(position)?;
            transposition.update(scorer, Level::Set, t);
            while t < t_end_set {
                let beat = scorer.rhythm(t)?;
                if scorer.is_rest(&beat) {
                    t += beat.dur;
                    continue;
                }
                transposition.update(scorer, Level::Event, t);
                let amp = scorer.amp(t) * beat.acc;
                let pan = scorer.pan(t);
                for ps in &chord {
                    scorer.set_pitch(Some(*ps));
                    transposition.update(scorer, Level::Voice, t);
                    let ps_real = transposition.realize(scorer, *ps);
                    let aux = scorer.aux(t);
                    let mut time = t + scorer.offset_noise() * max_offset;
                    if time < t_start_set {
                        time = t_start_set;
                    }
                    let event = scorer.event(time, &beat, amp, ps_real, pan, aux, None);
                    scorer.store(event);
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
        parameter::Arg,
        path::Path,
        texture::{test::texture, ModuleKind},
    };
    use pretty_assertions::assert_eq;

    fn edit(texture: &mut crate::texture::Texture, edits: &[(&str, &str)]) -> Result<()> {
        for (attribute, arg) in edits {
            texture.edit(attribute, &Arg::parse(arg)?)?;
        }
        Ok(())
    }

    #[test]
    fn literal_horizontal() -> Result<()> {
        let path = Path::from_strings("a", &["c4,e4,g4", "d4,f4"])?;
        let mut texture = texture(ModuleKind::LiteralHorizontal)?;
        edit(
            &mut texture,
            &[
                ("tRange", "0, 8"),
                ("beatT", "c, 60"),
                ("rhythmQ", "pt, (c, 1), (c, 1), (c, 1)"),
            ],
        )?;
        let events = texture.score(&path, &[])?;
        assert_eq!(
            events.get_array(EventField::Ps),
            vec![0.0, 4.0, 7.0, 0.0, 2.0, 5.0, 2.0, 5.0]
        );

        edit(&mut texture, &[("textQ", "lws, off")])?;
        let events = texture.score(&path, &[])?;
        assert_eq!(events.get_array(EventField::Ps), vec![0.0, 4.0, 7.0, 2.0, 5.0]);
        assert_eq!(
            events.get_array(EventField::Time),
            vec![0.0, 1.0, 2.0, 4.0, 5.0]
        );
        Ok(())
    }

    #[test]
    fn literal_vertical() -> Result<()> {
        let path = Path::from_strings("a", &["c4,e4,g4"])?;
        let mut texture = texture(ModuleKind::LiteralVertical)?;
        edit(
            &mut texture,
            &[
                ("tRange", "0, 4"),
                ("beatT", "c, 60"),
                ("rhythmQ", "pt, (c, 1), (c, 1), (c, 1)"),
                ("textQ", "mto, 0"),
            ],
        )?;
        let events = texture.score(&path, &[])?;
        assert_eq!(events.len(), 12);
        assert_eq!(
            events.iter().take(3).map(|e| e.time).collect::<Vec<_>>(),
            vec![0.0, 0.0, 0.0]
        );

        edit(&mut texture, &[("textQ", "mto, .1")])?;
        let events = texture.score(&path, &[])?;
        assert!(events.iter().all(|e| e.time >= 0.0));
        assert!(events.iter().any(|e| e.time.fract() != 0.0));
        Ok(())
    }
}

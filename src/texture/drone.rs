//! Drone textures: all pitches of a multiset sound together for the duration of a set.

use crate::{error::Result, parameter::Level};

use super::{Beat, ModuleKind, Scorer, TextureModule, Transposition};

// -------------------------------------------------------------------------------------------------

/// Every pitch of a multiset gets its own articulated voice with an independent clock.
///
/// Voices are rendered one after another, while parameter objects are evaluated with a
/// cumulative clock which keeps running across voices. Each event is displaced by a random
/// time offset of up to the maximum time offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct DroneArticulate;

impl TextureModule for DroneArticulate {
    fn kind(&self) -> ModuleKind {
        ModuleKind::DroneArticulate
    }

    fn static_names(&self) -> &'static [&'static str] {
        &[
            "maxTimeOffset",
            "levelFieldMonophonic",
            "levelOctaveMonophonic",
        ]
    }

    fn score(&self, scorer: &mut Scorer) -> Result<()> {
        let max_offset = scorer.statics().max_time_offset();
        let mut transposition = Transposition::new(scorer.statics(), false);
        let (mut t, _) = scorer.time_range();
        let mut t_cumulative = t;
        for (position, (_, t_end_set)) in scorer.set_ranges().into_iter().enumerate() {
            let chord = scorer.enter_set(position)?;
            let t_start_set = t;
            transposition.update(scorer, Level::Set, t);
            let mut t_max_voice = t_start_set;
            for ps in chord {
                let mut t_voice = t_start_set;
                scorer.set_pitch(Some(ps));
                while t_voice < t_end_set {
                    let beat = scorer.rhythm(t_cumulative)?;
                    if scorer.is_rest(&beat) {
                        t_voice += beat.dur;
                        t_cumulative += beat.dur;
                        continue;
                    }
                    transposition.update(scorer, Level::Event, t_cumulative);
                    let ps_real = transposition.realize(scorer, ps);
                    let amp = scorer.amp(t_cumulative) * beat.acc;
                    let pan = scorer.pan(t_cumulative);
                    let aux = scorer.aux(t_cumulative);
                    let mut time = t_voice + scorer.offset_noise() * max_offset;
                    if time < 0.0 {
                        time = t_start_set;
                    }
                    let event = scorer.event(time, &beat, amp, ps_real, pan, aux, None);
                    scorer.store(event);
                    t_voice += beat.dur;
                    t_cumulative += beat.dur;
                }
                t_max_voice = t_max_voice.max(t_voice);
            }
            t = t_max_voice;
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// Every multiset sounds as one sustained chord which fills the whole time range of its set.
/// The rhythm parameter is not used.
#[derive(Debug, Clone, Copy, Default)]
pub struct DroneSustain;

impl TextureModule for DroneSustain {
    fn kind(&self) -> ModuleKind {
        ModuleKind::DroneSustain
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
        for (position, (_, t_end_set)) in scorer.set_ranges().into_iter().enumerate() {
            let chord = scorer.enter_set(position)?;
            transposition.update(scorer, Level::Set, t);
            if t >= t_end_set {
                continue;
            }
            let beat = Beat::sustained(scorer.bpm(), t_end_set - t);
            transposition.update(scorer, Level::Event, t);
            let amp = scorer.amp(t) * beat.acc;
            let pan = scorer.pan(t);
            for ps in chord {
                transposition.update(scorer, Level::Voice, t);
                scorer.set_pitch(Some(ps));
                let ps_real = transposition.realize(scorer, ps);
                let aux = scorer.aux(t);
                let time = t + scorer.offset_noise().abs() * max_offset;
                let event = scorer.event(time, &beat, amp, ps_real, pan, aux, None);
                scorer.store(event);
            }
            t += beat.dur;
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

    #[test]
    fn drone_sustain() -> Result<()> {
        let path = Path::from_strings("a", &["c4,e4,g4", "d4,f4"])?;
        let mut texture = texture(ModuleKind::DroneSustain)?;
        texture.edit("tRange", &Arg::parse("0, 10")?)?;
        texture.edit("textQ", &Arg::parse("mto, 0")?)?;
        let events = texture.score(&path, &[])?;
        assert_eq!(events.len(), 5);
        assert_eq!(
            events.get_array(EventField::Time),
            vec![0.0, 0.0, 0.0, 5.0, 5.0]
        );
        assert!(events.iter().all(|e| e.dur == 5.0 && e.sus == 5.0 && e.acc == 1.0));
        assert_eq!(events.get_array(EventField::Ps), vec![0.0, 4.0, 7.0, 2.0, 5.0]);
        Ok(())
    }

    #[test]
    fn drone_articulate() -> Result<()> {
        let path = Path::from_strings("a", &["c4,e4"])?;
        let mut texture = texture(ModuleKind::DroneArticulate)?;
        for (attribute, arg) in [
            ("tRange", "0, 4"),
            ("beatT", "c, 60"),
            ("rhythmQ", "pt, (c, 1), (c, 1), (c, 1)"),
            ("textQ", "mto, 0"),
        ] {
            texture.edit(attribute, &Arg::parse(arg)?)?;
        }
        let events = texture.score(&path, &[])?;
        // one independent voice per pitch, each running through the whole set
        assert_eq!(events.len(), 8);
        let voice = |ps: f64| {
            events
                .iter()
                .filter(|e| e.ps == ps)
                .map(|e| e.time)
                .collect::<Vec<_>>()
        };
        assert_eq!(voice(0.0), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(voice(4.0), vec![0.0, 1.0, 2.0, 3.0]);
        Ok(())
    }
}

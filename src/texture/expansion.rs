//! Interval expansion: a line whose intervals, measured from the lowest pitch of the current
//! multiset, get stretched or compressed by a dynamic scale factor.

use crate::{error::Result, parameter::Level};

use super::{DynamicParameter, ModuleKind, Scorer, TextureModule, Transposition};

// -------------------------------------------------------------------------------------------------

/// A single voice which selects pitches like a groove line, then scales each pitch's distance
/// to the multiset's root. A scale of 1 keeps the multiset as is, 2 doubles all intervals.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalExpansion;

impl TextureModule for IntervalExpansion {
    fn kind(&self) -> ModuleKind {
        ModuleKind::IntervalExpansion
    }

    fn static_names(&self) -> &'static [&'static str] {
        &[
            "pitchSelectorControl",
            "levelFieldMonophonic",
            "levelOctaveMonophonic",
        ]
    }

    fn dynamic_parameters(&self) -> &'static [DynamicParameter] {
        const PARAMETERS: &[DynamicParameter] =
            &[DynamicParameter::new("intervalScale", "ws, e, 12, 0, 1, 3")];
        PARAMETERS
    }

    fn score(&self, scorer: &mut Scorer) -> Result<()> {
        let selector_kind = scorer.statics().pitch_selector();
        let mut transposition = Transposition::new(scorer.statics(), false);
        let (mut t, _) = scorer.time_range();
        for (position, (_, t_end_set)) in scorer.set_ranges().into_iter().enumerate() {
            let chord = scorer.enter_set(position)?;
            let root = chord.iter().copied().fold(f64::INFINITY, f64::min);
            let mut selector = scorer.selector(chord, selector_kind)?;
            transposition.update(scorer, Level::Set, t);
            while t < t_end_set {
                let ps = selector.next();
                let beat = scorer.rhythm(t)?;
                if scorer.is_rest(&beat) {
                    t += beat.dur;
                    continue;
                }
                let scale = scorer.dynamic("intervalScale", t)?;
                let ps_expanded = root + (ps - root) * scale;
                scorer.set_pitch(Some(ps_expanded));
                transposition.update(scorer, Level::Event, t);
                let ps_real = transposition.realize(scorer, ps_expanded);
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
    fn interval_expansion() -> Result<()> {
        let path = Path::from_strings("a", &["d4,e4,g4"])?;
        let mut texture = texture(ModuleKind::IntervalExpansion)?;
        for (attribute, arg) in [
            ("tRange", "0, 6"),
            ("beatT", "c, 60"),
            ("rhythmQ", "pt, (c, 1), (c, 1), (c, 1)"),
            ("textQ", "psc, oc"),
            ("intervalScale", "bg, oc, (1, 2)"),
        ] {
            texture.edit(attribute, &Arg::parse(arg)?)?;
        }
        let events = texture.score(&path, &[])?;
        assert_eq!(
            events.get_array(EventField::Ps),
            vec![2.0, 6.0, 7.0, 2.0, 4.0, 12.0]
        );
        Ok(())
    }
}

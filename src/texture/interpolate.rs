//! Interpolation textures: anchor events are created first, then the time between anchors is
//! filled with a grid of frames whose values are interpolated between the anchors.

use crate::{
    error::{Error, Result},
    event::{EventField, Frame},
    parameter::Level,
};

use super::{
    fill::{fill_events, fill_placements},
    DynamicParameter, LineGroove, ModuleKind, Scorer, TextureModule,
};

// -------------------------------------------------------------------------------------------------

/// Tolerance for frames which would land on the following anchor.
const FRAME_EPSILON: f64 = 1e-9;

fn frame_duration(scorer: &mut Scorer, t: f64) -> Result<f64> {
    let dur = scorer.dynamic("frameDuration", t)?;
    if !dur.is_finite() || dur <= 0.0 {
        return Err(Error::Texture(format!(
            "frame duration must be positive, got {dur} at {t:.3}s"
        )));
    }
    Ok(dur)
}

/// Build the frame grid for the given anchor times and durations.
///
/// Each anchor gets an event frame. Frames in between follow the frame duration generator,
/// which gets evaluated per anchor or per frame. With snapped event times the grid restarts at
/// every anchor, else a single grid runs through the whole texture.
fn frame_grid(scorer: &mut Scorer, anchors: &[(f64, f64)]) -> Result<Vec<Frame>> {
    let interpolation = scorer.statics().interpolation();
    let per_frame = scorer.statics().level("levelFrameDuration") == Level::Frame;
    let snap_event_time = scorer.statics().switch("snapEventTime");
    let mut times = Vec::new();
    let mut grid = anchors.first().map_or(0.0, |(t, _)| *t);
    for (i, (t, _)) in anchors.iter().enumerate() {
        times.push((*t, true));
        let Some((next, _)) = anchors.get(i + 1) else {
            break;
        };
        let mut dur = frame_duration(scorer, *t)?;
        if snap_event_time {
            grid = t + dur;
        } else {
            while grid <= t + FRAME_EPSILON {
                grid += dur;
            }
        }
        while grid < next - FRAME_EPSILON {
            times.push((grid, false));
            if per_frame {
                dur = frame_duration(scorer, grid)?;
            }
            grid += dur;
        }
    }
    let last_dur = anchors.last().map_or(0.0, |(_, dur)| *dur);
    Ok(times
        .iter()
        .enumerate()
        .map(|(i, (time, is_event))| {
            let dur = times.get(i + 1).map_or(last_dur, |(next, _)| next - time);
            if *is_event {
                Frame::event(*time, dur, interpolation)
            } else {
                Frame::between(*time, dur)
            }
        })
        .collect())
}

/// Interpolate all events which have been created so far.
fn interpolate_anchors(scorer: &mut Scorer) -> Result<()> {
    let anchors = scorer
        .sorted_events()
        .iter()
        .map(|e| (e.time, e.dur))
        .collect::<Vec<_>>();
    if anchors.is_empty() {
        return Ok(());
    }
    let frames = frame_grid(scorer, &anchors)?;
    let snap_sus = scorer.statics().switch("snapSustainTime");
    if scorer.statics().switch("parameterInterpolationControl") {
        scorer.interpolate(&frames, snap_sus, &EventField::INTERPOLATED, true)
    } else {
        scorer.interpolate(&frames, snap_sus, &[], false)
    }
}

// -------------------------------------------------------------------------------------------------

/// A groove line whose events are anchors of an interpolated frame grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpolateLine;

impl TextureModule for InterpolateLine {
    fn kind(&self) -> ModuleKind {
        ModuleKind::InterpolateLine
    }

    fn static_names(&self) -> &'static [&'static str] {
        &[
            "interpolationMethodControl",
            "levelFrameDuration",
            "parameterInterpolationControl",
            "snapSustainTime",
            "snapEventTime",
            "pitchSelectorControl",
            "levelFieldMonophonic",
            "levelOctaveMonophonic",
        ]
    }

    fn dynamic_parameters(&self) -> &'static [DynamicParameter] {
        const PARAMETERS: &[DynamicParameter] =
            &[DynamicParameter::new("frameDuration", "c, .25")];
        PARAMETERS
    }

    fn score(&self, scorer: &mut Scorer) -> Result<()> {
        // without a parallel motion static the groove has a single voice
        LineGroove.score(scorer)?;
        interpolate_anchors(scorer)
    }
}

// -------------------------------------------------------------------------------------------------

/// A time fill whose events are anchors of an interpolated frame grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpolateFill;

impl TextureModule for InterpolateFill {
    fn kind(&self) -> ModuleKind {
        ModuleKind::InterpolateFill
    }

    fn static_names(&self) -> &'static [&'static str] {
        &[
            "totalEventCount",
            "levelEventPartition",
            "eventDensityPartition",
            "interpolationMethodControl",
            "levelFrameDuration",
            "parameterInterpolationControl",
            "snapSustainTime",
            "snapEventTime",
            "pitchSelectorControl",
            "levelFieldMonophonic",
            "levelOctaveMonophonic",
        ]
    }

    fn dynamic_parameters(&self) -> &'static [DynamicParameter] {
        const PARAMETERS: &[DynamicParameter] = &[
            DynamicParameter::new("fillGenerator", "ru, 0, 1"),
            DynamicParameter::new("frameDuration", "c, .25"),
        ];
        PARAMETERS
    }

    fn score(&self, scorer: &mut Scorer) -> Result<()> {
        let placements = fill_placements(scorer)?;
        fill_events(scorer, placements)?;
        interpolate_anchors(scorer)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
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

    fn round(values: Vec<f64>) -> Vec<f64> {
        values.iter().map(|v| (v * 1e6).round() / 1e6).collect()
    }

    fn interpolate_line() -> Result<Texture> {
        let mut texture = texture(ModuleKind::InterpolateLine)?;
        edit(
            &mut texture,
            &[
                ("tRange", "0, 8"),
                ("beatT", "c, 60"),
                ("rhythmQ", "pt, (c, 1), (c, 4), (c, 1)"),
                ("ampQ", "bg, oc, (.2, 1)"),
                ("frameDuration", "c, .5"),
            ],
        )?;
        Ok(texture)
    }

    #[test]
    fn linear_frames() -> Result<()> {
        let path = Path::from_strings("a", &["c4"])?;
        let events = interpolate_line()?.score(&path, &[])?;
        assert_eq!(events.len(), 9);
        assert_eq!(
            round(events.get_array(EventField::Time)),
            vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0]
        );
        assert_eq!(
            round(events.get_array(EventField::Amp)),
            vec![0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]
        );
        // snapped sustains end at the following frame
        assert_eq!(events.get(0).map(|e| e.sus), Some(0.5));
        Ok(())
    }

    #[test]
    fn frame_options() -> Result<()> {
        let path = Path::from_strings("a", &["c4"])?;
        let mut texture = interpolate_line()?;
        edit(&mut texture, &[("textQ", "pic, off")])?;
        let events = texture.score(&path, &[])?;
        assert_eq!(events.len(), 9);
        // values are held without interpolation
        assert_eq!(
            round(events.get_array(EventField::Amp)),
            vec![0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 1.0]
        );

        edit(&mut texture, &[("frameDuration", "c, 3")])?;
        let events = texture.score(&path, &[])?;
        assert_eq!(events.get_array(EventField::Time), vec![0.0, 3.0, 4.0]);

        edit(&mut texture, &[("frameDuration", "c, 0")])?;
        assert!(texture.score(&path, &[]).is_err());
        Ok(())
    }

    #[test]
    fn interpolate_fill() -> Result<()> {
        let path = Path::from_strings("a", &["c4,e4"])?;
        let mut texture = texture(ModuleKind::InterpolateFill)?;
        edit(
            &mut texture,
            &[
                ("tRange", "0, 4"),
                ("rhythmQ", "pt, (c, 4), (c, 1), (c, 1)"),
                ("textQ", "tec, 2"),
                ("fillGenerator", "bg, oc, (0, .5)"),
                ("frameDuration", "c, .5"),
            ],
        )?;
        let events = texture.score(&path, &[])?;
        assert_eq!(
            round(events.get_array(EventField::Time)),
            vec![0.0, 0.5, 1.0, 1.5, 2.0]
        );
        Ok(())
    }
}

//! Fill textures: a fixed number of events is distributed over time by a generator instead of
//! following the rhythm's durations.

use crate::{
    error::Result,
    parameter::{Level, TextureStatics},
    unit,
};

use super::{DynamicParameter, ModuleKind, Scorer, TextureModule, Transposition};

// -------------------------------------------------------------------------------------------------

/// Distribute `total` events proportionally to the given weights. Counts are rounded per part
/// and never exceed `total` in sum, so the result may contain fewer events than requested.
pub(super) fn partition_counts(total: usize, weights: &[f64]) -> Vec<usize> {
    let sum = weights.iter().sum::<f64>();
    if weights.is_empty() || sum <= 0.0 {
        return vec![0; weights.len()];
    }
    let mut counts = weights
        .iter()
        .map(|w| (total as f64 * w / sum).round() as usize)
        .collect::<Vec<_>>();
    while counts.iter().sum::<usize>() > total {
        let (largest, _) = counts
            .iter()
            .enumerate()
            .max_by_key(|(i, count)| (**count, std::cmp::Reverse(*i)))
            .unwrap_or((0, &0));
        counts[largest] -= 1;
    }
    counts
}

/// Weights of the path's set ranges for the event density partition.
fn density_weights(statics: &TextureStatics, ranges: &[(f64, f64)]) -> Vec<f64> {
    match statics.level("eventDensityPartition") {
        Level::Duration => ranges.iter().map(|(start, end)| end - start).collect(),
        _ => vec![1.0; ranges.len()],
    }
}

/// Index of the set range which contains the given time. Times at or past the end belong to
/// the last set.
fn set_position(ranges: &[(f64, f64)], t: f64) -> usize {
    ranges
        .iter()
        .position(|(start, end)| t >= *start && t < *end)
        .unwrap_or(ranges.len().saturating_sub(1))
}

/// Place `count` events within a time span: the fill generator is evaluated at evenly spaced
/// nominal times and its unit interval values are mapped into the span.
fn fill_span(scorer: &mut Scorer, count: usize, start: f64, end: f64) -> Result<Vec<f64>> {
    let width = end - start;
    (0..count)
        .map(|i| {
            let nominal = start + width * i as f64 / count as f64;
            let value = scorer.dynamic("fillGenerator", nominal)?;
            Ok(unit::denorm(value, start, end))
        })
        .collect()
}

/// Event placements of a time fill texture: path positions with start times, sorted by time.
pub(super) fn fill_placements(scorer: &mut Scorer) -> Result<Vec<(usize, f64)>> {
    let total = scorer.statics().total_event_count();
    let ranges = scorer.set_ranges();
    let mut placements = Vec::with_capacity(total);
    if scorer.statics().level("levelEventPartition") == Level::Set {
        let weights = density_weights(scorer.statics(), &ranges);
        let counts = partition_counts(total, &weights);
        for (position, (&(start, end), count)) in ranges.iter().zip(counts).enumerate() {
            for t in fill_span(scorer, count, start, end)? {
                placements.push((position, t));
            }
        }
    } else {
        let (start, end) = scorer.time_range();
        for t in fill_span(scorer, total, start, end)? {
            placements.push((set_position(&ranges, t), t));
        }
    }
    placements.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(placements)
}

/// Create one event per placement. Rhythms only provide durations and accents here.
pub(super) fn fill_events(scorer: &mut Scorer, placements: Vec<(usize, f64)>) -> Result<()> {
    let selector_kind = scorer.statics().pitch_selector();
    let mut transposition = Transposition::new(scorer.statics(), false);
    let mut current = None;
    for (position, t) in placements {
        if !matches!(current, Some((p, _)) if p == position) {
            let chord = scorer.enter_set(position)?;
            let selector = scorer.selector(chord, selector_kind)?;
            transposition.update(scorer, Level::Set, t);
            current = Some((position, selector));
        }
        let Some((_, selector)) = current.as_mut() else {
            continue;
        };
        let ps = selector.next();
        let beat = scorer.rhythm(t)?;
        if scorer.is_rest(&beat) {
            continue;
        }
        scorer.set_pitch(Some(ps));
        transposition.update(scorer, Level::Event, t);
        let ps_real = transposition.realize(scorer, ps);
        let amp = scorer.amp(t) * beat.acc;
        let pan = scorer.pan(t);
        let aux = scorer.aux(t);
        let event = scorer.event(t, &beat, amp, ps_real, pan, aux, None);
        scorer.store(event);
    }
    Ok(())
}

// -------------------------------------------------------------------------------------------------

/// Fills the texture's time range with a total number of events. Start times come from the
/// fill generator, mapped into the time range of the whole path or of each set.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeFill;

impl TextureModule for TimeFill {
    fn kind(&self) -> ModuleKind {
        ModuleKind::TimeFill
    }

    fn static_names(&self) -> &'static [&'static str] {
        &[
            "totalEventCount",
            "levelEventPartition",
            "eventDensityPartition",
            "pitchSelectorControl",
            "levelFieldMonophonic",
            "levelOctaveMonophonic",
        ]
    }

    fn dynamic_parameters(&self) -> &'static [DynamicParameter] {
        const PARAMETERS: &[DynamicParameter] =
            &[DynamicParameter::new("fillGenerator", "ru, 0, 1")];
        PARAMETERS
    }

    fn score(&self, scorer: &mut Scorer) -> Result<()> {
        let placements = fill_placements(scorer)?;
        fill_events(scorer, placements)
    }
}

// -------------------------------------------------------------------------------------------------

/// Divides time into segments of generated widths and fills each segment with an equal share
/// of the total event count.
///
/// Segments span the whole texture, or each set when event counts are updated per set. The
/// per set share of events then follows the event density partition.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeSegment;

impl TimeSegment {
    fn segment_placements(
        scorer: &mut Scorer,
        count: usize,
        start: f64,
        end: f64,
    ) -> Result<Vec<f64>> {
        let segment_count = scorer.statics().total_segment_count().max(1);
        let span = end - start;
        let mut widths = Vec::with_capacity(segment_count);
        for i in 0..segment_count {
            let nominal = start + span * i as f64 / segment_count as f64;
            widths.push(scorer.dynamic("segmentWidth", nominal)?.abs());
        }
        let widths_sum = widths.iter().sum::<f64>();
        if widths_sum <= 0.0 {
            widths = vec![1.0; segment_count];
        }
        let widths_sum = widths.iter().sum::<f64>();
        let mut times = Vec::with_capacity(count);
        let mut segment_start = start;
        for (i, width) in widths.iter().enumerate() {
            let segment_end = if i == segment_count - 1 {
                end
            } else {
                segment_start + span * width / widths_sum
            };
            let share = count / segment_count + usize::from(i < count % segment_count);
            times.extend(fill_span(scorer, share, segment_start, segment_end)?);
            segment_start = segment_end;
        }
        Ok(times)
    }
}

impl TextureModule for TimeSegment {
    fn kind(&self) -> ModuleKind {
        ModuleKind::TimeSegment
    }

    fn static_names(&self) -> &'static [&'static str] {
        &[
            "totalEventCount",
            "totalSegmentCount",
            "levelEventCount",
            "eventDensityPartition",
            "pitchSelectorControl",
            "levelFieldMonophonic",
            "levelOctaveMonophonic",
        ]
    }

    fn dynamic_parameters(&self) -> &'static [DynamicParameter] {
        const PARAMETERS: &[DynamicParameter] = &[
            DynamicParameter::new("segmentWidth", "ru, .5, 1"),
            DynamicParameter::new("fillGenerator", "ru, 0, 1"),
        ];
        PARAMETERS
    }

    fn score(&self, scorer: &mut Scorer) -> Result<()> {
        let total = scorer.statics().total_event_count();
        let ranges = scorer.set_ranges();
        let mut placements = Vec::with_capacity(total);
        if scorer.statics().level("levelEventCount") == Level::Texture {
            let (start, end) = scorer.time_range();
            for t in Self::segment_placements(scorer, total, start, end)? {
                placements.push((set_position(&ranges, t), t));
            }
        } else {
            let weights = density_weights(scorer.statics(), &ranges);
            let counts = partition_counts(total, &weights);
            for (position, (&(start, end), count)) in ranges.iter().zip(counts).enumerate() {
                for t in Self::segment_placements(scorer, count, start, end)? {
                    placements.push((position, t));
                }
            }
        }
        placements.sort_by(|a, b| a.1.total_cmp(&b.1));
        fill_events(scorer, placements)
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

    #[test]
    fn partitions() {
        assert_eq!(partition_counts(20, &[1.0, 1.0]), vec![10, 10]);
        assert_eq!(partition_counts(10, &[1.0, 1.0, 1.0]), vec![3, 3, 3]);
        // rounding up would exceed the total
        assert_eq!(partition_counts(3, &[1.0, 1.0]), vec![1, 2]);
        assert_eq!(partition_counts(5, &[3.0, 1.0]), vec![4, 1]);
        assert_eq!(partition_counts(5, &[0.0, 0.0]), vec![0, 0]);
        assert!(partition_counts(5, &[]).is_empty());
    }

    #[test]
    fn time_fill() -> Result<()> {
        let path = Path::from_strings("a", &["c4,e4,g4", "d4,f4"])?;
        let mut texture = texture(ModuleKind::TimeFill)?;
        edit(
            &mut texture,
            &[("tRange", "0, 10"), ("textQ", "tec, 12"), ("textQ", "lep, set")],
        )?;
        let events = texture.score(&path, &[])?;
        assert_eq!(events.len(), 12);
        for event in events.iter() {
            let first_set = [0.0, 4.0, 7.0].contains(&event.ps);
            assert_eq!(first_set, event.time < 5.0);
        }

        edit(
            &mut texture,
            &[
                ("rhythmQ", "pt, (c, 4), (c, 1), (c, 1)"),
                ("fillGenerator", "bg, oc, (0, .5)"),
                ("textQ", "lep, path"),
            ],
        )?;
        let events = texture.score(&path, &[])?;
        assert_eq!(events.len(), 12);
        let times = events.iter().map(|e| e.time).collect::<Vec<_>>();
        assert_eq!(times[..6], [0.0; 6]);
        assert_eq!(times[6..], [5.0; 6]);
        Ok(())
    }

    #[test]
    fn time_segment() -> Result<()> {
        let path = Path::from_strings("a", &["c4,e4,g4"])?;
        let mut texture = texture(ModuleKind::TimeSegment)?;
        edit(
            &mut texture,
            &[
                ("tRange", "0, 8"),
                ("rhythmQ", "pt, (c, 4), (c, 1), (c, 1)"),
                ("textQ", "tec, 8"),
                ("textQ", "tsc, 4"),
                ("segmentWidth", "c, 1"),
                ("fillGenerator", "c, 0"),
            ],
        )?;
        let events = texture.score(&path, &[])?;
        let times = events.iter().map(|e| e.time).collect::<Vec<_>>();
        assert_eq!(times, vec![0.0, 0.0, 2.0, 2.0, 4.0, 4.0, 6.0, 6.0]);

        edit(&mut texture, &[("textQ", "lec, texture"), ("textQ", "tec, 6")])?;
        let events = texture.score(&path, &[])?;
        let times = events.iter().map(|e| e.time).collect::<Vec<_>>();
        assert_eq!(times, vec![0.0, 0.0, 2.0, 2.0, 4.0, 6.0]);
        Ok(())
    }
}

//! Events and event sequences, as produced by textures and transformed by clones.

use crate::{
    breakpoint::Interpolation,
    error::{Error, Result},
    parameter::Value,
};

// -------------------------------------------------------------------------------------------------

/// A single, flat note event. Times are in seconds, amplitude, pitch and panning are
/// normalized and get mapped into native units by orchestras when written.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub inst: usize,
    pub time: f64,
    pub sus: f64,
    pub dur: f64,
    /// 0 for rests.
    pub acc: f64,
    pub bpm: f64,
    /// The rhythm pulse triple this event was created from, if any.
    pub pulse: Option<String>,
    pub amp: f64,
    /// Realized pitch space value.
    pub ps: f64,
    pub pan: f64,
    pub aux: Vec<Value>,
    pub comment: Vec<String>,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            inst: 0,
            time: 0.0,
            sus: 0.0,
            dur: 0.0,
            acc: 1.0,
            bpm: 120.0,
            pulse: None,
            amp: 0.0,
            ps: 0.0,
            pan: 0.5,
            aux: Vec::new(),
            comment: Vec::new(),
        }
    }
}

impl Event {
    /// True for silent events: events with a zero accent.
    pub fn is_rest(&self) -> bool {
        self.acc == 0.0
    }

    pub fn field(&self, field: EventField) -> f64 {
        match field {
            EventField::Time => self.time,
            EventField::Sus => self.sus,
            EventField::Dur => self.dur,
            EventField::Acc => self.acc,
            EventField::Bpm => self.bpm,
            EventField::Amp => self.amp,
            EventField::Ps => self.ps,
            EventField::Pan => self.pan,
        }
    }

    pub fn set_field(&mut self, field: EventField, value: f64) {
        match field {
            EventField::Time => self.time = value,
            EventField::Sus => self.sus = value,
            EventField::Dur => self.dur = value,
            EventField::Acc => self.acc = value,
            EventField::Bpm => self.bpm = value,
            EventField::Amp => self.amp = value,
            EventField::Ps => self.ps = value,
            EventField::Pan => self.pan = value,
        }
    }
}

/// Numeric fields of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventField {
    Time,
    Sus,
    Dur,
    Acc,
    Bpm,
    Amp,
    Ps,
    Pan,
}

impl EventField {
    /// Fields which get interpolated between events by default.
    pub const INTERPOLATED: [EventField; 5] = [
        Self::Acc,
        Self::Bpm,
        Self::Amp,
        Self::Ps,
        Self::Pan,
    ];
}

// -------------------------------------------------------------------------------------------------

/// A time frame of an interpolation grid. Frames flagged as event frames are aligned with the
/// events of a sequence, all other frames get interpolated between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub time: f64,
    pub dur: f64,
    pub is_event: bool,
    /// Interpolation towards the next event. Only used on event frames.
    pub interpolation: Interpolation,
}

impl Frame {
    pub fn event(time: f64, dur: f64, interpolation: Interpolation) -> Self {
        Self {
            time,
            dur,
            is_event: true,
            interpolation,
        }
    }

    pub fn between(time: f64, dur: f64) -> Self {
        Self {
            time,
            dur,
            is_event: false,
            interpolation: Interpolation::Linear,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Retrograde transformations of an [`EventSequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retrograde {
    /// Reverse the events, but keep the forward time values.
    EventInverse,
    /// Reverse the events and the spacing between them.
    TimeInverse,
}

// -------------------------------------------------------------------------------------------------

/// An ordered list of events with a cached absolute time range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSequence {
    events: Vec<Event>,
    time_range: (f64, f64),
}

impl EventSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<Event>) -> Self {
        let mut sequence = Self {
            events,
            time_range: (0.0, 0.0),
        };
        sequence.update_post();
        sequence
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut [Event] {
        &mut self.events
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.time_range = (0.0, 0.0);
    }

    /// Stable sort by event time.
    pub fn sort(&mut self) {
        self.events.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    /// Sort the events and update the absolute time range: the earliest start time and the
    /// latest end time including sustains.
    pub fn update_post(&mut self) {
        self.sort();
        self.time_range = if self.events.is_empty() {
            (0.0, 0.0)
        } else {
            let start = self
                .events
                .iter()
                .map(|e| e.time)
                .fold(f64::INFINITY, f64::min);
            let end = self
                .events
                .iter()
                .map(|e| e.time + e.sus)
                .fold(f64::NEG_INFINITY, f64::max);
            (start, end)
        };
    }

    /// Absolute time range as of the last [`Self::update_post`].
    pub fn time_range(&self) -> (f64, f64) {
        self.time_range
    }

    pub fn duration(&self) -> f64 {
        self.time_range.1 - self.time_range.0
    }

    // ---------------------------------------------------------------------------------------------

    /// Copy of a numeric field of all events.
    pub fn get_array(&self, field: EventField) -> Vec<f64> {
        self.events.iter().map(|e| e.field(field)).collect()
    }

    /// Replace a numeric field of all events. `values` must be aligned with the events.
    pub fn set_array(&mut self, field: EventField, values: &[f64]) -> Result<()> {
        self.check_len(values.len())?;
        for (event, value) in self.events.iter_mut().zip(values) {
            event.set_field(field, *value);
        }
        Ok(())
    }

    /// Copy of an auxiliary slot of all events. Missing slots are 0.
    pub fn aux_array(&self, index: usize) -> Vec<Value> {
        self.events
            .iter()
            .map(|e| e.aux.get(index).cloned().unwrap_or_default())
            .collect()
    }

    /// Replace an auxiliary slot of all events.
    pub fn set_aux_array(&mut self, index: usize, values: Vec<Value>) -> Result<()> {
        self.check_len(values.len())?;
        for (event, value) in self.events.iter_mut().zip(values) {
            if event.aux.len() <= index {
                event.aux.resize(index + 1, Value::default());
            }
            event.aux[index] = value;
        }
        Ok(())
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len != self.events.len() {
            return Err(Error::Argument(format!(
                "got {len} values for {} events",
                self.events.len()
            )));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------

    /// Reverse the sequence. Expects sorted events.
    ///
    /// With [`Retrograde::EventInverse`], reversed events take the forward time values. With
    /// [`Retrograde::TimeInverse`], events are reversed and each event's duration becomes the
    /// distance between its original time and the time of its original predecessor, so the
    /// spacing of the events is reversed too. Sustains are kept.
    pub fn retrograde(&mut self, method: Retrograde) {
        if self.events.is_empty() {
            return;
        }
        match method {
            Retrograde::EventInverse => {
                let times = self.get_array(EventField::Time);
                self.events.reverse();
                for (event, time) in self.events.iter_mut().zip(times) {
                    event.time = time;
                }
            }
            Retrograde::TimeInverse => {
                let source = std::mem::take(&mut self.events);
                let count = source.len();
                let mut time = source[0].time;
                let mut events = Vec::with_capacity(count);
                for i in 0..count {
                    let j = count - 1 - i;
                    let dur = if i == count - 1 {
                        source[j].dur
                    } else {
                        (source[j].time - source[j - 1].time).abs()
                    };
                    let mut event = source[j].clone();
                    event.time = time;
                    event.dur = dur;
                    events.push(event);
                    time += dur;
                }
                self.events = events;
            }
        }
    }

    /// Create interpolated events between the existing events.
    ///
    /// `frames` is the complete frame grid: its event frames must be aligned with the
    /// sequence's events. All other frames become new events at the frame's time, with `fields`
    /// interpolated between the surrounding events, and numeric auxiliary values too when `aux`
    /// is set. All other values are copied from the preceding event. With `snap_sus`, frame
    /// sustains are the frame durations and each source event's sustain ends at the following
    /// frame.
    pub fn interpolate(
        &mut self,
        frames: &[Frame],
        snap_sus: bool,
        fields: &[EventField],
        aux: bool,
    ) -> Result<()> {
        let event_frames = frames
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.is_event.then_some(i))
            .collect::<Vec<_>>();
        if event_frames.len() != self.events.len() {
            return Err(Error::Argument(format!(
                "interpolation frames contain {} events, but the sequence has {}",
                event_frames.len(),
                self.events.len()
            )));
        }
        let mut created = Vec::new();
        for i in 0..self.events.len().saturating_sub(1) {
            let (start_frame, end_frame) = (event_frames[i], event_frames[i + 1]);
            if end_frame <= start_frame + 1 {
                continue;
            }
            let start = &self.events[i];
            let end = &self.events[i + 1];
            let (t0, t1) = (frames[start_frame].time, frames[end_frame].time);
            let interpolation = frames[start_frame].interpolation;
            for frame in &frames[start_frame + 1..end_frame] {
                let mut event = start.clone();
                event.time = frame.time;
                event.dur = frame.dur;
                for field in fields {
                    let (a, b) = (start.field(*field), end.field(*field));
                    event.set_field(*field, interpolation.apply(frame.time, t0, a, t1, b));
                }
                if aux {
                    for (slot, (a, b)) in start.aux.iter().zip(end.aux.iter()).enumerate() {
                        if let (Value::Number(a), Value::Number(b)) = (a, b) {
                            event.aux[slot] =
                                Value::Number(interpolation.apply(frame.time, t0, *a, t1, *b));
                        }
                    }
                }
                if snap_sus {
                    event.sus = frame.dur;
                }
                created.push(event);
            }
            if snap_sus {
                let first_frame_time = frames[start_frame + 1].time;
                self.events[i].sus = first_frame_time - self.events[i].time;
            }
        }
        self.events.extend(created);
        self.sort();
        Ok(())
    }
}

impl IntoIterator for EventSequence {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventSequence {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sequence(times_and_durs: &[(f64, f64)]) -> EventSequence {
        EventSequence::from_events(
            times_and_durs
                .iter()
                .enumerate()
                .map(|(i, (time, dur))| Event {
                    time: *time,
                    dur: *dur,
                    sus: *dur,
                    ps: i as f64,
                    ..Event::default()
                })
                .collect(),
        )
    }

    #[test]
    fn update_post() {
        let mut events = sequence(&[(2.0, 1.0), (0.0, 4.0), (1.0, 0.5)]);
        assert_eq!(events.get_array(EventField::Time), vec![0.0, 1.0, 2.0]);
        assert_eq!(events.time_range(), (0.0, 4.0));
        let once = events.clone();
        events.update_post();
        assert_eq!(events, once);
        assert_eq!(EventSequence::new().time_range(), (0.0, 0.0));
    }

    #[test]
    fn stable_sort() {
        let events = sequence(&[(1.0, 1.0), (0.0, 1.0), (1.0, 1.0)]);
        // equal times keep their insertion order
        assert_eq!(events.get_array(EventField::Ps), vec![1.0, 0.0, 2.0]);
    }

    #[test]
    fn time_inverse() {
        let mut events = sequence(&[(0.0, 1.0), (1.0, 3.0), (4.0, 2.0), (6.0, 1.0)]);
        events.retrograde(Retrograde::TimeInverse);
        assert_eq!(events.get_array(EventField::Time), vec![0.0, 2.0, 5.0, 6.0]);
        assert_eq!(events.get_array(EventField::Dur), vec![2.0, 3.0, 1.0, 1.0]);
        assert_eq!(events.get_array(EventField::Ps), vec![3.0, 2.0, 1.0, 0.0]);
        // sustains travel with their events
        assert_eq!(events.get_array(EventField::Sus), vec![1.0, 2.0, 3.0, 1.0]);
        // reversing twice restores the event order
        events.retrograde(Retrograde::TimeInverse);
        assert_eq!(events.get_array(EventField::Ps), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn event_inverse() {
        let mut events = sequence(&[(0.0, 1.0), (1.0, 3.0), (4.0, 2.0)]);
        events.retrograde(Retrograde::EventInverse);
        assert_eq!(events.get_array(EventField::Time), vec![0.0, 1.0, 4.0]);
        assert_eq!(events.get_array(EventField::Ps), vec![2.0, 1.0, 0.0]);
        assert_eq!(events.get_array(EventField::Dur), vec![2.0, 3.0, 1.0]);
        events.retrograde(Retrograde::EventInverse);
        assert_eq!(events.get_array(EventField::Ps), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn arrays() -> Result<()> {
        let mut events = sequence(&[(0.0, 1.0), (1.0, 1.0)]);
        events.set_array(EventField::Amp, &[0.25, 0.5])?;
        assert_eq!(events.get_array(EventField::Amp), vec![0.25, 0.5]);
        assert!(events.set_array(EventField::Amp, &[0.25]).is_err());
        events.set_aux_array(1, vec![Value::Number(3.0), Value::String("a".into())])?;
        assert_eq!(events.aux_array(0), vec![Value::Number(0.0), Value::Number(0.0)]);
        assert_eq!(
            events.aux_array(1),
            vec![Value::Number(3.0), Value::String("a".into())]
        );
        Ok(())
    }

    #[test]
    fn interpolate_linear() -> Result<()> {
        let mut events = EventSequence::from_events(vec![
            Event {
                time: 0.0,
                sus: 0.5,
                amp: 0.2,
                aux: vec![Value::Number(0.0), Value::String("x".into())],
                ..Event::default()
            },
            Event {
                time: 4.0,
                sus: 0.5,
                amp: 1.0,
                aux: vec![Value::Number(8.0), Value::String("y".into())],
                ..Event::default()
            },
        ]);
        let mut frames = vec![Frame::event(0.0, 0.5, Interpolation::Linear)];
        for i in 1..8 {
            frames.push(Frame::between(i as f64 * 0.5, 0.5));
        }
        frames.push(Frame::event(4.0, 0.5, Interpolation::Linear));
        events.interpolate(&frames, true, &EventField::INTERPOLATED, true)?;
        assert_eq!(events.len(), 9);
        let times = events.get_array(EventField::Time);
        let amps = events.get_array(EventField::Amp);
        for (i, (time, amp)) in times.iter().zip(amps).enumerate() {
            assert!((time - i as f64 * 0.5).abs() < 1e-9);
            assert!((amp - (0.2 + 0.1 * i as f64)).abs() < 1e-9);
        }
        assert_eq!(events.aux_array(0)[2], Value::Number(2.0));
        assert_eq!(events.aux_array(1)[2], Value::String("x".into()));
        assert!(events.get_array(EventField::Sus).iter().all(|s| (s - 0.5).abs() < 1e-9));
        // misaligned frame grids are rejected
        assert!(events.interpolate(&frames, true, &EventField::INTERPOLATED, true).is_err());
        Ok(())
    }
}

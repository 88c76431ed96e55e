//! Standard MIDI file engine.

use derive_more::{Display, From, Into};
use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use num_traits::ToPrimitive;

use crate::{orchestra::Axis, performer::Part};

use super::{post_map, write_file, EngineContext, EngineKind, FileFormat, OutputEngine};

// -------------------------------------------------------------------------------------------------

/// MIDI file resolution.
pub const TICKS_PER_QUARTER: u16 = 960;

/// Channels which get assigned to parts without an explicit channel. Channel 10 is reserved
/// for percussion.
const AUTO_CHANNELS: [u8; 15] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 11, 12, 13, 14, 15, 16];

const MAX_DELTA: u32 = 0x0FFF_FFFF;
const MAX_TEMPO: u32 = 0x00FF_FFFF;

/// A one-based MIDI channel number.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, From, Into)]
#[display("{_0}")]
pub struct Channel(u8);

impl Channel {
    /// The zero-based channel nibble of MIDI messages.
    fn nibble(self) -> u4 {
        u4::new(self.0.clamp(1, 16) - 1)
    }
}

/// Convert seconds into ticks at the given tempo.
pub fn seconds_to_ticks(seconds: f64, tempo: f64) -> u32 {
    (seconds * tempo / 60.0 * TICKS_PER_QUARTER as f64)
        .round()
        .to_u32()
        .unwrap_or(0)
        .min(MAX_DELTA)
}

fn u7_value(value: f64) -> u7 {
    u7::new(value.round().clamp(0.0, 127.0).to_u8().unwrap_or(0))
}

/// Channel of each part: the texture's channel, the orchestra's channel or the next one of the
/// automatically assigned channels which no texture uses explicitly.
pub(crate) fn assign_channels(parts: &[Part], context: &EngineContext) -> Vec<Channel> {
    let explicit = parts
        .iter()
        .filter_map(|part| part.texture.midi_channel)
        .collect::<Vec<_>>();
    let mut free = AUTO_CHANNELS
        .into_iter()
        .filter(|c| !explicit.contains(c))
        .collect::<Vec<_>>();
    if free.is_empty() {
        free = AUTO_CHANNELS.to_vec();
    }
    let mut auto = free.into_iter().cycle();
    parts
        .iter()
        .map(|part| {
            part.texture
                .midi_channel
                .or_else(|| context.orchestra.midi_channel())
                .or_else(|| auto.next())
                .map_or(Channel(1), Channel)
        })
        .collect()
}

// -------------------------------------------------------------------------------------------------

struct TimedEvent<'a> {
    tick: u32,
    kind: TrackEventKind<'a>,
}

impl<'a> TimedEvent<'a> {
    fn midi(tick: u32, channel: Channel, message: MidiMessage) -> Self {
        Self {
            tick,
            kind: TrackEventKind::Midi {
                channel: channel.nibble(),
                message,
            },
        }
    }

    fn meta(tick: u32, message: MetaMessage<'a>) -> Self {
        Self {
            tick,
            kind: TrackEventKind::Meta(message),
        }
    }
}

/// Sort events by tick, keeping the insertion order of simultaneous events, and convert
/// them into a track with relative delta times.
fn into_track(mut events: Vec<TimedEvent>) -> Track {
    events.sort_by_key(|e| e.tick);
    let end = events.last().map_or(0, |e| e.tick);
    events.push(TimedEvent::meta(end, MetaMessage::EndOfTrack));
    let mut last_tick = 0;
    events
        .into_iter()
        .map(|event| {
            let delta = event.tick - last_tick;
            last_tick = event.tick;
            TrackEvent {
                delta: u28::new(delta.min(MAX_DELTA)),
                kind: event.kind,
            }
        })
        .collect()
}

fn meta_track<'a>(name: &'a str, tempo: f64) -> Track<'a> {
    let tempo = (60_000_000.0 / tempo)
        .round()
        .to_u32()
        .unwrap_or(MAX_TEMPO)
        .min(MAX_TEMPO);
    into_track(vec![
        TimedEvent::meta(0, MetaMessage::TrackName(name.as_bytes())),
        TimedEvent::meta(0, MetaMessage::Tempo(u24::new(tempo))),
        TimedEvent::meta(0, MetaMessage::TimeSignature(4, 2, 24, 8)),
        TimedEvent::meta(0, MetaMessage::Text(b"created with athenacl")),
    ])
}

/// Track of a single part. Parts which share their channel with other parts get a program
/// change before each note and start the given number of ticks later.
fn part_track<'a>(
    part: &Part,
    name: &'a str,
    channel: Channel,
    shared: bool,
    offset: u32,
    context: &EngineContext,
) -> Track<'a> {
    let tempo = context.settings.midi_tempo;
    let program = u7::new(part.texture.midi_program.min(127));
    let mut events = vec![
        TimedEvent::meta(0, MetaMessage::TrackName(name.as_bytes())),
        TimedEvent::midi(
            0,
            channel,
            MidiMessage::Controller {
                controller: u7::new(7),
                value: u7::new(127),
            },
        ),
        TimedEvent::midi(0, channel, MidiMessage::ProgramChange { program }),
    ];
    let mut last_pan = None;
    for event in part.events.iter().filter(|e| !e.is_rest()) {
        let vel = u7_value(post_map(context, part, Axis::Amp, event.amp));
        if vel == 0 {
            continue;
        }
        let key = u7_value(post_map(context, part, Axis::Ps, event.ps));
        let pan = u7_value(post_map(context, part, Axis::Pan, event.pan));
        let on = seconds_to_ticks(event.time, tempo) + offset;
        let off = seconds_to_ticks(event.time + event.sus, tempo) + offset;
        if last_pan != Some(pan) {
            last_pan = Some(pan);
            let message = MidiMessage::Controller {
                controller: u7::new(10),
                value: pan,
            };
            events.push(TimedEvent::midi(on, channel, message));
        }
        if shared {
            events.push(TimedEvent::midi(
                on,
                channel,
                MidiMessage::ProgramChange { program },
            ));
        }
        events.push(TimedEvent::midi(on, channel, MidiMessage::NoteOn { key, vel }));
        events.push(TimedEvent::midi(
            off,
            channel,
            MidiMessage::NoteOff {
                key,
                vel: u7::new(0),
            },
        ));
    }
    into_track(events)
}

/// Create a standard MIDI file with a meta track and one track per part.
pub(crate) fn midi_bytes(parts: &[Part], context: &EngineContext) -> anyhow::Result<Vec<u8>> {
    let tempo = context.settings.midi_tempo;
    if !tempo.is_finite() || tempo <= 0.0 {
        anyhow::bail!("invalid MIDI tempo {tempo}");
    }
    let channels = assign_channels(parts, context);
    let names = parts.iter().map(Part::name).collect::<Vec<_>>();
    let stem = context.paths.stem();

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));
    smf.tracks.push(meta_track(stem, tempo));
    let offset_ticks = context.environment.midi_micro_offset_ticks();
    let mut shared_index = 0;
    for ((part, name), channel) in parts.iter().zip(&names).zip(&channels) {
        let shared = channels.iter().filter(|c| *c == channel).count() > 1;
        let offset = if shared {
            let offset = shared_index * offset_ticks;
            shared_index += 1;
            offset
        } else {
            0
        };
        if shared {
            log::debug!("{name} shares MIDI channel {channel}, offsetting by {offset} ticks");
        }
        smf.tracks
            .push(part_track(part, name, *channel, shared, offset, context));
    }
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;
    Ok(bytes)
}

// -------------------------------------------------------------------------------------------------

/// Standard MIDI files with one track per texture and clone.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineMidiFile;

impl OutputEngine for EngineMidiFile {
    fn kind(&self) -> EngineKind {
        EngineKind::MidiFile
    }

    fn formats(&self) -> &'static [FileFormat] {
        &[FileFormat::MidiFile]
    }

    fn min_formats(&self) -> &'static [FileFormat] {
        &[FileFormat::MidiFile]
    }

    fn write(
        &self,
        parts: &[Part],
        _request: &[FileFormat],
        context: &EngineContext,
    ) -> anyhow::Result<Vec<FileFormat>> {
        let bytes = midi_bytes(parts, context)?;
        write_file(context.paths.get(FileFormat::MidiFile), bytes)?;
        Ok(vec![FileFormat::MidiFile])
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        engine::{test::performed, EventMode, RenderSettings},
        environment::{Environment, PathMap},
        orchestra::{general_midi::PERCUSSION_CHANNEL, OrchestraKind},
        performer::parts,
    };
    use pretty_assertions::assert_eq;

    fn with_context<R>(mode: EventMode, f: impl FnOnce(&EngineContext) -> R) -> R {
        let settings = RenderSettings {
            event_mode: mode,
            ..RenderSettings::default()
        };
        let environment = Environment::new().with_seed(1);
        let paths: PathMap = environment.path_map("test");
        let context = EngineContext {
            orchestra: EngineKind::MidiFile.orchestra(mode).orchestra(),
            settings: &settings,
            environment: &environment,
            paths: &paths,
        };
        f(&context)
    }

    /// Absolute ticks and messages of all channel messages of a track.
    fn messages(track: &Track) -> Vec<(u32, u8, MidiMessage)> {
        let mut tick = 0;
        let mut messages = Vec::new();
        for event in track {
            tick += event.delta.as_int();
            if let TrackEventKind::Midi { channel, message } = event.kind {
                messages.push((tick, channel.as_int() + 1, message));
            }
        }
        messages
    }

    fn note_ons(track: &Track) -> Vec<(u32, u8, u8)> {
        messages(track)
            .into_iter()
            .filter_map(|(tick, _, message)| match message {
                MidiMessage::NoteOn { key, vel } => Some((tick, key.as_int(), vel.as_int())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn ticks() {
        assert_eq!(seconds_to_ticks(0.25, 120.0), 480);
        assert_eq!(seconds_to_ticks(1.0, 60.0), 960);
        assert_eq!(seconds_to_ticks(-1.0, 60.0), 0);
        assert_eq!(Channel::from(10).to_string(), "10");
    }

    #[test]
    fn single_texture() -> anyhow::Result<()> {
        let times = (0..20).map(|i| i as f64 * 0.25).collect::<Vec<_>>();
        let texture = performed("t1", OrchestraKind::GeneralMidi, 0, &times);
        let bytes = with_context(EventMode::Midi, |context| {
            midi_bytes(&parts([&texture]), context)
        })?;
        let smf = Smf::parse(&bytes)?;
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.tracks.len(), 2);
        assert!(smf.tracks[0].iter().any(|e| matches!(
            e.kind,
            TrackEventKind::Meta(MetaMessage::Tempo(tempo)) if tempo.as_int() == 500_000
        )));

        let notes = note_ons(&smf.tracks[1]);
        assert_eq!(notes.len(), 20);
        assert_eq!(
            notes.iter().take(4).copied().collect::<Vec<_>>(),
            vec![(0, 60, 114), (480, 61, 114), (960, 65, 114), (1440, 60, 114)]
        );
        // pan is sent once, program changes only at the start
        let track = messages(&smf.tracks[1]);
        let controllers = track
            .iter()
            .filter(|(_, _, m)| matches!(m, MidiMessage::Controller { .. }))
            .count();
        assert_eq!(controllers, 2);
        let programs = track
            .iter()
            .filter(|(_, _, m)| matches!(m, MidiMessage::ProgramChange { .. }))
            .count();
        assert_eq!(programs, 1);
        assert!(track.iter().all(|(_, channel, _)| *channel == 1));
        Ok(())
    }

    #[test]
    fn shared_channels() -> anyhow::Result<()> {
        let mut t1 = performed("t1", OrchestraKind::GeneralMidi, 0, &[0.0, 1.0]);
        let mut t2 = performed("t2", OrchestraKind::GeneralMidi, 40, &[0.0, 1.0]);
        let t3 = performed("t3", OrchestraKind::GeneralMidi, 0, &[0.0]);
        t1.midi_channel = Some(1);
        t2.midi_channel = Some(1);
        t2.midi_program = 40;
        let bytes = with_context(EventMode::Midi, |context| {
            midi_bytes(&parts([&t1, &t2, &t3]), context)
        })?;
        let smf = Smf::parse(&bytes)?;
        assert_eq!(smf.tracks.len(), 4);

        let first = note_ons(&smf.tracks[1]);
        let second = note_ons(&smf.tracks[2]);
        assert_eq!(
            first.iter().map(|n| n.0).collect::<Vec<_>>(),
            vec![0, 1920]
        );
        assert_eq!(
            second.iter().map(|n| n.0).collect::<Vec<_>>(),
            vec![5, 1925]
        );
        // both shared textures change programs before each note
        let programs = messages(&smf.tracks[2])
            .into_iter()
            .filter_map(|(tick, _, m)| match m {
                MidiMessage::ProgramChange { program } => Some((tick, program.as_int())),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(programs, vec![(0, 40), (5, 40), (1925, 40)]);

        // the remaining texture gets the first unused automatic channel
        let channels = messages(&smf.tracks[3])
            .iter()
            .map(|(_, channel, _)| *channel)
            .collect::<Vec<_>>();
        assert!(channels.iter().all(|c| *c == 2));
        assert_eq!(note_ons(&smf.tracks[3]), vec![(0, 60, 114)]);
        Ok(())
    }

    #[test]
    fn percussion_channel() -> anyhow::Result<()> {
        let texture = performed("t1", OrchestraKind::GeneralMidiPercussion, 36, &[0.0]);
        let bytes = with_context(EventMode::MidiPercussion, |context| {
            midi_bytes(&parts([&texture]), context)
        })?;
        let smf = Smf::parse(&bytes)?;
        let notes = messages(&smf.tracks[1]);
        assert!(notes
            .iter()
            .all(|(_, channel, _)| *channel == PERCUSSION_CHANNEL));
        assert_eq!(note_ons(&smf.tracks[1]), vec![(0, 36, 114)]);
        Ok(())
    }
}

//! End to end compositions, scored and rendered through an [`AthenaObject`].

use athenacl::prelude::*;
use midly::{MidiMessage, Smf, TrackEventKind};
use pretty_assertions::assert_eq;

// -------------------------------------------------------------------------------------------------

fn environment(name: &str) -> anyhow::Result<Environment> {
    // may already be initialized by another test
    let _ = simplelog::TestLogger::init(log::LevelFilter::Info, simplelog::Config::default());
    let directory = std::env::temp_dir().join(format!("athenacl-scenario-{name}"));
    std::fs::create_dir_all(&directory)?;
    Ok(Environment::new()
        .with_output_directory(directory)
        .with_file_stem(name))
}

fn edit(ao: &mut AthenaObject, texture: &str, edits: &[(&str, &str)]) -> Result<()> {
    for (attribute, args) in edits {
        ao.texture_edit(texture, attribute, args)?;
    }
    Ok(())
}

/// Quarter beats at 60 bpm, cycling through the path's pitches.
const QUARTERS: &[(&str, &str)] = &[
    ("tRange", "0, 5"),
    ("beatT", "c, 60"),
    ("rhythmQ", "pt, (c, 4), (c, 1), (c, 1)"),
    ("ampQ", "c, .9"),
    ("panQ", "c, .5"),
    ("fieldQ", "c, 0"),
    ("octQ", "c, 0"),
    ("textQ", "psc, oc"),
];

fn line_groove(mode: EventMode) -> Result<AthenaObject> {
    let mut ao = AthenaObject::new(1);
    ao.set_event_mode(mode);
    ao.path_new("a", &["3-4"])?;
    ao.texture_new("t1", ModuleKind::LineGroove, "a")?;
    edit(&mut ao, "t1", QUARTERS)?;
    Ok(ao)
}

/// (tick, channel, message) of all channel messages in a track, with absolute ticks.
fn messages(track: &[midly::TrackEvent]) -> Vec<(u32, u8, MidiMessage)> {
    let mut tick = 0;
    let mut messages = Vec::new();
    for event in track {
        tick += event.delta.as_int();
        if let TrackEventKind::Midi { channel, message } = event.kind {
            messages.push((tick, channel.as_int(), message));
        }
    }
    messages
}

fn note_ons(track: &[midly::TrackEvent]) -> Vec<(u32, u8, u8)> {
    messages(track)
        .into_iter()
        .filter_map(|(tick, _, message)| match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                Some((tick, key.as_int(), vel.as_int()))
            }
            _ => None,
        })
        .collect()
}

// -------------------------------------------------------------------------------------------------

#[test]
fn line_groove_midi() -> anyhow::Result<()> {
    let mut ao = line_groove(EventMode::Midi)?;
    let environment = environment("midi")?;

    let performer = ao.perform(&environment);
    let events = &performer.get("t1").ok_or(anyhow::anyhow!("missing texture"))?.events;
    assert_eq!(events.len(), 20);
    assert_eq!(
        events.get_array(EventField::Time),
        (0..20).map(|i| i as f64 * 0.25).collect::<Vec<_>>()
    );
    assert!(events.iter().all(|e| e.sus == 0.25 && e.amp == 0.9));

    let written = ao.render(&environment, &[]);
    assert_eq!(written, vec![FileFormat::MidiFile]);
    let bytes = std::fs::read(environment.path_map("midi").get(FileFormat::MidiFile))?;
    let smf = Smf::parse(&bytes)?;
    // tempo track and a single texture track
    assert_eq!(smf.tracks.len(), 2);
    let notes = note_ons(&smf.tracks[1]);
    assert_eq!(notes.len(), 20);
    assert!(notes.iter().all(|(_, _, vel)| *vel == 114));
    let keys = notes.iter().map(|(_, key, _)| *key).collect::<Vec<_>>();
    assert_eq!(keys[..6], [60, 61, 65, 60, 61, 65]);
    Ok(())
}

#[test]
fn silence_mode_rhythm() -> anyhow::Result<()> {
    let mut ao = line_groove(EventMode::Midi)?;
    ao.texture_edit("t1", "rhythmQ", "pt, (c, 4), (c, 1), (bg, oc, (1, 0, 1, 0))")?;
    let environment = Environment::new();

    let performer = ao.perform(&environment);
    let events = &performer.get("t1").ok_or(anyhow::anyhow!("missing texture"))?.events;
    assert_eq!(events.len(), 10);

    ao.texture_edit("t1", "silenceMode", "on")?;
    let performer = ao.perform(&environment);
    let events = &performer.get("t1").ok_or(anyhow::anyhow!("missing texture"))?.events;
    assert_eq!(events.len(), 20);
    let accents = events.get_array(EventField::Acc);
    assert!(accents.iter().step_by(2).all(|acc| *acc == 1.0));
    assert!(accents.iter().skip(1).step_by(2).all(|acc| *acc == 0.0));
    Ok(())
}

#[test]
fn clone_time_inverse() -> anyhow::Result<()> {
    let source = EventSequence::from_events(
        [(0.0, 1.0), (1.0, 3.0), (4.0, 2.0), (6.0, 1.0)]
            .iter()
            .enumerate()
            .map(|(i, (time, dur))| Event {
                time: *time,
                dur: *dur,
                sus: *dur,
                amp: 0.5,
                ps: i as f64,
                ..Event::default()
            })
            .collect(),
    );
    let mut clone = TextureClone::new("c1", "t1", 0, 1)?;
    clone.edit("cloneQ", &Arg::parse("rmt, timeInverse")?)?;
    let events = clone.score(&source)?;
    assert_eq!(events.get_array(EventField::Time), vec![0.0, 2.0, 5.0, 6.0]);
    assert_eq!(events.get_array(EventField::Dur), vec![2.0, 3.0, 1.0, 1.0]);
    assert_eq!(events.get_array(EventField::Ps), vec![3.0, 2.0, 1.0, 0.0]);
    // the same configuration scores the same events
    assert_eq!(clone.score(&source)?, events);
    Ok(())
}

#[test]
fn csound_orchestra_compatibility() -> anyhow::Result<()> {
    let mut ao = AthenaObject::new(3);
    ao.path_new("a", &["3-4"])?;
    ao.texture_new("t1", ModuleKind::LineGroove, "a")?;
    ao.texture_new("t2", ModuleKind::LineGroove, "a")?;
    ao.texture_set_instrument("t1", OrchestraKind::CsoundNative, 3, None)?;
    ao.texture_set_instrument("t2", OrchestraKind::GeneralMidi, 0, None)?;
    for texture in ["t1", "t2"] {
        edit(&mut ao, texture, &QUARTERS[..3])?;
    }
    let environment = environment("csound")?;
    let written = ao.render(&environment, &[FileFormat::CsoundScore, FileFormat::MidiFile]);
    assert_eq!(
        written,
        vec![
            FileFormat::CsoundOrchestra,
            FileFormat::CsoundScore,
            FileFormat::CsoundBatch,
            FileFormat::MidiFile
        ]
    );
    let paths = environment.path_map("csound");
    let score = std::fs::read_to_string(paths.get(FileFormat::CsoundScore))?;
    assert!(score.contains("TI(t1)"));
    assert!(!score.contains("TI(t2)"));
    assert_eq!(score.lines().filter(|l| l.starts_with("i3 ")).count(), 20);
    let orchestra = std::fs::read_to_string(paths.get(FileFormat::CsoundOrchestra))?;
    assert!(orchestra.contains("instr 3\n"));

    // no events are lost in the midi file
    let bytes = std::fs::read(paths.get(FileFormat::MidiFile))?;
    let smf = Smf::parse(&bytes)?;
    assert_eq!(smf.tracks.len(), 3);
    assert_eq!(note_ons(&smf.tracks[1]).len(), 20);
    assert_eq!(note_ons(&smf.tracks[2]).len(), 20);
    Ok(())
}

#[test]
fn interpolate_line() -> anyhow::Result<()> {
    let mut ao = AthenaObject::new(5);
    ao.path_new("a", &["c4"])?;
    ao.texture_new("t1", ModuleKind::InterpolateLine, "a")?;
    edit(
        &mut ao,
        "t1",
        &[
            ("tRange", "0, 8"),
            ("beatT", "c, 60"),
            ("rhythmQ", "pt, (c, 1), (c, 4), (c, 1)"),
            ("ampQ", "bg, oc, (.2, 1)"),
            ("frameDuration", "c, .5"),
        ],
    )?;
    let performer = ao.perform(&Environment::new());
    let events = &performer.get("t1").ok_or(anyhow::anyhow!("missing texture"))?.events;
    let round = |values: Vec<f64>| {
        values
            .iter()
            .map(|v| (v * 1e6).round() / 1e6)
            .collect::<Vec<_>>()
    };
    assert_eq!(
        round(events.get_array(EventField::Time)),
        vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0]
    );
    assert_eq!(
        round(events.get_array(EventField::Amp)),
        vec![0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]
    );
    Ok(())
}

#[test]
fn midi_channel_collision() -> anyhow::Result<()> {
    let mut ao = AthenaObject::new(6);
    ao.set_event_mode(EventMode::Midi);
    ao.path_new("a", &["3-4"])?;
    ao.texture_new("t1", ModuleKind::LineGroove, "a")?;
    ao.texture_copy("t1", "t2")?;
    for texture in ["t1", "t2"] {
        edit(&mut ao, texture, &QUARTERS[..3])?;
        ao.texture_edit(texture, "midiChannel", "1")?;
    }
    ao.texture_edit("t2", "midiProgram", "40")?;
    let environment = environment("channels")?;
    ao.render(&environment, &[FileFormat::MidiFile]);

    let bytes = std::fs::read(environment.path_map("channels").get(FileFormat::MidiFile))?;
    let smf = Smf::parse(&bytes)?;
    assert_eq!(smf.tracks.len(), 3);
    for (index, track) in smf.tracks[1..].iter().enumerate() {
        let offset = index as u32 * 5;
        let notes = note_ons(track);
        assert_eq!(notes.len(), 20);
        assert!(notes
            .iter()
            .enumerate()
            .all(|(i, (tick, _, _))| *tick == i as u32 * 480 + offset));
        // the initial program change, then one before each note
        let messages = messages(track);
        assert!(messages.iter().all(|(_, channel, _)| *channel == 0));
        let program_changes = messages
            .iter()
            .filter(|(_, _, message)| matches!(message, MidiMessage::ProgramChange { .. }))
            .count();
        assert_eq!(program_changes, 21);
    }
    Ok(())
}

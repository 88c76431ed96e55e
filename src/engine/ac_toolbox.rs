//! AC Toolbox engine: Lisp sections of MIDI events, combined into a parallel section.

use std::fmt::Write;

use num_traits::ToPrimitive;

use crate::{orchestra::Axis, performer::Part, pitch::ps_to_midi_real};

use super::{post_map, write_file, EngineContext, EngineKind, FileFormat, OutputEngine};

// -------------------------------------------------------------------------------------------------

const COMMENT: &str = "created with athenacl";

const PROGRAM_CHANGE: u8 = 0xC0;
const CONTROLLER: u8 = 0xB0;
const NOTE_ON: u8 = 0x90;

fn ms(seconds: f64) -> i64 {
    (seconds * 1000.0).round().to_i64().unwrap_or(0)
}

/// Event list of a part. Pitches are MIDI note numbers with fractions, so microtones survive.
fn section_events(part: &Part, context: &EngineContext) -> String {
    let channel = part
        .texture
        .midi_channel
        .map_or(0, |channel| channel.clamp(1, 16) - 1);
    let mut events = format!(
        "(0 ({} {}))\n",
        PROGRAM_CHANGE + channel,
        part.texture.midi_program
    );
    let mut last_pan = None;
    for event in part.events.iter().filter(|e| !e.is_rest()) {
        let time = ms(event.time);
        let vel = post_map(context, part, Axis::Amp, event.amp).round();
        let pan = post_map(context, part, Axis::Pan, event.pan).round();
        if last_pan != Some(pan) {
            last_pan = Some(pan);
            let _ = writeln!(events, "({time} ({} 10 {pan}))", CONTROLLER + channel);
        }
        let _ = writeln!(
            events,
            "({time} ({} {:.4} {vel}) {})",
            NOTE_ON + channel,
            ps_to_midi_real(event.ps),
            ms(event.sus)
        );
    }
    events
}

fn section(title: &str, part: &Part, context: &EngineContext) -> String {
    format!(
        "(define {title} (make-instance 'section\n    \
        :input '(make-from-midi-file 'section)\n    \
        :events '(\n{}  )\n    \
        :duration {}\n    \
        :clock-unit nil) \"{COMMENT}\")\n\n",
        section_events(part, context),
        ms(part.events.time_range().1)
    )
}

fn parallel_section(title: &str, sections: &[String]) -> String {
    format!(
        "(define {title} (make-instance 'section\n    \
        :input '(make-parallel-section {}\n  )\n    \
        :duration nil\n    \
        :clock-unit nil) \"{COMMENT}\")\n\
        (setf (get-events {title})\n    \
        (get-events (make-variant {title})))\n",
        sections.join("\n")
    )
}

// -------------------------------------------------------------------------------------------------

/// AC Toolbox Lisp files: a section per texture and clone.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineAcToolbox;

impl OutputEngine for EngineAcToolbox {
    fn kind(&self) -> EngineKind {
        EngineKind::AcToolbox
    }

    fn formats(&self) -> &'static [FileFormat] {
        &[FileFormat::AcToolbox]
    }

    fn min_formats(&self) -> &'static [FileFormat] {
        &[FileFormat::AcToolbox]
    }

    fn write(
        &self,
        parts: &[Part],
        _request: &[FileFormat],
        context: &EngineContext,
    ) -> anyhow::Result<Vec<FileFormat>> {
        let stem = context.paths.stem();
        // without this, parallel sections fail to load
        let mut code = String::from("(setf *convert-from-old-midi-format* nil)\n\n");
        let mut titles = Vec::with_capacity(parts.len());
        for part in parts {
            let title = format!("{stem}-{}", part.name());
            code.push_str(&section(&title, part, context));
            titles.push(title);
        }
        code.push_str(&parallel_section(stem, &titles));
        write_file(context.paths.get(FileFormat::AcToolbox), code)?;
        Ok(vec![FileFormat::AcToolbox])
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        engine::{test::performed, EventMode, RenderSettings},
        environment::Environment,
        orchestra::OrchestraKind,
        performer::{parts, PerformedClone},
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn sections() -> anyhow::Result<()> {
        let mut texture = performed("t1", OrchestraKind::GeneralMidi, 0, &[0.0, 0.5]);
        texture.midi_channel = Some(2);
        texture.midi_program = 5;
        texture.events.events_mut()[1].ps = 0.5;
        texture.events.events_mut()[1].pan = 1.0;
        texture.clones.push(PerformedClone {
            name: "c1".to_string(),
            events: texture.events.clone(),
            mute: false,
        });
        let settings = RenderSettings {
            event_mode: EventMode::Midi,
            ..RenderSettings::default()
        };
        let environment = Environment::new();
        let paths = environment.path_map("test");
        let context = EngineContext {
            orchestra: EngineKind::AcToolbox.orchestra(settings.event_mode).orchestra(),
            settings: &settings,
            environment: &environment,
            paths: &paths,
        };
        let parts = parts([&texture]);
        assert_eq!(
            section_events(&parts[0], &context),
            "(0 (193 5))\n\
            (0 (177 10 64))\n\
            (0 (145 60.0000 114) 250)\n\
            (500 (177 10 127))\n\
            (500 (145 60.5000 114) 250)\n"
        );
        let code = section("test-t1", &parts[0], &context);
        assert!(code.starts_with("(define test-t1 (make-instance 'section\n"));
        assert!(code.contains(":duration 750\n"));

        let titles = vec!["test-t1".to_string(), "test-t1-c1".to_string()];
        let parallel = parallel_section("test", &titles);
        assert!(parallel.contains("(make-parallel-section test-t1\ntest-t1-c1\n  )"));
        assert!(parallel.ends_with("(get-events (make-variant test)))\n"));
        Ok(())
    }
}

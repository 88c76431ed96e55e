//! Max/MSP coll engine: one line of note, velocity and duration triples per part.

use std::fmt::Write;

use num_traits::ToPrimitive;

use crate::{orchestra::Axis, performer::Part};

use super::{post_map, write_file, EngineContext, EngineKind, FileFormat, OutputEngine};

// -------------------------------------------------------------------------------------------------

fn to_int(value: f64) -> i64 {
    value.round().to_i64().unwrap_or(0)
}

/// Coll line of a part. Durations are the milliseconds until the following onset, the last
/// note lasts for its sustain.
fn coll_line(number: usize, part: &Part, context: &EngineContext) -> String {
    let events = part
        .events
        .iter()
        .filter(|e| !e.is_rest())
        .collect::<Vec<_>>();
    let mut line = format!("{number},");
    for (i, event) in events.iter().enumerate() {
        let note = post_map(context, part, Axis::Ps, event.ps);
        let vel = post_map(context, part, Axis::Amp, event.amp);
        let dur = match events.get(i + 1) {
            Some(next) => next.time - event.time,
            None => event.sus,
        };
        let _ = write!(
            line,
            " {} {} {}",
            to_int(note),
            to_int(vel),
            to_int(dur * 1000.0)
        );
    }
    line.push_str(";\n");
    line
}

// -------------------------------------------------------------------------------------------------

/// Max/MSP coll object text files.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineMaxColl;

impl OutputEngine for EngineMaxColl {
    fn kind(&self) -> EngineKind {
        EngineKind::MaxColl
    }

    fn formats(&self) -> &'static [FileFormat] {
        &[FileFormat::MaxColl]
    }

    fn min_formats(&self) -> &'static [FileFormat] {
        &[FileFormat::MaxColl]
    }

    fn write(
        &self,
        parts: &[Part],
        _request: &[FileFormat],
        context: &EngineContext,
    ) -> anyhow::Result<Vec<FileFormat>> {
        let coll = parts
            .iter()
            .enumerate()
            .map(|(i, part)| coll_line(i + 1, part, context))
            .collect::<String>();
        write_file(context.paths.get(FileFormat::MaxColl), coll)?;
        Ok(vec![FileFormat::MaxColl])
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
        performer::parts,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn lines() -> anyhow::Result<()> {
        let mut t1 = performed("t1", OrchestraKind::GeneralMidi, 0, &[0.0, 0.5, 1.0, 2.0]);
        t1.events.events_mut()[2].acc = 0.0;
        let t2 = performed("t2", OrchestraKind::CsoundNative, 3, &[0.0]);
        let directory = std::env::temp_dir().join("athenacl-coll");
        std::fs::create_dir_all(&directory)?;
        let settings = RenderSettings {
            event_mode: EventMode::Midi,
            ..RenderSettings::default()
        };
        let environment = Environment::new().with_output_directory(directory);
        let paths = environment.path_map("test");
        let context = EngineContext {
            orchestra: EngineKind::MaxColl.orchestra(settings.event_mode).orchestra(),
            settings: &settings,
            environment: &environment,
            paths: &paths,
        };
        let written = EngineMaxColl.write(&parts([&t1, &t2]), &[], &context)?;
        assert_eq!(written, vec![FileFormat::MaxColl]);
        let coll = std::fs::read_to_string(paths.get(FileFormat::MaxColl))?;
        assert_eq!(
            coll,
            "1, 60 114 500 61 114 1500 60 114 250;\n2, 60 114 250;\n"
        );
        Ok(())
    }
}

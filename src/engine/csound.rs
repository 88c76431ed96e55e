//! Csound engines: scores, orchestras, batch scripts and unified csd files.

use std::path::Path;

use crate::{
    event::Event,
    orchestra::{Axis, OrchestraKind},
    performer::Part,
};

use super::{
    aux_count, column, format_comment, format_float, format_header, format_label,
    format_part_header, format_value, post_map, write_file, EngineContext, EngineKind,
    FileFormat, OutputEngine,
};

// -------------------------------------------------------------------------------------------------

const SCORE_PREFIX: &str = "; ";

/// Write a score with a header, the orchestra's function tables, a column label and a section
/// per part. Rests are not written.
fn score<F>(
    kind: EngineKind,
    context: &EngineContext,
    parts: &[Part],
    labels: &[&str],
    aux_count: usize,
    row: F,
) -> anyhow::Result<String>
where
    F: Fn(&Part, &Event) -> anyhow::Result<String>,
{
    let mut score = format_header(kind, context.orchestra.kind(), SCORE_PREFIX);
    if let Some(tables) = context.orchestra.score_tables() {
        score.push_str(&tables);
        score.push('\n');
    }
    score.push(';');
    score.push_str(&format_label(labels, aux_count, " "));
    score.push('\n');
    for part in parts {
        score.push_str(&format_part_header(part, SCORE_PREFIX));
        for event in part.events.iter().filter(|e| !e.is_rest()) {
            score.push_str(&row(part, event)?);
        }
        score.push('\n');
    }
    Ok(score)
}

fn max_aux_count(parts: &[Part]) -> usize {
    parts.iter().map(aux_count).max().unwrap_or(0)
}

fn instrument_column(event: &Event) -> String {
    column(&format!("i{}", event.inst), 4)
}

/// Time and sustain columns, with two more decimal places than other values.
fn time_columns(event: &Event, precision: usize) -> String {
    column(&format_float(event.time, precision + 2), 12)
        + &column(&format_float(event.sus, precision + 2), 12)
}

fn aux_columns(event: &Event, precision: usize) -> String {
    event
        .aux
        .iter()
        .map(|value| column(&format_value(value, precision), 10))
        .collect()
}

/// Csound command line options, without input files.
fn csound_options(context: &EngineContext) -> String {
    format!(
        "-m2 -d {} -b1024 -B1024 \"-o{}\"",
        context.environment.audio_format().csound_flag(),
        context.paths.audio().display()
    )
}

/// Shell or batch script which renders the given input files.
fn batch_script(context: &EngineContext, inputs: &[&Path]) -> String {
    let header = if cfg!(windows) {
        "@ECHO off\n"
    } else {
        "#! /bin/sh\n"
    };
    let inputs = inputs
        .iter()
        .map(|path| format!("\"{}\"", path.display()))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "{header}{} {} {inputs}\n",
        context.environment.csound_command(),
        csound_options(context)
    )
}

fn write_batch(path: &Path, script: &str) -> anyhow::Result<()> {
    write_file(path, script)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

/// Unified orchestra and score file.
fn csd(context: &EngineContext, orchestra: &str, score: &str) -> String {
    format!(
        "<CsoundSynthesizer>\n\n<CsOptions>\n{}\n</CsOptions>\n\n\
        <CsInstruments>\n{orchestra}\n</CsInstruments>\n\n\
        <CsScore>\n{score}\n</CsScore>\n\n</CsoundSynthesizer>\n",
        csound_options(context)
    )
}

// -------------------------------------------------------------------------------------------------

/// Scores for the built-in Csound instruments, with their orchestra and a render script.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineCsoundNative;

impl EngineCsoundNative {
    fn score(&self, parts: &[Part], context: &EngineContext) -> anyhow::Result<String> {
        let precision = context.environment.score_precision();
        score(
            self.kind(),
            context,
            parts,
            &[
                "instrument",
                "timeStart",
                "timeSustain",
                "amplitude",
                "pitch",
                "panning",
            ],
            max_aux_count(parts),
            |part, event| {
                let mut row = instrument_column(event) + &time_columns(event, precision);
                for (axis, value) in [
                    (Axis::Amp, event.amp),
                    (Axis::Ps, event.ps),
                    (Axis::Pan, event.pan),
                ] {
                    let value = post_map(context, part, axis, value);
                    row += &column(&format_float(value, precision), 10);
                }
                row += &aux_columns(event, precision);
                row += &format_comment(&event.comment, ";");
                Ok(row)
            },
        )
    }

    fn orchestra(&self, parts: &[Part], context: &EngineContext) -> anyhow::Result<String> {
        let mut instruments = parts.iter().map(|p| p.texture.instrument).collect::<Vec<_>>();
        instruments.sort_unstable();
        instruments.dedup();
        context
            .orchestra
            .construct_orchestra(
                context.settings.audio_channels,
                context.settings.audio_sample_rate,
                &instruments,
            )
            .ok_or_else(|| {
                anyhow::anyhow!("orchestra '{}' can't be written", context.orchestra.kind())
            })
    }
}

impl OutputEngine for EngineCsoundNative {
    fn kind(&self) -> EngineKind {
        EngineKind::CsoundNative
    }

    fn formats(&self) -> &'static [FileFormat] {
        &[
            FileFormat::CsoundOrchestra,
            FileFormat::CsoundScore,
            FileFormat::CsoundBatch,
            FileFormat::CsoundData,
        ]
    }

    fn min_formats(&self) -> &'static [FileFormat] {
        &[
            FileFormat::CsoundOrchestra,
            FileFormat::CsoundScore,
            FileFormat::CsoundBatch,
        ]
    }

    fn incompatible(&self) -> &'static [OrchestraKind] {
        &[
            OrchestraKind::CsoundExternal,
            OrchestraKind::CsoundSilence,
            OrchestraKind::GeneralMidi,
            OrchestraKind::GeneralMidiPercussion,
            OrchestraKind::Generic,
        ]
    }

    fn write(
        &self,
        parts: &[Part],
        request: &[FileFormat],
        context: &EngineContext,
    ) -> anyhow::Result<Vec<FileFormat>> {
        let orchestra = self.orchestra(parts, context)?;
        let score = self.score(parts, context)?;
        let paths = context.paths;
        let batch = paths.get(FileFormat::CsoundBatch);
        if request.contains(&FileFormat::CsoundData) {
            // a csd replaces the separate orchestra and score files
            let csd_path = paths.get(FileFormat::CsoundData);
            write_file(csd_path, csd(context, &orchestra, &score))?;
            write_batch(batch, &batch_script(context, &[csd_path]))?;
            Ok(vec![FileFormat::CsoundData, FileFormat::CsoundBatch])
        } else {
            let orc_path = paths.get(FileFormat::CsoundOrchestra);
            let sco_path = paths.get(FileFormat::CsoundScore);
            write_file(orc_path, orchestra)?;
            write_file(sco_path, score)?;
            write_batch(batch, &batch_script(context, &[orc_path, sco_path]))?;
            Ok(vec![
                FileFormat::CsoundOrchestra,
                FileFormat::CsoundScore,
                FileFormat::CsoundBatch,
            ])
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Scores for instruments defined outside of the crate: instrument, time, sustain and
/// auxiliary values only.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineCsoundExternal;

impl OutputEngine for EngineCsoundExternal {
    fn kind(&self) -> EngineKind {
        EngineKind::CsoundExternal
    }

    fn formats(&self) -> &'static [FileFormat] {
        &[FileFormat::CsoundScore]
    }

    fn min_formats(&self) -> &'static [FileFormat] {
        &[FileFormat::CsoundScore]
    }

    fn write(
        &self,
        parts: &[Part],
        _request: &[FileFormat],
        context: &EngineContext,
    ) -> anyhow::Result<Vec<FileFormat>> {
        let precision = context.environment.score_precision();
        let score = score(
            self.kind(),
            context,
            parts,
            &["instrument", "timeStart", "timeSustain"],
            max_aux_count(parts),
            |_, event| {
                Ok(instrument_column(event)
                    + &time_columns(event, precision)
                    + &aux_columns(event, precision)
                    + &format_comment(&event.comment, ";"))
            },
        )?;
        write_file(context.paths.get(FileFormat::CsoundScore), score)?;
        Ok(vec![FileFormat::CsoundScore])
    }
}

// -------------------------------------------------------------------------------------------------

/// Scores for the Silence csound front end, with a fixed column layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineCsoundSilence;

const SILENCE_AUX_COUNT: usize = 4;

impl OutputEngine for EngineCsoundSilence {
    fn kind(&self) -> EngineKind {
        EngineKind::CsoundSilence
    }

    fn formats(&self) -> &'static [FileFormat] {
        &[FileFormat::CsoundScore]
    }

    fn min_formats(&self) -> &'static [FileFormat] {
        &[FileFormat::CsoundScore]
    }

    fn incompatible(&self) -> &'static [OrchestraKind] {
        &[
            OrchestraKind::CsoundNative,
            OrchestraKind::CsoundExternal,
            OrchestraKind::GeneralMidi,
            OrchestraKind::GeneralMidiPercussion,
            OrchestraKind::Generic,
        ]
    }

    fn write(
        &self,
        parts: &[Part],
        _request: &[FileFormat],
        context: &EngineContext,
    ) -> anyhow::Result<Vec<FileFormat>> {
        let precision = context.environment.score_precision();
        let score = score(
            self.kind(),
            context,
            parts,
            &[
                "instrument",
                "timeStart",
                "timeSustain",
                "midiNote",
                "velocity",
                "phase",
                "panX",
                "panY",
                "panZ",
                "mason",
            ],
            0,
            |part, event| {
                if event.aux.len() != SILENCE_AUX_COUNT {
                    anyhow::bail!(
                        "texture {} has {} auxiliary values, expected {SILENCE_AUX_COUNT}",
                        part.name(),
                        event.aux.len()
                    );
                }
                let mapped = |axis, value| {
                    column(
                        &format_float(post_map(context, part, axis, value), precision),
                        10,
                    )
                };
                let aux = |index: usize| column(&format_value(&event.aux[index], precision), 10);
                Ok(instrument_column(event)
                    + &time_columns(event, precision)
                    + &mapped(Axis::Ps, event.ps)
                    + &mapped(Axis::Amp, event.amp)
                    + &aux(0)
                    + &mapped(Axis::Pan, event.pan)
                    + &aux(1)
                    + &aux(2)
                    + &aux(3)
                    + &format_comment(&event.comment, ";"))
            },
        )?;
        write_file(context.paths.get(FileFormat::CsoundScore), score)?;
        Ok(vec![FileFormat::CsoundScore])
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        engine::{render, test::performed, EventMode, RenderSettings},
        environment::Environment,
        parameter::Value,
        performer::{parts, Performer},
    };
    use pretty_assertions::assert_eq;

    fn environment(name: &str) -> Environment {
        let directory = std::env::temp_dir().join(format!("athenacl-csound-{name}"));
        let _ = std::fs::create_dir_all(&directory);
        Environment::new()
            .with_seed(1)
            .with_output_directory(directory)
            .with_file_stem("test")
    }

    fn context<'a>(
        kind: EngineKind,
        settings: &'a RenderSettings,
        environment: &'a Environment,
        paths: &'a crate::environment::PathMap,
    ) -> EngineContext<'a> {
        EngineContext {
            orchestra: kind.orchestra(settings.event_mode).orchestra(),
            settings,
            environment,
            paths,
        }
    }

    #[test]
    fn native_score() -> anyhow::Result<()> {
        let mut texture = performed("t1", OrchestraKind::CsoundNative, 3, &[0.0, 0.25]);
        for event in texture.events.events_mut() {
            event.aux = vec![Value::Number(0.01), Value::String("a".to_string())];
        }
        texture.events.events_mut()[1].acc = 0.0;
        let textures = [texture];
        let parts = parts(&textures);
        let settings = RenderSettings::default();
        let environment = environment("native");
        let paths = environment.path_map("test");
        let context = context(EngineKind::CsoundNative, &settings, &environment, &paths);
        let score = EngineCsoundNative.score(&parts, &context)?;
        assert!(score.starts_with("; athenacl "));
        assert!(score.contains("f 1 0 16384 10 1\n"));
        assert!(score.contains(
            ";instrument timeStart timeSustain amplitude pitch panning aux01 aux02 comment\n"
        ));
        assert!(score.contains("; TM(LineGroove), TI(t1)\n"));
        // the rest is not written
        assert_eq!(score.matches("i3 ").count(), 1);
        assert!(score.contains(
            "i3   0.0          0.25         81.0       8.0        0.5        0.01       a           ;\n"
        ));
        Ok(())
    }

    #[test]
    fn silence_aux() -> anyhow::Result<()> {
        let mut texture = performed("t1", OrchestraKind::CsoundSilence, 1, &[0.0]);
        let settings = RenderSettings {
            event_mode: EventMode::CsoundSilence,
            ..RenderSettings::default()
        };
        let environment = environment("silence");
        let paths = environment.path_map("test");
        let context = context(EngineKind::CsoundSilence, &settings, &environment, &paths);
        assert!(EngineCsoundSilence
            .write(&parts([&texture]), &[], &context)
            .is_err());

        for event in texture.events.events_mut() {
            event.aux = vec![
                Value::Number(1.0),
                Value::Number(0.5),
                Value::Number(0.5),
                Value::String("3-11B".to_string()),
            ];
        }
        let written = EngineCsoundSilence.write(&parts([&texture]), &[], &context)?;
        assert_eq!(written, vec![FileFormat::CsoundScore]);
        let score = std::fs::read_to_string(paths.get(FileFormat::CsoundScore))?;
        assert!(score.contains(
            "i1   0.0          0.25         60.0       114.3      1.0        0.5        \
            0.5        0.5        3-11B       ;\n"
        ));
        Ok(())
    }

    #[test]
    fn orchestra_compatibility() -> anyhow::Result<()> {
        let performer = Performer::from_textures(vec![
            performed("t1", OrchestraKind::CsoundNative, 3, &[0.0, 1.0]),
            performed("t2", OrchestraKind::GeneralMidi, 0, &[0.0, 1.0, 2.0]),
        ]);
        let settings = RenderSettings::default();
        let environment = environment("compatibility");
        let paths = environment.path_map("test");
        let written = render(
            &performer,
            &settings,
            &environment,
            &paths,
            &[FileFormat::CsoundData, FileFormat::MidiFile],
        );
        assert_eq!(
            written,
            vec![
                FileFormat::CsoundBatch,
                FileFormat::CsoundData,
                FileFormat::MidiFile
            ]
        );
        let csd = std::fs::read_to_string(paths.get(FileFormat::CsoundData))?;
        assert!(csd.starts_with("<CsoundSynthesizer>"));
        assert!(csd.contains("instr 3\n"));
        assert!(csd.contains("TI(t1)"));
        assert!(!csd.contains("TI(t2)"));
        let batch = std::fs::read_to_string(paths.get(FileFormat::CsoundBatch))?;
        assert!(batch.contains("csound -m2 -d -A -b1024 -B1024"));
        assert!(batch.contains("test.csd\""));

        // the midi file contains both textures
        let bytes = std::fs::read(paths.get(FileFormat::MidiFile))?;
        let smf = midly::Smf::parse(&bytes)?;
        assert_eq!(smf.tracks.len(), 3);
        Ok(())
    }

    #[test]
    fn external_score() -> anyhow::Result<()> {
        let mut texture = performed("t1", OrchestraKind::CsoundExternal, 12, &[0.5]);
        texture.events.events_mut()[0].aux = vec![Value::Number(2.0)];
        let settings = RenderSettings {
            event_mode: EventMode::CsoundExternal,
            ..RenderSettings::default()
        };
        let environment = environment("external");
        let paths = environment.path_map("test");
        let context = context(EngineKind::CsoundExternal, &settings, &environment, &paths);
        EngineCsoundExternal.write(&parts([&texture]), &[], &context)?;
        let score = std::fs::read_to_string(paths.get(FileFormat::CsoundScore))?;
        assert!(score.contains(";instrument timeStart timeSustain aux01 comment\n"));
        assert!(score.contains("i12  0.5          0.25         2.0         ;\n"));
        Ok(())
    }
}

//! Plain text engine: tab or space delimited event tables.

use crate::{event::Event, orchestra::Axis, performer::Part};

use super::{
    aux_count, format_comment, format_float, format_header, format_label, format_part_header,
    format_value, post_map, write_file, EngineContext, EngineKind, FileFormat, OutputEngine,
};

// -------------------------------------------------------------------------------------------------

const LABELS: [&str; 6] = [
    "instrument",
    "timeStart",
    "timeSustain",
    "amplitude",
    "midiNote",
    "panning",
];

fn row(part: &Part, event: &Event, delimiter: &str, context: &EngineContext) -> String {
    let mut values = vec![
        event.inst.to_string(),
        format_float(event.time, 8),
        format_float(event.sus, 8),
    ];
    for (axis, value) in [
        (Axis::Amp, event.amp),
        (Axis::Ps, event.ps),
        (Axis::Pan, event.pan),
    ] {
        values.push(format_float(post_map(context, part, axis, value), 6));
    }
    values.extend(event.aux.iter().map(|value| format_value(value, 6)));
    let mut row = String::new();
    for value in values {
        row.push_str(&value);
        row.push_str(delimiter);
    }
    row + &format_comment(&event.comment, "comment:")
}

/// Event tables of all parts, each with its own label.
fn table(kind: EngineKind, parts: &[Part], delimiter: &str, context: &EngineContext) -> String {
    let mut text = format_header(kind, context.orchestra.kind(), "");
    for part in parts {
        text.push_str(&format_part_header(part, ""));
        text.push_str(&format_label(&LABELS, aux_count(part), delimiter));
        text.push('\n');
        for event in part.events.iter().filter(|e| !e.is_rest()) {
            text.push_str(&row(part, event, delimiter, context));
        }
    }
    text
}

// -------------------------------------------------------------------------------------------------

/// Tab and space delimited text files.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineText;

impl OutputEngine for EngineText {
    fn kind(&self) -> EngineKind {
        EngineKind::Text
    }

    fn formats(&self) -> &'static [FileFormat] {
        &[FileFormat::TextTab, FileFormat::TextSpace]
    }

    fn min_formats(&self) -> &'static [FileFormat] {
        &[FileFormat::TextTab]
    }

    fn write(
        &self,
        parts: &[Part],
        request: &[FileFormat],
        context: &EngineContext,
    ) -> anyhow::Result<Vec<FileFormat>> {
        let mut written = Vec::new();
        for (format, delimiter) in [(FileFormat::TextTab, "\t"), (FileFormat::TextSpace, " ")] {
            if request.contains(&format) {
                let text = table(self.kind(), parts, delimiter, context);
                write_file(context.paths.get(format), text)?;
                written.push(format);
            }
        }
        Ok(written)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        engine::{render, test::performed, EventMode, RenderSettings},
        environment::Environment,
        orchestra::OrchestraKind,
        parameter::Value,
        performer::Performer,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn tables() -> anyhow::Result<()> {
        let mut texture = performed("t1", OrchestraKind::GeneralMidi, 0, &[0.0, 0.5]);
        for event in texture.events.events_mut() {
            event.aux = vec![Value::Number(1.0)];
            event.comment = vec!["x".to_string()];
        }
        let performer = Performer::from_textures(vec![texture]);
        let directory = std::env::temp_dir().join("athenacl-text");
        std::fs::create_dir_all(&directory)?;
        let settings = RenderSettings {
            event_mode: EventMode::Midi,
            ..RenderSettings::default()
        };
        let environment = Environment::new().with_output_directory(directory);
        let paths = environment.path_map("test");
        let written = render(
            &performer,
            &settings,
            &environment,
            &paths,
            &[FileFormat::TextSpace],
        );
        assert_eq!(
            written,
            vec![
                FileFormat::MidiFile,
                FileFormat::TextTab,
                FileFormat::TextSpace
            ]
        );
        let text = std::fs::read_to_string(paths.get(FileFormat::TextSpace))?;
        assert!(text.starts_with("athenacl "));
        assert!(text.contains("output generator: EngineText (orchestra: generalMidi)\n"));
        assert!(text.contains(
            "TM(LineGroove), TI(t1)\n\
            instrument timeStart timeSustain amplitude midiNote panning aux01 comment\n\
            0 0.0 0.25 114.0 60.0 64.0 1.0  comment: x\n\
            0 0.5 0.25 114.0 61.0 64.0 1.0  comment: x\n"
        ));
        let tab = std::fs::read_to_string(paths.get(FileFormat::TextTab))?;
        assert!(tab.contains("0\t0.5\t0.25\t114.0\t61.0\t64.0\t1.0\t comment: x\n"));
        Ok(())
    }
}

//! Audio file engine: mixes the amplitude streams of all parts into a 16 bit PCM file.
//!
//! Each event contributes a single sample: its amplitude, converted from the unit interval into
//! the signed sample range. Streams of all parts are summed sample by sample, starting at the
//! first sample, and are written to each channel. Rests are mixed in too.

use std::path::Path;

use anyhow::Context;
use num_traits::ToPrimitive;

use crate::{
    environment::{AudioConversion, AudioFormat},
    orchestra::Axis,
    performer::Part,
    unit::denorm,
};

use super::{write_file, EngineContext, EngineKind, FileFormat, OutputEngine};

// -------------------------------------------------------------------------------------------------

const MAX_SAMPLE: f64 = i16::MAX as f64;
const BITS_PER_SAMPLE: u16 = 16;

/// Convert unit interval values into signed samples.
pub fn convert(values: &[f64], conversion: AudioConversion) -> Vec<i32> {
    let to_int = |value: f64| value.round().to_i32().unwrap_or(0);
    match conversion {
        AudioConversion::Direct => values
            .iter()
            .map(|x| to_int(denorm(*x, -MAX_SAMPLE, MAX_SAMPLE)))
            .collect(),
        AudioConversion::Reflect | AudioConversion::Fold => {
            // the sign flips at each zero value
            let mut sign = 1;
            values
                .iter()
                .map(|x| {
                    let value = if conversion == AudioConversion::Reflect {
                        to_int(denorm(*x, 0.0, MAX_SAMPLE))
                    } else {
                        to_int(denorm(*x, -MAX_SAMPLE, MAX_SAMPLE)).abs()
                    };
                    if value == 0 {
                        sign = -sign;
                    }
                    value * sign
                })
                .collect()
        }
    }
}

/// Sum the converted amplitude streams of all parts into a single stream of samples.
fn mix(parts: &[Part], context: &EngineContext) -> Vec<i16> {
    let conversion = context.environment.audio_conversion();
    let mut mixed: Vec<i32> = Vec::new();
    for part in parts {
        let amps = part
            .events
            .iter()
            .map(|event| {
                context
                    .orchestra
                    .post_map(part.texture.instrument, Axis::Amp, event.amp, true)
            })
            .collect::<Vec<_>>();
        let samples = convert(&amps, conversion);
        if mixed.len() < samples.len() {
            mixed.resize(samples.len(), 0);
        }
        for (mixed, sample) in mixed.iter_mut().zip(samples) {
            *mixed += sample;
        }
    }
    mixed
        .into_iter()
        .map(|sample| sample.clamp(-(i16::MAX as i32), i16::MAX as i32) as i16)
        .collect()
}

// -------------------------------------------------------------------------------------------------

/// The 80 bit IEEE 754 extended representation of an integer sample rate.
fn extended_rate(rate: u32) -> [u8; 10] {
    let mut bytes = [0; 10];
    if rate == 0 {
        return bytes;
    }
    let exponent = 31 - rate.leading_zeros();
    let biased = (16383 + exponent) as u16;
    let mantissa = (rate as u64) << (63 - exponent);
    bytes[..2].copy_from_slice(&biased.to_be_bytes());
    bytes[2..].copy_from_slice(&mantissa.to_be_bytes());
    bytes
}

/// A 16 bit AIFF file with the given interleaved samples.
fn aiff_bytes(channels: u16, sample_rate: u32, samples: &[i16]) -> anyhow::Result<Vec<u8>> {
    let frames = u32::try_from(samples.len() / channels.max(1) as usize)?;
    let data_size = u32::try_from(samples.len() * 2)?;
    let ssnd_size = 8 + data_size;
    let form_size = 4 + (8 + 18) + (8 + ssnd_size);

    let mut bytes = Vec::with_capacity(form_size as usize + 8);
    bytes.extend_from_slice(b"FORM");
    bytes.extend_from_slice(&form_size.to_be_bytes());
    bytes.extend_from_slice(b"AIFF");

    bytes.extend_from_slice(b"COMM");
    bytes.extend_from_slice(&18u32.to_be_bytes());
    bytes.extend_from_slice(&channels.to_be_bytes());
    bytes.extend_from_slice(&frames.to_be_bytes());
    bytes.extend_from_slice(&BITS_PER_SAMPLE.to_be_bytes());
    bytes.extend_from_slice(&extended_rate(sample_rate));

    bytes.extend_from_slice(b"SSND");
    bytes.extend_from_slice(&ssnd_size.to_be_bytes());
    // offset and block size
    bytes.extend_from_slice(&[0; 8]);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_be_bytes());
    }
    Ok(bytes)
}

fn write_wav(path: &Path, channels: u16, sample_rate: u32, samples: &[i16]) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("failed to create wav file '{}'", path.display()))?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    Ok(())
}

// -------------------------------------------------------------------------------------------------

/// Audio files of mixed event amplitudes.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineAudioFile;

impl OutputEngine for EngineAudioFile {
    fn kind(&self) -> EngineKind {
        EngineKind::AudioFile
    }

    fn formats(&self) -> &'static [FileFormat] {
        &[FileFormat::AudioFile]
    }

    fn min_formats(&self) -> &'static [FileFormat] {
        &[FileFormat::AudioFile]
    }

    fn write(
        &self,
        parts: &[Part],
        _request: &[FileFormat],
        context: &EngineContext,
    ) -> anyhow::Result<Vec<FileFormat>> {
        let channels = u16::try_from(context.settings.audio_channels.max(1))?;
        let sample_rate = context.settings.audio_sample_rate;
        let samples = mix(parts, context)
            .into_iter()
            .flat_map(|sample| std::iter::repeat(sample).take(channels as usize))
            .collect::<Vec<_>>();
        let path = context.paths.get(FileFormat::AudioFile);
        match context.environment.audio_format() {
            AudioFormat::Aif => write_file(path, aiff_bytes(channels, sample_rate, &samples)?)?,
            AudioFormat::Wav => write_wav(path, channels, sample_rate, &samples)?,
        }
        Ok(vec![FileFormat::AudioFile])
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        engine::{test::performed, RenderSettings},
        environment::Environment,
        orchestra::OrchestraKind,
        performer::parts,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn conversions() {
        let values = [0.5, 1.0, 0.0, 0.25, 0.0, 1.0];
        assert_eq!(
            convert(&values, AudioConversion::Direct),
            vec![0, 32767, -32767, -16384, -32767, 32767]
        );
        assert_eq!(
            convert(&values, AudioConversion::Reflect),
            vec![16384, 32767, 0, -8192, 0, 32767]
        );
        assert_eq!(
            convert(&values, AudioConversion::Fold),
            vec![0, -32767, -32767, -16384, -32767, -32767]
        );
    }

    #[test]
    fn aiff_header() -> anyhow::Result<()> {
        assert_eq!(
            extended_rate(44100),
            [0x40, 0x0E, 0xAC, 0x44, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(
            extended_rate(48000),
            [0x40, 0x0E, 0xBB, 0x80, 0, 0, 0, 0, 0, 0]
        );
        let bytes = aiff_bytes(2, 44100, &[1, 1, -2, -2])?;
        assert_eq!(bytes.len(), 12 + 26 + 16 + 8);
        assert_eq!(&bytes[..4], b"FORM");
        assert_eq!(&bytes[4..8], &(bytes.len() as u32 - 8).to_be_bytes());
        assert_eq!(&bytes[8..12], b"AIFF");
        assert_eq!(&bytes[12..16], b"COMM");
        // channels and frames
        assert_eq!(&bytes[20..26], &[0, 2, 0, 0, 0, 2]);
        assert_eq!(&bytes[38..42], b"SSND");
        assert_eq!(&bytes[bytes.len() - 4..], &[0xFF, 0xFE, 0xFF, 0xFE]);
        Ok(())
    }

    #[test]
    fn mixed_wav() -> anyhow::Result<()> {
        let mut t1 = performed("t1", OrchestraKind::GeneralMidi, 0, &[0.0, 1.0, 2.0]);
        let mut t2 = performed("t2", OrchestraKind::CsoundNative, 3, &[0.0, 1.0]);
        for (i, event) in t1.events.events_mut().iter_mut().enumerate() {
            event.amp = [1.0, 0.75, 0.5][i];
        }
        for event in t2.events.events_mut() {
            event.amp = 1.0;
        }
        // rests are mixed too
        t2.events.events_mut()[1].acc = 0.0;

        let directory = std::env::temp_dir().join("athenacl-audio");
        std::fs::create_dir_all(&directory)?;
        let settings = RenderSettings::default();
        let environment = Environment::new()
            .with_output_directory(directory)
            .with_audio_format(AudioFormat::Wav);
        let paths = environment.path_map("test");
        let context = EngineContext {
            orchestra: OrchestraKind::Generic.orchestra(),
            settings: &settings,
            environment: &environment,
            paths: &paths,
        };
        let written = EngineAudioFile.write(&parts([&t1, &t2]), &[], &context)?;
        assert_eq!(written, vec![FileFormat::AudioFile]);

        let mut reader = hound::WavReader::open(paths.get(FileFormat::AudioFile))?;
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 44100);
        let samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
        assert_eq!(samples, vec![32767, 32767, 32767, 32767, 0, 0]);
        Ok(())
    }
}

//! Flattens textures and clones into scored event sequences, the sole input of output engines.

use std::path::PathBuf;

use crate::{
    clone::TextureClone, event::EventSequence, orchestra::OrchestraKind, path::Path,
    texture::ModuleKind, texture::Texture,
};

// -------------------------------------------------------------------------------------------------

/// Scored events of a clone.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformedClone {
    pub name: String,
    pub events: EventSequence,
    pub mute: bool,
}

/// Scored events and output settings of a texture, with the events of its clones.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformedTexture {
    pub name: String,
    pub module: ModuleKind,
    pub events: EventSequence,
    pub mute: bool,
    pub instrument: usize,
    pub orchestra: OrchestraKind,
    pub midi_channel: Option<u8>,
    pub midi_program: u8,
    pub orc_map_mode: bool,
    pub clones: Vec<PerformedClone>,
}

/// A non-muted, non-empty event sequence of a texture or one of its clones.
#[derive(Debug, Clone, Copy)]
pub struct Part<'a> {
    pub texture: &'a PerformedTexture,
    pub clone: Option<&'a str>,
    pub events: &'a EventSequence,
}

impl Part<'_> {
    /// Texture name, joined with the clone name for clones.
    pub fn name(&self) -> String {
        match self.clone {
            Some(clone) => format!("{}-{}", self.texture.name, clone),
            None => self.texture.name.clone(),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// All textures and clones of a composition, scored and sorted, in texture load order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Performer {
    textures: Vec<PerformedTexture>,
}

impl Performer {
    /// Score all textures and their clones. Textures or clones which fail to score, or which
    /// score no events, are logged and skipped.
    pub fn flatten(
        paths: &[Path],
        textures: &mut [Texture],
        clones: &mut [TextureClone],
        audio_dirs: &[PathBuf],
    ) -> Self {
        let mut performed = Vec::with_capacity(textures.len());
        for texture in textures.iter_mut() {
            let Some(path) = paths.iter().find(|p| p.name() == texture.path()) else {
                log::warn!(
                    "texture {}: path '{}' does not exist, skipping",
                    texture.name(),
                    texture.path()
                );
                continue;
            };
            let mut events = match texture.score(path, audio_dirs) {
                Ok(events) if !events.is_empty() => events,
                Ok(_) => {
                    log::warn!("texture {}: scored no events, skipping", texture.name());
                    continue;
                }
                Err(err) => {
                    log::warn!("texture {}: failed to score: {err}", texture.name());
                    continue;
                }
            };
            events.sort();
            let mut performed_clones = Vec::new();
            for clone in clones
                .iter_mut()
                .filter(|clone| clone.texture() == texture.name())
            {
                match clone.score(&events) {
                    Ok(mut clone_events) if !clone_events.is_empty() => {
                        clone_events.sort();
                        performed_clones.push(PerformedClone {
                            name: clone.name().to_string(),
                            events: clone_events,
                            mute: clone.is_muted(),
                        });
                    }
                    Ok(_) => log::warn!(
                        "clone {} of texture {}: scored no events, skipping",
                        clone.name(),
                        texture.name()
                    ),
                    Err(err) => log::warn!(
                        "clone {} of texture {}: failed to score: {err}",
                        clone.name(),
                        texture.name()
                    ),
                }
            }
            performed.push(PerformedTexture {
                name: texture.name().to_string(),
                module: texture.module(),
                events,
                mute: texture.is_muted(),
                instrument: texture.instrument(),
                orchestra: texture.orchestra(),
                midi_channel: texture.midi_channel(),
                midi_program: texture.midi_program(),
                orc_map_mode: texture.orc_map_mode(),
                clones: performed_clones,
            });
        }
        Self {
            textures: performed,
        }
    }

    /// Create a performance from already scored textures.
    pub fn from_textures(textures: Vec<PerformedTexture>) -> Self {
        Self { textures }
    }

    pub fn textures(&self) -> &[PerformedTexture] {
        &self.textures
    }

    pub fn get(&self, name: &str) -> Option<&PerformedTexture> {
        self.textures.iter().find(|t| t.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Total number of events of all non-muted textures and clones.
    pub fn event_count(&self) -> usize {
        parts(self.textures.iter())
            .iter()
            .map(|part| part.events.len())
            .sum()
    }
}

// -------------------------------------------------------------------------------------------------

/// Non-muted, non-empty parts of the given textures: each texture followed by its clones.
pub fn parts<'a, I>(textures: I) -> Vec<Part<'a>>
where
    I: IntoIterator<Item = &'a PerformedTexture>,
{
    let mut parts = Vec::new();
    for texture in textures {
        if !texture.mute && !texture.events.is_empty() {
            parts.push(Part {
                texture,
                clone: None,
                events: &texture.events,
            });
        }
        for clone in &texture.clones {
            if !clone.mute && !clone.events.is_empty() {
                parts.push(Part {
                    texture,
                    clone: Some(&clone.name),
                    events: &clone.events,
                });
            }
        }
    }
    parts
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{error::Result, parameter::Arg};
    use pretty_assertions::assert_eq;

    fn texture(name: &str, path: &str) -> Result<Texture> {
        let mut texture = Texture::new(
            name,
            ModuleKind::LineGroove,
            path,
            OrchestraKind::GeneralMidi,
            0,
            1,
        )?;
        texture.edit("tRange", &Arg::parse("0, 2")?)?;
        texture.edit("beatT", &Arg::parse("c, 60")?)?;
        texture.edit("rhythmQ", &Arg::parse("pt, (c, 1), (c, 1), (c, 1)")?)?;
        Ok(texture)
    }

    #[test]
    fn flatten() -> Result<()> {
        let paths = vec![Path::from_strings("a", &["c4,e4"])?];
        let mut textures = vec![
            texture("t1", "a")?,
            texture("t2", "missing")?,
            texture("t3", "a")?,
        ];
        textures[2].set_mute(true);
        let mut clones = vec![
            TextureClone::new("c1", "t1", 0, 2)?,
            TextureClone::new("c2", "t3", 0, 3)?,
        ];
        clones[0].edit("time", &Arg::parse("fa, (c, 10)")?)?;
        let performer = Performer::flatten(&paths, &mut textures, &mut clones, &[]);

        let names = performer
            .textures()
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["t1", "t3"]);
        let t1 = performer.get("t1").map(|t| t.events.len());
        assert_eq!(t1, Some(2));
        assert_eq!(
            performer.get("t1").map(|t| t.clones[0].events.get_array(
                crate::event::EventField::Time
            )),
            Some(vec![10.0, 11.0])
        );

        // the muted texture is kept, but only its clone is a part
        let parts = parts(performer.textures());
        let part_names = parts.iter().map(Part::name).collect::<Vec<_>>();
        assert_eq!(part_names, vec!["t1", "t1-c1", "t3-c2"]);
        assert_eq!(performer.event_count(), 6);
        Ok(())
    }

    #[test]
    fn deterministic() -> Result<()> {
        let paths = vec![Path::from_strings("a", &["c4,e4,g4"])?];
        let mut textures = vec![texture("t1", "a")?];
        textures[0].edit("ampQ", &Arg::parse("ru, 0, 1")?)?;
        let mut clones = vec![TextureClone::new("c1", "t1", 0, 2)?];
        let first = Performer::flatten(&paths, &mut textures, &mut clones, &[]);
        let second = Performer::flatten(&paths, &mut textures, &mut clones, &[]);
        assert_eq!(first, second);
        Ok(())
    }
}

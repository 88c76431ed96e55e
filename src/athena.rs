//! The composition store: paths, textures and clones, session settings, and persistence.

use serde::{Deserialize, Serialize};

use crate::{
    clone::{CloneData, TextureClone},
    engine::{self, EventMode, FileFormat, RenderSettings},
    environment::Environment,
    error::{Error, Result},
    orchestra::OrchestraKind,
    parameter::Arg,
    path::Path,
    performer::Performer,
    random::derive_seed,
    texture::{validate_name, ModuleKind, Texture, TextureData},
};

// -------------------------------------------------------------------------------------------------

/// Version of the project file format.
pub const PROJECT_VERSION: u32 = 1;

/// Edits of a path's multisets or settings. See the [`Path`] functions of the same names.
#[derive(Debug, Clone, PartialEq)]
pub enum PathEdit {
    Field(f64),
    Octave(f64),
    DurationFractions(Vec<f64>),
    /// Transpose a single multiset or, without an index, all of them.
    Transpose { value: f64, index: Option<usize> },
    /// Invert a single multiset or, without an index, all of them.
    Invert { index: Option<usize> },
    Retrograde,
    Rotate(usize),
    Slice { start: usize, end: usize },
}

impl PathEdit {
    fn apply(&self, path: &mut Path) -> Result<()> {
        match self {
            Self::Field(field) => path.set_field(*field),
            Self::Octave(octave) => path.set_octave(*octave),
            Self::DurationFractions(fractions) => path.set_duration_fractions(fractions)?,
            Self::Transpose { value, index } => path.transpose(*value, *index)?,
            Self::Invert { index } => path.invert(*index)?,
            Self::Retrograde => path.retrograde(),
            Self::Rotate(new_zero) => path.rotate(*new_zero)?,
            Self::Slice { start, end } => path.slice(*start, *end)?,
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// Owns all paths, textures and clones of a composition. Textures refer to paths and clones
/// refer to textures by name only.
#[derive(Debug, Clone)]
pub struct AthenaObject {
    seed: u64,
    seed_counter: u64,
    author: String,
    title: String,
    tni_mode: bool,
    settings: RenderSettings,
    paths: Vec<Path>,
    textures: Vec<Texture>,
    clones: Vec<TextureClone>,
}

impl Default for AthenaObject {
    fn default() -> Self {
        Self::new(0)
    }
}

impl AthenaObject {
    /// Create an empty composition. All textures and clones get seeds derived from the
    /// given seed, in creation order.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            seed_counter: 0,
            author: String::new(),
            title: String::new(),
            tni_mode: true,
            settings: RenderSettings::default(),
            paths: Vec::new(),
            textures: Vec::new(),
            clones: Vec::new(),
        }
    }

    /// Create an empty composition which uses the environment's seed.
    pub fn from_environment(environment: &mut Environment) -> Self {
        Self::new(environment.seed())
    }

    fn next_seed(&mut self) -> u64 {
        self.seed_counter += 1;
        derive_seed(self.seed, self.seed_counter)
    }

    // ---------------------------------------------------------------------------------------------

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn set_author<S: Into<String>>(&mut self, author: S) {
        self.author = author.into();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title<S: Into<String>>(&mut self, title: S) {
        self.title = title.into();
    }

    /// When set, set classes are identified with inversion equivalence.
    pub fn tni_mode(&self) -> bool {
        self.tni_mode
    }

    pub fn set_tni_mode(&mut self, tni_mode: bool) {
        self.tni_mode = tni_mode;
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn event_mode(&self) -> EventMode {
        self.settings.event_mode
    }

    /// Set the event mode. New textures use the mode's orchestra, existing ones are kept.
    pub fn set_event_mode(&mut self, event_mode: EventMode) {
        self.settings.event_mode = event_mode;
    }

    pub fn set_midi_tempo(&mut self, tempo: f64) -> Result<()> {
        if !tempo.is_finite() || tempo <= 0.0 {
            return Err(Error::Argument(format!(
                "MIDI tempo must be positive, got {tempo}"
            )));
        }
        self.settings.midi_tempo = tempo;
        Ok(())
    }

    /// Set channel count and sample rate of written audio and Csound orchestras.
    pub fn set_audio(&mut self, channels: usize, sample_rate: u32) -> Result<()> {
        if !(1..=8).contains(&channels) {
            return Err(Error::Argument(format!(
                "audio channels must be within 1 and 8, got {channels}"
            )));
        }
        if sample_rate == 0 {
            return Err(Error::Argument("sample rate must be positive".to_string()));
        }
        self.settings.audio_channels = channels;
        self.settings.audio_sample_rate = sample_rate;
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn path(&self, name: &str) -> Option<&Path> {
        self.paths.iter().find(|p| p.name() == name)
    }

    fn path_index(&self, name: &str) -> Result<usize> {
        self.paths
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| Error::Path(format!("no path named '{name}'")))
    }

    fn check_new_path_name(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.path(name).is_some() {
            return Err(Error::Path(format!("a path named '{name}' already exists")));
        }
        Ok(())
    }

    /// Create a path from multiset strings, e.g. `"3-4"`, `"c4,e4,g4"` or `"0,4,7"`.
    pub fn path_new(&mut self, name: &str, multisets: &[&str]) -> Result<()> {
        self.check_new_path_name(name)?;
        if multisets.is_empty() {
            return Err(Error::Path(format!("path '{name}' needs at least one multiset")));
        }
        self.paths.push(Path::from_strings(name, multisets)?);
        Ok(())
    }

    pub fn path_copy(&mut self, source: &str, name: &str) -> Result<()> {
        self.check_new_path_name(name)?;
        let copy = self.paths[self.path_index(source)?].copy_as(name);
        self.paths.push(copy);
        Ok(())
    }

    /// Rename a path. Textures which refer to the path follow the new name.
    pub fn path_rename(&mut self, name: &str, new_name: &str) -> Result<()> {
        let index = self.path_index(name)?;
        self.check_new_path_name(new_name)?;
        self.paths[index].set_name(new_name);
        for texture in self.textures.iter_mut().filter(|t| t.path() == name) {
            texture.set_path(new_name);
        }
        Ok(())
    }

    /// Remove a path. Fails while textures refer to it.
    pub fn path_remove(&mut self, name: &str) -> Result<()> {
        let index = self.path_index(name)?;
        let users = self
            .textures
            .iter()
            .filter(|t| t.path() == name)
            .map(|t| t.name())
            .collect::<Vec<_>>();
        if !users.is_empty() {
            return Err(Error::Path(format!(
                "path '{name}' is used by texture(s) {}",
                users.join(", ")
            )));
        }
        self.paths.remove(index);
        Ok(())
    }

    /// Apply an edit to a path. The path is unchanged when the edit fails.
    pub fn path_edit(&mut self, name: &str, edit: &PathEdit) -> Result<()> {
        let index = self.path_index(name)?;
        let mut path = self.paths[index].clone();
        edit.apply(&mut path)?;
        self.paths[index] = path;
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------

    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    pub fn texture(&self, name: &str) -> Option<&Texture> {
        self.textures.iter().find(|t| t.name() == name)
    }

    fn texture_index(&self, name: &str) -> Result<usize> {
        self.textures
            .iter()
            .position(|t| t.name() == name)
            .ok_or_else(|| Error::Texture(format!("no texture named '{name}'")))
    }

    fn check_new_texture_name(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.texture(name).is_some() {
            return Err(Error::Texture(format!(
                "a texture named '{name}' already exists"
            )));
        }
        Ok(())
    }

    /// Create a texture with default parameters, using the event mode's orchestra and
    /// default instrument.
    pub fn texture_new(&mut self, name: &str, module: ModuleKind, path: &str) -> Result<()> {
        self.check_new_texture_name(name)?;
        self.path_index(path)?;
        let mode = self.settings.event_mode;
        let seed = self.next_seed();
        let texture = Texture::new(
            name,
            module,
            path,
            mode.orchestra(),
            mode.default_instrument(),
            seed,
        )?;
        self.textures.push(texture);
        Ok(())
    }

    /// Copy a texture together with its clones.
    pub fn texture_copy(&mut self, source: &str, name: &str) -> Result<()> {
        self.check_new_texture_name(name)?;
        let texture = self.textures[self.texture_index(source)?].copy_as(name)?;
        let mut clones = Vec::new();
        for clone in self.clones.iter().filter(|c| c.texture() == source) {
            let mut clone = clone.clone();
            clone.set_texture(name);
            clones.push(clone);
        }
        self.textures.push(texture);
        self.clones.extend(clones);
        Ok(())
    }

    /// Rename a texture. Its clones follow the new name.
    pub fn texture_rename(&mut self, name: &str, new_name: &str) -> Result<()> {
        let index = self.texture_index(name)?;
        self.check_new_texture_name(new_name)?;
        self.textures[index].set_name(new_name)?;
        for clone in self.clones.iter_mut().filter(|c| c.texture() == name) {
            clone.set_texture(new_name);
        }
        Ok(())
    }

    /// Remove a texture and its clones.
    pub fn texture_remove(&mut self, name: &str) -> Result<()> {
        let index = self.texture_index(name)?;
        self.textures.remove(index);
        self.clones.retain(|c| c.texture() != name);
        Ok(())
    }

    /// Edit a texture attribute with a parameter object argument string, e.g.
    /// `texture_edit("t1", "ampQ", "ru, .2, .8")`. The texture is unchanged on errors.
    pub fn texture_edit(&mut self, name: &str, attribute: &str, args: &str) -> Result<()> {
        let arg = Arg::parse(args).map_err(|err| err.with_context(attribute))?;
        self.texture_edit_arg(name, attribute, &arg)
    }

    /// Edit a texture attribute with an argument tree. The texture is unchanged on errors.
    pub fn texture_edit_arg(&mut self, name: &str, attribute: &str, arg: &Arg) -> Result<()> {
        let index = self.texture_index(name)?;
        let mut texture = self.textures[index].clone();
        texture.edit(attribute, arg)?;
        self.textures[index] = texture;
        Ok(())
    }

    /// Point a texture to another path.
    pub fn texture_set_path(&mut self, name: &str, path: &str) -> Result<()> {
        self.path_index(path)?;
        let index = self.texture_index(name)?;
        self.textures[index].set_path(path);
        Ok(())
    }

    /// Change a texture's orchestra and instrument. Auxiliary parameters of the texture and
    /// its clones are resized to the instrument's count.
    pub fn texture_set_instrument(
        &mut self,
        name: &str,
        orchestra: OrchestraKind,
        instrument: usize,
        aux_count: Option<usize>,
    ) -> Result<()> {
        let index = self.texture_index(name)?;
        let mut texture = self.textures[index].clone();
        texture.set_instrument(orchestra, instrument, aux_count)?;
        let aux_count = texture.aux_count();
        self.textures[index] = texture;
        for clone in self.clones.iter_mut().filter(|c| c.texture() == name) {
            clone.set_aux_count(aux_count);
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------

    pub fn clones(&self) -> &[TextureClone] {
        &self.clones
    }

    /// Clones of the given texture.
    pub fn clones_of<'a>(&'a self, texture: &'a str) -> impl Iterator<Item = &'a TextureClone> {
        self.clones.iter().filter(move |c| c.texture() == texture)
    }

    pub fn texture_clone(&self, texture: &str, name: &str) -> Option<&TextureClone> {
        self.clones
            .iter()
            .find(|c| c.texture() == texture && c.name() == name)
    }

    fn clone_index(&self, texture: &str, name: &str) -> Result<usize> {
        self.clones
            .iter()
            .position(|c| c.texture() == texture && c.name() == name)
            .ok_or_else(|| {
                Error::Clone(format!("texture '{texture}' has no clone named '{name}'"))
            })
    }

    fn check_new_clone_name(&self, texture: &str, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.texture_clone(texture, name).is_some() {
            return Err(Error::Clone(format!(
                "texture '{texture}' already has a clone named '{name}'"
            )));
        }
        Ok(())
    }

    /// Create a bypassing clone of a texture.
    pub fn clone_new(&mut self, texture: &str, name: &str) -> Result<()> {
        let aux_count = self.textures[self.texture_index(texture)?].aux_count();
        self.check_new_clone_name(texture, name)?;
        let seed = self.next_seed();
        self.clones
            .push(TextureClone::new(name, texture, aux_count, seed)?);
        Ok(())
    }

    pub fn clone_copy(&mut self, texture: &str, source: &str, name: &str) -> Result<()> {
        let index = self.clone_index(texture, source)?;
        self.check_new_clone_name(texture, name)?;
        let copy = self.clones[index].copy_as(name)?;
        self.clones.push(copy);
        Ok(())
    }

    pub fn clone_rename(&mut self, texture: &str, name: &str, new_name: &str) -> Result<()> {
        let index = self.clone_index(texture, name)?;
        self.check_new_clone_name(texture, new_name)?;
        self.clones[index].set_name(new_name)
    }

    pub fn clone_remove(&mut self, texture: &str, name: &str) -> Result<()> {
        let index = self.clone_index(texture, name)?;
        self.clones.remove(index);
        Ok(())
    }

    /// Edit a clone attribute with a parameter object argument string, e.g.
    /// `clone_edit("t1", "c1", "time", "fa, (c, 2)")`. The clone is unchanged on errors.
    pub fn clone_edit(
        &mut self,
        texture: &str,
        name: &str,
        attribute: &str,
        args: &str,
    ) -> Result<()> {
        let index = self.clone_index(texture, name)?;
        let arg = Arg::parse(args).map_err(|err| err.with_context(attribute))?;
        let mut clone = self.clones[index].clone();
        clone.edit(attribute, &arg)?;
        self.clones[index] = clone;
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------

    /// Score all textures and clones.
    pub fn perform(&mut self, environment: &Environment) -> Performer {
        Performer::flatten(
            &self.paths,
            &mut self.textures,
            &mut self.clones,
            environment.audio_directories(),
        )
    }

    /// Score all textures and clones, then write them with the engines the event mode and
    /// requested formats need. Returns the written formats.
    pub fn render(&mut self, environment: &Environment, request: &[FileFormat]) -> Vec<FileFormat> {
        let performer = self.perform(environment);
        if performer.is_empty() {
            log::warn!("no textures to render");
            return Vec::new();
        }
        let paths = environment.path_map(environment.file_stem());
        engine::render(&performer, &self.settings, environment, &paths, request)
    }

    // ---------------------------------------------------------------------------------------------

    fn to_data(&self) -> ProjectData {
        ProjectData {
            version: PROJECT_VERSION,
            author: self.author.clone(),
            title: self.title.clone(),
            tni_mode: self.tni_mode,
            event_mode: self.settings.event_mode.name().to_string(),
            midi_tempo: self.settings.midi_tempo,
            audio_channels: self.settings.audio_channels,
            audio_sample_rate: self.settings.audio_sample_rate,
            seed: self.seed,
            seed_counter: self.seed_counter,
            paths: self.paths.clone(),
            textures: self.textures.iter().map(Texture::to_data).collect(),
            clones: self.clones.iter().map(TextureClone::to_data).collect(),
        }
    }

    fn from_data(data: ProjectData) -> Result<Self> {
        if data.version > PROJECT_VERSION {
            return Err(Error::Argument(format!(
                "unsupported project version {}",
                data.version
            )));
        }
        let event_mode =
            EventMode::try_from(data.event_mode.as_str()).map_err(Error::Argument)?;
        let mut project = Self::new(data.seed);
        project.seed_counter = data.seed_counter;
        project.author = data.author;
        project.title = data.title;
        project.tni_mode = data.tni_mode;
        project.set_event_mode(event_mode);
        project.set_midi_tempo(data.midi_tempo)?;
        project.set_audio(data.audio_channels, data.audio_sample_rate)?;
        project.paths = data.paths;
        project.textures = data
            .textures
            .iter()
            .map(Texture::from_data)
            .collect::<Result<_>>()?;
        project.clones = data
            .clones
            .iter()
            .map(TextureClone::from_data)
            .collect::<Result<_>>()?;
        Ok(project)
    }

    /// Serialize the composition into a JSON project document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_data())?)
    }

    /// Restore a composition from a JSON project document.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_data(serde_json::from_str(json)?)
    }

    pub fn save<P: AsRef<std::path::Path>>(&self, file: P) -> Result<()> {
        std::fs::write(file.as_ref(), self.to_json()?)?;
        log::info!("saved project to '{}'", file.as_ref().display());
        Ok(())
    }

    pub fn load<P: AsRef<std::path::Path>>(file: P) -> Result<Self> {
        let json = std::fs::read_to_string(file.as_ref())?;
        Self::from_json(&json)
    }
}

// -------------------------------------------------------------------------------------------------

/// Serialized form of an [`AthenaObject`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ProjectData {
    version: u32,
    author: String,
    title: String,
    tni_mode: bool,
    event_mode: String,
    midi_tempo: f64,
    audio_channels: usize,
    audio_sample_rate: u32,
    seed: u64,
    #[serde(default)]
    seed_counter: u64,
    paths: Vec<Path>,
    textures: Vec<TextureData>,
    clones: Vec<CloneData>,
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::EventField;
    use pretty_assertions::assert_eq;

    fn project() -> Result<AthenaObject> {
        let mut ao = AthenaObject::new(42);
        ao.set_event_mode(EventMode::Midi);
        ao.path_new("a", &["3-4"])?;
        ao.texture_new("t1", ModuleKind::LineGroove, "a")?;
        ao.texture_edit("t1", "tRange", "0, 2")?;
        ao.texture_edit("t1", "rhythmQ", "pt, (c, 4), (c, 1), (c, 1)")?;
        ao.texture_edit("t1", "ampQ", "ru, .5, 1")?;
        ao.clone_new("t1", "c1")?;
        ao.clone_edit("t1", "c1", "time", "fa, (c, 10)")?;
        Ok(ao)
    }

    #[test]
    fn paths() -> Result<()> {
        let mut ao = project()?;
        assert!(ao.path_new("a", &["c4"]).is_err());
        assert!(ao.path_new("b", &[]).is_err());
        ao.path_copy("a", "b")?;
        ao.path_rename("a", "c")?;
        assert_eq!(ao.texture("t1").map(|t| t.path()), Some("c"));
        assert!(ao.path_remove("c").is_err());
        ao.path_remove("b")?;
        assert_eq!(ao.paths().len(), 1);

        ao.path_edit("c", &PathEdit::Transpose { value: 2.0, index: None })?;
        assert_eq!(
            ao.path("c").map(|p| p.pitch_space()),
            Some(vec![vec![2.0, 3.0, 7.0]])
        );
        ao.path_edit("c", &PathEdit::Field(12.0))?;
        assert_eq!(ao.path("c").map(|p| p.field()), Some(12.0));
        // failed edits keep the path unchanged
        let before = ao.path("c").cloned();
        assert!(ao.path_edit("c", &PathEdit::Rotate(3)).is_err());
        assert_eq!(ao.path("c").cloned(), before);
        Ok(())
    }

    #[test]
    fn textures_and_clones() -> Result<()> {
        let mut ao = project()?;
        assert!(ao.texture_new("t2", ModuleKind::LineGroove, "missing").is_err());
        assert_eq!(ao.texture("t1").map(|t| t.orchestra()), Some(OrchestraKind::GeneralMidi));

        // edits are transactional
        let before = ao.texture("t1").map(|t| t.parameters());
        assert!(ao.texture_edit("t1", "ampQ", "nope, 1").is_err());
        assert!(ao.texture_edit("t1", "auxQ9", "c, 1").is_err());
        assert_eq!(ao.texture("t1").map(|t| t.parameters()), before);

        ao.texture_copy("t1", "t2")?;
        assert!(ao.texture_clone("t2", "c1").is_some());
        ao.texture_rename("t2", "t3")?;
        assert!(ao.texture_clone("t3", "c1").is_some());
        assert!(ao.texture_clone("t2", "c1").is_none());
        ao.texture_remove("t3")?;
        assert_eq!(ao.clones().len(), 1);

        ao.texture_set_instrument("t1", OrchestraKind::CsoundNative, 6, None)?;
        assert_eq!(ao.texture("t1").map(|t| t.aux_count()), Some(4));
        assert_eq!(ao.texture_clone("t1", "c1").map(|c| c.aux_count()), Some(4));
        assert!(ao
            .texture_set_instrument("t1", OrchestraKind::CsoundNative, 1000, None)
            .is_err());

        ao.clone_copy("t1", "c1", "c2")?;
        ao.clone_rename("t1", "c2", "c3")?;
        assert!(ao.clone_new("t1", "c3").is_err());
        ao.clone_remove("t1", "c3")?;
        assert_eq!(ao.clones_of("t1").count(), 1);
        Ok(())
    }

    #[test]
    fn settings() -> Result<()> {
        let mut ao = AthenaObject::new(1);
        assert!(ao.set_midi_tempo(0.0).is_err());
        ao.set_midi_tempo(90.0)?;
        assert!(ao.set_audio(0, 44100).is_err());
        ao.set_audio(1, 48000)?;
        assert_eq!(ao.settings().audio_sample_rate, 48000);
        ao.set_event_mode(EventMode::CsoundSilence);
        ao.path_new("a", &["c4"])?;
        ao.texture_new("t1", ModuleKind::LineGroove, "a")?;
        assert_eq!(
            ao.texture("t1").map(|t| (t.orchestra(), t.aux_count())),
            Some((OrchestraKind::CsoundSilence, 4))
        );
        Ok(())
    }

    #[test]
    fn round_trip() -> Result<()> {
        let mut ao = project()?;
        ao.set_author("someone");
        let environment = Environment::new();
        let json = ao.to_json()?;
        let mut restored = AthenaObject::from_json(&json)?;
        assert_eq!(restored.author(), "someone");
        assert_eq!(restored.event_mode(), EventMode::Midi);
        assert_eq!(ao.perform(&environment), restored.perform(&environment));

        let performer = restored.perform(&environment);
        let texture = performer.get("t1").ok_or(Error::Texture("missing".into()))?;
        let times = texture.events.get_array(EventField::Time);
        assert!(!times.is_empty());
        assert_eq!(
            texture.clones[0].events.get_array(EventField::Time),
            times.iter().map(|t| t + 10.0).collect::<Vec<_>>()
        );
        Ok(())
    }
}

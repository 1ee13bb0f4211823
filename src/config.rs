use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::audio::bands::{Band, DEFAULT_BANDS};
use crate::error::{LevelsError, Result};

/// Everything one run needs, with the defaults the game's data files were
/// originally produced with.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelsConfig {
    pub song_name: String,
    pub input_extension: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub table_name: String,
    pub bands: Vec<Band>,
    pub transform_size: usize,
    pub hop_size: usize,
    pub scale_min: f64,
    pub scale_max: f64,
    pub decimal_places: u32,
    pub values_per_line: usize,
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            song_name: "The American Civil War".into(),
            input_extension: "ogg".into(),
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            table_name: "tblSong".into(),
            bands: DEFAULT_BANDS.to_vec(),
            transform_size: 2048,
            hop_size: 4800,
            scale_min: 0.0,
            scale_max: 32.0,
            decimal_places: 0,
            values_per_line: 60,
        }
    }
}

impl LevelsConfig {
    pub fn input_path(&self) -> PathBuf {
        self.input_dir
            .join(format!("{}.{}", self.song_name, self.input_extension))
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_data.lua", self.song_name))
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(LevelsError::InvalidConfig(msg));

        if self.song_name.trim().is_empty() {
            return invalid("song name is empty".into());
        }
        if self.bands.is_empty() {
            return invalid("at least one band is required".into());
        }
        for (i, band) in self.bands.iter().enumerate() {
            if !band.low_hz.is_finite() || !band.high_hz.is_finite() {
                return invalid(format!("band {} has a non-finite edge", i + 1));
            }
            if band.low_hz < 0.0 || band.low_hz > band.high_hz {
                return invalid(format!(
                    "band {} must satisfy 0 <= low <= high, got {}-{} Hz",
                    i + 1,
                    band.low_hz,
                    band.high_hz
                ));
            }
        }
        if self.transform_size < 2 {
            return invalid(format!("transform size {} is too small", self.transform_size));
        }
        if self.hop_size == 0 {
            return invalid("hop size must be positive".into());
        }
        if !(self.scale_max > self.scale_min) {
            return invalid(format!(
                "scale range [{}, {}] is empty",
                self.scale_min, self.scale_max
            ));
        }
        if self.values_per_line == 0 {
            return invalid("values per line must be at least 1".into());
        }
        if !is_lua_identifier(&self.table_name) {
            return invalid(format!(
                "table name '{}' is not a Lua identifier",
                self.table_name
            ));
        }
        Ok(())
    }

    pub fn apply_file(&mut self, file: FileConfig) {
        let FileConfig {
            input,
            output,
            analysis,
            scale,
        } = file;

        if let Some(v) = input.song_name { self.song_name = v; }
        if let Some(v) = input.extension { self.input_extension = v; }
        if let Some(v) = input.dir { self.input_dir = v; }
        if let Some(v) = output.dir { self.output_dir = v; }
        if let Some(v) = output.table_name { self.table_name = v; }
        if let Some(v) = output.values_per_line { self.values_per_line = v; }
        if let Some(v) = analysis.transform_size { self.transform_size = v; }
        if let Some(v) = analysis.hop_size { self.hop_size = v; }
        if let Some(v) = analysis.bands { self.bands = v; }
        if let Some(v) = scale.min { self.scale_min = v; }
        if let Some(v) = scale.max { self.scale_max = v; }
        if let Some(v) = scale.decimal_places { self.decimal_places = v; }
    }
}

const LUA_KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if",
    "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

fn is_lua_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !LUA_KEYWORDS.contains(&name)
}

/// On-disk TOML config; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub input: InputSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub analysis: AnalysisSection,
    #[serde(default)]
    pub scale: ScaleSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSection {
    pub song_name: Option<String>,
    pub extension: Option<String>,
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    pub dir: Option<PathBuf>,
    pub table_name: Option<String>,
    pub values_per_line: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisSection {
    pub transform_size: Option<usize>,
    pub hop_size: Option<usize>,
    pub bands: Option<Vec<Band>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScaleSection {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub decimal_places: Option<u32>,
}

pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        LevelsError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_config(&content)
        .map_err(|e| LevelsError::InvalidConfig(format!("{}: {}", path.display(), e)))
}

fn parse_config(content: &str) -> std::result::Result<FileConfig, toml::de::Error> {
    toml::from_str(content)
}

/// `./lualevels.toml`, then `~/.config/lualevels/config.toml`, then the
/// platform config directory.
pub fn discover_config() -> Option<PathBuf> {
    let local = PathBuf::from("lualevels.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("lualevels").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("lualevels").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

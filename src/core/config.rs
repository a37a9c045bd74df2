use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::SenseError;

/// Blacklist token that disables the MSR voltage source.
pub const DISABLE_MSR: &str = "msr";
/// Blacklist token that disables the nvidia-smi GPU source.
pub const DISABLE_NVIDIA_SMI: &str = "nvidia-smi";

const DEFAULT_BLACKLIST: &[&str] = &[
    "PCH_CHIP_CPU_MAX_TEMP",
    "PCH_CHIP_TEMP",
    "PCH_CPU_TEMP",
    "AUXTIN1",
    "AUXTIN2",
    "AUXTIN3",
    "intrusion0",
    "intrusion1",
    "intrusion2",
    "fan3",
    "fan5",
    "beep_enable",
];

const CONFIG_HEADER: &str = "# sense configuration\n\
# update_delay: seconds between two sensor reads\n\
# queue_length: samples kept per sensor (3600 = one hour with update_delay 1)\n\
# blacklist: sensor labels to hide; \"msr\" and \"nvidia-smi\" disable those sources\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds slept between the end of one update cycle and the next.
    pub update_delay: f64,
    /// Number of samples retained per metric.
    pub queue_length: usize,
    /// strftime pattern for the footer clock.
    pub date_format: String,
    pub quit_hint: String,
    pub blacklist: Vec<String>,
    pub palette: Palette,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            update_delay: 1.0,
            queue_length: 3600,
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
            quit_hint: "Press \"q\" to quit".to_string(),
            blacklist: DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect(),
            palette: Palette::default(),
        }
    }
}

/// Result of looking for the configuration file.
#[derive(Debug)]
pub enum ConfigLoad {
    Loaded(Config),
    /// No file existed; a default one was written at this path.
    Created(PathBuf),
}

impl Config {
    /// Load the configuration at `path`, writing a default file when there
    /// is none yet.
    pub fn load_or_create(path: &Path) -> Result<ConfigLoad> {
        if !path.exists() {
            let config = Self::first_run_default();
            config.save(path)?;
            return Ok(ConfigLoad::Created(path.to_path_buf()));
        }

        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_yaml(&source)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(ConfigLoad::Loaded(config))
    }

    /// Parse and validate a YAML document. Missing keys take default values.
    pub fn from_yaml(source: &str) -> crate::Result<Self> {
        let config: Config = if source.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(source)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> crate::Result<String> {
        Ok(format!("{}{}", CONFIG_HEADER, serde_yaml::to_string(self)?))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = self.to_yaml().context("Failed to serialize config")?;
        fs::write(path, data)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Defaults written on first run; nvidia-smi is pre-disabled when the
    /// tool cannot be found.
    pub fn first_run_default() -> Self {
        let mut config = Self::default();
        if which::which(DISABLE_NVIDIA_SMI).is_err() {
            config.blacklist.push(DISABLE_NVIDIA_SMI.to_string());
        }
        config
    }

    /// `$XDG_CONFIG_HOME/sense/config.yaml`, or the platform config dir.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = match std::env::var_os("XDG_CONFIG_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir().context("Could not determine config directory")?,
        };

        Ok(config_dir.join("sense").join("config.yaml"))
    }

    pub fn validate(&self) -> crate::Result<()> {
        if !self.update_delay.is_finite() || self.update_delay < 0.0 {
            return Err(SenseError::config(format!(
                "update_delay must be a non-negative number of seconds, got {}",
                self.update_delay
            )));
        }

        if self.queue_length < 1 {
            return Err(SenseError::config("queue_length must be at least 1"));
        }

        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(SenseError::config(format!(
                "date_format is not a valid strftime pattern: {:?}",
                self.date_format
            )));
        }

        if let Some(role) = self
            .palette
            .entries
            .keys()
            .find(|role| role.parse::<PaletteRole>().is_err())
        {
            return Err(SenseError::config(format!(
                "unknown palette role {:?} (expected one of {})",
                role,
                PaletteRole::ALL
                    .iter()
                    .map(|r| r.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        Ok(())
    }

    pub fn update_delay(&self) -> Duration {
        Duration::from_secs_f64(self.update_delay)
    }

    /// Labels to leave out of the metric tree.
    pub fn blacklist_set(&self) -> HashSet<String> {
        self.blacklist.iter().cloned().collect()
    }

    /// Whether an optional source (`"msr"`, `"nvidia-smi"`) is disabled.
    pub fn is_disabled(&self, source: &str) -> bool {
        self.blacklist.iter().any(|entry| entry == source)
    }
}

/// Roles that can be styled through the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PaletteRole {
    Background,
    Symbol,
    Chip,
    Title,
    Date,
    QuitHint,
    Sensor,
}

impl PaletteRole {
    pub const ALL: [PaletteRole; 7] = [
        PaletteRole::Background,
        PaletteRole::Symbol,
        PaletteRole::Chip,
        PaletteRole::Title,
        PaletteRole::Date,
        PaletteRole::QuitHint,
        PaletteRole::Sensor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaletteRole::Background => "background",
            PaletteRole::Symbol => "symbol",
            PaletteRole::Chip => "chip",
            PaletteRole::Title => "title",
            PaletteRole::Date => "date",
            PaletteRole::QuitHint => "quit_hint",
            PaletteRole::Sensor => "sensor",
        }
    }

    fn default_colors(self) -> ColorPair {
        let fg = match self {
            PaletteRole::Background => ColorName::Default,
            PaletteRole::Symbol | PaletteRole::QuitHint => ColorName::DarkGray,
            PaletteRole::Chip => ColorName::DarkCyan,
            PaletteRole::Title => ColorName::LightGreen,
            PaletteRole::Date => ColorName::Yellow,
            PaletteRole::Sensor => ColorName::LightCyan,
        };
        ColorPair {
            fg,
            bg: ColorName::Default,
        }
    }
}

impl FromStr for PaletteRole {
    type Err = SenseError;

    fn from_str(s: &str) -> crate::Result<Self> {
        PaletteRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| SenseError::config(format!("unknown palette role {:?}", s)))
    }
}

/// Colour names understood by the palette (the classic 16 terminal colours).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColorName {
    Default,
    Black,
    DarkRed,
    DarkGreen,
    Brown,
    DarkBlue,
    DarkMagenta,
    DarkCyan,
    LightGray,
    DarkGray,
    LightRed,
    LightGreen,
    Yellow,
    LightBlue,
    LightMagenta,
    LightCyan,
    White,
}

impl ColorName {
    pub fn as_str(self) -> &'static str {
        match self {
            ColorName::Default => "default",
            ColorName::Black => "black",
            ColorName::DarkRed => "dark red",
            ColorName::DarkGreen => "dark green",
            ColorName::Brown => "brown",
            ColorName::DarkBlue => "dark blue",
            ColorName::DarkMagenta => "dark magenta",
            ColorName::DarkCyan => "dark cyan",
            ColorName::LightGray => "light gray",
            ColorName::DarkGray => "dark gray",
            ColorName::LightRed => "light red",
            ColorName::LightGreen => "light green",
            ColorName::Yellow => "yellow",
            ColorName::LightBlue => "light blue",
            ColorName::LightMagenta => "light magenta",
            ColorName::LightCyan => "light cyan",
            ColorName::White => "white",
        }
    }
}

impl FromStr for ColorName {
    type Err = SenseError;

    fn from_str(s: &str) -> crate::Result<Self> {
        let normalized = s.trim().to_lowercase().replace("grey", "gray");
        let color = match normalized.as_str() {
            "default" | "" => ColorName::Default,
            "black" => ColorName::Black,
            "dark red" => ColorName::DarkRed,
            "dark green" => ColorName::DarkGreen,
            "brown" => ColorName::Brown,
            "dark blue" => ColorName::DarkBlue,
            "dark magenta" => ColorName::DarkMagenta,
            "dark cyan" => ColorName::DarkCyan,
            "light gray" => ColorName::LightGray,
            "dark gray" => ColorName::DarkGray,
            "light red" => ColorName::LightRed,
            "light green" => ColorName::LightGreen,
            "yellow" => ColorName::Yellow,
            "light blue" => ColorName::LightBlue,
            "light magenta" => ColorName::LightMagenta,
            "light cyan" => ColorName::LightCyan,
            "white" => ColorName::White,
            _ => return Err(SenseError::config(format!("unknown color name {:?}", s))),
        };
        Ok(color)
    }
}

impl TryFrom<String> for ColorName {
    type Error = SenseError;

    fn try_from(value: String) -> crate::Result<Self> {
        value.parse()
    }
}

impl From<ColorName> for String {
    fn from(color: ColorName) -> Self {
        color.as_str().to_string()
    }
}

impl fmt::Display for ColorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair {
    #[serde(default = "default_color")]
    pub fg: ColorName,
    #[serde(default = "default_color")]
    pub bg: ColorName,
}

fn default_color() -> ColorName {
    ColorName::Default
}

/// Foreground/background colours per role.
///
/// Accepts a mapping (`chip: {fg: .., bg: ..}`) or the older list of
/// single-entry mappings (`- chip: {fg: .., bg: ..}`). Roles left out keep
/// their default colours.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "PaletteRepr")]
pub struct Palette {
    entries: BTreeMap<String, ColorPair>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PaletteRepr {
    Map(BTreeMap<String, ColorPair>),
    List(Vec<BTreeMap<String, ColorPair>>),
}

impl From<PaletteRepr> for Palette {
    fn from(repr: PaletteRepr) -> Self {
        let mut palette = Palette::default();
        let overrides = match repr {
            PaletteRepr::Map(map) => map,
            PaletteRepr::List(list) => list.into_iter().flatten().collect(),
        };
        palette.entries.extend(overrides);
        palette
    }
}

impl Serialize for Palette {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            entries: PaletteRole::ALL
                .into_iter()
                .map(|role| (role.as_str().to_string(), role.default_colors()))
                .collect(),
        }
    }
}

impl Palette {
    pub fn get(&self, role: PaletteRole) -> ColorPair {
        self.entries
            .get(role.as_str())
            .copied()
            .unwrap_or_else(|| role.default_colors())
    }

    pub fn set(&mut self, role: PaletteRole, colors: ColorPair) {
        self.entries.insert(role.as_str().to_string(), colors);
    }
}

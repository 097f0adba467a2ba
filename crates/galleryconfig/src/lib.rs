use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Widest logical viewport still treated as a small screen.
pub const DEFAULT_SMALL_VIEWPORT_WIDTH: f64 = 768.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    Medium,
    #[default]
    High,
}

impl QualityTier {
    /// Upper bound on the device pixel ratio; `None` keeps the device ratio.
    pub fn pixel_ratio_cap(self) -> Option<f64> {
        match self {
            Self::Low => Some(1.0),
            Self::Medium => Some(1.5),
            Self::High => None,
        }
    }

    pub fn effective_pixel_ratio(self, device_ratio: f64) -> f64 {
        match self.pixel_ratio_cap() {
            Some(cap) => device_ratio.min(cap),
            None => device_ratio,
        }
    }

    pub fn antialias(self) -> bool {
        matches!(self, Self::High)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "low" | "lo" => Ok(Self::Low),
            "medium" | "med" | "mid" => Ok(Self::Medium),
            "high" | "hi" | "max" => Ok(Self::High),
            other => Err(format!(
                "invalid quality tier '{other}'; expected low, medium, or high"
            )),
        }
    }
}

impl<'de> Deserialize<'de> for QualityTier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// How exhibit units are resolved once an exhibit is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStrategy {
    /// Resolve on a worker thread and poll it from the frame loop.
    #[default]
    Threaded,
    /// Resolve inline; the result is picked up on the next poll.
    Immediate,
}

impl FromStr for LoadStrategy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "threaded" | "async" => Ok(Self::Threaded),
            "immediate" | "sync" => Ok(Self::Immediate),
            other => Err(format!(
                "invalid load strategy '{other}'; expected threaded or immediate"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct WindowSettings {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GalleryConfig {
    #[serde(default)]
    pub quality: QualityTier,
    /// Frame cap; `None` renders at the display's pace.
    #[serde(
        default,
        deserialize_with = "deserialize_fps_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub fps: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_exhibit: Option<String>,
    #[serde(default = "default_small_viewport_width")]
    pub small_viewport_width: f64,
    #[serde(default)]
    pub load_strategy: LoadStrategy,
    #[serde(default)]
    pub window: WindowSettings,
}

fn default_small_viewport_width() -> f64 {
    DEFAULT_SMALL_VIEWPORT_WIDTH
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            quality: QualityTier::default(),
            fps: None,
            start_exhibit: None,
            small_viewport_width: DEFAULT_SMALL_VIEWPORT_WIDTH,
            load_strategy: LoadStrategy::default(),
            window: WindowSettings::default(),
        }
    }
}

fn deserialize_fps_opt<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<f32>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a non-negative frame rate, 0 for uncapped")
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            self.visit_f64(v as f64)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            self.visit_f64(v as f64)
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v < 0.0 {
                return Err(E::custom("fps must be >= 0"));
            }
            if v == 0.0 {
                Ok(None)
            } else {
                Ok(Some(v as f32))
            }
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl GalleryConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: GalleryConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            )));
        }

        if !(self.small_viewport_width.is_finite() && self.small_viewport_width >= 0.0) {
            return Err(ConfigError::Invalid(
                "small_viewport_width must be a non-negative number".into(),
            ));
        }

        if let Some(start) = &self.start_exhibit {
            if start.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "start_exhibit may not be empty".into(),
                ));
            }
        }

        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}

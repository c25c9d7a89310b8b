use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    pub version: u32,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub demos: BTreeMap<String, DemoEntry>,
    /// Directory relative shader paths are resolved against.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Defaults {
    pub demo: Option<String>,
    #[serde(default, deserialize_with = "deserialize_size_opt")]
    pub size: Option<(u32, u32)>,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub run_for: Option<Duration>,
    pub vsync: Option<bool>,
    pub color_space: Option<ColorSpaceSetting>,
    pub gpu_power: Option<GpuPowerSetting>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DemoEntry {
    /// Bundled preset to start from.
    pub preset: Option<String>,
    /// WGSL file to run instead of a preset.
    pub shader: Option<PathBuf>,
    pub title: Option<String>,
    pub feedback: Option<bool>,
    pub decay: Option<[f32; 3]>,
    pub blend: Option<f32>,
    #[serde(default, deserialize_with = "deserialize_size_opt")]
    pub size: Option<(u32, u32)>,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub run_for: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpaceSetting {
    Auto,
    Gamma,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuPowerSetting {
    Low,
    High,
}

/// Where a demo's shader comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemoSource {
    Preset(String),
    Shader(PathBuf),
}

/// A demo entry merged with the file's `[defaults]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDemo {
    pub name: String,
    pub source: DemoSource,
    pub title: Option<String>,
    pub feedback: Option<bool>,
    pub decay: Option<[f32; 3]>,
    pub blend: Option<f32>,
    pub size: Option<(u32, u32)>,
    pub run_for: Option<Duration>,
    pub vsync: Option<bool>,
    pub color_space: Option<ColorSpaceSetting>,
    pub gpu_power: Option<GpuPowerSetting>,
}

/// Parses `WIDTHxHEIGHT` (either `x` or `X`), rejecting zero dimensions.
pub fn parse_size(raw: &str) -> Result<(u32, u32), String> {
    let (width, height) = raw
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{raw}'; expected WIDTHxHEIGHT"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in size '{raw}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in size '{raw}'"))?;
    if width == 0 || height == 0 {
        return Err(format!("size '{raw}' must be non-zero in both dimensions"));
    }
    Ok((width, height))
}

fn deserialize_size_opt<'de, D>(deserializer: D) -> Result<Option<(u32, u32)>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Pair([u32; 2]),
    }

    let helper: Option<Helper> = Option::deserialize(deserializer)?;
    match helper {
        None => Ok(None),
        Some(Helper::Str(raw)) => parse_size(&raw).map(Some).map_err(de::Error::custom),
        Some(Helper::Pair([width, height])) => {
            if width == 0 || height == 0 {
                return Err(de::Error::custom("size must be non-zero in both dimensions"));
            }
            Ok(Some((width, height)))
        }
    }
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl DemoConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: DemoConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads and validates `path`; relative shader paths resolve against its
    /// directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn demo(&self, name: &str) -> Option<&DemoEntry> {
        self.demos.get(name)
    }

    pub fn default_demo(&self) -> Option<&str> {
        self.defaults.demo.as_deref()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if let Some(run_for) = self.defaults.run_for {
            if run_for.is_zero() {
                return Err(ConfigError::Invalid(
                    "defaults.run_for must be greater than zero".into(),
                ));
            }
        }

        for (name, demo) in &self.demos {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("demo names may not be empty".into()));
            }

            match (&demo.preset, &demo.shader) {
                (Some(_), Some(_)) => {
                    return Err(ConfigError::Invalid(format!(
                        "demo '{name}' sets both preset and shader; pick one"
                    )))
                }
                (None, None) => {
                    return Err(ConfigError::Invalid(format!(
                        "demo '{name}' needs either a preset or a shader"
                    )))
                }
                (Some(preset), None) if preset.trim().is_empty() => {
                    return Err(ConfigError::Invalid(format!(
                        "demo '{name}' has an empty preset name"
                    )))
                }
                (None, Some(shader)) if shader.as_os_str().is_empty() => {
                    return Err(ConfigError::Invalid(format!(
                        "demo '{name}' has an empty shader path"
                    )))
                }
                _ => {}
            }

            if let Some(blend) = demo.blend {
                if !(0.0..=1.0).contains(&blend) {
                    return Err(ConfigError::Invalid(format!(
                        "demo '{name}' blend must be within 0..=1"
                    )));
                }
            }

            if let Some(decay) = demo.decay {
                if decay.iter().any(|value| !value.is_finite() || *value < 0.0) {
                    return Err(ConfigError::Invalid(format!(
                        "demo '{name}' decay values must be finite and >= 0"
                    )));
                }
            }

            if let Some(run_for) = demo.run_for {
                if run_for.is_zero() {
                    return Err(ConfigError::Invalid(format!(
                        "demo '{name}' run_for must be greater than zero"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Looks up `name` and fills unset fields from `[defaults]`.
    pub fn resolve(&self, name: &str) -> Option<ResolvedDemo> {
        let demo = self.demo(name)?;
        let source = match (&demo.preset, &demo.shader) {
            (_, Some(shader)) => DemoSource::Shader(self.resolve_path(shader)),
            (Some(preset), None) => DemoSource::Preset(preset.clone()),
            (None, None) => return None,
        };

        Some(ResolvedDemo {
            name: name.to_string(),
            source,
            title: demo.title.clone(),
            feedback: demo.feedback,
            decay: demo.decay,
            blend: demo.blend,
            size: demo.size.or(self.defaults.size),
            run_for: demo.run_for.or(self.defaults.run_for),
            vsync: self.defaults.vsync,
            color_space: self.defaults.color_space,
            gpu_power: self.defaults.gpu_power,
        })
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[defaults]
demo = "slow-trail"
size = "800x600"
run_for = "30s"
vsync = false
color_space = "linear"

[demos.slow-trail]
preset = "blob-trail"
decay = [0.99, 0.99, 0.99]
blend = 0.9

[demos.mine]
shader = "shaders/mine.wgsl"
feedback = true
size = [640, 480]
run_for = 10
title = "My demo"
"#;

    #[test]
    fn parses_sample_config() {
        let config = DemoConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.version, 1);
        assert_eq!(config.default_demo(), Some("slow-trail"));
        assert_eq!(config.defaults.size, Some((800, 600)));
        assert_eq!(config.defaults.run_for, Some(Duration::from_secs(30)));
        assert_eq!(config.defaults.color_space, Some(ColorSpaceSetting::Linear));
        assert_eq!(config.demos.len(), 2);
    }

    #[test]
    fn resolves_preset_demo_with_defaults() {
        let config = DemoConfig::from_toml_str(SAMPLE).unwrap();
        let resolved = config.resolve("slow-trail").unwrap();
        assert_eq!(resolved.source, DemoSource::Preset("blob-trail".into()));
        assert_eq!(resolved.decay, Some([0.99, 0.99, 0.99]));
        assert_eq!(resolved.blend, Some(0.9));
        assert_eq!(resolved.size, Some((800, 600)));
        assert_eq!(resolved.run_for, Some(Duration::from_secs(30)));
        assert_eq!(resolved.vsync, Some(false));
        assert_eq!(resolved.feedback, None);
    }

    #[test]
    fn demo_values_override_defaults() {
        let config = DemoConfig::from_toml_str(SAMPLE).unwrap();
        let resolved = config.resolve("mine").unwrap();
        assert_eq!(resolved.size, Some((640, 480)));
        assert_eq!(resolved.run_for, Some(Duration::from_secs(10)));
        assert_eq!(resolved.title.as_deref(), Some("My demo"));
        assert_eq!(
            resolved.source,
            DemoSource::Shader(PathBuf::from("shaders/mine.wgsl"))
        );
        assert!(config.resolve("missing").is_none());
    }

    #[test]
    fn load_resolves_shader_paths_next_to_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("raymarch.toml");
        std::fs::write(&path, SAMPLE).expect("write config");

        let config = DemoConfig::load(&path).expect("load");
        let resolved = config.resolve("mine").unwrap();
        assert_eq!(
            resolved.source,
            DemoSource::Shader(dir.path().join("shaders/mine.wgsl"))
        );
    }

    #[test]
    fn missing_file_reports_path() {
        let err = DemoConfig::load(Path::new("/nonexistent/raymarch.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/raymarch.toml"));
    }

    #[test]
    fn rejects_preset_and_shader_together() {
        let config = r#"
version = 1

[demos.both]
preset = "torus"
shader = "torus.wgsl"
"#;
        let err = DemoConfig::from_toml_str(config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_demo_without_source() {
        let config = r#"
version = 1

[demos.empty]
blend = 0.5
"#;
        let err = DemoConfig::from_toml_str(config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_out_of_range_blend_and_negative_decay() {
        let blend = r#"
version = 1

[demos.bright]
preset = "blob-trail"
blend = 1.5
"#;
        assert!(matches!(
            DemoConfig::from_toml_str(blend).unwrap_err(),
            ConfigError::Invalid(_)
        ));

        let decay = r#"
version = 1

[demos.dark]
preset = "blob-trail"
decay = [1.0, -0.5, 1.0]
"#;
        assert!(matches!(
            DemoConfig::from_toml_str(decay).unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }

    #[test]
    fn rejects_unsupported_version() {
        let err = DemoConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_bad_duration_and_size() {
        let duration = r#"
version = 1

[defaults]
run_for = "soon"
"#;
        assert!(matches!(
            DemoConfig::from_toml_str(duration).unwrap_err(),
            ConfigError::Parse(_)
        ));

        let size = r#"
version = 1

[defaults]
size = "0x600"
"#;
        assert!(matches!(
            DemoConfig::from_toml_str(size).unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn parse_size_accepts_either_separator() {
        assert_eq!(parse_size("1920x1080"), Ok((1920, 1080)));
        assert_eq!(parse_size(" 640X480 "), Ok((640, 480)));
        assert!(parse_size("640").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("axb").is_err());
    }
}

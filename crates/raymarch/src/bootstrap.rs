use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use democonfig::{ColorSpaceSetting, DemoConfig, DemoSource, GpuPowerSetting, ResolvedDemo};
use renderer::{
    ColorSpaceMode, FrameBudget, GpuPowerPreference, PassMode, Preset, RendererConfig,
    ShaderProgram,
};

use crate::cli::RunArgs;

/// What the user asked to run, before any overrides are layered on.
#[derive(Debug, Clone, PartialEq)]
pub enum DemoSelection {
    Preset(&'static Preset),
    Configured(ResolvedDemo),
    Shader(PathBuf),
}

/// Optional settings from one configuration layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub title: Option<String>,
    pub feedback: Option<bool>,
    pub decay: Option<[f32; 3]>,
    pub blend: Option<f32>,
    pub size: Option<(u32, u32)>,
    pub frames: Option<u64>,
    pub run_for: Option<Duration>,
    pub vsync: Option<bool>,
    pub color_space: Option<ColorSpaceMode>,
    pub gpu_power: Option<GpuPowerPreference>,
}

impl Overrides {
    pub fn from_args(args: &RunArgs) -> Self {
        Self {
            title: None,
            feedback: args.feedback_override(),
            decay: args.decay,
            blend: args.blend,
            size: args.size,
            frames: args.frames,
            run_for: args.run_for,
            vsync: args.no_vsync.then_some(false),
            color_space: args.color_space,
            gpu_power: args.gpu_power,
        }
    }

    pub fn from_defaults(defaults: &democonfig::Defaults) -> Self {
        Self {
            size: defaults.size,
            run_for: defaults.run_for,
            vsync: defaults.vsync,
            color_space: defaults.color_space.map(map_color_space),
            gpu_power: defaults.gpu_power.map(map_gpu_power),
            ..Self::default()
        }
    }

    pub fn from_resolved(demo: &ResolvedDemo) -> Self {
        Self {
            title: Some(demo.title.clone().unwrap_or_else(|| demo.name.clone())),
            feedback: demo.feedback,
            decay: demo.decay,
            blend: demo.blend,
            size: demo.size,
            frames: None,
            run_for: demo.run_for,
            vsync: demo.vsync,
            color_space: demo.color_space.map(map_color_space),
            gpu_power: demo.gpu_power.map(map_gpu_power),
        }
    }

    /// Fields set on `self` win; unset ones come from `fallback`.
    pub fn or(self, fallback: Overrides) -> Self {
        Self {
            title: self.title.or(fallback.title),
            feedback: self.feedback.or(fallback.feedback),
            decay: self.decay.or(fallback.decay),
            blend: self.blend.or(fallback.blend),
            size: self.size.or(fallback.size),
            frames: self.frames.or(fallback.frames),
            run_for: self.run_for.or(fallback.run_for),
            vsync: self.vsync.or(fallback.vsync),
            color_space: self.color_space.or(fallback.color_space),
            gpu_power: self.gpu_power.or(fallback.gpu_power),
        }
    }

    pub fn apply(self, mut config: RendererConfig) -> RendererConfig {
        if let Some(title) = self.title {
            config.title = title;
        }
        if let Some(feedback) = self.feedback {
            config.mode = if feedback {
                PassMode::Feedback
            } else {
                PassMode::Direct
            };
        }
        if let Some(decay) = self.decay {
            config.blend.decay = decay;
        }
        if let Some(blend) = self.blend {
            config.blend.blend_weight = blend;
        }
        if let Some(size) = self.size {
            config.logical_size = size;
        }
        if let Some(vsync) = self.vsync {
            config.vsync = vsync;
        }
        if let Some(color_space) = self.color_space {
            config.color_space = color_space;
        }
        if let Some(gpu_power) = self.gpu_power {
            config.gpu_power = gpu_power;
        }
        config.budget = FrameBudget {
            max_frames: self.frames,
            max_duration: self.run_for,
        };
        config
    }
}

pub fn map_color_space(setting: ColorSpaceSetting) -> ColorSpaceMode {
    match setting {
        ColorSpaceSetting::Auto => ColorSpaceMode::Auto,
        ColorSpaceSetting::Gamma => ColorSpaceMode::Gamma,
        ColorSpaceSetting::Linear => ColorSpaceMode::Linear,
    }
}

pub fn map_gpu_power(setting: GpuPowerSetting) -> GpuPowerPreference {
    match setting {
        GpuPowerSetting::Low => GpuPowerPreference::Low,
        GpuPowerSetting::High => GpuPowerPreference::High,
    }
}

/// Picks the demo to run: `--shader`, then the positional name, then the
/// config file's default, then the bundled default preset. Configured demos
/// shadow presets of the same name.
pub fn select_demo(args: &RunArgs, demos: Option<&DemoConfig>) -> Result<DemoSelection> {
    if let Some(path) = &args.shader {
        return Ok(DemoSelection::Shader(path.clone()));
    }

    let name = args
        .demo
        .as_deref()
        .or_else(|| demos.and_then(DemoConfig::default_demo))
        .unwrap_or(Preset::DEFAULT);

    if let Some(resolved) = demos.and_then(|config| config.resolve(name)) {
        return Ok(DemoSelection::Configured(resolved));
    }

    Preset::find(name)
        .map(DemoSelection::Preset)
        .ok_or_else(|| anyhow!("unknown demo '{name}'; run `raymarch list` to see what is available"))
}

/// Builds the renderer configuration from CLI flags over the config file
/// over preset defaults.
pub fn build_renderer_config(args: &RunArgs, demos: Option<&DemoConfig>) -> Result<RendererConfig> {
    let selection = select_demo(args, demos)?;
    let file_defaults = demos
        .map(|config| Overrides::from_defaults(&config.defaults))
        .unwrap_or_default();

    let (base, file_layer) = match &selection {
        DemoSelection::Preset(preset) => (preset.config(), file_defaults),
        DemoSelection::Shader(path) => (RendererConfig::new(load_shader(path)?), file_defaults),
        DemoSelection::Configured(resolved) => {
            let base = match &resolved.source {
                DemoSource::Preset(name) => Preset::find(name)
                    .ok_or_else(|| {
                        anyhow!(
                            "demo '{}' refers to unknown preset '{name}'",
                            resolved.name
                        )
                    })?
                    .config(),
                DemoSource::Shader(path) => RendererConfig::new(load_shader(path)?),
            };
            (base, Overrides::from_resolved(resolved))
        }
    };

    let config = Overrides::from_args(args).or(file_layer).apply(base);
    tracing::debug!(
        title = %config.title,
        mode = %config.mode,
        width = config.logical_size.0,
        height = config.logical_size.1,
        decay = ?config.blend.decay,
        blend = config.blend.blend_weight,
        budget = ?config.budget,
        "resolved demo configuration"
    );
    Ok(config)
}

/// Reads a WGSL file into a program labelled by its file stem.
pub fn load_shader(path: &Path) -> Result<ShaderProgram> {
    if !path.is_file() {
        bail!("shader file {} does not exist", path.display());
    }
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read shader {}", path.display()))?;
    let label = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ShaderProgram::owned(label, source))
}

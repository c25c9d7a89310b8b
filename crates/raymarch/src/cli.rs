use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use renderer::{ColorSpaceMode, GpuPowerPreference};

#[derive(Parser, Debug)]
#[command(
    name = "raymarch",
    author,
    version,
    about = "WebGPU raymarching demos with a ping-pong feedback trail"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Bundled preset or configured demo to run (see `raymarch list`).
    #[arg(value_name = "DEMO", conflicts_with = "shader")]
    pub demo: Option<String>,

    /// Run a WGSL file instead of a bundled preset.
    #[arg(long, value_name = "PATH")]
    pub shader: Option<PathBuf>,

    /// Force the ping-pong feedback pass on.
    #[arg(long, overrides_with = "no_feedback")]
    pub feedback: bool,

    /// Render the scene straight to the window, without feedback.
    #[arg(long, overrides_with = "feedback")]
    pub no_feedback: bool,

    /// Per-channel decay applied to the previous frame (e.g. `0.98,0.97,0.99`).
    #[arg(long, value_name = "R,G,B", value_parser = parse_decay)]
    pub decay: Option<[f32; 3]>,

    /// Weight of the previous frame in the blend, within 0..=1.
    #[arg(long, value_name = "WEIGHT", value_parser = parse_blend)]
    pub blend: Option<f32>,

    /// Initial window size in logical pixels (e.g. `800x600`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Close the window after this many frames.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub frames: Option<u64>,

    /// Close the window after this long (e.g. `30s`, `2m`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub run_for: Option<Duration>,

    /// Demo configuration file; defaults to `raymarch.toml` in the config directory.
    #[arg(long, value_name = "PATH", env = "RAYMARCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output color space handling: `auto`, `gamma`, or `linear`.
    #[arg(long, value_name = "MODE", value_parser = parse_color_space)]
    pub color_space: Option<ColorSpaceMode>,

    /// Adapter power preference: `low` or `high`.
    #[arg(long, value_name = "PREFERENCE", value_parser = parse_gpu_power)]
    pub gpu_power: Option<GpuPowerPreference>,

    /// Present immediately instead of waiting for vblank.
    #[arg(long)]
    pub no_vsync: bool,
}

impl RunArgs {
    pub fn feedback_override(&self) -> Option<bool> {
        if self.feedback {
            Some(true)
        } else if self.no_feedback {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List bundled presets and configured demos.
    List,
    /// Validate a WGSL shader against the renderer's binding layout.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Shader file to validate.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Check against the feedback layout (bindings 0-3) instead of single-pass.
    #[arg(long)]
    pub feedback: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    democonfig::parse_size(value)
}

pub fn parse_decay(value: &str) -> Result<[f32; 3], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(format!(
            "invalid decay '{value}'; expected three comma-separated values"
        ));
    };

    let mut decay = [0.0f32; 3];
    for (slot, raw) in decay.iter_mut().zip([r, g, b]) {
        let parsed: f32 = raw
            .parse()
            .map_err(|_| format!("invalid decay component '{raw}'"))?;
        if !parsed.is_finite() || parsed < 0.0 {
            return Err(format!("decay component '{raw}' must be finite and >= 0"));
        }
        *slot = parsed;
    }
    Ok(decay)
}

pub fn parse_blend(value: &str) -> Result<f32, String> {
    let weight: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid blend weight '{value}'"))?;
    if !(0.0..=1.0).contains(&weight) {
        return Err(format!("blend weight {weight} must be within 0..=1"));
    }
    Ok(weight)
}

pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let duration = humantime::parse_duration(value.trim())
        .map_err(|err| format!("invalid duration '{value}': {err}"))?;
    if duration.is_zero() {
        return Err("duration must be greater than zero".to_string());
    }
    Ok(duration)
}

pub fn parse_color_space(value: &str) -> Result<ColorSpaceMode, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("color space must not be empty".to_string());
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "auto" => Ok(ColorSpaceMode::Auto),
        "gamma" => Ok(ColorSpaceMode::Gamma),
        "linear" | "srgb" => Ok(ColorSpaceMode::Linear),
        other => Err(format!(
            "unknown color space '{other}'; expected auto, gamma, or linear"
        )),
    }
}

pub fn parse_gpu_power(value: &str) -> Result<GpuPowerPreference, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" | "low-power" => Ok(GpuPowerPreference::Low),
        "high" | "high-performance" => Ok(GpuPowerPreference::High),
        other => Err(format!(
            "unknown GPU power preference '{other}'; expected low or high"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("raymarch").chain(args.iter().copied()))
            .expect("arguments parse")
    }

    #[test]
    fn parses_run_flags() {
        let cli = parse_args(&[
            "twisted-box",
            "--decay",
            "1.0, 0.98,0.97",
            "--blend",
            "0.5",
            "--size",
            "800x600",
            "--frames",
            "120",
            "--run-for",
            "1m 30s",
            "--color-space",
            "linear",
            "--gpu-power",
            "low",
            "--no-vsync",
        ]);
        assert!(cli.command.is_none());
        let run = cli.run;
        assert_eq!(run.demo.as_deref(), Some("twisted-box"));
        assert_eq!(run.decay, Some([1.0, 0.98, 0.97]));
        assert_eq!(run.blend, Some(0.5));
        assert_eq!(run.size, Some((800, 600)));
        assert_eq!(run.frames, Some(120));
        assert_eq!(run.run_for, Some(Duration::from_secs(90)));
        assert_eq!(run.color_space, Some(ColorSpaceMode::Linear));
        assert_eq!(run.gpu_power, Some(GpuPowerPreference::Low));
        assert!(run.no_vsync);
    }

    #[test]
    fn last_feedback_flag_wins() {
        let cli = parse_args(&["--feedback", "--no-feedback"]);
        assert_eq!(cli.run.feedback_override(), Some(false));

        let cli = parse_args(&["--no-feedback", "--feedback"]);
        assert_eq!(cli.run.feedback_override(), Some(true));

        let cli = parse_args(&[]);
        assert_eq!(cli.run.feedback_override(), None);
    }

    #[test]
    fn parses_subcommands() {
        let cli = parse_args(&["list"]);
        assert!(matches!(cli.command, Some(Command::List)));

        let cli = parse_args(&["check", "scene.wgsl", "--feedback"]);
        match cli.command {
            Some(Command::Check(args)) => {
                assert_eq!(args.path, PathBuf::from("scene.wgsl"));
                assert!(args.feedback);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn demo_and_shader_conflict() {
        let result = Cli::try_parse_from(["raymarch", "torus", "--shader", "mine.wgsl"]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(Cli::try_parse_from(["raymarch", "--frames", "0"]).is_err());
        assert!(Cli::try_parse_from(["raymarch", "--blend", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["raymarch", "--size", "0x10"]).is_err());
    }

    #[test]
    fn decay_requires_three_non_negative_components() {
        assert_eq!(parse_decay("1,1,1"), Ok([1.0, 1.0, 1.0]));
        assert!(parse_decay("1,1").is_err());
        assert!(parse_decay("1,1,1,1").is_err());
        assert!(parse_decay("1,-0.1,1").is_err());
        assert!(parse_decay("1,x,1").is_err());
    }

    #[test]
    fn parses_color_space_and_power_aliases() {
        assert_eq!(parse_color_space("Gamma"), Ok(ColorSpaceMode::Gamma));
        assert_eq!(parse_color_space("srgb"), Ok(ColorSpaceMode::Linear));
        assert!(parse_color_space("").is_err());
        assert_eq!(
            parse_gpu_power("high-performance"),
            Ok(GpuPowerPreference::High)
        );
        assert!(parse_gpu_power("medium").is_err());
    }

    #[test]
    fn duration_must_be_positive() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("soon").is_err());
    }
}

use crate::feedback::FeedbackBlend;
use crate::types::{PassMode, RendererConfig, ShaderProgram};

/// Presentation shader shared by every feedback demo.
pub const COPY_SHADER: &str = include_str!("../shaders/copy.wgsl");

/// A demo that ships inside the binary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub source: &'static str,
    pub mode: PassMode,
    pub blend: FeedbackBlend,
    /// Initial logical window size.
    pub size: (u32, u32),
}

const PRESETS: &[Preset] = &[
    Preset {
        name: "blob-trail",
        description: "twisted rounded box leaving a fading orange trail",
        source: include_str!("../shaders/blob_trail.wgsl"),
        mode: PassMode::Feedback,
        blend: FeedbackBlend {
            decay: [0.98, 0.97, 0.99],
            blend_weight: 0.75,
        },
        size: (512, 512),
    },
    Preset {
        name: "twisted-box",
        description: "fast-twisting box with ambient occlusion and a long trail",
        source: include_str!("../shaders/twisted_box.wgsl"),
        mode: PassMode::Feedback,
        blend: FeedbackBlend {
            decay: [1.0, 0.98, 0.97],
            blend_weight: 0.87,
        },
        size: (512, 512),
    },
    Preset {
        name: "torus",
        description: "wobbling twisted torus, single pass",
        source: include_str!("../shaders/torus.wgsl"),
        mode: PassMode::Direct,
        blend: FeedbackBlend::DEFAULT,
        size: (1024, 1024),
    },
];

impl Preset {
    pub const DEFAULT: &'static str = "blob-trail";

    pub fn all() -> &'static [Preset] {
        PRESETS
    }

    /// Looks a preset up by name, ignoring ASCII case.
    pub fn find(name: &str) -> Option<&'static Preset> {
        PRESETS
            .iter()
            .find(|preset| preset.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn program(&self) -> ShaderProgram {
        ShaderProgram::bundled(self.name, self.source)
    }

    /// Renderer configuration with this preset's defaults.
    pub fn config(&self) -> RendererConfig {
        RendererConfig::new(self.program())
            .with_mode(self.mode)
            .with_blend(self.blend)
            .with_logical_size(self.size.0, self.size.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_is_case_insensitive() {
        let preset = Preset::find("Blob-Trail").expect("preset");
        assert_eq!(preset.name, "blob-trail");
        assert!(Preset::find("  torus ").is_some());
        assert!(Preset::find("missing").is_none());
    }

    #[test]
    fn default_preset_exists() {
        assert!(Preset::find(Preset::DEFAULT).is_some());
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = Preset::all().iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Preset::all().len());
    }

    #[test]
    fn twisted_box_keeps_its_longer_trail() {
        let preset = Preset::find("twisted-box").expect("preset");
        assert_eq!(preset.blend.decay, [1.0, 0.98, 0.97]);
        assert!((preset.blend.blend_weight - 0.87).abs() < f32::EPSILON);
        let config = preset.config();
        assert_eq!(config.mode, PassMode::Feedback);
        assert_eq!(config.title, "twisted-box");
    }

    #[test]
    fn torus_runs_single_pass() {
        let preset = Preset::find("torus").expect("preset");
        assert_eq!(preset.mode, PassMode::Direct);
        assert_eq!(preset.config().logical_size, (1024, 1024));
        assert_eq!(preset.blend, FeedbackBlend::default());
    }
}

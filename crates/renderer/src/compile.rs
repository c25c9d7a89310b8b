//! WGSL validation and shader-module creation.
//!
//! Every shader goes through naga before it reaches `wgpu` so that a broken
//! user shader produces an annotated diagnostic instead of a device-lost
//! panic, and so that its resource interface can be checked against the
//! bindings the pipelines actually provide.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use naga::{AddressSpace, ImageClass, ImageDimension, ScalarKind, ShaderStage, TypeInner, VectorSize};

use crate::types::{PassMode, ShaderProgram};

pub const VERTEX_ENTRY: &str = "vertexMain";
pub const FRAGMENT_ENTRY: &str = "fragmentMain";

/// Shape of one `@group(0)` resource as seen by the shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingKind {
    UniformF32,
    UniformVec2,
    Texture2d,
    Sampler,
    Other(String),
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::UniformF32 => f.write_str("uniform f32"),
            BindingKind::UniformVec2 => f.write_str("uniform vec2<f32>"),
            BindingKind::Texture2d => f.write_str("texture_2d<f32>"),
            BindingKind::Sampler => f.write_str("sampler"),
            BindingKind::Other(description) => f.write_str(description),
        }
    }
}

/// Bindings a shader must declare for the pipeline it is used in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderContract {
    /// Single-pass scene: time and resolution.
    Direct,
    /// Feedback scene: time, resolution, previous frame and its sampler.
    Feedback,
    /// Presentation pass: source texture and sampler.
    Copy,
}

impl ShaderContract {
    pub fn for_mode(mode: PassMode) -> Self {
        match mode {
            PassMode::Direct => ShaderContract::Direct,
            PassMode::Feedback => ShaderContract::Feedback,
        }
    }

    pub fn bindings(self) -> &'static [(u32, BindingKind)] {
        const DIRECT: &[(u32, BindingKind)] =
            &[(0, BindingKind::UniformF32), (1, BindingKind::UniformVec2)];
        const FEEDBACK: &[(u32, BindingKind)] = &[
            (0, BindingKind::UniformF32),
            (1, BindingKind::UniformVec2),
            (2, BindingKind::Texture2d),
            (3, BindingKind::Sampler),
        ];
        const COPY: &[(u32, BindingKind)] = &[(0, BindingKind::Texture2d), (1, BindingKind::Sampler)];
        match self {
            ShaderContract::Direct => DIRECT,
            ShaderContract::Feedback => FEEDBACK,
            ShaderContract::Copy => COPY,
        }
    }
}

impl fmt::Display for ShaderContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderContract::Direct => f.write_str("single-pass"),
            ShaderContract::Feedback => f.write_str("feedback"),
            ShaderContract::Copy => f.write_str("copy"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShaderContractError {
    #[error("failed to parse WGSL:\n{0}")]
    Parse(String),
    #[error("WGSL validation failed:\n{0}")]
    Validation(String),
    #[error("missing {stage} entry point `{name}`")]
    MissingEntryPoint {
        name: &'static str,
        stage: &'static str,
    },
    #[error("{contract} shader is missing @group(0) @binding({binding}) ({expected})")]
    MissingBinding {
        contract: ShaderContract,
        binding: u32,
        expected: BindingKind,
    },
    #[error("@group(0) @binding({binding}) is {found}, expected {expected}")]
    BindingMismatch {
        binding: u32,
        expected: BindingKind,
        found: BindingKind,
    },
    #[error("{contract} pipeline provides nothing for @group({group}) @binding({binding})")]
    UnexpectedBinding {
        contract: ShaderContract,
        group: u32,
        binding: u32,
    },
}

/// Resource interface reflected from a validated shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderInterface {
    bindings: BTreeMap<u32, BindingKind>,
    overrides: Vec<String>,
}

impl ShaderInterface {
    pub fn bindings(&self) -> &BTreeMap<u32, BindingKind> {
        &self.bindings
    }

    /// Names of the pipeline-overridable constants the shader declares.
    pub fn overrides(&self) -> &[String] {
        &self.overrides
    }

    /// Keeps only the constants the shader declares; `wgpu` rejects the rest.
    pub fn filter_constants<'a>(&self, constants: &[(&'a str, f64)]) -> Vec<(&'a str, f64)> {
        constants
            .iter()
            .copied()
            .filter(|(name, _)| self.overrides.iter().any(|declared| declared == name))
            .collect()
    }
}

/// Parses, validates and reflects `source` without touching the GPU.
pub fn validate_wgsl(
    source: &str,
    contract: ShaderContract,
) -> Result<ShaderInterface, ShaderContractError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|err| ShaderContractError::Parse(err.emit_to_string(source)))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|err| ShaderContractError::Validation(err.emit_to_string(source)))?;

    for (name, stage, label) in [
        (VERTEX_ENTRY, ShaderStage::Vertex, "vertex"),
        (FRAGMENT_ENTRY, ShaderStage::Fragment, "fragment"),
    ] {
        let found = module
            .entry_points
            .iter()
            .any(|entry| entry.name == name && entry.stage == stage);
        if !found {
            return Err(ShaderContractError::MissingEntryPoint { name, stage: label });
        }
    }

    let mut bindings = BTreeMap::new();
    for (_, variable) in module.global_variables.iter() {
        let Some(binding) = &variable.binding else {
            continue;
        };
        if binding.group != 0 {
            return Err(ShaderContractError::UnexpectedBinding {
                contract,
                group: binding.group,
                binding: binding.binding,
            });
        }
        let kind = classify(&module, variable);
        bindings.insert(binding.binding, kind);
    }

    for (binding, expected) in contract.bindings() {
        match bindings.get(binding) {
            None => {
                return Err(ShaderContractError::MissingBinding {
                    contract,
                    binding: *binding,
                    expected: expected.clone(),
                })
            }
            Some(found) if found != expected => {
                return Err(ShaderContractError::BindingMismatch {
                    binding: *binding,
                    expected: expected.clone(),
                    found: found.clone(),
                })
            }
            Some(_) => {}
        }
    }
    if let Some(extra) = bindings
        .keys()
        .find(|binding| !contract.bindings().iter().any(|(known, _)| known == *binding))
    {
        return Err(ShaderContractError::UnexpectedBinding {
            contract,
            group: 0,
            binding: *extra,
        });
    }

    let overrides = module
        .overrides
        .iter()
        .filter_map(|(_, item)| item.name.clone())
        .collect();

    Ok(ShaderInterface {
        bindings,
        overrides,
    })
}

fn classify(module: &naga::Module, variable: &naga::GlobalVariable) -> BindingKind {
    let inner = &module.types[variable.ty].inner;
    match (variable.space, inner) {
        (AddressSpace::Uniform, TypeInner::Scalar(scalar))
            if scalar.kind == ScalarKind::Float && scalar.width == 4 =>
        {
            BindingKind::UniformF32
        }
        (
            AddressSpace::Uniform,
            TypeInner::Vector {
                size: VectorSize::Bi,
                scalar,
            },
        ) if scalar.kind == ScalarKind::Float && scalar.width == 4 => BindingKind::UniformVec2,
        (
            AddressSpace::Handle,
            TypeInner::Image {
                dim: ImageDimension::D2,
                arrayed: false,
                class:
                    ImageClass::Sampled {
                        kind: ScalarKind::Float,
                        multi: false,
                    },
            },
        ) => BindingKind::Texture2d,
        (AddressSpace::Handle, TypeInner::Sampler { comparison: false }) => BindingKind::Sampler,
        (space, inner) => BindingKind::Other(format!("{space:?} {inner:?}")),
    }
}

/// Validates `program` and turns it into a `wgpu` shader module.
pub(crate) fn compile_program(
    device: &wgpu::Device,
    program: &ShaderProgram,
    contract: ShaderContract,
) -> Result<(wgpu::ShaderModule, ShaderInterface)> {
    let interface = validate_wgsl(program.source(), contract)?;
    tracing::debug!(
        label = program.label(),
        %contract,
        overrides = ?interface.overrides(),
        "validated shader"
    );
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(program.label()),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(program.source().to_owned())),
    });
    Ok((module, interface))
}

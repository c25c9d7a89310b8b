use bytemuck::{Pod, Zeroable};

/// `@group(0) @binding(0) var<uniform> time: f32;`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TimeUniform {
    pub seconds: f32,
}

/// `@group(0) @binding(1) var<uniform> resolution: vec2f;`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ResolutionUniform {
    pub size: [f32; 2],
}

/// CPU mirror of the two uniform buffers.
///
/// Time changes every frame and resolution only on resize, so the two are
/// kept in separate buffers and written independently.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UniformBlock {
    pub time: TimeUniform,
    pub resolution: ResolutionUniform,
}

impl Default for TimeUniform {
    fn default() -> Self {
        Self { seconds: 0.0 }
    }
}

impl Default for ResolutionUniform {
    fn default() -> Self {
        Self { size: [0.0, 0.0] }
    }
}

impl UniformBlock {
    pub fn set_time(&mut self, seconds: f32) {
        self.time.seconds = seconds;
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.resolution.size = [width as f32, height as f32];
    }
}

/// GPU side of [`UniformBlock`].
pub(crate) struct UniformBuffers {
    pub time: wgpu::Buffer,
    pub resolution: wgpu::Buffer,
}

impl UniformBuffers {
    pub fn new(device: &wgpu::Device) -> Self {
        let time = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("time uniform"),
            size: std::mem::size_of::<TimeUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let resolution = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("resolution uniform"),
            size: std::mem::size_of::<ResolutionUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { time, resolution }
    }

    pub fn write_time(&self, queue: &wgpu::Queue, value: TimeUniform) {
        queue.write_buffer(&self.time, 0, bytemuck::bytes_of(&value));
    }

    pub fn write_resolution(&self, queue: &wgpu::Queue, value: ResolutionUniform) {
        queue.write_buffer(&self.resolution, 0, bytemuck::bytes_of(&value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_layouts_match_wgsl_sizes() {
        assert_eq!(std::mem::size_of::<TimeUniform>(), 4);
        assert_eq!(std::mem::size_of::<ResolutionUniform>(), 8);
    }

    #[test]
    fn resolution_bytes_are_two_packed_floats() {
        let mut block = UniformBlock::default();
        block.set_resolution(1600, 1200);
        let bytes = bytemuck::bytes_of(&block.resolution);
        assert_eq!(&bytes[0..4], &1600.0f32.to_ne_bytes());
        assert_eq!(&bytes[4..8], &1200.0f32.to_ne_bytes());
    }
}

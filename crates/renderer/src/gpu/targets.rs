use winit::dpi::PhysicalSize;

/// One half of the ping-pong pair: an off-screen colour texture in the
/// surface format plus the view both passes bind.
pub struct FeedbackTarget {
    texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
}

impl FeedbackTarget {
    pub(crate) fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// Frees the GPU memory now instead of when the last handle drops.
    pub(crate) fn destroy(self) {
        self.texture.destroy();
    }
}

impl std::fmt::Debug for FeedbackTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackTarget")
            .field("width", &self.texture.width())
            .field("height", &self.texture.height())
            .field("format", &self.texture.format())
            .finish()
    }
}

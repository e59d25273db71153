//! Render attachments
//!
//! Depth and multisample color targets sized to the surface. They are rebuilt
//! whenever the surface size or the sample count changes.

use crate::platform::Extent2d;

/// A GPU texture and the view render passes attach.
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl TextureResource {
    /// Standard depth buffer format used throughout the renderer
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Creates a depth attachment of `size` with `sample_count` samples.
    pub fn create_depth_texture(
        device: &wgpu::Device,
        size: Extent2d,
        sample_count: u32,
        label: &str,
    ) -> Self {
        Self::create_attachment(device, size, sample_count, Self::DEPTH_FORMAT, label)
    }

    /// Creates a multisampled color target that resolves into the surface.
    pub fn create_msaa_target(
        device: &wgpu::Device,
        size: Extent2d,
        sample_count: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self::create_attachment(device, size, sample_count, format, "msaa_color_target")
    }

    fn create_attachment(
        device: &wgpu::Device,
        size: Extent2d,
        sample_count: u32,
        format: wgpu::TextureFormat,
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
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }
}

/// The attachments of the scene pass for one surface size.
pub struct Attachments {
    pub size: Extent2d,
    pub sample_count: u32,
    pub depth: Option<TextureResource>,
    /// Present only when `sample_count > 1`
    pub msaa: Option<TextureResource>,
}

impl Attachments {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: Extent2d,
        sample_count: u32,
        depth: bool,
    ) -> Self {
        log::debug!(
            "creating attachments {}x{}, {} samples, depth {}",
            size.width,
            size.height,
            sample_count,
            depth
        );
        Self {
            size,
            sample_count,
            depth: depth.then(|| {
                TextureResource::create_depth_texture(device, size, sample_count, "depth_texture")
            }),
            msaa: (sample_count > 1)
                .then(|| TextureResource::create_msaa_target(device, size, sample_count, format)),
        }
    }

    pub fn matches(&self, size: Extent2d, sample_count: u32, depth: bool) -> bool {
        self.size == size && self.sample_count == sample_count && self.depth.is_some() == depth
    }
}

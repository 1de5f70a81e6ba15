use crate::error::ExportError;

/// Color format of the off-screen target.
///
/// Non-sRGB so readback bytes are exactly what the shader wrote.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Depth format of the off-screen target.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Off-screen color+depth attachment pair for one export session.
///
/// Sized exactly to the session's edge length at allocation, reused
/// unchanged for every object, and released exactly once at session end.
/// Never resized mid-session; a new size means a new session.
pub struct FrameResources {
    edge: u32,
    color: Option<wgpu::Texture>,
    depth: Option<wgpu::Texture>,
    color_view: Option<wgpu::TextureView>,
    depth_view: Option<wgpu::TextureView>,
}

impl FrameResources {
    /// Allocates the attachment pair.
    ///
    /// A refused allocation (validation or OOM) is the one fatal error kind:
    /// it maps to [`ExportError::ResourceAllocation`] and aborts the session
    /// before it starts.
    pub fn allocate(device: &wgpu::Device, edge: u32) -> Result<Self, ExportError> {
        let oom_scope = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let validation_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let size = wgpu::Extent3d {
            width: edge,
            height: edge,
            depth_or_array_layers: 1,
        };

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("iconforge export color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("iconforge export depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let validation = validation_scope.pop();
        let oom = oom_scope.pop();
        if let Err(e) = device.poll(wgpu::PollType::wait_indefinitely()) {
            log::warn!("device poll during target allocation failed: {e:?}");
        }
        let refused = pollster::block_on(validation).or(pollster::block_on(oom));
        if let Some(e) = refused {
            // Textures created under a failed scope are unusable; destroy
            // eagerly rather than waiting for drop.
            color.destroy();
            depth.destroy();
            return Err(ExportError::ResourceAllocation {
                edge,
                reason: e.to_string(),
            });
        }

        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            edge,
            color: Some(color),
            depth: Some(depth),
            color_view: Some(color_view),
            depth_view: Some(depth_view),
        })
    }

    /// Edge length in pixels (targets are square).
    pub fn edge(&self) -> u32 {
        self.edge
    }

    /// Color texture, while allocated.
    pub fn color(&self) -> Option<&wgpu::Texture> {
        self.color.as_ref()
    }

    /// Color attachment view, while allocated.
    pub fn color_view(&self) -> Option<&wgpu::TextureView> {
        self.color_view.as_ref()
    }

    /// Depth attachment view, while allocated.
    pub fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.depth_view.as_ref()
    }

    /// Releases both attachments.
    ///
    /// Idempotent: safe to call repeatedly, including after a failed
    /// allocation. Callers must have drained in-flight readbacks first; the
    /// orchestrator guarantees this ordering.
    pub fn release(&mut self) {
        self.color_view = None;
        self.depth_view = None;
        if let Some(t) = self.color.take() {
            t.destroy();
        }
        if let Some(t) = self.depth.take() {
            t.destroy();
        }
    }
}

impl Drop for FrameResources {
    fn drop(&mut self) {
        self.release();
    }
}

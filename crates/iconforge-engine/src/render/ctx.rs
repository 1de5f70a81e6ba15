/// Renderer-facing context (device/queue + target format + edge length).
///
/// This is intentionally small and stable.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub target_format: wgpu::TextureFormat,
    /// Edge length of the square target, in pixels.
    pub edge: u32,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        target_format: wgpu::TextureFormat,
        edge: u32,
    ) -> Self {
        Self {
            device,
            queue,
            target_format,
            edge,
        }
    }
}

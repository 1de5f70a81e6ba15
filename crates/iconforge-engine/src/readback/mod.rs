//! GPU→CPU frame readback.
//!
//! One capture per rendered object: the color texture is copied into a fresh
//! transfer buffer and mapped asynchronously. The completion callback may
//! fire on the render thread (during a device pump) or on a driver thread;
//! either way it only touches thread-safe state and the transfer buffer is
//! released before it returns.

mod image;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub use image::{PixelImage, aligned_bytes_per_row};

/// Counts captures between dispatch and completion.
///
/// Session teardown drains until this reaches zero before releasing GPU
/// resources, so a target can never be destroyed under an in-flight copy.
#[derive(Debug, Default)]
pub struct InFlight(AtomicUsize);

impl InFlight {
    pub fn begin(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn end(&self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Copies `texture` into a transfer buffer and registers the map completion.
///
/// Exactly one of `on_image` / `on_error` runs, once, after the GPU signals
/// the copy; `in_flight` pairs each dispatch with that completion. The
/// buffer is unmapped and dropped immediately after the image is built.
/// Issuing the capture never blocks the calling thread.
pub fn capture_frame<F, E>(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    in_flight: Arc<InFlight>,
    on_image: F,
    on_error: E,
) where
    F: FnOnce(PixelImage) + Send + 'static,
    E: FnOnce(wgpu::BufferAsyncError) + Send + 'static,
{
    let width = texture.width();
    let height = texture.height();
    let stride = aligned_bytes_per_row(width);

    let buffer = Arc::new(device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("iconforge transfer buffer"),
        size: stride as u64 * height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    }));

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("iconforge capture encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(stride),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    in_flight.begin();
    let cb_buffer = Arc::clone(&buffer);
    buffer
        .slice(..)
        .map_async(wgpu::MapMode::Read, move |result| {
            match result {
                Ok(()) => {
                    let image = {
                        let view = cb_buffer.slice(..).get_mapped_range();
                        PixelImage::from_padded_rows(width, height, stride, &view)
                    };
                    cb_buffer.unmap();
                    drop(cb_buffer);
                    on_image(image);
                }
                Err(e) => on_error(e),
            }
            in_flight.end();
        });
}

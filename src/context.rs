//! Frame context: draw-call queue, sorting, and submission.
//!
//! A [`RenderContext`] owns the renderable arena and one fixed-capacity
//! frame queue. Callers push [`DrawCall`]s during the frame; at flush the
//! queue is sorted by each renderable's packed [`RenderState`] key and
//! submitted in order, so opaque/background/fullscreen content lands
//! before translucent overlays.
//!
//! There is no implicit global context. Every operation takes the
//! context and the device explicitly, so multiple independent contexts
//! can coexist (typically one per render target).
//!
//! # Example
//!
//! ```
//! use imdraw::backend::DummyBackend;
//! use imdraw::{
//!     BufferUsage, DrawCall, PrimitiveTopology, RenderContext, ScalarType, Shader,
//!     VertexLayout,
//! };
//! use std::sync::Arc;
//!
//! let mut device = DummyBackend::new();
//! let mut ctx = RenderContext::new(64);
//!
//! let mut layout = VertexLayout::new(
//!     1024,
//!     12,
//!     PrimitiveTopology::Triangles,
//!     BufferUsage::Streamed,
//! );
//! layout.add_attribute("a_position", 3, ScalarType::Float, 0).unwrap();
//!
//! let shader = Arc::new(
//!     Shader::load(&mut device, "attribute vec3 a_position;", "").unwrap(),
//! );
//! let triangle = ctx.create_renderable(layout);
//! ctx.bind_shader(&mut device, triangle, shader).unwrap();
//!
//! let vertices: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
//! ctx.submit(DrawCall::new(triangle, bytemuck::cast_slice(&vertices)))
//!     .unwrap();
//! ctx.flush(&mut device, || { /* swap buffers */ }).unwrap();
//! ```

use std::sync::Arc;

use slotmap::SlotMap;

use crate::backend::{AttributeBinding, GpuBackend, TextureHandle};
use crate::error::GraphicsError;
use crate::renderable::Renderable;
use crate::shader::Shader;
use crate::types::{BufferUsage, RenderState, VertexLayout};

slotmap::new_key_type! {
    /// Key addressing a renderable inside its [`RenderContext`].
    pub struct RenderableId;
}

/// Maximum number of textures one draw call may bind.
pub const MAX_DRAW_CALL_TEXTURES: usize = 8;

/// One frame's request to draw a renderable's next vertex region.
///
/// The vertex bytes and texture list are borrowed only for the duration
/// of [`RenderContext::submit`], which copies them into the queue's
/// preallocated staging storage.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    renderable: RenderableId,
    data: &'a [u8],
    textures: &'a [TextureHandle],
}

impl<'a> DrawCall<'a> {
    /// Create a draw call for `renderable` with interleaved vertex bytes.
    ///
    /// `data` must be a whole number of vertices (`len % stride == 0`);
    /// the vertex count is derived from it.
    pub fn new(renderable: RenderableId, data: &'a [u8]) -> Self {
        Self {
            renderable,
            data,
            textures: &[],
        }
    }

    /// Bind textures to texture units `0..textures.len()` for this draw.
    pub fn with_textures(mut self, textures: &'a [TextureHandle]) -> Self {
        self.textures = textures;
        self
    }
}

#[derive(Debug)]
struct QueuedCall {
    renderable: RenderableId,
    vertex_count: u32,
    data: Vec<u8>,
    textures: [TextureHandle; MAX_DRAW_CALL_TEXTURES],
    texture_count: usize,
}

/// Frame controller: renderable arena plus one fixed-capacity draw queue.
#[derive(Debug)]
pub struct RenderContext {
    renderables: SlotMap<RenderableId, Renderable>,
    calls: Vec<QueuedCall>,
    count: usize,
    max_draw_calls: usize,
}

impl RenderContext {
    /// Create a context whose frame queue holds at most `max_draw_calls`
    /// calls. The capacity is fixed for the context's lifetime.
    pub fn new(max_draw_calls: usize) -> Self {
        Self {
            renderables: SlotMap::with_key(),
            calls: Vec::with_capacity(max_draw_calls),
            count: 0,
            max_draw_calls,
        }
    }

    /// Frame queue capacity.
    pub fn capacity(&self) -> usize {
        self.max_draw_calls
    }

    /// Number of calls queued for the current frame.
    pub fn pending(&self) -> usize {
        self.count
    }

    /// Create an empty renderable from a layout. Bind a shader with
    /// [`bind_shader`](Self::bind_shader) before drawing it.
    pub fn create_renderable(&mut self, layout: VertexLayout) -> RenderableId {
        self.renderables.insert(Renderable::new(layout))
    }

    /// Destroy a renderable, releasing its device buffers and fences.
    pub fn destroy_renderable(
        &mut self,
        device: &mut dyn GpuBackend,
        id: RenderableId,
    ) -> Result<(), GraphicsError> {
        let mut renderable = self
            .renderables
            .remove(id)
            .ok_or(GraphicsError::RenderableNotFound)?;
        renderable.release(device);
        Ok(())
    }

    /// Borrow a renderable.
    pub fn renderable(&self, id: RenderableId) -> Option<&Renderable> {
        self.renderables.get(id)
    }

    /// Mutably borrow a renderable.
    pub fn renderable_mut(&mut self, id: RenderableId) -> Option<&mut Renderable> {
        self.renderables.get_mut(id)
    }

    /// Bind a shader to a renderable (once), validating its layout
    /// against the program and allocating the streaming slots.
    pub fn bind_shader(
        &mut self,
        device: &mut dyn GpuBackend,
        id: RenderableId,
        shader: Arc<Shader>,
    ) -> Result<(), GraphicsError> {
        self.renderables
            .get_mut(id)
            .ok_or(GraphicsError::RenderableNotFound)?
            .bind_shader(device, shader)
    }

    /// Set a renderable's draw-order sort key.
    pub fn set_render_state(
        &mut self,
        id: RenderableId,
        state: RenderState,
    ) -> Result<(), GraphicsError> {
        self.renderables
            .get_mut(id)
            .ok_or(GraphicsError::RenderableNotFound)?
            .set_state(state);
        Ok(())
    }

    /// Queue a draw call for the current frame.
    ///
    /// # Errors
    ///
    /// - [`GraphicsError::CapacityExceeded`] when the queue is full or
    ///   the call binds more than [`MAX_DRAW_CALL_TEXTURES`] textures.
    /// - [`GraphicsError::RenderableNotFound`] for a dead id.
    /// - [`GraphicsError::InvalidParameter`] when the byte length is not
    ///   a whole number of vertices.
    pub fn submit(&mut self, call: DrawCall<'_>) -> Result<(), GraphicsError> {
        if self.count >= self.max_draw_calls {
            return Err(GraphicsError::CapacityExceeded(format!(
                "frame queue is full (capacity {})",
                self.max_draw_calls
            )));
        }
        let renderable = self
            .renderables
            .get(call.renderable)
            .ok_or(GraphicsError::RenderableNotFound)?;

        let stride = renderable.layout().stride() as usize;
        if stride == 0 || call.data.len() % stride != 0 {
            return Err(GraphicsError::InvalidParameter(format!(
                "vertex data length {} is not a multiple of stride {stride}",
                call.data.len()
            )));
        }
        let vertex_count = (call.data.len() / stride) as u32;

        if call.textures.len() > MAX_DRAW_CALL_TEXTURES {
            return Err(GraphicsError::CapacityExceeded(format!(
                "a draw call binds at most {MAX_DRAW_CALL_TEXTURES} textures"
            )));
        }
        let mut textures = [TextureHandle(0); MAX_DRAW_CALL_TEXTURES];
        textures[..call.textures.len()].copy_from_slice(call.textures);

        // Queue slots (and their staging allocations) are reused across
        // frames; the queue only grows up to its fixed capacity.
        if self.count == self.calls.len() {
            self.calls.push(QueuedCall {
                renderable: call.renderable,
                vertex_count,
                data: call.data.to_vec(),
                textures,
                texture_count: call.textures.len(),
            });
        } else {
            let slot = &mut self.calls[self.count];
            slot.renderable = call.renderable;
            slot.vertex_count = vertex_count;
            slot.data.clear();
            slot.data.extend_from_slice(call.data);
            slot.textures = textures;
            slot.texture_count = call.textures.len();
        }
        self.count += 1;

        log::trace!(
            "queued draw call {}/{}: {vertex_count} vertices",
            self.count,
            self.max_draw_calls
        );
        Ok(())
    }

    /// Clear the target, sort the queue by render-state key, and submit
    /// every queued call in order. The queue is left intact; use
    /// [`flush`](Self::flush) to complete the frame.
    pub fn present(&mut self, device: &mut dyn GpuBackend) -> Result<(), GraphicsError> {
        device.clear();

        let Self {
            renderables,
            calls,
            count,
            ..
        } = self;
        let count = *count;

        // Single unsigned comparison per pair; ties are left in
        // unspecified order.
        calls[..count].sort_unstable_by_key(|call| {
            renderables
                .get(call.renderable)
                .map_or(u64::MAX, |r| r.state().key())
        });

        log::trace!("presenting {count} draw call(s)");
        for call in calls[..count].iter() {
            let renderable = renderables
                .get_mut(call.renderable)
                .ok_or(GraphicsError::RenderableNotFound)?;
            let shader = Arc::clone(renderable.shader().ok_or(GraphicsError::ShaderNotBound)?);

            // Static geometry uploads once; streamed geometry maps a
            // fresh region every call.
            let skip_upload = renderable.layout().usage() == BufferUsage::Static
                && !renderable.needs_fence();
            if !skip_upload {
                let dst = renderable.map_for_write(device, call.vertex_count)?;
                dst.copy_from_slice(&call.data);
                let buffer = renderable
                    .active_buffer()
                    .ok_or(GraphicsError::ShaderNotBound)?;
                device.unmap(buffer);
            }

            let buffer = renderable
                .active_buffer()
                .ok_or(GraphicsError::ShaderNotBound)?;
            shader.activate(device);
            device.bind_buffer(Some(buffer));

            let stride = renderable.layout().stride();
            for attribute in renderable.layout().attributes() {
                device.enable_attribute(&AttributeBinding {
                    location: attribute.location(),
                    elements: attribute.elements(),
                    scalar: attribute.scalar(),
                    stride,
                    offset: attribute.offset(),
                });
            }
            for (unit, texture) in call.textures[..call.texture_count].iter().enumerate() {
                device.bind_texture(unit as u32, *texture);
            }

            let (start, end) = renderable.region();
            device.draw_arrays(renderable.layout().topology(), start, end - start);

            if renderable.needs_fence() {
                renderable.record_fence(device);
            }

            // Unwind per-call device state so nothing leaks across draws.
            for attribute in renderable.layout().attributes() {
                device.disable_attribute(attribute.location());
            }
            device.bind_buffer(None);
            Shader::deactivate(device);
        }

        Ok(())
    }

    /// Present, reset the queue, and invoke the buffer-swap callback.
    pub fn flush(
        &mut self,
        device: &mut dyn GpuBackend,
        swap: impl FnOnce(),
    ) -> Result<(), GraphicsError> {
        self.present(device)?;
        self.count = 0;
        swap();
        Ok(())
    }

    /// Destroy the context, releasing every renderable's device
    /// resources.
    pub fn destroy(mut self, device: &mut dyn GpuBackend) {
        for (_, renderable) in self.renderables.iter_mut() {
            renderable.release(device);
        }
        log::debug!("render context destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;
    use crate::types::{PrimitiveTopology, ScalarType};

    fn make_layout(usage: BufferUsage) -> VertexLayout {
        let mut layout = VertexLayout::new(64, 4, PrimitiveTopology::Points, usage);
        layout
            .add_attribute("a_value", 1, ScalarType::Float, 0)
            .unwrap();
        layout
    }

    fn bound_renderable(
        ctx: &mut RenderContext,
        device: &mut DummyBackend,
        usage: BufferUsage,
    ) -> RenderableId {
        let shader =
            Arc::new(Shader::load(device, "attribute float a_value;", "").unwrap());
        let id = ctx.create_renderable(make_layout(usage));
        ctx.bind_shader(device, id, shader).unwrap();
        id
    }

    #[test]
    fn test_queue_capacity_is_fixed() {
        let mut device = DummyBackend::new();
        let mut ctx = RenderContext::new(2);
        let id = bound_renderable(&mut ctx, &mut device, BufferUsage::Streamed);

        let data = [0u8; 4];
        ctx.submit(DrawCall::new(id, &data)).unwrap();
        ctx.submit(DrawCall::new(id, &data)).unwrap();
        let err = ctx.submit(DrawCall::new(id, &data)).unwrap_err();
        assert!(matches!(err, GraphicsError::CapacityExceeded(_)));
        assert_eq!(ctx.pending(), 2);
    }

    #[test]
    fn test_submit_validates_stride() {
        let mut device = DummyBackend::new();
        let mut ctx = RenderContext::new(4);
        let id = bound_renderable(&mut ctx, &mut device, BufferUsage::Streamed);

        let err = ctx.submit(DrawCall::new(id, &[0u8; 3])).unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidParameter(_)));
    }

    #[test]
    fn test_submit_validates_texture_count() {
        let mut device = DummyBackend::new();
        let mut ctx = RenderContext::new(4);
        let id = bound_renderable(&mut ctx, &mut device, BufferUsage::Streamed);

        let textures = [TextureHandle(1); MAX_DRAW_CALL_TEXTURES + 1];
        let err = ctx
            .submit(DrawCall::new(id, &[0u8; 4]).with_textures(&textures))
            .unwrap_err();
        assert!(matches!(err, GraphicsError::CapacityExceeded(_)));
    }

    #[test]
    fn test_submit_unknown_renderable() {
        let mut device = DummyBackend::new();
        let mut ctx = RenderContext::new(4);
        let id = bound_renderable(&mut ctx, &mut device, BufferUsage::Streamed);
        ctx.destroy_renderable(&mut device, id).unwrap();

        let err = ctx.submit(DrawCall::new(id, &[0u8; 4])).unwrap_err();
        assert!(matches!(err, GraphicsError::RenderableNotFound));
    }

    #[test]
    fn test_present_without_shader_fails() {
        let mut device = DummyBackend::new();
        let mut ctx = RenderContext::new(4);
        let id = ctx.create_renderable(make_layout(BufferUsage::Streamed));

        ctx.submit(DrawCall::new(id, &[0u8; 4])).unwrap();
        let err = ctx.present(&mut device).unwrap_err();
        assert!(matches!(err, GraphicsError::ShaderNotBound));
    }

    #[test]
    fn test_flush_resets_queue_and_swaps() {
        let mut device = DummyBackend::new();
        let mut ctx = RenderContext::new(4);
        let id = bound_renderable(&mut ctx, &mut device, BufferUsage::Streamed);

        ctx.submit(DrawCall::new(id, &[0u8; 8])).unwrap();
        assert_eq!(ctx.pending(), 1);

        let mut swapped = false;
        ctx.flush(&mut device, || swapped = true).unwrap();
        assert!(swapped);
        assert_eq!(ctx.pending(), 0);
        assert_eq!(device.clear_count(), 1);
        assert_eq!(device.draws().len(), 1);
    }

    #[test]
    fn test_present_empty_queue() {
        let mut device = DummyBackend::new();
        let mut ctx = RenderContext::new(4);
        ctx.present(&mut device).unwrap();
        assert_eq!(device.clear_count(), 1);
        assert!(device.draws().is_empty());
    }

    #[test]
    fn test_destroy_releases_resources() {
        let mut device = DummyBackend::new();
        let mut ctx = RenderContext::new(4);
        bound_renderable(&mut ctx, &mut device, BufferUsage::Streamed);
        bound_renderable(&mut ctx, &mut device, BufferUsage::Static);
        assert!(device.live_buffer_count() > 0);

        ctx.destroy(&mut device);
        assert_eq!(device.live_buffer_count(), 0);
        assert_eq!(device.live_fence_count(), 0);
    }
}

//! Renderables and their streamed vertex storage.
//!
//! A [`Renderable`] couples a [`VertexLayout`] with a bound [`Shader`],
//! a [`RenderState`] sort key, and the device buffers its vertex data
//! streams through. Storage is a bounded ring of buffer slots: one slot
//! for [`BufferUsage::Static`] geometry, [`STREAM_SLOT_COUNT`] slots for
//! [`BufferUsage::Streamed`].
//!
//! # Streaming discipline
//!
//! Each frame's vertex data is written into a fresh region of the active
//! slot. When a region would overflow the slot, the ring advances to the
//! next slot after waiting on that slot's fence, which was recorded
//! after the last draw that read from it. The wait is bounded by
//! [`FENCE_TIMEOUT`]; hitting it means the CPU is more than
//! `STREAM_SLOT_COUNT - 1` frames ahead of the GPU and the caller is
//! GPU-bound. Because the fence wait guarantees the GPU is done with the
//! slot, regions are mapped write-only and unsynchronized.
//!
//! Fences are one-shot: consumed (waited on, then deleted) exactly once,
//! when their slot is about to be rewritten. A slot whose fence was
//! already consumed maps again without waiting.

use std::sync::Arc;
use std::time::Duration;

use crate::backend::{BufferHandle, FenceHandle, FenceStatus, GpuBackend, MapFlags};
use crate::error::GraphicsError;
use crate::hash::name_hash;
use crate::shader::Shader;
use crate::types::{BufferUsage, RenderState, VertexLayout};

/// Number of ring slots backing a streamed renderable.
///
/// The CPU can run `STREAM_SLOT_COUNT - 1` frames ahead of the GPU
/// before the ring blocks on a fence.
pub const STREAM_SLOT_COUNT: usize = 3;

/// Budget for one fence wait during slot rotation.
pub const FENCE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct StreamSlot {
    buffer: BufferHandle,
    fence: Option<FenceHandle>,
}

/// A drawable entity: layout + shader + render state + streaming slots.
///
/// Created through
/// [`RenderContext::create_renderable`](crate::context::RenderContext::create_renderable)
/// and addressed by its [`RenderableId`](crate::context::RenderableId).
#[derive(Debug)]
pub struct Renderable {
    layout: VertexLayout,
    shader: Option<Arc<Shader>>,
    state: RenderState,
    region_start: u32,
    region_end: u32,
    slot_index: usize,
    slots: Vec<StreamSlot>,
    needs_fence: bool,
}

impl Renderable {
    pub(crate) fn new(layout: VertexLayout) -> Self {
        Self {
            layout,
            shader: None,
            state: RenderState::new(),
            region_start: 0,
            region_end: 0,
            slot_index: 0,
            slots: Vec::new(),
            needs_fence: false,
        }
    }

    /// The vertex layout.
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// The bound shader, if any.
    pub fn shader(&self) -> Option<&Arc<Shader>> {
        self.shader.as_ref()
    }

    /// The draw-order sort key.
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Set the draw-order sort key.
    pub fn set_state(&mut self, state: RenderState) {
        self.state = state;
    }

    /// Whether a shader has been bound (and device storage allocated).
    pub fn is_bound(&self) -> bool {
        self.shader.is_some()
    }

    /// The buffer of the active ring slot, once bound.
    pub fn active_buffer(&self) -> Option<BufferHandle> {
        self.slots.get(self.slot_index).map(|slot| slot.buffer)
    }

    /// The current write region in vertices, `(start, end)`.
    pub fn region(&self) -> (u32, u32) {
        (self.region_start, self.region_end)
    }

    /// Index of the active ring slot.
    pub fn slot_index(&self) -> usize {
        self.slot_index
    }

    /// Number of ring slots (0 before binding).
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Whether the next draw must record a new fence for the active slot.
    pub fn needs_fence(&self) -> bool {
        self.needs_fence
    }

    /// Bind a shader, validating the vertex layout against the program's
    /// introspected attributes, then allocate one device buffer and one
    /// initial fence per ring slot. Callable exactly once.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::ShaderAlreadyBound`] on a second bind;
    /// [`GraphicsError::LayoutMismatch`] when the attribute counts
    /// differ, a shader attribute has no declared counterpart, or the
    /// scalar types disagree.
    pub(crate) fn bind_shader(
        &mut self,
        device: &mut dyn GpuBackend,
        shader: Arc<Shader>,
    ) -> Result<(), GraphicsError> {
        if self.shader.is_some() {
            return Err(GraphicsError::ShaderAlreadyBound);
        }

        let introspected = device.active_attributes(shader.program())?;
        if introspected.len() != self.layout.attributes().len() {
            return Err(GraphicsError::LayoutMismatch(format!(
                "layout declares {} attributes, shader reports {}",
                self.layout.attributes().len(),
                introspected.len()
            )));
        }

        // Attribute locations follow the shader's introspection order.
        // This is the primary contract catching layout/shader skew.
        for (location, info) in introspected.iter().enumerate() {
            let hash = name_hash(&info.name);
            let attribute = self.layout.attribute_by_hash_mut(hash).ok_or_else(|| {
                GraphicsError::LayoutMismatch(format!(
                    "shader attribute \"{}\" has no declared counterpart",
                    info.name
                ))
            })?;
            if attribute.scalar() != info.scalar {
                return Err(GraphicsError::LayoutMismatch(format!(
                    "attribute \"{}\" declared {:?}, shader wants {:?}",
                    info.name,
                    attribute.scalar(),
                    info.scalar
                )));
            }
            #[cfg(feature = "debug-checks")]
            if attribute.elements() != info.elements {
                return Err(GraphicsError::LayoutMismatch(format!(
                    "attribute \"{}\" declared {} elements, shader wants {}",
                    info.name,
                    attribute.elements(),
                    info.elements
                )));
            }
            attribute.set_location(location as u32);
        }

        let slot_count = match self.layout.usage() {
            BufferUsage::Static => 1,
            BufferUsage::Streamed => STREAM_SLOT_COUNT,
        };
        let slot_size = self.layout.slot_size_bytes();
        for _ in 0..slot_count {
            let buffer = device.allocate_buffer(slot_size, self.layout.usage())?;
            let fence = device.create_fence();
            self.slots.push(StreamSlot {
                buffer,
                fence: Some(fence),
            });
        }

        // A static renderable uploads exactly once and records exactly
        // one fence after its first draw.
        self.needs_fence = self.layout.usage() == BufferUsage::Static;
        self.shader = Some(shader);
        log::debug!(
            "bound shader to renderable: {slot_count} slot(s) of {slot_size} bytes"
        );
        Ok(())
    }

    /// Reserve the next write region and map it for writing.
    ///
    /// Advances the region contiguously while it fits in the active
    /// slot; otherwise rotates to the next slot, consuming its fence
    /// first (bounded by [`FENCE_TIMEOUT`]), and restarts the region at
    /// 0. Call [`GpuBackend::unmap`] on [`Self::active_buffer`] when the
    /// write is done.
    ///
    /// # Errors
    ///
    /// - [`GraphicsError::ShaderNotBound`] before [`bind_shader`].
    /// - [`GraphicsError::CapacityExceeded`] when `vertex_count` exceeds
    ///   the layout capacity, or when a static renderable would need to
    ///   rotate (static storage holds exactly one region).
    /// - [`GraphicsError::FenceTimeout`] when the consumed slot's fence
    ///   does not signal within budget.
    /// - [`GraphicsError::MapFailed`] when the device cannot map the
    ///   range.
    ///
    /// [`bind_shader`]: crate::context::RenderContext::bind_shader
    pub fn map_for_write<'d>(
        &mut self,
        device: &'d mut dyn GpuBackend,
        vertex_count: u32,
    ) -> Result<&'d mut [u8], GraphicsError> {
        if self.slots.is_empty() {
            return Err(GraphicsError::ShaderNotBound);
        }
        let capacity = self.layout.capacity();
        if vertex_count > capacity {
            return Err(GraphicsError::CapacityExceeded(format!(
                "{vertex_count} vertices do not fit a buffer of capacity {capacity}; \
                 split the draw or enlarge the layout"
            )));
        }

        let new_end = u64::from(self.region_end) + u64::from(vertex_count);
        if new_end > u64::from(capacity) {
            if self.layout.usage() == BufferUsage::Static {
                return Err(GraphicsError::CapacityExceeded(format!(
                    "static renderable overflow: region end {} + {vertex_count} exceeds \
                     capacity {capacity}",
                    self.region_end
                )));
            }

            self.slot_index = (self.slot_index + 1) % self.slots.len();
            let slot = &mut self.slots[self.slot_index];

            // The slot's fence guards the last draw that read from it.
            // If we stall here the caller is GPU-bound.
            if let Some(fence) = slot.fence.take() {
                match device.wait_fence(fence, FENCE_TIMEOUT) {
                    FenceStatus::Signaled => device.delete_fence(fence),
                    FenceStatus::TimedOut | FenceStatus::Failed => {
                        slot.fence = Some(fence);
                        return Err(GraphicsError::FenceTimeout(FENCE_TIMEOUT));
                    }
                }
            }

            self.region_start = 0;
            self.region_end = vertex_count;
            self.needs_fence = true;
            log::trace!(
                "rotated to slot {} for {vertex_count} vertices",
                self.slot_index
            );
        } else {
            self.region_start = self.region_end;
            self.region_end = new_end as u32;
        }

        let stride = u64::from(self.layout.stride());
        let offset = u64::from(self.region_start) * stride;
        let size = u64::from(self.region_end - self.region_start) * stride;
        let buffer = self.slots[self.slot_index].buffer;
        device.map_range(
            buffer,
            offset,
            size,
            MapFlags::WRITE | MapFlags::UNSYNCHRONIZED,
        )
    }

    /// Record a fence for the active slot after a draw, replacing any
    /// stale fence, and clear the needs-fence flag.
    pub(crate) fn record_fence(&mut self, device: &mut dyn GpuBackend) {
        let slot = &mut self.slots[self.slot_index];
        if let Some(stale) = slot.fence.take() {
            device.delete_fence(stale);
        }
        slot.fence = Some(device.create_fence());
        self.needs_fence = false;
    }

    /// Release all slot buffers and fences back to the device.
    pub(crate) fn release(&mut self, device: &mut dyn GpuBackend) {
        for slot in self.slots.drain(..) {
            device.delete_buffer(slot.buffer);
            if let Some(fence) = slot.fence {
                device.delete_fence(fence);
            }
        }
        self.shader = None;
        self.region_start = 0;
        self.region_end = 0;
        self.slot_index = 0;
        self.needs_fence = false;
    }
}

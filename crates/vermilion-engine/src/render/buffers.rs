use anyhow::{Context, Result, anyhow};

use super::quad::{INDICES_PER_QUAD, VERTICES_PER_QUAD, Vertex};

/// Initial GPU capacity in quads; amortizes allocation for typical UI and
/// sprite workloads.
pub const INITIAL_QUAD_CAPACITY: u32 = 4096;

const INDEX_SIZE: u64 = std::mem::size_of::<u32>() as u64;

/// Sizing policy for the GPU buffer trio, measured in quads.
///
/// Pure arithmetic, separated from the wgpu resources so the growth rules
/// are testable without a device.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BufferBudget {
    capacity: u32,
}

impl BufferBudget {
    pub const fn new(capacity: u32) -> Self {
        Self { capacity }
    }

    pub fn capacity(self) -> u32 {
        self.capacity
    }

    pub fn fits(self, quads: u32) -> bool {
        quads <= self.capacity
    }

    /// Byte size of the vertex buffer at this capacity.
    pub fn vertex_bytes(self) -> u64 {
        self.capacity as u64 * VERTICES_PER_QUAD as u64 * std::mem::size_of::<Vertex>() as u64
    }

    /// Byte size of the index buffer at this capacity.
    pub fn index_bytes(self) -> u64 {
        self.capacity as u64 * INDICES_PER_QUAD as u64 * INDEX_SIZE
    }

    /// Byte size of the transfer buffer: always large enough to stage a full
    /// vertex + index upload at this capacity. Grows in lockstep with the
    /// device buffers by construction.
    pub fn staging_bytes(self) -> u64 {
        self.vertex_bytes() + self.index_bytes()
    }

    /// Next budget able to hold `required_quads`: at least a doubling, more
    /// when a single frame demands it. Capacity never shrinks.
    pub fn grown(self, required_quads: u32) -> Self {
        Self::new(required_quads.max(self.capacity.saturating_mul(2)))
    }
}

impl Default for BufferBudget {
    fn default() -> Self {
        Self::new(INITIAL_QUAD_CAPACITY)
    }
}

/// One generation of device-resident storage.
struct BufferSet {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    staging: wgpu::Buffer,
}

impl BufferSet {
    /// Teardown in fixed order: transfer buffer, then index, then vertex.
    fn destroy(self) {
        self.staging.destroy();
        self.index.destroy();
        self.vertex.destroy();
    }
}

/// Owns the device-resident vertex/index buffers and the transfer buffer
/// used to stage CPU data, and applies the growth policy.
///
/// Sole owner of these resources: nothing else holds a buffer reference
/// across a growth event, and the render pass re-fetches `current()` right
/// before binding, so a draw can never see a stale generation.
pub struct QuadBuffers {
    budget: BufferBudget,
    generation: u64,
    set: Option<BufferSet>,
}

impl QuadBuffers {
    /// Creates the buffer trio at the given budget.
    ///
    /// Allocation failure is unrecoverable for the renderer: the error
    /// carries the wgpu message and the caller is expected to log it and
    /// abort startup rather than retry.
    pub fn new(device: &wgpu::Device, budget: BufferBudget) -> Result<Self> {
        let set = create_set(device, budget).context("failed to create quad buffers")?;

        Ok(Self {
            budget,
            generation: 0,
            set: Some(set),
        })
    }

    /// Capacity in quads.
    pub fn capacity(&self) -> u32 {
        self.budget.capacity()
    }

    /// Resource generation; bumps every time growth replaces the buffers.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Grows the buffer trio when `required_quads` exceeds capacity.
    ///
    /// Batches are per-frame, so nothing is copied from the old buffers;
    /// they are destroyed once the replacement exists. Runs strictly between
    /// frames on the render thread, so no in-flight draw can reference the
    /// old generation.
    pub fn ensure_capacity(&mut self, device: &wgpu::Device, required_quads: u32) -> Result<()> {
        if self.set.is_none() {
            return Err(released());
        }
        if self.budget.fits(required_quads) {
            return Ok(());
        }

        let grown = self.budget.grown(required_quads);
        let new_set = create_set(device, grown)
            .with_context(|| format!("failed to grow quad buffers to {} quads", grown.capacity()))?;

        if let Some(old) = self.set.replace(new_set) {
            old.destroy();
        }

        log::debug!(
            "quad buffers grown: {} -> {} quads (generation {})",
            self.budget.capacity(),
            grown.capacity(),
            self.generation + 1
        );

        self.budget = grown;
        self.generation += 1;
        Ok(())
    }

    /// Stages the CPU arrays into the transfer buffer and records the
    /// device-side copies into `encoder`.
    ///
    /// Both the queued staging writes and the recorded copies land in the
    /// same submission, ahead of the render pass, so the data is visible to
    /// the frame's draw call.
    pub fn upload(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<()> {
        let set = self.set.as_ref().ok_or_else(released)?;

        let vertex_bytes = std::mem::size_of_val(vertices) as u64;
        let index_bytes = std::mem::size_of_val(indices) as u64;
        debug_assert!(vertex_bytes <= self.budget.vertex_bytes());
        debug_assert!(index_bytes <= self.budget.index_bytes());

        // Vertices at offset 0, indices after the full vertex region; the
        // index offset is constant per generation, so both stay 4-byte
        // aligned for the copies below.
        let index_offset = self.budget.vertex_bytes();
        queue.write_buffer(&set.staging, 0, bytemuck::cast_slice(vertices));
        queue.write_buffer(&set.staging, index_offset, bytemuck::cast_slice(indices));

        encoder.copy_buffer_to_buffer(&set.staging, 0, &set.vertex, 0, vertex_bytes);
        encoder.copy_buffer_to_buffer(&set.staging, index_offset, &set.index, 0, index_bytes);
        Ok(())
    }

    /// Current-generation vertex and index buffers, for binding immediately
    /// before the draw. Callers must not hold these across a frame boundary.
    pub fn current(&self) -> Result<(&wgpu::Buffer, &wgpu::Buffer)> {
        let set = self.set.as_ref().ok_or_else(released)?;
        Ok((&set.vertex, &set.index))
    }

    /// Deterministic teardown: transfer buffer, index buffer, vertex buffer,
    /// in that order. A second release, or any upload/bind afterwards, is
    /// rejected with an error rather than left undefined.
    pub fn release(&mut self) -> Result<()> {
        let set = self.set.take().ok_or_else(released)?;
        set.destroy();
        Ok(())
    }
}

fn released() -> anyhow::Error {
    anyhow!("quad buffers already released")
}

/// Allocates one buffer generation inside an out-of-memory error scope, so
/// allocation failure surfaces as an error string instead of a delayed
/// device loss.
fn create_set(device: &wgpu::Device, budget: BufferBudget) -> Result<BufferSet> {
    let error_scope = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

    let vertex = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("vermilion quad vertex buffer"),
        size: budget.vertex_bytes(),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let index = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("vermilion quad index buffer"),
        size: budget.index_bytes(),
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("vermilion quad transfer buffer"),
        size: budget.staging_bytes(),
        usage: wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    if let Some(err) = pollster::block_on(error_scope.pop()) {
        return Err(anyhow!(
            "GPU buffer allocation failed at {} quads: {err}",
            budget.capacity()
        ));
    }

    Ok(BufferSet {
        vertex,
        index,
        staging,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_is_initial_capacity() {
        assert_eq!(BufferBudget::default().capacity(), 4096);
    }

    #[test]
    fn byte_sizes_at_initial_capacity() {
        let b = BufferBudget::default();
        // 4096 quads * 4 vertices * 16 bytes / * 6 indices * 4 bytes.
        assert_eq!(b.vertex_bytes(), 262_144);
        assert_eq!(b.index_bytes(), 98_304);
        assert_eq!(b.staging_bytes(), 360_448);
    }

    #[test]
    fn staging_grows_in_lockstep() {
        let mut b = BufferBudget::default();
        for required in [5000, 20_000, 100_000] {
            b = b.grown(required);
            assert_eq!(b.staging_bytes(), b.vertex_bytes() + b.index_bytes());
        }
    }

    #[test]
    fn growth_at_least_doubles() {
        let b = BufferBudget::new(4096).grown(5000);
        assert_eq!(b.capacity(), 8192);
    }

    #[test]
    fn oversized_demand_wins_over_doubling() {
        let b = BufferBudget::new(4096).grown(10_000);
        assert_eq!(b.capacity(), 10_000);
    }

    #[test]
    fn repeated_growth_never_shrinks() {
        let mut b = BufferBudget::default();
        let mut last = b.capacity();
        for required in [5000, 6000, 9000, 40_000, 40_001] {
            if !b.fits(required) {
                b = b.grown(required);
            }
            assert!(b.capacity() >= last);
            assert!(b.fits(required));
            last = b.capacity();
        }
    }

    #[test]
    fn fits_is_inclusive_at_capacity() {
        let b = BufferBudget::new(4096);
        assert!(b.fits(4096));
        assert!(!b.fits(4097));
    }
}

use super::buffers::INITIAL_QUAD_CAPACITY;
use super::quad::{INDICES_PER_QUAD, Quad, VERTICES_PER_QUAD, Vertex};

/// Accumulates one frame's worth of quads into CPU-side vertex/index arrays
/// ahead of a single upload + draw.
///
/// Invariant between calls: `vertices.len() == 4 * quad_count()` and
/// `indices.len() == 6 * quad_count()`.
///
/// Not thread safe; one accumulation thread per frame. The `&mut self`
/// methods encode the single-writer discipline — a second producer thread
/// needs its own queue in front of this type.
pub struct QuadBatch {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl QuadBatch {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_QUAD_CAPACITY)
    }

    /// Pre-reserves space for `quads` quads.
    pub fn with_capacity(quads: u32) -> Self {
        Self {
            vertices: Vec::with_capacity((quads * VERTICES_PER_QUAD) as usize),
            indices: Vec::with_capacity((quads * INDICES_PER_QUAD) as usize),
        }
    }

    /// Clears the accumulated arrays while keeping their allocations, so
    /// frames reuse the same storage.
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Appends one quad: exactly 4 vertices and 6 indices.
    ///
    /// Never fails and never caps: exceeding the GPU buffer capacity is
    /// resolved at upload time by buffer growth, not here.
    pub fn push(&mut self, quad: Quad) {
        let base = self.vertices.len() as u32;
        debug_assert!(base <= u32::MAX - VERTICES_PER_QUAD);

        self.vertices.extend_from_slice(&quad.vertices());
        self.indices.extend_from_slice(&Quad::indices(base));
    }

    /// Number of quads accumulated since the last reset.
    pub fn quad_count(&self) -> u32 {
        (self.vertices.len() as u32) / VERTICES_PER_QUAD
    }

    /// Total index count covering every accumulated quad.
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

impl Default for QuadBatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;

    fn quad(i: u32) -> Quad {
        Quad::new(Rect::new(i as f32, 0.0, 1.0, 1.0))
    }

    #[test]
    fn push_appends_four_vertices_six_indices() {
        let mut batch = QuadBatch::new();
        batch.push(quad(0));

        assert_eq!(batch.quad_count(), 1);
        assert_eq!(batch.vertices().len(), 4);
        assert_eq!(batch.indices().len(), 6);
    }

    #[test]
    fn array_length_invariant_holds_across_pushes() {
        let mut batch = QuadBatch::new();
        for i in 0..100 {
            batch.push(quad(i));
            let n = batch.quad_count() as usize;
            assert_eq!(batch.vertices().len(), 4 * n);
            assert_eq!(batch.indices().len(), 6 * n);
        }
    }

    #[test]
    fn indices_never_alias_across_quads() {
        let mut batch = QuadBatch::new();
        for i in 0..16 {
            batch.push(quad(i));
        }

        for (k, chunk) in batch.indices().chunks_exact(6).enumerate() {
            let base = (k as u32) * 4;
            for &idx in chunk {
                assert!(
                    idx >= base && idx < base + 4,
                    "quad {k} references vertex {idx} outside [{base}, {})",
                    base + 4
                );
            }
        }
    }

    #[test]
    fn reset_returns_count_to_zero() {
        let mut batch = QuadBatch::new();
        batch.push(quad(0));
        batch.push(quad(1));

        batch.reset();

        assert_eq!(batch.quad_count(), 0);
        assert!(batch.is_empty());
    }

    #[test]
    fn reset_preserves_allocation() {
        let mut batch = QuadBatch::with_capacity(8);
        for i in 0..8 {
            batch.push(quad(i));
        }
        let vcap = batch.vertices.capacity();
        let icap = batch.indices.capacity();

        batch.reset();

        assert_eq!(batch.vertices.capacity(), vcap);
        assert_eq!(batch.indices.capacity(), icap);
    }

    #[test]
    fn five_thousand_quads_fill_expected_array_lengths() {
        let mut batch = QuadBatch::new();
        for i in 0..5000 {
            batch.push(quad(i));
        }

        assert_eq!(batch.quad_count(), 5000);
        assert_eq!(batch.vertices().len(), 20_000);
        assert_eq!(batch.indices().len(), 30_000);
    }
}

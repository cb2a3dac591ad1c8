use bytemuck::{Pod, Zeroable};

use crate::coords::Rect;

/// Vertices emitted per quad.
pub const VERTICES_PER_QUAD: u32 = 4;

/// Indices emitted per quad (two triangles).
pub const INDICES_PER_QUAD: u32 = 6;

/// CPU-side vertex as consumed by the quad pipeline. 16 bytes.
///
/// Plain value type; positions are logical pixels, texture coordinates are
/// whatever the caller put in the quad's UV rect — no clamping happens here.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2  // tex_coord
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Descriptor for one renderable quad: target rectangle in logical pixels
/// plus the UV sub-rectangle it maps to.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quad {
    pub rect: Rect,
    pub uv: Rect,
}

impl Quad {
    /// The full `[0,1]x[0,1]` UV region.
    pub const FULL_UV: Rect = Rect::new(0.0, 0.0, 1.0, 1.0);

    /// Quad mapped to the full UV region.
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            uv: Self::FULL_UV,
        }
    }

    pub fn with_uv(rect: Rect, uv: Rect) -> Self {
        Self { rect, uv }
    }

    /// The quad's four vertices in top-left, top-right, bottom-right,
    /// bottom-left order.
    ///
    /// Winding convention: clockwise in framebuffer space (top-left origin,
    /// +Y down), which the shader's Y flip turns into counter-clockwise NDC —
    /// the front face under `wgpu::FrontFace::Ccw`. Culling is disabled in
    /// the pipeline, so this only defines which side is "front".
    ///
    /// Pure transformation, no side effects.
    pub fn vertices(&self) -> [Vertex; 4] {
        let p0 = self.rect.min();
        let p1 = self.rect.max();
        let t0 = self.uv.min();
        let t1 = self.uv.max();

        [
            Vertex {
                position: [p0.x, p0.y],
                tex_coord: [t0.x, t0.y],
            },
            Vertex {
                position: [p1.x, p0.y],
                tex_coord: [t1.x, t0.y],
            },
            Vertex {
                position: [p1.x, p1.y],
                tex_coord: [t1.x, t1.y],
            },
            Vertex {
                position: [p0.x, p1.y],
                tex_coord: [t0.x, t1.y],
            },
        ]
    }

    /// Index pattern for one quad relative to its base vertex offset:
    /// `{b, b+1, b+2, b+2, b+3, b}`.
    pub fn indices(base: u32) -> [u32; 6] {
        [base, base + 1, base + 2, base + 2, base + 3, base]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 16);
    }

    #[test]
    fn vertices_in_tl_tr_br_bl_order() {
        let q = Quad::new(Rect::new(10.0, 20.0, 100.0, 50.0));
        let v = q.vertices();

        assert_eq!(v[0].position, [10.0, 20.0]); // top-left
        assert_eq!(v[1].position, [110.0, 20.0]); // top-right
        assert_eq!(v[2].position, [110.0, 70.0]); // bottom-right
        assert_eq!(v[3].position, [10.0, 70.0]); // bottom-left
    }

    #[test]
    fn full_uv_maps_corners() {
        let v = Quad::new(Rect::new(0.0, 0.0, 1.0, 1.0)).vertices();
        assert_eq!(v[0].tex_coord, [0.0, 0.0]);
        assert_eq!(v[1].tex_coord, [1.0, 0.0]);
        assert_eq!(v[2].tex_coord, [1.0, 1.0]);
        assert_eq!(v[3].tex_coord, [0.0, 1.0]);
    }

    #[test]
    fn uv_sub_rect_maps_corners() {
        let q = Quad::with_uv(Rect::new(0.0, 0.0, 8.0, 8.0), Rect::new(0.25, 0.5, 0.5, 0.25));
        let v = q.vertices();
        assert_eq!(v[0].tex_coord, [0.25, 0.5]);
        assert_eq!(v[2].tex_coord, [0.75, 0.75]);
    }

    #[test]
    fn index_pattern_relative_to_base() {
        assert_eq!(Quad::indices(0), [0, 1, 2, 2, 3, 0]);
        assert_eq!(Quad::indices(8), [8, 9, 10, 10, 11, 8]);
    }

    #[test]
    fn indices_stay_within_own_quad() {
        let base = 4 * 37;
        for i in Quad::indices(base) {
            assert!(i >= base && i < base + VERTICES_PER_QUAD);
        }
    }

    #[test]
    fn vertices_follow_negative_size_rect() {
        // Callers own coordinate validity; a negative-size rect normalizes
        // before emission so winding stays consistent.
        let q = Quad::new(Rect::new(10.0, 10.0, -10.0, -10.0).normalized());
        let v = q.vertices();
        assert_eq!(v[0].position, [0.0, 0.0]);
        assert_eq!(v[2].position, [10.0, 10.0]);
    }
}

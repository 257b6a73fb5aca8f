/// Host rendering primitives
///
/// Data-level stand-ins for the pieces of the host renderer the HMD bridge
/// configures: the shared render target, per-eye viewports, cameras and
/// renderers, and geometry buffers for distortion meshes. The host consumes
/// these; nothing here talks to a GPU.

use glam::Mat4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Off-screen texture both eyes render into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl PerspectiveCamera {
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far)
    }
}

/// One render pass into a viewport of the shared target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderer {
    pub viewport: Viewport,
    /// The second eye composites over the first, so it must not clear.
    pub clear_before_render: bool,
    pub target: RenderTarget,
}

/// One attribute within an interleaved vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub name: &'static str,
    /// Number of f32 components.
    pub components: u32,
    /// Byte offset from the start of the vertex.
    pub offset: u32,
}

/// Interleaved vertex data plus a triangle index buffer.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub vertex_data: Vec<u8>,
    pub vertex_stride: u32,
    pub attributes: Vec<VertexAttribute>,
    pub indices: Vec<u16>,
}

impl Geometry {
    pub fn vertex_count(&self) -> usize {
        if self.vertex_stride == 0 {
            0
        } else {
            self.vertex_data.len() / self.vertex_stride as usize
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

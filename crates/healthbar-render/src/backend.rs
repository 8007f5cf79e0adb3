//! GPU collaborator contract.
//!
//! Themes never talk to a graphics API directly. They upload unit quads,
//! load textures, and issue screen-space draw calls through
//! [`RenderBackend`]. [`RecordingBackend`] keeps everything in memory and is
//! what tests and the headless simulator render into.

use ahash::{AHashMap, AHashSet};
use bytemuck::{Pod, Zeroable};
use healthbar_common::{Rgba, ThemeError};
use tracing::trace;

/// Handle of an uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Handle of an uploaded mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

/// Vertex of a unit quad.
///
/// Positions span `[-1, 1]²`; texture coordinates have their origin at the
/// top-left corner of the texture.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    /// Position in [-1, 1]²
    pub position: [f32; 2],
    /// Texture coordinate
    pub uv: [f32; 2],
}

/// How a mesh's vertices are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Two triangles (filled quad)
    Triangles,
    /// Closed line strip (rectangle outline)
    LineLoop,
}

/// Four-vertex quad in top-left, top-right, bottom-right, bottom-left order.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadMesh {
    /// Corner vertices
    pub vertices: [QuadVertex; 4],
}

impl QuadMesh {
    /// Unit quad sampling the texture rectangle `(u0, v0)–(u1, v1)`.
    #[must_use]
    pub fn textured(u0: f32, v0: f32, u1: f32, v1: f32) -> Self {
        Self {
            vertices: [
                QuadVertex { position: [-1.0, 1.0], uv: [u0, v0] },
                QuadVertex { position: [1.0, 1.0], uv: [u1, v0] },
                QuadVertex { position: [1.0, -1.0], uv: [u1, v1] },
                QuadVertex { position: [-1.0, -1.0], uv: [u0, v1] },
            ],
        }
    }

    /// Unit quad covering the whole texture (or none).
    #[must_use]
    pub fn unit() -> Self {
        Self::textured(0.0, 0.0, 1.0, 1.0)
    }

    /// Raw vertex bytes, as handed to a GPU buffer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Sampled texture rectangle as `(u0, v0, u1, v1)`.
    #[must_use]
    pub fn uv_rect(&self) -> (f32, f32, f32, f32) {
        let [tl, _, br, _] = self.vertices;
        (tl.uv[0], tl.uv[1], br.uv[0], br.uv[1])
    }
}

/// Screen-space rectangle, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub w: f32,
    /// Height
    pub h: f32,
}

impl Rect {
    /// Creates a rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle grown by `d` on every side.
    #[must_use]
    pub fn inflate(&self, d: f32) -> Self {
        Self::new(self.x - d, self.y - d, self.w + 2.0 * d, self.h + 2.0 * d)
    }

    /// Horizontal center.
    #[must_use]
    pub fn center_x(&self) -> f32 {
        self.x + self.w * 0.5
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

/// One mesh stretched over a screen rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    /// Mesh to draw
    pub mesh: MeshId,
    /// Bound texture; `None` draws flat color
    pub texture: Option<TextureId>,
    /// Target rectangle
    pub rect: Rect,
    /// Tint (or flat color) with opacity in alpha
    pub color: Rgba,
}

/// GPU primitives needed by the themes.
pub trait RenderBackend {
    /// Loads a texture asset by path.
    fn load_texture(&mut self, path: &str) -> Result<TextureId, ThemeError>;

    /// Uploads a quad mesh.
    fn upload_mesh(&mut self, mesh: &QuadMesh, topology: Topology) -> MeshId;

    /// Draws a mesh.
    fn draw(&mut self, call: &DrawCall);

    /// Frees a mesh.
    fn delete_mesh(&mut self, mesh: MeshId);

    /// Frees a texture.
    fn delete_texture(&mut self, texture: TextureId);
}

/// In-memory backend that records every call.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u32,
    textures: AHashMap<TextureId, String>,
    meshes: AHashMap<MeshId, (QuadMesh, Topology)>,
    missing: AHashSet<String>,
    draws: Vec<DrawCall>,
    total_draws: u64,
}

impl RecordingBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes later loads of `path` fail.
    pub fn fail_texture(&mut self, path: impl Into<String>) {
        self.missing.insert(path.into());
    }

    /// Draw calls recorded since the last [`take_draws`](Self::take_draws).
    #[must_use]
    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Returns and clears the recorded draw calls.
    pub fn take_draws(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draws)
    }

    /// Draw calls recorded over the backend's lifetime.
    #[must_use]
    pub fn total_draws(&self) -> u64 {
        self.total_draws
    }

    /// Number of live meshes.
    #[must_use]
    pub fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Number of live textures.
    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Uploaded mesh data.
    #[must_use]
    pub fn mesh(&self, id: MeshId) -> Option<&QuadMesh> {
        self.meshes.get(&id).map(|(mesh, _)| mesh)
    }

    /// Path a texture was loaded from.
    #[must_use]
    pub fn texture_path(&self, id: TextureId) -> Option<&str> {
        self.textures.get(&id).map(String::as_str)
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl RenderBackend for RecordingBackend {
    fn load_texture(&mut self, path: &str) -> Result<TextureId, ThemeError> {
        if self.missing.contains(path) {
            return Err(ThemeError::Texture {
                path: path.to_string(),
                reason: "asset not found".to_string(),
            });
        }
        let id = TextureId(self.next());
        self.textures.insert(id, path.to_string());
        trace!("Loaded texture {path} as {id:?}");
        Ok(id)
    }

    fn upload_mesh(&mut self, mesh: &QuadMesh, topology: Topology) -> MeshId {
        let id = MeshId(self.next());
        self.meshes.insert(id, (*mesh, topology));
        id
    }

    fn draw(&mut self, call: &DrawCall) {
        self.total_draws += 1;
        self.draws.push(*call);
    }

    fn delete_mesh(&mut self, mesh: MeshId) {
        self.meshes.remove(&mesh);
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_mesh_is_pod() {
        let mesh = QuadMesh::textured(0.25, 0.0, 0.5, 1.0);
        assert_eq!(mesh.as_bytes().len(), 4 * 4 * 4);
        assert_eq!(mesh.uv_rect(), (0.25, 0.0, 0.5, 1.0));
    }

    #[test]
    fn test_recording_backend_lifecycle() {
        let mut backend = RecordingBackend::new();
        let tex = backend.load_texture("textures/a.png").expect("texture");
        let mesh = backend.upload_mesh(&QuadMesh::unit(), Topology::Triangles);
        backend.draw(&DrawCall {
            mesh,
            texture: Some(tex),
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            color: Rgba::WHITE,
        });
        assert_eq!(backend.draws().len(), 1);
        assert_eq!(backend.take_draws().len(), 1);
        assert!(backend.draws().is_empty());
        assert_eq!(backend.total_draws(), 1);

        backend.delete_mesh(mesh);
        backend.delete_texture(tex);
        assert_eq!(backend.live_meshes(), 0);
        assert_eq!(backend.live_textures(), 0);
    }

    #[test]
    fn test_failing_texture() {
        let mut backend = RecordingBackend::new();
        backend.fail_texture("missing.png");
        assert!(matches!(
            backend.load_texture("missing.png"),
            Err(ThemeError::Texture { .. })
        ));
    }

    #[test]
    fn test_rect_helpers() {
        let r = Rect::new(10.0, 20.0, 30.0, 4.0).inflate(2.0);
        assert_eq!(r, Rect::new(8.0, 18.0, 34.0, 8.0));
        assert_eq!(r.center_x(), 25.0);
        assert_eq!(r.bottom(), 26.0);
    }
}

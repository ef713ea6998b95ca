//! CPU-side geometry: primitives, STL import and fluent pre-upload transforms.
//!
//! Every object in a [`Scene`](crate::Scene) keeps its geometry on the CPU as a
//! [`RawGeometry`]. Picking tests against it directly and the renderer uploads it
//! to the GPU, re-uploading whenever the owning [`Model`](crate::Model) revision
//! changes. This is what lets the frame loop jitter vertices in place.
//!
//! # Example
//!
//! ```
//! use sceneplay::{RawGeometry, Topology};
//!
//! let plane = RawGeometry::plane(10.0, 10.0, 10, 10);
//! assert_eq!(plane.vertices.len(), 11 * 11);
//! assert_eq!(plane.topology, Topology::Triangles);
//! ```

use std::collections::HashSet;
use std::path::Path;

use glam::Vec3;
use thiserror::Error;

use crate::mesh::Vertex3d;

/// Errors that can occur when loading geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// File could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// File format could not be determined from extension.
    #[error("unknown geometry format: '{0}'")]
    UnknownFormat(String),
    /// The geometry data was invalid or corrupt.
    #[error("parse error: {0}")]
    Parse(String),
}

/// How the index list of a [`RawGeometry`] is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Topology {
    /// Three indices per triangle.
    #[default]
    Triangles,
    /// Two indices per line segment.
    Lines,
}

/// Raw geometry data before GPU upload.
#[derive(Clone, Debug, Default)]
pub struct RawGeometry {
    /// Vertex positions, normals, and UVs.
    pub vertices: Vec<Vertex3d>,
    /// Triangle or segment indices, depending on `topology`.
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl RawGeometry {
    /// Creates triangle geometry from vertices and indices.
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            topology: Topology::Triangles,
        }
    }

    /// Creates line-list geometry from vertices and segment indices.
    pub fn lines(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            topology: Topology::Lines,
        }
    }

    /// A box centered at the origin with the given full dimensions.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (x, y, z) = (width * 0.5, height * 0.5, depth * 0.5);

        #[rustfmt::skip]
        let vertices = vec![
            // Front face (Z+)
            Vertex3d::new([-x, -y,  z], [ 0.0,  0.0,  1.0], [0.0, 0.0]),
            Vertex3d::new([ x, -y,  z], [ 0.0,  0.0,  1.0], [1.0, 0.0]),
            Vertex3d::new([ x,  y,  z], [ 0.0,  0.0,  1.0], [1.0, 1.0]),
            Vertex3d::new([-x,  y,  z], [ 0.0,  0.0,  1.0], [0.0, 1.0]),
            // Back face (Z-)
            Vertex3d::new([ x, -y, -z], [ 0.0,  0.0, -1.0], [0.0, 0.0]),
            Vertex3d::new([-x, -y, -z], [ 0.0,  0.0, -1.0], [1.0, 0.0]),
            Vertex3d::new([-x,  y, -z], [ 0.0,  0.0, -1.0], [1.0, 1.0]),
            Vertex3d::new([ x,  y, -z], [ 0.0,  0.0, -1.0], [0.0, 1.0]),
            // Top face (Y+)
            Vertex3d::new([-x,  y,  z], [ 0.0,  1.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ x,  y,  z], [ 0.0,  1.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ x,  y, -z], [ 0.0,  1.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-x,  y, -z], [ 0.0,  1.0,  0.0], [0.0, 1.0]),
            // Bottom face (Y-)
            Vertex3d::new([-x, -y, -z], [ 0.0, -1.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ x, -y, -z], [ 0.0, -1.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ x, -y,  z], [ 0.0, -1.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-x, -y,  z], [ 0.0, -1.0,  0.0], [0.0, 1.0]),
            // Right face (X+)
            Vertex3d::new([ x, -y,  z], [ 1.0,  0.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ x, -y, -z], [ 1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ x,  y, -z], [ 1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([ x,  y,  z], [ 1.0,  0.0,  0.0], [0.0, 1.0]),
            // Left face (X-)
            Vertex3d::new([-x, -y, -z], [-1.0,  0.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([-x, -y,  z], [-1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([-x,  y,  z], [-1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-x,  y, -z], [-1.0,  0.0,  0.0], [0.0, 1.0]),
        ];

        #[rustfmt::skip]
        let indices: Vec<u32> = vec![
            0,  1,  2,  2,  3,  0,  // front
            4,  5,  6,  6,  7,  4,  // back
            8,  9,  10, 10, 11, 8,  // top
            12, 13, 14, 14, 15, 12, // bottom
            16, 17, 18, 18, 19, 16, // right
            20, 21, 22, 22, 23, 20, // left
        ];

        Self::new(vertices, indices)
    }

    /// A UV sphere centered at the origin.
    ///
    /// `segments` divides the equator, `rings` runs pole to pole. Both are
    /// clamped to sensible minimums.
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
        let mut indices = Vec::with_capacity((segments * rings * 6) as usize);

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = 2.0 * std::f32::consts::PI * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                vertices.push(Vertex3d::new(
                    [x * radius, y * radius, z * radius],
                    [x, y, z],
                    [seg as f32 / segments as f32, ring as f32 / rings as f32],
                ));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;

                indices.extend_from_slice(&[current, current + 1, next]);
                indices.extend_from_slice(&[current + 1, next + 1, next]);
            }
        }

        Self::new(vertices, indices)
    }

    /// A subdivided rectangle in the XY plane facing +Z.
    ///
    /// Rotate it by `-π/2` around X to lay it flat on the ground.
    pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        let grid_x = width_segments.max(1);
        let grid_y = height_segments.max(1);
        let seg_w = width / grid_x as f32;
        let seg_h = height / grid_y as f32;

        let mut vertices = Vec::with_capacity(((grid_x + 1) * (grid_y + 1)) as usize);
        for iy in 0..=grid_y {
            let y = height * 0.5 - iy as f32 * seg_h;
            for ix in 0..=grid_x {
                let x = ix as f32 * seg_w - width * 0.5;
                vertices.push(Vertex3d::new(
                    [x, y, 0.0],
                    [0.0, 0.0, 1.0],
                    [ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32],
                ));
            }
        }

        let mut indices = Vec::with_capacity((grid_x * grid_y * 6) as usize);
        for iy in 0..grid_y {
            for ix in 0..grid_x {
                let a = ix + (grid_x + 1) * iy;
                let b = ix + (grid_x + 1) * (iy + 1);
                let c = (ix + 1) + (grid_x + 1) * (iy + 1);
                let d = (ix + 1) + (grid_x + 1) * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self::new(vertices, indices)
    }

    /// A single line segment.
    pub fn segment(from: Vec3, to: Vec3) -> Self {
        let normal = [0.0, 0.0, 0.0];
        Self::lines(
            vec![
                Vertex3d::new(from.into(), normal, [0.0, 0.0]),
                Vertex3d::new(to.into(), normal, [1.0, 0.0]),
            ],
            vec![0, 1],
        )
    }

    /// A square grid of lines on the XZ plane.
    pub fn grid(size: f32, divisions: u32) -> Self {
        let divisions = divisions.max(1);
        let half = size * 0.5;
        let step = size / divisions as f32;
        let normal = [0.0, 1.0, 0.0];

        let mut vertices = Vec::with_capacity(((divisions + 1) * 4) as usize);
        let mut indices = Vec::with_capacity(((divisions + 1) * 4) as usize);
        for i in 0..=divisions {
            let k = -half + i as f32 * step;
            let base = vertices.len() as u32;
            vertices.push(Vertex3d::new([-half, 0.0, k], normal, [0.0, 0.0]));
            vertices.push(Vertex3d::new([half, 0.0, k], normal, [1.0, 0.0]));
            vertices.push(Vertex3d::new([k, 0.0, -half], normal, [0.0, 0.0]));
            vertices.push(Vertex3d::new([k, 0.0, half], normal, [0.0, 1.0]));
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 3]);
        }

        Self::lines(vertices, indices)
    }

    /// Number of primitives (triangles or segments).
    pub fn primitive_count(&self) -> usize {
        match self.topology {
            Topology::Triangles => self.indices.len() / 3,
            Topology::Lines => self.indices.len() / 2,
        }
    }

    /// Iterates triangle corner positions. Empty for line geometry.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        let tris = match self.topology {
            Topology::Triangles => self.indices.as_slice(),
            Topology::Lines => &[],
        };
        tris.chunks_exact(3).filter_map(|tri| {
            let a = self.vertices.get(tri[0] as usize)?;
            let b = self.vertices.get(tri[1] as usize)?;
            let c = self.vertices.get(tri[2] as usize)?;
            Some([
                Vec3::from(a.position),
                Vec3::from(b.position),
                Vec3::from(c.position),
            ])
        })
    }

    /// Unique edges as segment index pairs, for wireframe rendering.
    ///
    /// Line geometry returns its own indices.
    pub fn edge_indices(&self) -> Vec<u32> {
        if self.topology == Topology::Lines {
            return self.indices.clone();
        }

        let mut seen = HashSet::with_capacity(self.indices.len());
        let mut edges = Vec::with_capacity(self.indices.len() * 2);
        for tri in self.indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let key = (a.min(b), a.max(b));
                if seen.insert(key) {
                    edges.extend_from_slice(&[a, b]);
                }
            }
        }
        edges
    }

    /// Computes the axis-aligned bounding box.
    ///
    /// Returns `(min, max)` corners of the bounding box.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }

        (min, max)
    }

    /// Returns the center point of the geometry.
    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    /// Returns the size of the bounding box.
    pub fn size(&self) -> Vec3 {
        let (min, max) = self.bounds();
        max - min
    }

    /// Translates all vertices by the given offset.
    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            v.position = (Vec3::from(v.position) + offset).into();
        }
    }

    /// Scales all vertices uniformly around the origin.
    pub fn scale(&mut self, factor: f32) {
        for v in &mut self.vertices {
            v.position = (Vec3::from(v.position) * factor).into();
        }
    }

    /// Centers the geometry at the origin.
    pub fn recenter(&mut self) {
        let center = self.center();
        self.translate(-center);
    }

    /// Scales the geometry to fit within a unit cube (-0.5 to 0.5).
    pub fn normalize(&mut self) {
        let size = self.size();
        let max_dim = size.x.max(size.y).max(size.z);
        if max_dim > 0.0 {
            self.scale(1.0 / max_dim);
        }
    }

    /// Loads geometry from a file, detecting the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GeometryError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "stl" => {
                let file = std::fs::File::open(path)?;
                let mut reader = std::io::BufReader::new(file);
                Self::parse_stl(&mut reader)
            }
            _ => Err(GeometryError::UnknownFormat(ext)),
        }
    }

    /// Parses STL geometry (binary or ASCII) from bytes.
    pub fn from_stl_bytes(bytes: &[u8]) -> Result<Self, GeometryError> {
        let mut cursor = std::io::Cursor::new(bytes);
        Self::parse_stl(&mut cursor)
    }

    fn parse_stl<R: std::io::Read + std::io::Seek>(reader: &mut R) -> Result<Self, GeometryError> {
        let stl = stl_io::read_stl(reader)
            .map_err(|e| GeometryError::Parse(format!("STL parse error: {e}")))?;

        let mut vertices = Vec::with_capacity(stl.faces.len() * 3);
        let mut indices = Vec::with_capacity(stl.faces.len() * 3);

        // Faces are flattened so each corner carries its face normal.
        for face in &stl.faces {
            let normal: [f32; 3] = face.normal.into();
            for &vertex_idx in &face.vertices {
                let vertex = stl.vertices.get(vertex_idx).ok_or_else(|| {
                    GeometryError::Parse(format!("STL vertex index {vertex_idx} out of range"))
                })?;
                let position: [f32; 3] = (*vertex).into();
                indices.push(vertices.len() as u32);
                vertices.push(Vertex3d::new(position, normal, [0.0, 0.0]));
            }
        }

        if vertices.is_empty() {
            return Err(GeometryError::Parse("STL contains no faces".to_string()));
        }

        Ok(Self::new(vertices, indices))
    }
}

/// Deferred geometry processing applied after loading.
///
/// The steps run in a fixed order regardless of how they were chained:
/// center, normalize, scale.
#[derive(Clone, Debug, Default)]
pub struct GeometryPipeline {
    center: bool,
    normalize: bool,
    scale_factor: Option<f32>,
}

impl GeometryPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Centers the geometry at the origin.
    pub fn centered(mut self) -> Self {
        self.center = true;
        self
    }

    /// Scales the geometry to fit within a unit cube.
    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }

    /// Applies a uniform scale factor.
    pub fn scaled(mut self, factor: f32) -> Self {
        self.scale_factor = Some(factor);
        self
    }

    pub fn apply(&self, mut geometry: RawGeometry) -> RawGeometry {
        if self.center {
            geometry.recenter();
        }
        if self.normalize {
            geometry.normalize();
        }
        if let Some(scale) = self.scale_factor {
            geometry.scale(scale);
        }
        geometry
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a binary STL with the given triangles.
    pub(crate) fn binary_stl(triangles: &[[[f32; 3]; 3]]) -> Vec<u8> {
        let mut bytes = vec![0u8; 80];
        bytes.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for tri in triangles {
            for _ in 0..3 {
                bytes.extend_from_slice(&0.0f32.to_le_bytes());
            }
            for corner in tri {
                for c in corner {
                    bytes.extend_from_slice(&c.to_le_bytes());
                }
            }
            bytes.extend_from_slice(&0u16.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn raw_geometry_bounds() {
        let vertices = vec![
            Vertex3d::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([-1.0, -1.0, -1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let geom = RawGeometry::new(vertices, vec![0, 1, 2]);

        let (min, max) = geom.bounds();
        assert_eq!(min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn raw_geometry_recenter() {
        let vertices = vec![
            Vertex3d::new([2.0, 2.0, 2.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([4.0, 4.0, 4.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let mut geom = RawGeometry::new(vertices, vec![0, 1, 0]);

        geom.recenter();

        assert!(geom.center().length() < 0.001);
    }

    #[test]
    fn cuboid_matches_dimensions() {
        let geom = RawGeometry::cuboid(4.0, 4.0, 4.0);
        assert_eq!(geom.vertices.len(), 24);
        assert_eq!(geom.primitive_count(), 12);
        assert_eq!(geom.size(), Vec3::splat(4.0));
        assert_eq!(geom.center(), Vec3::ZERO);
    }

    #[test]
    fn sphere_has_requested_radius() {
        let geom = RawGeometry::sphere(4.0, 50, 50);
        assert_eq!(geom.vertices.len(), 51 * 51);
        assert_eq!(geom.primitive_count(), 50 * 50 * 2);
        for v in &geom.vertices {
            assert!((Vec3::from(v.position).length() - 4.0).abs() < 1e-4);
        }
    }

    #[test]
    fn plane_lies_in_xy() {
        let geom = RawGeometry::plane(10.0, 10.0, 10, 10);
        assert_eq!(geom.vertices.len(), 121);
        assert_eq!(geom.primitive_count(), 200);
        let (min, max) = geom.bounds();
        assert_eq!(min, Vec3::new(-5.0, -5.0, 0.0));
        assert_eq!(max, Vec3::new(5.0, 5.0, 0.0));
    }

    #[test]
    fn plane_edges_are_unique() {
        // A 1x1 plane is two triangles sharing a diagonal: 5 unique edges.
        let geom = RawGeometry::plane(1.0, 1.0, 1, 1);
        assert_eq!(geom.edge_indices().len(), 10);
    }

    #[test]
    fn grid_is_lines() {
        let geom = RawGeometry::grid(30.0, 10);
        assert_eq!(geom.topology, Topology::Lines);
        assert_eq!(geom.primitive_count(), 22);
        assert_eq!(geom.triangles().count(), 0);
        assert_eq!(geom.edge_indices(), geom.indices);
    }

    #[test]
    fn pipeline_normalizes_and_scales() {
        let geom = GeometryPipeline::new()
            .centered()
            .normalized()
            .scaled(4.0)
            .apply(RawGeometry::cuboid(2.0, 1.0, 0.5));
        let size = geom.size();
        assert!((size.x - 4.0).abs() < 1e-5);
        assert!((size.y - 2.0).abs() < 1e-5);
        assert!(geom.center().length() < 1e-5);
    }

    #[test]
    fn parses_binary_stl() {
        let bytes = binary_stl(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        ]);
        let geom = RawGeometry::from_stl_bytes(&bytes).unwrap();
        assert_eq!(geom.primitive_count(), 2);
        assert_eq!(geom.vertices.len(), 6);
        assert_eq!(geom.size(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = RawGeometry::load("model.glb").unwrap_err();
        assert!(matches!(err, GeometryError::UnknownFormat(ext) if ext == "glb"));
    }
}

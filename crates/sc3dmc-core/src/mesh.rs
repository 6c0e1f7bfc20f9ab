use crate::attribute_buffer::AttributeBuffer;
use crate::bounding_box::{AttributeRange, BoundingBoxMode};
use crate::header::MeshHeader;
use crate::status::{invalid_mesh, Status};

pub type Triangle = [u32; 3];

/// An indexed triangle mesh with optional per-vertex attributes.
///
/// Normals, colors and texture coordinates are optional; an attribute is
/// present when its buffer is non-empty. When an attribute has exactly one
/// element per vertex it shares the triangle index space with the
/// positions.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IndexedFaceSet {
    coords: AttributeBuffer<f32, 3>,
    normals: AttributeBuffer<f32, 3>,
    colors: AttributeBuffer<f32, 3>,
    texcoords: AttributeBuffer<f32, 2>,
    triangles: AttributeBuffer<u32, 3>,
    coord_range: AttributeRange<3>,
    normal_range: AttributeRange<3>,
    color_range: AttributeRange<3>,
    texcoord_range: AttributeRange<2>,
}

impl IndexedFaceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_vertices(&self) -> usize {
        self.coords.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn num_normals(&self) -> usize {
        self.normals.len()
    }

    pub fn num_colors(&self) -> usize {
        self.colors.len()
    }

    pub fn num_texcoords(&self) -> usize {
        self.texcoords.len()
    }

    pub fn coords(&self) -> &[[f32; 3]] {
        self.coords.as_slice()
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        self.normals.as_slice()
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        self.colors.as_slice()
    }

    pub fn texcoords(&self) -> &[[f32; 2]] {
        self.texcoords.as_slice()
    }

    pub fn triangles(&self) -> &[Triangle] {
        self.triangles.as_slice()
    }

    pub fn coords_mut(&mut self) -> &mut [[f32; 3]] {
        self.coords.as_mut_slice()
    }

    pub fn normals_mut(&mut self) -> &mut [[f32; 3]] {
        self.normals.as_mut_slice()
    }

    pub fn colors_mut(&mut self) -> &mut [[f32; 3]] {
        self.colors.as_mut_slice()
    }

    pub fn texcoords_mut(&mut self) -> &mut [[f32; 2]] {
        self.texcoords.as_mut_slice()
    }

    pub fn triangles_mut(&mut self) -> &mut [Triangle] {
        self.triangles.as_mut_slice()
    }

    pub fn add_coord(&mut self, coord: [f32; 3]) -> Status {
        self.coords.push(coord)
    }

    pub fn add_normal(&mut self, normal: [f32; 3]) -> Status {
        self.normals.push(normal)
    }

    pub fn add_color(&mut self, color: [f32; 3]) -> Status {
        self.colors.push(color)
    }

    pub fn add_texcoord(&mut self, texcoord: [f32; 2]) -> Status {
        self.texcoords.push(texcoord)
    }

    pub fn add_triangle(&mut self, triangle: Triangle) -> Status {
        self.triangles.push(triangle)
    }

    pub fn set_coords(&mut self, coords: Vec<[f32; 3]>) {
        self.coords = coords.into();
    }

    pub fn set_normals(&mut self, normals: Vec<[f32; 3]>) {
        self.normals = normals.into();
    }

    pub fn set_colors(&mut self, colors: Vec<[f32; 3]>) {
        self.colors = colors.into();
    }

    pub fn set_texcoords(&mut self, texcoords: Vec<[f32; 2]>) {
        self.texcoords = texcoords.into();
    }

    pub fn set_triangles(&mut self, triangles: Vec<Triangle>) {
        self.triangles = triangles.into();
    }

    pub fn coord_range(&self) -> &AttributeRange<3> {
        &self.coord_range
    }

    pub fn normal_range(&self) -> &AttributeRange<3> {
        &self.normal_range
    }

    pub fn color_range(&self) -> &AttributeRange<3> {
        &self.color_range
    }

    pub fn texcoord_range(&self) -> &AttributeRange<2> {
        &self.texcoord_range
    }

    /// Recomputes the range of every attribute under `mode`.
    pub fn compute_min_max(&mut self, mode: BoundingBoxMode) {
        self.coord_range = AttributeRange::from_values(self.coords.as_slice(), mode);
        self.normal_range = AttributeRange::from_values(self.normals.as_slice(), mode);
        self.color_range = AttributeRange::from_values(self.colors.as_slice(), mode);
        self.texcoord_range = AttributeRange::from_values(self.texcoords.as_slice(), mode);
    }

    /// Whether `normals`/`colors`/`texcoords` with `count` elements share
    /// the position index space.
    pub fn is_per_vertex(&self, count: usize) -> bool {
        count == self.num_vertices()
    }

    /// Checks the structural requirements of the encoder.
    pub fn validate(&self) -> Status {
        if self.coords.is_empty() {
            return Err(invalid_mesh("Mesh has no vertex positions"));
        }
        if self.triangles.is_empty() {
            return Err(invalid_mesh("Mesh has no triangles"));
        }
        let num_vertices = self.num_vertices();
        if num_vertices > i32::MAX as usize {
            return Err(invalid_mesh(format!("{} vertices exceed the index range", num_vertices)));
        }
        for (name, count) in [
            ("triangles", self.num_triangles()),
            ("normals", self.num_normals()),
            ("colors", self.num_colors()),
            ("texture coordinates", self.num_texcoords()),
        ] {
            if count > u32::MAX as usize {
                return Err(invalid_mesh(format!("Too many {}: {}", name, count)));
            }
        }
        for (t, tri) in self.triangles().iter().enumerate() {
            if let Some(&v) = tri.iter().find(|&&v| v as usize >= num_vertices) {
                return Err(invalid_mesh(format!(
                    "Triangle {} references vertex {} but the mesh has {} vertices",
                    t, v, num_vertices
                )));
            }
        }
        let finite = self.coords().iter().flatten().all(|v| v.is_finite())
            && self.normals().iter().flatten().all(|v| v.is_finite())
            && self.colors().iter().flatten().all(|v| v.is_finite())
            && self.texcoords().iter().flatten().all(|v| v.is_finite());
        if !finite {
            return Err(invalid_mesh("Attribute values must be finite"));
        }
        Ok(())
    }

    /// Sizes every attribute buffer to the counts of a decoded header and
    /// adopts its ranges.
    pub fn allocate_from_header(&mut self, header: &MeshHeader) -> Status {
        self.coords.allocate(header.num_vertices as usize)?;
        self.normals.allocate(header.num_normals as usize)?;
        self.colors.allocate(header.num_colors as usize)?;
        self.texcoords.allocate(header.num_texcoords as usize)?;
        self.triangles.allocate(header.num_triangles as usize)?;
        self.set_ranges_from_header(header);
        Ok(())
    }

    pub(crate) fn set_ranges_from_header(&mut self, header: &MeshHeader) {
        self.coord_range = header.coord_range;
        self.normal_range = header.normal_range;
        self.color_range = header.color_range;
        self.texcoord_range = header.texcoord_range;
    }

    /// Whether the storage matches the counts in `header`.
    pub fn is_sized_for(&self, header: &MeshHeader) -> bool {
        self.num_vertices() == header.num_vertices as usize
            && self.num_triangles() == header.num_triangles as usize
            && self.num_normals() == header.num_normals as usize
            && self.num_colors() == header.num_colors as usize
            && self.num_texcoords() == header.num_texcoords as usize
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

use crate::status::{invalid_mesh, StatusResult};

/// Vertex to triangle incidence built from a triangle index array.
///
/// Incidence lists are stored back to back (`vertex_offsets` delimits the
/// list of each vertex) and every list holds triangle ids in their stored
/// array order, so building twice from the same triangles yields the same
/// adjacency on both sides of the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityIndex<'a> {
    triangles: &'a [[u32; 3]],
    vertex_offsets: Vec<usize>,
    vertex_triangles: Vec<u32>,
}

impl<'a> ConnectivityIndex<'a> {
    /// Builds the index, failing with `InvalidMesh` on any index
    /// `>= num_vertices`.
    pub fn build(triangles: &'a [[u32; 3]], num_vertices: usize) -> StatusResult<Self> {
        if triangles.len() > u32::MAX as usize {
            return Err(invalid_mesh("Too many triangles"));
        }
        let mut counts = Vec::new();
        counts.try_reserve_exact(num_vertices + 1)?;
        counts.resize(num_vertices + 1, 0usize);

        for (t, tri) in triangles.iter().enumerate() {
            for (k, &v) in tri.iter().enumerate() {
                if v as usize >= num_vertices {
                    return Err(invalid_mesh(format!(
                        "Triangle {} references vertex {} but the mesh has {} vertices",
                        t, v, num_vertices
                    )));
                }
                // A vertex repeated inside one triangle is recorded once.
                if !tri[..k].contains(&v) {
                    counts[v as usize + 1] += 1;
                }
            }
        }
        for i in 0..num_vertices {
            counts[i + 1] += counts[i];
        }
        let vertex_offsets = counts;

        let total = vertex_offsets[num_vertices];
        let mut vertex_triangles = Vec::new();
        vertex_triangles.try_reserve_exact(total)?;
        vertex_triangles.resize(total, 0u32);

        let mut cursor = vertex_offsets.clone();
        for (t, tri) in triangles.iter().enumerate() {
            for (k, &v) in tri.iter().enumerate() {
                if !tri[..k].contains(&v) {
                    vertex_triangles[cursor[v as usize]] = t as u32;
                    cursor[v as usize] += 1;
                }
            }
        }

        Ok(Self {
            triangles,
            vertex_offsets,
            vertex_triangles,
        })
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_offsets.len() - 1
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn triangle(&self, t: usize) -> [u32; 3] {
        self.triangles[t]
    }

    /// Triangles touching `v`, in stored order.
    pub fn incident_triangles(&self, v: usize) -> &[u32] {
        &self.vertex_triangles[self.vertex_offsets[v]..self.vertex_offsets[v + 1]]
    }

    /// Collects the vertices below `v` that share an edge with it, in the
    /// order they are first met while walking its incident triangles.
    pub fn collect_visited_neighbors(&self, v: usize, out: &mut Vec<u32>) {
        out.clear();
        for &t in self.incident_triangles(v) {
            for &n in &self.triangles[t as usize] {
                if (n as usize) < v && !out.contains(&n) {
                    out.push(n);
                }
            }
        }
    }

    /// Finds the first triangle other than `exclude` that contains the edge
    /// `(a, b)` and whose third vertex is below `limit`; returns that vertex.
    pub fn opposite_vertex(&self, exclude: u32, a: u32, b: u32, limit: u32) -> Option<u32> {
        for &t in self.incident_triangles(a as usize) {
            if t == exclude {
                continue;
            }
            let tri = &self.triangles[t as usize];
            if !tri.contains(&b) {
                continue;
            }
            if let Some(&c) = tri.iter().find(|&&c| c != a && c != b) {
                if c < limit {
                    return Some(c);
                }
            }
        }
        None
    }
}

//! CPU-side geometry: deduplicated vertices plus point/line/triangle index lists.
//!
//! A `Geometry` is consumed by [`crate::mesh::Mesh::new`] and owns nothing on
//! the GPU, so it can be dropped right after upload.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bytemuck::{Pod, Zeroable};

use crate::error::Result;

/// One vertex as laid out in the vertex buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl Vertex {
    #[inline]
    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }

    /// Bit pattern used as the dedup key (bitwise equality, `-0.0 != 0.0`).
    #[inline]
    fn bits(&self) -> [u32; 8] {
        bytemuck::cast(*self)
    }
}

/// Deduplicated vertex list with three primitive index lists.
///
/// Invariant: every index is `< vertices().len()`.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    vertices: Vec<Vertex>,
    lookup: HashMap<[u32; 8], u32>,
    points: Vec<u32>,
    lines: Vec<u32>,
    triangles: Vec<u32>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn points(&self) -> &[u32] {
        &self.points
    }

    #[inline]
    pub fn lines(&self) -> &[u32] {
        &self.lines
    }

    #[inline]
    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.lines.is_empty() && self.triangles.is_empty()
    }

    /// Returns the index of `v`, appending it only if no bitwise-equal vertex exists.
    pub fn add_vertex(&mut self, v: Vertex) -> u32 {
        let next = self.vertices.len() as u32;
        let index = *self.lookup.entry(v.bits()).or_insert(next);
        if index == next {
            self.vertices.push(v);
        }
        index
    }

    pub fn add_point(&mut self, a: Vertex) {
        let a = self.add_vertex(a);
        self.points.push(a);
    }

    pub fn add_line(&mut self, a: Vertex, b: Vertex) {
        let a = self.add_vertex(a);
        let b = self.add_vertex(b);
        self.lines.extend([a, b]);
    }

    pub fn add_triangle(&mut self, a: Vertex, b: Vertex, c: Vertex) {
        let a = self.add_vertex(a);
        let b = self.add_vertex(b);
        let c = self.add_vertex(c);
        self.triangles.extend([a, b, c]);
    }

    /// Axis-aligned `w` x `h` rectangle in the XY plane facing +Z.
    ///
    /// `(cx, cy)` is the origin as a fraction of the size: `(0.5, 0.5)` centers
    /// the rectangle, `(0, 0)` puts its bottom-left corner at the origin.
    pub fn from_rect(w: f32, h: f32, cx: f32, cy: f32) -> Self {
        Self::quad(
            [-cx * w, -cy * h],
            [(1.0 - cx) * w, (1.0 - cy) * h],
            [0.0, 0.0],
            [1.0, 1.0],
        )
    }

    /// Two triangles `(bl, br, tr)` and `(tr, tl, bl)` spanning `min..max`
    /// with texture coordinates `uv_min..uv_max`.
    fn quad(min: [f32; 2], max: [f32; 2], uv_min: [f32; 2], uv_max: [f32; 2]) -> Self {
        const NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

        let bl = Vertex::new([min[0], min[1], 0.0], NORMAL, [uv_min[0], uv_min[1]]);
        let br = Vertex::new([max[0], min[1], 0.0], NORMAL, [uv_max[0], uv_min[1]]);
        let tr = Vertex::new([max[0], max[1], 0.0], NORMAL, [uv_max[0], uv_max[1]]);
        let tl = Vertex::new([min[0], max[1], 0.0], NORMAL, [uv_min[0], uv_max[1]]);

        let mut g = Self::new();
        g.add_triangle(bl, br, tr);
        g.add_triangle(tr, tl, bl);
        g
    }

    /// One centered unit quad per tile of a sprite sheet, row-major from the
    /// top-left tile.
    ///
    /// Grid size uses integer division: a sheet whose dimensions are not a
    /// multiple of the tile size loses the partial row/column. Texture
    /// coordinates follow the GL convention (`v = 0` at the bottom of the sheet).
    pub fn spritesheet(sheet_w: u32, sheet_h: u32, tile_w: u32, tile_h: u32) -> Vec<Geometry> {
        if tile_w == 0 || tile_h == 0 {
            return Vec::new();
        }

        let cols = sheet_w / tile_w;
        let rows = sheet_h / tile_h;
        let du = tile_w as f32 / sheet_w as f32;
        let dv = tile_h as f32 / sheet_h as f32;

        let mut tiles = Vec::with_capacity(tile_count(cols, rows));
        for row in 0..rows {
            for col in 0..cols {
                let u0 = col as f32 * du;
                let v1 = 1.0 - row as f32 * dv;
                tiles.push(Self::quad(
                    [-0.5, -0.5],
                    [0.5, 0.5],
                    [u0, v1 - dv],
                    [u0 + du, v1],
                ));
            }
        }
        tiles
    }

    /// Loads a Wavefront OBJ file. See [`Geometry::parse_obj`].
    ///
    /// Failing to open the file is an error; everything after that is best effort.
    pub fn from_obj(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let geometry = Self::parse_obj(BufReader::new(file));
        log::debug!(
            "loaded {}: {} vertices, {} triangles",
            path.display(),
            geometry.vertices.len(),
            geometry.triangles.len() / 3
        );
        Ok(geometry)
    }

    /// Parses the `v`/`vn`/`vt`/`f` subset of OBJ.
    ///
    /// - Faces with exactly three references become triangles; other faces
    ///   are dropped.
    /// - References are `p`, `p/t`, `p/t/n` or `p//n`, 1-based. A missing
    ///   normal is `(0, 0, 0)`, a missing texture coordinate `(0, 0)`.
    /// - A malformed `v`/`vn`/`vt` record is read as zeros so later indices
    ///   stay aligned. Faces with out-of-range references are skipped. Both
    ///   log a warning. A read error stops parsing and keeps what was read so far.
    pub fn parse_obj(reader: impl BufRead) -> Self {
        let mut obj = ObjState::default();
        let mut geometry = Self::new();

        for (n, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("obj: read error at line {}: {e}; keeping partial geometry", n + 1);
                    break;
                }
            };
            if let Err(msg) = obj.parse_line(&line, &mut geometry) {
                log::warn!("obj: line {}: {msg}", n + 1);
            }
        }

        if obj.dropped_faces > 0 {
            log::debug!("obj: dropped {} non-triangle face(s)", obj.dropped_faces);
        }
        geometry
    }
}

/// `cols * rows` without `u32` overflow.
fn tile_count(cols: u32, rows: u32) -> usize {
    (cols as usize).saturating_mul(rows as usize)
}

#[derive(Default)]
struct ObjState {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    dropped_faces: usize,
}

fn floats<const N: usize>(tokens: &[&str]) -> std::result::Result<[f32; N], String> {
    if tokens.len() < N {
        return Err(format!("expected {N} components, found {}", tokens.len()));
    }
    let mut out = [0.0; N];
    for (slot, tok) in out.iter_mut().zip(tokens) {
        *slot = tok
            .parse()
            .map_err(|_| format!("invalid number `{tok}`"))?;
    }
    Ok(out)
}

fn push_or_zero<const N: usize>(
    list: &mut Vec<[f32; N]>,
    parsed: std::result::Result<[f32; N], String>,
) -> std::result::Result<(), String> {
    match parsed {
        Ok(value) => {
            list.push(value);
            Ok(())
        }
        Err(msg) => {
            list.push([0.0; N]);
            Err(format!("{msg}; using zeros"))
        }
    }
}

/// Resolves a 1-based reference into `list`.
fn lookup<T: Copy>(list: &[T], token: &str, what: &str) -> std::result::Result<T, String> {
    let i: usize = token
        .parse()
        .map_err(|_| format!("invalid {what} index `{token}`"))?;
    i.checked_sub(1)
        .and_then(|i| list.get(i).copied())
        .ok_or_else(|| format!("{what} index {i} out of range (have {})", list.len()))
}

impl ObjState {
    fn parse_line(&mut self, line: &str, geometry: &mut Geometry) -> std::result::Result<(), String> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&directive, rest)) = tokens.split_first() else {
            return Ok(());
        };

        match directive {
            // A malformed attribute still takes its slot so later references
            // keep pointing at the right records.
            "v" => return push_or_zero(&mut self.positions, floats::<3>(rest)),
            "vn" => return push_or_zero(&mut self.normals, floats::<3>(rest)),
            "vt" => return push_or_zero(&mut self.tex_coords, floats::<2>(rest)),
            "f" => {
                if rest.len() != 3 {
                    self.dropped_faces += 1;
                    return Ok(());
                }
                let a = self.vertex(rest[0])?;
                let b = self.vertex(rest[1])?;
                let c = self.vertex(rest[2])?;
                geometry.add_triangle(a, b, c);
            }
            // Comments, groups, materials, smoothing.
            _ => {}
        }
        Ok(())
    }

    fn vertex(&self, reference: &str) -> std::result::Result<Vertex, String> {
        let mut parts = reference.split('/');
        let position = lookup(&self.positions, parts.next().unwrap_or(""), "position")?;

        let tex_coord = match parts.next() {
            Some(t) if !t.is_empty() => lookup(&self.tex_coords, t, "texcoord")?,
            _ => [0.0; 2],
        };
        let normal = match parts.next() {
            Some(n) if !n.is_empty() => lookup(&self.normals, n, "normal")?,
            _ => [0.0; 3],
        };

        Ok(Vertex::new(position, normal, tex_coord))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32) -> Vertex {
        Vertex::new([x, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0])
    }

    // ── dedup ─────────────────────────────────────────────────────────────

    #[test]
    fn equal_vertex_is_not_duplicated() {
        let mut g = Geometry::new();
        let a = g.add_vertex(v(1.0));
        let b = g.add_vertex(v(2.0));
        let again = g.add_vertex(v(1.0));

        assert_eq!(again, a);
        assert_ne!(a, b);
        assert_eq!(g.vertices().len(), 2);
    }

    #[test]
    fn differing_normal_is_a_new_vertex() {
        let mut g = Geometry::new();
        let a = g.add_vertex(v(1.0));
        let mut other = v(1.0);
        other.normal = [0.0, 1.0, 0.0];
        assert_ne!(g.add_vertex(other), a);
    }

    #[test]
    fn primitive_lists_index_shared_vertices() {
        let mut g = Geometry::new();
        g.add_point(v(0.0));
        g.add_line(v(0.0), v(1.0));
        g.add_triangle(v(0.0), v(1.0), v(2.0));

        assert_eq!(g.points(), &[0]);
        assert_eq!(g.lines(), &[0, 1]);
        assert_eq!(g.triangles(), &[0, 1, 2]);
        assert_eq!(g.vertices().len(), 3);
    }

    // ── from_rect ─────────────────────────────────────────────────────────

    #[test]
    fn rect_is_two_triangles_over_four_vertices() {
        let g = Geometry::from_rect(2.0, 1.0, 0.5, 0.5);
        assert_eq!(g.vertices().len(), 4);
        assert_eq!(g.triangles().len(), 6);

        let (t0, t1) = g.triangles().split_at(3);
        let shared = t0.iter().filter(|i| t1.contains(i)).count();
        assert_eq!(shared, 2);
    }

    #[test]
    fn rect_origin_fraction() {
        let g = Geometry::from_rect(2.0, 4.0, 0.0, 0.0);
        let min_x = g.vertices().iter().map(|v| v.position[0]).fold(f32::MAX, f32::min);
        let max_y = g.vertices().iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        assert_eq!(min_x, 0.0);
        assert_eq!(max_y, 4.0);
        assert!(g.vertices().iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    // ── spritesheet ───────────────────────────────────────────────────────

    #[test]
    fn spritesheet_truncates_partial_tiles() {
        let tiles = Geometry::spritesheet(100, 64, 32, 32);
        assert_eq!(tiles.len(), 3 * 2);
    }

    #[test]
    fn spritesheet_first_tile_is_top_left() {
        let tiles = Geometry::spritesheet(64, 64, 32, 32);
        let uvs: Vec<[f32; 2]> = tiles[0].vertices().iter().map(|v| v.tex_coord).collect();
        assert!(uvs.contains(&[0.0, 0.5]));
        assert!(uvs.contains(&[0.5, 1.0]));
    }

    #[test]
    fn tile_count_does_not_overflow_u32() {
        assert_eq!(tile_count(3, 2), 6);
        assert!(tile_count(u32::MAX, u32::MAX) >= u32::MAX as usize);
    }

    #[test]
    fn spritesheet_zero_tile_is_empty() {
        assert!(Geometry::spritesheet(64, 64, 0, 32).is_empty());
    }

    // ── OBJ ───────────────────────────────────────────────────────────────

    const CUBE_FACE: &str = "\
# two triangles sharing an edge
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 1
vn 0 0 1
f 1/1/1 2//1 3/2/1
f 3/2/1 4 1/1/1
";

    #[test]
    fn obj_triangles_and_dedup() {
        let g = Geometry::parse_obj(CUBE_FACE.as_bytes());
        assert_eq!(g.triangles().len(), 6);
        // `4` has no normal, so it differs from every other vertex.
        assert_eq!(g.vertices().len(), 4);
        assert_eq!(g.triangles()[3], g.triangles()[2]);
        assert_eq!(g.vertices()[g.triangles()[5] as usize], g.vertices()[0]);
    }

    #[test]
    fn obj_missing_components_default_to_zero() {
        let g = Geometry::parse_obj("v 1 2 3\nf 1 1 1\n".as_bytes());
        assert_eq!(g.vertices(), &[Vertex::new([1.0, 2.0, 3.0], [0.0; 3], [0.0; 2])]);
    }

    #[test]
    fn obj_quads_are_dropped() {
        let g = Geometry::parse_obj("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n".as_bytes());
        assert!(g.triangles().is_empty());
    }

    #[test]
    fn obj_bad_faces_are_skipped() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nf 1 2 9\nf 1 2 3\n";
        let g = Geometry::parse_obj(src.as_bytes());
        assert_eq!(g.triangles().len(), 3);
        assert_eq!(g.vertices()[1].position, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn obj_malformed_attribute_keeps_later_indices() {
        let src = "v 0 0 0\nv x 0 0\nv 1 0 0\nv 1 1 0\nf 1 3 4\n";
        let g = Geometry::parse_obj(src.as_bytes());
        let positions: Vec<[f32; 3]> = g.vertices().iter().map(|v| v.position).collect();
        assert_eq!(positions, [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]]);

        // The bad record itself resolves to zeros.
        let g = Geometry::parse_obj("v x 0 0\nv 1 0 0\nv 1 1 0\nf 1 2 3\n".as_bytes());
        assert_eq!(g.vertices()[0].position, [0.0; 3]);
    }

    #[test]
    fn obj_missing_file_is_an_error() {
        assert!(Geometry::from_obj("/nonexistent/model.obj").is_err());
    }
}

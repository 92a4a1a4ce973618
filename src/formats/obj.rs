//! Provides a Wavefront OBJ format loader.
//!
//! Handles vertices and faces with fan triangulation of polygons. Each `g`
//! group becomes its own part, so a file exported as several objects comes
//! back as several meshes that the caller can merge. Materials are ignored:
//! sprites are always drawn with a flat tint.

use std::collections::HashMap;
use std::io::{BufReader, Cursor};

use obj::raw::object::{Group, Polygon, RawObj};
use obj::raw::parse_obj;

use super::{FormatLoader, LoadError, LoadResult, Mesh, MeshParts, Vec3};

/// The Wavefront OBJ loader.
///
/// # Examples
/// ```
/// use isosprite::formats::{obj::ObjLoader, FormatLoader};
///
/// let data = b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
/// let parts = ObjLoader.load_from_bytes(data).unwrap();
/// assert_eq!(parts.face_count(), 1);
/// ```
pub struct ObjLoader;

impl FormatLoader for ObjLoader {
    fn name(&self) -> &'static str {
        "Wavefront OBJ"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["obj"]
    }

    fn can_load(&self, data: &[u8], extension: Option<&str>) -> bool {
        if let Some(ext) = extension {
            if ext.to_lowercase() == "obj" {
                return true;
            }
        }

        // Content detection: look for OBJ vertex/face lines. The sample is
        // raw bytes since the cut-off can fall inside a UTF-8 character.
        let sample = &data[..data.len().min(4000)];
        let mut has_vertex = false;
        let mut has_face = false;
        for line in sample.split(|&b| b == b'\n') {
            let trimmed = line.trim_ascii();
            if trimmed.starts_with(b"v ") {
                has_vertex = true;
            }
            if trimmed.starts_with(b"f ") {
                has_face = true;
            }
            if has_vertex && has_face {
                return true;
            }
        }

        false
    }

    fn load_from_bytes(&self, data: &[u8]) -> LoadResult {
        let reader = BufReader::new(Cursor::new(data));
        let raw = parse_obj(reader)
            .map_err(|e| LoadError::InvalidData(format!("Failed to parse OBJ: {}", e)))?;

        convert_raw_obj_to_parts(&raw)
    }
}

/// Extracts position index at a given slot from any polygon variant.
fn polygon_pos_at(polygon: &Polygon, i: usize) -> Option<usize> {
    match polygon {
        Polygon::P(indices) => indices.get(i).copied(),
        Polygon::PT(pairs) => pairs.get(i).map(|&(p, _)| p),
        Polygon::PN(pairs) => pairs.get(i).map(|&(p, _)| p),
        Polygon::PTN(triples) => triples.get(i).map(|&(p, _, _)| p),
    }
}

/// Returns the number of vertices in a polygon.
fn polygon_len(polygon: &Polygon) -> usize {
    match polygon {
        Polygon::P(indices) => indices.len(),
        Polygon::PT(pairs) => pairs.len(),
        Polygon::PN(pairs) => pairs.len(),
        Polygon::PTN(triples) => triples.len(),
    }
}

/// Collects one part's triangles, keeping only the vertices it references.
#[derive(Default)]
struct PartBuilder {
    remap: HashMap<usize, u32>,
    mesh: Mesh,
}

impl PartBuilder {
    fn vertex(&mut self, global: usize, positions: &[Vec3]) -> u32 {
        let mesh = &mut self.mesh;
        *self.remap.entry(global).or_insert_with(|| {
            mesh.positions.push(positions[global]);
            (mesh.positions.len() - 1) as u32
        })
    }

    fn push_triangle(&mut self, corners: [usize; 3], positions: &[Vec3]) {
        let face = corners.map(|c| self.vertex(c, positions));
        self.mesh.faces.push(face);
    }
}

/// Assigns every polygon to a part index. Groups are visited in name order
/// and the first group listing a polygon owns it; polygons in no group land
/// in the trailing part at index `groups.len()`.
fn polygon_owners(raw: &RawObj) -> (Vec<usize>, usize) {
    let mut groups: Vec<(&String, &Group)> = raw.groups.iter().collect();
    groups.sort_by(|a, b| a.0.cmp(b.0));

    let ungrouped = groups.len();
    let mut owners = vec![ungrouped; raw.polygons.len()];
    let mut claimed = vec![false; raw.polygons.len()];

    for (part_idx, (_, group)) in groups.iter().enumerate() {
        for range in &group.polygons {
            for i in range.start..range.end.min(owners.len()) {
                if !claimed[i] {
                    claimed[i] = true;
                    owners[i] = part_idx;
                }
            }
        }
    }

    (owners, ungrouped + 1)
}

fn convert_raw_obj_to_parts(raw: &RawObj) -> LoadResult {
    let positions: Vec<Vec3> = raw.positions.iter().map(|p| [p.0, p.1, p.2]).collect();

    let (owners, part_count) = polygon_owners(raw);
    let mut builders: Vec<PartBuilder> = (0..part_count).map(|_| PartBuilder::default()).collect();
    let mut skipped = 0usize;

    for (poly_idx, polygon) in raw.polygons.iter().enumerate() {
        let n = polygon_len(polygon);
        if n < 3 {
            skipped += 1;
            continue;
        }

        let resolve = |slot: usize| polygon_pos_at(polygon, slot).filter(|&idx| idx < positions.len());

        // Fan triangulation
        let p0 = match resolve(0) {
            Some(idx) => idx,
            None => {
                skipped += 1;
                continue;
            }
        };

        let builder = &mut builders[owners[poly_idx]];
        for i in 1..n - 1 {
            match (resolve(i), resolve(i + 1)) {
                (Some(p1), Some(p2)) => builder.push_triangle([p0, p1, p2], &positions),
                _ => skipped += 1,
            }
        }
    }

    if skipped > 0 {
        log::warn!("skipped {} degenerate or out-of-range OBJ polygons", skipped);
    }

    let parts: Vec<Mesh> = builders
        .into_iter()
        .map(|b| b.mesh)
        .filter(|m| !m.is_empty())
        .collect();

    if parts.is_empty() {
        return Err(LoadError::NoGeometry);
    }

    Ok(MeshParts { parts })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_is_fan_triangulated() {
        let data = b"v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let parts = ObjLoader.load_from_bytes(data).unwrap();
        assert_eq!(parts.parts.len(), 1);
        assert_eq!(parts.parts[0].faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_part_keeps_only_referenced_vertices() {
        let data = b"v 0 0 0\nv 9 9 9\nv 1 0 0\nv 0 1 0\nf 1 3 4\n";
        let parts = ObjLoader.load_from_bytes(data).unwrap();
        let mesh = &parts.parts[0];
        assert_eq!(mesh.positions.len(), 3);
        assert!(!mesh.positions.contains(&[9.0, 9.0, 9.0]));
    }

    #[test]
    fn test_no_faces_is_no_geometry() {
        let data = b"v 0 0 0\nv 1 0 0\nv 0 1 0\n";
        let result = ObjLoader.load_from_bytes(data);
        assert!(matches!(result, Err(LoadError::NoGeometry)));
    }

    #[test]
    fn test_content_detection() {
        let data = b"# exported\nv 0 0 0\nf 1 1 1\n";
        assert!(ObjLoader.can_load(data, None));
        assert!(!ObjLoader.can_load(b"solid cube\nfacet normal 0 0 1", None));
    }
}

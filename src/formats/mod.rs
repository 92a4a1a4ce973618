//! Provides the format loader trait and the mesh types every loader produces.
//!
//! Loaders turn a file into [`MeshParts`]: one [`Mesh`] per object or group
//! found in the source. The sprite pipeline only ever renders a single mesh,
//! so callers normally go through [`load_mesh_from_path`], which merges the
//! parts into one.
//!
//! # Examples
//! ```
//! use isosprite::formats;
//!
//! let result = formats::load_parts(b"invalid", None);
//! assert!(result.is_err());
//! ```

pub mod obj;

use std::path::Path;

use thiserror::Error;

/// A 3D position used by format loaders.
///
/// # Examples
/// ```
/// use isosprite::formats::Vec3;
///
/// let v: Vec3 = [1.0, 2.0, 3.0];
/// assert_eq!(v, [1.0, 2.0, 3.0]);
/// ```
pub type Vec3 = [f32; 3];

/// A triangulated surface: vertex positions plus triangle indices into them.
///
/// Transform helpers never mutate in place; each returns a new mesh.
///
/// # Examples
/// ```
/// use isosprite::formats::Mesh;
///
/// let mesh = Mesh::new(
///     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
///     vec![[0, 1, 2]],
/// );
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Triangles as indices into `positions`.
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Creates a mesh from positions and triangle indices.
    pub fn new(positions: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Self {
        Self { positions, faces }
    }

    /// Returns the number of triangles.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns true when the mesh has no triangles to draw.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Computes the axis-aligned bounding box as `(min, max)`.
    ///
    /// Returns `None` for a mesh without vertices.
    ///
    /// # Examples
    /// ```
    /// use isosprite::formats::Mesh;
    ///
    /// let mesh = Mesh::new(vec![[-1.0, 0.0, 2.0], [3.0, 1.0, 0.0]], vec![]);
    /// assert_eq!(mesh.bounds(), Some(([-1.0, 0.0, 0.0], [3.0, 1.0, 2.0])));
    /// assert_eq!(Mesh::default().bounds(), None);
    /// ```
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.positions[1..] {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Some((min, max))
    }

    /// Returns the size of the bounding box along each axis (zero when empty).
    ///
    /// # Examples
    /// ```
    /// use isosprite::formats::Mesh;
    ///
    /// let mesh = Mesh::new(vec![[0.0, 0.0, 0.0], [2.0, 4.0, 1.0]], vec![]);
    /// assert_eq!(mesh.extents(), [2.0, 4.0, 1.0]);
    /// ```
    pub fn extents(&self) -> Vec3 {
        match self.bounds() {
            Some((min, max)) => [max[0] - min[0], max[1] - min[1], max[2] - min[2]],
            None => [0.0; 3],
        }
    }

    /// Returns the largest of the three bounding-box extents.
    pub fn max_extent(&self) -> f32 {
        let [x, y, z] = self.extents();
        x.max(y).max(z)
    }

    /// Returns a copy with every vertex offset by `offset`.
    pub fn translated(&self, offset: Vec3) -> Mesh {
        self.map_positions(|p| [p[0] + offset[0], p[1] + offset[1], p[2] + offset[2]])
    }

    /// Returns a copy uniformly scaled about the origin.
    pub fn scaled(&self, factor: f32) -> Mesh {
        self.map_positions(|p| [p[0] * factor, p[1] * factor, p[2] * factor])
    }

    /// Returns a copy with `matrix` applied to every vertex as a point.
    ///
    /// # Examples
    /// ```
    /// use glam::{Mat4, Vec3};
    /// use isosprite::formats::Mesh;
    ///
    /// let mesh = Mesh::new(vec![[1.0, 2.0, 3.0]], vec![]);
    /// let moved = mesh.transformed(&Mat4::from_translation(Vec3::X));
    /// assert_eq!(moved.positions[0], [2.0, 2.0, 3.0]);
    /// assert_eq!(mesh.positions[0], [1.0, 2.0, 3.0]);
    /// ```
    pub fn transformed(&self, matrix: &glam::Mat4) -> Mesh {
        self.map_positions(|p| matrix.transform_point3(glam::Vec3::from_array(p)).to_array())
    }

    fn map_positions(&self, f: impl Fn(Vec3) -> Vec3) -> Mesh {
        Mesh {
            positions: self.positions.iter().map(|&p| f(p)).collect(),
            faces: self.faces.clone(),
        }
    }
}

/// Represents every object or group a loader found in one file.
///
/// # Examples
/// ```
/// use isosprite::formats::{Mesh, MeshParts};
///
/// let tri = Mesh::new(
///     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
///     vec![[0, 1, 2]],
/// );
/// let parts = MeshParts { parts: vec![tri.clone(), tri] };
/// let merged = parts.concatenate();
/// assert_eq!(merged.positions.len(), 6);
/// assert_eq!(merged.faces[1], [3, 4, 5]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MeshParts {
    /// Sub-meshes in a deterministic order.
    pub parts: Vec<Mesh>,
}

impl MeshParts {
    /// Merges all parts into a single mesh, re-basing each part's indices.
    pub fn concatenate(&self) -> Mesh {
        let vertex_total = self.parts.iter().map(|m| m.positions.len()).sum();
        let face_total = self.parts.iter().map(|m| m.faces.len()).sum();
        let mut merged = Mesh {
            positions: Vec::with_capacity(vertex_total),
            faces: Vec::with_capacity(face_total),
        };

        for part in &self.parts {
            let base = merged.positions.len() as u32;
            merged.positions.extend_from_slice(&part.positions);
            merged
                .faces
                .extend(part.faces.iter().map(|f| [f[0] + base, f[1] + base, f[2] + base]));
        }

        merged
    }

    /// Returns the total triangle count across all parts.
    pub fn face_count(&self) -> usize {
        self.parts.iter().map(Mesh::face_count).sum()
    }
}

/// The result type for format loading.
///
/// # Examples
/// ```
/// use isosprite::formats::{LoadError, LoadResult};
///
/// let result: LoadResult = Err(LoadError::UnrecognizedFormat);
/// assert!(result.is_err());
/// ```
pub type LoadResult = Result<MeshParts, LoadError>;

/// Errors that can occur during format loading.
///
/// # Examples
/// ```
/// use isosprite::formats::LoadError;
///
/// let err = LoadError::NoGeometry;
/// assert_eq!(format!("{}", err), "No geometry found");
/// ```
#[derive(Debug, Error)]
pub enum LoadError {
    /// Represents invalid or corrupted file data.
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Indicates the file format is not recognized.
    #[error("Unrecognized format")]
    UnrecognizedFormat,
    /// Represents an IO error reading the file.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// Indicates no geometry was found in the model.
    #[error("No geometry found")]
    NoGeometry,
}

/// A trait for format-specific mesh loaders.
///
/// # Examples
/// ```
/// use isosprite::formats::{self, FormatLoader};
///
/// let loader = formats::obj::ObjLoader;
/// assert_eq!(loader.name(), "Wavefront OBJ");
/// ```
pub trait FormatLoader: Send + Sync {
    /// Returns the human-readable name for this format.
    fn name(&self) -> &'static str;

    /// Returns the file extensions this loader handles (lowercase, without dot).
    ///
    /// # Examples
    /// ```
    /// use isosprite::formats::{self, FormatLoader};
    ///
    /// let loader = formats::obj::ObjLoader;
    /// assert!(loader.extensions().contains(&"obj"));
    /// ```
    fn extensions(&self) -> &'static [&'static str];

    /// Checks whether this loader can handle the given data.
    ///
    /// This should be a quick check (e.g., an extension hint or the first
    /// few lines of a text format) without fully parsing the file.
    fn can_load(&self, data: &[u8], extension: Option<&str>) -> bool;

    /// Loads mesh parts from raw bytes.
    ///
    /// # Errors
    /// Returns an error if the data cannot be parsed or contains no geometry.
    fn load_from_bytes(&self, data: &[u8]) -> LoadResult;

    /// Loads mesh parts from a file path.
    ///
    /// Default implementation reads the file and calls `load_from_bytes`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    ///
    /// # Examples
    /// ```
    /// use std::path::Path;
    ///
    /// use isosprite::formats::{self, FormatLoader};
    ///
    /// let loader = formats::obj::ObjLoader;
    /// let result = loader.load_from_path(Path::new("does_not_exist.obj"));
    /// assert!(result.is_err());
    /// ```
    fn load_from_path(&self, path: &Path) -> LoadResult {
        let data = std::fs::read(path)?;
        self.load_from_bytes(&data)
    }
}

/// Returns all registered format loaders.
///
/// # Examples
/// ```
/// use isosprite::formats;
///
/// let loaders = formats::get_loaders();
/// assert!(!loaders.is_empty());
/// ```
pub fn get_loaders() -> Vec<Box<dyn FormatLoader>> {
    vec![Box::new(obj::ObjLoader)]
}

/// Returns every file extension some registered loader accepts.
///
/// # Examples
/// ```
/// use isosprite::formats;
///
/// assert_eq!(formats::mesh_extensions(), vec!["obj"]);
/// ```
pub fn mesh_extensions() -> Vec<&'static str> {
    get_loaders()
        .iter()
        .flat_map(|loader| loader.extensions().iter().copied())
        .collect()
}

/// Finds a loader that can handle the given data and extension.
///
/// # Examples
/// ```
/// use isosprite::formats;
///
/// let loader = formats::find_loader(b"", Some("OBJ"));
/// assert!(loader.is_some());
/// assert!(formats::find_loader(b"\x00\x01", Some("stl")).is_none());
/// ```
pub fn find_loader(data: &[u8], extension: Option<&str>) -> Option<Box<dyn FormatLoader>> {
    let mut loaders = get_loaders();

    // First, try to match by extension if provided
    if let Some(ext) = extension {
        let ext_lower = ext.to_lowercase();
        if let Some(idx) = loaders.iter().position(|loader| {
            loader.extensions().contains(&ext_lower.as_str())
                && loader.can_load(data, Some(&ext_lower))
        }) {
            return Some(loaders.swap_remove(idx));
        }
    }

    // Fall back to content-based detection
    loaders.into_iter().find(|loader| loader.can_load(data, extension))
}

/// Loads mesh parts from bytes, auto-detecting the format.
///
/// # Errors
/// Returns an error if no loader recognizes the data or parsing fails.
///
/// # Examples
/// ```
/// use isosprite::formats::{self, LoadError};
///
/// let result = formats::load_parts(b"invalid", None);
/// assert!(matches!(result, Err(LoadError::UnrecognizedFormat)));
/// ```
pub fn load_parts(data: &[u8], extension: Option<&str>) -> LoadResult {
    find_loader(data, extension)
        .ok_or(LoadError::UnrecognizedFormat)?
        .load_from_bytes(data)
}

/// Loads mesh parts from a file path, auto-detecting the format.
///
/// # Errors
/// Returns an error if the file cannot be read or the format is unrecognized.
pub fn load_parts_from_path(path: &Path) -> LoadResult {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase());

    let data = std::fs::read(path)?;

    let loader = find_loader(&data, extension.as_deref()).ok_or(LoadError::UnrecognizedFormat)?;
    log::debug!("{}: using {} loader", path.display(), loader.name());

    loader.load_from_bytes(&data)
}

/// Loads a file and merges all of its parts into one mesh.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed, or has no triangles.
///
/// # Examples
/// ```
/// use std::path::Path;
///
/// use isosprite::formats;
///
/// let result = formats::load_mesh_from_path(Path::new("does_not_exist.obj"));
/// assert!(result.is_err());
/// ```
pub fn load_mesh_from_path(path: &Path) -> Result<Mesh, LoadError> {
    let parts = load_parts_from_path(path)?;
    if parts.parts.len() > 1 {
        log::debug!(
            "{}: merging {} parts ({} triangles)",
            path.display(),
            parts.parts.len(),
            parts.face_count()
        );
    }

    let mesh = parts.concatenate();
    if mesh.is_empty() {
        return Err(LoadError::NoGeometry);
    }
    Ok(mesh)
}

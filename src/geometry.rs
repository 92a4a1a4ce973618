//! Provides mesh normalization and the fixed isometric view rotation.
//!
//! Both stages are pure: they borrow a mesh and return a new one.
//!
//! # Examples
//! ```
//! use isosprite::formats::Mesh;
//! use isosprite::geometry;
//!
//! let mesh = Mesh::new(
//!     vec![[10.0, 10.0, 10.0], [14.0, 12.0, 11.0], [10.0, 12.0, 10.0]],
//!     vec![[0, 1, 2]],
//! );
//! let unit = geometry::normalize(&mesh);
//! assert!((unit.max_extent() - 1.0).abs() < 1e-6);
//! let iso = geometry::to_isometric(&unit);
//! assert_eq!(iso.face_count(), 1);
//! ```

use glam::Mat4;

use crate::formats::Mesh;

/// Rotation about the vertical (Z) axis, applied first.
pub const ISOMETRIC_YAW_DEG: f32 = -45.0;

/// Tilt about the X axis, applied second. This is `atan(1/√2)`.
pub const ISOMETRIC_PITCH_DEG: f32 = 35.264;

/// Centers a mesh on its bounding-box midpoint and scales its largest
/// extent to exactly 1.
///
/// A mesh whose largest extent is zero (a single point, or no vertices at
/// all) is only centered, never scaled.
///
/// # Examples
/// ```
/// use isosprite::formats::Mesh;
/// use isosprite::geometry::normalize;
///
/// let point = Mesh::new(vec![[3.0, 3.0, 3.0]], vec![]);
/// assert_eq!(normalize(&point).positions[0], [0.0, 0.0, 0.0]);
/// ```
pub fn normalize(mesh: &Mesh) -> Mesh {
    let Some((min, max)) = mesh.bounds() else {
        return mesh.clone();
    };

    let center = [
        (min[0] + max[0]) * 0.5,
        (min[1] + max[1]) * 0.5,
        (min[2] + max[2]) * 0.5,
    ];
    let centered = mesh.translated([-center[0], -center[1], -center[2]]);

    let largest = mesh.max_extent();
    let scale = if largest > 0.0 { 1.0 / largest } else { 1.0 };
    centered.scaled(scale)
}

/// Builds the isometric view rotation: −45° about Z, then +35.264° about X.
///
/// The result never depends on mesh content.
///
/// # Examples
/// ```
/// use isosprite::geometry::isometric_matrix;
///
/// assert_eq!(isometric_matrix(), isometric_matrix());
/// ```
pub fn isometric_matrix() -> Mat4 {
    let yaw = Mat4::from_rotation_z(ISOMETRIC_YAW_DEG.to_radians());
    let pitch = Mat4::from_rotation_x(ISOMETRIC_PITCH_DEG.to_radians());
    pitch * yaw
}

/// Applies [`isometric_matrix`] to every vertex of a copy of `mesh`.
pub fn to_isometric(mesh: &Mesh) -> Mesh {
    mesh.transformed(&isometric_matrix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn cuboid(size: [f32; 3], offset: [f32; 3]) -> Mesh {
        let mut positions = Vec::new();
        for &x in &[0.0, size[0]] {
            for &y in &[0.0, size[1]] {
                for &z in &[0.0, size[2]] {
                    positions.push([x + offset[0], y + offset[1], z + offset[2]]);
                }
            }
        }
        Mesh::new(positions, vec![[0, 1, 2], [5, 6, 7]])
    }

    #[test]
    fn test_normalize_centers_and_scales() {
        let mesh = cuboid([4.0, 2.0, 1.0], [10.0, -3.0, 7.5]);
        let unit = normalize(&mesh);
        let (min, max) = unit.bounds().unwrap();
        for axis in 0..3 {
            assert!(((min[axis] + max[axis]) * 0.5).abs() < 1e-6);
        }
        assert!((unit.max_extent() - 1.0).abs() < 1e-6);
        assert_eq!(unit.extents()[1], 0.5);
    }

    #[test]
    fn test_normalize_leaves_source_untouched() {
        let mesh = cuboid([2.0, 2.0, 2.0], [1.0, 1.0, 1.0]);
        let before = mesh.clone();
        let _ = normalize(&mesh);
        assert_eq!(mesh, before);
    }

    #[test]
    fn test_normalize_degenerate_is_unscaled() {
        let mesh = Mesh::new(vec![[2.0, 2.0, 2.0], [2.0, 2.0, 2.0]], vec![]);
        let out = normalize(&mesh);
        assert_eq!(out.positions, vec![[0.0; 3], [0.0; 3]]);
    }

    #[test]
    fn test_isometric_axis_images() {
        let m = isometric_matrix();
        // The vertical axis ends up pointing down and toward the viewer.
        let up = m.transform_vector3(Vec3::Z);
        let s = ISOMETRIC_PITCH_DEG.to_radians().sin();
        let c = ISOMETRIC_PITCH_DEG.to_radians().cos();
        assert!(up.abs_diff_eq(Vec3::new(0.0, -s, c), 1e-6));

        // Diagonal (1, 1, 0) lies along +X after the yaw.
        let diag = m.transform_vector3(Vec3::new(1.0, 1.0, 0.0).normalize());
        assert!(diag.abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn test_isometric_is_rotation() {
        let m = isometric_matrix();
        assert!((m.determinant() - 1.0).abs() < 1e-6);
        assert!((m * m.transpose()).abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }
}

//! Provides a software rasterizer for isometric sprite renders.
//!
//! This module handles turning one mesh into an RGBA image: an orthographic
//! camera on the +Z axis, three fixed directional lights, a matte
//! metallic-roughness material, flat shading and a z-buffer.
//!
//! No GPU is required; it runs entirely on the CPU. The framebuffer that
//! stands in for an off-screen render target lives only for the duration of
//! one [`Scene::render`] call.
//!
//! # Examples
//! ```
//! use isosprite::formats::Mesh;
//! use isosprite::palette::Tint;
//! use isosprite::renderer;
//!
//! let tri = Mesh::new(
//!     vec![[-0.5, -0.5, 0.0], [0.5, -0.5, 0.0], [0.0, 0.5, 0.0]],
//!     vec![[0, 1, 2]],
//! );
//! let img = renderer::render(&tri, Tint::DEFAULT, 64).unwrap();
//! assert_eq!(img.dimensions(), (64, 64));
//! assert_eq!(img.get_pixel(0, 0).0[3], 0);
//! assert_eq!(img.get_pixel(32, 32).0[3], 255);
//! ```

use std::f32::consts::PI;

use glam::{Mat4, Vec3, Vec4};
use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::formats::Mesh;
use crate::palette::Tint;

/// Gray ambient term added to every face so shadows never go pure black.
pub const AMBIENT: f32 = 0.22;

/// Distance of the camera from the origin along +Z.
pub const CAMERA_DISTANCE: f32 = 2.8;

/// Reflectance at normal incidence for dielectric surfaces.
const DIELECTRIC_F0: f32 = 0.04;

/// Errors that make a mesh impossible to rasterize.
///
/// # Examples
/// ```
/// use isosprite::renderer::RenderError;
///
/// assert_eq!(RenderError::EmptyMesh.to_string(), "mesh has no faces");
/// ```
#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    /// The mesh has no triangles.
    #[error("mesh has no faces")]
    EmptyMesh,
    /// The requested raster has no pixels.
    #[error("render resolution must be non-zero")]
    ZeroResolution,
    /// A vertex position is NaN or infinite.
    #[error("vertex {0} has a non-finite position")]
    NonFiniteGeometry(usize),
    /// A face points past the end of the vertex list.
    #[error("face {face} references missing vertex {index}")]
    InvalidIndex { face: usize, index: u32 },
}

/// Surface response parameters for the metallic-roughness model.
///
/// # Examples
/// ```
/// use isosprite::renderer::Material;
///
/// let m = Material::default();
/// assert_eq!(m.metallic, 0.0);
/// assert_eq!(m.roughness, 0.9);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// 0.0 for dielectrics, 1.0 for metals.
    pub metallic: f32,
    /// Perceptual roughness in `[0, 1]`.
    pub roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            metallic: 0.0,
            roughness: 0.9,
        }
    }
}

impl Material {
    fn f0(&self) -> f32 {
        DIELECTRIC_F0 * (1.0 - self.metallic) + self.metallic
    }

    /// Lambertian weight per unit of incoming light.
    fn diffuse_weight(&self) -> f32 {
        (1.0 - self.f0()) * (1.0 - self.metallic) / PI
    }

    /// GGX / Smith / Schlick specular term. `n`, `l` and `v` are unit vectors.
    fn specular(&self, n: Vec3, l: Vec3, v: Vec3) -> f32 {
        let n_dot_l = n.dot(l);
        let n_dot_v = n.dot(v).max(1e-4);
        if n_dot_l <= 0.0 {
            return 0.0;
        }

        let h = (l + v).normalize_or_zero();
        let n_dot_h = n.dot(h).max(0.0);
        let v_dot_h = v.dot(h).max(0.0);

        let alpha = self.roughness * self.roughness;
        let a2 = alpha * alpha;
        let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
        let d = a2 / (PI * denom * denom);

        let k = (self.roughness + 1.0).powi(2) / 8.0;
        let g = (n_dot_v / (n_dot_v * (1.0 - k) + k)) * (n_dot_l / (n_dot_l * (1.0 - k) + k));

        let f0 = self.f0();
        let f = f0 + (1.0 - f0) * (1.0 - v_dot_h).powi(5);

        d * g * f / (4.0 * n_dot_l * n_dot_v)
    }
}

/// A white directional light. It shines along the −Z axis of its pose.
///
/// # Examples
/// ```
/// use glam::{Mat4, Vec3};
/// use isosprite::renderer::DirectionalLight;
///
/// let light = DirectionalLight::new(Mat4::IDENTITY, 1.0);
/// assert_eq!(light.direction(), Vec3::NEG_Z);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    /// Orientation of the light.
    pub pose: Mat4,
    /// Radiant intensity in arbitrary units.
    pub intensity: f32,
}

impl DirectionalLight {
    pub fn new(pose: Mat4, intensity: f32) -> Self {
        Self { pose, intensity }
    }

    /// Returns the unit direction the light travels in.
    pub fn direction(&self) -> Vec3 {
        self.pose.transform_vector3(Vec3::NEG_Z).normalize()
    }
}

/// Returns the main, fill and back lights used for every sprite.
///
/// Main and fill are tilted ±35° about X; the back light is turned 140°
/// about Y for rim separation.
pub fn sprite_lights() -> [DirectionalLight; 3] {
    [
        DirectionalLight::new(Mat4::from_rotation_x(35.0_f32.to_radians()), 3.2),
        DirectionalLight::new(Mat4::from_rotation_x((-35.0_f32).to_radians()), 1.4),
        DirectionalLight::new(Mat4::from_rotation_y(140.0_f32.to_radians()), 0.6),
    ]
}

/// An orthographic camera looking from `eye` at the origin with +Y up.
///
/// # Examples
/// ```
/// use isosprite::renderer::OrthoCamera;
///
/// let cam = OrthoCamera::fitting(1.5);
/// assert_eq!(cam.xmag, 1.5);
/// assert_eq!(cam.ymag, 1.5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrthoCamera {
    pub eye: Vec3,
    /// Half-width of the view volume.
    pub xmag: f32,
    /// Half-height of the view volume.
    pub ymag: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl OrthoCamera {
    /// Builds the sprite camera whose view half-size equals `extent`.
    pub fn fitting(extent: f32) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, CAMERA_DISTANCE),
            xmag: extent,
            ymag: extent,
            znear: 0.05,
            zfar: 100.0,
        }
    }

    /// Returns the combined view-projection matrix.
    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, Vec3::ZERO, Vec3::Y);
        let proj = Mat4::orthographic_rh_gl(
            -self.xmag, self.xmag, -self.ymag, self.ymag, self.znear, self.zfar,
        );
        proj * view
    }

    /// Unit vector from the scene toward the camera.
    pub fn view_dir(&self) -> Vec3 {
        self.eye.normalize()
    }
}

/// One mesh with its camera, lights and surface, ready to rasterize.
pub struct Scene<'a> {
    pub mesh: &'a Mesh,
    pub tint: Tint,
    pub material: Material,
    pub ambient: f32,
    pub camera: OrthoCamera,
    pub lights: Vec<DirectionalLight>,
}

impl<'a> Scene<'a> {
    /// Assembles the standard sprite scene around an already-transformed mesh.
    ///
    /// # Examples
    /// ```
    /// use isosprite::formats::Mesh;
    /// use isosprite::palette::Tint;
    /// use isosprite::renderer::Scene;
    ///
    /// let mesh = Mesh::new(vec![[0.0, 0.0, 0.0], [2.0, 1.0, 0.0]], vec![]);
    /// let scene = Scene::sprite(&mesh, Tint::DEFAULT);
    /// assert_eq!(scene.camera.xmag, 2.0);
    /// assert_eq!(scene.lights.len(), 3);
    /// ```
    pub fn sprite(mesh: &'a Mesh, tint: Tint) -> Self {
        Self {
            mesh,
            tint,
            material: Material::default(),
            ambient: AMBIENT,
            camera: OrthoCamera::fitting(mesh.max_extent()),
            lights: sprite_lights().to_vec(),
        }
    }

    /// Brightness of a face with unit normal `n` (already facing the camera).
    fn shade(&self, n: Vec3) -> f32 {
        let v = self.camera.view_dir();
        let diffuse_weight = self.material.diffuse_weight();

        let mut total = self.ambient;
        for light in &self.lights {
            let l = -light.direction();
            let n_dot_l = n.dot(l);
            if n_dot_l <= 0.0 {
                continue;
            }
            let diffuse = diffuse_weight * n_dot_l;
            let specular = self.material.specular(n, l, v) * n_dot_l;
            total += light.intensity * (diffuse + specular);
        }

        total.min(1.0)
    }

    fn validate(&self, resolution: u32) -> Result<(), RenderError> {
        if resolution == 0 {
            return Err(RenderError::ZeroResolution);
        }
        if self.mesh.is_empty() {
            return Err(RenderError::EmptyMesh);
        }
        if let Some(idx) = self
            .mesh
            .positions
            .iter()
            .position(|p| !p.iter().all(|c| c.is_finite()))
        {
            return Err(RenderError::NonFiniteGeometry(idx));
        }
        let count = self.mesh.positions.len();
        for (face, tri) in self.mesh.faces.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= count) {
                return Err(RenderError::InvalidIndex { face, index });
            }
        }
        Ok(())
    }

    /// Rasterizes the scene into a `resolution × resolution` RGBA image.
    ///
    /// # Errors
    /// Returns an error for an empty mesh, a zero resolution, non-finite
    /// vertices or out-of-range face indices.
    pub fn render(&self, resolution: u32) -> Result<RgbaImage, RenderError> {
        self.validate(resolution)?;

        let mut target = Framebuffer::new(resolution, resolution);
        if self.camera.xmag <= 1e-6 || self.camera.ymag <= 1e-6 {
            log::debug!("mesh collapses to a point; rendering blank frame");
            return Ok(target.into_image());
        }

        let view_proj = self.camera.view_proj();
        let view_dir = self.camera.view_dir();
        let base = self.tint.to_unit();
        let size = resolution as f32;

        // ---- Rasterize each triangle ----
        for tri in &self.mesh.faces {
            let world = tri.map(|i| Vec3::from_array(self.mesh.positions[i as usize]));

            let mut screen = [Vec3::ZERO; 3];
            let mut visible = true;
            for i in 0..3 {
                let clip: Vec4 = view_proj * world[i].extend(1.0);
                let inv_w = 1.0 / clip.w;
                let ndc = clip.truncate() * inv_w;
                if !(-1.0..=1.0).contains(&ndc.z) {
                    visible = false;
                    break;
                }
                screen[i] = Vec3::new(
                    (ndc.x * 0.5 + 0.5) * size,
                    (0.5 - ndc.y * 0.5) * size,
                    ndc.z,
                );
            }
            if !visible {
                continue;
            }

            // Face normal in world space (flat shading), turned toward the camera
            let normal = (world[1] - world[0]).cross(world[2] - world[0]).normalize_or_zero();
            if normal == Vec3::ZERO {
                continue;
            }
            let normal = if normal.dot(view_dir) < 0.0 { -normal } else { normal };

            let shade = self.shade(normal);
            let color = [
                base[0] * shade,
                base[1] * shade,
                base[2] * shade,
                base[3],
            ];

            target.fill_triangle(screen, color);
        }

        Ok(target.into_image())
    }
}

/// Renders a transformed mesh with the standard sprite scene.
///
/// # Errors
/// See [`Scene::render`].
pub fn render(mesh: &Mesh, tint: Tint, resolution: u32) -> Result<RgbaImage, RenderError> {
    Scene::sprite(mesh, tint).render(resolution)
}

/// Color and depth targets for one render call.
struct Framebuffer {
    width: usize,
    height: usize,
    color: Vec<[f32; 4]>,
    depth: Vec<f32>,
}

impl Framebuffer {
    fn new(width: u32, height: u32) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self {
            width: w,
            height: h,
            color: vec![[0.0; 4]; w * h],
            depth: vec![f32::INFINITY; w * h],
        }
    }

    fn fill_triangle(&mut self, screen: [Vec3; 3], color: [f32; 4]) {
        let (w, h) = (self.width, self.height);

        // Screen-space bounding box
        let min_x = screen[0].x.min(screen[1].x).min(screen[2].x).max(0.0) as usize;
        let max_x = (screen[0].x.max(screen[1].x).max(screen[2].x).ceil().max(0.0) as usize).min(w);
        let min_y = screen[0].y.min(screen[1].y).min(screen[2].y).max(0.0) as usize;
        let max_y = (screen[0].y.max(screen[1].y).max(screen[2].y).ceil().max(0.0) as usize).min(h);

        for y in min_y..max_y {
            for x in min_x..max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let (u, v, t) = barycentric(screen, px, py);
                if u < 0.0 || v < 0.0 || t < 0.0 {
                    continue;
                }

                let z = u * screen[0].z + v * screen[1].z + t * screen[2].z;
                let idx = y * w + x;
                if z < self.depth[idx] {
                    self.depth[idx] = z;
                    self.color[idx] = color;
                }
            }
        }
    }

    fn into_image(self) -> RgbaImage {
        let width = self.width as u32;
        RgbaImage::from_fn(width, self.height as u32, |x, y| {
            let c = self.color[y as usize * self.width + x as usize];
            Rgba(c.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8))
        })
    }
}

// ===========================================================================
// Rasterization helpers
// ===========================================================================

fn barycentric(tri: [Vec3; 3], px: f32, py: f32) -> (f32, f32, f32) {
    let v0x = tri[1].x - tri[0].x;
    let v0y = tri[1].y - tri[0].y;
    let v1x = tri[2].x - tri[0].x;
    let v1y = tri[2].y - tri[0].y;
    let v2x = px - tri[0].x;
    let v2y = py - tri[0].y;

    let d00 = v0x * v0x + v0y * v0y;
    let d01 = v0x * v1x + v0y * v1y;
    let d11 = v1x * v1x + v1y * v1y;
    let d20 = v2x * v0x + v2y * v0y;
    let d21 = v2x * v1x + v2y * v1y;

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < 1e-10 {
        return (-1.0, -1.0, -1.0);
    }

    let inv = 1.0 / denom;
    let v = (d11 * d20 - d01 * d21) * inv;
    let w = (d00 * d21 - d01 * d20) * inv;
    let u = 1.0 - v - w;

    (u, v, w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(z: f32) -> Mesh {
        Mesh::new(
            vec![
                [-0.5, -0.5, z],
                [0.5, -0.5, z],
                [0.5, 0.5, z],
                [-0.5, 0.5, z],
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_render_empty_mesh() {
        let result = render(&Mesh::default(), Tint::DEFAULT, 32);
        assert_eq!(result.unwrap_err(), RenderError::EmptyMesh);
    }

    #[test]
    fn test_render_zero_resolution() {
        let result = render(&square(0.0), Tint::DEFAULT, 0);
        assert_eq!(result.unwrap_err(), RenderError::ZeroResolution);
    }

    #[test]
    fn test_render_rejects_nan() {
        let mut mesh = square(0.0);
        mesh.positions[2][1] = f32::NAN;
        assert_eq!(
            render(&mesh, Tint::DEFAULT, 16).unwrap_err(),
            RenderError::NonFiniteGeometry(2)
        );
    }

    #[test]
    fn test_render_rejects_bad_index() {
        let mut mesh = square(0.0);
        mesh.faces.push([0, 1, 9]);
        assert_eq!(
            render(&mesh, Tint::DEFAULT, 16).unwrap_err(),
            RenderError::InvalidIndex { face: 2, index: 9 }
        );
    }

    #[test]
    fn test_render_output_dimensions() {
        let img = render(&square(0.0), Tint::DEFAULT, 48).unwrap();
        assert_eq!(img.dimensions(), (48, 48));
    }

    #[test]
    fn test_background_transparent_and_silhouette_opaque() {
        // View half-size equals extent (1.0), so the square covers the middle half.
        let img = render(&square(0.0), Tint::DEFAULT, 64).unwrap();
        assert_eq!(img.get_pixel(2, 2).0[3], 0);
        assert_eq!(img.get_pixel(63, 63).0[3], 0);
        assert_eq!(img.get_pixel(32, 32).0[3], 255);
        assert_eq!(img.get_pixel(17, 17).0[3], 255);
        assert_eq!(img.get_pixel(14, 32).0[3], 0);
    }

    #[test]
    fn test_flat_shading_is_uniform_per_face() {
        let img = render(&square(0.0), Tint::new(200, 100, 50, 255), 64).unwrap();
        let center = *img.get_pixel(32, 32);
        for (x, y) in [(20, 20), (44, 20), (20, 44), (43, 43)] {
            assert_eq!(*img.get_pixel(x, y), center);
        }
    }

    #[test]
    fn test_winding_does_not_matter() {
        let front = square(0.0);
        let mut back = square(0.0);
        for f in &mut back.faces {
            f.swap(1, 2);
        }
        let a = render(&front, Tint::DEFAULT, 32).unwrap();
        let b = render(&back, Tint::DEFAULT, 32).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_depth_keeps_nearest_face() {
        let tint = Tint::new(255, 255, 255, 255);
        let near = square(0.3);
        // Tilted so it shades differently from the near square.
        let far = square(0.0)
            .transformed(&Mat4::from_rotation_y(1.0))
            .translated([0.0, 0.0, -0.3]);
        let near_px = *render(&near, tint, 32).unwrap().get_pixel(16, 16);
        let far_px = *render(&far, tint, 32).unwrap().get_pixel(16, 16);
        assert_ne!(near_px, far_px);

        let mesh = crate::formats::MeshParts {
            parts: vec![near, far],
        }
        .concatenate();
        let mut reversed = mesh.clone();
        reversed.faces.reverse();

        assert_eq!(*render(&mesh, tint, 32).unwrap().get_pixel(16, 16), near_px);
        assert_eq!(*render(&reversed, tint, 32).unwrap().get_pixel(16, 16), near_px);
    }

    #[test]
    fn test_point_mesh_renders_blank() {
        let mesh = Mesh::new(vec![[0.0; 3]; 3], vec![[0, 1, 2]]);
        let img = render(&mesh, Tint::DEFAULT, 16).unwrap();
        assert!(img.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_lights_are_fixed() {
        let lights = sprite_lights();
        let intensities: Vec<f32> = lights.iter().map(|l| l.intensity).collect();
        assert_eq!(intensities, vec![3.2, 1.4, 0.6]);
        // Main light travels up and away from the camera.
        let main = lights[0].direction();
        assert!(main.y > 0.0 && main.z < 0.0);
        assert!(main.x.abs() < 1e-6);
    }

    #[test]
    fn test_face_lit_by_main_light_saturates_to_tint() {
        let mesh = Mesh::default();
        let scene = Scene::sprite(&mesh, Tint::DEFAULT);
        let toward_main = -sprite_lights()[0].direction();
        assert_eq!(scene.shade(toward_main), 1.0);
        // A face edge-on to every light only gets ambient.
        let shade = scene.shade(Vec3::X);
        assert!(shade >= AMBIENT && shade < 0.5);
    }
}

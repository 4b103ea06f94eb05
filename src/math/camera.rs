//! Camera used for portal visibility
//!
//! Only the view transform and the near-plane projection are needed here:
//! portals are projected onto the near plane and clipped against the
//! frustum rectangle, nothing is rasterized.

use super::{Aabb, FrustumParameters, Vec3};

/// Viewer state for visibility queries
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub rotation_x: f32, // Pitch
    pub rotation_y: f32, // Yaw
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Width over height
    pub aspect: f32,
    /// Distance to the near plane, must be positive
    pub near: f32,

    // Computed basis vectors
    pub basis_x: Vec3,
    pub basis_y: Vec3,
    pub basis_z: Vec3,
}

/// Where a box ends up once projected onto the near plane
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    /// Every corner is at or behind the near plane
    Behind,
    /// Some corners are behind the near plane; no usable rectangle
    Straddling,
    /// Fully in front, projected to this near-plane rectangle
    Rect(FrustumParameters),
}

impl Camera {
    pub fn new(position: Vec3, rotation_y: f32, rotation_x: f32) -> Self {
        let mut cam = Self {
            position,
            rotation_x,
            rotation_y,
            fov_y: std::f32::consts::FRAC_PI_2,
            aspect: 1.0,
            near: 0.1,
            basis_x: Vec3::X,
            basis_y: Vec3::Y,
            basis_z: Vec3::Z,
        };
        cam.update_basis();
        cam
    }

    pub fn with_lens(mut self, fov_y: f32, aspect: f32, near: f32) -> Self {
        self.fov_y = fov_y;
        self.aspect = aspect;
        self.near = near;
        self
    }

    pub fn update_basis(&mut self) {
        // Forward vector based on rotation
        self.basis_z = Vec3 {
            x: self.rotation_x.cos() * self.rotation_y.sin(),
            y: self.rotation_x.sin(),
            z: self.rotation_x.cos() * self.rotation_y.cos(),
        };

        // Right vector
        self.basis_x = Vec3::UP.cross(self.basis_z).normalize();

        // Up vector
        self.basis_y = self.basis_z.cross(self.basis_x);
    }

    /// World point to camera space (x right, y up, z forward)
    pub fn to_view(&self, point: Vec3) -> Vec3 {
        let rel = point - self.position;
        Vec3::new(rel.dot(self.basis_x), rel.dot(self.basis_y), rel.dot(self.basis_z))
    }

    /// The whole view volume as a near-plane rectangle
    pub fn frustum(&self) -> FrustumParameters {
        let half_h = self.near * (self.fov_y * 0.5).tan();
        let half_w = half_h * self.aspect;
        FrustumParameters::new(-half_w, half_w, -half_h, half_h)
    }

    /// Project a world-space box onto the near plane
    pub fn project_bounds(&self, bounds: &Aabb) -> Projection {
        let mut behind = 0;
        let mut rect: Option<FrustumParameters> = None;

        for corner in bounds.corners() {
            let v = self.to_view(corner);
            if v.z <= self.near {
                behind += 1;
                continue;
            }
            let x = v.x * self.near / v.z;
            let y = v.y * self.near / v.z;
            rect = Some(match rect {
                Some(r) => FrustumParameters::new(r.left.min(x), r.right.max(x), r.bottom.min(y), r.top.max(y)),
                None => FrustumParameters::new(x, x, y, y),
            });
        }

        match (behind, rect) {
            (8, _) | (_, None) => Projection::Behind,
            (0, Some(r)) => Projection::Rect(r),
            _ => Projection::Straddling,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_basis_is_orthonormal() {
        let cam = Camera::new(Vec3::ZERO, 0.7, 0.3);
        assert!((cam.basis_x.len() - 1.0).abs() < 1e-5);
        assert!((cam.basis_z.len() - 1.0).abs() < 1e-5);
        assert!(cam.basis_x.dot(cam.basis_z).abs() < 1e-5);
        assert!(cam.basis_y.dot(cam.basis_z).abs() < 1e-5);
    }

    #[test]
    fn test_yaw_turns_toward_x() {
        let cam = Camera::new(Vec3::ZERO, FRAC_PI_2, 0.0);
        assert!((cam.basis_z.x - 1.0).abs() < 1e-5);
        let v = cam.to_view(Vec3::new(5.0, 0.0, 0.0));
        assert!((v.z - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_project_bounds() {
        let cam = Camera::default();
        let ahead = Aabb::new(Vec3::new(-1.0, -1.0, 4.0), Vec3::new(1.0, 1.0, 5.0));
        match cam.project_bounds(&ahead) {
            Projection::Rect(r) => {
                // Nearest face dominates: 1 * 0.1 / 4
                assert!((r.right - 0.025).abs() < 1e-5);
                assert!((r.left + 0.025).abs() < 1e-5);
            }
            other => panic!("expected rect, got {:?}", other),
        }

        let behind = ahead.translated(Vec3::new(0.0, 0.0, -10.0));
        assert_eq!(cam.project_bounds(&behind), Projection::Behind);

        let around = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(cam.project_bounds(&around), Projection::Straddling);
    }
}

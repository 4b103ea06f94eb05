use serde::{Serialize, Deserialize};

/// Sub-frustum expressed as a rectangle on the camera near plane
///
/// The renderer uses one of these per traversed portal to clip what it
/// draws behind that portal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrustumParameters {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl FrustumParameters {
    pub fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self { left, right, bottom, top }
    }

    /// Overlap of two rectangles, `None` unless it has a positive area
    pub fn intersection(&self, other: &FrustumParameters) -> Option<FrustumParameters> {
        let left = self.left.max(other.left);
        let right = self.right.min(other.right);
        let bottom = self.bottom.max(other.bottom);
        let top = self.top.min(other.top);
        if left < right && bottom < top {
            Some(FrustumParameters { left, right, bottom, top })
        } else {
            None
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }
}

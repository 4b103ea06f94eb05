use std::rc::Rc;

use crate::math::{Aabb, Triangle, Vec3};
use crate::world::Renderable;

/// A moving entity followed through the cell graph
#[derive(Debug, Clone)]
pub struct Body {
    pub name: String,
    renderable: Rc<Renderable>,
    /// World-space offset of the renderable
    pub translation: Vec3,
}

impl Body {
    pub fn new(name: impl Into<String>, renderable: Renderable, translation: Vec3) -> Self {
        Self::shared(name, Rc::new(renderable), translation)
    }

    /// Body reusing an existing renderable (several entities, one mesh)
    pub fn shared(name: impl Into<String>, renderable: Rc<Renderable>, translation: Vec3) -> Self {
        Self { name: name.into(), renderable, translation }
    }

    pub fn renderable(&self) -> &Rc<Renderable> {
        &self.renderable
    }

    /// World-space bound, `None` for a body without geometry
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.renderable.bounds().map(|b| b.translated(self.translation))
    }

    pub fn world_triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.renderable.triangles().map(move |t| t.translated(self.translation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_bounds_follow_translation() {
        let mut body = Body::new("crate", Renderable::cuboid(Vec3::splat(1.0)), Vec3::new(5.0, 1.0, 5.0));
        assert_eq!(body.world_bounds(), Some(Aabb::new(Vec3::new(4.0, 0.0, 4.0), Vec3::new(6.0, 2.0, 6.0))));

        body.translation = Vec3::ZERO;
        assert!(body.world_triangles().all(|t| t.bounds().max.x <= 1.0));
        assert!(Body::new("ghost", Renderable::Composite(Vec::new()), Vec3::ZERO).world_bounds().is_none());
    }
}

//! Axis-aligned boxes for the continuous games.

use serde::Serialize;

/// An axis-aligned box, `(x, y)` being its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aabb {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Aabb {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// The box around a circle.
    pub fn around_circle(cx: f64, cy: f64, radius: f64) -> Self {
        Self::new(cx - radius, cy - radius, radius * 2.0, radius * 2.0)
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Strict overlap: boxes that only touch do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Keeps the box vertically inside `0..=height`.
    pub fn clamp_vertical(&mut self, height: f64) {
        self.y = self.y.clamp(0.0, (height - self.height).max(0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_boxes_do_not_intersect() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&Aabb::new(10.0, 0.0, 5.0, 5.0)));
        assert!(a.intersects(&Aabb::new(9.5, 9.5, 5.0, 5.0)));
    }

    #[test]
    fn test_clamp_vertical() {
        let mut paddle = Aabb::new(20.0, -15.0, 10.0, 80.0);
        paddle.clamp_vertical(400.0);
        assert_eq!(paddle.y, 0.0);
        paddle.y = 390.0;
        paddle.clamp_vertical(400.0);
        assert_eq!(paddle.y, 320.0);
    }

    #[test]
    fn test_box_around_circle() {
        let b = Aabb::around_circle(100.0, 50.0, 8.0);
        assert_eq!((b.left(), b.right(), b.top(), b.bottom()), (92.0, 108.0, 42.0, 58.0));
    }
}

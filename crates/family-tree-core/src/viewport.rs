//! Pan/zoom transform and fit-to-bounds.
//!
//! A `Transform` maps world coordinates to screen coordinates:
//! `screen = world * k + (x, y)`. User zoom is clamped to a `ZoomExtent`;
//! fitting is not (a very wide tree may need to go below the minimum to be
//! fully visible) but is capped so small trees are never blown up past 1:1.

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Vec2};

pub const MIN_ZOOM: f32 = 0.35;
pub const MAX_ZOOM: f32 = 2.2;
pub const ZOOM_IN_FACTOR: f32 = 1.18;
pub const ZOOM_OUT_FACTOR: f32 = 0.85;
/// Padding used for the initial fit and after a resize
pub const FIT_PADDING_AUTO: f32 = 120.0;
/// Padding used by the "fit" and "show full tree" controls
pub const FIT_PADDING_MANUAL: f32 = 110.0;
pub const FIT_MAX_SCALE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub k: f32,
    pub x: f32,
    pub y: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn new(k: f32, x: f32, y: f32) -> Self {
        Self { k, x, y }
    }

    pub fn apply(&self, world: Vec2) -> Vec2 {
        Vec2::new(world.x * self.k + self.x, world.y * self.k + self.y)
    }

    pub fn invert(&self, screen: Vec2) -> Vec2 {
        Vec2::new((screen.x - self.x) / self.k, (screen.y - self.y) / self.k)
    }

    pub fn apply_rect(&self, world: Rect) -> Rect {
        Rect::from_min_max(self.apply(world.min), self.apply(world.max))
    }

    pub fn approx_eq(&self, other: &Transform, eps: f32) -> bool {
        (self.k - other.k).abs() <= eps
            && (self.x - other.x).abs() <= eps
            && (self.y - other.y).abs() <= eps
    }

    /// SVG `transform` attribute value.
    pub fn to_svg(&self) -> String {
        format!("translate({:.2},{:.2}) scale({:.4})", self.x, self.y, self.k)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomExtent {
    pub min: f32,
    pub max: f32,
}

impl Default for ZoomExtent {
    fn default() -> Self {
        Self {
            min: MIN_ZOOM,
            max: MAX_ZOOM,
        }
    }
}

impl ZoomExtent {
    pub fn clamp(&self, k: f32) -> f32 {
        k.clamp(self.min, self.max)
    }
}

/// Transform that fits `bounds` into a `size` viewport with `padding` on every side.
///
/// Returns `None` for empty or non-finite bounds.
pub fn fit_transform(bounds: Rect, size: Vec2, padding: f32, max_scale: f32) -> Option<Transform> {
    if bounds.is_negative() || !bounds.min.is_finite() || !bounds.max.is_finite() {
        return None;
    }
    let w = size.x.max(1.0);
    let h = size.y.max(1.0);
    let full_w = bounds.width() + 2.0 * padding;
    let full_h = bounds.height() + 2.0 * padding;
    let k = (w / full_w).min(h / full_h).min(max_scale);
    if !k.is_finite() || k <= 0.0 {
        return None;
    }
    let x = (w - bounds.width() * k) / 2.0 - bounds.min.x * k;
    let y = (h - bounds.height() * k) / 2.0 - bounds.min.y * k;
    Some(Transform { k, x, y })
}

/// Viewport state: screen size plus the current transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    size: Vec2,
    transform: Transform,
    extent: ZoomExtent,
    fit_max_scale: f32,
    /// Scale of the last fit; zooming out may always return to it
    #[serde(default)]
    fit_floor: Option<f32>,
}

impl Viewport {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            transform: Transform::IDENTITY,
            extent: ZoomExtent::default(),
            fit_max_scale: FIT_MAX_SCALE,
            fit_floor: None,
        }
    }

    pub fn with_extent(mut self, extent: ZoomExtent) -> Self {
        self.extent = extent;
        self
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn extent(&self) -> ZoomExtent {
        self.extent
    }

    pub fn set_size(&mut self, size: Vec2) -> bool {
        let changed = self.size != size;
        self.size = size;
        changed
    }

    pub fn set_transform(&mut self, transform: Transform) -> bool {
        let changed = self.transform != transform;
        self.transform = transform;
        changed
    }

    /// Scale by `factor`, keeping the world point under `anchor` (screen space,
    /// viewport centre when `None`) fixed. Returns whether anything changed.
    pub fn zoom_by(&mut self, factor: f32, anchor: Option<Vec2>) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let anchor = anchor.unwrap_or(self.size / 2.0);
        let old = self.transform;
        // A fit may have gone below the minimum; zooming out must not jump up to it.
        let lower = self.extent.min.min(old.k).min(self.fit_floor.unwrap_or(f32::INFINITY));
        let upper = self.extent.max.max(old.k);
        let k = (old.k * factor).clamp(lower, upper);
        if (k - old.k).abs() < f32::EPSILON {
            return false;
        }
        let world = old.invert(anchor);
        self.set_transform(Transform {
            k,
            x: anchor.x - world.x * k,
            y: anchor.y - world.y * k,
        })
    }

    pub fn zoom_in(&mut self) -> bool {
        self.zoom_by(ZOOM_IN_FACTOR, None)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.zoom_by(ZOOM_OUT_FACTOR, None)
    }

    pub fn pan_by(&mut self, delta: Vec2) -> bool {
        if delta == Vec2::ZERO || !delta.is_finite() {
            return false;
        }
        let t = self.transform;
        self.set_transform(Transform {
            k: t.k,
            x: t.x + delta.x,
            y: t.y + delta.y,
        })
    }

    pub fn fit(&mut self, bounds: Rect, padding: f32) -> bool {
        match fit_transform(bounds, self.size, padding, self.fit_max_scale) {
            Some(t) => {
                self.fit_floor = Some(t.k);
                self.set_transform(t)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide_bounds() -> Rect {
        Rect::from_min_max(Vec2::new(-2000.0, -84.0), Vec2::new(2000.0, 500.0))
    }

    #[test]
    fn fit_centres_bounds() {
        let bounds = Rect::from_min_max(Vec2::new(-110.0, -84.0), Vec2::new(110.0, 84.0));
        let t = fit_transform(bounds, Vec2::new(1000.0, 800.0), 120.0, 1.0).unwrap();
        assert_eq!(t.k, 1.0);
        let centre = t.apply(bounds.center());
        assert!((centre.x - 500.0).abs() < 1e-3);
        assert!((centre.y - 400.0).abs() < 1e-3);
    }

    #[test]
    fn fit_may_go_below_min_zoom() {
        let t = fit_transform(wide_bounds(), Vec2::new(800.0, 600.0), 120.0, 1.0).unwrap();
        assert!(t.k < MIN_ZOOM);
        assert!((t.k - 800.0 / 4240.0).abs() < 1e-5);
    }

    #[test]
    fn fit_rejects_empty_bounds() {
        assert_eq!(fit_transform(Rect::NOTHING, Vec2::new(10.0, 10.0), 0.0, 1.0), None);
    }

    #[test]
    fn zoom_in_is_clamped_to_max() {
        let mut vp = Viewport::new(Vec2::new(800.0, 600.0));
        for _ in 0..20 {
            vp.zoom_in();
        }
        assert_eq!(vp.transform().k, MAX_ZOOM);
        assert!(!vp.zoom_in());
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut vp = Viewport::new(Vec2::new(800.0, 600.0));
        vp.set_transform(Transform::new(1.0, 37.0, -12.0));
        let anchor = Vec2::new(200.0, 150.0);
        let world_before = vp.transform().invert(anchor);
        assert!(vp.zoom_by(1.5, Some(anchor)));
        let world_after = vp.transform().invert(anchor);
        assert!((world_before.x - world_after.x).abs() < 1e-3);
        assert!((world_before.y - world_after.y).abs() < 1e-3);
    }

    #[test]
    fn zoom_out_after_small_fit_does_not_jump_up() {
        let mut vp = Viewport::new(Vec2::new(800.0, 600.0));
        vp.fit(wide_bounds(), FIT_PADDING_AUTO);
        let fitted = vp.transform().k;
        assert!(!vp.zoom_out());
        assert_eq!(vp.transform().k, fitted);
        assert!(vp.zoom_in());
        assert!(vp.transform().k > fitted);
    }

    #[test]
    fn zoom_out_returns_to_fitted_scale_after_zooming_in() {
        let mut vp = Viewport::new(Vec2::new(800.0, 600.0));
        vp.fit(wide_bounds(), FIT_PADDING_AUTO);
        let fitted = vp.transform().k;
        assert!(fitted < MIN_ZOOM);

        assert!(vp.zoom_in());
        assert!(vp.zoom_out());
        assert!(vp.transform().k < fitted * ZOOM_IN_FACTOR);
        while vp.zoom_out() {}
        assert!((vp.transform().k - fitted).abs() < 1e-6);
    }

    #[test]
    fn pan_translates() {
        let mut vp = Viewport::new(Vec2::new(800.0, 600.0));
        assert!(vp.pan_by(Vec2::new(10.0, -5.0)));
        assert_eq!(vp.transform(), Transform::new(1.0, 10.0, -5.0));
        assert!(!vp.pan_by(Vec2::ZERO));
    }
}

//! Property tests for zoom clamping and fit-to-screen.

use family_tree_core::viewport::{MAX_ZOOM, MIN_ZOOM};
use family_tree_core::{fit_transform, Rect, Vec2, Viewport};
use proptest::prelude::*;

fn arb_bounds() -> impl Strategy<Value = Rect> {
    (-5000.0f32..5000.0, -5000.0f32..5000.0, 1.0f32..20000.0, 1.0f32..8000.0)
        .prop_map(|(x, y, w, h)| Rect::from_min_max(Vec2::new(x, y), Vec2::new(x + w, y + h)))
}

fn arb_size() -> impl Strategy<Value = Vec2> {
    (200.0f32..3000.0, 200.0f32..2000.0).prop_map(|(w, h)| Vec2::new(w, h))
}

proptest! {
    #[test]
    fn zoom_stays_within_extent(
        size in arb_size(),
        factors in prop::collection::vec(0.05f32..20.0, 1..40),
    ) {
        let mut vp = Viewport::new(size);
        for f in factors {
            vp.zoom_by(f, None);
            let k = vp.transform().k;
            prop_assert!((MIN_ZOOM..=MAX_ZOOM).contains(&k), "k = {}", k);
        }
    }

    #[test]
    fn zoom_out_never_drops_below_fitted_scale(bounds in arb_bounds(), size in arb_size(), steps in 1usize..30) {
        let mut vp = Viewport::new(size);
        vp.fit(bounds, 120.0);
        let fitted = vp.transform().k;
        for _ in 0..steps {
            vp.zoom_out();
        }
        prop_assert!(vp.transform().k >= fitted.min(MIN_ZOOM) - 1e-6);
    }

    #[test]
    fn fit_is_idempotent(bounds in arb_bounds(), size in arb_size()) {
        let mut vp = Viewport::new(size);
        vp.fit(bounds, 110.0);
        let once = vp.transform();
        prop_assert!(!vp.fit(bounds, 110.0));
        prop_assert_eq!(vp.transform(), once);
    }

    #[test]
    fn fit_shows_everything_and_never_enlarges(bounds in arb_bounds(), size in arb_size()) {
        let t = fit_transform(bounds, size, 120.0, 1.0).unwrap();
        prop_assert!(t.k <= 1.0);
        let screen = t.apply_rect(bounds);
        let eps = 0.05 * size.x.max(size.y) / 100.0 + 0.5;
        prop_assert!(screen.min.x >= -eps && screen.max.x <= size.x + eps);
        prop_assert!(screen.min.y >= -eps && screen.max.y <= size.y + eps);
        // Centred on both axes.
        let c = t.apply(bounds.center());
        prop_assert!((c.x - size.x / 2.0).abs() < 1.0);
        prop_assert!((c.y - size.y / 2.0).abs() < 1.0);
    }
}

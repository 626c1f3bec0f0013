//! Tree canvas: paints a [`Scene`] with egui and turns pointer input into
//! [`ViewEvent`]s. The widget owns no view state; everything it draws comes
//! from the session.

use egui::epaint::CubicBezierShape;
use egui::{Align2, Color32, FontId, Painter, PointerButton, Pos2, Response, Rounding, Sense, Stroke};
use family_tree_core::scene::{CARD_FILL, CARD_RADIUS, FRAME_INSET, GOLD, LINK_STROKE, NAME_FILL};
use family_tree_core::{Rect, Scene, Transform, Vec2, ViewEvent};

use crate::api::ApiClient;

/// Wheel sensitivity: one notch (about 50 px) zooms by roughly 8%
const WHEEL_ZOOM_RATE: f32 = 0.0015;
const NAME_FONT_SIZE: f32 = 15.0;
const PHOTO_ROUNDING: f32 = 12.0;

/// What the canvas reports back each frame
#[derive(Debug, Default)]
pub struct CanvasOutput {
    /// Canvas size in points; the app turns changes into `Resize`
    pub size: egui::Vec2,
    pub events: Vec<ViewEvent>,
}

pub struct TreeCanvas<'a> {
    scene: &'a Scene,
    transform: Transform,
    api: &'a ApiClient,
}

impl<'a> TreeCanvas<'a> {
    pub fn new(scene: &'a Scene, transform: Transform, api: &'a ApiClient) -> Self {
        Self {
            scene,
            transform,
            api,
        }
    }

    pub fn show(self, ui: &mut egui::Ui) -> CanvasOutput {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let origin = response.rect.min;

        painter.rect_filled(response.rect, 0.0, ui.visuals().extreme_bg_color);
        self.paint(ui, &painter, origin);

        CanvasOutput {
            size: response.rect.size(),
            events: input_events(ui, &response, origin),
        }
    }

    fn to_screen(&self, origin: Pos2, world: Vec2) -> Pos2 {
        let s = self.transform.apply(world);
        Pos2::new(origin.x + s.x, origin.y + s.y)
    }

    fn to_screen_rect(&self, origin: Pos2, world: Rect) -> egui::Rect {
        egui::Rect::from_min_max(self.to_screen(origin, world.min), self.to_screen(origin, world.max))
    }

    fn paint(&self, ui: &egui::Ui, painter: &Painter, origin: Pos2) {
        let k = self.transform.k;
        let clip = painter.clip_rect();

        for link in &self.scene.links {
            let points = link.bezier().map(|p| self.to_screen(origin, p));
            let stroke = Stroke::new(2.0 * k, fade(hex(LINK_STROKE), link.opacity));
            painter.add(CubicBezierShape::from_points_stroke(
                points,
                false,
                Color32::TRANSPARENT,
                stroke,
            ));
        }

        for card in &self.scene.cards {
            let rect = self.to_screen_rect(origin, card.rect());
            if !clip.intersects(rect) {
                continue;
            }
            let gold = fade(hex(GOLD), card.opacity);
            let border = if card.selected { 4.0 * k } else { 2.0 * k };
            painter.rect(
                rect,
                Rounding::same(CARD_RADIUS * k),
                fade(hex(CARD_FILL), card.opacity),
                Stroke::new(border, gold),
            );
            painter.rect_stroke(
                rect.shrink(FRAME_INSET * k),
                Rounding::same((CARD_RADIUS - FRAME_INSET / 2.0) * k),
                Stroke::new(1.0 * k, gold),
            );

            let photo = self.to_screen_rect(origin, card.photo_rect());
            egui::Image::new(self.api.resolve(&card.photo_url))
                .rounding(PHOTO_ROUNDING * k)
                .tint(fade(Color32::WHITE, card.opacity))
                .paint_at(ui, photo);

            painter.text(
                self.to_screen(origin, card.name_anchor()),
                Align2::CENTER_CENTER,
                &card.name,
                FontId::proportional(NAME_FONT_SIZE * k),
                fade(hex(NAME_FILL), card.opacity),
            );
        }
    }
}

fn input_events(ui: &egui::Ui, response: &Response, origin: Pos2) -> Vec<ViewEvent> {
    let mut events = Vec::new();
    let local = |p: Pos2| Vec2::new(p.x - origin.x, p.y - origin.y);

    if response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            events.push(ViewEvent::ClickAt { screen: local(pos) });
        }
    }

    if response.dragged_by(PointerButton::Primary) {
        let delta = response.drag_delta();
        if delta != egui::Vec2::ZERO {
            events.push(ViewEvent::Pan {
                dx: delta.x,
                dy: delta.y,
            });
        }
    }

    if response.hovered() {
        let (scroll, pinch, hover) =
            ui.input(|i| (i.smooth_scroll_delta.y, i.zoom_delta(), i.pointer.hover_pos()));
        let factor = pinch * wheel_zoom_factor(scroll);
        if (factor - 1.0).abs() > 1e-4 {
            events.push(ViewEvent::Zoom {
                factor,
                anchor: hover.map(local),
            });
        }
    }

    if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
        events.push(ViewEvent::ShowFullTree);
    }

    events
}

/// Multiplicative zoom for a vertical scroll delta in points
pub fn wheel_zoom_factor(scroll_y: f32) -> f32 {
    (scroll_y * WHEEL_ZOOM_RATE).exp()
}

fn hex(color: &str) -> Color32 {
    Color32::from_hex(color).unwrap_or(Color32::GRAY)
}

fn fade(color: Color32, opacity: f32) -> Color32 {
    color.gamma_multiply(opacity.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_zoom_is_symmetric() {
        assert_eq!(wheel_zoom_factor(0.0), 1.0);
        let up = wheel_zoom_factor(50.0);
        let down = wheel_zoom_factor(-50.0);
        assert!(up > 1.0 && down < 1.0);
        assert!((up * down - 1.0).abs() < 1e-6);
    }

    #[test]
    fn scene_colours_parse() {
        for c in [CARD_FILL, GOLD, LINK_STROKE, NAME_FILL] {
            assert_ne!(hex(c), Color32::GRAY, "{c}");
        }
    }

    #[test]
    fn fade_scales_alpha() {
        assert_eq!(fade(Color32::WHITE, 1.0), Color32::WHITE);
        assert!(fade(Color32::WHITE, 0.07).a() < 30);
    }
}

//! Render-ready primitives and SVG output.
//!
//! `Scene::build` turns tree + layout + presentation into flat card and link
//! primitives in world space. The egui viewer paints them directly; the
//! server serialises them to SVG with `render_svg`.

use std::fmt::{self, Write};

use family_tree_types::PersonId;
use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Vec2};
use crate::layout::{LayoutConfig, TreeLayout};
use crate::navigation::NavigationState;
use crate::tree::{FamilyTree, NodeIdx};
use crate::viewport::Transform;

pub const PHOTO_SIZE: f32 = 78.0;
/// Gap between card top and photo top
pub const PHOTO_TOP_MARGIN: f32 = 16.0;
/// Name baseline, relative to card centre
pub const NAME_BASELINE: f32 = 62.0;
pub const FRAME_INSET: f32 = 9.0;
pub const CARD_RADIUS: f32 = 18.0;

pub const GOLD: &str = "#c7a24b";
pub const CARD_FILL: &str = "#fffaf0";
pub const LINK_STROKE: &str = "#8b7b5a";
pub const NAME_FILL: &str = "#3b2f1e";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPrimitive {
    pub node: NodeIdx,
    pub person_id: PersonId,
    pub name: String,
    /// Resolved photo, placeholder when missing
    pub photo_url: String,
    pub center: Vec2,
    pub size: Vec2,
    pub opacity: f32,
    pub interactive: bool,
    pub selected: bool,
}

impl CardPrimitive {
    pub fn rect(&self) -> Rect {
        Rect::from_center_size(self.center, self.size)
    }

    pub fn inner_rect(&self) -> Rect {
        self.rect().expand(-FRAME_INSET)
    }

    pub fn photo_rect(&self) -> Rect {
        let top = self.center.y - self.size.y / 2.0 + PHOTO_TOP_MARGIN;
        Rect::from_min_max(
            Vec2::new(self.center.x - PHOTO_SIZE / 2.0, top),
            Vec2::new(self.center.x + PHOTO_SIZE / 2.0, top + PHOTO_SIZE),
        )
    }

    pub fn name_anchor(&self) -> Vec2 {
        Vec2::new(self.center.x, self.center.y + NAME_BASELINE)
    }
}

/// Parent-to-child connector drawn as a vertical cubic Bézier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPrimitive {
    pub source: NodeIdx,
    pub target: NodeIdx,
    pub from: Vec2,
    pub to: Vec2,
    pub opacity: f32,
}

impl LinkPrimitive {
    /// Start, two control points, end.
    pub fn bezier(&self) -> [Vec2; 4] {
        let mid_y = (self.from.y + self.to.y) / 2.0;
        [
            self.from,
            Vec2::new(self.from.x, mid_y),
            Vec2::new(self.to.x, mid_y),
            self.to,
        ]
    }

    pub fn svg_path(&self) -> String {
        let [a, b, c, d] = self.bezier();
        format!(
            "M{:.1},{:.1}C{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}",
            a.x, a.y, b.x, b.y, c.x, c.y, d.x, d.y
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Links first: they are painted under the cards
    pub links: Vec<LinkPrimitive>,
    pub cards: Vec<CardPrimitive>,
    pub bounds: Rect,
}

impl Scene {
    pub fn build(
        tree: &FamilyTree,
        layout: &TreeLayout,
        config: &LayoutConfig,
        nav: &NavigationState,
    ) -> Self {
        let presentation = nav.presentation();
        let selected = nav.focused();
        let size = config.card_size();

        let links = tree
            .edges()
            .map(|(parent, child)| LinkPrimitive {
                source: parent,
                target: child,
                from: layout.position(parent),
                to: layout.position(child),
                opacity: presentation.edge(child),
            })
            .collect();

        let cards = tree
            .iter()
            .map(|(idx, node)| {
                let style = presentation.node(idx);
                CardPrimitive {
                    node: idx,
                    person_id: node.person.id,
                    name: node.person.name.clone(),
                    photo_url: node.person.photo().to_string(),
                    center: layout.position(idx),
                    size,
                    opacity: style.opacity,
                    interactive: style.interactive,
                    selected: selected == Some(idx),
                }
            })
            .collect();

        Self {
            links,
            cards,
            bounds: layout.bounds,
        }
    }

    pub fn card(&self, idx: NodeIdx) -> Option<&CardPrimitive> {
        self.cards.get(idx.index()).filter(|c| c.node == idx)
    }
}

/// Escape text for SVG element content and attribute values.
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Standalone SVG document of the scene under `transform`.
pub fn render_svg(scene: &Scene, transform: Transform, width: f32, height: f32) -> Result<String, fmt::Error> {
    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}" direction="rtl">"#,
        w = width.round(),
        h = height.round()
    )?;
    writeln!(svg, "<defs>")?;
    for card in &scene.cards {
        let p = card.photo_rect();
        writeln!(
            svg,
            r#"<clipPath id="clip-{id}"><rect x="{x:.1}" y="{y:.1}" width="{s}" height="{s}" rx="12"/></clipPath>"#,
            id = card.node.0,
            x = p.min.x,
            y = p.min.y,
            s = PHOTO_SIZE
        )?;
    }
    writeln!(svg, "</defs>")?;
    writeln!(svg, r#"<g transform="{}">"#, transform.to_svg())?;

    writeln!(svg, r#"<g class="links" fill="none" stroke="{LINK_STROKE}" stroke-width="2">"#)?;
    for link in &scene.links {
        writeln!(
            svg,
            r#"<path d="{}" opacity="{:.2}"/>"#,
            link.svg_path(),
            link.opacity
        )?;
    }
    writeln!(svg, "</g>")?;

    writeln!(svg, r#"<g class="nodes">"#)?;
    for card in &scene.cards {
        write_card(&mut svg, card)?;
    }
    writeln!(svg, "</g>")?;
    writeln!(svg, "</g>")?;
    svg.push_str("</svg>\n");
    Ok(svg)
}

fn write_card(svg: &mut String, card: &CardPrimitive) -> fmt::Result {
    let outer = card.rect();
    let inner = card.inner_rect();
    let photo = card.photo_rect();
    let class = if card.selected { "node selected" } else { "node" };

    writeln!(
        svg,
        r#"<g class="{class}" data-id="{id}" opacity="{op:.2}">"#,
        id = card.person_id,
        op = card.opacity
    )?;
    writeln!(
        svg,
        r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" rx="{CARD_RADIUS}" fill="{CARD_FILL}" stroke="{GOLD}" stroke-width="{}"/>"#,
        outer.min.x,
        outer.min.y,
        outer.width(),
        outer.height(),
        if card.selected { 4.0 } else { 2.6 }
    )?;
    writeln!(
        svg,
        r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" rx="{}" fill="none" stroke="{GOLD}" stroke-width="1.2" stroke-dasharray="4 3"/>"#,
        inner.min.x,
        inner.min.y,
        inner.width(),
        inner.height(),
        CARD_RADIUS - FRAME_INSET / 2.0
    )?;
    writeln!(
        svg,
        r#"<image href="{href}" x="{x:.1}" y="{y:.1}" width="{s}" height="{s}" preserveAspectRatio="xMidYMid slice" clip-path="url(#clip-{clip})"/>"#,
        href = escape_xml(&card.photo_url),
        x = photo.min.x,
        y = photo.min.y,
        s = PHOTO_SIZE,
        clip = card.node.0
    )?;
    writeln!(
        svg,
        r#"<rect x="{:.1}" y="{:.1}" width="{s}" height="{s}" rx="12" fill="none" stroke="{GOLD}" stroke-width="2"/>"#,
        photo.min.x,
        photo.min.y,
        s = PHOTO_SIZE
    )?;
    let anchor = card.name_anchor();
    writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="18" font-weight="700" fill="{NAME_FILL}">{}</text>"#,
        anchor.x,
        anchor.y,
        escape_xml(&card.name)
    )?;
    writeln!(svg, "</g>")
}

//! Per-viewer session: the single owner of navigation, viewport and detail state.
//!
//! The UI feeds `ViewEvent`s into [`ViewSession::handle`] and reacts to the
//! returned [`EffectSet`]. Time is passed in explicitly (`now_ms`), which keeps
//! the reducer deterministic and replayable.

use family_tree_types::{PersonDetail, PersonId};
use serde::{Deserialize, Serialize};

use crate::debounce::Debouncer;
use crate::effect::EffectSet;
use crate::error::{FetchError, NavFault};
use crate::geometry::Vec2;
use crate::layout::{LayoutConfig, LayoutEngine, TreeLayout};
use crate::navigation::{NavMode, NavigationState};
use crate::scene::Scene;
use crate::spatial::HitIndex;
use crate::tree::{FamilyTree, NodeIdx};
use crate::viewport::{Transform, Viewport, FIT_PADDING_AUTO, FIT_PADDING_MANUAL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewEvent {
    SelectNode(NodeIdx),
    /// Select by person id, e.g. from the children list in the detail panel
    SelectPerson(PersonId),
    /// Click at a screen point; hit-tested against interactive cards
    ClickAt { screen: Vec2 },
    ClickCanvas,
    QueryChanged(String),
    ShowFullTree,
    FitToScreen,
    Resize { width: f32, height: f32 },
    /// Wheel/pinch zoom; `anchor` is the pointer in screen space
    Zoom { factor: f32, anchor: Option<Vec2> },
    ZoomIn,
    ZoomOut,
    Pan { dx: f32, dy: f32 },
    /// Clock tick; fires the debounced refit when due
    Tick,
    DetailLoaded(PersonDetail),
    DetailFailed { id: PersonId, error: FetchError },
    CloseDetail,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailPanel {
    #[default]
    Closed,
    Loading(PersonId),
    Loaded(Box<PersonDetail>),
    NotFound(PersonId),
    Failed { id: PersonId, message: String },
}

impl DetailPanel {
    pub fn is_open(&self) -> bool {
        !matches!(self, DetailPanel::Closed)
    }

    /// Person whose detail is pending, if any.
    pub fn loading(&self) -> Option<PersonId> {
        match self {
            DetailPanel::Loading(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewSession {
    tree: FamilyTree,
    config: LayoutConfig,
    layout: TreeLayout,
    hits: HitIndex,
    nav: NavigationState,
    viewport: Viewport,
    resize: Debouncer,
    detail: DetailPanel,
}

impl ViewSession {
    /// Lay out `tree` and fit it into a `viewport_size` viewport.
    pub fn new(tree: FamilyTree, config: LayoutConfig, viewport_size: Vec2) -> Self {
        let layout = LayoutEngine::new(config).layout(&tree);
        let hits = HitIndex::build(&layout, config.card_size());
        let nav = NavigationState::new(&tree);
        let mut viewport = Viewport::new(viewport_size);
        viewport.fit(layout.bounds, FIT_PADDING_AUTO);
        Self {
            tree,
            config,
            layout,
            hits,
            nav,
            viewport,
            resize: Debouncer::default(),
            detail: DetailPanel::Closed,
        }
    }

    pub fn tree(&self) -> &FamilyTree {
        &self.tree
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    pub fn mode(&self) -> &NavMode {
        self.nav.mode()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn transform(&self) -> Transform {
        self.viewport.transform()
    }

    pub fn detail(&self) -> &DetailPanel {
        &self.detail
    }

    /// Whether a debounced refit is waiting for a `Tick`.
    pub fn fit_pending(&self) -> bool {
        self.resize.is_pending()
    }

    pub fn scene(&self) -> Scene {
        Scene::build(&self.tree, &self.layout, &self.config, &self.nav)
    }

    /// Interactive node under a screen point.
    pub fn hit_test(&self, screen: Vec2) -> Option<NodeIdx> {
        let world = self.viewport.transform().invert(screen);
        self.hits.hit(world, self.nav.presentation())
    }

    pub fn handle(&mut self, event: ViewEvent, now_ms: u64) -> Result<EffectSet, NavFault> {
        match event {
            ViewEvent::SelectNode(idx) => self.select(idx),
            ViewEvent::SelectPerson(id) => {
                let idx = self.tree.find(id).ok_or(NavFault::UnknownPerson(id))?;
                self.select(idx)
            }
            ViewEvent::ClickAt { screen } => match self.hit_test(screen) {
                Some(idx) => self.select(idx),
                None => Ok(self.reset_focus()),
            },
            ViewEvent::ClickCanvas => Ok(self.reset_focus()),
            ViewEvent::QueryChanged(raw) => Ok(self.presentation_effect(|nav, tree| nav.set_query(tree, &raw))),
            ViewEvent::ShowFullTree => {
                let mut effects = self.reset_focus();
                if self.viewport.fit(self.layout.bounds, FIT_PADDING_MANUAL) {
                    effects |= EffectSet::TRANSFORM_CHANGED;
                }
                Ok(effects)
            }
            ViewEvent::FitToScreen => Ok(self.fit(FIT_PADDING_MANUAL)),
            ViewEvent::Resize { width, height } => {
                self.viewport.set_size(Vec2::new(width, height));
                self.resize.trigger(now_ms);
                Ok(EffectSet::FIT_SCHEDULED)
            }
            ViewEvent::Tick => {
                if self.resize.poll(now_ms) {
                    tracing::trace!(now_ms, "debounced refit");
                    Ok(self.fit(FIT_PADDING_AUTO))
                } else if self.resize.is_pending() {
                    Ok(EffectSet::FIT_SCHEDULED)
                } else {
                    Ok(EffectSet::NONE)
                }
            }
            ViewEvent::Zoom { factor, anchor } => Ok(transform_effect(self.viewport.zoom_by(factor, anchor))),
            ViewEvent::ZoomIn => Ok(transform_effect(self.viewport.zoom_in())),
            ViewEvent::ZoomOut => Ok(transform_effect(self.viewport.zoom_out())),
            ViewEvent::Pan { dx, dy } => Ok(transform_effect(self.viewport.pan_by(Vec2::new(dx, dy)))),
            ViewEvent::DetailLoaded(detail) => {
                if self.detail.loading() != Some(detail.person.id) {
                    tracing::debug!(id = detail.person.id, "ignoring stale person detail");
                    return Ok(EffectSet::NONE);
                }
                self.detail = DetailPanel::Loaded(Box::new(detail));
                Ok(EffectSet::DETAIL_CHANGED)
            }
            ViewEvent::DetailFailed { id, error } => {
                if self.detail.loading() != Some(id) {
                    return Ok(EffectSet::NONE);
                }
                self.detail = match error {
                    FetchError::NotFound(_) => DetailPanel::NotFound(id),
                    FetchError::Transient(message) => DetailPanel::Failed { id, message },
                };
                Ok(EffectSet::DETAIL_CHANGED)
            }
            ViewEvent::CloseDetail => {
                if self.detail.is_open() {
                    self.detail = DetailPanel::Closed;
                    Ok(EffectSet::DETAIL_CHANGED)
                } else {
                    Ok(EffectSet::NONE)
                }
            }
        }
    }

    fn select(&mut self, idx: NodeIdx) -> Result<EffectSet, NavFault> {
        let was_focused = self.nav.focused();
        self.nav.select(&self.tree, idx)?;
        let id = self.tree[idx].person.id;
        self.detail = DetailPanel::Loading(id);
        tracing::debug!(person_id = id, "node selected");

        let mut effects = EffectSet::FETCH_DETAIL | EffectSet::DETAIL_CHANGED;
        if was_focused != Some(idx) {
            effects |= EffectSet::PRESENTATION_CHANGED;
        }
        Ok(effects)
    }

    fn reset_focus(&mut self) -> EffectSet {
        self.presentation_effect(|nav, tree| nav.reset(tree))
    }

    fn presentation_effect(&mut self, f: impl FnOnce(&mut NavigationState, &FamilyTree) -> bool) -> EffectSet {
        if f(&mut self.nav, &self.tree) {
            EffectSet::PRESENTATION_CHANGED
        } else {
            EffectSet::NONE
        }
    }

    fn fit(&mut self, padding: f32) -> EffectSet {
        transform_effect(self.viewport.fit(self.layout.bounds, padding))
    }
}

fn transform_effect(changed: bool) -> EffectSet {
    if changed {
        EffectSet::TRANSFORM_CHANGED
    } else {
        EffectSet::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_tree;
    use family_tree_types::{ChildSummary, PersonRecord};
    use pretty_assertions::assert_eq;

    fn session() -> ViewSession {
        let tree = build_tree(vec![
            PersonRecord::new(1, "حسن", None),
            PersonRecord::new(2, "يوسف", Some(1)),
            PersonRecord::new(3, "حجاج", Some(2)),
            PersonRecord::new(4, "حازم", Some(3)),
            PersonRecord::new(5, "حسام", Some(3)),
            PersonRecord::new(6, "صقر", Some(4)),
        ])
        .unwrap()
        .unwrap();
        ViewSession::new(tree, LayoutConfig::default(), Vec2::new(1200.0, 800.0))
    }

    fn detail(id: PersonId) -> PersonDetail {
        PersonDetail {
            person: PersonRecord::new(id, "x", None),
            children: vec![ChildSummary { id: 99, name: "y".into() }],
            spouses: vec![],
        }
    }

    #[test]
    fn select_focuses_and_requests_detail() {
        let mut s = session();
        let idx = s.tree().find(3).unwrap();
        let fx = s.handle(ViewEvent::SelectNode(idx), 0).unwrap();
        assert!(fx.contains(EffectSet::FETCH_DETAIL | EffectSet::PRESENTATION_CHANGED));
        assert_eq!(s.mode(), &NavMode::Focused(idx));
        assert_eq!(s.detail(), &DetailPanel::Loading(3));
    }

    #[test]
    fn stale_detail_is_ignored() {
        let mut s = session();
        s.handle(ViewEvent::SelectPerson(3), 0).unwrap();
        s.handle(ViewEvent::SelectPerson(4), 0).unwrap();
        assert_eq!(s.handle(ViewEvent::DetailLoaded(detail(3)), 0).unwrap(), EffectSet::NONE);
        assert_eq!(s.detail(), &DetailPanel::Loading(4));

        let fx = s.handle(ViewEvent::DetailLoaded(detail(4)), 0).unwrap();
        assert_eq!(fx, EffectSet::DETAIL_CHANGED);
        assert!(matches!(s.detail(), DetailPanel::Loaded(d) if d.person.id == 4));
    }

    #[test]
    fn detail_failure_maps_to_panel_state() {
        let mut s = session();
        s.handle(ViewEvent::SelectPerson(5), 0).unwrap();
        s.handle(
            ViewEvent::DetailFailed {
                id: 5,
                error: FetchError::NotFound(5),
            },
            0,
        )
        .unwrap();
        assert_eq!(s.detail(), &DetailPanel::NotFound(5));

        s.handle(ViewEvent::SelectPerson(4), 0).unwrap();
        s.handle(
            ViewEvent::DetailFailed {
                id: 4,
                error: FetchError::Transient("timeout".into()),
            },
            0,
        )
        .unwrap();
        assert_eq!(
            s.detail(),
            &DetailPanel::Failed {
                id: 4,
                message: "timeout".into()
            }
        );
    }

    #[test]
    fn dimmed_select_is_refused_without_state_change() {
        let mut s = session();
        s.handle(ViewEvent::SelectPerson(5), 0).unwrap();
        let before = s.navigation().clone();
        let err = s.handle(ViewEvent::SelectPerson(6), 0).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(s.navigation(), &before);
        assert_eq!(s.detail(), &DetailPanel::Loading(5));
    }

    #[test]
    fn unknown_person_is_a_fault() {
        let mut s = session();
        assert_eq!(
            s.handle(ViewEvent::SelectPerson(404), 0),
            Err(NavFault::UnknownPerson(404))
        );
    }

    #[test]
    fn click_on_card_selects_and_background_resets() {
        let mut s = session();
        let idx = s.tree().find(2).unwrap();
        let screen = s.transform().apply(s.layout().position(idx));
        s.handle(ViewEvent::ClickAt { screen }, 0).unwrap();
        assert_eq!(s.mode(), &NavMode::Focused(idx));

        let fx = s.handle(ViewEvent::ClickAt { screen: Vec2::new(1.0, 1.0) }, 0).unwrap();
        assert_eq!(fx, EffectSet::PRESENTATION_CHANGED);
        assert_eq!(s.mode(), &NavMode::Full);
        assert_eq!(s.handle(ViewEvent::ClickCanvas, 0).unwrap(), EffectSet::NONE);
    }

    #[test]
    fn query_filters_then_empty_query_resets() {
        let mut s = session();
        s.handle(ViewEvent::QueryChanged("حس".into()), 0).unwrap();
        assert_eq!(s.mode(), &NavMode::Filtered("حس".into()));
        s.handle(ViewEvent::QueryChanged("".into()), 0).unwrap();
        assert_eq!(s.mode(), &NavMode::Full);
    }

    #[test]
    fn resize_refits_after_quiet_period() {
        let mut s = session();
        let before = s.transform();
        assert_eq!(
            s.handle(ViewEvent::Resize { width: 600.0, height: 400.0 }, 1_000).unwrap(),
            EffectSet::FIT_SCHEDULED
        );
        s.handle(ViewEvent::Resize { width: 500.0, height: 400.0 }, 1_050).unwrap();
        assert_eq!(s.handle(ViewEvent::Tick, 1_100).unwrap(), EffectSet::FIT_SCHEDULED);
        assert_eq!(s.transform(), before);

        assert_eq!(s.handle(ViewEvent::Tick, 1_170).unwrap(), EffectSet::TRANSFORM_CHANGED);
        assert!(s.transform().k < before.k);
        assert!(!s.fit_pending());
    }

    #[test]
    fn show_full_tree_resets_and_fits() {
        let mut s = session();
        s.handle(ViewEvent::SelectPerson(3), 0).unwrap();
        s.handle(ViewEvent::Pan { dx: 300.0, dy: 0.0 }, 0).unwrap();
        let fx = s.handle(ViewEvent::ShowFullTree, 0).unwrap();
        assert!(fx.contains(EffectSet::PRESENTATION_CHANGED | EffectSet::TRANSFORM_CHANGED));
        assert_eq!(s.mode(), &NavMode::Full);
    }

    #[test]
    fn fit_is_idempotent() {
        let mut s = session();
        s.handle(ViewEvent::ZoomIn, 0).unwrap();
        assert_eq!(s.handle(ViewEvent::FitToScreen, 0).unwrap(), EffectSet::TRANSFORM_CHANGED);
        assert_eq!(s.handle(ViewEvent::FitToScreen, 0).unwrap(), EffectSet::NONE);
    }

    #[test]
    fn close_detail() {
        let mut s = session();
        assert_eq!(s.handle(ViewEvent::CloseDetail, 0).unwrap(), EffectSet::NONE);
        s.handle(ViewEvent::SelectPerson(1), 0).unwrap();
        assert_eq!(s.handle(ViewEvent::CloseDetail, 0).unwrap(), EffectSet::DETAIL_CHANGED);
        assert!(!s.detail().is_open());
    }
}

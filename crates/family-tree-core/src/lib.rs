//! Family tree core - from flat person records to an interactive view.
//!
//! Pipeline:
//!
//! ```text
//! Vec<PersonRecord> ──build_tree──► FamilyTree ──LayoutEngine──► TreeLayout
//!                                        │                          │
//!                                        ▼                          ▼
//!                              NavigationState ──────────────► Scene ──► SVG / egui
//!                                        ▲
//!                          ViewSession::handle(ViewEvent) ──► EffectSet
//! ```
//!
//! Everything here is synchronous, allocation-light and free of I/O; the
//! server and the viewer own the network and the clock.

pub mod builder;
pub mod debounce;
pub mod effect;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod navigation;
pub mod replay;
pub mod scene;
pub mod session;
pub mod spatial;
pub mod tree;
pub mod viewport;

pub use builder::{build_tree, build_tree_with_report, BuildReport};
pub use debounce::Debouncer;
pub use effect::EffectSet;
pub use error::{FetchError, NavFault, TreeError};
pub use geometry::{Rect, Vec2};
pub use layout::{LayoutConfig, LayoutEngine, TreeLayout};
pub use navigation::{NavMode, NavigationState, NodeStyle, Presentation};
pub use replay::{SessionLog, TimestampedEvent};
pub use scene::{render_svg, CardPrimitive, LinkPrimitive, Scene};
pub use session::{DetailPanel, ViewEvent, ViewSession};
pub use spatial::HitIndex;
pub use tree::{FamilyTree, NodeIdx, TreeNode};
pub use viewport::{fit_transform, Transform, Viewport, ZoomExtent};

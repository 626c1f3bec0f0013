//! Effect flags - what a session event changed.
//!
//! The session reducer returns an `EffectSet`; the caller (UI, tests) reacts
//! to each flag: repaint, start a detail fetch, schedule a tick.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EffectSet: u8 {
        const NONE = 0;

        /// Node/edge opacities changed.
        const PRESENTATION_CHANGED = 1 << 0;

        /// Pan/zoom transform changed.
        const TRANSFORM_CHANGED = 1 << 1;

        /// Caller should fetch the detail of the selected person.
        const FETCH_DETAIL = 1 << 2;

        /// Detail drawer contents changed.
        const DETAIL_CHANGED = 1 << 3;

        /// A debounced refit is pending; caller should deliver `Tick` events.
        const FIT_SCHEDULED = 1 << 4;
    }
}

impl Default for EffectSet {
    fn default() -> Self {
        EffectSet::NONE
    }
}

impl EffectSet {
    /// Anything visible on the canvas changed.
    pub fn needs_repaint(&self) -> bool {
        self.intersects(EffectSet::PRESENTATION_CHANGED | EffectSet::TRANSFORM_CHANGED)
    }

    pub fn wants_fetch(&self) -> bool {
        self.contains(EffectSet::FETCH_DETAIL)
    }
}

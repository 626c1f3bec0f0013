//! Session replay for deterministic state reconstruction.
//!
//! `SessionLog` records every event handed to a `ViewSession` together with
//! its timestamp. Given the same tree, layout config and initial viewport
//! size, replay reproduces the same final session state.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;
use crate::layout::LayoutConfig;
use crate::session::{ViewEvent, ViewSession};
use crate::tree::FamilyTree;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedEvent {
    pub at_ms: u64,
    pub event: ViewEvent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    /// Viewport size the session was created with
    pub initial_size: Vec2,
    pub events: Vec<TimestampedEvent>,
}

impl SessionLog {
    pub fn new(initial_size: Vec2) -> Self {
        Self {
            initial_size,
            events: Vec::new(),
        }
    }

    pub fn record(&mut self, at_ms: u64, event: ViewEvent) {
        // Timestamps never go backwards, or `replay_to` would stop early.
        let at_ms = self.events.last().map_or(at_ms, |last| last.at_ms.max(at_ms));
        // Ticks only matter while a refit is pending; the replay reissues them.
        if matches!(event, ViewEvent::Tick) && self.events.last().is_some_and(|e| e.event == ViewEvent::Tick) {
            if let Some(last) = self.events.last_mut() {
                last.at_ms = at_ms;
            }
            return;
        }
        self.events.push(TimestampedEvent { at_ms, event });
    }

    /// Replay all events onto a fresh session. Recoverable faults are skipped.
    pub fn replay(&self, tree: FamilyTree, config: LayoutConfig) -> ViewSession {
        self.replay_to(tree, config, u64::MAX)
    }

    /// Replay events up to and including `until_ms`.
    pub fn replay_to(&self, tree: FamilyTree, config: LayoutConfig, until_ms: u64) -> ViewSession {
        let mut session = ViewSession::new(tree, config, self.initial_size);
        for e in self.events.iter().take_while(|e| e.at_ms <= until_ms) {
            if let Err(fault) = session.handle(e.event.clone(), e.at_ms) {
                tracing::trace!(%fault, "fault during replay");
            }
        }
        session
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_tree;
    use family_tree_types::PersonRecord;

    fn tree() -> FamilyTree {
        build_tree(vec![
            PersonRecord::new(1, "a", None),
            PersonRecord::new(2, "b", Some(1)),
            PersonRecord::new(3, "c", Some(1)),
        ])
        .unwrap()
        .unwrap()
    }

    #[test]
    fn replay_reproduces_final_state() {
        let size = Vec2::new(900.0, 700.0);
        let mut live = ViewSession::new(tree(), LayoutConfig::default(), size);
        let mut log = SessionLog::new(size);

        let events = vec![
            (10, ViewEvent::ZoomIn),
            (20, ViewEvent::SelectPerson(2)),
            (30, ViewEvent::Pan { dx: 15.0, dy: -4.0 }),
            (40, ViewEvent::Resize { width: 500.0, height: 500.0 }),
            (200, ViewEvent::Tick),
            (210, ViewEvent::QueryChanged("c".into())),
        ];
        for (at, ev) in events {
            let _ = live.handle(ev.clone(), at);
            log.record(at, ev);
        }

        let replayed = log.replay(tree(), LayoutConfig::default());
        assert_eq!(replayed.transform(), live.transform());
        assert_eq!(replayed.mode(), live.mode());
        assert_eq!(replayed.detail(), live.detail());

        let partial = log.replay_to(tree(), LayoutConfig::default(), 20);
        assert!(partial.navigation().focused().is_some());
    }

    #[test]
    fn consecutive_ticks_collapse() {
        let mut log = SessionLog::new(Vec2::new(1.0, 1.0));
        log.record(1, ViewEvent::Tick);
        log.record(2, ViewEvent::Tick);
        log.record(3, ViewEvent::Tick);
        assert_eq!(log.len(), 1);
        assert_eq!(log.events[0].at_ms, 3);
    }

    #[test]
    fn late_timestamps_do_not_cut_partial_replay_short() {
        let mut log = SessionLog::new(Vec2::new(900.0, 700.0));
        log.record(500, ViewEvent::ZoomIn);
        log.record(0, ViewEvent::QueryChanged("c".into()));
        log.record(600, ViewEvent::SelectPerson(2));
        assert_eq!(log.events[1].at_ms, 500);

        let partial = log.replay_to(tree(), LayoutConfig::default(), 550);
        assert_eq!(partial.mode(), &crate::navigation::NavMode::Filtered("c".into()));
    }

    #[test]
    fn log_serializes() {
        let mut log = SessionLog::new(Vec2::new(800.0, 600.0));
        log.record(5, ViewEvent::ZoomOut);
        let json = serde_json::to_string(&log).unwrap();
        let back: SessionLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log);
    }
}

//! Bell state machine: badge, detail panel and mark-all-seen on open.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use super::models::AggregateNotificationState;
use super::watermark::WatermarkStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Closed,
    Open,
}

pub struct NotificationBell {
    watermarks: Arc<WatermarkStore>,
    state: PanelState,
    latest: Option<AggregateNotificationState>,
    active: bool,
}

impl NotificationBell {
    pub fn new(watermarks: Arc<WatermarkStore>) -> Self {
        Self {
            watermarks,
            state: PanelState::Closed,
            latest: None,
            active: true,
        }
    }

    pub fn panel_state(&self) -> PanelState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Opens the panel. Advances every watermark to `now` on the
    /// Closed to Open transition only; returns whether that happened.
    pub fn open(&mut self, now: DateTime<Utc>) -> bool {
        if !self.active || self.state == PanelState::Open {
            return false;
        }
        self.state = PanelState::Open;
        self.watermarks.advance_all(now);
        info!("Notification panel opened, all categories marked seen");
        true
    }

    pub fn close(&mut self) {
        if self.state == PanelState::Open {
            debug!("Notification panel closed");
        }
        self.state = PanelState::Closed;
    }

    /// Stores a poll result. Returns false once the bell was torn down.
    pub fn apply_poll(&mut self, state: AggregateNotificationState) -> bool {
        if !self.active {
            debug!("Discarding poll result for a torn down bell");
            return false;
        }
        self.latest = Some(state);
        true
    }

    /// Stops accepting poll results. Watermarks are left as they are.
    pub fn teardown(&mut self) {
        self.active = false;
        self.state = PanelState::Closed;
    }

    pub fn latest(&self) -> Option<&AggregateNotificationState> {
        self.latest.as_ref()
    }

    /// Number to decorate the bell with, if any.
    pub fn badge(&self) -> Option<usize> {
        self.latest
            .as_ref()
            .map(|s| s.total)
            .filter(|total| *total > 0)
    }

    /// The breakdown shown while the panel is open.
    pub fn panel(&self) -> Option<&AggregateNotificationState> {
        match self.state {
            PanelState::Open => self.latest.as_ref(),
            PanelState::Closed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_store::{LocalStateStore, MemoryLocalStore};
    use crate::notifications::models::{CategoryId, DeltaCount};
    use crate::notifications::watermark::WATERMARKS_KEY;
    use chrono::TimeZone;

    fn bell() -> (Arc<MemoryLocalStore>, NotificationBell) {
        let backend = Arc::new(MemoryLocalStore::new());
        let watermarks = Arc::new(WatermarkStore::new(backend.clone()));
        (backend, NotificationBell::new(watermarks))
    }

    fn state(total: usize) -> AggregateNotificationState {
        AggregateNotificationState {
            counts: vec![DeltaCount {
                category: CategoryId::PartialGrades,
                count: total,
            }],
            total,
            entries: vec![],
        }
    }

    #[test]
    fn test_badge_hidden_for_zero() {
        let (_, mut bell) = bell();
        assert_eq!(bell.badge(), None);
        bell.apply_poll(state(0));
        assert_eq!(bell.badge(), None);
        bell.apply_poll(state(4));
        assert_eq!(bell.badge(), Some(4));
    }

    #[test]
    fn test_open_advances_once_per_transition() {
        let (backend, mut bell) = bell();
        let first = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();

        assert!(bell.open(first));
        // Repeated open while already open is a no-op.
        assert!(!bell.open(later));
        let watermarks = WatermarkStore::new(backend.clone());
        assert_eq!(watermarks.get_watermark(CategoryId::ReportCards), first);

        bell.close();
        assert!(bell.open(later));
        assert_eq!(watermarks.get_watermark(CategoryId::ReportCards), later);
    }

    #[test]
    fn test_panel_only_visible_while_open() {
        let (_, mut bell) = bell();
        bell.apply_poll(state(2));
        assert!(bell.panel().is_none());

        bell.open(Utc::now());
        assert_eq!(bell.panel().unwrap().total, 2);
        assert_eq!(bell.panel_state(), PanelState::Open);

        bell.close();
        assert!(bell.panel().is_none());
    }

    #[test]
    fn test_torn_down_bell_ignores_updates_and_opens() {
        let (backend, mut bell) = bell();
        bell.apply_poll(state(1));
        bell.teardown();

        assert!(!bell.apply_poll(state(9)));
        assert_eq!(bell.badge(), Some(1));
        assert!(!bell.open(Utc::now()));
        assert!(backend.get_state(WATERMARKS_KEY).unwrap().is_none());
    }
}

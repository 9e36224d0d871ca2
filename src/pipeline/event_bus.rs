// src/pipeline/event_bus.rs
//
// Decoupled event system. The ranging loop publishes transitions instead of
// consumers polling engine state.

use crate::types::RangeEstimate;
use std::collections::VecDeque;
use tracing::warn;

#[derive(Debug, Clone)]
pub enum RangeEvent {
    EstimatePublished(RangeEstimate),

    /// Confidence crossed above the lock threshold.
    TargetLocked {
        label: Option<String>,
        distance: f32,
        frame_id: u64,
    },

    /// Confidence dropped back below the lock threshold, or the frame
    /// produced no estimate while locked.
    TargetLost {
        frame_id: u64,
    },

    CalibrationApplied {
        scale_factor: f32,
    },
}

pub struct EventBus {
    events: VecDeque<RangeEvent>,
    max_pending: usize,
}

impl EventBus {
    pub fn new(max_pending: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending,
        }
    }

    pub fn publish(&mut self, event: RangeEvent) {
        if self.events.len() >= self.max_pending {
            warn!(
                "Event bus full ({} events), dropping oldest",
                self.max_pending
            );
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<RangeEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }
}

/// Tracks lock-state transitions across frames and turns them into events.
pub struct LockTracker {
    locked: bool,
}

impl LockTracker {
    pub fn new() -> Self {
        Self { locked: false }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Feed this frame's estimate (or its absence); emits an event only on
    /// a transition.
    pub fn update(&mut self, estimate: Option<&RangeEstimate>, frame_id: u64) -> Option<RangeEvent> {
        match estimate {
            Some(estimate) if estimate.is_locked() => {
                if self.locked {
                    return None;
                }
                self.locked = true;
                Some(RangeEvent::TargetLocked {
                    label: estimate
                        .components
                        .iter()
                        .find_map(|c| c.source_label.clone()),
                    distance: estimate.distance,
                    frame_id,
                })
            }
            _ => {
                if !self.locked {
                    return None;
                }
                self.locked = false;
                Some(RangeEvent::TargetLost { frame_id })
            }
        }
    }

    pub fn reset(&mut self) {
        self.locked = false;
    }
}

impl Default for LockTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DistanceUnit, RangeMethod};

    fn estimate(confidence: f32) -> RangeEstimate {
        RangeEstimate {
            distance: 50.0,
            unit: DistanceUnit::Meters,
            confidence,
            method: RangeMethod::HumanSize,
            uncertainty: 2.0,
            components: Vec::new(),
            timestamp_ms: 0.0,
        }
    }

    #[test]
    fn test_bus_drops_oldest_when_full() {
        let mut bus = EventBus::new(2);
        bus.publish(RangeEvent::TargetLost { frame_id: 1 });
        bus.publish(RangeEvent::TargetLost { frame_id: 2 });
        bus.publish(RangeEvent::TargetLost { frame_id: 3 });
        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], RangeEvent::TargetLost { frame_id: 2 }));
    }

    #[test]
    fn test_drain_empties_bus() {
        let mut bus = EventBus::new(8);
        bus.publish(RangeEvent::CalibrationApplied { scale_factor: 50.0 });
        assert_eq!(bus.drain().len(), 1);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_lock_transition_events() {
        let mut tracker = LockTracker::new();

        // Below threshold: no event
        assert!(tracker.update(Some(&estimate(0.4)), 1).is_none());

        // Crossing up
        let event = tracker.update(Some(&estimate(0.7)), 2).unwrap();
        assert!(matches!(event, RangeEvent::TargetLocked { frame_id: 2, .. }));

        // Staying locked: silent
        assert!(tracker.update(Some(&estimate(0.9)), 3).is_none());

        // Dropping out entirely
        let event = tracker.update(None, 4).unwrap();
        assert!(matches!(event, RangeEvent::TargetLost { frame_id: 4 }));
        assert!(!tracker.is_locked());
    }
}

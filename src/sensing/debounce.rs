use serde::{Deserialize, Serialize};

use crate::models::{FrameObservation, StableObservation};

/// Tunable thresholds for the debounce filter, counted in ticks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DebounceConfig {
    /// Consecutive identical readings before a vehicle is reported.
    pub stability_threshold: u32,
    /// Consecutive empty ticks before the vehicle is considered gone. Kept well
    /// above `stability_threshold` so short detector gaps do not end a visit.
    pub absence_threshold: u32,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            stability_threshold: 6,
            absence_threshold: 61,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEvent {
    None,
    Stable(StableObservation),
    Absent,
}

/// Turns flickering per-tick readings into edge-triggered `Stable`/`Absent` events.
#[derive(Debug, Clone)]
pub struct DebounceFilter {
    config: DebounceConfig,
    previous_observation: Option<StableObservation>,
    matching_sample_count: u32,
    samples_since_any_detection: u32,
}

impl DebounceFilter {
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            previous_observation: None,
            matching_sample_count: 0,
            samples_since_any_detection: 0,
        }
    }

    pub fn config(&self) -> DebounceConfig {
        self.config
    }

    pub fn observe(&mut self, frame: &FrameObservation) -> FilterEvent {
        let Some(candidate) = frame.to_candidate() else {
            return self.observe_gap();
        };

        self.samples_since_any_detection = 0;

        if self.previous_observation.as_ref() == Some(&candidate) {
            self.matching_sample_count = self.matching_sample_count.saturating_add(1);
        } else {
            self.previous_observation = Some(candidate);
            self.matching_sample_count = 1;
        }

        if self.matching_sample_count == self.config.stability_threshold {
            if let Some(stable) = self.previous_observation.clone() {
                return FilterEvent::Stable(stable);
            }
        }
        FilterEvent::None
    }

    fn observe_gap(&mut self) -> FilterEvent {
        self.previous_observation = None;
        self.matching_sample_count = 0;
        self.samples_since_any_detection = self.samples_since_any_detection.saturating_add(1);

        if self.samples_since_any_detection == self.config.absence_threshold {
            FilterEvent::Absent
        } else {
            FilterEvent::None
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    pub fn previous_observation(&self) -> Option<&StableObservation> {
        self.previous_observation.as_ref()
    }

    pub fn matching_sample_count(&self) -> u32 {
        self.matching_sample_count
    }

    pub fn samples_since_any_detection(&self) -> u32 {
        self.samples_since_any_detection
    }
}

impl Default for DebounceFilter {
    fn default() -> Self {
        Self::new(DebounceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VehicleClass;

    fn car(plate: &str) -> FrameObservation {
        FrameObservation::new(VehicleClass::Car, plate)
    }

    fn feed(filter: &mut DebounceFilter, frame: &FrameObservation, times: u32) -> Vec<FilterEvent> {
        (0..times)
            .map(|_| filter.observe(frame))
            .filter(|event| *event != FilterEvent::None)
            .collect()
    }

    #[test]
    fn short_runs_never_stabilize() {
        let mut filter = DebounceFilter::default();
        assert!(feed(&mut filter, &car("SC 12345"), 5).is_empty());
        assert!(feed(&mut filter, &car("SC 12346"), 5).is_empty());
        assert!(feed(&mut filter, &car("SC 12345"), 5).is_empty());
    }

    #[test]
    fn stable_fires_once_per_run() {
        let mut filter = DebounceFilter::default();
        let events = feed(&mut filter, &car("SC 12-345"), 40);
        assert_eq!(
            events,
            vec![FilterEvent::Stable(StableObservation {
                vehicle_class: VehicleClass::Car,
                plate_text: "SC12345".into(),
            })]
        );
        assert_eq!(filter.matching_sample_count(), 40);
    }

    #[test]
    fn stable_fires_on_the_threshold_tick() {
        let mut filter = DebounceFilter::default();
        for _ in 0..5 {
            assert_eq!(filter.observe(&car("SC12345")), FilterEvent::None);
        }
        assert!(matches!(filter.observe(&car("SC12345")), FilterEvent::Stable(_)));
    }

    #[test]
    fn separator_noise_counts_as_the_same_reading() {
        let mut filter = DebounceFilter::default();
        let frames = ["SC 12345", "SC12345", "SC-12345", "SC 12-345", "SC/12345", "SC12345"];
        let events: Vec<_> = frames
            .iter()
            .map(|plate| filter.observe(&car(plate)))
            .filter(|event| *event != FilterEvent::None)
            .collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn class_change_restarts_the_run() {
        let mut filter = DebounceFilter::default();
        assert!(feed(&mut filter, &car("SC12345"), 4).is_empty());
        let truck = FrameObservation::new(VehicleClass::Truck, "SC12345");
        assert!(feed(&mut filter, &truck, 5).is_empty());
        assert_eq!(feed(&mut filter, &truck, 1).len(), 1);
    }

    #[test]
    fn gap_breaks_a_matching_run() {
        let mut filter = DebounceFilter::default();
        assert!(feed(&mut filter, &car("SC12345"), 5).is_empty());
        assert!(feed(&mut filter, &FrameObservation::empty(), 1).is_empty());
        assert!(feed(&mut filter, &car("SC12345"), 5).is_empty());
        assert_eq!(feed(&mut filter, &car("SC12345"), 1).len(), 1);
    }

    #[test]
    fn absent_fires_once_after_threshold() {
        let mut filter = DebounceFilter::default();
        let events = feed(&mut filter, &FrameObservation::empty(), 200);
        assert_eq!(events, vec![FilterEvent::Absent]);
    }

    #[test]
    fn interrupted_absence_fires_nothing() {
        let mut filter = DebounceFilter::default();
        let no_plate = FrameObservation {
            vehicle_class: VehicleClass::Car,
            plate_text: None,
        };
        for _ in 0..10 {
            assert!(feed(&mut filter, &no_plate, 60).is_empty());
            filter.observe(&car("SC12345"));
        }
    }

    #[test]
    fn absent_rearms_after_a_usable_reading() {
        let mut filter = DebounceFilter::new(DebounceConfig {
            stability_threshold: 2,
            absence_threshold: 3,
        });
        assert_eq!(feed(&mut filter, &FrameObservation::empty(), 5), vec![FilterEvent::Absent]);
        filter.observe(&car("SC12345"));
        assert_eq!(feed(&mut filter, &FrameObservation::empty(), 5), vec![FilterEvent::Absent]);
    }

    #[test]
    fn reset_clears_counters_but_keeps_config() {
        let config = DebounceConfig {
            stability_threshold: 3,
            absence_threshold: 9,
        };
        let mut filter = DebounceFilter::new(config);
        feed(&mut filter, &car("SC12345"), 2);
        filter.reset();
        assert_eq!(filter.matching_sample_count(), 0);
        assert!(filter.previous_observation().is_none());
        assert_eq!(filter.config(), config);
        assert!(feed(&mut filter, &car("SC12345"), 2).is_empty());
    }
}

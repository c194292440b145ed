use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::models::{FrameObservation, VehicleClass};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DetectionClass {
    Plate,
    Car,
    Truck,
    Motorcycle,
}

/// One object found by the detector in a frame. Only plates carry text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub class: DetectionClass,
    #[serde(default)]
    pub text: Option<String>,
}

/// Client for the vision detector. Owned by the composition root and handed to
/// the sampler; `Ok(None)` means the source has no more frames.
pub trait Detector: Send {
    fn detect(&mut self) -> Result<Option<Vec<Detection>>>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn detect(&mut self) -> Result<Option<Vec<Detection>>> {
        (**self).detect()
    }
}

/// Produces one `FrameObservation` per tick from the detector's raw results.
pub struct DetectionSampler<D> {
    detector: D,
}

impl<D: Detector> DetectionSampler<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    /// `Ok(None)` once the source is exhausted.
    pub fn next_observation(&mut self) -> Result<Option<FrameObservation>> {
        Ok(self.detector.detect()?.map(|detections| reduce(&detections)))
    }
}

/// Last vehicle and last plate in the detection list win.
pub fn reduce(detections: &[Detection]) -> FrameObservation {
    let mut observation = FrameObservation::empty();
    for detection in detections {
        match detection.class {
            DetectionClass::Plate => {
                observation.plate_text = Some(detection.text.clone().unwrap_or_default());
            }
            DetectionClass::Car => observation.vehicle_class = VehicleClass::Car,
            DetectionClass::Truck => observation.vehicle_class = VehicleClass::Truck,
            DetectionClass::Motorcycle => observation.vehicle_class = VehicleClass::Motorcycle,
        }
    }
    observation
}

//! Per-tick detector readings and the debounced observation derived from them.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::sensing::plate::sanitize;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum VehicleClass {
    None,
    Car,
    Truck,
    Motorcycle,
}

impl Default for VehicleClass {
    fn default() -> Self {
        VehicleClass::None
    }
}

impl VehicleClass {
    /// Name used by the detector classes file and the `vehicle_types` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::None => "none",
            VehicleClass::Car => "car",
            VehicleClass::Truck => "truck",
            VehicleClass::Motorcycle => "motorcycle",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "none" => Ok(VehicleClass::None),
            "car" => Ok(VehicleClass::Car),
            "truck" => Ok(VehicleClass::Truck),
            "motorcycle" => Ok(VehicleClass::Motorcycle),
            other => Err(anyhow!("unknown vehicle class '{other}'")),
        }
    }

    /// Label shown on the kiosk screens.
    pub fn display_name(&self) -> &'static str {
        match self {
            VehicleClass::None => "",
            VehicleClass::Car => "Samochód",
            VehicleClass::Truck => "Ciężarówka",
            VehicleClass::Motorcycle => "Motocykl",
        }
    }

    pub fn is_vehicle(&self) -> bool {
        !matches!(self, VehicleClass::None)
    }
}

/// One detector sample for one clock tick. Plate text is raw OCR output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FrameObservation {
    pub vehicle_class: VehicleClass,
    pub plate_text: Option<String>,
}

impl FrameObservation {
    pub fn new(vehicle_class: VehicleClass, plate_text: impl Into<String>) -> Self {
        Self {
            vehicle_class,
            plate_text: Some(plate_text.into()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Sanitizes the plate and returns the candidate reading, or `None` when the
    /// tick carries no vehicle or no readable plate.
    pub fn to_candidate(&self) -> Option<StableObservation> {
        if !self.vehicle_class.is_vehicle() {
            return None;
        }
        let plate = sanitize(self.plate_text.as_deref()?);
        if plate.is_empty() {
            return None;
        }
        Some(StableObservation {
            vehicle_class: self.vehicle_class,
            plate_text: plate,
        })
    }
}

/// A reading confirmed by repetition. The plate is always sanitized and the
/// class is never `VehicleClass::None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct StableObservation {
    pub vehicle_class: VehicleClass,
    pub plate_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_requires_vehicle_and_plate() {
        assert!(FrameObservation::empty().to_candidate().is_none());
        assert!(FrameObservation::new(VehicleClass::None, "SC12345")
            .to_candidate()
            .is_none());
        assert!(FrameObservation::new(VehicleClass::Car, " - / ")
            .to_candidate()
            .is_none());
        assert!(FrameObservation {
            vehicle_class: VehicleClass::Car,
            plate_text: None,
        }
        .to_candidate()
        .is_none());
    }

    #[test]
    fn candidate_carries_sanitized_plate() {
        let candidate = FrameObservation::new(VehicleClass::Truck, "WE 4/21-9")
            .to_candidate()
            .unwrap();
        assert_eq!(candidate.vehicle_class, VehicleClass::Truck);
        assert_eq!(candidate.plate_text, "WE4219");
    }

    #[test]
    fn vehicle_class_names_round_trip() {
        for class in [
            VehicleClass::None,
            VehicleClass::Car,
            VehicleClass::Truck,
            VehicleClass::Motorcycle,
        ] {
            assert_eq!(VehicleClass::parse(class.as_str()).unwrap(), class);
        }
        assert!(VehicleClass::parse("bus").is_err());
    }
}

//! Events the controller hands to the screen layer. The renderer owns
//! navigation; the controller only says which view to show.

pub mod billing;
pub mod sinks;

use serde::{Deserialize, Serialize};

use crate::models::{Money, VehicleClass};

pub use billing::{amount_due, format_duration, DurationLocale};
pub use sinks::{ChannelSink, LogSink};

/// Message screens and the numeric codes the kiosk UI knows them by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageCode {
    DetectionError,
    GeneralError,
    NoFreeParkingLots,
    NoFreeParkingLotsSomeType,
    PaymentSuccessful,
    PaymentUnsuccessful,
}

impl MessageCode {
    pub fn code(&self) -> i32 {
        match self {
            MessageCode::DetectionError => -2,
            MessageCode::GeneralError => -1,
            MessageCode::NoFreeParkingLots => 1,
            MessageCode::NoFreeParkingLotsSomeType => 2,
            MessageCode::PaymentSuccessful => 3,
            MessageCode::PaymentUnsuccessful => 4,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            MessageCode::DetectionError => {
                "WYSTĄPIŁ BŁĄD DETEKCJI\nPROSIMY O ZWRÓCENIE SIĘ DO OBSŁUGI"
            }
            MessageCode::GeneralError => {
                "WYSTĄPIŁ BŁĄD SYSTEMU\nPROSIMY O ZWRÓCENIE SIĘ DO OBSŁUGI"
            }
            MessageCode::NoFreeParkingLots => "BRAK MIEJSC PARKINGOWYCH",
            MessageCode::NoFreeParkingLotsSomeType => {
                "BRAK MIEJSC PARKINGOWYCH\nDLA DANEGO TYPU POJAZDU"
            }
            MessageCode::PaymentSuccessful => "PŁATNOŚĆ DOKONANA POMYŚLNIE\nMIŁEGO DNIA!",
            MessageCode::PaymentUnsuccessful => {
                "WYSTĄPIŁ PROBLEM Z PŁATNOŚCIĄ\nPROSIMY SPRÓBOWAĆ PONOWNIE"
            }
        }
    }
}

/// Data for the departure screen, taken verbatim from the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExitView {
    pub session_id: String,
    pub vehicle_class: VehicleClass,
    pub plate_text: String,
    pub tariff_per_hour: Money,
    pub duration_secs: u64,
}

impl ExitView {
    pub fn amount_due(&self) -> Money {
        amount_due(self.tariff_per_hour, self.duration_secs)
    }

    pub fn duration_text(&self, locale: DurationLocale) -> String {
        format_duration(self.duration_secs, locale)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum PresentationEvent {
    ShowIdle,
    #[serde(rename_all = "camelCase")]
    ShowWelcome {
        vehicle_class: VehicleClass,
        plate_text: String,
        sector_name: String,
    },
    ShowExit(ExitView),
    #[serde(rename_all = "camelCase")]
    ShowMessage { code: MessageCode },
    #[serde(rename_all = "camelCase")]
    ShowNoCapacity { vehicle_class: VehicleClass },
}

/// Fire-and-forget: implementations must not block the control loop.
pub trait PresentationSink: Send + Sync {
    fn present(&self, event: PresentationEvent);
}

impl<P: PresentationSink + ?Sized> PresentationSink for std::sync::Arc<P> {
    fn present(&self, event: PresentationEvent) {
        (**self).present(event)
    }
}

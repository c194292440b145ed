use log::{info, warn};
use tokio::sync::mpsc;

use super::{DurationLocale, PresentationEvent, PresentationSink};

/// Writes every event to the log. Used when no screen is attached.
pub struct LogSink {
    locale: DurationLocale,
}

impl LogSink {
    pub fn new(locale: DurationLocale) -> Self {
        Self { locale }
    }
}

impl PresentationSink for LogSink {
    fn present(&self, event: PresentationEvent) {
        match event {
            PresentationEvent::ShowIdle => info!("screen: idle"),
            PresentationEvent::ShowWelcome {
                vehicle_class,
                plate_text,
                sector_name,
            } => info!(
                "screen: welcome {} ({}), sector {}",
                plate_text,
                vehicle_class.display_name(),
                sector_name
            ),
            PresentationEvent::ShowExit(view) => info!(
                "screen: exit {} ({}), session {}, stay {}, due {}",
                view.plate_text,
                view.vehicle_class.display_name(),
                view.session_id,
                view.duration_text(self.locale),
                view.amount_due()
            ),
            PresentationEvent::ShowMessage { code } => {
                info!("screen: message {} {:?}", code.code(), code.text())
            }
            PresentationEvent::ShowNoCapacity { vehicle_class } => info!(
                "screen: no free lots for {}",
                vehicle_class.display_name()
            ),
        }
    }
}

/// Forwards events to a renderer task.
#[derive(Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<PresentationEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PresentationEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl PresentationSink for ChannelSink {
    fn present(&self, event: PresentationEvent) {
        if let Err(err) = self.sender.send(event) {
            warn!("renderer gone, dropping {:?}", err.0);
        }
    }
}

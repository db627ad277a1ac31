use tracing::info;

use super::ModalChannel;
use super::PushChannel;
use super::PushRequest;
use super::SoundChannel;
use super::ToastChannel;
use super::VibrationChannel;
use crate::AlertEvent;
use crate::AlertKind;

/// Headless adapter that renders every channel as a log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogChannel;

impl SoundChannel for LogChannel {
    fn play(
        &self,
        kind: AlertKind,
        volume: u8,
    ) -> bool {
        info!(target: "courier::sound", kind = kind.as_str(), volume, "play");
        true
    }
}

impl VibrationChannel for LogChannel {
    fn vibrate(
        &self,
        pattern: &[u32],
    ) -> bool {
        info!(target: "courier::vibration", ?pattern, "vibrate");
        true
    }
}

impl PushChannel for LogChannel {
    fn show(
        &self,
        request: &PushRequest,
    ) -> bool {
        info!(
            target: "courier::push",
            tag = %request.tag,
            title = %request.title,
            "{}",
            request.body
        );
        true
    }
}

impl ModalChannel for LogChannel {
    fn show(
        &self,
        alert: &AlertEvent,
    ) {
        info!(
            target: "courier::modal",
            id = %alert.id,
            kind = alert.kind.as_str(),
            title = %alert.title,
            "{}",
            alert.message
        );
    }
}

impl ToastChannel for LogChannel {
    fn show(
        &self,
        alert: &AlertEvent,
    ) {
        info!(
            target: "courier::toast",
            id = %alert.id,
            kind = alert.kind.as_str(),
            title = %alert.title,
            "{}",
            alert.message
        );
    }
}

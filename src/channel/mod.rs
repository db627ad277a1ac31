//! Notification channel adapters.
//!
//! Sinks the dispatcher realizes alerts on. Sound, vibration and push may
//! fail (audio not unlocked, unsupported device, permission missing) and say
//! so with `false`; modal and toast are in-process UI and always succeed.
//! Every call must return promptly: adapters hand work off, they never block
//! the dispatch path.

mod log_channel;
mod recording_channel;
pub use log_channel::*;
pub use recording_channel::*;

#[cfg(test)]
mod recording_channel_test;

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::AlertEvent;
use crate::AlertKind;

/// OS/browser push request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    pub title: String,
    pub body: String,
    /// Notifications sharing a tag replace each other
    pub tag: String,
}

#[cfg_attr(test, automock)]
pub trait SoundChannel: Send + Sync + 'static {
    fn play(
        &self,
        kind: AlertKind,
        volume: u8,
    ) -> bool;
}

#[cfg_attr(test, automock)]
pub trait VibrationChannel: Send + Sync + 'static {
    fn vibrate(
        &self,
        pattern: &[u32],
    ) -> bool;
}

#[cfg_attr(test, automock)]
pub trait PushChannel: Send + Sync + 'static {
    fn show(
        &self,
        request: &PushRequest,
    ) -> bool;
}

#[cfg_attr(test, automock)]
pub trait ModalChannel: Send + Sync + 'static {
    /// Displays a blocking, dismiss-only alert, replacing any shown one.
    fn show(
        &self,
        alert: &AlertEvent,
    );
}

#[cfg_attr(test, automock)]
pub trait ToastChannel: Send + Sync + 'static {
    fn show(
        &self,
        alert: &AlertEvent,
    );
}

/// The adapters one dispatcher delivers to.
#[derive(Clone)]
pub struct ChannelSet {
    pub sound: Arc<dyn SoundChannel>,
    pub vibration: Arc<dyn VibrationChannel>,
    pub push: Arc<dyn PushChannel>,
    pub modal: Arc<dyn ModalChannel>,
    pub toast: Arc<dyn ToastChannel>,
}

impl ChannelSet {
    /// Every channel backed by [`LogChannel`].
    pub fn logging() -> Self {
        let log = Arc::new(LogChannel);
        Self {
            sound: log.clone(),
            vibration: log.clone(),
            push: log.clone(),
            modal: log.clone(),
            toast: log,
        }
    }

    /// Every channel backed by the same [`RecordingChannel`].
    pub fn recording(recorder: Arc<RecordingChannel>) -> Self {
        Self {
            sound: recorder.clone(),
            vibration: recorder.clone(),
            push: recorder.clone(),
            modal: recorder.clone(),
            toast: recorder,
        }
    }
}

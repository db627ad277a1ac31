use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::classify;
use super::AlertEvent;
use super::AlertKind;
use super::AlertPayload;
use super::DedupKey;
use super::Deduplicator;
use super::RecipientProfile;
use super::Tier;
use crate::channel::ChannelSet;
use crate::channel::PushRequest;
use crate::constants::PUSH_TAG_PREFIX;
use crate::constants::TOAST_VIBRATION_PATTERN;
use crate::constants::URGENT_VIBRATION_PATTERN;
use crate::metrics::ALERTS_DISPATCHED;
use crate::metrics::ALERTS_SUPPRESSED;
use crate::metrics::CHANNEL_FAILURES;
use crate::metrics::MODALS_REPLACED;
use crate::Actor;
use crate::ChangeEvent;
use crate::ChannelError;
use crate::ChannelSwitches;
use crate::DispatchConfig;

/// Volume used when sound is forced past the recipient's own setting.
const FORCED_VOLUME: u8 = 100;

/// Which settings a failable channel obeys for a given alert kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Only the engine-wide switch can silence it
    Forced,
    /// The recipient's profile decides as well
    Preference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Modal,
    Toast,
}

/// How one alert kind is realized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPlan {
    pub surface: Surface,
    pub sound: Option<Gate>,
    pub vibration: Option<Gate>,
    pub push: Option<Gate>,
}

impl DeliveryPlan {
    pub fn for_kind(kind: AlertKind) -> Self {
        use Gate::*;
        match kind {
            AlertKind::NewOrder => Self {
                surface: Surface::Modal,
                sound: Some(Forced),
                vibration: Some(Forced),
                push: None,
            },
            AlertKind::AdminUrgent => Self {
                surface: Surface::Modal,
                sound: Some(Preference),
                vibration: Some(Preference),
                push: Some(Forced),
            },
            AlertKind::StatusChanged => Self {
                surface: Surface::Toast,
                sound: Some(Preference),
                vibration: None,
                push: Some(Preference),
            },
            AlertKind::DeliveryAvailable | AlertKind::NewMessage => Self {
                surface: Surface::Toast,
                sound: Some(Preference),
                vibration: Some(Preference),
                push: Some(Preference),
            },
            AlertKind::Success | AlertKind::Error => Self {
                surface: Surface::Toast,
                sound: None,
                vibration: None,
                push: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOutcome {
    /// Not part of the plan, or gated off
    Skipped,
    Delivered,
    /// Adapter reported failure
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub alert_id: String,
    pub kind: AlertKind,
    pub surface: Surface,
    pub sound: ChannelOutcome,
    pub vibration: ChannelOutcome,
    pub push: ChannelOutcome,
    /// Id of the modal this alert displaced
    pub replaced_modal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Already dispatched within the dedup window
    Duplicate,
    /// Nothing for this viewer
    Irrelevant,
    Delivered(DeliveryReport),
}

/// Turns change events into alerts and realizes them on the channel adapters.
///
/// One instance per viewing session. The recipient profile may be swapped at
/// any time without blocking dispatch.
pub struct Dispatcher {
    channels: ChannelSet,
    switches: ChannelSwitches,
    profile: ArcSwap<RecipientProfile>,
    modal_slot: Mutex<Option<AlertEvent>>,
    dedup: Deduplicator,
}

impl Dispatcher {
    pub fn new(
        channels: ChannelSet,
        config: &DispatchConfig,
        profile: RecipientProfile,
    ) -> Self {
        Self {
            channels,
            switches: config.channels,
            profile: ArcSwap::from_pointee(profile),
            modal_slot: Mutex::new(None),
            dedup: Deduplicator::new(config.dedup_window(), config.dedup_capacity),
        }
    }

    pub fn classify(
        &self,
        event: &ChangeEvent,
        viewer: &Actor,
    ) -> Option<AlertEvent> {
        classify(event, viewer)
    }

    /// Dedups, classifies and delivers one change event for `viewer`.
    pub fn dispatch(
        &self,
        event: &ChangeEvent,
        viewer: &Actor,
    ) -> DispatchOutcome {
        if !self.dedup.first_seen(DedupKey::of(event)) {
            debug!(table = %event.table, row = event.row_id(), "duplicate change suppressed");
            ALERTS_SUPPRESSED.with_label_values(&["duplicate"]).inc();
            return DispatchOutcome::Duplicate;
        }

        match classify(event, viewer) {
            Some(alert) => {
                let profile = self.profile.load();
                DispatchOutcome::Delivered(self.deliver(&alert, &profile))
            }
            None => {
                ALERTS_SUPPRESSED.with_label_values(&["irrelevant"]).inc();
                DispatchOutcome::Irrelevant
            }
        }
    }

    /// Shows a generic success or error toast.
    pub fn notify(
        &self,
        kind: AlertKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> DeliveryReport {
        let alert = AlertEvent::new(kind, None, title, message, AlertPayload::None);
        let profile = self.profile.load();
        self.deliver(&alert, &profile)
    }

    /// Realizes `alert` per its kind's [`DeliveryPlan`]. Channel failures are
    /// logged and counted, never retried.
    pub fn deliver(
        &self,
        alert: &AlertEvent,
        profile: &RecipientProfile,
    ) -> DeliveryReport {
        let plan = DeliveryPlan::for_kind(alert.kind);

        let replaced_modal = match plan.surface {
            Surface::Modal => self.show_modal(alert),
            Surface::Toast => {
                self.channels.toast.show(alert);
                None
            }
        };

        let sound = match plan.sound {
            Some(gate)
                if self.switches.sound && (gate == Gate::Forced || profile.wants_sound()) =>
            {
                let volume = match gate {
                    Gate::Forced => FORCED_VOLUME,
                    Gate::Preference => profile.volume,
                };
                self.outcome("sound", alert, self.channels.sound.play(alert.kind, volume))
            }
            _ => ChannelOutcome::Skipped,
        };

        let vibration = match plan.vibration {
            Some(gate)
                if self.switches.vibration
                    && (gate == Gate::Forced || profile.vibration_enabled) =>
            {
                let pattern = match alert.tier {
                    Tier::Urgent => URGENT_VIBRATION_PATTERN,
                    Tier::Toast => TOAST_VIBRATION_PATTERN,
                };
                self.outcome("vibration", alert, self.channels.vibration.vibrate(pattern))
            }
            _ => ChannelOutcome::Skipped,
        };

        let push = match plan.push {
            Some(gate) if self.switches.push && (gate == Gate::Forced || profile.wants_push()) => {
                let request = PushRequest {
                    title: alert.title.clone(),
                    body: alert.message.clone(),
                    tag: format!("{}-{}", PUSH_TAG_PREFIX, alert.payload.tag()),
                };
                self.outcome("push", alert, self.channels.push.show(&request))
            }
            _ => ChannelOutcome::Skipped,
        };

        ALERTS_DISPATCHED
            .with_label_values(&[alert.kind.as_str(), alert.tier.as_str()])
            .inc();
        debug!(
            id = %alert.id,
            kind = alert.kind.as_str(),
            ?sound,
            ?vibration,
            ?push,
            "alert delivered"
        );

        DeliveryReport {
            alert_id: alert.id.clone(),
            kind: alert.kind,
            surface: plan.surface,
            sound,
            vibration,
            push,
            replaced_modal,
        }
    }

    pub fn update_profile(
        &self,
        profile: RecipientProfile,
    ) {
        self.profile.store(Arc::new(profile));
    }

    pub fn profile(&self) -> Arc<RecipientProfile> {
        self.profile.load_full()
    }

    /// The urgent alert currently blocking the screen
    pub fn active_modal(&self) -> Option<AlertEvent> {
        self.modal_slot.lock().clone()
    }

    /// Dismisses the modal if `alert_id` is the one shown. Returns whether it
    /// was.
    pub fn dismiss_modal(
        &self,
        alert_id: &str,
    ) -> bool {
        let mut slot = self.modal_slot.lock();
        match slot.as_ref() {
            Some(shown) if shown.id == alert_id => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    fn show_modal(
        &self,
        alert: &AlertEvent,
    ) -> Option<String> {
        let mut slot = self.modal_slot.lock();
        let replaced = slot.replace(alert.clone()).map(|previous| {
            info!(
                replaced = %previous.id,
                by = %alert.id,
                "urgent alert replaced before dismissal"
            );
            MODALS_REPLACED.inc();
            previous.id
        });
        self.channels.modal.show(alert);
        replaced
    }

    fn outcome(
        &self,
        channel: &'static str,
        alert: &AlertEvent,
        delivered: bool,
    ) -> ChannelOutcome {
        if delivered {
            return ChannelOutcome::Delivered;
        }
        let e = ChannelError::Unavailable {
            channel,
            alert_id: alert.id.clone(),
        };
        warn!("{}", e);
        CHANNEL_FAILURES.with_label_values(&[channel]).inc();
        ChannelOutcome::Unavailable
    }
}

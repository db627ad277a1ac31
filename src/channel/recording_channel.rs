use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;

use super::ModalChannel;
use super::PushChannel;
use super::PushRequest;
use super::SoundChannel;
use super::ToastChannel;
use super::VibrationChannel;
use crate::constants::DEFAULT_RECORDING_CAPACITY;
use crate::AlertEvent;
use crate::AlertKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelCall {
    Sound { kind: AlertKind, volume: u8 },
    Vibration(Vec<u32>),
    Push(PushRequest),
    Modal(AlertEvent),
    Toast(AlertEvent),
}

/// Adapter that keeps every call in memory, for embedding hosts that render
/// alerts themselves and for tests.
///
/// Only the most recent `capacity` calls are kept; older ones are dropped.
/// The failable channels can be switched to report failure.
#[derive(Debug)]
pub struct RecordingChannel {
    calls: Mutex<VecDeque<ChannelCall>>,
    capacity: usize,
    sound_fails: AtomicBool,
    vibration_fails: AtomicBool,
    push_fails: AtomicBool,
}

impl Default for RecordingChannel {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RECORDING_CAPACITY)
    }
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A `capacity` of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            calls: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_RECORDING_CAPACITY))),
            capacity,
            sound_fails: AtomicBool::new(false),
            vibration_fails: AtomicBool::new(false),
            push_fails: AtomicBool::new(false),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn calls(&self) -> Vec<ChannelCall> {
        self.calls.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    pub fn modals(&self) -> Vec<AlertEvent> {
        self.filter(|call| match call {
            ChannelCall::Modal(alert) => Some(alert.clone()),
            _ => None,
        })
    }

    pub fn toasts(&self) -> Vec<AlertEvent> {
        self.filter(|call| match call {
            ChannelCall::Toast(alert) => Some(alert.clone()),
            _ => None,
        })
    }

    pub fn pushes(&self) -> Vec<PushRequest> {
        self.filter(|call| match call {
            ChannelCall::Push(request) => Some(request.clone()),
            _ => None,
        })
    }

    pub fn sounds(&self) -> Vec<(AlertKind, u8)> {
        self.filter(|call| match call {
            ChannelCall::Sound { kind, volume } => Some((*kind, *volume)),
            _ => None,
        })
    }

    pub fn vibrations(&self) -> Vec<Vec<u32>> {
        self.filter(|call| match call {
            ChannelCall::Vibration(pattern) => Some(pattern.clone()),
            _ => None,
        })
    }

    pub fn fail_sound(
        &self,
        fail: bool,
    ) {
        self.sound_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_vibration(
        &self,
        fail: bool,
    ) {
        self.vibration_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_push(
        &self,
        fail: bool,
    ) {
        self.push_fails.store(fail, Ordering::SeqCst);
    }

    fn record(
        &self,
        call: ChannelCall,
    ) {
        let mut calls = self.calls.lock();
        if calls.len() == self.capacity {
            calls.pop_front();
        }
        calls.push_back(call);
    }

    fn filter<T>(
        &self,
        f: impl Fn(&ChannelCall) -> Option<T>,
    ) -> Vec<T> {
        self.calls.lock().iter().filter_map(f).collect()
    }
}

impl SoundChannel for RecordingChannel {
    fn play(
        &self,
        kind: AlertKind,
        volume: u8,
    ) -> bool {
        self.record(ChannelCall::Sound { kind, volume });
        !self.sound_fails.load(Ordering::SeqCst)
    }
}

impl VibrationChannel for RecordingChannel {
    fn vibrate(
        &self,
        pattern: &[u32],
    ) -> bool {
        self.record(ChannelCall::Vibration(pattern.to_vec()));
        !self.vibration_fails.load(Ordering::SeqCst)
    }
}

impl PushChannel for RecordingChannel {
    fn show(
        &self,
        request: &PushRequest,
    ) -> bool {
        self.record(ChannelCall::Push(request.clone()));
        !self.push_fails.load(Ordering::SeqCst)
    }
}

impl ModalChannel for RecordingChannel {
    fn show(
        &self,
        alert: &AlertEvent,
    ) {
        self.record(ChannelCall::Modal(alert.clone()));
    }
}

impl ToastChannel for RecordingChannel {
    fn show(
        &self,
        alert: &AlertEvent,
    ) {
        self.record(ChannelCall::Toast(alert.clone()));
    }
}

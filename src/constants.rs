// -
// Vibration patterns (on/off durations in ms)

pub const URGENT_VIBRATION_PATTERN: &[u32] = &[200, 100, 200, 100, 400];
pub const TOAST_VIBRATION_PATTERN: &[u32] = &[200];

// -
// Change feed tables

pub(crate) const ORDERS_TABLE: &str = "orders";
pub(crate) const MESSAGES_TABLE: &str = "messages";
pub(crate) const RESTAURANTS_TABLE: &str = "restaurants";

/// Conditional writes on non-claim edges are re-validated at most this many
/// times when the row moves underneath.
pub(crate) const MAX_TRANSITION_ATTEMPTS: usize = 3;

/// Sled tree holding serialized orders
pub(crate) const ORDERS_TREE: &str = "_orders";

/// Push notifications for the same row replace each other on the device
pub(crate) const PUSH_TAG_PREFIX: &str = "courier";

/// Calls a [`crate::channel::RecordingChannel`] keeps before dropping the oldest
pub const DEFAULT_RECORDING_CAPACITY: usize = 1024;

mod alert_delivery;
mod claim_race;
mod common;
mod feed_recovery;

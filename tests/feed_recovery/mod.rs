mod reconnect_case1;
mod replay_dedup_case1;

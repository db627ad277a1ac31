mod claim_race_case1;

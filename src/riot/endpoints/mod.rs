mod match_v5;

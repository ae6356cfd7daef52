mod query_channel_tests;

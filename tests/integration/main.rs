//! Integration tests for the MediaHub HTTP API.

mod coordinator_test;
mod helpers;
mod worker_test;

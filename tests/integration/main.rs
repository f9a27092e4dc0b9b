//! Integration tests

mod config_test;
mod pipeline_test;

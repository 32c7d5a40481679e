//! Unit tests for individual components

mod config_test;
mod container_test;
mod error_test;

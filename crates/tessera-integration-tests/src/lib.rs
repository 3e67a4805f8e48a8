//! Integration test crate for the Tessera fee engine.
//!
//! This crate has no library code; it only contains integration tests
//! that drive oracle stamping, fee resolution and settlement across the
//! workspace crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p tessera-integration-tests
//! ```

//! Integration test suite.
//!
//! 1. End-to-end declaration, compilation and construction
//! 2. Concurrent first use of the caches
//! 3. Declaration files on disk

pub mod concurrency_tests;
pub mod declaration_tests;
pub mod end_to_end_tests;

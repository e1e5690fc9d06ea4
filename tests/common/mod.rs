// tests/common/mod.rs
//! Common test utilities for node integration tests.

pub mod mock_node;

pub use mock_node::MockNode;

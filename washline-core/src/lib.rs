//! # washline-core
//!
//! Allocation kernel for a fixed pool of interchangeable, exclusive-use
//! machines. Free machines are handed out first-come, busy pools push
//! requesters onto a FIFO wait-list, and expired assignments are reclaimed
//! lazily whenever the allocator is consulted.

pub mod client;
pub mod clock;
pub mod completed;
pub mod config;
pub mod error;
pub mod pool;
pub mod service;
pub mod types;
pub mod wait_list;

#[cfg(test)]
mod pool_test;

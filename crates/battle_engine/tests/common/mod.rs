//! Shared test utilities for battle engine tests.
//!
//! Each integration test binary pulls this in with `mod common;` and uses
//! the parts it needs.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

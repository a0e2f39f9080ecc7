// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keeps the issue that tracks quarantined tests up to date.
//!
//! Run this after the quarantined tests, passing it the JUnit XML report they produced. The
//! tracking issue's history table gains a column for the run, each test is labeled by how stable
//! it has been, and the issue is written back.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter, StderrStyles};

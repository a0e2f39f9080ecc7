// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read JUnit reports in Rust.
//!
//! The entry point is [`Report::deserialize_str`], which parses a JUnit/XUnit XML document into a
//! [`Report`]: a tree of [`TestSuite`]s, each holding [`TestCase`]s with a [`TestCaseStatus`].

mod deserialize;
mod errors;
mod report;

pub use errors::*;
pub use report::*;

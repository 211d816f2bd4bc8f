//! Shared test utilities for the superclaude workspace.
//!
//! This crate provides standardised fixtures so the bridge and CLI test
//! suites do not each grow their own fakes. It is a dev-dependency only and
//! never published.
//!
//! # Modules
//!
//! - [`runner`]: [`FakeRunner`], a scripted in-memory `ProcessRunner`
//! - [`project`]: [`TestProject`], a temporary project with shell-script agents
//! - [`scripts`]: bodies for those shell-script agents

pub mod project;
pub mod runner;
pub mod scripts;

pub use project::TestProject;
pub use runner::{FakeRunner, RecordedCall};

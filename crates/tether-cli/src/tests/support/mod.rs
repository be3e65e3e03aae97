//! Shared helpers for CLI and session tests.

mod fake_host;

pub(crate) use fake_host::{FakeHost, Reply};

//! Test suites for host bootstrap and end-to-end command handling.

mod behaviour;
mod support;

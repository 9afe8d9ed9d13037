//! End-to-end tests: wire envelopes into a network provider service.

mod common;

mod recording;
mod session;

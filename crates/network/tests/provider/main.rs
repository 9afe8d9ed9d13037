//! Network provider integration tests.

mod common;

mod parse;
mod url;

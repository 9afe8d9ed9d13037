//! Runtime integration tests against the `user`/`group` test provider.


mod concurrency;
mod construction;
mod memoization;

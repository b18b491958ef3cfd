#![cfg(test)]
//! Shared init-once helper for unit tests (spec 6 "Logging"). Grounded on
//! `k8s-runtime::test_util::trace_init` in the example pack: builds an
//! `env_logger` instance in test mode and swallows the "already
//! initialized" error so every test module can call it unconditionally.

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

//! Demo devices driven by RPC callbacks.

pub mod rgb_led;

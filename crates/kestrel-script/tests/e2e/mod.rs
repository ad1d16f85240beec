//! End-to-end tests for the script compiler running under the loader

mod harness;

mod builtins;
mod cycles;
mod errors;
mod eval;
mod imports;
mod live_bindings;

//! Helpers for setting up throwaway databases in tests. Not part of the public API.
pub mod fixtures;
pub mod prepare_env;

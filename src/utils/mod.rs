//! This module aggregates utility submodules that talk to external services.

/// Utilities for looking up song lyrics on Genius.
pub mod genius;

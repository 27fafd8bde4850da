//! Integration tests for tvfeed
//!
//! Tests are organized by component:
//! - playlist_test: M3U tokenizer and validation
//! - loader_test: Protocol selection and Xtream/M3U fallback
//! - subtitles_test: Provider fan-out, language filtering, failure isolation
//! - download_test: One-step and two-step downloads, SRT to WebVTT
//! - autoload_test: Provider/language pair walk and persistence
//! - cli_test: Argument parsing and exit codes of the binary

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs

//! Integration tests for lumen crates.
//!
//! End-to-end checks across curve editing, preset files, grading and
//! the chaos scheduler's simulation and render paths.

//! Cross-module test suites.

mod helpers;
mod integration;

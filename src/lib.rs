//! Webgrade core library.
//!
//! This crate grades web-page submissions: it turns reports from external
//! HTML, CSS and JavaScript linters into pass/fail outcomes and runs
//! structural check suites over the submitted documents.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `lint`: The uniform "no violations" assertion over linter backends.
//! - `linters`: Markup, style and script backends driven through Node.
//! - `dom`: Parsed documents and read-only queries.
//! - `cascade`: Computed styles for every element of a document.
//! - `fixture`: Fixture loading and whitespace-insensitive checksums.
//! - `suites`: The blog and SVG structural suites.
//! - `models`: Outcomes, reports, violations and linter options.
//! - `output`: Human/JSON printers.
//! - `error`: Library error type.
pub mod cascade;
pub mod cli;
pub mod config;
pub mod dom;
pub mod error;
pub mod fixture;
pub mod lint;
pub mod linters;
pub mod models;
pub mod output;
pub mod suites;

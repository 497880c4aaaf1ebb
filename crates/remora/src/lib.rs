#![forbid(unsafe_code)]

//! `remora` shells out to the Mermaid CLI (`@mermaid-js/mermaid-cli`) to turn diagram
//! source into PNG images, and degrades to a locally rasterized placeholder image when
//! no working CLI can be found.
//!
//! The crate is deliberately thin: it never parses or validates Mermaid syntax. The
//! interesting part is the discovery cascade in [`discover`]: several plausible ways of
//! invoking the external renderer are probed in priority order, and a candidate only
//! counts as usable after a real trivial conversion succeeds, because a `--version`
//! response says nothing about the renderer's headless-browser runtime being functional.
//!
//! Discovery runs once per [`Converter`]; the winning candidate (or its absence) is
//! fixed for the instance's lifetime.

pub mod convert;
pub mod discover;
pub mod error;
pub mod exec;
pub mod placeholder;
pub mod samples;

pub use convert::{BatchSummary, Conversion, Converter, SOURCE_EXTENSION};
pub use discover::{InvocationCandidate, ProbeVerdict, candidates, discover, probe};
pub use error::{Error, Result};

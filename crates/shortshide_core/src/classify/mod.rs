//! Disfavored-content classification.
//!
//! # Responsibility
//! - Decide whether one element is, contains or links to Shorts content.
//! - Pick the container to hide for a matched element.
//!
//! # Invariants
//! - Read-only with respect to the document.
//! - Binary signals only; no scoring or ranking step.

pub mod classifier;
pub mod rules;
pub mod target;

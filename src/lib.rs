//! Xplatree computes formal explanations for the predictions of tree-based models.
//!
//! Decision trees and regression boosted trees are read by [ModelReader](io::ModelReader).
//! Their decision tests are mapped to propositional variables, and the explanations are sets of literals
//! computed by the explainers of the [explainers] module, which rely on SAT, MaxSAT and model counting.

#![warn(missing_docs)]

pub mod encodings;

pub mod explainers;

pub mod io;

pub mod sat;

pub mod trees;

use super::{ExplainerKind, Explanation, PreferredReasonMethod, ReasonCount};
use crate::{sat::Literal, trees::BinaryRepresentation};
use anyhow::Result;
use std::time::Duration;

/// A trait for explainers, holding an instance and the literals that must not appear in its reasons.
///
/// The reason computations fail with a `no instance set` error until an instance is given.
pub trait InstanceExplainer {
    /// Sets the instance to explain.
    ///
    /// The instance is checked against the model before it replaces the previous one.
    fn set_instance(&mut self, instance: &[f64]) -> Result<()>;

    /// Returns the current instance, if any.
    fn instance(&self) -> Option<&[f64]>;

    /// Returns the binary representation of the current instance, if any.
    fn binary_representation(&self) -> Option<&BinaryRepresentation>;

    /// Prevents the literals of some features (1-based) from appearing in the reasons.
    ///
    /// The setting replaces the previous set of excluded features and is kept when the instance changes.
    fn set_excluded_features(&mut self, features: &[usize]) -> Result<()>;

    /// Prevents some literals from appearing in the reasons, in addition to the ones already excluded.
    fn exclude_literals(&mut self, literals: &[Literal]);

    /// Removes all the exclusions.
    fn clear_exclusions(&mut self);

    /// Returns the excluded literals of the current instance, sorted.
    fn excluded_literals(&self) -> Vec<Literal>;

    /// Computes the direct reason, made of the literals of the decision path(s) of the instance.
    ///
    /// No reason is returned if one of these literals is excluded.
    fn direct_reason(&self) -> Result<Explanation>;

    /// Checks if a set of literals forces the prediction of the current instance.
    fn is_reason(&self, reason: &[Literal]) -> Result<bool>;

    /// Returns the kind of this explainer.
    fn kind(&self) -> ExplainerKind;
}

/// A trait for explainers able to compute the sufficient reasons of their instance, and related explanations.
///
/// The number of requested reasons `n` is unbounded when set to [Option::None], as is a time limit.
pub trait SufficientReasonComputer {
    /// Computes contrastive reasons, taking the shortest core clauses first.
    ///
    /// These reasons are not guaranteed to be minimal.
    fn contrastive_reason(&self, n: Option<usize>) -> Result<Explanation>;

    /// Computes contrastive reasons that do not strictly contain another contrastive reason, shortest first.
    fn subset_minimal_contrastive_reason(&self, n: Option<usize>) -> Result<Explanation>;

    /// Computes the literals belonging to every sufficient reason, returned as a single reason.
    ///
    /// Exclusions are not taken into account.
    fn necessary_literals(&self) -> Result<Explanation>;

    /// Computes the literals that may appear in a sufficient reason without being necessary, returned as a single reason.
    fn relevant_literals(&self) -> Result<Explanation>;

    /// Enumerates sufficient reasons.
    fn sufficient_reason(&self, n: Option<usize>, time_limit: Option<Duration>) -> Result<Explanation>;

    /// Computes sufficient reasons of minimal weight, given a weighting scheme.
    ///
    /// See [compute_weights](super::compute_weights) for the meaning of `weights` and `features_partition`.
    /// If the time limit is reached after a reason was found, the best reason found so far is returned
    /// and the elapsed time is set to [TIMEOUT](super::ElapsedTime::Timeout).
    fn preferred_sufficient_reason(
        &self,
        method: PreferredReasonMethod,
        n: Option<usize>,
        time_limit: Option<Duration>,
        weights: Option<&[u64]>,
        features_partition: Option<&[Vec<usize>]>,
    ) -> Result<Explanation>;

    /// Computes sufficient reasons of minimal size.
    fn minimal_sufficient_reason(
        &self,
        n: Option<usize>,
        time_limit: Option<Duration>,
    ) -> Result<Explanation>;

    /// Counts the sufficient reasons.
    fn n_sufficient_reasons(&self, time_limit: Option<Duration>) -> Result<ReasonCount>;

    /// Counts the sufficient reasons, and for each literal the sufficient reasons it belongs to.
    fn n_sufficient_reasons_per_attribute(&self, time_limit: Option<Duration>) -> Result<ReasonCount>;
}

use crate::sat::Literal;
use num_bigint::BigUint;
use std::{collections::BTreeMap, fmt::Display, time::Duration};
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString};

/// The kinds of reasons an explainer may compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, StrumDisplay, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum ReasonKind {
    /// The literals of the decision path(s) of the instance
    Direct,
    /// Sets of literals which removal may change the prediction, sorted by size
    Contrastive,
    /// Contrastive reasons that do not contain another contrastive reason
    SubsetMinimalContrastive,
    /// Subset-minimal sets of literals forcing the prediction
    Sufficient,
    /// Sufficient reasons of minimal weight
    Preferred,
    /// Sufficient reasons of minimal size
    Minimal,
    /// The literals belonging to every sufficient reason
    Necessary,
    /// The literals belonging to some sufficient reason but not to all of them
    Relevant,
    /// Reasons computed by a greedy removal of literals, for boosted trees
    TreeSpecific,
}

/// The time spent computing an explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElapsedTime {
    /// The search ended within its time budget; the result is complete (or optimal)
    Duration(Duration),
    /// The search was cut off; the result may be incomplete or not optimal
    Timeout,
}

impl ElapsedTime {
    /// A null duration, used for the results computed without any search.
    pub fn zero() -> Self {
        ElapsedTime::Duration(Duration::ZERO)
    }

    /// Returns `true` iff the search was cut off.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ElapsedTime::Timeout)
    }

    // a search reaching its time limit or interrupted by a backend is considered cut off
    pub(crate) fn from_budget(
        time_used: Duration,
        time_limit: Option<Duration>,
        interrupted: bool,
    ) -> Self {
        if interrupted || time_limit.map(|t| time_used >= t).unwrap_or(false) {
            ElapsedTime::Timeout
        } else {
            ElapsedTime::Duration(time_used)
        }
    }
}

impl Display for ElapsedTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElapsedTime::Duration(d) => write!(f, "{:.3}s", d.as_secs_f64()),
            ElapsedTime::Timeout => write!(f, "TIMEOUT"),
        }
    }
}

pub(crate) fn remaining_time(time_limit: Option<Duration>, time_used: Duration) -> Option<Duration> {
    time_limit.map(|t| t.saturating_sub(time_used))
}

/// The result of a reason computation.
///
/// Each reason is a set of literals sorted by ascending variable.
/// An empty list of reasons means that no reason is available,
/// for instance because the excluded features are required to explain the prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    kind: ReasonKind,
    reasons: Vec<Vec<Literal>>,
    elapsed_time: ElapsedTime,
}

impl Explanation {
    pub(crate) fn new(kind: ReasonKind, reasons: Vec<Vec<Literal>>, elapsed_time: ElapsedTime) -> Self {
        Self {
            kind,
            reasons,
            elapsed_time,
        }
    }

    pub(crate) fn unavailable(kind: ReasonKind) -> Self {
        Self::new(kind, vec![], ElapsedTime::zero())
    }

    /// Returns the kind of the reasons.
    pub fn kind(&self) -> ReasonKind {
        self.kind
    }

    /// Returns the reasons.
    pub fn reasons(&self) -> &[Vec<Literal>] {
        &self.reasons
    }

    /// Consumes the explanation and returns its reasons.
    pub fn into_reasons(self) -> Vec<Vec<Literal>> {
        self.reasons
    }

    /// Returns the first reason, if any.
    pub fn first(&self) -> Option<&[Literal]> {
        self.reasons.first().map(|r| r.as_slice())
    }

    /// Returns `true` iff no reason is available.
    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    /// Returns the time spent computing the reasons.
    pub fn elapsed_time(&self) -> ElapsedTime {
        self.elapsed_time
    }
}

/// The number of sufficient reasons of an instance.
///
/// The count is [Option::None] if the time limit was reached; the per-literal counts are empty in this case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonCount {
    n_sufficient_reasons: Option<BigUint>,
    per_literal: BTreeMap<Literal, BigUint>,
    elapsed_time: ElapsedTime,
}

impl ReasonCount {
    pub(crate) fn new(
        n_sufficient_reasons: Option<BigUint>,
        per_literal: BTreeMap<Literal, BigUint>,
        elapsed_time: ElapsedTime,
    ) -> Self {
        Self {
            n_sufficient_reasons,
            per_literal,
            elapsed_time,
        }
    }

    /// Returns the number of sufficient reasons, or [Option::None] if the time limit was reached.
    pub fn n_sufficient_reasons(&self) -> Option<&BigUint> {
        self.n_sufficient_reasons.as_ref()
    }

    /// Returns, for each instance literal involved in a reason, the number of reasons it belongs to.
    ///
    /// The map is empty if the per-literal counts were not requested.
    pub fn per_literal(&self) -> &BTreeMap<Literal, BigUint> {
        &self.per_literal
    }

    /// Returns the time spent counting.
    pub fn elapsed_time(&self) -> ElapsedTime {
        self.elapsed_time
    }
}

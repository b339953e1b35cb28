use super::{
    exclusions::Exclusions, specs::InstanceExplainer, ElapsedTime, ExplainerKind, Explanation,
    ReasonKind,
};
use crate::{
    sat::Literal,
    trees::{BinaryRepresentation, RegressionBoostedTrees},
};
use anyhow::{anyhow, Result};
use log::debug;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::time::{Duration, Instant};

/// An explainer for the predictions of [RegressionBoostedTrees].
///
/// A set of literals is a reason if every instance satisfying it gets a prediction in the current range.
/// Setting an instance resets the range to its prediction.
pub struct RegressionBoostedTreesExplainer<'a> {
    forest: &'a RegressionBoostedTrees,
    instance: Option<Vec<f64>>,
    binaries: Option<BinaryRepresentation>,
    prediction: Option<f64>,
    range: Option<(f64, f64)>,
    exclusions: Exclusions,
}

impl<'a> RegressionBoostedTreesExplainer<'a> {
    /// Builds a new explainer for the given forest.
    pub fn new(forest: &'a RegressionBoostedTrees) -> Self {
        Self {
            forest,
            instance: None,
            binaries: None,
            prediction: None,
            range: None,
            exclusions: Exclusions::default(),
        }
    }

    /// Returns the explained forest.
    pub fn forest(&self) -> &RegressionBoostedTrees {
        self.forest
    }

    /// Returns the value predicted for the current instance, if any.
    pub fn prediction(&self) -> Option<f64> {
        self.prediction
    }

    /// Returns the range the predictions must fall into, if an instance is set.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.range
    }

    /// Sets the range the predictions must fall into.
    ///
    /// Fails if no instance is set or if the range is empty.
    pub fn set_range(&mut self, lower: f64, upper: f64) -> Result<()> {
        if self.instance.is_none() {
            return Err(anyhow!("no instance set"));
        }
        if !(lower <= upper) {
            return Err(anyhow!("invalid range [{}, {}]", lower, upper));
        }
        self.range = Some((lower, upper));
        Ok(())
    }

    /// Returns the lowest and highest values the forest may predict.
    pub fn extremum_range(&self) -> (f64, f64) {
        self.forest.extremum_range()
    }

    fn state(&self) -> Result<(&BinaryRepresentation, (f64, f64))> {
        match (&self.binaries, self.range) {
            (Some(b), Some(r)) => Ok((b, r)),
            _ => Err(anyhow!("no instance set")),
        }
    }

    fn is_implicant(&self, literals: &[Literal], range: (f64, f64)) -> bool {
        let (lower, upper) = self.forest.bounds_under(literals);
        lower >= range.0 && upper <= range.1
    }

    /// Computes a tree-specific reason by greedy deletion of literals.
    ///
    /// Starting from the non-excluded literals of the instance, each iteration shuffles the literals
    /// and removes them one by one, keeping a removal if the remaining literals are still a reason.
    /// The smallest reason found is returned.
    /// The time limit is checked between iterations; at least one iteration is run.
    pub fn tree_specific_reason(
        &self,
        n_iterations: usize,
        time_limit: Option<Duration>,
        seed: u64,
    ) -> Result<Explanation> {
        let (binaries, range) = self.state()?;
        let start = Instant::now();
        let excluded = self.excluded_literals();
        let candidates = binaries
            .literals()
            .iter()
            .copied()
            .filter(|l| !excluded.contains(l))
            .collect::<Vec<Literal>>();
        if !self.is_implicant(&candidates, range) {
            debug!("the non-excluded literals do not force the range; no tree-specific reason");
            return Ok(Explanation::unavailable(ReasonKind::TreeSpecific));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut best = candidates.clone();
        let mut interrupted = false;
        for i in 0..n_iterations.max(1) {
            if i > 0 && time_limit.map(|t| start.elapsed() >= t).unwrap_or(false) {
                interrupted = true;
                break;
            }
            let mut order = candidates.clone();
            order.shuffle(&mut rng);
            let mut kept = order.clone();
            for l in order {
                let without = kept
                    .iter()
                    .copied()
                    .filter(|k| *k != l)
                    .collect::<Vec<Literal>>();
                if self.is_implicant(&without, range) {
                    kept = without;
                }
            }
            if kept.len() < best.len() {
                best = kept;
            }
        }
        best.sort_unstable();
        debug!("tree-specific reason of size {}", best.len());
        Ok(Explanation::new(
            ReasonKind::TreeSpecific,
            vec![best],
            ElapsedTime::from_budget(start.elapsed(), time_limit, interrupted),
        ))
    }
}

impl InstanceExplainer for RegressionBoostedTreesExplainer<'_> {
    fn set_instance(&mut self, instance: &[f64]) -> Result<()> {
        let binaries = self.forest.binary_representation(instance)?;
        let prediction = self.forest.predict_binaries(&binaries);
        debug!("instance predicted as {}", prediction);
        self.instance = Some(instance.to_vec());
        self.binaries = Some(binaries);
        self.prediction = Some(prediction);
        self.range = Some((prediction, prediction));
        Ok(())
    }

    fn instance(&self) -> Option<&[f64]> {
        self.instance.as_deref()
    }

    fn binary_representation(&self) -> Option<&BinaryRepresentation> {
        self.binaries.as_ref()
    }

    fn set_excluded_features(&mut self, features: &[usize]) -> Result<()> {
        self.exclusions
            .set_features(features, self.forest.n_features())
    }

    fn exclude_literals(&mut self, literals: &[Literal]) {
        self.exclusions.add_literals(literals)
    }

    fn clear_exclusions(&mut self) {
        self.exclusions.clear()
    }

    fn excluded_literals(&self) -> Vec<Literal> {
        self.exclusions.literals(self.binaries.as_ref())
    }

    fn direct_reason(&self) -> Result<Explanation> {
        let (binaries, _) = self.state()?;
        let literals = self.forest.path_literals(binaries);
        let excluded = self.excluded_literals();
        if literals.iter().any(|l| excluded.contains(l)) {
            return Ok(Explanation::unavailable(ReasonKind::Direct));
        }
        Ok(Explanation::new(
            ReasonKind::Direct,
            vec![literals],
            ElapsedTime::zero(),
        ))
    }

    fn is_reason(&self, reason: &[Literal]) -> Result<bool> {
        let (_, range) = self.state()?;
        Ok(self.is_implicant(reason, range))
    }

    fn kind(&self) -> ExplainerKind {
        ExplainerKind::RegressionBoostedTrees
    }
}

use anyhow::{anyhow, Context, Result};
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString};

/// The ways preferred sufficient reasons can be weighted.
///
/// A preferred reason minimizes the sum of the weights of the features its literals test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, StrumDisplay, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum PreferredReasonMethod {
    /// Each literal has weight 1, leading to cardinality-minimal reasons
    Minimal,
    /// The weight of each feature is given by the user
    Weights,
    /// The weights are derived from the feature importances of the model; important features are cheaper
    FeatureImportance,
    /// The features are partitioned by preference; a reason avoids any feature of a later partition if it can
    InclusionPreferred,
}

/// Computes the weight of each feature for a preferred reason computation.
///
/// The weight of feature `f` is stored at index `f-1`.
/// Depending on the method, `weights` (one per feature), `features_partition` (each feature in exactly one part)
/// or `importances` (one per feature) must be provided.
/// `literals_per_feature` gives the number of literals of each feature that may appear in a reason;
/// it is used by the inclusion preferred scheme to make a single literal of a part heavier
/// than all the literals of the previous parts together.
pub fn compute_weights(
    method: PreferredReasonMethod,
    n_features: usize,
    weights: Option<&[u64]>,
    features_partition: Option<&[Vec<usize>]>,
    importances: Option<&[f64]>,
    literals_per_feature: &[usize],
) -> Result<Vec<u64>> {
    match method {
        PreferredReasonMethod::Minimal => Ok(vec![1; n_features]),
        PreferredReasonMethod::Weights => {
            let w = weights.ok_or_else(|| anyhow!("the weights method requires weights"))?;
            check_length(w.len(), n_features, "weights")?;
            if w.iter().any(|x| *x == 0) {
                return Err(anyhow!("weights must be positive"));
            }
            Ok(w.to_vec())
        }
        PreferredReasonMethod::FeatureImportance => {
            let imp = importances
                .ok_or_else(|| anyhow!("the model does not provide feature importances"))?;
            check_length(imp.len(), n_features, "feature importances")?;
            if imp.iter().any(|x| !x.is_finite()) {
                return Err(anyhow!("feature importances must be finite"));
            }
            let max = imp.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            imp.iter()
                .map(|i| {
                    ((100. * (max - i)).round() as u64)
                        .checked_add(1)
                        .ok_or_else(|| anyhow!("feature importances are too far apart"))
                })
                .collect()
        }
        PreferredReasonMethod::InclusionPreferred => {
            let partition = features_partition.ok_or_else(|| {
                anyhow!("the inclusion preferred method requires a partition of the features")
            })?;
            check_partition(partition, n_features).context("invalid features partition")?;
            let mut result = vec![0; n_features];
            let too_long = || anyhow!("partition too long for exact lexicographic weights");
            let mut lower_parts_total: u64 = 0;
            for part in partition {
                let weight = lower_parts_total.checked_add(1).ok_or_else(too_long)?;
                let n_literals = part
                    .iter()
                    .map(|f| literals_per_feature.get(f - 1).copied().unwrap_or(0) as u64)
                    .sum::<u64>();
                part.iter().for_each(|f| result[f - 1] = weight);
                lower_parts_total = n_literals
                    .checked_mul(weight)
                    .and_then(|w| w.checked_add(lower_parts_total))
                    .ok_or_else(too_long)?;
            }
            Ok(result)
        }
    }
}

fn check_length(actual: usize, expected: usize, what: &str) -> Result<()> {
    if actual != expected {
        return Err(anyhow!("expected {} {}, got {}", expected, what, actual));
    }
    Ok(())
}

fn check_partition(partition: &[Vec<usize>], n_features: usize) -> Result<()> {
    let mut seen = vec![false; n_features];
    for f in partition.iter().flatten() {
        if *f == 0 || *f > n_features {
            return Err(anyhow!("no such feature: {}", f));
        }
        if seen[f - 1] {
            return Err(anyhow!("feature {} appears more than once", f));
        }
        seen[f - 1] = true;
    }
    if let Some(i) = seen.iter().position(|s| !s) {
        return Err(anyhow!("feature {} is missing", i + 1));
    }
    Ok(())
}

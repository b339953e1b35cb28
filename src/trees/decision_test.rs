use super::BinaryRepresentation;
use crate::sat::{Literal, Variable};
use anyhow::{anyhow, Context, Result};
use std::{collections::HashMap, fmt::Display};
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString};

/// The comparison operators allowed in decision tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, StrumDisplay, EnumIter)]
pub enum Operator {
    /// Strictly lower than
    #[strum(to_string = "<")]
    Lt,
    /// Lower or equal to
    #[strum(to_string = "<=")]
    Le,
    /// Strictly greater than
    #[strum(to_string = ">")]
    Gt,
    /// Greater or equal to
    #[strum(to_string = ">=")]
    Ge,
    /// Equal to
    #[strum(to_string = "==")]
    Eq,
    /// Not equal to
    #[strum(to_string = "!=")]
    Ne,
}

impl Operator {
    /// Returns the operator which is satisfied exactly when this one is not.
    pub fn negate(self) -> Self {
        match self {
            Operator::Lt => Operator::Ge,
            Operator::Le => Operator::Gt,
            Operator::Gt => Operator::Le,
            Operator::Ge => Operator::Lt,
            Operator::Eq => Operator::Ne,
            Operator::Ne => Operator::Eq,
        }
    }

    /// Compares a value to a threshold.
    pub fn apply(self, value: f64, threshold: f64) -> bool {
        match self {
            Operator::Lt => value < threshold,
            Operator::Le => value <= threshold,
            Operator::Gt => value > threshold,
            Operator::Ge => value >= threshold,
            Operator::Eq => value == threshold,
            Operator::Ne => value != threshold,
        }
    }
}

/// A test made by an internal node of a tree, comparing a feature value to a threshold.
///
/// Features are identified by their 1-based index in the instances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionTest {
    feature: usize,
    operator: Operator,
    threshold: f64,
}

impl DecisionTest {
    /// Builds a new decision test.
    ///
    /// Fails if the feature index is null or the threshold is not a finite number.
    pub fn new(feature: usize, operator: Operator, threshold: f64) -> Result<Self> {
        if feature == 0 {
            return Err(anyhow!("feature indices start at 1"));
        }
        if !threshold.is_finite() {
            return Err(anyhow!("threshold must be a finite number"));
        }
        Ok(Self {
            feature,
            operator,
            threshold,
        })
    }

    /// Returns the (1-based) index of the tested feature.
    pub fn feature(&self) -> usize {
        self.feature
    }

    /// Returns the comparison operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the threshold the feature is compared to.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns the test satisfied exactly when this one is not.
    pub fn negate(&self) -> Self {
        Self {
            operator: self.operator.negate(),
            ..*self
        }
    }

    /// Evaluates this test on an instance.
    pub fn is_satisfied_by(&self, instance: &[f64]) -> Result<bool> {
        let value = instance.get(self.feature - 1).ok_or_else(|| {
            anyhow!(
                "instance has {} values, but feature {} is tested",
                instance.len(),
                self.feature
            )
        })?;
        Ok(self.operator.apply(*value, self.threshold))
    }

    fn key(&self) -> (usize, Operator, u64) {
        (self.feature, self.operator, self.threshold.to_bits())
    }
}

impl Display for DecisionTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "f{} {} {}", self.feature, self.operator, self.threshold)
    }
}

#[derive(Debug, Clone, Copy)]
struct Bound {
    value: f64,
    inclusive: bool,
}

// the set of values a feature may take given some tests on it
#[derive(Debug, Clone, Default)]
struct FeatureDomain {
    lower: Option<Bound>,
    upper: Option<Bound>,
    excluded: Vec<f64>,
}

impl FeatureDomain {
    fn restrict(&mut self, operator: Operator, threshold: f64) {
        match operator {
            Operator::Lt => self.restrict_upper(threshold, false),
            Operator::Le => self.restrict_upper(threshold, true),
            Operator::Gt => self.restrict_lower(threshold, false),
            Operator::Ge => self.restrict_lower(threshold, true),
            Operator::Eq => {
                self.restrict_lower(threshold, true);
                self.restrict_upper(threshold, true);
            }
            Operator::Ne => self.excluded.push(threshold),
        }
    }

    fn restrict_with_literal(&mut self, test: &DecisionTest, polarity: bool) {
        if polarity {
            self.restrict(test.operator, test.threshold)
        } else {
            self.restrict(test.operator.negate(), test.threshold)
        }
    }

    fn restrict_upper(&mut self, value: f64, inclusive: bool) {
        let tighter = match self.upper {
            None => true,
            Some(b) => value < b.value || (value == b.value && !inclusive),
        };
        if tighter {
            self.upper = Some(Bound { value, inclusive });
        }
    }

    fn restrict_lower(&mut self, value: f64, inclusive: bool) {
        let tighter = match self.lower {
            None => true,
            Some(b) => value > b.value || (value == b.value && !inclusive),
        };
        if tighter {
            self.lower = Some(Bound { value, inclusive });
        }
    }

    fn is_empty(&self) -> bool {
        match (self.lower, self.upper) {
            (Some(l), Some(u)) if l.value > u.value => true,
            (Some(l), Some(u)) if l.value == u.value => {
                !(l.inclusive && u.inclusive) || self.excluded.contains(&l.value)
            }
            _ => false,
        }
    }
}

/// The set of decision tests of a tree model.
///
/// Each distinct test is associated with a SAT variable; the variable of the test at index `i` is `i+1`.
/// A positive literal states the test is satisfied, a negative one that it is falsified.
/// Features are considered real-valued when reasoning on the relations between tests of a same feature.
#[derive(Debug, Clone, Default)]
pub struct TestRegistry {
    tests: Vec<DecisionTest>,
    test_to_var: HashMap<(usize, Operator, u64), Variable>,
}

impl TestRegistry {
    /// Registers a test and returns its variable.
    ///
    /// If the same test was already registered, its variable is returned.
    pub fn add_test(&mut self, test: DecisionTest) -> Variable {
        *self.test_to_var.entry(test.key()).or_insert_with(|| {
            self.tests.push(test);
            Variable::from(self.tests.len())
        })
    }

    /// Returns the variable of a test, if it was registered.
    pub fn var_of(&self, test: &DecisionTest) -> Option<Variable> {
        self.test_to_var.get(&test.key()).copied()
    }

    /// Returns the test associated with a variable, if any.
    pub fn test(&self, var: Variable) -> Option<&DecisionTest> {
        self.tests.get(usize::from(var) - 1)
    }

    /// Returns the number of registered tests.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns `true` iff no test was registered.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Iterates over the variables and their tests, in ascending variable order.
    pub fn iter(&self) -> impl Iterator<Item = (Variable, &DecisionTest)> + '_ {
        self.tests
            .iter()
            .enumerate()
            .map(|(i, t)| (Variable::from(i + 1), t))
    }

    /// Returns the feature tested by the literal, if its variable is known.
    pub fn feature_of(&self, l: Literal) -> Option<usize> {
        self.test(l.var()).map(|t| t.feature)
    }

    /// Returns the highest feature index involved in a test, or zero.
    pub fn max_feature(&self) -> usize {
        self.tests.iter().map(|t| t.feature).max().unwrap_or(0)
    }

    /// Returns the literals of the features in the provided list.
    pub fn vars_of_features(&self, features: &[usize]) -> Vec<Variable> {
        self.iter()
            .filter(|(_, t)| features.contains(&t.feature))
            .map(|(v, _)| v)
            .collect()
    }

    /// Evaluates every test on the instance and returns the signed literals.
    pub fn instance_to_binaries(&self, instance: &[f64]) -> Result<BinaryRepresentation> {
        let mut literals = Vec::with_capacity(self.tests.len());
        let mut features = Vec::with_capacity(self.tests.len());
        for (var, test) in self.iter() {
            let satisfied = test
                .is_satisfied_by(instance)
                .with_context(|| format!("while evaluating test {}", test))?;
            literals.push(var.literal(satisfied));
            features.push(test.feature);
        }
        Ok(BinaryRepresentation::new(literals, features))
    }

    /// Adds the tests of another registry to this one.
    ///
    /// The returned vector gives, for each variable of the other registry (at index `var-1`), its variable in this one.
    pub fn merge(&mut self, other: &TestRegistry) -> Vec<Variable> {
        other.tests.iter().map(|t| self.add_test(*t)).collect()
    }

    /// Decides if the value of a test is implied by a set of literals.
    ///
    /// Only the literals of tests on the same feature are considered.
    /// Returns [Option::None] if the test may be both satisfied and falsified, or if the variable is unknown.
    pub fn implied_value(&self, literals: &[Literal], var: Variable) -> Option<bool> {
        let test = self.test(var)?;
        let mut domain = self.feature_domain(literals, test.feature);
        let mut when_false = domain.clone();
        domain.restrict(test.operator, test.threshold);
        if domain.is_empty() {
            return Some(false);
        }
        when_false.restrict(test.operator.negate(), test.threshold);
        if when_false.is_empty() {
            return Some(true);
        }
        None
    }

    /// Returns `true` iff some instance satisfies all the literals.
    pub fn is_consistent(&self, literals: &[Literal]) -> bool {
        let mut features = literals
            .iter()
            .filter_map(|l| self.feature_of(*l))
            .collect::<Vec<usize>>();
        features.sort_unstable();
        features.dedup();
        features
            .iter()
            .all(|f| !self.feature_domain(literals, *f).is_empty())
    }

    fn feature_domain(&self, literals: &[Literal], feature: usize) -> FeatureDomain {
        let mut domain = FeatureDomain::default();
        for l in literals {
            if let Some(t) = self.test(l.var()) {
                if t.feature == feature {
                    domain.restrict_with_literal(t, l.is_positive());
                }
            }
        }
        domain
    }

    /// Returns a human readable form of a literal, like `f1 >= 0.5` for the negation of `f1 < 0.5`.
    pub fn describe_literal(&self, l: Literal) -> Option<String> {
        self.test(l.var()).map(|t| {
            if l.is_positive() {
                t.to_string()
            } else {
                t.negate().to_string()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn test(feature: usize, op: &str, threshold: f64) -> DecisionTest {
        DecisionTest::new(feature, Operator::from_str(op).unwrap(), threshold).unwrap()
    }

    #[test]
    fn test_operator_strings() {
        for op in Operator::iter() {
            assert_eq!(op, Operator::from_str(&op.to_string()).unwrap());
        }
        assert_eq!(">=", Operator::Ge.to_string());
        assert!(Operator::from_str("=>").is_err());
    }

    #[test]
    fn test_operator_negation() {
        for op in Operator::iter() {
            for value in [0.0, 0.5, 1.0] {
                assert_ne!(op.apply(value, 0.5), op.negate().apply(value, 0.5));
            }
        }
    }

    #[test]
    fn test_invalid_tests() {
        assert!(DecisionTest::new(0, Operator::Lt, 1.).is_err());
        assert!(DecisionTest::new(1, Operator::Lt, f64::NAN).is_err());
    }

    #[test]
    fn test_evaluate_out_of_range() {
        assert!(test(3, "<", 1.).is_satisfied_by(&[0., 0.]).is_err());
    }

    #[test]
    fn test_registry_dedup() {
        let mut registry = TestRegistry::default();
        let v1 = registry.add_test(test(1, ">", 0.5));
        let v2 = registry.add_test(test(2, ">", 0.5));
        let v3 = registry.add_test(test(1, ">", 0.5));
        assert_eq!(v1, v3);
        assert_ne!(v1, v2);
        assert_eq!(2, registry.len());
        assert_eq!(Some(2), registry.feature_of(Literal::from(-2)));
        assert_eq!(2, registry.max_feature());
    }

    #[test]
    fn test_instance_to_binaries() {
        let mut registry = TestRegistry::default();
        registry.add_test(test(1, ">", 0.5));
        registry.add_test(test(2, "<=", 3.));
        let binaries = registry.instance_to_binaries(&[1., 4.]).unwrap();
        assert_eq!(&[Literal::from(1), Literal::from(-2)], binaries.literals());
        assert!(registry.instance_to_binaries(&[1.]).is_err());
    }

    #[test]
    fn test_merge() {
        let mut r1 = TestRegistry::default();
        r1.add_test(test(1, ">", 0.5));
        let mut r2 = TestRegistry::default();
        r2.add_test(test(2, ">", 0.5));
        r2.add_test(test(1, ">", 0.5));
        let map = r1.merge(&r2);
        assert_eq!(vec![Variable::from(2), Variable::from(1)], map);
        assert_eq!(2, r1.len());
    }

    #[test]
    fn test_implied_value() {
        let mut registry = TestRegistry::default();
        let gt_05 = registry.add_test(test(1, ">", 0.5));
        let gt_1 = registry.add_test(test(1, ">", 1.));
        let le_05 = registry.add_test(test(1, "<=", 0.5));
        let eq_2 = registry.add_test(test(1, "==", 2.));
        let other = registry.add_test(test(2, ">", 0.5));
        assert_eq!(Some(true), registry.implied_value(&[gt_1.literal(true)], gt_05));
        assert_eq!(None, registry.implied_value(&[gt_05.literal(true)], gt_1));
        assert_eq!(Some(false), registry.implied_value(&[gt_05.literal(true)], le_05));
        assert_eq!(Some(true), registry.implied_value(&[gt_05.literal(false)], le_05));
        assert_eq!(Some(false), registry.implied_value(&[gt_1.literal(false)], eq_2));
        assert_eq!(Some(true), registry.implied_value(&[eq_2.literal(true)], gt_1));
        assert_eq!(None, registry.implied_value(&[gt_05.literal(true)], other));
        assert_eq!(Some(true), registry.implied_value(&[other.literal(true)], other));
    }

    #[test]
    fn test_is_consistent() {
        let mut registry = TestRegistry::default();
        let gt_05 = registry.add_test(test(1, ">", 0.5));
        let lt_05 = registry.add_test(test(1, "<", 0.5));
        let ne_05 = registry.add_test(test(1, "!=", 0.5));
        assert!(registry.is_consistent(&[gt_05.literal(false), lt_05.literal(false)]));
        assert!(!registry.is_consistent(&[
            gt_05.literal(false),
            lt_05.literal(false),
            ne_05.literal(true)
        ]));
        assert!(!registry.is_consistent(&[gt_05.literal(true), lt_05.literal(true)]));
    }

    #[test]
    fn test_describe_literal() {
        let mut registry = TestRegistry::default();
        let v = registry.add_test(test(1, "<", 0.5));
        assert_eq!("f1 < 0.5", registry.describe_literal(v.literal(true)).unwrap());
        assert_eq!("f1 >= 0.5", registry.describe_literal(v.literal(false)).unwrap());
        assert!(registry.describe_literal(Literal::from(2)).is_none());
    }
}

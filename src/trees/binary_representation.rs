use crate::sat::{Literal, Variable};

/// The literals an instance gives to the decision tests of a model.
///
/// The literal of the test associated with variable `v` is stored at index `v-1`,
/// so that the literals are ordered by ascending variable.
/// The feature tested by each literal is kept alongside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryRepresentation {
    literals: Vec<Literal>,
    features: Vec<usize>,
}

impl BinaryRepresentation {
    pub(crate) fn new(literals: Vec<Literal>, features: Vec<usize>) -> Self {
        Self { literals, features }
    }

    /// Returns the literals, in ascending variable order.
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    /// Returns the number of literals.
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// Returns `true` iff there is no literal.
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Returns `true` iff the literal belongs to this representation.
    pub fn contains(&self, l: Literal) -> bool {
        self.literal_of(l.var()) == Some(l)
    }

    /// Returns the literal of the variable, if the variable is in the scope of this representation.
    pub fn literal_of(&self, v: Variable) -> Option<Literal> {
        self.literals.get(usize::from(v) - 1).copied()
    }

    /// Returns the value of the variable, if the variable is in the scope of this representation.
    pub fn value_of(&self, v: Variable) -> Option<bool> {
        self.literal_of(v).map(|l| l.is_positive())
    }

    /// Returns the feature tested by the literal's variable, if it is in the scope of this representation.
    pub fn feature_of(&self, l: Literal) -> Option<usize> {
        self.features.get(usize::from(l.var()) - 1).copied()
    }

    /// Returns the literals which test one of the given features.
    pub fn literals_of_features(&self, features: &[usize]) -> Vec<Literal> {
        self.literals
            .iter()
            .zip(self.features.iter())
            .filter(|(_, f)| features.contains(f))
            .map(|(l, _)| *l)
            .collect()
    }
}

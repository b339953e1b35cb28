use super::{Literal, SatSolver};
use std::collections::BTreeMap;

/// A generalized totalizer encoding of a weighted sum of literals.
///
/// The encoding is a binary adder tree; each node owns one output literal per reachable partial sum.
/// An output literal is implied by the input literals whose weights add up to its value, so the outputs
/// can be used as assumptions to bound the sum from above.
///
/// Sums greater than the clamp value given at encoding time share the output of the clamp value.
pub(crate) struct GeneralizedTotalizer {
    outputs: BTreeMap<u64, Literal>,
}

impl GeneralizedTotalizer {
    /// Encodes the weighted sum into the solver.
    ///
    /// `next_var` is the first variable index the encoding may use; it is increased by the number of variables created.
    /// Inputs with a null weight are ignored.
    pub(crate) fn encode(
        inputs: &[(Literal, u64)],
        clamp: u64,
        solver: &mut dyn SatSolver,
        next_var: &mut usize,
    ) -> Self {
        let inputs = inputs
            .iter()
            .filter(|(_, w)| *w > 0)
            .map(|(l, w)| (*l, u64::min(*w, clamp)))
            .collect::<Vec<(Literal, u64)>>();
        let outputs = if inputs.is_empty() {
            BTreeMap::new()
        } else {
            encode_node(&inputs, clamp, solver, next_var)
        };
        Self { outputs }
    }

    /// Returns the assumptions that force the sum to be lower or equal to `ub`.
    pub(crate) fn enforce_ub(&self, ub: u64) -> Vec<Literal> {
        self.outputs
            .range(ub.saturating_add(1)..)
            .map(|(_, l)| l.negate())
            .collect()
    }
}

fn encode_node(
    inputs: &[(Literal, u64)],
    clamp: u64,
    solver: &mut dyn SatSolver,
    next_var: &mut usize,
) -> BTreeMap<u64, Literal> {
    if inputs.len() == 1 {
        return BTreeMap::from([(inputs[0].1, inputs[0].0)]);
    }
    let split = inputs.len() / 2;
    let left = encode_node(&inputs[..split], clamp, solver, next_var);
    let right = encode_node(&inputs[split..], clamp, solver, next_var);
    let mut outputs = BTreeMap::new();
    for (&value, &l) in left.iter().chain(right.iter()) {
        let o = output_for(&mut outputs, value, next_var);
        solver.add_clause(vec![l.negate(), o]);
    }
    for (&a, &la) in left.iter() {
        for (&b, &lb) in right.iter() {
            let o = output_for(
                &mut outputs,
                u64::min(a.saturating_add(b), clamp),
                next_var,
            );
            solver.add_clause(vec![la.negate(), lb.negate(), o]);
        }
    }
    outputs
}

fn output_for(outputs: &mut BTreeMap<u64, Literal>, value: u64, next_var: &mut usize) -> Literal {
    *outputs.entry(value).or_insert_with(|| {
        let l = Literal::from(*next_var as isize);
        *next_var += 1;
        l
    })
}

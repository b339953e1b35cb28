use super::{ExplainerKind, Explanation, ReasonKind};
use crate::sat::Literal;

/// An entry of an [ExplanationLog].
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    instance: Vec<f64>,
    explainer_kind: ExplainerKind,
    reason_kind: ReasonKind,
    reasons: Vec<Vec<Literal>>,
}

impl LogEntry {
    /// The explained instance.
    pub fn instance(&self) -> &[f64] {
        &self.instance
    }

    /// The kind of explainer that computed the reasons.
    pub fn explainer_kind(&self) -> ExplainerKind {
        self.explainer_kind
    }

    /// The kind of the reasons.
    pub fn reason_kind(&self) -> ReasonKind {
        self.reason_kind
    }

    /// The reasons.
    pub fn reasons(&self) -> &[Vec<Literal>] {
        &self.reasons
    }
}

/// An append-only record of the explanations computed so far.
///
/// The log is owned by the caller, which decides which explanations to record.
///
/// ```
/// # use xplatree::explainers::{DecisionTreeExplainer, ExplanationLog, InstanceExplainer};
/// # use xplatree::io::ModelReader;
/// let tree = ModelReader::default()
///     .read(&mut "p dt 1\nt\nn 1 1 > 0.5 2 3\nl 2 1\nl 3 0\n".as_bytes())
///     .unwrap()
///     .into_decision_tree()
///     .unwrap();
/// let mut explainer = DecisionTreeExplainer::new(&tree);
/// explainer.set_instance(&[1.]).unwrap();
/// let mut log = ExplanationLog::default();
/// log.record(&explainer, &explainer.direct_reason().unwrap()).unwrap();
/// assert_eq!(1, log.len());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplanationLog {
    entries: Vec<LogEntry>,
}

impl ExplanationLog {
    /// Appends an explanation computed by an explainer for its current instance.
    ///
    /// Fails if the explainer has no instance.
    pub fn record<E>(&mut self, explainer: &E, explanation: &Explanation) -> anyhow::Result<()>
    where
        E: super::InstanceExplainer + ?Sized,
    {
        let instance = explainer
            .instance()
            .ok_or_else(|| anyhow::anyhow!("no instance set"))?;
        self.entries.push(LogEntry {
            instance: instance.to_vec(),
            explainer_kind: explainer.kind(),
            reason_kind: explanation.kind(),
            reasons: explanation.reasons().to_vec(),
        });
        Ok(())
    }

    /// Returns the entries, oldest first.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` iff nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> + '_ {
        self.entries.iter()
    }
}

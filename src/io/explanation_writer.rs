use crate::{
    explainers::{Explanation, ReasonCount},
    sat::Literal,
    trees::TestRegistry,
};
use anyhow::{Context, Result};
use std::io::Write;

/// A writer for explanations.
///
/// The reasons are written this way:
///   * a comment line `c <kind> <number of reasons> <elapsed time>`, the elapsed time being `TIMEOUT` if the search was cut off
///   * each reason: the letter `r`, followed by its literals, separated by spaces
///   * for counts: the letter `s` followed by the number of reasons (or `UNKNOWN`), then, for each literal, the letter `v` followed by the literal and its count
///
/// If a test registry is given, the literals used by the reasons are described in trailing comment lines.
#[derive(Default)]
pub struct ExplanationWriter<'a> {
    registry: Option<&'a TestRegistry>,
}

impl<'a> ExplanationWriter<'a> {
    /// Builds a writer describing the literals of the reasons using the tests of a registry.
    pub fn new_with_registry(registry: &'a TestRegistry) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    /// Writes an explanation.
    pub fn write_explanation(&self, writer: &mut dyn Write, explanation: &Explanation) -> Result<()> {
        let context = "while writing an explanation";
        writeln!(
            writer,
            "c {} {} {}",
            explanation.kind(),
            explanation.reasons().len(),
            explanation.elapsed_time()
        )
        .context(context)?;
        for reason in explanation.reasons() {
            write!(writer, "r").context(context)?;
            reason
                .iter()
                .try_for_each(|l| write!(writer, " {}", l).context(context))?;
            writeln!(writer).context(context)?;
        }
        let mut literals = explanation
            .reasons()
            .iter()
            .flatten()
            .copied()
            .collect::<Vec<Literal>>();
        literals.sort_unstable();
        literals.dedup();
        self.write_descriptions(writer, &literals)?;
        writer.flush().context(context)
    }

    /// Writes a number of sufficient reasons.
    pub fn write_count(&self, writer: &mut dyn Write, count: &ReasonCount) -> Result<()> {
        let context = "while writing a count";
        writeln!(writer, "c count {}", count.elapsed_time()).context(context)?;
        match count.n_sufficient_reasons() {
            Some(n) => writeln!(writer, "s {}", n).context(context)?,
            None => writeln!(writer, "s UNKNOWN").context(context)?,
        }
        count
            .per_literal()
            .iter()
            .try_for_each(|(l, n)| writeln!(writer, "v {} {}", l, n).context(context))?;
        let literals = count.per_literal().keys().copied().collect::<Vec<Literal>>();
        self.write_descriptions(writer, &literals)?;
        writer.flush().context(context)
    }

    fn write_descriptions(&self, writer: &mut dyn Write, literals: &[Literal]) -> Result<()> {
        if let Some(registry) = self.registry {
            for l in literals {
                if let Some(d) = registry.describe_literal(*l) {
                    writeln!(writer, "c {}: {}", l, d).context("while describing a literal")?;
                }
            }
        }
        Ok(())
    }
}

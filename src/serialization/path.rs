use super::substream::{Substream, SubstreamType};
use std::fmt;
use std::ops::Deref;

/// The chain of steps from a column's root to the current recursion depth.
///
/// A path is scratch space owned by one traversal. It only changes through
/// strictly nested `push`/`pop` pairs, so after a recursive call returns the
/// path is exactly what it was before the call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubstreamPath {
    steps: Vec<Substream>,
}

impl SubstreamPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: impl Into<Substream>) {
        self.steps.push(step.into());
    }

    pub fn pop(&mut self) -> Option<Substream> {
        self.steps.pop()
    }

    /// Pushes `step`, runs `f` and pops the step again, whatever `f` returned.
    pub fn scoped<T>(&mut self, step: impl Into<Substream>, f: impl FnOnce(&mut Self) -> T) -> T {
        let depth = self.steps.len();
        self.push(step);
        let result = f(self);
        debug_assert_eq!(self.steps.len(), depth + 1, "unbalanced push/pop under {}", self);
        self.steps.truncate(depth);
        result
    }

    pub fn kinds(&self) -> impl Iterator<Item = SubstreamType> + '_ {
        self.steps.iter().map(|s| s.kind)
    }
}

impl Deref for SubstreamPath {
    type Target = [Substream];

    fn deref(&self) -> &[Substream] {
        &self.steps
    }
}

impl FromIterator<Substream> for SubstreamPath {
    fn from_iter<I: IntoIterator<Item = Substream>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Substream>> for SubstreamPath {
    fn from(steps: Vec<Substream>) -> Self {
        Self { steps }
    }
}

impl fmt::Display for SubstreamPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, step) in self.steps.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", step)?;
        }
        f.write_str("}")
    }
}

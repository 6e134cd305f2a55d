// src/simulation/results.rs
use std::fmt;

/// Classical values returned by one shot of an operation, in `return` order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ShotOutcome {
    values: Vec<u64>,
}

impl ShotOutcome {
    /// Wraps the returned register values.
    pub fn new(values: Vec<u64>) -> Self {
        Self { values }
    }

    /// Returned values in order.
    pub fn values(&self) -> &[u64] {
        &self.values
    }

    /// Number of returned values.
    pub fn arity(&self) -> usize {
        self.values.len()
    }
}

impl From<(u64, u64)> for ShotOutcome {
    fn from((a, b): (u64, u64)) -> Self {
        Self::new(vec![a, b])
    }
}

impl fmt::Display for ShotOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.values.iter().enumerate() {
            write!(f, "{}{}", if i > 0 { ", " } else { "" }, v)?;
        }
        write!(f, ")")
    }
}

/// Ordered per-shot outcomes of one execution request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionResult {
    shots: Vec<ShotOutcome>,
}

impl ExecutionResult {
    /// Creates a result from per-shot outcomes.
    pub fn new(shots: Vec<ShotOutcome>) -> Self {
        Self { shots }
    }

    /// Number of recorded shots.
    pub fn len(&self) -> usize {
        self.shots.len()
    }

    /// Returns `true` if no shot was recorded.
    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }

    /// Outcome of shot `index`, if present.
    pub fn get(&self, index: usize) -> Option<&ShotOutcome> {
        self.shots.get(index)
    }

    /// All outcomes in shot order.
    pub fn shots(&self) -> &[ShotOutcome] {
        &self.shots
    }
}

impl FromIterator<ShotOutcome> for ExecutionResult {
    fn from_iter<T: IntoIterator<Item = ShotOutcome>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Execution Results ({} shots):", self.shots.len())?;
        for (i, shot) in self.shots.iter().enumerate() {
            writeln!(f, "  {:04}: {}", i, shot)?;
        }
        Ok(())
    }
}

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done(String),
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub resource: String,
    pub outcome: Outcome,
}

/// What happened to each instance/volume touched by a batch command, in
/// processing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    entries: Vec<Entry>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, resource: &str, outcome: Outcome) {
        self.entries.push(Entry {
            resource: resource.to_string(),
            outcome,
        });
    }

    pub fn done(&mut self, resource: &str, detail: impl Into<String>) {
        self.push(resource, Outcome::Done(detail.into()));
    }

    pub fn skipped(&mut self, resource: &str, reason: impl Into<String>) {
        self.push(resource, Outcome::Skipped(reason.into()));
    }

    pub fn failed(&mut self, resource: &str, reason: impl ToString) {
        let reason = reason.to_string();
        log::error!("{resource}: {reason}");
        self.push(resource, Outcome::Failed(reason));
    }

    pub fn failures(&self) -> impl Iterator<Item = &Entry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, Outcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Outcome recorded last for `resource`, if any.
    pub fn outcome_of(&self, resource: &str) -> Option<&Outcome> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.resource == resource)
            .map(|e| &e.outcome)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (mut done, mut skipped, mut failed) = (0, 0, 0);
        for e in &self.entries {
            match e.outcome {
                Outcome::Done(_) => done += 1,
                Outcome::Skipped(_) => skipped += 1,
                Outcome::Failed(_) => failed += 1,
            }
        }
        write!(f, "{done} done, {skipped} skipped, {failed} failed")
    }
}

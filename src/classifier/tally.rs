use serde::{Deserialize, Serialize};

/// Vote counts per label, kept in first-vote order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    counts: Vec<(String, usize)>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: &str) {
        match self.counts.iter_mut().find(|(existing, _)| existing == label) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((label.to_string(), 1)),
        }
    }

    /// Label with the most votes; ties go to the label voted first
    pub fn winner(&self) -> Option<(&str, usize)> {
        let mut best: Option<(&str, usize)> = None;
        for (label, count) in &self.counts {
            if best.map_or(true, |(_, best_count)| *count > best_count) {
                best = Some((label.as_str(), *count));
            }
        }
        best
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    pub fn count(&self, label: &str) -> usize {
        self.counts
            .iter()
            .find(|(existing, _)| existing == label)
            .map_or(0, |(_, count)| *count)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(label, count)| (label.as_str(), *count))
    }
}

impl<S: AsRef<str>> FromIterator<S> for VoteTally {
    fn from_iter<I: IntoIterator<Item = S>>(labels: I) -> Self {
        let mut tally = Self::new();
        for label in labels {
            tally.add(label.as_ref());
        }
        tally
    }
}

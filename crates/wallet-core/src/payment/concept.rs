//! Mobile-payment concept matching.
//!
//! The rule is a fixed-string heuristic and is kept exactly as lenient as it
//! has always been: a concept is accepted when, after normalization, it equals,
//! contains, or is contained by any accepted form.

/// Trims, uppercases and removes all whitespace.
pub fn normalize(concept: &str) -> String {
    concept
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

#[derive(Debug, Clone)]
pub struct ConceptMatcher {
    accepted: Vec<String>,
}

impl ConceptMatcher {
    /// Builds a matcher over the normalized, deduplicated accepted forms.
    pub fn new<I, S>(accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for entry in accepted {
            let entry = normalize(entry.as_ref());
            if !entry.is_empty() && !normalized.contains(&entry) {
                normalized.push(entry);
            }
        }
        Self {
            accepted: normalized,
        }
    }

    pub fn accepted(&self) -> &[String] {
        &self.accepted
    }

    /// An empty concept never matches; required-field validation rejects it
    /// before matching is reached.
    pub fn matches(&self, concept: &str) -> bool {
        let concept = normalize(concept);
        if concept.is_empty() {
            return false;
        }
        self.accepted
            .iter()
            .any(|entry| *entry == concept || concept.contains(entry.as_str()) || entry.contains(&concept))
    }
}

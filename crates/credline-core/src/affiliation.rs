//! Institution membership test for author mentions

/// Decides whether a raw affiliation belongs to the institution of
/// interest. The only place in the pipeline that looks at affiliation
/// text; everything downstream consumes `AuthorMention::is_affiliated`.
#[derive(Debug, Clone)]
pub struct AffiliationClassifier {
    /// Lowercased institution token
    token: String,
}

impl AffiliationClassifier {
    pub fn new(institution: &str) -> Self {
        Self {
            token: institution.trim().to_lowercase(),
        }
    }

    /// Case-insensitive substring test. An empty token matches nothing.
    pub fn classify(&self, raw_affiliation: &str) -> bool {
        !self.token.is_empty() && raw_affiliation.to_lowercase().contains(&self.token)
    }
}

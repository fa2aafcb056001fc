use std::fmt;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

/// Which points take part in queries, clusters and labels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ClusterFilter {
    #[default]
    All,
    Cluster(String),
}

impl ClusterFilter {
    pub fn admits(&self, label: &str) -> bool {
        match self {
            Self::All => true,
            Self::Cluster(wanted) => wanted == label,
        }
    }
}

impl fmt::Display for ClusterFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Cluster(label) => f.write_str(label),
        }
    }
}

/// A cluster a filter query can resolve to.
#[derive(Clone, Copy, Debug)]
pub struct FilterCandidate<'a> {
    pub label: &'a str,
    pub display_name: &'a str,
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Turns free text from the filter box into a filter.
///
/// Empty input and `all` select everything. An exact (case-insensitive) label
/// or display name wins outright; otherwise the best fuzzy score across label
/// and display name is taken, ties going to the alphabetically first label.
/// `None` means nothing matched.
pub fn resolve_filter<'a>(
    query: &str,
    candidates: impl IntoIterator<Item = FilterCandidate<'a>>,
) -> Option<ClusterFilter> {
    let query = query.trim();
    if query.is_empty() || query.eq_ignore_ascii_case("all") {
        return Some(ClusterFilter::All);
    }

    let mut candidates = candidates.into_iter().collect::<Vec<_>>();
    candidates.sort_by(|a, b| a.label.cmp(b.label));

    let folded = query.to_lowercase();
    if let Some(exact) = candidates.iter().find(|candidate| {
        candidate.label.to_lowercase() == folded || candidate.display_name.to_lowercase() == folded
    }) {
        return Some(ClusterFilter::Cluster(exact.label.to_owned()));
    }

    let matcher = SkimMatcherV2::default();
    let mut best: Option<(i64, &str)> = None;
    for candidate in &candidates {
        let score = [candidate.label, candidate.display_name]
            .into_iter()
            .filter_map(|text| fuzzy_match_score(&matcher, text, query))
            .max();
        if let Some(score) = score
            && best.is_none_or(|(top, _)| score > top)
        {
            best = Some((score, candidate.label));
        }
    }

    best.map(|(_, label)| ClusterFilter::Cluster(label.to_owned()))
}

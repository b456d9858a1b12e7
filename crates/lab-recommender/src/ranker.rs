/// Lab recommendation ranking.
///
/// Scores every catalog lab against the candidate keywords, keeps labs that are either
/// textually similar or share an exact keyword, sorts by similarity and then picks the
/// final list in two passes: a per-organization quota pass followed by a backfill pass.
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::catalog::LabCatalog;
use crate::model::{Lab, RankedLab};
use crate::similarity::{Alignment, TermVector};

pub const DEFAULT_TOP_N: usize = 10;
/// Labs one organization may place in the quota pass.
pub const ORGANIZATION_QUOTA: usize = 4;
/// Similarity a lab must exceed to be kept without an exact keyword match.
pub const MIN_SIMILARITY: f64 = 0.0001;

pub struct LabRanker {
    catalog: Arc<LabCatalog>,
    lab_vectors: Vec<TermVector>,
    alignment: Alignment,
}

impl LabRanker {
    pub fn new(catalog: Arc<LabCatalog>, alignment: Alignment) -> Self {
        let lab_vectors = catalog
            .labs()
            .iter()
            .map(|lab| TermVector::from_text(&lab.match_text()))
            .collect();
        Self {
            catalog,
            lab_vectors,
            alignment,
        }
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn catalog(&self) -> &Arc<LabCatalog> {
        &self.catalog
    }

    /// Top `top_n` labs for the candidate keywords, in selection order.
    ///
    /// Never fails: no usable keywords or no qualifying labs give an empty list.
    pub fn rank<S: AsRef<str>>(&self, candidate_keywords: &[S], top_n: usize) -> Vec<RankedLab> {
        let keywords: Vec<&str> = candidate_keywords.iter().map(AsRef::as_ref).collect();
        if top_n == 0 || keywords.iter().all(|k| k.trim().is_empty()) {
            return Vec::new();
        }

        let candidate_vector = TermVector::from_text(&keywords.join(" "));
        let candidate_terms = normalized_keywords(&keywords);

        let mut scored: Vec<RankedLab> = self
            .catalog
            .labs()
            .iter()
            .zip(&self.lab_vectors)
            .filter_map(|(lab, lab_vector)| {
                let similarity_score = candidate_vector.similarity(lab_vector, self.alignment);
                let matching_keywords = matching_keywords(&candidate_terms, lab);
                let keep = similarity_score > MIN_SIMILARITY || !matching_keywords.is_empty();
                keep.then(|| RankedLab {
                    lab: lab.clone(),
                    similarity_score,
                    match_count: matching_keywords.len(),
                    matching_keywords,
                })
            })
            .collect();

        sort_by_similarity(&mut scored);
        select_diversified(scored, top_n, ORGANIZATION_QUOTA)
    }
}

/// Candidate keywords lowercased and trimmed, blanks dropped, first occurrence kept.
pub fn normalized_keywords(keywords: &[&str]) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty() && seen.insert(k.clone()))
        .collect()
}

/// Candidate terms that appear verbatim (case-insensitively) in the lab's keyword list.
pub fn matching_keywords(candidate_terms: &[String], lab: &Lab) -> Vec<String> {
    let lab_terms: HashSet<String> = lab.keyword_list().map(str::to_lowercase).collect();
    candidate_terms
        .iter()
        .filter(|term| lab_terms.contains(term.as_str()))
        .cloned()
        .collect()
}

/// Descending by similarity; equal scores keep their relative order.
pub fn sort_by_similarity(labs: &mut [RankedLab]) {
    labs.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(Ordering::Equal)
    });
}

/// Quota pass over a similarity-sorted list.
///
/// Organizations are visited in the order they first appear; each contributes its best
/// `quota` labs until `top_n` slots are used. Returns indices into `sorted`.
pub fn quota_pass(sorted: &[RankedLab], top_n: usize, quota: usize) -> Vec<usize> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, ranked) in sorted.iter().enumerate() {
        let org = ranked.lab.organization.as_str();
        groups
            .entry(org)
            .or_insert_with(|| {
                order.push(org);
                Vec::new()
            })
            .push(idx);
    }

    let mut selected = Vec::with_capacity(top_n.min(sorted.len()));
    for org in order {
        let remaining = top_n - selected.len();
        if remaining == 0 {
            break;
        }
        let group = &groups[org];
        selected.extend(group.iter().take(quota.min(remaining)));
    }
    selected
}

/// Backfill pass: the best labs not already `selected`, in sorted order, up to `slots`.
pub fn backfill_pass(sorted: &[RankedLab], selected: &[usize], slots: usize) -> Vec<usize> {
    let taken: HashSet<usize> = selected.iter().copied().collect();
    (0..sorted.len())
        .filter(|idx| !taken.contains(idx))
        .take(slots)
        .collect()
}

/// Runs both passes and returns the chosen labs in selection order.
pub fn select_diversified(sorted: Vec<RankedLab>, top_n: usize, quota: usize) -> Vec<RankedLab> {
    let mut picks = quota_pass(&sorted, top_n, quota);
    let slots = top_n.saturating_sub(picks.len());
    if slots > 0 {
        let backfill = backfill_pass(&sorted, &picks, slots);
        picks.extend(backfill);
    }

    let mut pool: Vec<Option<RankedLab>> = sorted.into_iter().map(Some).collect();
    picks
        .into_iter()
        .filter_map(|idx| pool.get_mut(idx).and_then(Option::take))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::lab;

    fn ranker(labs: Vec<Lab>, alignment: Alignment) -> LabRanker {
        let catalog = LabCatalog::from_labs(labs).expect("valid catalog");
        LabRanker::new(Arc::new(catalog), alignment)
    }

    fn ranked(id: &str, organization: &str, score: f64) -> RankedLab {
        RankedLab {
            lab: lab(id, organization, "", ""),
            similarity_score: score,
            matching_keywords: Vec::new(),
            match_count: 0,
        }
    }

    fn ids(results: &[RankedLab]) -> Vec<&str> {
        results.iter().map(|r| r.lab.id.as_str()).collect()
    }

    #[test]
    fn robotics_example_matches_exactly_one_keyword() {
        let r = ranker(
            vec![lab("mit-1", "MIT", "Robotics, Control Theory", "")],
            Alignment::Positional,
        );
        let results = r.rank(&["Robotics", "Machine Learning"], DEFAULT_TOP_N);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matching_keywords, vec!["robotics"]);
        assert_eq!(results[0].match_count, 1);

        // candidate: robotics, machine, learning -> [1, 1, 1]
        // lab: "robotics,", "control", "theory" -> [1, 1, 1]
        let expected = 3.0 / (3.0_f64.sqrt() * 3.0_f64.sqrt());
        assert!((results[0].similarity_score - expected).abs() < 1e-12);
    }

    #[test]
    fn empty_candidates_give_empty_results() {
        let r = ranker(
            (0..5).map(|i| lab(&format!("l{i}"), "MIT", "robotics", "robots")).collect(),
            Alignment::Positional,
        );
        let none: [&str; 0] = [];
        assert!(r.rank(&none, 10).is_empty());
        assert!(r.rank(&["   ", ""], 10).is_empty());
        assert!(r.rank(&["robotics"], 0).is_empty());
    }

    #[test]
    fn filter_drops_labs_without_similarity_or_overlap() {
        let r = ranker(
            vec![
                lab("empty", "MIT", "", ""),
                lab("hit", "MIT", "Vision", "cameras"),
                lab("stop-words-only", "Yale", "the, and", "of the"),
            ],
            Alignment::SharedVocabulary,
        );
        let results = r.rank(&["vision"], 10);
        assert_eq!(ids(&results), vec!["hit"]);
        for res in &results {
            assert!(res.similarity_score > MIN_SIMILARITY || res.match_count > 0);
        }
    }

    #[test]
    fn exact_match_keeps_lab_even_without_similarity() {
        // Stop words leave both vectors empty.
        let r = ranker(vec![lab("x", "MIT", "the", "")], Alignment::SharedVocabulary);
        let results = r.rank(&["The"], 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].similarity_score, 0.0);
        assert_eq!(results[0].matching_keywords, vec!["the"]);
    }

    #[test]
    fn matching_keywords_dedupe_case_variants() {
        let r = ranker(vec![lab("a", "MIT", "Robotics, SLAM", "")], Alignment::Positional);
        let results = r.rank(&["robotics", " ROBOTICS ", "slam", "Slam"], 10);
        assert_eq!(results[0].matching_keywords, vec!["robotics", "slam"]);
        assert_eq!(results[0].match_count, results[0].matching_keywords.len());
    }

    #[test]
    fn quota_pass_caps_each_organization() {
        let sorted: Vec<RankedLab> = (0..6)
            .map(|i| ranked(&format!("a{i}"), "A", 1.0 - i as f64 * 0.01))
            .chain((0..2).map(|i| ranked(&format!("b{i}"), "B", 0.5 - i as f64 * 0.01)))
            .collect();

        let picks = quota_pass(&sorted, 10, ORGANIZATION_QUOTA);
        assert_eq!(picks, vec![0, 1, 2, 3, 6, 7]);

        let backfill = backfill_pass(&sorted, &picks, 10 - picks.len());
        assert_eq!(backfill, vec![4, 5]);
    }

    #[test]
    fn quota_pass_respects_budget_mid_group() {
        let sorted = vec![
            ranked("a0", "A", 0.9),
            ranked("b0", "B", 0.8),
            ranked("a1", "A", 0.7),
            ranked("b1", "B", 0.6),
        ];
        assert_eq!(quota_pass(&sorted, 3, ORGANIZATION_QUOTA), vec![0, 2, 1]);
        assert!(quota_pass(&sorted, 0, ORGANIZATION_QUOTA).is_empty());
    }

    #[test]
    fn ten_labs_three_organizations_top_six() {
        // Organization A leads with 4 qualifying labs, B and C follow with 3 each.
        let sorted = vec![
            ranked("a0", "A", 0.95),
            ranked("a1", "A", 0.90),
            ranked("b0", "B", 0.85),
            ranked("a2", "A", 0.80),
            ranked("a3", "A", 0.75),
            ranked("c0", "C", 0.70),
            ranked("b1", "B", 0.65),
            ranked("b2", "B", 0.60),
            ranked("c1", "C", 0.55),
            ranked("c2", "C", 0.50),
        ];
        let results = select_diversified(sorted, 6, ORGANIZATION_QUOTA);
        assert_eq!(ids(&results), vec!["a0", "a1", "a2", "a3", "b0", "b1"]);

        let mut per_org: HashMap<&str, usize> = HashMap::new();
        for r in &results {
            *per_org.entry(r.lab.organization.as_str()).or_default() += 1;
        }
        assert!(per_org.values().all(|&n| n <= ORGANIZATION_QUOTA));
    }

    #[test]
    fn ten_labs_three_organizations_top_six_through_rank() {
        // Each filler word lowers the score: 1 / sqrt(1 + fillers).
        let filler = |n: usize| (0..n).map(|i| format!("f{i}")).collect::<Vec<_>>().join(" ");
        let layout = [
            ("c2", "C", 9),
            ("b0", "B", 2),
            ("a3", "A", 4),
            ("c0", "C", 5),
            ("a0", "A", 0),
            ("b2", "B", 7),
            ("a2", "A", 3),
            ("c1", "C", 8),
            ("a1", "A", 1),
            ("b1", "B", 6),
        ];
        let labs = layout
            .iter()
            .map(|(id, org, n)| lab(id, org, "Robotics", &filler(*n)))
            .collect();
        let r = ranker(labs, Alignment::SharedVocabulary);

        let results = r.rank(&["robotics"], 6);
        assert_eq!(ids(&results), vec!["a0", "a1", "a2", "a3", "b0", "b1"]);
        assert!(results.iter().all(|res| res.match_count == 1));

        let mut per_org: HashMap<&str, usize> = HashMap::new();
        for res in &results {
            *per_org.entry(res.lab.organization.as_str()).or_default() += 1;
        }
        assert_eq!(per_org.get("A"), Some(&4));
        assert_eq!(per_org.get("B"), Some(&2));
        assert_eq!(per_org.get("C"), None);
    }

    #[test]
    fn backfill_fills_slots_left_by_small_catalogs() {
        let sorted = vec![
            ranked("a0", "A", 0.9),
            ranked("a1", "A", 0.8),
            ranked("a2", "A", 0.7),
            ranked("a3", "A", 0.6),
            ranked("a4", "A", 0.5),
            ranked("a5", "A", 0.4),
            ranked("b0", "B", 0.3),
        ];
        let results = select_diversified(sorted, 7, ORGANIZATION_QUOTA);
        assert_eq!(ids(&results), vec!["a0", "a1", "a2", "a3", "b0", "a4", "a5"]);
    }

    #[test]
    fn rank_output_is_bounded_unique_and_ordered_within_organizations() {
        let organizations = ["MIT", "Stanford University", "Yale University"];
        let labs: Vec<Lab> = (0..30)
            .map(|i| {
                let org = organizations[i % organizations.len()];
                let keywords = if i % 2 == 0 {
                    "Robotics, Machine Learning"
                } else {
                    "Machine Learning"
                };
                let description = "learning ".repeat(i % 7 + 1);
                lab(&format!("lab-{i}"), org, keywords, &description)
            })
            .collect();
        let total = labs.len();

        for alignment in [Alignment::Positional, Alignment::SharedVocabulary] {
            let r = ranker(labs.clone(), alignment);
            for top_n in [1, 5, 6, 12, 50] {
                let results = r.rank(&["Robotics", "machine learning"], top_n);
                assert!(results.len() <= top_n);
                assert!(results.len() <= total);

                let unique: HashSet<&str> = results.iter().map(|x| x.lab.id.as_str()).collect();
                assert_eq!(unique.len(), results.len());

                for org in organizations {
                    let scores: Vec<f64> = results
                        .iter()
                        .filter(|x| x.lab.organization == org)
                        .map(|x| x.similarity_score)
                        .collect();
                    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
                }
            }
        }
    }

    #[test]
    fn ranking_is_idempotent() {
        let labs: Vec<Lab> = (0..12)
            .map(|i| {
                lab(
                    &format!("lab-{i}"),
                    if i % 3 == 0 { "A" } else { "B" },
                    "Computer Vision, Robotics",
                    &"perception ".repeat(i + 1),
                )
            })
            .collect();
        let r = ranker(labs, Alignment::Positional);
        let keywords = vec!["Computer Vision".to_string(), "robotics".to_string()];
        assert_eq!(r.rank(&keywords, 8), r.rank(&keywords, 8));
    }

    #[test]
    fn ties_keep_catalog_order() {
        let r = ranker(
            vec![
                lab("first", "A", "Robotics", ""),
                lab("second", "A", "Robotics", ""),
                lab("third", "A", "Robotics", ""),
            ],
            Alignment::SharedVocabulary,
        );
        let results = r.rank(&["robotics"], 3);
        assert_eq!(ids(&results), vec!["first", "second", "third"]);
    }
}

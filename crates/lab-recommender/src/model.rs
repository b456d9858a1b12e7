use serde::{Deserialize, Serialize};

use lab_common::api::{LabDetail, LabRecommendation};

/// A research lab as listed in the catalog.
///
/// Catalogs exported by the crawler use `university`, `major` and `introduction`;
/// those names are accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lab {
    pub id: String,
    pub name: String,
    #[serde(alias = "university")]
    pub organization: String,
    #[serde(alias = "major", default)]
    pub department: String,
    /// Comma-separated free-text research terms.
    #[serde(default)]
    pub keywords: String,
    #[serde(alias = "introduction", default)]
    pub description: String,
}

impl Lab {
    /// The lab's keyword list: comma-split, trimmed, empty entries dropped.
    pub fn keyword_list(&self) -> impl Iterator<Item = &str> {
        self.keywords.split(',').map(str::trim).filter(|k| !k.is_empty())
    }

    /// Text the similarity vector is built from.
    pub fn match_text(&self) -> String {
        format!("{} {}", self.keywords, self.description)
    }
}

/// A lab scored against one set of candidate keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedLab {
    #[serde(flatten)]
    pub lab: Lab,
    pub similarity_score: f64,
    pub matching_keywords: Vec<String>,
    pub match_count: usize,
}

impl From<&Lab> for LabDetail {
    fn from(lab: &Lab) -> Self {
        LabDetail {
            id: lab.id.clone(),
            name: lab.name.clone(),
            organization: lab.organization.clone(),
            department: lab.department.clone(),
            keywords: lab.keywords.clone(),
            description: lab.description.clone(),
        }
    }
}

impl From<RankedLab> for LabRecommendation {
    fn from(ranked: RankedLab) -> Self {
        LabRecommendation {
            lab: LabDetail::from(&ranked.lab),
            similarity_score: ranked.similarity_score,
            matching_keywords: ranked.matching_keywords,
            match_count: ranked.match_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_crawler_field_names_and_missing_text() {
        let raw = r#"{"id":"lab-1","name":"Prof. Kim","university":"Stanford","major":"Computer Science"}"#;
        let lab: Lab = serde_json::from_str(raw).expect("valid lab");
        assert_eq!(lab.organization, "Stanford");
        assert_eq!(lab.department, "Computer Science");
        assert_eq!(lab.keywords, "");
        assert_eq!(lab.description, "");
        assert_eq!(lab.keyword_list().count(), 0);
    }

    #[test]
    fn keyword_list_trims_and_skips_blanks() {
        let lab = Lab {
            id: "lab-1".to_string(),
            name: "x".to_string(),
            organization: "MIT".to_string(),
            department: String::new(),
            keywords: " Robotics ,Control Theory,, ".to_string(),
            description: String::new(),
        };
        let list: Vec<&str> = lab.keyword_list().collect();
        assert_eq!(list, vec!["Robotics", "Control Theory"]);
    }
}

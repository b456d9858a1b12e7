/// Immutable lab catalog.
///
/// Built once at startup from either a JSON export or the crawler's analysis directory,
/// then shared read-only (`Arc<LabCatalog>`) by the ranker and the serving surfaces.
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::model::Lab;
use crate::parser;

#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationSummary {
    pub name: String,
    pub lab_count: usize,
    pub departments: Vec<String>,
}

#[derive(Debug)]
pub struct LabCatalog {
    labs: Vec<Lab>,
    by_id: HashMap<String, usize>,
    fingerprint: String,
}

impl LabCatalog {
    /// Catalog order is preserved; ids must be non-empty and unique.
    pub fn from_labs(labs: Vec<Lab>) -> Result<Self, AppError> {
        let mut by_id = HashMap::with_capacity(labs.len());
        for (idx, lab) in labs.iter().enumerate() {
            if lab.id.trim().is_empty() {
                return Err(AppError::Catalog(format!(
                    "lab at position {idx} ('{}') has an empty id",
                    lab.name
                )));
            }
            if by_id.insert(lab.id.clone(), idx).is_some() {
                return Err(AppError::Catalog(format!("duplicate lab id: {}", lab.id)));
            }
        }

        let fingerprint = fingerprint(&labs)?;
        Ok(Self {
            labs,
            by_id,
            fingerprint,
        })
    }

    /// A `.json` file holds an array of labs; a directory holds crawler analysis files.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if path.is_dir() {
            return Self::from_labs(parser::parse_crawl_directory(path)?);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Catalog(format!("failed to read {}: {e}", path.display())))?;
        let labs: Vec<Lab> = serde_json::from_str(&content).map_err(|e| AppError::Parse {
            file: path.display().to_string(),
            line: e.line(),
            message: e.to_string(),
        })?;
        Self::from_labs(labs)
    }

    pub fn labs(&self) -> &[Lab] {
        &self.labs
    }

    pub fn len(&self) -> usize {
        self.labs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labs.is_empty()
    }

    /// Exact id lookup, falling back to a case-insensitive match.
    pub fn get(&self, id: &str) -> Option<&Lab> {
        self.by_id
            .get(id)
            .map(|&idx| &self.labs[idx])
            .or_else(|| self.labs.iter().find(|lab| lab.id.eq_ignore_ascii_case(id)))
    }

    /// Organizations sorted by name, with their distinct departments.
    pub fn organizations(&self) -> Vec<OrganizationSummary> {
        let mut grouped: BTreeMap<&str, (usize, BTreeSet<&str>)> = BTreeMap::new();
        for lab in &self.labs {
            let entry = grouped.entry(lab.organization.as_str()).or_default();
            entry.0 += 1;
            if !lab.department.is_empty() {
                entry.1.insert(lab.department.as_str());
            }
        }
        grouped
            .into_iter()
            .map(|(name, (lab_count, departments))| OrganizationSummary {
                name: name.to_string(),
                lab_count,
                departments: departments.into_iter().map(str::to_string).collect(),
            })
            .collect()
    }

    /// Hex SHA-256 of the serialized catalog; changes whenever any lab changes.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn fingerprint(labs: &[Lab]) -> Result<String, AppError> {
    let json = serde_json::to_vec(labs)
        .map_err(|e| AppError::Catalog(format!("failed to serialize catalog: {e}")))?;
    Ok(format!("{:x}", Sha256::digest(&json)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn lab(id: &str, organization: &str, keywords: &str, description: &str) -> Lab {
        Lab {
            id: id.to_string(),
            name: format!("Lab {id}"),
            organization: organization.to_string(),
            department: "Computer Science".to_string(),
            keywords: keywords.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn rejects_duplicate_and_empty_ids() {
        let dup = LabCatalog::from_labs(vec![lab("a", "MIT", "", ""), lab("a", "Yale", "", "")]);
        assert!(matches!(dup, Err(AppError::Catalog(msg)) if msg.contains("duplicate")));

        let empty = LabCatalog::from_labs(vec![lab(" ", "MIT", "", "")]);
        assert!(matches!(empty, Err(AppError::Catalog(_))));
    }

    #[test]
    fn lookup_is_exact_then_case_insensitive() {
        let catalog =
            LabCatalog::from_labs(vec![lab("mit-cs-1", "MIT", "", ""), lab("yale-me-1", "Yale", "", "")])
                .expect("valid catalog");
        assert_eq!(catalog.get("mit-cs-1").map(|l| l.organization.as_str()), Some("MIT"));
        assert_eq!(catalog.get("YALE-ME-1").map(|l| l.id.as_str()), Some("yale-me-1"));
        assert!(catalog.get("nope").is_none());
    }

    #[test]
    fn organizations_are_grouped_and_sorted() {
        let mut other = lab("y1", "Yale", "", "");
        other.department = "Applied Physics".to_string();
        let catalog = LabCatalog::from_labs(vec![
            lab("y2", "Yale", "", ""),
            lab("m1", "MIT", "", ""),
            other,
        ])
        .expect("valid catalog");

        let orgs = catalog.organizations();
        assert_eq!(orgs.len(), 2);
        assert_eq!(orgs[0].name, "MIT");
        assert_eq!(orgs[1].lab_count, 2);
        assert_eq!(orgs[1].departments, vec!["Applied Physics", "Computer Science"]);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = LabCatalog::from_labs(vec![lab("a", "MIT", "robotics", "")]).expect("valid");
        let b = LabCatalog::from_labs(vec![lab("a", "MIT", "robotics", "")]).expect("valid");
        let c = LabCatalog::from_labs(vec![lab("a", "MIT", "vision", "")]).expect("valid");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn load_json_export() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("labs.json");
        std::fs::write(
            &path,
            r#"[{"id":"mit-cs-1","name":"Jane","university":"MIT","major":"Computer Science",
                "keywords":"Robotics, Control Theory","introduction":"Legged robots."}]"#,
        )
        .expect("write");

        let catalog = LabCatalog::load(&path).expect("load should succeed");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.labs()[0].description, "Legged robots.");
    }

    #[test]
    fn load_reports_json_errors_with_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("labs.json");
        std::fs::write(&path, "[\n{\"id\": }\n]").expect("write");
        match LabCatalog::load(&path) {
            Err(AppError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}

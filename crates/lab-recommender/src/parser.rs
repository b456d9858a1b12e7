use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{info, warn};

use crate::error::AppError;
use crate::model::Lab;

/// Department abbreviations used as analysis file stems by the crawler.
const DEPARTMENT_NAMES: &[(&str, &str)] = &[
    ("aeronautics and astronautics", "Aeronautics and Astronautics"),
    ("ap", "Applied Physics"),
    ("be", "Bioengineering"),
    ("bioengineering", "Bioengineering"),
    ("cee", "Civil and Environmental Engineering"),
    ("cheme", "Chemical Engineering"),
    ("cs", "Computer Science"),
    ("dmse", "Materials Science and Engineering"),
    ("ece", "Electrical and Computer Engineering"),
    ("ee", "Electrical Engineering"),
    ("icme", "Institute for Computational & Mathematical Engineering"),
    ("imes", "Institute for Medical Engineering and Science"),
    ("me", "Mechanical Engineering"),
    ("meche", "Mechanical Engineering"),
    ("ms", "Materials Science"),
    ("msande", "Management Science and Engineering"),
    ("mse", "Materials Science and Engineering"),
    ("nse", "Nuclear Science and Engineering"),
];

/// Crawler output directories and the organization they hold.
const ORGANIZATION_NAMES: &[(&str, &str)] = &[
    ("berkeley", "UC Berkeley"),
    ("caltech", "Caltech"),
    ("mit", "Massachusetts Institute of Technology"),
    ("stanford", "Stanford University"),
    ("yale", "Yale University"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct LabEntry {
    pub name: String,
    pub keywords: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Analysis,
    Introduction,
}

/// Parse one analysis file: a sequence of `Professor:` blocks, each with an `Analysis:`
/// section (one keyword phrase per line) and an `Introduction:` section (free text).
pub fn parse_lab_entries(content: &str, source_file: &str) -> Result<Vec<LabEntry>, AppError> {
    let professor_re = Regex::new(r"^Professor:\s*(.*)$").expect("valid regex");
    let section_re = Regex::new(r"^(Analysis|Introduction):\s*(.*)$").expect("valid regex");

    let mut entries = Vec::new();
    let mut current: Option<(LabEntry, Vec<String>, Vec<String>)> = None;
    let mut section = Section::Preamble;

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = professor_re.captures(line) {
            if let Some(done) = current.take() {
                entries.push(finish_entry(done));
            }
            let name = caps[1].trim().to_string();
            if name.is_empty() {
                return Err(AppError::Parse {
                    file: source_file.to_string(),
                    line: idx + 1,
                    message: "professor entry without a name".to_string(),
                });
            }
            current = Some((
                LabEntry {
                    name,
                    keywords: String::new(),
                    description: String::new(),
                },
                Vec::new(),
                Vec::new(),
            ));
            section = Section::Preamble;
            continue;
        }

        let Some((_, keywords, intro)) = current.as_mut() else {
            continue;
        };

        let mut text = line;
        if let Some(caps) = section_re.captures(line) {
            section = if &caps[1] == "Analysis" {
                Section::Analysis
            } else {
                Section::Introduction
            };
            text = caps.get(2).map_or("", |m| m.as_str()).trim();
            if text.is_empty() {
                continue;
            }
        }

        match section {
            Section::Analysis => {
                let phrase = text.strip_prefix("Keywords:").unwrap_or(text).trim();
                if !phrase.is_empty() {
                    keywords.push(phrase.trim_end_matches(',').to_string());
                }
            }
            Section::Introduction => intro.push(text.to_string()),
            Section::Preamble => {}
        }
    }

    if let Some(done) = current.take() {
        entries.push(finish_entry(done));
    }
    Ok(entries)
}

fn finish_entry((mut entry, keywords, intro): (LabEntry, Vec<String>, Vec<String>)) -> LabEntry {
    entry.keywords = keywords.join(", ");
    entry.description = intro.join(" ");
    entry
}

/// Full department name for an analysis file stem such as `cs` or `Engineering_and_applied_science`.
pub fn department_name(stem: &str) -> String {
    let key = stem.to_lowercase();
    DEPARTMENT_NAMES
        .iter()
        .find(|(short, _)| *short == key)
        .map(|(_, full)| full.to_string())
        .unwrap_or_else(|| title_case(&stem.replace('_', " ")))
}

/// Organization name for a crawler directory such as `MIT_DB`.
pub fn organization_name(dir_name: &str) -> String {
    let key = organization_key(dir_name);
    ORGANIZATION_NAMES
        .iter()
        .find(|(short, _)| *short == key)
        .map(|(_, full)| full.to_string())
        .unwrap_or_else(|| title_case(&key.replace('-', " ")))
}

fn organization_key(dir_name: &str) -> String {
    let lower = dir_name.to_lowercase();
    let trimmed = lower
        .strip_suffix("_db")
        .or_else(|| lower.strip_suffix("-db"))
        .unwrap_or(lower.as_str());
    trimmed.replace(['_', ' '], "-")
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Load every `*.txt` analysis file under `root`.
///
/// The first directory level below `root` names the organization (`MIT_DB/cs.txt`);
/// files directly in `root` belong to the organization named by `root` itself. Files are
/// visited in path order so ids are stable across runs. Numbering continues across files
/// that share an organization and stem, so nested copies such as
/// `STANFORD_DB/Lab_final_data/cs.txt` never collide with `STANFORD_DB/cs.txt`.
pub fn parse_crawl_directory(root: &Path) -> Result<Vec<Lab>, AppError> {
    let mut files = Vec::new();
    collect_txt_files(root, &mut files)?;
    files.sort();

    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut labs = Vec::new();
    let mut next_number: HashMap<String, usize> = HashMap::new();
    for file in &files {
        let relative = file.strip_prefix(root).unwrap_or(file);
        let org_dir = if relative.components().count() > 1 {
            relative
                .components()
                .next()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .unwrap_or_default()
        } else {
            root_name.clone()
        };
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let content = std::fs::read_to_string(file)
            .map_err(|e| AppError::Catalog(format!("failed to read {}: {e}", file.display())))?;
        let entries = parse_lab_entries(&content, &file.display().to_string())?;
        if entries.is_empty() {
            warn!(file = %file.display(), "analysis file has no professor entries");
            continue;
        }

        let organization = organization_name(&org_dir);
        let department = department_name(&stem);
        let id_prefix = format!("{}-{}", organization_key(&org_dir), stem.to_lowercase().replace(' ', "-"));
        info!(
            file = %file.display(),
            labs = entries.len(),
            organization = %organization,
            department = %department,
            "parsed analysis file"
        );

        let counter = next_number.entry(id_prefix.clone()).or_insert(0);
        labs.extend(entries.into_iter().map(|entry| {
            *counter += 1;
            Lab {
                id: format!("{id_prefix}-{counter}"),
                name: entry.name,
                organization: organization.clone(),
                department: department.clone(),
                keywords: entry.keywords,
                description: entry.description,
            }
        }));
    }

    Ok(labs)
}

fn collect_txt_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), AppError> {
    let read = std::fs::read_dir(dir)
        .map_err(|e| AppError::Catalog(format!("failed to read directory {}: {e}", dir.display())))?;
    for entry in read {
        let path = entry
            .map_err(|e| AppError::Catalog(format!("failed to list {}: {e}", dir.display())))?
            .path();
        if path.is_dir() {
            collect_txt_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("txt")) {
            out.push(path);
        }
    }
    Ok(())
}

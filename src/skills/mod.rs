//! Local skill catalog.
//!
//! A skill is a directory containing a `SKILL.md` file. The model never calls a
//! skill directly: enabled skills are listed in the instructions and the model
//! reads them through the shell tool.
//!
//! Discovery walks the configured roots breadth-first and reads an optional YAML
//! front-matter block:
//!
//! ```text
//! ---
//! name: pdf-report
//! description: Build PDF reports from CSV files
//! ---
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SKILL_FILE_NAME: &str = "SKILL.md";
pub const DEFAULT_SKILL_LIMIT: usize = 128;
const BODY_DESCRIPTION_MAX_CHARS: usize = 180;
const NO_DESCRIPTION: &str = "No description";
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "dist", "target"];

pub(crate) static FRONTMATTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n|\z)")
        .expect("front-matter pattern is valid")
});

/// Skill as exposed to the tooling layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDescriptor {
    pub name: String,
    pub description: String,
    /// Directory holding the skill's `SKILL.md`.
    pub path: PathBuf,
}

impl SkillDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            path: path.into(),
        }
    }
}

/// Source of available skills.
pub trait SkillCatalog: Send + Sync {
    fn list_available_skills(&self) -> Vec<SkillDescriptor>;
}

/// Filesystem-backed catalog.
#[derive(Debug, Clone)]
pub struct LocalSkillCatalog {
    roots: Vec<PathBuf>,
    limit: usize,
}

impl LocalSkillCatalog {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            limit: DEFAULT_SKILL_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl SkillCatalog for LocalSkillCatalog {
    fn list_available_skills(&self) -> Vec<SkillDescriptor> {
        discover_skills(&self.roots, self.limit)
    }
}

/// Static catalog, handy for callers that already know their skills.
impl SkillCatalog for Vec<SkillDescriptor> {
    fn list_available_skills(&self) -> Vec<SkillDescriptor> {
        self.clone()
    }
}

#[derive(Debug, Default, Deserialize)]
struct SkillFrontmatter {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Discover up to `limit` skills below `roots`.
pub fn discover_skills(roots: &[PathBuf], limit: usize) -> Vec<SkillDescriptor> {
    if limit == 0 || roots.is_empty() {
        return Vec::new();
    }

    let mut skills = Vec::new();
    let mut seen = HashSet::new();

    for file in list_skill_files(roots, limit) {
        if skills.len() >= limit {
            break;
        }
        let content = match fs::read_to_string(&file) {
            Ok(c) => c,
            Err(e) => {
                debug!(path = %file.display(), error = %e, "skipping unreadable skill file");
                continue;
            }
        };
        let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
        let meta = parse_frontmatter(&content);

        let name = meta
            .name
            .filter(|n| !n.trim().is_empty())
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| {
                dir.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
        let description = meta
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .or_else(|| body_description(&content))
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());

        let key = format!(
            "{}::{}",
            name.to_lowercase(),
            dir.to_string_lossy().to_lowercase()
        );
        if !seen.insert(key) {
            continue;
        }

        skills.push(SkillDescriptor {
            name,
            description,
            path: dir,
        });
    }

    skills
}

fn is_skill_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().eq_ignore_ascii_case(SKILL_FILE_NAME))
        .unwrap_or(false)
}

fn list_skill_files(roots: &[PathBuf], limit: usize) -> Vec<PathBuf> {
    let mut collected = Vec::new();
    let mut visited = HashSet::new();
    let mut queue: VecDeque<PathBuf> = roots.iter().cloned().collect();

    while let Some(next) = queue.pop_front() {
        if collected.len() >= limit {
            break;
        }
        let resolved = fs::canonicalize(&next).unwrap_or(next);
        if !visited.insert(resolved.clone()) || !resolved.exists() {
            continue;
        }

        if resolved.is_file() {
            if is_skill_file(&resolved) {
                collected.push(resolved);
            }
            continue;
        }

        let mut entries: Vec<_> = match fs::read_dir(&resolved) {
            Ok(rd) => rd.filter_map(|e| e.ok()).collect(),
            Err(_) => continue,
        };
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            if collected.len() >= limit {
                break;
            }
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                let name = entry.file_name();
                if SKIPPED_DIRS.iter().any(|s| name.to_string_lossy() == *s) {
                    continue;
                }
                queue.push_back(path);
            } else if file_type.is_file() && is_skill_file(&path) {
                collected.push(path);
            }
        }
    }

    collected
}

fn parse_frontmatter(content: &str) -> SkillFrontmatter {
    let Some(block) = FRONTMATTER.captures(content).and_then(|c| c.get(1)) else {
        return SkillFrontmatter::default();
    };
    serde_yaml::from_str::<SkillFrontmatter>(block.as_str())
        .unwrap_or_else(|_| parse_frontmatter_lines(block.as_str()))
}

/// Line based `key: value` reader for front-matter that is not valid YAML
/// (e.g. unquoted descriptions containing `: `).
fn parse_frontmatter_lines(block: &str) -> SkillFrontmatter {
    let mut meta = SkillFrontmatter::default();
    for line in block.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = unquote(value.trim());
        if value.is_empty() {
            continue;
        }
        match key.trim().to_lowercase().as_str() {
            "name" => meta.name = Some(value.to_string()),
            "description" => meta.description = Some(value.to_string()),
            _ => {}
        }
    }
    meta
}

fn unquote(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        value[1..value.len() - 1].trim()
    } else {
        value
    }
}

fn body_description(content: &str) -> Option<String> {
    let body = match FRONTMATTER.find(content) {
        Some(m) => &content[m.end()..],
        None => content,
    };
    body.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| l.chars().take(BODY_DESCRIPTION_MAX_CHARS).collect())
}

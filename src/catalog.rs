// Loading, column resolution and filtering of the exercise catalog
use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::ffi::OsString;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use dirs_next as dirs;

use crate::error::CatalogError;

/// File looked up on the desktop when no catalog path is configured.
pub const DEFAULT_CATALOG_FILE: &str = "YZEX.csv";

/// Environment variable that overrides the configured catalog path.
pub const CATALOG_ENV: &str = "WORKOUT_CATALOG";

/// Canonical column roles the rest of the application understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Name,
    MuscleGroup,
    Difficulty,
    Equipment,
    Link,
}

pub const ALL_ROLES: [Role; 5] = [
    Role::Name,
    Role::MuscleGroup,
    Role::Difficulty,
    Role::Equipment,
    Role::Link,
];

impl Role {
    pub fn key(self) -> &'static str {
        match self {
            Role::Name => "name",
            Role::MuscleGroup => "muscle_group",
            Role::Difficulty => "difficulty",
            Role::Equipment => "equipment",
            Role::Link => "link",
        }
    }

    /// Header spellings accepted for this role, in order of preference.
    pub fn aliases(self) -> &'static [&'static str] {
        COLUMN_ALIASES.get(self.key()).copied().unwrap_or(&[])
    }

    fn required(self) -> bool {
        matches!(self, Role::Name | Role::MuscleGroup)
    }
}

pub static COLUMN_ALIASES: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "name" => &["שם", "תרגיל", "Name", "Exercise"],
    "muscle_group" => &["קבוצת שריר", "muscle group", "Muscle", "Muscle_Group"],
    "difficulty" => &["רמת קושי", "Difficulty", "Level"],
    "equipment" => &["סוג ציוד", "Equipment"],
    "link" => &["לינק", "קישור", "Link", "URL"],
};

/// Column index for every canonical role found in the header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub name: usize,
    pub muscle_group: usize,
    pub difficulty: Option<usize>,
    pub equipment: Option<usize>,
    pub link: Option<usize>,
}

impl ColumnMap {
    fn contains(&self, idx: usize) -> bool {
        idx == self.name
            || idx == self.muscle_group
            || self.difficulty == Some(idx)
            || self.equipment == Some(idx)
            || self.link == Some(idx)
    }
}

/// A single row of the catalog with its columns resolved to canonical roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExerciseRecord {
    pub name: String,
    pub muscle_group: String,
    pub difficulty: String,
    pub equipment: String,
    pub link: Option<String>,
    /// Non-canonical columns in header order.
    #[serde(default)]
    pub extra: Vec<(String, String)>,
}

impl ExerciseRecord {
    /// The guide link if it is something a browser can open.
    pub fn guide_url(&self) -> Option<&str> {
        self.link.as_deref().filter(|l| is_guide_url(l))
    }
}

pub fn is_guide_url(link: &str) -> bool {
    link.starts_with("http")
}

/// The whole catalog as loaded from disk.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub columns: ColumnMap,
    pub extra_headers: Vec<String>,
    pub records: Vec<ExerciseRecord>,
}

impl Catalog {
    pub fn has_difficulty(&self) -> bool {
        self.columns.difficulty.is_some()
    }

    pub fn has_equipment(&self) -> bool {
        self.columns.equipment.is_some()
    }

    /// Sorted distinct difficulty values present in the catalog.
    pub fn difficulties(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.difficulty.as_str()))
    }

    /// Sorted distinct equipment values present in the catalog.
    pub fn equipment(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.equipment.as_str()))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Difficulty and equipment values the user ticked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseFilter {
    pub difficulties: BTreeSet<String>,
    pub equipment: BTreeSet<String>,
}

impl ExerciseFilter {
    pub fn is_incomplete(&self) -> bool {
        self.difficulties.is_empty() || self.equipment.is_empty()
    }
}

/// Keep the records matching `filter`.
///
/// A criterion is only applied when the catalog actually has the matching
/// column, so a sheet without an equipment column is never filtered on
/// equipment.
pub fn filter_records(catalog: &Catalog, filter: &ExerciseFilter) -> Vec<ExerciseRecord> {
    let by_difficulty = catalog.has_difficulty();
    let by_equipment = catalog.has_equipment();
    catalog
        .records
        .iter()
        .filter(|r| !by_difficulty || filter.difficulties.contains(&r.difficulty))
        .filter(|r| !by_equipment || filter.equipment.contains(&r.equipment))
        .cloned()
        .collect()
}

fn normalize_header(h: &str) -> &str {
    h.trim_start_matches('\u{feff}').trim()
}

fn find_column(headers: &[&str], role: Role) -> Option<usize> {
    let aliases = role.aliases();
    aliases
        .iter()
        .find_map(|a| headers.iter().position(|h| h == a))
        .or_else(|| {
            aliases.iter().find_map(|a| {
                let a = a.to_lowercase();
                headers.iter().position(|h| h.to_lowercase() == a)
            })
        })
}

fn closest_header(headers: &[&str], missing: &[Role]) -> Option<String> {
    let mut best: Option<(f64, &str)> = None;
    for role in missing {
        for alias in role.aliases() {
            let alias = alias.to_lowercase();
            for &h in headers {
                let score = strsim::normalized_levenshtein(&alias, &h.to_lowercase());
                if score >= 0.6 && best.map_or(true, |(s, _)| score > s) {
                    best = Some((score, h));
                }
            }
        }
    }
    best.map(|(_, h)| h.to_string())
}

/// Map header names to canonical roles.
///
/// `name` and `muscle_group` are mandatory; the other roles are optional.
pub fn resolve_columns(headers: &[&str]) -> Result<ColumnMap, CatalogError> {
    let headers: Vec<&str> = headers.iter().map(|h| normalize_header(h)).collect();
    let missing: Vec<Role> = ALL_ROLES
        .into_iter()
        .filter(|r| r.required() && find_column(&headers, *r).is_none())
        .collect();
    match (
        find_column(&headers, Role::Name),
        find_column(&headers, Role::MuscleGroup),
    ) {
        (Some(name), Some(muscle_group)) => Ok(ColumnMap {
            name,
            muscle_group,
            difficulty: find_column(&headers, Role::Difficulty),
            equipment: find_column(&headers, Role::Equipment),
            link: find_column(&headers, Role::Link),
        }),
        _ => Err(CatalogError::MissingColumns {
            missing: missing.iter().map(|r| r.key().to_string()).collect(),
            available: headers.iter().map(|h| h.to_string()).collect(),
            suggestion: closest_header(&headers, &missing),
        }),
    }
}

/// Parse a CSV catalog with a header row.
pub fn parse_catalog<R: Read>(reader: R) -> Result<Catalog, CatalogError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| normalize_header(h).to_string())
        .collect();
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    let columns = resolve_columns(&header_refs)?;

    let extra_idx: Vec<usize> = (0..headers.len())
        .filter(|i| !columns.contains(*i) && !headers[*i].is_empty())
        .collect();
    let cell = |row: &csv::StringRecord, idx: Option<usize>| -> String {
        idx.and_then(|i| row.get(i)).unwrap_or("").to_string()
    };

    let mut records = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let row = result?;
        let name = cell(&row, Some(columns.name));
        if name.is_empty() {
            log::debug!("Skipping catalog row {} without a name", line + 2);
            continue;
        }
        let link = Some(cell(&row, columns.link)).filter(|l| !l.is_empty());
        records.push(ExerciseRecord {
            name,
            muscle_group: cell(&row, Some(columns.muscle_group)),
            difficulty: cell(&row, columns.difficulty),
            equipment: cell(&row, columns.equipment),
            link,
            extra: extra_idx
                .iter()
                .map(|i| (headers[*i].clone(), cell(&row, Some(*i))))
                .collect(),
        });
    }

    Ok(Catalog {
        columns,
        extra_headers: extra_idx.iter().map(|i| headers[*i].clone()).collect(),
        records,
    })
}

/// Read and parse the catalog at `path`.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog, CatalogError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let catalog = parse_catalog(file)?;
    log::info!(
        "Loaded {} exercises from {}",
        catalog.records.len(),
        path.display()
    );
    Ok(catalog)
}

/// Count how many distinct exercise names a set of records holds.
pub fn distinct_names(records: &[ExerciseRecord]) -> usize {
    records
        .iter()
        .map(|r| r.name.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Determine which catalog file to load.
///
/// The `WORKOUT_CATALOG` environment variable takes precedence over the path
/// stored in the settings. Without either, the default file on the user's
/// desktop is used.
pub fn resolve_catalog_path(settings_path: Option<&str>) -> Option<PathBuf> {
    resolve_catalog_path_with(std::env::var_os(CATALOG_ENV), settings_path)
}

fn resolve_catalog_path_with(
    env_value: Option<OsString>,
    settings_path: Option<&str>,
) -> Option<PathBuf> {
    env_value
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| settings_path.map(PathBuf::from))
        .or_else(|| dirs::desktop_dir().map(|d| d.join(DEFAULT_CATALOG_FILE)))
}

/// Status line shown after a catalog was loaded.
pub fn format_load_message(exercises: usize, filename: &str) -> String {
    format!("Loaded {} exercises from {}", exercises, filename)
}

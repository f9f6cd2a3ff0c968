use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;

use crate::corpus::{DocumentMeta, PolicyMode};
use crate::error::{PlanError, PlanResult};
use crate::explain::parse_plan_document;
use crate::plan::PlanDocument;

/// A document read from disk, or the reason it could not be.
///
/// Failures are kept instead of propagated so a single bad capture doesn't stop a batch.
#[derive(Debug)]
pub struct LoadedDocument {
    meta: DocumentMeta,
    result: PlanResult<PlanDocument>,
}

impl LoadedDocument {
    pub fn new(meta: DocumentMeta, result: PlanResult<PlanDocument>) -> Self {
        let result = result.map(|doc| doc.with_meta(meta.clone()));
        Self { meta, result }
    }

    /// Reads and parses the file named by `meta.path`.
    pub fn load(meta: DocumentMeta) -> Self {
        let result = match &meta.path {
            Some(path) => fs::read_to_string(path)
                .map_err(|e| PlanError::io(path, e))
                .and_then(|text| parse_plan_document(&text)),
            None => Err(PlanError::malformed("document has no path")),
        };
        if let Err(e) = &result {
            warn!("Failed to load plan document {}: {}", meta.id, e);
        }
        Self::new(meta, result)
    }

    /// Parses `text` directly, e.g. output captured from stdin.
    pub fn from_text(meta: DocumentMeta, text: &str) -> Self {
        Self::new(meta, parse_plan_document(text))
    }

    pub fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    pub fn document(&self) -> Result<&PlanDocument, &PlanError> {
        self.result.as_ref()
    }
}

/// Plans of one query captured before and after enabling the policy.
#[derive(Debug, Default)]
pub struct DocumentPair {
    /// Directory of the pair relative to the corpus root, empty for manifest entries.
    pub group: String,
    pub target: Option<String>,
    pub query_id: String,
    pub before: Option<LoadedDocument>,
    pub after: Option<LoadedDocument>,
    /// Ids of further documents claiming a side that was already taken.
    pub duplicates: Vec<String>,
}

/// Loads every `.json` document under `root`, in path order.
///
/// `root` may also name a single file. A file directly below `root` has no target; a file in a
/// subdirectory takes the name of its parent directory as target relation.
pub fn discover_documents(root: &Path) -> PlanResult<Vec<LoadedDocument>> {
    if root.is_file() {
        let id = root.display().to_string();
        let meta = DocumentMeta::from_file_name(id, root.to_path_buf(), None);
        return Ok(vec![LoadedDocument::load(meta)]);
    }

    let mut files = vec![];
    collect_json_files(root, &mut files)?;
    files.sort();
    debug!("Discovered {} plan documents under {}", files.len(), root.display());

    Ok(files
        .into_iter()
        .map(|path| {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            let target = relative
                .parent()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned());
            let id = relative.display().to_string();
            LoadedDocument::load(DocumentMeta::from_file_name(id, path, target))
        })
        .collect())
}

fn collect_json_files(dir: &Path, files: &mut Vec<PathBuf>) -> PlanResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| PlanError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| PlanError::io(dir, e))?.path();
        if path.is_dir() {
            collect_json_files(&path, files)?;
        } else if path.extension().map_or(false, |ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(())
}

/// Pairs `off` and `on` documents of the same query in the same directory.
///
/// Documents in any other mode take no part in comparisons. A second document for a side that
/// is already taken is recorded in [`DocumentPair::duplicates`] and makes the pair unusable.
/// Pairs come out ordered by directory, then target, then query.
pub fn pair_documents(documents: Vec<LoadedDocument>) -> Vec<DocumentPair> {
    let mut pairs = BTreeMap::<(String, Option<String>, String), DocumentPair>::new();
    for document in documents {
        let meta = document.meta();
        let group = Path::new(&meta.id)
            .parent()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default();
        let key = (group.clone(), meta.target.clone(), meta.query_id.clone());
        let is_before = match &meta.mode {
            PolicyMode::Off => true,
            PolicyMode::On => false,
            PolicyMode::Other(mode) => {
                debug!("Not pairing {} captured in mode {:?}", meta.id, mode);
                continue;
            }
        };

        let pair = pairs.entry(key).or_insert_with(|| DocumentPair {
            group,
            target: meta.target.clone(),
            query_id: meta.query_id.clone(),
            ..Default::default()
        });
        let side = if is_before {
            &mut pair.before
        } else {
            &mut pair.after
        };
        match side.as_ref() {
            Some(taken) => {
                warn!(
                    "Documents {} and {} both claim the {} side of query {}",
                    taken.meta().id,
                    document.meta().id,
                    document.meta().mode,
                    pair.query_id
                );
                pair.duplicates.push(document.meta().id.clone());
            }
            None => *side = Some(document),
        }
    }

    pairs.into_values().collect()
}

#[derive(Deserialize)]
struct ManifestEntry {
    #[serde(default)]
    target: Option<String>,
    query: String,
    before: PathBuf,
    after: PathBuf,
}

/// Loads the pairs listed in a json manifest.
///
/// ```json
/// [{"target": "t3", "query": "q1", "before": "t3/q1_off.json", "after": "t3/q1_on.json"}]
/// ```
///
/// Relative paths are resolved against the manifest's directory.
pub fn load_manifest(path: &Path) -> PlanResult<Vec<DocumentPair>> {
    let text = fs::read_to_string(path).map_err(|e| PlanError::io(path, e))?;
    let entries: Vec<ManifestEntry> =
        serde_json::from_str(&text).map_err(|e| PlanError::Manifest(e.to_string()))?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    Ok(entries
        .into_iter()
        .map(|entry| {
            let load = |file: PathBuf, mode: PolicyMode| {
                let id = file.display().to_string();
                let path = if file.is_absolute() {
                    file
                } else {
                    base.join(file)
                };
                LoadedDocument::load(DocumentMeta {
                    id,
                    path: Some(path),
                    query_id: entry.query.clone(),
                    mode,
                    target: entry.target.clone(),
                })
            };

            DocumentPair {
                target: entry.target.clone(),
                query_id: entry.query.clone(),
                before: Some(load(entry.before.clone(), PolicyMode::Off)),
                after: Some(load(entry.after.clone(), PolicyMode::On)),
                ..Default::default()
            }
        })
        .collect())
}

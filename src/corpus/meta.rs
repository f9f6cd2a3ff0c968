use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Planner policy setting a plan was captured under.
///
/// `off` plans are the baseline, `on` plans are captured with the policy enabled.
#[derive(Clone, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum PolicyMode {
    Off,
    On,
    Other(String),
}

impl FromStr for PolicyMode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "off" => PolicyMode::Off,
            "on" => PolicyMode::On,
            other => PolicyMode::Other(other.to_string()),
        })
    }
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyMode::Off => f.write_str("off"),
            PolicyMode::On => f.write_str("on"),
            PolicyMode::Other(mode) => f.write_str(mode),
        }
    }
}

impl Default for PolicyMode {
    fn default() -> Self {
        PolicyMode::Other(String::new())
    }
}

impl Serialize for PolicyMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Which documents an evaluation looks at.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum ModeFilter {
    #[default]
    All,
    Only(PolicyMode),
}

impl ModeFilter {
    pub fn accepts(&self, mode: &PolicyMode) -> bool {
        match self {
            ModeFilter::All => true,
            ModeFilter::Only(expected) => expected == mode,
        }
    }
}

/// Where a plan document came from, and what it was captured for.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DocumentMeta {
    pub id: String,
    pub path: Option<PathBuf>,
    pub query_id: String,
    pub mode: PolicyMode,
    /// Relation without statistics the query was generated around.
    pub target: Option<String>,
}

impl DocumentMeta {
    /// Metadata of a file named `<query>_<mode>.json`. A stem without `_` is taken whole as the
    /// query id.
    pub fn from_file_name(id: impl Into<String>, path: PathBuf, target: Option<String>) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (query_id, mode) = match stem.rsplit_once('_') {
            Some((query_id, mode)) => (query_id.to_string(), mode.parse().unwrap_or_default()),
            None => (stem, PolicyMode::default()),
        };

        Self {
            id: id.into(),
            path: Some(path),
            query_id,
            mode,
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_mode_parse_and_display() {
        for mode in ["off", "on", "forced", ""] {
            let parsed: PolicyMode = mode.parse().unwrap();
            assert_eq!(parsed.to_string(), mode);
        }
        assert_eq!("off".parse::<PolicyMode>().unwrap(), PolicyMode::Off);
        assert_eq!(
            serde_json::to_string(&PolicyMode::On).unwrap(),
            "\"on\""
        );
    }

    #[test]
    fn test_mode_filter() {
        assert!(ModeFilter::All.accepts(&PolicyMode::Off));
        let only_on = ModeFilter::Only(PolicyMode::On);
        assert!(only_on.accepts(&PolicyMode::On));
        assert!(!only_on.accepts(&PolicyMode::Off));
        assert!(!only_on.accepts(&PolicyMode::Other("on2".to_string())));
    }

    #[test]
    fn test_meta_from_file_name() {
        let meta = DocumentMeta::from_file_name(
            "t3/q_12_off.json",
            PathBuf::from("/corpus/t3/q_12_off.json"),
            Some("t3".to_string()),
        );
        assert_eq!(meta.query_id, "q_12");
        assert_eq!(meta.mode, PolicyMode::Off);
        assert_eq!(meta.target.as_deref(), Some("t3"));

        let meta = DocumentMeta::from_file_name("plan.json", PathBuf::from("plan.json"), None);
        assert_eq!(meta.query_id, "plan");
        assert_eq!(meta.mode, PolicyMode::default());
    }
}

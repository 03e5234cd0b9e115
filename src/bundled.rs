use crate::domain::Conference;
use crate::error::Result;
use crate::sources::SourceDescriptor;

/// Sample dataset shipped inside the binary.
pub const CONFERENCES_JSON: &str = include_str!("../data/conferences.json");

/// Curated sources used to seed an empty `sources.json`.
pub const DEFAULT_SOURCES_JSON: &str = include_str!("../data/default_sources.json");

pub fn conferences() -> Result<Vec<Conference>> {
    Ok(serde_json::from_str(CONFERENCES_JSON)?)
}

pub fn default_sources() -> Result<Vec<SourceDescriptor>> {
    Ok(serde_json::from_str(DEFAULT_SOURCES_JSON)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_bundled_conferences_parse() {
        let confs = conferences().unwrap();
        assert!(!confs.is_empty());
        for conf in &confs {
            assert!(conf.start_dt().is_ok(), "{} has a bad start date", conf.name);
            assert!(conf.end_dt().unwrap() >= conf.start_dt().unwrap());
        }
    }

    #[test]
    fn test_bundled_conferences_have_unique_identities() {
        let confs = conferences().unwrap();
        let keys: HashSet<_> = confs.iter().map(Conference::identity_key).collect();
        assert_eq!(keys.len(), confs.len());
    }

    #[test]
    fn test_default_sources_are_remote() {
        let sources = default_sources().unwrap();
        assert!(!sources.is_empty());
        assert!(sources
            .iter()
            .all(|s| matches!(s, SourceDescriptor::RemoteJson { .. })));
    }
}

use crate::errors::RouteResult;
use crate::mapping::NameMapping;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Persistence collaborator for operator configuration.
///
/// The priority list survives restarts; name mappings are static-ish
/// configuration shipped alongside it.
pub trait Store: Send + Sync {
    /// Load the persisted priority list; an absent file is an empty list
    fn load_priority_list(&self) -> RouteResult<Vec<String>>;

    /// Persist the priority list
    fn save_priority_list(&self, list: &[String]) -> RouteResult<()>;

    /// Load the name-mapping rules; an absent file means no rules
    fn load_name_mappings(&self) -> RouteResult<Vec<NameMapping>>;
}

/// JSON files in a data directory, with a `.backup` copy kept on save
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonStore { dir: dir.into() }
    }

    fn priority_path(&self) -> PathBuf {
        self.dir.join("priority.json")
    }

    fn mapping_path(&self) -> PathBuf {
        self.dir.join("mapping.json")
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> RouteResult<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

impl Store for JsonStore {
    fn load_priority_list(&self) -> RouteResult<Vec<String>> {
        let list = Self::read_json(&self.priority_path())?.unwrap_or_default();
        debug!("Loaded priority list: {:?}", list);
        Ok(list)
    }

    fn save_priority_list(&self, list: &[String]) -> RouteResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.priority_path();
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, serde_json::to_vec_pretty(list)?)?;
        fs::rename(&tmp, &path)?;
        fs::copy(&path, path.with_extension("json.backup"))?;

        debug!("Saved priority list: {:?}", list);
        Ok(())
    }

    fn load_name_mappings(&self) -> RouteResult<Vec<NameMapping>> {
        let mappings: Vec<NameMapping> = Self::read_json(&self.mapping_path())?.unwrap_or_default();
        debug!("Loaded {} name mappings", mappings.len());
        Ok(mappings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_absent_files_load_empty() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        assert!(store.load_priority_list().unwrap().is_empty());
        assert!(store.load_name_mappings().unwrap().is_empty());
    }

    #[test]
    fn test_priority_list_round_trip() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        let list = vec!["wwan0".to_string(), "eth0".to_string()];
        store.save_priority_list(&list).unwrap();

        assert_eq!(store.load_priority_list().unwrap(), list);
    }

    #[test]
    fn test_save_keeps_backup_copy() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        store
            .save_priority_list(&["eth0".to_string()])
            .unwrap();

        let backup = dir.path().join("priority.json.backup");
        assert!(backup.exists());
        let content: Vec<String> =
            serde_json::from_str(&fs::read_to_string(backup).unwrap()).unwrap();
        assert_eq!(content, vec!["eth0".to_string()]);
    }

    #[test]
    fn test_mapping_file_is_parsed() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("mapping.json"),
            r#"[{"pattern": "^wwan(\\d)$", "template": "ppp{0}"}]"#,
        )
        .unwrap();

        let store = JsonStore::new(dir.path());
        let mappings = store.load_name_mappings().unwrap();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].template, "ppp{0}");
    }

    #[test]
    fn test_mapping_file_accepts_name_field_alias() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("mapping.json"),
            r#"[{"pattern": "^wwan(\\d)$", "name": "ppp{0}"}]"#,
        )
        .unwrap();

        let store = JsonStore::new(dir.path());
        let mappings = store.load_name_mappings().unwrap();
        assert_eq!(mappings[0].template, "ppp{0}");
    }
}

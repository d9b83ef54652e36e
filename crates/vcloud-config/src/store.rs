// ── Profile store ──
//
// YAML file holding every named profile plus the active one:
//
//   active: lab
//   profiles:
//     - name: lab
//       host: vcd.lab.local
//       ...
//
// Loading never fails: a missing or unreadable file yields an empty store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;
use vcloud_core::{Profile, ProfileField};

use crate::ConfigError;

const FILE_NAME: &str = ".vcd-cli.yaml";

/// Default location of the profile store: `~/.vcd-cli.yaml`.
pub fn default_profiles_path() -> PathBuf {
    BaseDirs::new().map_or_else(
        || PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into())).join(FILE_NAME),
        |dirs| dirs.home_dir().join(FILE_NAME),
    )
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    active: Option<String>,
    #[serde(default)]
    profiles: Vec<Profile>,
}

/// In-memory view of the profile store file.
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    active: Option<String>,
    profiles: Vec<Profile>,
    recovered_from: Option<String>,
}

impl ProfileStore {
    /// Read the store at `path`. A missing file gives an empty store; a
    /// malformed one also gives an empty store and records why in
    /// [`recovered_from`](Self::recovered_from).
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (file, recovered_from) = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => (StoreFile::default(), None),
            Ok(text) => match serde_yaml::from_str::<StoreFile>(&text) {
                Ok(file) => (file, None),
                Err(e) => (StoreFile::default(), Some(e.to_string())),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (StoreFile::default(), None),
            Err(e) => (StoreFile::default(), Some(e.to_string())),
        };

        let mut store = Self {
            path,
            active: file.active,
            profiles: Vec::new(),
            recovered_from,
        };
        for profile in file.profiles {
            if store.position(&profile.name).is_none() {
                store.profiles.push(profile);
            }
        }
        store.normalize_active();
        debug!(path = %store.path.display(), profiles = store.profiles.len(), "profile store loaded");
        store
    }

    /// Write the store to its file via a temporary sibling and a rename.
    ///
    /// Each save gets its own uniquely named temp file, so concurrent
    /// writers never share one; the last rename wins.
    pub fn save(&self) -> Result<(), ConfigError> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };

        let file = StoreFile {
            active: self.active.clone(),
            profiles: self.profiles.clone(),
        };
        let yaml = serde_yaml::to_string(&file)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        restrict_permissions(tmp.path())?;
        tmp.write_all(yaml.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), "profile store saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse or read error that forced an empty store, if any.
    pub fn recovered_from(&self) -> Option<&str> {
        self.recovered_from.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_profile(&self) -> Option<&Profile> {
        self.active.as_deref().and_then(|name| self.profile(name))
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Insert or replace `profile` by name, make it active, and persist.
    pub fn upsert(&mut self, profile: Profile) -> Result<(), ConfigError> {
        if profile.name.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "name".into(),
                reason: "profile name cannot be empty".into(),
            });
        }
        self.profiles.retain(|p| p.name != profile.name);
        self.active = Some(profile.name.clone());
        self.profiles.insert(0, profile);
        self.save()
    }

    /// Field of a named profile, or the field's default when the profile
    /// does not exist.
    pub fn get(&self, name: &str, field: ProfileField) -> String {
        self.profile(name)
            .map_or_else(|| Profile::default().get(field), |p| p.get(field))
    }

    /// Change one field of an existing profile and persist.
    pub fn set(&mut self, name: &str, field: ProfileField, value: &str) -> Result<(), ConfigError> {
        let idx = self.require(name)?;
        let mut updated = self.profiles[idx].clone();
        updated.set(field, value)?;
        self.profiles[idx] = updated;
        self.save()
    }

    /// Make `name` the active profile and persist.
    pub fn activate(&mut self, name: &str) -> Result<(), ConfigError> {
        self.require(name)?;
        self.active = Some(name.to_owned());
        self.save()
    }

    /// Delete a profile and persist. Removing the active profile activates
    /// the first remaining one.
    pub fn remove(&mut self, name: &str) -> Result<Profile, ConfigError> {
        let idx = self.require(name)?;
        let removed = self.profiles.remove(idx);
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
        self.normalize_active();
        self.save()?;
        Ok(removed)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.profiles.iter().position(|p| p.name == name)
    }

    fn require(&self, name: &str) -> Result<usize, ConfigError> {
        self.position(name).ok_or_else(|| ConfigError::UnknownProfile {
            name: name.to_owned(),
        })
    }

    fn normalize_active(&mut self) {
        let dangling = self.active.as_deref().is_none_or(|name| self.position(name).is_none());
        if dangling {
            self.active = self.profiles.first().map(|p| p.name.clone());
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn profile(name: &str, host: &str) -> Profile {
        Profile {
            name: name.into(),
            host: host.into(),
            org: "acme".into(),
            user: "admin".into(),
            token: format!("tok-{name}"),
            api_version: "36.0".into(),
            ..Profile::default()
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> ProfileStore {
        ProfileStore::load(dir.path().join("profiles.yaml"))
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.is_empty());
        assert_eq!(store.active_name(), None);
        assert_eq!(store.recovered_from(), None);
    }

    #[test]
    fn malformed_file_is_an_empty_store_with_reason() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.yaml");
        fs::write(&path, "profiles: [this is: not: valid").unwrap();

        let store = ProfileStore::load(&path);
        assert!(store.is_empty());
        assert!(store.recovered_from().is_some());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let mut lab = profile("lab", "vcd.lab");
        lab.verify = true;
        lab.vdc = "vdc-1".into();
        store.upsert(lab).unwrap();
        store.upsert(profile("prod", "vcd.prod")).unwrap();

        let reloaded = store_in(&dir);
        assert_eq!(reloaded.profiles(), store.profiles());
        assert_eq!(reloaded.active_name(), Some("prod"));
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name() != "profiles.yaml")
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn concurrent_saves_never_fail_or_tear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.yaml");

        let writers: Vec<_> = (0..2)
            .map(|w| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let mut store = ProfileStore::load(&path);
                    for i in 0..100 {
                        // Different sizes so a torn write would not parse
                        let host = "h".repeat(1 + (i * (w + 1)) % 64);
                        store.upsert(profile(&format!("w{w}"), &host)).unwrap();
                    }
                })
            })
            .collect();
        let reader = {
            let path = path.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    assert_eq!(ProfileStore::load(&path).recovered_from(), None);
                }
            })
        };

        for handle in writers {
            handle.join().unwrap();
        }
        reader.join().unwrap();

        let store = ProfileStore::load(&path);
        assert_eq!(store.recovered_from(), None);
        assert!(store.profile("w0").is_some() || store.profile("w1").is_some());
    }

    #[test]
    fn upsert_replaces_by_name_and_activates() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.upsert(profile("lab", "old.host")).unwrap();
        store.upsert(profile("prod", "vcd.prod")).unwrap();
        store.upsert(profile("lab", "new.host")).unwrap();

        let names: Vec<_> = store.profiles().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["lab", "prod"]);
        assert_eq!(store.active_name(), Some("lab"));
        assert_eq!(store.get("lab", ProfileField::Host), "new.host");
    }

    #[test]
    fn absent_fields_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.yaml");
        fs::write(&path, "active: lab\nprofiles:\n  - name: lab\n    host: vcd.lab\n").unwrap();

        let store = ProfileStore::load(&path);
        let lab = store.active_profile().unwrap();
        assert_eq!(lab.token, "");
        assert!(!lab.verify);
        assert_eq!(store.get("missing", ProfileField::Debug), "false");
    }

    #[test]
    fn set_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.upsert(profile("lab", "vcd.lab")).unwrap();

        store.set("lab", ProfileField::Debug, "true").unwrap();

        let reloaded = store_in(&dir);
        assert!(reloaded.profile("lab").unwrap().debug);
    }

    #[test]
    fn set_rejects_bad_input_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.upsert(profile("lab", "vcd.lab")).unwrap();

        let err = store.set("lab", ProfileField::Verify, "perhaps").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));

        let err = store.set("ghost", ProfileField::Host, "x").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile { .. }));

        assert!(!store_in(&dir).profile("lab").unwrap().verify);
    }

    #[test]
    fn removing_active_profile_activates_first_remaining() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.upsert(profile("a", "a.host")).unwrap();
        store.upsert(profile("b", "b.host")).unwrap();
        store.upsert(profile("c", "c.host")).unwrap();

        store.remove("c").unwrap();
        assert_eq!(store.active_name(), Some("b"));

        store.remove("b").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.active_name(), None);
        assert!(store_in(&dir).is_empty());
    }

    #[test]
    fn activate_requires_existing_profile() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.upsert(profile("a", "a.host")).unwrap();
        store.upsert(profile("b", "b.host")).unwrap();

        store.activate("a").unwrap();
        assert_eq!(store_in(&dir).active_name(), Some("a"));
        assert!(store.activate("zzz").is_err());
    }

    #[test]
    fn dangling_active_name_is_repaired_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.yaml");
        fs::write(&path, "active: gone\nprofiles:\n  - name: lab\n").unwrap();

        assert_eq!(ProfileStore::load(&path).active_name(), Some("lab"));
    }
}

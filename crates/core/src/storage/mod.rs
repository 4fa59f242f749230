use std::{
    cell::RefCell,
    collections::BTreeMap,
    fmt, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    rc::Rc,
    str::FromStr,
};

use directories_next::BaseDirs;

use crate::{FlickerError, Result};

const FIELD_SEPARATOR: char = '|';

/// Host key-value facility that preferences are written to.
pub trait PreferenceStore: fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Store handle shared by every controller on a page.
pub type SharedStore = Rc<RefCell<dyn PreferenceStore>>;

pub fn shared<S: PreferenceStore + 'static>(store: S) -> SharedStore {
    Rc::new(RefCell::new(store))
}

/// Last-used playback settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoredPreference {
    pub interval_ms: f64,
    pub scale_px: f64,
}

impl fmt::Display for StoredPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{FIELD_SEPARATOR}{}", self.interval_ms, self.scale_px)
    }
}

impl FromStr for StoredPreference {
    type Err = FlickerError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || FlickerError::msg(format!("malformed stored preference `{s}`"));
        let (interval, scale) = s.split_once(FIELD_SEPARATOR).ok_or_else(malformed)?;
        let interval_ms: f64 = interval.trim().parse().map_err(|_| malformed())?;
        let scale_px: f64 = scale.trim().parse().map_err(|_| malformed())?;

        let usable = |value: f64| value.is_finite() && value > 0.0;
        if !usable(interval_ms) || !usable(scale_px) {
            return Err(malformed());
        }
        Ok(Self {
            interval_ms,
            scale_px,
        })
    }
}

/// Preference access for one device class, with a global fallback key.
///
/// Every operation is best-effort: storage failures are logged and
/// swallowed.
#[derive(Clone)]
pub struct Preferences {
    store: SharedStore,
    namespace: String,
    device_width: u32,
}

impl Preferences {
    pub fn new(store: SharedStore, namespace: impl Into<String>, device_width: u32) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            device_width,
        }
    }

    pub fn default_key(&self) -> String {
        format!("{}_default", self.namespace)
    }

    pub fn device_key(&self) -> String {
        format!("{}_{}", self.namespace, self.device_width)
    }

    /// Device-scoped value first, then the default key.
    pub fn restore(&self) -> Option<StoredPreference> {
        [self.device_key(), self.default_key()]
            .into_iter()
            .find_map(|key| self.read(&key))
    }

    /// Overwrites both keys. Returns whether both writes succeeded.
    pub fn save(&self, preference: StoredPreference) -> bool {
        let value = preference.to_string();
        let mut store = self.store.borrow_mut();
        let mut saved = true;
        for key in [self.device_key(), self.default_key()] {
            if let Err(err) = store.set(&key, &value) {
                tracing::debug!(%key, %err, "skipping preference write");
                saved = false;
            }
        }
        saved
    }

    fn read(&self, key: &str) -> Option<StoredPreference> {
        let raw = match self.store.borrow().get(key) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::debug!(%key, %err, "skipping preference read");
                return None;
            }
        };
        match raw.parse() {
            Ok(preference) => Some(preference),
            Err(err) => {
                tracing::warn!(%key, %err, "ignoring stored preference");
                None
            }
        }
    }
}

impl fmt::Debug for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preferences")
            .field("namespace", &self.namespace)
            .field("device_width", &self.device_width)
            .finish()
    }
}

/// In-memory store, lost with the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store for hosts without any storage facility.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl PreferenceStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(FlickerError::StorageUnavailable(
            "no storage facility".to_string(),
        ))
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
        Err(FlickerError::StorageUnavailable(
            "no storage facility".to_string(),
        ))
    }
}

/// JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json)?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, entries })
    }

    /// Opens the store in the platform config directory.
    pub fn open_default() -> Result<Self> {
        let path = default_path().ok_or_else(|| {
            FlickerError::StorageUnavailable("no config directory on this platform".to_string())
        })?;
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent_dir) = self.path.parent() {
            fs::create_dir_all(parent_dir)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
            .map_err(|err| FlickerError::StorageUnavailable(err.to_string()))
    }
}

pub fn default_path() -> Option<PathBuf> {
    BaseDirs::new().map(|base| {
        base.config_dir()
            .join("TanFlicker")
            .join("preferences.json")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preferences(store: &SharedStore, width: u32) -> Preferences {
        Preferences::new(store.clone(), "flicker", width)
    }

    #[test]
    fn keys_are_namespaced() {
        let store = shared(MemoryStore::new());
        let prefs = preferences(&store, 1280);
        assert_eq!(prefs.default_key(), "flicker_default");
        assert_eq!(prefs.device_key(), "flicker_1280");
    }

    #[test]
    fn serialises_as_delimited_pair() {
        let pref = StoredPreference {
            interval_ms: 40.0,
            scale_px: 18.5,
        };
        assert_eq!(pref.to_string(), "40|18.5");
        assert_eq!("40|18.5".parse::<StoredPreference>().unwrap(), pref);
        assert!("40".parse::<StoredPreference>().is_err());
        assert!("abc|1".parse::<StoredPreference>().is_err());
        assert!("0|18".parse::<StoredPreference>().is_err());
    }

    #[test]
    fn save_writes_both_keys_and_restore_prefers_device() {
        let store = shared(MemoryStore::new());
        let narrow = preferences(&store, 800);
        let wide = preferences(&store, 1920);

        assert!(narrow.save(StoredPreference {
            interval_ms: 40.0,
            scale_px: 18.0,
        }));
        assert!(wide.save(StoredPreference {
            interval_ms: 60.0,
            scale_px: 30.0,
        }));

        assert_eq!(narrow.restore().unwrap().interval_ms, 40.0);
        assert_eq!(wide.restore().unwrap().interval_ms, 60.0);

        let unseen = preferences(&store, 1024);
        assert_eq!(unseen.restore().unwrap().scale_px, 30.0);
    }

    #[test]
    fn restore_skips_malformed_device_value() {
        let store = shared(MemoryStore::new());
        store.borrow_mut().set("flicker_800", "garbage").unwrap();
        store.borrow_mut().set("flicker_default", "50|20").unwrap();

        let restored = preferences(&store, 800).restore().unwrap();
        assert_eq!(restored.interval_ms, 50.0);
    }

    #[test]
    fn unavailable_storage_degrades_silently() {
        let store = shared(UnavailableStore);
        let prefs = preferences(&store, 800);
        assert!(prefs.restore().is_none());
        assert!(!prefs.save(StoredPreference {
            interval_ms: 40.0,
            scale_px: 18.0,
        }));
    }

    #[test]
    fn json_file_store_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("flicker_default").unwrap(), None);
        store.set("flicker_default", "40|18").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("flicker_default").unwrap().as_deref(),
            Some("40|18")
        );
    }

    #[test]
    fn json_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            JsonFileStore::open(&path),
            Err(FlickerError::Json(_))
        ));
    }
}

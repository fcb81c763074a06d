use crate::errors::StorageError;
use serde::{Serialize, de::DeserializeOwned};
use std::{
    io::ErrorKind,
    marker::PhantomData,
    path::{Path, PathBuf},
};
use tokio::fs;

/// A whole-file JSON document. Every load reads the full file and every
/// persist replaces it.
#[derive(Debug, Clone)]
pub struct JsonFile<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// A missing file is the empty state; anything unreadable is an error.
    pub async fn load(&self) -> Result<T, StorageError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(T::default()),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub async fn persist(&self, value: &T) -> Result<(), StorageError> {
        let payload = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Serialize {
            path: self.path.clone(),
            source,
        })?;

        let tmp = temp_path(&self.path);
        let write_err = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };
        fs::write(&tmp, payload).await.map_err(write_err)?;
        fs::rename(&tmp, &self.path).await.map_err(write_err)?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

pub async fn ensure_parent(path: &Path) -> Result<(), std::io::Error> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) fn unique_temp_path(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("mindhaven_{tag}_{}_{}.json", std::process::id(), nanos));
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let file: JsonFile<BTreeMap<String, u32>> = JsonFile::new(unique_temp_path("missing"));
        let value = file.load().await.unwrap();
        assert!(value.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_parse_error() {
        let path = unique_temp_path("corrupt");
        fs::write(&path, b"{not json").await.unwrap();
        let file: JsonFile<Vec<u32>> = JsonFile::new(&path);
        let err = file.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Parse { .. }));
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn persist_replaces_whole_file() {
        let path = unique_temp_path("replace");
        let file: JsonFile<Vec<u32>> = JsonFile::new(&path);
        file.persist(&vec![1, 2, 3]).await.unwrap();
        file.persist(&vec![4]).await.unwrap();
        assert_eq!(file.load().await.unwrap(), vec![4]);
        assert!(!temp_path(&path).exists());
        let _ = fs::remove_file(&path).await;
    }

    #[test]
    fn temp_path_is_a_sibling() {
        let tmp = temp_path(Path::new("data/mood_log.json"));
        assert_eq!(tmp, PathBuf::from("data/mood_log.json.tmp"));
    }
}

//! A single table of the local backend, optionally mirrored to TOML.

use std::collections::BTreeMap;
use std::path::Path;

use opero_core::error::{BackendError, BackendResult, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::storage::AtomicTomlFile;

/// A record with a primary key.
pub(crate) trait Row: Clone + Serialize + DeserializeOwned + Send + Sync {
    fn id(&self) -> &str;
}

#[derive(Serialize, Deserialize)]
struct TableFile<T> {
    #[serde(default = "Vec::new")]
    rows: Vec<T>,
}

pub(crate) struct Table<T: Row> {
    name: &'static str,
    rows: BTreeMap<String, T>,
    file: Option<AtomicTomlFile<TableFile<T>>>,
}

impl<T: Row> Table<T> {
    pub(crate) fn in_memory(name: &'static str) -> Self {
        Self {
            name,
            rows: BTreeMap::new(),
            file: None,
        }
    }

    /// Opens `<dir>/<name>.toml`, loading any rows already stored there.
    pub(crate) fn persistent(name: &'static str, dir: &Path) -> Result<Self> {
        let file = AtomicTomlFile::<TableFile<T>>::new(dir.join(format!("{name}.toml")));
        let rows = file
            .load()?
            .map(|stored| stored.rows)
            .unwrap_or_default()
            .into_iter()
            .map(|row| (row.id().to_string(), row))
            .collect();

        Ok(Self {
            name,
            rows,
            file: Some(file),
        })
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn get(&self, id: &str) -> Option<&T> {
        self.rows.get(id)
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    /// Inserts a new row, rejecting a duplicate primary key with `23505`.
    pub(crate) fn insert(&mut self, row: T) -> BackendResult<T> {
        if self.rows.contains_key(row.id()) {
            return Err(BackendError::unique_violation(&format!("{}_pkey", self.name)));
        }
        self.rows.insert(row.id().to_string(), row.clone());
        self.persist()?;
        Ok(row)
    }

    /// Inserts several rows with a single write.
    pub(crate) fn insert_all(&mut self, rows: Vec<T>) -> BackendResult<Vec<T>> {
        if let Some(duplicate) = rows.iter().find(|row| self.rows.contains_key(row.id())) {
            tracing::debug!(table = self.name, id = duplicate.id(), "Duplicate primary key");
            return Err(BackendError::unique_violation(&format!("{}_pkey", self.name)));
        }
        for row in &rows {
            self.rows.insert(row.id().to_string(), row.clone());
        }
        self.persist()?;
        Ok(rows)
    }

    /// Replaces an existing row, failing with `PGRST116` when it is absent.
    pub(crate) fn replace(&mut self, row: T) -> BackendResult<T> {
        match self.rows.get_mut(row.id()) {
            Some(existing) => *existing = row.clone(),
            None => return Err(BackendError::no_rows()),
        }
        self.persist()?;
        Ok(row)
    }

    pub(crate) fn remove(&mut self, id: &str) -> BackendResult<Option<T>> {
        let removed = self.rows.remove(id);
        if removed.is_some() {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Removes every row matching `predicate`, returning how many went.
    pub(crate) fn remove_where<P>(&mut self, predicate: P) -> BackendResult<usize>
    where
        P: Fn(&T) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|_, row| !predicate(row));
        let removed = before - self.rows.len();
        if removed > 0 {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Applies `f` to every row and persists if anything was touched.
    pub(crate) fn update_where<F>(&mut self, mut f: F) -> BackendResult<usize>
    where
        F: FnMut(&mut T) -> bool,
    {
        let mut touched = 0;
        for row in self.rows.values_mut() {
            if f(row) {
                touched += 1;
            }
        }
        if touched > 0 {
            self.persist()?;
        }
        Ok(touched)
    }

    fn persist(&self) -> BackendResult<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };

        let snapshot = TableFile {
            rows: self.rows.values().cloned().collect(),
        };
        file.save(&snapshot).map_err(|e| {
            tracing::error!(table = self.name, "Failed to persist table: {}", e);
            BackendError::exception(format!("local storage write failed: {e}"))
        })
    }
}

// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Registry of open database handles.
//!
//! Ids are assigned from a counter starting at 1 and never reused. A failed
//! open still consumes its id. Handles opened with `singleInstance` are also
//! indexed by path so a second open of the same file returns the first
//! handle. In-memory databases are never indexed by path.
//!
//! Every handle in the registry is open: [`Registry::release`] removes the
//! entry and the caller closes the returned handle afterwards.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use sqlbridge_db::{Database, LogLevel, OpenMode, is_memory_path};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::OperationError;

/// One open connection, shared between the registry and in-flight calls.
#[derive(Debug)]
pub struct DatabaseHandle {
    id: i64,
    path: String,
    single_instance: bool,
    log_level: LogLevel,
    db: Mutex<Database>,
}

impl DatabaseHandle {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_single_instance(&self) -> bool {
        self.single_instance
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Run `f` with exclusive access to the connection.
    ///
    /// Blocks the current thread; call from `spawn_blocking`.
    pub fn with_database<T>(&self, f: impl FnOnce(&Database) -> T) -> T {
        let db = self.db.blocking_lock();
        f(&db)
    }

    /// Close the connection once every in-flight user has finished with it.
    ///
    /// Blocks the current thread; call from `spawn_blocking`.
    pub fn close(&self) -> Result<(), sqlbridge_db::Error> {
        self.db.blocking_lock().close()
    }
}

/// Result of [`Registry::allocate`].
#[derive(Debug)]
pub struct Allocation {
    pub handle: Arc<DatabaseHandle>,
    /// The handle was an existing single-instance handle.
    pub recovered: bool,
}

#[derive(Debug)]
pub struct Registry {
    handles: BTreeMap<i64, Arc<DatabaseHandle>>,
    single_instances: HashMap<String, i64>,
    last_id: i64,
    statement_cache_capacity: usize,
    /// Encode query results as a list of row maps.
    pub query_as_map_list: bool,
    /// SQL log level given to newly opened handles.
    pub log_level: LogLevel,
}

impl Registry {
    pub fn new(statement_cache_capacity: usize) -> Self {
        Self {
            handles: BTreeMap::new(),
            single_instances: HashMap::new(),
            last_id: 0,
            statement_cache_capacity,
            query_as_map_list: false,
            log_level: LogLevel::None,
        }
    }

    /// Open `path`, or return the open single-instance handle for it.
    ///
    /// Opens the file, so this blocks; call from `spawn_blocking`.
    pub fn allocate(
        &mut self,
        path: &str,
        read_only: bool,
        single_instance: bool,
    ) -> Result<Allocation, OperationError> {
        let single_instance = single_instance && !is_memory_path(path);

        if single_instance && let Some(handle) = self.single_instance(path) {
            debug!("Reusing single-instance database {} at '{path}'", handle.id);
            return Ok(Allocation {
                handle,
                recovered: true,
            });
        }

        self.last_id += 1;
        let id = self.last_id;

        let mode = if read_only {
            OpenMode::ReadOnly
        } else {
            OpenMode::ReadWrite
        };
        let mut db = Database::open(path, mode).map_err(|source| {
            warn!("Failed to open database {id} at '{path}': {source}");
            OperationError::OpenFailure {
                path: path.to_owned(),
                source,
            }
        })?;
        db.set_statement_cache_capacity(self.statement_cache_capacity)?;
        db.set_log_level(self.log_level);

        let handle = Arc::new(DatabaseHandle {
            id,
            path: path.to_owned(),
            single_instance,
            log_level: self.log_level,
            db: Mutex::new(db),
        });
        self.handles.insert(id, handle.clone());
        if single_instance {
            self.single_instances.insert(path.to_owned(), id);
        }
        debug!("Opened database {id} at '{path}' ({mode:?})");

        Ok(Allocation {
            handle,
            recovered: false,
        })
    }

    pub fn lookup(&self, id: i64) -> Option<Arc<DatabaseHandle>> {
        self.handles.get(&id).cloned()
    }

    /// Open single-instance handle for `path`, if any.
    pub fn single_instance(&self, path: &str) -> Option<Arc<DatabaseHandle>> {
        self.single_instances
            .get(path)
            .and_then(|id| self.lookup(*id))
    }

    /// Remove `id` from the registry. Unknown ids are ignored.
    ///
    /// The returned handle is still open; the caller closes it.
    pub fn release(&mut self, id: i64) -> Option<Arc<DatabaseHandle>> {
        let handle = self.handles.remove(&id)?;
        if handle.single_instance && self.single_instances.get(&handle.path) == Some(&id) {
            self.single_instances.remove(&handle.path);
        }
        Some(handle)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Registered handles in id order.
    pub fn handles(&self) -> impl Iterator<Item = &Arc<DatabaseHandle>> {
        self.handles.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn file_path(dir: &TempDir, name: &str) -> String {
        dir.path().join(name).to_str().unwrap().to_owned()
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut registry = Registry::new(8);
        let a = registry.allocate(":memory:", false, false).unwrap();
        let b = registry.allocate(":memory:", false, false).unwrap();
        assert_eq!(a.handle.id(), 1);
        assert_eq!(b.handle.id(), 2);

        registry.release(1).unwrap().close().unwrap();
        let c = registry.allocate(":memory:", false, false).unwrap();
        assert_eq!(c.handle.id(), 3);
    }

    #[test]
    fn test_single_instance_reuse() {
        let dir = TempDir::new().unwrap();
        let path = file_path(&dir, "a.db");
        let mut registry = Registry::new(8);

        let first = registry.allocate(&path, false, true).unwrap();
        assert!(!first.recovered);
        let second = registry.allocate(&path, false, true).unwrap();
        assert!(second.recovered);
        assert!(Arc::ptr_eq(&first.handle, &second.handle));
        assert_eq!(registry.len(), 1);

        // Without the flag the same path gets its own connection.
        let third = registry.allocate(&path, false, false).unwrap();
        assert_eq!(third.handle.id(), 2);
        assert_eq!(registry.len(), 2);
    }

    #[rstest]
    #[case("")]
    #[case(":memory:")]
    fn test_memory_is_never_single_instance(#[case] path: &str) {
        let mut registry = Registry::new(8);
        let first = registry.allocate(path, false, true).unwrap();
        let second = registry.allocate(path, false, true).unwrap();
        assert!(!second.recovered);
        assert!(!first.handle.is_single_instance());
        assert_ne!(first.handle.id(), second.handle.id());
        assert!(registry.single_instance(path).is_none());
    }

    #[test]
    fn test_release_clears_path_mapping() {
        let dir = TempDir::new().unwrap();
        let path = file_path(&dir, "a.db");
        let mut registry = Registry::new(8);

        let id = registry.allocate(&path, false, true).unwrap().handle.id();
        let handle = registry.release(id).unwrap();
        handle.close().unwrap();
        assert!(registry.lookup(id).is_none());
        assert!(registry.single_instance(&path).is_none());
        assert!(registry.release(id).is_none());

        let reopened = registry.allocate(&path, false, true).unwrap();
        assert!(!reopened.recovered);
        assert_eq!(reopened.handle.id(), 2);
    }

    #[test]
    fn test_failed_open_consumes_id() {
        let dir = TempDir::new().unwrap();
        let mut registry = Registry::new(8);

        let err = registry
            .allocate(&file_path(&dir, "missing.db"), true, false)
            .unwrap_err();
        assert!(matches!(err, OperationError::OpenFailure { .. }));
        assert!(registry.is_empty());

        let next = registry.allocate(":memory:", false, false).unwrap();
        assert_eq!(next.handle.id(), 2);
    }

    #[test]
    fn test_handles_inherit_log_level() {
        let mut registry = Registry::new(8);
        registry.log_level = LogLevel::Verbose;
        let handle = registry.allocate(":memory:", false, false).unwrap().handle;
        assert_eq!(handle.log_level(), LogLevel::Verbose);
        assert_eq!(
            handle.with_database(|db| db.log_level()),
            LogLevel::Verbose
        );
    }
}

// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use sqlbridge_db::{Database, LogLevel, is_memory_path};
use sqlbridge_protocol::names::{cmd, param};
use sqlbridge_protocol::{Arguments, Map, Method, MethodCall, MethodResponse, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::batch::{self, BatchOptions};
use crate::config::Config;
use crate::error::OperationError;
use crate::marshal::ResultShape;
use crate::metrics::DispatchMetrics;
use crate::operations::SqlCommand;
use crate::permission::{PermissionGate, PermissionService, Resolution};
use crate::registry::{DatabaseHandle, Registry};
use crate::server::MethodHandler;

#[derive(Debug, Clone)]
struct Settings {
    databases_path: PathBuf,
    strict_arguments: bool,
}

/// Dispatches method calls against a registry of open databases.
pub struct DatabaseHandler<P> {
    registry: Arc<Mutex<Registry>>,
    gate: Arc<PermissionGate<P>>,
    settings: Arc<Settings>,
    metrics: Option<Arc<DispatchMetrics>>,
}

impl<P> Clone for DatabaseHandler<P> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            gate: self.gate.clone(),
            settings: self.settings.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<P: PermissionService + 'static> DatabaseHandler<P> {
    pub fn new(permissions: P, config: &Config) -> Self {
        let mut registry = Registry::new(config.statement_cache_capacity);
        registry.query_as_map_list = config.query_as_map_list;
        Self {
            registry: Arc::new(Mutex::new(registry)),
            gate: Arc::new(PermissionGate::new(permissions)),
            settings: Arc::new(Settings {
                databases_path: config.databases_path.clone(),
                strict_arguments: config.strict_arguments,
            }),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Answer one call. Never fails; every problem becomes a response.
    pub async fn handle(&self, call: MethodCall) -> MethodResponse {
        let start = Instant::now();
        let method = Method::from_name(&call.method);
        debug!(method = %call.method, "handling call");

        let response = if let Resolution::Denied { message, .. } = self.gate.check().await {
            debug!(method = %call.method, "{message}");
            OperationError::PermissionDenied { message }.into()
        } else {
            match method {
                Some(method) => self
                    .dispatch(method, &call.arguments)
                    .await
                    .unwrap_or_else(MethodResponse::from),
                None => {
                    debug!("method '{}' is not implemented", call.method);
                    MethodResponse::NotImplemented
                }
            }
        };

        if let Some(metrics) = &self.metrics {
            let label = method.map_or("unknown", Method::as_str);
            let status = match &response {
                MethodResponse::Success { .. } => "success",
                MethodResponse::Error(_) => "error",
                MethodResponse::NotImplemented => "not_implemented",
            };
            metrics
                .operations_total
                .with_label_values(&[label, status])
                .inc();
            metrics
                .operation_duration
                .with_label_values(&[label])
                .observe(start.elapsed().as_secs_f64());
        }
        response
    }

    async fn dispatch(
        &self,
        method: Method,
        arguments: &Value,
    ) -> Result<MethodResponse, OperationError> {
        let args = Arguments::from_value(arguments, self.settings.strict_arguments)?;
        let result = match method {
            Method::OpenDatabase => self.open_database(&args).await?,
            Method::CloseDatabase => self.close_database(&args).await?,
            Method::DeleteDatabase => self.delete_database(&args).await?,
            Method::GetDatabasesPath => self.databases_path().await?,
            Method::Execute => self.execute(&args).await?,
            Method::Query => self.query(&args).await?,
            Method::Insert => self.insert(&args).await?,
            Method::Update => self.update(&args).await?,
            Method::Batch => return self.batch(&args).await,
            Method::Options => self.options(&args).await?,
            Method::Debug => self.debug_info(&args).await?,
        };
        Ok(MethodResponse::success(result))
    }

    async fn open_database(&self, args: &Arguments<'_>) -> Result<Value, OperationError> {
        let path = args.text(param::PATH)?;
        let read_only = args.flag(param::READ_ONLY)?;
        let single_instance = args.flag(param::SINGLE_INSTANCE)?;

        let (allocation, open) = self
            .registry_operation(move |registry| {
                let allocation = registry.allocate(&path, read_only, single_instance)?;
                Ok((allocation, registry.len()))
            })
            .await?;
        self.set_open_databases(open);

        let mut result = Map::new();
        result.insert(param::ID.to_owned(), Value::Int(allocation.handle.id()));
        if allocation.recovered {
            result.insert(param::RECOVERED.to_owned(), Value::Bool(true));
        }
        Ok(Value::Map(result))
    }

    async fn close_database(&self, args: &Arguments<'_>) -> Result<Value, OperationError> {
        let id = args.int(param::ID)?;
        let (handle, open) = {
            let mut registry = self.registry.lock().await;
            let handle = registry.release(id);
            (handle, registry.len())
        };
        let handle = handle.ok_or(OperationError::UnknownHandle { id })?;
        self.set_open_databases(open);

        debug!("closing database {id} at '{}'", handle.path());
        blocking(move || handle.close()).await??;
        Ok(Value::Null)
    }

    async fn delete_database(&self, args: &Arguments<'_>) -> Result<Value, OperationError> {
        let path = args.text(param::PATH)?;
        let (handle, open) = {
            let mut registry = self.registry.lock().await;
            let handle = registry
                .single_instance(&path)
                .and_then(|handle| registry.release(handle.id()));
            (handle, registry.len())
        };
        self.set_open_databases(open);

        blocking(move || {
            if let Some(handle) = handle {
                debug!("closing database {} before deleting '{path}'", handle.id());
                if let Err(e) = handle.close() {
                    warn!("failed to close database {}: {e}", handle.id());
                }
            }
            if is_memory_path(&path) {
                return;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => debug!("deleted database file '{path}'"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("failed to delete database file '{path}': {e}"),
            }
        })
        .await?;
        Ok(Value::Null)
    }

    async fn databases_path(&self) -> Result<Value, OperationError> {
        let path = &self.settings.databases_path;
        tokio::fs::create_dir_all(path).await.map_err(|e| {
            OperationError::Storage(format!(
                "failed to create databases directory {}: {e}",
                path.display()
            ))
        })?;
        Ok(Value::Text(path.to_string_lossy().into_owned()))
    }

    async fn execute(&self, args: &Arguments<'_>) -> Result<Value, OperationError> {
        let (handle, _) = self.lookup(args.int(param::ID)?).await?;
        let command = SqlCommand::from_arguments(args)?;
        on_database(handle, move |db| command.execute(db)).await?
    }

    async fn query(&self, args: &Arguments<'_>) -> Result<Value, OperationError> {
        let (handle, shape) = self.lookup(args.int(param::ID)?).await?;
        let command = SqlCommand::from_arguments(args)?;
        on_database(handle, move |db| command.query(db, shape)).await?
    }

    async fn insert(&self, args: &Arguments<'_>) -> Result<Value, OperationError> {
        let (handle, _) = self.lookup(args.int(param::ID)?).await?;
        let command = SqlCommand::from_arguments(args)?;
        let no_result = args.flag(param::NO_RESULT)?;
        on_database(handle, move |db| command.insert(db, no_result)).await?
    }

    async fn update(&self, args: &Arguments<'_>) -> Result<Value, OperationError> {
        let (handle, _) = self.lookup(args.int(param::ID)?).await?;
        let command = SqlCommand::from_arguments(args)?;
        let no_result = args.flag(param::NO_RESULT)?;
        on_database(handle, move |db| command.update(db, no_result)).await?
    }

    async fn batch(&self, args: &Arguments<'_>) -> Result<MethodResponse, OperationError> {
        let (handle, shape) = self.lookup(args.int(param::ID)?).await?;
        let operations = args.required_list(param::OPERATIONS)?.to_vec();
        let options = BatchOptions {
            continue_on_error: args.flag(param::CONTINUE_ON_ERROR)?,
            no_result: args.flag(param::NO_RESULT)?,
            shape,
            strict_arguments: self.settings.strict_arguments,
        };
        let outcome = on_database(handle, move |db| batch::run_batch(db, &operations, options)).await?;
        Ok(outcome.into())
    }

    async fn options(&self, args: &Arguments<'_>) -> Result<Value, OperationError> {
        let map_list = args.optional_flag(param::QUERY_AS_MAP_LIST)?;
        let log_level = args.optional_int(param::LOG_LEVEL)?.map(LogLevel::from_i64);

        let mut registry = self.registry.lock().await;
        if let Some(map_list) = map_list {
            registry.query_as_map_list = map_list;
        }
        if let Some(log_level) = log_level {
            registry.log_level = log_level;
        }
        Ok(Value::Null)
    }

    async fn debug_info(&self, args: &Arguments<'_>) -> Result<Value, OperationError> {
        let mut info = Map::new();
        if args.optional_text(param::CMD)?.as_deref() != Some(cmd::GET) {
            return Ok(Value::Map(info));
        }

        let registry = self.registry.lock().await;
        if registry.log_level > LogLevel::None {
            info.insert(
                param::LOG_LEVEL.to_owned(),
                Value::Int(registry.log_level.as_i64()),
            );
        }
        if !registry.is_empty() {
            let databases: Map = registry
                .handles()
                .map(|handle| (handle.id().to_string(), describe(handle)))
                .collect();
            info.insert(param::DATABASES.to_owned(), Value::Map(databases));
        }
        Ok(Value::Map(info))
    }

    async fn lookup(&self, id: i64) -> Result<(Arc<DatabaseHandle>, ResultShape), OperationError> {
        let registry = self.registry.lock().await;
        let handle = registry
            .lookup(id)
            .ok_or(OperationError::UnknownHandle { id })?;
        Ok((handle, ResultShape::from_map_list(registry.query_as_map_list)))
    }

    /// Run a registry mutation that may open files on a blocking thread.
    async fn registry_operation<T, F>(&self, f: F) -> Result<T, OperationError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Registry) -> Result<T, OperationError> + Send + 'static,
    {
        let registry = self.registry.clone();
        blocking(move || {
            let mut registry = registry.blocking_lock();
            f(&mut registry)
        })
        .await?
    }

    fn set_open_databases(&self, open: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.open_databases.set(open as i64);
        }
    }
}

impl<P: PermissionService + 'static> MethodHandler for DatabaseHandler<P> {
    async fn handle(&self, call: MethodCall) -> MethodResponse {
        DatabaseHandler::handle(self, call).await
    }
}

fn describe(handle: &DatabaseHandle) -> Value {
    let mut info = Map::new();
    info.insert(param::PATH.to_owned(), Value::from(handle.path()));
    info.insert(
        param::SINGLE_INSTANCE.to_owned(),
        Value::Bool(handle.is_single_instance()),
    );
    if handle.log_level() > LogLevel::None {
        info.insert(
            param::LOG_LEVEL.to_owned(),
            Value::Int(handle.log_level().as_i64()),
        );
    }
    Value::Map(info)
}

/// Run `f` with the handle's connection locked, on a blocking thread.
async fn on_database<T, F>(handle: Arc<DatabaseHandle>, f: F) -> Result<T, OperationError>
where
    T: Send + 'static,
    F: FnOnce(&Database) -> T + Send + 'static,
{
    blocking(move || handle.with_database(f)).await
}

async fn blocking<T, F>(f: F) -> Result<T, OperationError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| OperationError::Internal(format!("Task join error: {e}")))
}

//! Named loggers, the registry that owns them, and dispatch

use super::completion::Completion;
use super::error::{LogError, Result};
use super::filter::{Filter, Filterer};
use super::handler::Handler;
use super::level::{self, LevelSpec, CRITICAL};
use super::record::{Arg, Arguments, CapturedError, Record};
use lazy_static::lazy_static;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::panic::PanicHookInfo;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Name of the root logger, the top of every hierarchy
pub const ROOT: &str = "root";

/// How long the uncaught-panic hook waits for its record to flush
pub const DEFAULT_EXCEPTION_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

struct RegistryInner {
    loggers: HashMap<String, Arc<Logger>>,
    /// Memoized effective levels, invalidated wholesale on any level change
    level_cache: HashMap<String, i32>,
}

struct RegistryShared {
    inner: RwLock<RegistryInner>,
    default_level: i32,
}

/// An isolated family of loggers.
///
/// Each registry owns one hierarchy rooted at [`ROOT`]. Loggers obtained
/// from different registries never interact, which keeps tests and embedded
/// uses independent of the process-wide default registry.
#[derive(Clone)]
pub struct Registry {
    shared: Arc<RegistryShared>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A registry whose unconfigured hierarchy emits nothing.
    pub fn new() -> Self {
        Self::with_default(level::NONE)
    }

    /// A registry with an explicit fallback level for loggers whose whole
    /// ancestor chain is unconfigured.
    pub fn with_default_level(spec: impl Into<LevelSpec>) -> Result<Self> {
        let spec = spec.into();
        let default =
            level::get_level(spec.clone()).ok_or_else(|| LogError::invalid_level(spec))?;
        Ok(Self::with_default(default))
    }

    fn with_default(default_level: i32) -> Self {
        let shared = Arc::new(RegistryShared {
            inner: RwLock::new(RegistryInner {
                loggers: HashMap::new(),
                level_cache: HashMap::new(),
            }),
            default_level,
        });
        let root = Arc::new(Logger::new(ROOT, Arc::downgrade(&shared)));
        shared
            .inner
            .write()
            .loggers
            .insert(ROOT.to_string(), root);
        Self { shared }
    }

    /// The logger registered under `name`, created on first request.
    ///
    /// Path separators normalize to dots, so module-path callers land in the
    /// same hierarchy as dotted ones. Repeated calls with the same name yield
    /// the same logger.
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        let name = normalize_name(name);
        if let Some(logger) = self.shared.inner.read().loggers.get(&name) {
            return Arc::clone(logger);
        }
        let mut inner = self.shared.inner.write();
        // racing creators settle on whichever insert landed first
        Arc::clone(
            inner
                .loggers
                .entry(name.clone())
                .or_insert_with(|| Arc::new(Logger::new(name, Arc::downgrade(&self.shared)))),
        )
    }

    /// The root logger of this registry.
    pub fn root(&self) -> Arc<Logger> {
        self.get_logger(ROOT)
    }

    /// Names of all loggers created so far, in no particular order.
    pub fn logger_names(&self) -> Vec<String> {
        self.shared.inner.read().loggers.keys().cloned().collect()
    }

    /// Drop every logger, its handlers, and the level cache; recreate a
    /// pristine root. Existing `Arc<Logger>` handles keep working but are
    /// orphaned from the hierarchy.
    pub fn reset(&self) {
        let mut inner = self.shared.inner.write();
        inner.loggers.clear();
        inner.level_cache.clear();
        let root = Arc::new(Logger::new(ROOT, Arc::downgrade(&self.shared)));
        inner.loggers.insert(ROOT.to_string(), root);
    }
}

fn normalize_name(name: &str) -> String {
    let name = name.replace(['/', '\\'], ".");
    if name.is_empty() {
        ROOT.to_string()
    } else {
        name
    }
}

/// A named logger in a dotted hierarchy.
///
/// A logger carries an optional threshold, a filter chain, handlers, and a
/// propagation flag. Records accepted here dispatch to this logger's
/// handlers and then climb to the nearest existing ancestor, repeating until
/// the root or a `propagate = false` logger stops the sweep.
pub struct Logger {
    name: String,
    level: RwLock<Option<i32>>,
    propagate: AtomicBool,
    handlers: RwLock<Vec<Arc<dyn Handler>>>,
    filters: Filterer,
    registry: Weak<RegistryShared>,
}

impl Logger {
    fn new(name: impl Into<String>, registry: Weak<RegistryShared>) -> Self {
        Self {
            name: name.into(),
            level: RwLock::new(None),
            propagate: AtomicBool::new(true),
            handlers: RwLock::new(Vec::new()),
            filters: Filterer::new(),
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// This logger's own threshold, if one was set explicitly.
    pub fn level(&self) -> Option<i32> {
        *self.level.read()
    }

    /// Set this logger's threshold.
    ///
    /// Invalidates the whole effective-level cache: descendants that were
    /// inheriting through this point must recompute on their next call.
    pub fn set_level(&self, spec: impl Into<LevelSpec>) -> Result<()> {
        let spec = spec.into();
        let resolved =
            level::get_level(spec.clone()).ok_or_else(|| LogError::invalid_level(spec))?;
        *self.level.write() = Some(resolved);
        if let Some(shared) = self.registry.upgrade() {
            shared.inner.write().level_cache.clear();
        }
        Ok(())
    }

    /// The threshold actually in force: the nearest explicitly set level on
    /// the ancestor chain, or the registry default. Memoized per name until
    /// the next `set_level` anywhere in the registry.
    pub fn effective_level(&self) -> i32 {
        if let Some(own) = *self.level.read() {
            return own;
        }
        let Some(shared) = self.registry.upgrade() else {
            return level::NONE;
        };
        if let Some(cached) = shared.inner.read().level_cache.get(&self.name) {
            return *cached;
        }

        let mut resolved = shared.default_level;
        let mut cursor = self.effective_parent();
        while let Some(ancestor) = cursor {
            if let Some(set) = *ancestor.level.read() {
                resolved = set;
                break;
            }
            cursor = ancestor.effective_parent();
        }
        shared
            .inner
            .write()
            .level_cache
            .insert(self.name.clone(), resolved);
        resolved
    }

    /// The nearest existing ancestor: progressively strip dotted segments
    /// and return the first registered logger, falling back to root. The
    /// root logger has no parent.
    pub fn effective_parent(&self) -> Option<Arc<Logger>> {
        if self.name == ROOT {
            return None;
        }
        let shared = self.registry.upgrade()?;
        let inner = shared.inner.read();
        let mut prefix = self.name.as_str();
        while let Some(idx) = prefix.rfind('.') {
            prefix = &prefix[..idx];
            if let Some(ancestor) = inner.loggers.get(prefix) {
                return Some(Arc::clone(ancestor));
            }
        }
        inner.loggers.get(ROOT).cloned()
    }

    /// Whether a record at `level` would pass this logger's effective
    /// threshold.
    pub fn is_enabled_for(&self, level: i32) -> bool {
        level >= self.effective_level()
    }

    pub fn propagate(&self) -> bool {
        self.propagate.load(Ordering::Relaxed)
    }

    pub fn set_propagate(&self, propagate: bool) {
        self.propagate.store(propagate, Ordering::Relaxed);
    }

    pub fn add_handler(&self, handler: Arc<dyn Handler>) {
        self.handlers.write().push(handler);
    }

    /// Remove a previously added handler, matched by identity.
    pub fn remove_handler(&self, handler: &Arc<dyn Handler>) {
        self.handlers.write().retain(|h| !Arc::ptr_eq(h, handler));
    }

    pub fn clear_handlers(&self) {
        self.handlers.write().clear();
    }

    pub fn has_handlers(&self) -> bool {
        !self.handlers.read().is_empty()
    }

    pub fn add_filter(&self, filter: Arc<Filter>) {
        self.filters.add_filter(filter);
    }

    pub fn remove_filter(&self, filter: &Arc<Filter>) {
        self.filters.remove_filter(filter);
    }

    /// Log at a dynamically chosen level.
    ///
    /// An unresolvable level reference fails the returned completion rather
    /// than panicking. A level below the effective threshold returns a
    /// resolved completion without even building the record.
    pub fn log(&self, spec: impl Into<LevelSpec>, args: impl Into<Arguments>) -> Completion {
        let spec = spec.into();
        let Some(resolved) = level::get_level(spec.clone()) else {
            return Completion::failed(LogError::invalid_level(spec));
        };
        if !self.is_enabled_for(resolved) {
            return Completion::done();
        }
        self.log_always(resolved, args)
    }

    /// Build a record and dispatch it, bypassing the threshold check.
    pub fn log_always(&self, level: i32, args: impl Into<Arguments>) -> Completion {
        let record = Arc::new(Record::new(self.name.clone(), level, args.into().0));
        self.handle(record)
    }

    /// Run one record through this logger's filters and handlers, then up
    /// the hierarchy.
    ///
    /// Rejection by this logger's filter chain stops the record entirely,
    /// including propagation. Handlers run in insertion order; each one only
    /// sees records at or above its own threshold.
    pub fn handle(&self, record: Arc<Record>) -> Completion {
        if !self.filters.accepts(&record) {
            return Completion::done();
        }

        let mut completions = Vec::new();
        {
            let handlers = self.handlers.read();
            for handler in handlers.iter() {
                if record.level >= handler.core().level() {
                    completions.push(handler.handle(&record));
                }
            }
        }

        if self.propagate() {
            if let Some(parent) = self.effective_parent() {
                completions.push(parent.handle(record));
            }
        }

        Completion::join(completions)
    }

    /// Log with a call-stack snapshot attached.
    ///
    /// The snapshot is captured only after the level check passes; a
    /// disabled trace call costs no more than any other disabled call.
    pub fn trace(&self, args: impl Into<Arguments>) -> Completion {
        let Some(resolved) = level::get_level("TRACE") else {
            return Completion::done();
        };
        if !self.is_enabled_for(resolved) {
            return Completion::done();
        }
        let mut args = args.into();
        args.0.push(Arg::trace_marker());
        self.log_always(resolved, args)
    }

    pub fn verbose(&self, args: impl Into<Arguments>) -> Completion {
        self.named_level("VERBOSE", args.into())
    }

    pub fn debug(&self, args: impl Into<Arguments>) -> Completion {
        self.named_level("DEBUG", args.into())
    }

    pub fn info(&self, args: impl Into<Arguments>) -> Completion {
        self.named_level("INFO", args.into())
    }

    pub fn warn(&self, args: impl Into<Arguments>) -> Completion {
        self.named_level("WARN", args.into())
    }

    pub fn error(&self, args: impl Into<Arguments>) -> Completion {
        self.named_level("ERROR", args.into())
    }

    pub fn critical(&self, args: impl Into<Arguments>) -> Completion {
        self.named_level("CRITICAL", args.into())
    }

    /// Resolve a level name through the active table at call time. A name
    /// absent from a replaced table makes the call a no-op, so callers keep
    /// compiling and running across table swaps.
    fn named_level(&self, name: &str, args: Arguments) -> Completion {
        match level::get_level(name) {
            Some(resolved) => {
                if self.is_enabled_for(resolved) {
                    self.log_always(resolved, args)
                } else {
                    Completion::done()
                }
            }
            None => Completion::done(),
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &*self.level.read())
            .field("propagate", &self.propagate())
            .field("handlers", &self.handlers.read().len())
            .finish()
    }
}

struct PanicHookState {
    previous: Box<dyn Fn(&PanicHookInfo<'_>) + Send + Sync>,
    logger: Arc<Logger>,
    exit_on_error: bool,
}

lazy_static! {
    static ref PANIC_HOOK: Mutex<Option<PanicHookState>> = Mutex::new(None);
}

static PANIC_IN_FLIGHT: AtomicBool = AtomicBool::new(false);

/// Route uncaught panics through `logger` at CRITICAL before the process
/// dies.
///
/// The record carries the panic payload tagged as an uncaught exception, and
/// the hook blocks up to [`DEFAULT_EXCEPTION_FLUSH_TIMEOUT`] for handlers to
/// flush. With `exit_on_error` the process then exits with status 1;
/// otherwise execution continues into the unwinding machinery. Calling again
/// just retargets the existing hook.
pub fn handle_exceptions(logger: Arc<Logger>, exit_on_error: bool) {
    let mut state = PANIC_HOOK.lock();
    if let Some(existing) = state.as_mut() {
        existing.logger = logger;
        existing.exit_on_error = exit_on_error;
        return;
    }
    let previous = std::panic::take_hook();
    *state = Some(PanicHookState {
        previous,
        logger,
        exit_on_error,
    });
    drop(state);
    std::panic::set_hook(Box::new(panic_hook));
}

/// Restore the panic hook that was active before [`handle_exceptions`].
/// Safe to call when no hook is installed.
pub fn unhandle_exceptions() {
    let mut state = PANIC_HOOK.lock();
    if let Some(installed) = state.take() {
        std::panic::set_hook(installed.previous);
    }
}

fn panic_hook(info: &PanicHookInfo<'_>) {
    // a panic raised while we are already flushing one falls through to the
    // saved hook instead of recursing into the logging pipeline
    if PANIC_IN_FLIGHT.swap(true, Ordering::SeqCst) {
        let state = PANIC_HOOK.lock();
        if let Some(installed) = state.as_ref() {
            (installed.previous)(info);
        }
        return;
    }

    let target = {
        let state = PANIC_HOOK.lock();
        state
            .as_ref()
            .map(|s| (Arc::clone(&s.logger), s.exit_on_error))
    };

    if let Some((logger, exit_on_error)) = target {
        let message = panic_payload(info);
        let captured = CapturedError::from_message(message).tag_uncaught();
        let completion = logger.log_always(CRITICAL, Arguments(vec![Arg::Error(captured)]));
        let _ = completion.wait_timeout(DEFAULT_EXCEPTION_FLUSH_TIMEOUT);
        if exit_on_error {
            std::process::exit(1);
        }
    }

    PANIC_IN_FLIGHT.store(false, Ordering::SeqCst);
}

fn panic_payload(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    match info.location() {
        Some(location) => format!("{} ({}:{})", message, location.file(), location.line()),
        None => message,
    }
}

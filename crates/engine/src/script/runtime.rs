use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use wasmtime::{Engine, Linker, Module, Store, Trap};

use super::context::ScriptContext;
use super::engine::{create_engine, create_store_limits, deadline_ticks, EpochTicker};
use super::error::ScriptError;
use super::fingerprint::fingerprint;
use super::host_fns::register_host_fns;
use super::host_state::HostState;
use super::limits::ScriptLimits;
use super::result::parse_result;
use crate::metrics::EngineMetrics;
use crate::verdict::ConditionResult;

pub const ENTRY_FN: &str = "check_rule";

/// Runs a rule script and turns its outcome into a verdict. Failures are
/// reported inside the verdict, never as a panic.
pub trait ScriptEvaluator: Send + Sync {
    fn evaluate(&self, script: &str, ctx: &ScriptContext<'_>) -> ConditionResult;
}

pub struct ExecutionResult {
    pub raw: String,
    pub logs: Vec<String>,
}

/// WebAssembly rule scripts (WAT text or binary). The engine, linker and
/// compiled modules are shared; every execution gets its own store. At most
/// `limits.module_cache` compiled modules are kept, least recently used
/// evicted first.
pub struct WasmScriptEvaluator {
    engine: Engine,
    linker: Linker<HostState>,
    modules: Mutex<LruCache<u64, Module>>,
    limits: ScriptLimits,
    metrics: Option<Arc<EngineMetrics>>,
    _ticker: EpochTicker,
}

impl WasmScriptEvaluator {
    pub fn new(limits: ScriptLimits) -> Result<Self, ScriptError> {
        let engine = create_engine()?;
        let mut linker = Linker::new(&engine);
        register_host_fns(&mut linker)?;
        let ticker = EpochTicker::start(engine.clone())?;
        let capacity = NonZeroUsize::new(limits.module_cache).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            engine,
            linker,
            modules: Mutex::new(LruCache::new(capacity)),
            limits,
            metrics: None,
            _ticker: ticker,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn cached_modules(&self) -> usize {
        self.cache().len()
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, LruCache<u64, Module>> {
        self.modules.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Compiles `source` and confirms it exports the entry function.
    pub fn check(&self, source: &[u8]) -> Result<(), ScriptError> {
        let module = self.module_for(source)?;
        let exported = module.exports().any(|e| {
            e.name() == ENTRY_FN
                && e.ty()
                    .func()
                    .is_some_and(|f| f.params().len() == 0 && f.results().len() == 1)
        });
        if exported {
            Ok(())
        } else {
            Err(ScriptError::MissingEntry(ENTRY_FN))
        }
    }

    fn module_for(&self, source: &[u8]) -> Result<Module, ScriptError> {
        let key = fingerprint(source);
        if let Some(m) = self.cache().get(&key) {
            return Ok(m.clone());
        }
        // Compiled outside the lock; a concurrent miss on the same script
        // compiles twice and the later insert wins.
        let module =
            Module::new(&self.engine, source).map_err(|e| ScriptError::Compile(e.to_string()))?;
        if let Some((evicted, _)) = self.cache().push(key, module.clone()) {
            if evicted != key {
                tracing::debug!(fingerprint = evicted, "compiled script evicted");
            }
        }
        Ok(module)
    }

    pub fn execute(&self, source: &[u8], ctx: &ScriptContext<'_>) -> Result<ExecutionResult, ScriptError> {
        let module = self.module_for(source)?;
        let state = HostState::new(ctx, create_store_limits(&self.limits))?;

        let mut store = Store::new(&self.engine, state);
        store.limiter(|s| &mut s.limits);
        store.set_epoch_deadline(deadline_ticks(self.limits.timeout_ms));

        let instance = self
            .linker
            .instantiate(&mut store, &module)
            .map_err(|e| ScriptError::Instantiation(e.to_string()))?;
        let entry = instance
            .get_typed_func::<(), i32>(&mut store, ENTRY_FN)
            .map_err(|_| ScriptError::MissingEntry(ENTRY_FN))?;

        match entry.call(&mut store, ()) {
            Ok(0) => {
                let st = store.into_data();
                Ok(ExecutionResult {
                    raw: st.result.unwrap_or_default(),
                    logs: st.logs,
                })
            }
            Ok(code) => Err(ScriptError::NonZeroExit(code)),
            Err(e) if matches!(e.downcast_ref::<Trap>(), Some(Trap::Interrupt)) => {
                Err(ScriptError::Timeout)
            }
            Err(e) => Err(ScriptError::Execution(format!("{e:#}"))),
        }
    }
}

impl ScriptEvaluator for WasmScriptEvaluator {
    fn evaluate(&self, script: &str, ctx: &ScriptContext<'_>) -> ConditionResult {
        let start = Instant::now();
        let outcome = self.execute(script.as_bytes(), ctx);
        if let Some(m) = &self.metrics {
            m.record_script_latency(start);
        }

        match outcome {
            Ok(run) => {
                for line in &run.logs {
                    tracing::info!(config_id = ctx.config.id, eui = ctx.eui, "script: {line}");
                }
                parse_result(ctx.config.id, ctx.eui, &run.raw)
            }
            Err(e) => {
                tracing::warn!(config_id = ctx.config.id, eui = ctx.eui, error = %e, "script failed");
                ConditionResult::failed(ctx.config.id, ctx.eui, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_common::{EventType, MeasurementSnapshot, RuleConfig};

    const WAT_MET: &str = r#"
        (module
            (import "sentinel" "get_value" (func $get (param i32 i32) (result f64)))
            (import "sentinel" "conditions_met" (func $met (param i32 i32 f64)))
            (import "sentinel" "conditions_not_met" (func $not_met))
            (import "sentinel" "log" (func $log (param i32 i32)))
            (memory (export "memory") 1)
            (data (i32.const 0) "temperature")
            (data (i32.const 32) "checked")
            (func (export "check_rule") (result i32)
                (local $v f64)
                (local.set $v (call $get (i32.const 0) (i32.const 11)))
                (call $log (i32.const 32) (i32.const 7))
                (if (f64.gt (local.get $v) (f64.const 30))
                    (then (call $met (i32.const 0) (i32.const 11) (local.get $v)))
                    (else (call $not_met)))
                (i32.const 0)
            )
        )
    "#;

    const WAT_LOOP: &str = r#"
        (module
            (memory (export "memory") 1)
            (func (export "check_rule") (result i32)
                (loop $l (br $l))
                (i32.const 0)
            )
        )
    "#;

    const WAT_EXIT_CODE: &str = r#"
        (module
            (memory (export "memory") 1)
            (func (export "check_rule") (result i32) (i32.const 3))
        )
    "#;

    fn config() -> RuleConfig {
        let mut cfg = RuleConfig::new(4, EventType::Data);
        cfg.use_script = true;
        cfg
    }

    fn evaluator(timeout_ms: u64) -> WasmScriptEvaluator {
        WasmScriptEvaluator::new(ScriptLimits {
            timeout_ms,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn threshold_script_violated() {
        let cfg = config();
        let snap = MeasurementSnapshot::new("D1").with("temperature", 35.5, None);
        let ctx = ScriptContext::new(EventType::Data, "D1", &cfg).with_snapshot(Some(&snap));
        let ev = evaluator(1000);

        let run = ev.execute(WAT_MET.as_bytes(), &ctx).unwrap();
        assert_eq!(run.raw, "D1;temperature;35.5");
        assert_eq!(run.logs, vec!["checked".to_string()]);

        let r = ev.evaluate(WAT_MET, &ctx);
        assert!(r.violated);
        assert_eq!(r.value, Some(35.5));
        assert_eq!(ev.cached_modules(), 1);
    }

    #[test]
    fn threshold_script_not_violated() {
        let cfg = config();
        let snap = MeasurementSnapshot::new("D1").with("temperature", 20.0, None);
        let ctx = ScriptContext::new(EventType::Data, "D1", &cfg).with_snapshot(Some(&snap));
        let r = evaluator(1000).evaluate(WAT_MET, &ctx);
        assert!(!r.violated);
        assert!(!r.error);
    }

    #[test]
    fn missing_value_is_nan() {
        let cfg = config();
        let ctx = ScriptContext::new(EventType::Data, "D1", &cfg);
        let r = evaluator(1000).evaluate(WAT_MET, &ctx);
        assert!(!r.violated);
    }

    #[test]
    fn runaway_script_times_out() {
        let cfg = config();
        let ctx = ScriptContext::new(EventType::Data, "D1", &cfg);
        let ev = evaluator(50);
        assert!(matches!(
            ev.execute(WAT_LOOP.as_bytes(), &ctx),
            Err(ScriptError::Timeout)
        ));
        let r = ev.evaluate(WAT_LOOP, &ctx);
        assert!(r.error);
        assert!(r.error_message.contains("timed out"));
    }

    #[test]
    fn nonzero_exit_is_error() {
        let cfg = config();
        let ctx = ScriptContext::new(EventType::Data, "D1", &cfg);
        let ev = evaluator(1000);
        assert!(matches!(
            ev.execute(WAT_EXIT_CODE.as_bytes(), &ctx),
            Err(ScriptError::NonZeroExit(3))
        ));
    }

    #[test]
    fn invalid_source_is_compile_error() {
        let cfg = config();
        let ctx = ScriptContext::new(EventType::Data, "D1", &cfg);
        let ev = evaluator(1000);
        assert!(matches!(
            ev.execute(b"not a module", &ctx),
            Err(ScriptError::Compile(_))
        ));
        assert!(ev.evaluate("not a module", &ctx).error);
    }

    #[test]
    fn check_requires_entry() {
        let ev = evaluator(1000);
        assert!(ev.check(WAT_MET.as_bytes()).is_ok());
        let no_entry = "(module (memory (export \"memory\") 1))";
        assert!(matches!(
            ev.check(no_entry.as_bytes()),
            Err(ScriptError::MissingEntry(ENTRY_FN))
        ));
    }

    #[test]
    fn module_cache_stays_bounded() {
        let cfg = config();
        let ctx = ScriptContext::new(EventType::Data, "D1", &cfg);
        let ev = WasmScriptEvaluator::new(ScriptLimits {
            module_cache: 4,
            ..Default::default()
        })
        .unwrap();

        for code in 0..10 {
            let wat = format!(
                "(module (memory (export \"memory\") 1) (func (export \"check_rule\") (result i32) (i32.const 0)) (global i32 (i32.const {code})))"
            );
            assert!(!ev.evaluate(&wat, &ctx).error);
            assert!(ev.cached_modules() <= 4);
        }
        assert_eq!(ev.cached_modules(), 4);

        ev.evaluate(WAT_MET, &ctx);
        ev.evaluate(WAT_MET, &ctx);
        assert_eq!(ev.cached_modules(), 4);
    }

    #[test]
    fn unknown_import_fails_instantiation() {
        let cfg = config();
        let ctx = ScriptContext::new(EventType::Data, "D1", &cfg);
        let wat = r#"
            (module
                (import "sentinel" "nope" (func))
                (memory (export "memory") 1)
                (func (export "check_rule") (result i32) (i32.const 0))
            )
        "#;
        assert!(matches!(
            evaluator(1000).execute(wat.as_bytes(), &ctx),
            Err(ScriptError::Instantiation(_))
        ));
    }
}

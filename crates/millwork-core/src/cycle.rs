//! The per-building production cycle.
//!
//! A [`ProductionCycle`] accumulates elapsed time and, whenever the
//! accumulator crosses the effective cycle time, tries to turn the recipe's
//! input costs into its output yield. The remainder past the boundary is
//! carried into the next cycle, so no running time is dropped.
//!
//! # States
//!
//! - **Idle** -- no recipe; `advance` does nothing.
//! - **Running** -- accumulating time and completing cycles.
//! - **Paused** -- the output sink is full. Entered when a completed cycle
//!   finds no room or when the sink reports "full"; left only when the sink
//!   reports "space available". Time passing while paused is discarded.
//!
//! # Effective cycle time
//!
//! `cycle_duration / (module_bonus * efficiency)`, recomputed on every
//! advance, where `module_bonus = 1 + module_count * per_module_rate`.
//! A non-positive multiplier product makes the tick a no-op.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::fixed::{Fixed64, Seconds, checked_div_64, checked_mul_64, fixed64_to_f64};
use crate::id::SubscriptionId;
use crate::inventory::{Stockpile, StorageBin};
use crate::port::{ContractViolation, InputSource, OutputSink, SinkObserver};
use crate::recipe::ProductionRecipe;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables shared by every cycle of a building type.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Speed bonus per installed module. 0.25 = +25% per module.
    pub per_module_rate: Fixed64,
    /// Upper bound on cycles resolved by one `advance` call. 1 keeps the
    /// single-completion contract; larger values let a long tick catch up.
    pub max_completions_per_advance: u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            per_module_rate: Fixed64::from_num(0.25),
            max_completions_per_advance: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Wiring problems. Logged once and kept for inspection; the cycle keeps
/// running without the missing piece.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("recipe '{recipe}' has input costs but no input source is attached")]
    MissingInputSource { recipe: String },
    #[error("recipe '{recipe}' yields output but no output sink is attached")]
    MissingOutputSink { recipe: String },
    #[error(
        "recipe '{recipe}': multiplier product is not positive \
         (module bonus {module_bonus}, efficiency {efficiency})"
    )]
    DegenerateMultiplier {
        recipe: String,
        module_bonus: Fixed64,
        efficiency: Fixed64,
    },
}

// ---------------------------------------------------------------------------
// State and outcomes
// ---------------------------------------------------------------------------

/// Observable state of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CycleState {
    Idle,
    Running,
    Paused,
}

/// What happened when the accumulator crossed one cycle boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Inputs consumed and output emitted.
    Produced,
    /// Inputs were short; nothing happened and the time is spent.
    Starved,
    /// Output had no room; the cycle is now paused.
    Blocked,
}

/// The outcome of one `advance` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No recipe.
    Inert,
    /// Backpressure; the tick was discarded.
    Paused,
    /// Multiplier product not positive; the tick was discarded.
    Degenerate,
    /// Time accumulated, no boundary crossed.
    Accumulating,
    /// One or more boundaries crossed, in order.
    Completed(Vec<Completion>),
}

impl TickOutcome {
    pub fn completions(&self) -> &[Completion] {
        match self {
            TickOutcome::Completed(c) => c,
            _ => &[],
        }
    }

    /// Number of completions that actually produced.
    pub fn produced_cycles(&self) -> usize {
        self.completions()
            .iter()
            .filter(|c| **c == Completion::Produced)
            .count()
    }
}

/// Lifetime counters for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CycleStats {
    pub produced_cycles: u64,
    pub starved_cycles: u64,
    pub blocked_cycles: u64,
    pub items_consumed: u64,
    pub items_produced: u64,
    pub degenerate_ticks: u64,
}

// ---------------------------------------------------------------------------
// BackpressureSignal
// ---------------------------------------------------------------------------

/// The pause flag, shared with the output sink as its observer. Atomic so
/// the sink may flip it from inside `add_resource` while the cycle is
/// mid-advance.
#[derive(Debug, Default)]
pub struct BackpressureSignal {
    paused: AtomicBool,
}

impl BackpressureSignal {
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Returns true if this call changed the flag.
    pub fn pause(&self) -> bool {
        !self.paused.swap(true, Ordering::AcqRel)
    }

    /// Returns true if this call changed the flag.
    pub fn resume(&self) -> bool {
        self.paused.swap(false, Ordering::AcqRel)
    }
}

impl SinkObserver for BackpressureSignal {
    fn on_full(&self) {
        if self.pause() {
            tracing::trace!("production paused: output full");
        }
    }

    fn on_space_available(&self) {
        if self.resume() {
            tracing::trace!("production resumed: output has space");
        }
    }
}

// ---------------------------------------------------------------------------
// ProductionCycle
// ---------------------------------------------------------------------------

/// Production state machine for one building.
///
/// Owns its collaborators; reach them through [`input_mut`](Self::input_mut)
/// and [`output_mut`](Self::output_mut) to restock or drain.
#[derive(Debug)]
pub struct ProductionCycle<I: InputSource = Stockpile, O: OutputSink = StorageBin> {
    recipe: Option<Arc<ProductionRecipe>>,
    input: Option<I>,
    output: Option<O>,
    subscription: Option<SubscriptionId>,
    signal: Arc<BackpressureSignal>,
    config: CycleConfig,
    accumulator: Seconds,
    module_count: u32,
    efficiency: Fixed64,
    warnings: Vec<ConfigurationError>,
    last_degenerate: Option<(Fixed64, Fixed64)>,
    stats: CycleStats,
}

impl<I: InputSource, O: OutputSink> ProductionCycle<I, O> {
    /// Wire a cycle to its recipe and collaborators and subscribe to the
    /// output sink's capacity edges.
    ///
    /// A recipe with costs but no input source, or with a yield but no
    /// output sink, is logged as a [`ConfigurationError`]; the missing side
    /// is skipped when cycles complete.
    pub fn attach(
        recipe: Option<Arc<ProductionRecipe>>,
        input: Option<I>,
        mut output: Option<O>,
        config: CycleConfig,
    ) -> Self {
        let signal = Arc::new(BackpressureSignal::default());
        let subscription = output
            .as_mut()
            .map(|sink| sink.subscribe(signal.clone() as Arc<dyn SinkObserver>));

        let mut warnings = Vec::new();
        if let Some(recipe) = &recipe {
            if recipe.needs_inputs() && input.is_none() {
                warnings.push(ConfigurationError::MissingInputSource {
                    recipe: recipe.name.clone(),
                });
            }
            if recipe.produces_output() && output.is_none() {
                warnings.push(ConfigurationError::MissingOutputSink {
                    recipe: recipe.name.clone(),
                });
            }
        }
        for warning in &warnings {
            tracing::warn!("{warning}");
        }
        tracing::debug!(
            recipe = recipe.as_ref().map(|r| r.name.as_str()).unwrap_or("<none>"),
            has_input = input.is_some(),
            has_output = output.is_some(),
            "production cycle attached"
        );

        Self {
            recipe,
            input,
            output,
            subscription,
            signal,
            config,
            accumulator: Seconds::ZERO,
            module_count: 0,
            efficiency: Fixed64::ONE,
            warnings,
            last_degenerate: None,
            stats: CycleStats::default(),
        }
    }

    /// Unsubscribe from the sink and hand the collaborators back.
    pub fn detach(mut self) -> (Option<I>, Option<O>) {
        self.unsubscribe();
        tracing::debug!(recipe = self.recipe_name(), "production cycle detached");
        (self.input.take(), self.output.take())
    }

    fn unsubscribe(&mut self) {
        if let (Some(sink), Some(id)) = (self.output.as_mut(), self.subscription.take()) {
            sink.unsubscribe(id);
        }
    }

    fn recipe_name(&self) -> &str {
        self.recipe.as_ref().map(|r| r.name.as_str()).unwrap_or("<none>")
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the cycle by `delta` seconds.
    ///
    /// Returns an error only if a collaborator breaks its own contract
    /// (e.g. `has_resources` said yes but `consume_resources` failed).
    pub fn advance(&mut self, delta: Seconds) -> Result<TickOutcome, ContractViolation> {
        let Some(recipe) = self.recipe.clone() else {
            return Ok(TickOutcome::Inert);
        };
        if self.signal.is_paused() {
            return Ok(TickOutcome::Paused);
        }
        let Some(effective) = self.effective_cycle_time() else {
            self.report_degenerate(&recipe);
            return Ok(TickOutcome::Degenerate);
        };
        self.last_degenerate = None;

        self.accumulator = self.accumulator.saturating_add(delta.max(Seconds::ZERO));

        let max = self.config.max_completions_per_advance.max(1) as usize;
        let mut completions = Vec::new();
        while completions.len() < max
            && self.accumulator >= effective
            && !self.signal.is_paused()
        {
            self.accumulator -= effective;
            let completion = self.complete_cycle(&recipe)?;
            completions.push(completion);
        }

        if completions.is_empty() {
            Ok(TickOutcome::Accumulating)
        } else {
            Ok(TickOutcome::Completed(completions))
        }
    }

    /// Resolve one crossed boundary. Every feasibility check runs before
    /// any collaborator is mutated.
    fn complete_cycle(&mut self, recipe: &ProductionRecipe) -> Result<Completion, ContractViolation> {
        if let Some(input) = &self.input
            && !input.has_resources(&recipe.inputs)
        {
            self.stats.starved_cycles += 1;
            tracing::trace!(recipe = %recipe.name, "cycle starved");
            return Ok(Completion::Starved);
        }

        let yield_quantity = recipe.yield_quantity();
        if let Some(output) = &self.output
            && !output.has_space(yield_quantity)
        {
            self.signal.pause();
            self.stats.blocked_cycles += 1;
            tracing::trace!(recipe = %recipe.name, "cycle blocked: output full");
            return Ok(Completion::Blocked);
        }

        if let Some(input) = &mut self.input {
            input.consume_resources(&recipe.inputs)?;
            self.stats.items_consumed += recipe.inputs.iter().map(|c| c.quantity as u64).sum::<u64>();
        }
        if let Some(output) = &mut self.output {
            output.add_resource(yield_quantity)?;
            self.stats.items_produced += yield_quantity as u64;
        }
        self.stats.produced_cycles += 1;
        Ok(Completion::Produced)
    }

    fn report_degenerate(&mut self, recipe: &ProductionRecipe) {
        self.stats.degenerate_ticks += 1;
        let key = (self.module_bonus(), self.efficiency);
        if self.last_degenerate == Some(key) {
            return;
        }
        self.last_degenerate = Some(key);
        let warning = ConfigurationError::DegenerateMultiplier {
            recipe: recipe.name.clone(),
            module_bonus: key.0,
            efficiency: key.1,
        };
        tracing::warn!("{warning}; skipping tick");
        self.warnings.push(warning);
    }

    // -----------------------------------------------------------------------
    // Multipliers
    // -----------------------------------------------------------------------

    /// Set the number of installed modules. Takes effect on the next advance.
    pub fn set_module_bonus(&mut self, module_count: u32) {
        self.module_count = module_count;
        tracing::debug!(
            recipe = self.recipe_name(),
            modules = module_count,
            multiplier = fixed64_to_f64(self.module_bonus()),
            "module bonus updated"
        );
    }

    pub fn module_count(&self) -> u32 {
        self.module_count
    }

    /// `1 + module_count * per_module_rate`.
    pub fn module_bonus(&self) -> Fixed64 {
        Fixed64::ONE.saturating_add(
            self.config
                .per_module_rate
                .saturating_mul(Fixed64::saturating_from_num(self.module_count)),
        )
    }

    /// Set the efficiency multiplier. Not clamped: callers own the range.
    pub fn set_efficiency(&mut self, value: Fixed64) {
        self.efficiency = value;
    }

    pub fn efficiency(&self) -> Fixed64 {
        self.efficiency
    }

    /// Current effective cycle time, or `None` with no recipe or a
    /// non-positive multiplier product.
    pub fn effective_cycle_time(&self) -> Option<Seconds> {
        let recipe = self.recipe.as_ref()?;
        let product = checked_mul_64(self.module_bonus(), self.efficiency)?;
        if product <= Fixed64::ZERO {
            return None;
        }
        checked_div_64(recipe.cycle_duration, product).filter(|t| *t > Seconds::ZERO)
    }

    // -----------------------------------------------------------------------
    // Sink notifications
    // -----------------------------------------------------------------------

    /// The output is full. Idempotent.
    pub fn on_sink_full(&self) {
        if self.recipe.is_some() {
            self.signal.on_full();
        }
    }

    /// The output has room again. Idempotent.
    pub fn on_sink_space_available(&self) {
        if self.recipe.is_some() {
            self.signal.on_space_available();
        }
    }

    /// The pause flag, for wiring sinks this cycle does not own.
    pub fn backpressure(&self) -> Arc<BackpressureSignal> {
        self.signal.clone()
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> CycleState {
        match (&self.recipe, self.signal.is_paused()) {
            (None, _) => CycleState::Idle,
            (Some(_), true) => CycleState::Paused,
            (Some(_), false) => CycleState::Running,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state() == CycleState::Paused
    }

    pub fn accumulator(&self) -> Seconds {
        self.accumulator
    }

    /// Fraction of the current cycle elapsed, clamped to 0..=1.
    pub fn progress(&self) -> Option<Fixed64> {
        let effective = self.effective_cycle_time()?;
        let fraction = checked_div_64(self.accumulator, effective).unwrap_or(Fixed64::ONE);
        Some(fraction.min(Fixed64::ONE))
    }

    pub fn recipe(&self) -> Option<&Arc<ProductionRecipe>> {
        self.recipe.as_ref()
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Configuration problems seen so far.
    pub fn config_warnings(&self) -> &[ConfigurationError] {
        &self.warnings
    }

    pub fn input(&self) -> Option<&I> {
        self.input.as_ref()
    }

    pub fn input_mut(&mut self) -> Option<&mut I> {
        self.input.as_mut()
    }

    pub fn output(&self) -> Option<&O> {
        self.output.as_ref()
    }

    pub fn output_mut(&mut self) -> Option<&mut O> {
        self.output.as_mut()
    }
}

impl<I: InputSource, O: OutputSink> Drop for ProductionCycle<I, O> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

// ===========================================================================
// Tests
// ===========================================================================

//! Breath controller: the hexagonal core.
//!
//! [`BreathController`] owns both mode tables, the breath context, the
//! machine supervisor and the sensor-failure policy.  It exposes a clean,
//! hardware-agnostic API; all I/O flows through port traits injected at
//! call sites, so the whole loop is testable with mock adapters.
//!
//! ```text
//!  PressureSource ──▶ ┌───────────────────────────┐ ──▶ EventSink
//!                     │     BreathController       │
//!  MotorActuator  ◀── │  AC/VC tables · Supervisor │ ──▶ AlarmHandler
//!                     └───────────────────────────┘
//!                               ▲
//!                             Clock
//! ```
//!
//! One [`tick`](BreathController::tick):
//!
//! 1. skip the breath machine unless the supervisor says we are ventilating
//! 2. read one pressure sample (sensor-failure policy applies)
//! 3. step the active mode exactly once, or hold at the cycle start while
//!    no valid sample has ever been read
//! 4. emit state-change, newly-raised-alarm and breath-summary events
//! 5. apply pending mode/parameter changes if we are at a cycle boundary
//! 6. let the supervisor act on the Reset signal
//! 7. hand the full bitmask to the alarm handler

use heapless::Deque;
use log::{error, info, warn};

use crate::clock::Clock;
use crate::config::{ModeParameters, VentMode, VentilatorConfig};
use crate::error::{Alarm, Result};
use crate::fsm::ac::{self, AcModeController};
use crate::fsm::context::BreathContext;
use crate::fsm::vc::{self, VcModeController};
use crate::fsm::{BreathState, StepIo};
use crate::supervisor::{MachineState, MachineSupervisor};

use super::commands::VentCommand;
use super::events::{BreathSummary, TelemetryData, VentEvent};
use super::ports::{AlarmHandler, EventSink, MotorActuator, PressureSource};

/// Completed breaths kept for the display and the service console.
pub const BREATH_HISTORY_LEN: usize = 8;

// ───────────────────────────────────────────────────────────────
// BreathController
// ───────────────────────────────────────────────────────────────

pub struct BreathController {
    config: VentilatorConfig,
    ctx: BreathContext,
    state: BreathState,
    ac: AcModeController,
    vc: VcModeController,
    supervisor: MachineSupervisor,
    machine_state: MachineState,

    // ── Sensor-failure policy ─────────────────────────────────
    failure_streak: u8,
    last_good_pressure: Option<f32>,

    // ── Deferred to the next cycle boundary ───────────────────
    pending_mode: Option<VentMode>,
    pending_params: Option<ModeParameters>,

    history: Deque<BreathSummary, BREATH_HISTORY_LEN>,
    tick_count: u64,
}

impl BreathController {
    /// Construct the controller from a validated configuration.
    ///
    /// Starts in `Standby`; call [`start`](Self::start) to begin breathing.
    pub fn new(config: VentilatorConfig) -> Result<Self> {
        config.validate()?;
        let ctx = BreathContext::new(&config);
        let state = BreathState::initial(config.mode);
        info!(
            "BreathController ready: {:?}, {:.1} bpm",
            config.mode,
            config.breath.breaths_per_minute()
        );
        Ok(Self {
            config,
            ctx,
            state,
            ac: ac::controller(),
            vc: vc::controller(),
            supervisor: MachineSupervisor::new(),
            machine_state: MachineState::Standby,
            failure_streak: 0,
            last_good_pressure: None,
            pending_mode: None,
            pending_params: None,
            history: Deque::new(),
            tick_count: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter the breath loop.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.enter_breath_loop(sink);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.
    ///
    /// The `hw` parameter satisfies **both** [`PressureSource`] and
    /// [`MotorActuator`]; this avoids a double mutable borrow while keeping
    /// the port boundary explicit.  `breath_timer` is the phase timer the
    /// state handlers reset.
    pub fn tick(
        &mut self,
        hw: &mut (impl PressureSource + MotorActuator),
        breath_timer: &mut impl Clock,
        sink: &mut impl EventSink,
        alarms: &mut impl AlarmHandler,
    ) {
        if self.machine_state.is_ventilating() {
            self.breathe(hw, breath_timer, sink);
        }
        alarms.annunciate(self.ctx.errors);
    }

    fn breathe(
        &mut self,
        hw: &mut (impl PressureSource + MotorActuator),
        breath_timer: &mut impl Clock,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        let prev_state = self.state;
        let prev_errors = self.ctx.errors;
        let prev_machine = self.machine_state;

        // 1. Pressure sample
        if self.sample_pressure(hw, sink) {
            // 2. Exactly one step of the active mode
            let mut io = StepIo {
                breath_timer,
                actuator: hw,
                machine_state: &mut self.machine_state,
            };
            self.state = match self.state {
                BreathState::Ac(s) => BreathState::Ac(self.ac.step(s, &mut self.ctx, &mut io)),
                BreathState::Vc(s) => BreathState::Vc(self.vc.step(s, &mut self.ctx, &mut io)),
            };
        } else {
            // Never stepped, so still at a cycle start: let the supervisor
            // act on stop requests and a latched sensor failure.
            self.machine_state = MachineState::BreathLoopStart;
        }

        // 3. Events
        if self.state != prev_state {
            sink.emit(&VentEvent::StateChanged {
                from: prev_state,
                to: self.state,
            });
        }
        let raised = self.ctx.errors & !prev_errors;
        if raised != 0 {
            for alarm in Alarm::iter_set(raised) {
                warn!("ALARM: {alarm}");
            }
            sink.emit(&VentEvent::AlarmRaised(raised));
        }
        if prev_state.is_reset() {
            let summary = self.summarize(prev_state.mode());
            self.record(summary);
            sink.emit(&VentEvent::BreathCompleted(summary));
        }

        // 4. Cycle-boundary changes
        self.apply_pending(sink);

        // 5. Supervisor
        self.supervisor
            .evaluate(&mut self.machine_state, self.ctx.errors);
        if self.machine_state != MachineState::BreathLoopStart && self.machine_state != prev_machine
        {
            sink.emit(&VentEvent::MachineStateChanged {
                from: prev_machine,
                to: self.machine_state,
            });
        }
    }

    /// Read one sample.  A failed read reuses the last good value; after
    /// `sensor_fault_tolerance` consecutive failures `DeviceFailure` is
    /// latched.  Returns `false` while no read has ever succeeded; the
    /// context pressure is left untouched then.
    fn sample_pressure(&mut self, hw: &mut impl PressureSource, sink: &mut impl EventSink) -> bool {
        match hw.read_pressure() {
            Ok(p) => {
                self.failure_streak = 0;
                self.last_good_pressure = Some(p);
            }
            Err(e) => {
                self.failure_streak = self.failure_streak.saturating_add(1);
                warn!(
                    "Pressure read failed ({e}), {} in a row",
                    self.failure_streak
                );
                sink.emit(&VentEvent::SensorFault(e));
                if self.failure_streak >= self.config.sensor_fault_tolerance {
                    if !Alarm::DeviceFailure.is_set(self.ctx.errors) {
                        error!("Pressure sensor lost after {} reads", self.failure_streak);
                    }
                    self.ctx.raise(Alarm::DeviceFailure.mask());
                }
            }
        }
        match self.last_good_pressure {
            Some(p) => {
                self.ctx.pressure = p;
                true
            }
            None => false,
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an operator command.
    ///
    /// Only `UpdateParameters` can fail: parameters that would not pass
    /// configuration validation are rejected and nothing is queued.
    pub fn handle_command(&mut self, cmd: VentCommand, sink: &mut impl EventSink) -> Result<()> {
        match cmd {
            VentCommand::Start => {
                if self.ctx.errors & Alarm::FATAL_MASK != 0 {
                    warn!("Start refused: fatal alarm latched, acknowledge first");
                } else if !self.machine_state.is_ventilating() {
                    self.enter_breath_loop(sink);
                } else if self.supervisor.cancel_stop() {
                    info!("Pending stop cancelled, ventilation continues");
                }
            }
            VentCommand::Stop => {
                if self.machine_state.is_ventilating() {
                    info!("Stop requested, finishing current breath");
                    self.supervisor.request_stop();
                }
            }
            VentCommand::SetMode(mode) => {
                info!("Mode change to {:?} queued", mode);
                self.pending_mode = Some(mode);
                self.apply_pending(sink);
            }
            VentCommand::UpdateParameters(params) => {
                let candidate = VentilatorConfig {
                    breath: params,
                    ..self.config.clone()
                };
                candidate.validate()?;
                info!("Breath parameter update queued");
                self.pending_params = Some(params);
                self.apply_pending(sink);
            }
            VentCommand::AcknowledgeAlarms => {
                if self.ctx.errors != 0 {
                    info!("Alarms acknowledged (0b{:08b})", self.ctx.errors);
                    self.ctx.clear_errors();
                    self.failure_streak = 0;
                    sink.emit(&VentEvent::AlarmsCleared);
                }
            }
            VentCommand::AbortInhale => match self.state.abort_target() {
                Some(target) => {
                    warn!("Inhale aborted by operator");
                    sink.emit(&VentEvent::StateChanged {
                        from: self.state,
                        to: target,
                    });
                    self.state = target;
                }
                None => info!("Abort ignored: no inhale in progress"),
            },
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current context.
    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            state: self.state,
            debug_code: self.state.debug_code(),
            machine_state: self.machine_state,
            pressure: self.ctx.pressure,
            peak_pressure: self.ctx.peak_pressure,
            plateau_pressure: self.ctx.plateau_pressure,
            peep_pressure: self.ctx.peep_pressure,
            errors: self.ctx.errors,
            cycles_completed: self.ctx.cycles_completed,
            breaths_per_minute: self.ctx.params.breaths_per_minute(),
        }
    }

    /// Current mode and state.
    pub fn state(&self) -> BreathState {
        self.state
    }

    /// 1-indexed position of the current state within its mode.
    pub fn debug_code(&self) -> u8 {
        self.state.debug_code()
    }

    pub fn mode(&self) -> VentMode {
        self.state.mode()
    }

    pub fn machine_state(&self) -> MachineState {
        self.machine_state
    }

    /// Current alarm bitmask (0 = no alarms).
    pub fn errors(&self) -> u16 {
        self.ctx.errors
    }

    /// Read-only view of the breath context.
    pub fn context(&self) -> &BreathContext {
        &self.ctx
    }

    /// Completed breaths, oldest first.
    pub fn recent_breaths(&self) -> impl Iterator<Item = &BreathSummary> + '_ {
        self.history.iter()
    }

    /// Ticks that stepped the breath machine since construction.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &VentilatorConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn enter_breath_loop(&mut self, sink: &mut impl EventSink) {
        let prev = self.machine_state;
        self.supervisor.start(&mut self.machine_state);
        if prev != self.machine_state {
            sink.emit(&VentEvent::MachineStateChanged {
                from: prev,
                to: self.machine_state,
            });
        }
        sink.emit(&VentEvent::Started(self.state));
        info!("Breath loop started in {:?}", self.state);
    }

    /// Apply queued changes if the active state is a cycle start.
    fn apply_pending(&mut self, sink: &mut impl EventSink) {
        if !self.state.is_start() {
            return;
        }
        if let Some(params) = self.pending_params.take() {
            self.ctx.params = params;
            self.config.breath = params;
            info!(
                "Breath parameters applied: {:.1} bpm, inhale {:.2} s",
                params.breaths_per_minute(),
                params.inspiration_time_s
            );
            sink.emit(&VentEvent::ParametersApplied(params));
        }
        if let Some(mode) = self.pending_mode.take() {
            if mode != self.state.mode() {
                self.state = BreathState::initial(mode);
                self.config.mode = mode;
                info!("Mode switched to {:?}", mode);
                sink.emit(&VentEvent::ModeChanged(mode));
            }
        }
    }

    fn summarize(&self, mode: VentMode) -> BreathSummary {
        BreathSummary {
            mode,
            cycle: self.ctx.cycles_completed,
            peak_pressure: self.ctx.peak_pressure,
            plateau_pressure: self.ctx.plateau_pressure,
            peep_pressure: self.ctx.peep_pressure,
            errors: self.ctx.errors,
            trigger: self.ctx.trigger,
        }
    }

    fn record(&mut self, summary: BreathSummary) {
        if self.history.is_full() {
            self.history.pop_front();
        }
        // Cannot fail: a slot was just freed.
        let _ = self.history.push_back(summary);
    }
}

//! Function-pointer finite state machine engine for the breath modes.
//!
//! Classic embedded FSM pattern, one table per ventilation mode:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateTable (AC: 9 rows, VC: 7 rows)                     │
//! │  ┌───────────────┬─────────────┬─────────────────────┐   │
//! │  │ id            │ name        │ on_step             │   │
//! │  ├───────────────┼─────────────┼─────────────────────┤   │
//! │  │ Start         │ "Start"     │ fn(ctx, io) -> S    │   │
//! │  │ Inhale        │ "Inhale"    │ fn(ctx, io) -> S    │   │
//! │  │ ...           │ ...         │ ...                 │   │
//! │  └───────────────┴─────────────┴─────────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The controller does **not** own the current state: the outer loop
//! passes it in and stores whatever `step` returns.  Each handler mutates
//! only the [`BreathContext`] and the collaborators in [`StepIo`], and
//! every phase-timer reset is an explicit call inside a handler.

pub mod ac;
pub mod context;
mod phases;
pub mod vc;

use core::fmt;

use ac::AcState;
use context::BreathContext;
use log::debug;
use vc::VcState;

use crate::app::ports::MotorActuator;
use crate::clock::Clock;
use crate::config::VentMode;
use crate::supervisor::MachineState;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Implemented by each mode's state enumeration.
pub trait ModeState: Copy + Eq + fmt::Debug {
    /// Number of states.  Sizes the table.
    const COUNT: usize;

    /// Position in the enumeration (0-based).  Indexes the table.
    fn index(self) -> usize;

    /// Diagnostic code: 1-indexed position in the enumeration.
    fn debug_code(self) -> u8 {
        self.index() as u8 + 1
    }

    /// True for the terminal state of a breath cycle.
    fn is_reset(self) -> bool;

    /// True at the cycle boundary, where mode and parameter changes apply.
    fn is_start(self) -> bool;
}

/// The active mode together with its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreathState {
    Ac(AcState),
    Vc(VcState),
}

impl BreathState {
    /// Cycle-start state of `mode`.
    pub fn initial(mode: VentMode) -> Self {
        match mode {
            VentMode::AssistControl => Self::Ac(AcState::Start),
            VentMode::VolumeControl => Self::Vc(VcState::Start),
        }
    }

    pub fn mode(self) -> VentMode {
        match self {
            Self::Ac(_) => VentMode::AssistControl,
            Self::Vc(_) => VentMode::VolumeControl,
        }
    }

    pub fn debug_code(self) -> u8 {
        match self {
            Self::Ac(s) => s.debug_code(),
            Self::Vc(s) => s.debug_code(),
        }
    }

    pub fn is_start(self) -> bool {
        match self {
            Self::Ac(s) => s.is_start(),
            Self::Vc(s) => s.is_start(),
        }
    }

    pub fn is_reset(self) -> bool {
        match self {
            Self::Ac(s) => s.is_reset(),
            Self::Vc(s) => s.is_reset(),
        }
    }

    /// The abort target if an inhale is in progress.
    pub fn abort_target(self) -> Option<Self> {
        match self {
            Self::Ac(s) if s.is_inhaling() => Some(Self::Ac(AcState::InhaleAbort)),
            Self::Vc(s) if s.is_inhaling() => Some(Self::Vc(VcState::InhaleAbort)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Handler signature
// ---------------------------------------------------------------------------

/// Collaborators a handler may touch during one step.
pub struct StepIo<'a> {
    /// Phase timer.  Reset only at the phase boundaries each handler names.
    pub breath_timer: &'a mut dyn Clock,
    /// Fire-and-forget motor commands.
    pub actuator: &'a mut dyn MotorActuator,
    /// Written on the Reset edge for the supervisor.
    pub machine_state: &'a mut MachineState,
}

/// Per-step handler: returns the next state (possibly the same one).
pub type StepFn<S> = fn(&mut BreathContext, &mut StepIo<'_>) -> S;

/// Static descriptor for a single state.
pub struct StateDescriptor<S> {
    pub id: S,
    pub name: &'static str,
    pub on_step: StepFn<S>,
}

// ---------------------------------------------------------------------------
// Mode controller
// ---------------------------------------------------------------------------

/// A mode's state table plus the dispatch that runs it.
pub struct ModeController<S: ModeState, const N: usize> {
    /// Fixed-size table indexed by `S::index()`.
    table: [StateDescriptor<S>; N],
}

impl<S: ModeState, const N: usize> ModeController<S, N> {
    /// Wrap a table.  Row `i` must describe the state with index `i`.
    pub fn new(table: [StateDescriptor<S>; N]) -> Self {
        debug_assert_eq!(N, S::COUNT, "table size does not match state count");
        debug_assert!(
            table.iter().enumerate().all(|(i, row)| row.id.index() == i),
            "state table rows out of order"
        );
        Self { table }
    }

    /// Run the handler for `current` and return the next state.
    pub fn step(&self, current: S, ctx: &mut BreathContext, io: &mut StepIo<'_>) -> S {
        let row = &self.table[current.index()];
        let next = (row.on_step)(ctx, io);
        if next != current {
            debug!("{} -> {}", row.name, self.name(next));
        }
        next
    }

    /// Human-readable name of a state.
    pub fn name(&self, state: S) -> &'static str {
        self.table[state.index()].name
    }
}

// ---------------------------------------------------------------------------
// Handler helpers shared by both modes
// ---------------------------------------------------------------------------

/// Phase duration in whole milliseconds, for actuator commands.
pub(crate) fn secs_to_ms(secs: f32) -> u32 {
    (secs * 1000.0) as u32
}

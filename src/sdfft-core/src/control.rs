// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Streaming control state machine.
//!
//! This module provides an explicit state machine for the window lifecycle,
//! making the ingest/drain transitions clear and preventing invalid states.
//! One evaluation per discrete time step; backpressure pauses the pipeline
//! but never demotes the state.

use std::fmt;

/// Window lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CtrlState {
    /// No window in flight; counters are reset here.
    #[default]
    Idle,
    /// Samples of the current window are being ingested.
    Processing,
    /// The window is fully ingested; the pipeline drains at the pace the
    /// consumer accepts samples.
    Flushing,
}

impl CtrlState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Flushing => "flushing",
        }
    }
}

impl fmt::Display for CtrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handshake boundary conditions observed during one time step.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepConds {
    /// The input handshake completed (sample present and accepted).
    pub in_fire: bool,
    /// The accepted sample carried the last-in-window marker.
    pub last_in: bool,
    /// The output handshake completed (sample present and taken).
    pub out_fire: bool,
    /// The delivered sample carried the last-in-window marker.
    pub last_out: bool,
}

/// The control state machine driving the chain-wide enable.
#[derive(Debug, Clone, Default)]
pub struct CtrlFsm {
    state: CtrlState,
}

impl CtrlFsm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CtrlState {
        self.state
    }

    /// True only while the pipeline drains a fully ingested window.
    pub fn busy(&self) -> bool {
        self.state == CtrlState::Flushing
    }

    /// Whether the engine may take a new input sample this step. Strict
    /// drain policy: no ingestion while flushing, so the per-stage counters
    /// stay aligned to window boundaries.
    pub fn accepts_input(&self) -> bool {
        self.state != CtrlState::Flushing
    }

    /// Evaluate one step's transition. Returns true when the state changed.
    pub fn advance(&mut self, conds: StepConds) -> bool {
        let next = match self.state {
            CtrlState::Idle if conds.in_fire => Some(if conds.last_in {
                CtrlState::Flushing
            } else {
                CtrlState::Processing
            }),
            CtrlState::Processing if conds.in_fire && conds.last_in => Some(CtrlState::Flushing),
            CtrlState::Flushing if conds.out_fire && conds.last_out => Some(CtrlState::Idle),
            // Stalled handshakes freeze the pipeline but keep the state.
            _ => None,
        };
        match next {
            Some(state) => {
                tracing::trace!(from = %self.state, to = %state, "control state change");
                self.state = state;
                true
            }
            None => false,
        }
    }
}

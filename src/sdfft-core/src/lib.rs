// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Streaming single-path delay-feedback FFT engine.
//!
//! The engine computes power-of-two transforms one sample per time step:
//! samples enter in order, flow through a chain of delay-feedback stages
//! (radix-2 or radix-2^2, either decimation order) and leave one per step
//! after a fixed, configuration-known latency, with an optional ping-pong
//! bit-reversal stage restoring natural index order. Flow control is
//! ready/valid on both sides; backpressure freezes the whole pipeline
//! instead of dropping samples.
//!
//! Configuration is validated once at construction ([`FftParams`]), stage
//! arithmetic is pluggable behind [`StageKernel`] (binary64 reference or
//! Q-format fixed point), and the optional runtime registers (size,
//! direction, trim retention) exist only when the configuration asks for
//! them.

pub mod bitrev;
pub mod chain;
pub mod control;
pub mod engine;
pub mod error;
pub mod numeric;
pub mod params;
pub mod stage;

pub use engine::{Frame, RuntimeRegs, SdfFft, StepResult};
pub use error::{ControlError, ParamError};
pub use numeric::{FixedFormat, FixedKernel, Float64Kernel, StageKernel};
pub use params::{
    Decimation, Direction, FftParams, MultStructure, Numeric, Radix, RoundMode, TransformFamily,
    TrimSel,
};

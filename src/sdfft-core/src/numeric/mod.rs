// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Stage arithmetic kernels.
//!
//! The streaming chain treats the butterfly, the trivial quarter rotation
//! and the twiddle multiplier as pure functions with a known register
//! latency; everything numeric lives behind [`StageKernel`]. Two kernels
//! ship with the crate: [`Float64Kernel`], the binary64 reference
//! arithmetic, and [`FixedKernel`], Q-format mantissas with per-stage bit
//! growth, trim retention and sticky overflow tracking.

use core::fmt;

use crate::error::ParamError;
use crate::params::{Direction, FftParams, TrimSel};

mod fixed;
mod float;

pub use fixed::{FixedFormat, FixedKernel};
pub use float::Float64Kernel;

/// Arithmetic seam of one chain stage.
///
/// A kernel owns the per-stage numeric formats and whatever status it
/// accumulates (overflow flags); the chain only tells it *which* stage an
/// operation belongs to.
pub trait StageKernel: Sized {
    /// One complex sample.
    type Sample: Copy + Default + fmt::Debug + PartialEq;
    /// One precomputed twiddle factor.
    type Twiddle: Clone + fmt::Debug;

    /// Build the kernel for a validated configuration.
    fn from_params(params: &FftParams) -> Result<Self, ParamError>;

    /// `W_span^k` in the forward convention, `exp(-2*pi*j*k/span)`.
    fn twiddle(&self, k: usize, span: usize) -> Self::Twiddle;

    /// Add/subtract combine; returns `(sum, difference)` in the stage's
    /// output format.
    fn butterfly(&mut self, stage: usize, a: Self::Sample, b: Self::Sample)
        -> (Self::Sample, Self::Sample);

    /// Full complex multiply by a twiddle factor.
    fn mul_twiddle(
        &mut self,
        stage: usize,
        x: Self::Sample,
        w: &Self::Twiddle,
        direction: Direction,
    ) -> Self::Sample;

    /// Multiply by `-j` (forward) or `+j` (inverse); exact in every kernel.
    fn rotate_quarter(&self, x: Self::Sample, direction: Direction) -> Self::Sample;

    /// Select the trim retention of one stage. No-op for kernels without a
    /// trim path.
    fn set_retention(&mut self, _stage: usize, _sel: TrimSel) {}

    /// Whether a stage scales its output down by one bit.
    fn trims_at(&self, _stage: usize) -> bool {
        false
    }

    /// Sticky per-stage overflow flags; empty when the kernel cannot
    /// overflow.
    fn overflow(&self) -> &[bool] {
        &[]
    }

    /// Clear the sticky overflow flags.
    fn clear_overflow(&mut self) {}
}

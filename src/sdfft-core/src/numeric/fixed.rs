// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Fixed-point kernel.
//!
//! Samples are complex integer mantissas interpreted against a per-stage
//! [`FixedFormat`]. The butterfly grows one bit; a stage either keeps the
//! growth (per the bit-growth schedule) or trims back to its input width,
//! retaining the MSBs (scale by 1/2, rounded) or the LSBs (saturating, with
//! a sticky overflow flag). Twiddle factors are Q31, the idiomatic
//! high-precision format for table-driven fixed-point transforms.

use num_complex::Complex;

use crate::error::ParamError;
use crate::numeric::StageKernel;
use crate::params::{Direction, FftParams, MultStructure, Numeric, RoundMode, TrimSel};

/// Fractional bits of the twiddle tables.
pub const TWIDDLE_FRAC: u32 = 31;

/// Signed fixed-point format: `width` total bits, `frac` fractional bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedFormat {
    pub width: u32,
    pub frac: u32,
}

/// Shift `v` right by `sh` bits under a rounding mode.
pub(crate) fn round_shift(v: i64, sh: u32, mode: RoundMode) -> i64 {
    if sh == 0 {
        return v;
    }
    match mode {
        RoundMode::Truncate => v >> sh,
        RoundMode::HalfUp => (v + (1 << (sh - 1))) >> sh,
        RoundMode::HalfEven => {
            let half = 1i64 << (sh - 1);
            let rem = v & ((1i64 << sh) - 1);
            let mut q = v >> sh;
            if rem > half || (rem == half && q & 1 == 1) {
                q += 1;
            }
            q
        }
    }
}

/// Clamp `v` into a signed `width`-bit range; the flag reports clipping.
fn saturate(v: i64, width: u32) -> (i64, bool) {
    let max = (1i64 << (width - 1)) - 1;
    let min = -(1i64 << (width - 1));
    if v > max {
        (max, true)
    } else if v < min {
        (min, true)
    } else {
        (v, false)
    }
}

/// Q-format stage arithmetic with sticky overflow tracking.
#[derive(Debug, Clone)]
pub struct FixedKernel {
    formats: Vec<FixedFormat>,
    expand: Vec<u8>,
    retention: Vec<TrimSel>,
    round: RoundMode,
    structure: MultStructure,
    sticky: Vec<bool>,
}

impl FixedKernel {
    /// Per-stage formats; entry `k` is the input format of stage `k`, the
    /// final entry the chain output format.
    pub fn formats(&self) -> &[FixedFormat] {
        &self.formats
    }
}

impl StageKernel for FixedKernel {
    type Sample = Complex<i64>;
    type Twiddle = Complex<i64>;

    fn from_params(params: &FftParams) -> Result<Self, ParamError> {
        let (width, frac) = match params.numeric {
            Numeric::Fixed { width, frac } => (width, frac),
            Numeric::Float64 => return Err(ParamError::NumericMismatch),
        };
        let stages = params.stages();
        let mut formats = Vec::with_capacity(stages + 1);
        let mut w = width;
        formats.push(FixedFormat { width: w, frac });
        let mut expand = Vec::with_capacity(stages);
        for stage in 0..stages {
            let growth = params.expand_at(stage);
            w += growth as u32;
            formats.push(FixedFormat { width: w, frac });
            expand.push(growth);
        }
        Ok(Self {
            formats,
            expand,
            retention: vec![params.retention; stages],
            round: params.round,
            structure: params.mult_structure,
            sticky: vec![false; stages],
        })
    }

    fn twiddle(&self, k: usize, span: usize) -> Complex<i64> {
        let angle = -2.0 * std::f64::consts::PI * (k as f64) / (span as f64);
        let scale = (1i64 << TWIDDLE_FRAC) as f64;
        let quantize = |v: f64| ((v * scale).round() as i64).clamp(-(1i64 << TWIDDLE_FRAC), (1i64 << TWIDDLE_FRAC) - 1);
        Complex::new(quantize(angle.cos()), quantize(angle.sin()))
    }

    fn butterfly(
        &mut self,
        stage: usize,
        a: Complex<i64>,
        b: Complex<i64>,
    ) -> (Complex<i64>, Complex<i64>) {
        let sum = a + b;
        let diff = a - b;
        if self.expand[stage] > 0 {
            // The grown format absorbs the carry bit untouched.
            return (sum, diff);
        }
        let width = self.formats[stage].width;
        match self.retention[stage] {
            TrimSel::KeepMsb => {
                let trim = |v: i64| round_shift(v, 1, self.round);
                (
                    Complex::new(trim(sum.re), trim(sum.im)),
                    Complex::new(trim(diff.re), trim(diff.im)),
                )
            }
            TrimSel::KeepLsb => {
                let mut clipped = false;
                let mut trim = |v: i64| {
                    let (v, c) = saturate(v, width);
                    clipped |= c;
                    v
                };
                let out = (
                    Complex::new(trim(sum.re), trim(sum.im)),
                    Complex::new(trim(diff.re), trim(diff.im)),
                );
                self.sticky[stage] |= clipped;
                out
            }
        }
    }

    fn mul_twiddle(
        &mut self,
        _stage: usize,
        x: Complex<i64>,
        w: &Complex<i64>,
        direction: Direction,
    ) -> Complex<i64> {
        let w = match direction {
            Direction::Forward => *w,
            Direction::Inverse => Complex::new(w.re, -w.im),
        };
        let (re, im) = match self.structure {
            MultStructure::FourMult => (
                x.re * w.re - x.im * w.im,
                x.re * w.im + x.im * w.re,
            ),
            MultStructure::ThreeMult => {
                let m1 = w.re * (x.re + x.im);
                let m2 = x.re * (w.im - w.re);
                let m3 = x.im * (w.re + w.im);
                (m1 - m3, m1 + m2)
            }
        };
        Complex::new(
            round_shift(re, TWIDDLE_FRAC, self.round),
            round_shift(im, TWIDDLE_FRAC, self.round),
        )
    }

    fn rotate_quarter(&self, x: Complex<i64>, direction: Direction) -> Complex<i64> {
        match direction {
            Direction::Forward => Complex::new(x.im, -x.re),
            Direction::Inverse => Complex::new(-x.im, x.re),
        }
    }

    fn set_retention(&mut self, stage: usize, sel: TrimSel) {
        if let Some(slot) = self.retention.get_mut(stage) {
            *slot = sel;
        }
    }

    fn trims_at(&self, stage: usize) -> bool {
        self.expand.get(stage).is_some_and(|&g| g == 0)
            && self.retention.get(stage) == Some(&TrimSel::KeepMsb)
    }

    fn overflow(&self) -> &[bool] {
        &self.sticky
    }

    fn clear_overflow(&mut self) {
        self.sticky.fill(false);
    }
}

// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Binary64 reference kernel.

use std::f64::consts::PI;

use num_complex::Complex;

use crate::error::ParamError;
use crate::numeric::StageKernel;
use crate::params::{Direction, FftParams, Numeric};

/// Exact-within-binary64 arithmetic; the golden model the fixed-point
/// kernel is measured against.
#[derive(Debug, Clone, Default)]
pub struct Float64Kernel;

impl StageKernel for Float64Kernel {
    type Sample = Complex<f64>;
    type Twiddle = Complex<f64>;

    fn from_params(params: &FftParams) -> Result<Self, ParamError> {
        match params.numeric {
            Numeric::Float64 => Ok(Self),
            Numeric::Fixed { .. } => Err(ParamError::NumericMismatch),
        }
    }

    fn twiddle(&self, k: usize, span: usize) -> Complex<f64> {
        let angle = -2.0 * PI * (k as f64) / (span as f64);
        Complex::new(angle.cos(), angle.sin())
    }

    fn butterfly(
        &mut self,
        _stage: usize,
        a: Complex<f64>,
        b: Complex<f64>,
    ) -> (Complex<f64>, Complex<f64>) {
        (a + b, a - b)
    }

    fn mul_twiddle(
        &mut self,
        _stage: usize,
        x: Complex<f64>,
        w: &Complex<f64>,
        direction: Direction,
    ) -> Complex<f64> {
        match direction {
            Direction::Forward => x * w,
            Direction::Inverse => x * w.conj(),
        }
    }

    fn rotate_quarter(&self, x: Complex<f64>, direction: Direction) -> Complex<f64> {
        match direction {
            Direction::Forward => Complex::new(x.im, -x.re),
            Direction::Inverse => Complex::new(-x.im, x.re),
        }
    }
}

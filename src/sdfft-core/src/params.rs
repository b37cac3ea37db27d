// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Engine configuration record and its construction-time validators.
//!
//! A [`FftParams`] value describes one engine instance completely: transform
//! size, radix and decimation order, numeric representation, pipeline
//! register depths and the optional runtime-control capabilities. The record
//! is immutable once an engine is built from it; everything that may change
//! afterwards goes through the runtime registers instead.
//!
//! [`FftParams::validate`] runs the whole rule set and must pass before any
//! chain is assembled. A failed rule is a configuration error, never a
//! runtime one.

use serde::{Deserialize, Serialize};

use crate::error::ParamError;

/// Transform families this crate can generate.
///
/// Only the streaming single-path delay-feedback chain exists today; the
/// field is kept explicit so configuration files stay forward compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformFamily {
    #[default]
    StreamingSdf,
}

/// Butterfly decomposition granularity of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Radix {
    /// One plain butterfly per stage.
    #[default]
    #[serde(rename = "2")]
    Radix2,
    /// Dual-stage dragonfly groups: radix-4 multiplier economy with the
    /// radix-2 combine structure. Decimation-in-frequency only.
    #[serde(rename = "2x2")]
    Radix22,
}

/// Where the index permutation happens relative to the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decimation {
    /// Bit-reversed input, natural output; permutation ahead of the chain.
    InTime,
    /// Natural input, bit-reversed output; permutation after the chain.
    #[default]
    InFrequency,
}

/// Transform direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    Forward,
    Inverse,
}

/// Rounding applied whenever lower-significance bits are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundMode {
    /// Arithmetic shift, rounds towards negative infinity.
    Truncate,
    /// Add half, then shift.
    #[default]
    HalfUp,
    /// Round half to even (convergent).
    HalfEven,
}

/// Which end of a grown word a trimming stage keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrimSel {
    /// Keep the most significant bits: scale down by one bit, no overflow.
    #[default]
    KeepMsb,
    /// Keep the least significant bits: full precision, saturates on
    /// overflow and raises the sticky status flag.
    KeepLsb,
}

/// Complex multiplier structure for the twiddle multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultStructure {
    /// Direct form, four real multiplies.
    #[default]
    FourMult,
    /// Three real multiplies with shared partial products.
    ThreeMult,
}

/// Numeric representation of the samples flowing through the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Numeric {
    /// Binary64 complex samples; the reference ("golden") arithmetic.
    #[default]
    Float64,
    /// Signed fixed point: `width` total bits, `frac` fractional bits at
    /// the chain input. Per-stage widths follow the bit-growth schedule.
    Fixed { width: u32, frac: u32 },
}

/// Complete description of one engine instance.
///
/// `size` is the maximum transform size when `runtime_size` is set and the
/// only size otherwise. All fields have config-file defaults, so a TOML
/// section only needs to spell out what differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FftParams {
    /// Transform size in samples; a power of two.
    pub size: usize,
    pub family: TransformFamily,
    pub radix: Radix,
    pub decimation: Decimation,
    /// Static direction, also the initial value of the runtime register.
    pub direction: Direction,
    /// Expose the direction control register.
    pub runtime_direction: bool,
    /// Expose the log2-size control register (effective only while idle).
    pub runtime_size: bool,
    /// Radix-2^2 only: accept any power-of-two runtime size by re-deriving
    /// the dual-stage group roles per selected size. Without this the
    /// runtime size must keep the log2 parity of the full chain.
    pub full_runtime_radix22: bool,
    /// Per-stage bit-growth amounts. Empty means no growth anywhere.
    pub expand: Vec<u8>,
    pub round: RoundMode,
    /// Trim retention for every non-growing stage.
    pub retention: TrimSel,
    /// Expose the per-stage retention control registers.
    pub runtime_retention: bool,
    /// Expose the per-stage sticky overflow status flags.
    pub overflow_status: bool,
    /// Pipeline registers in the butterfly add/subtract path.
    pub adder_regs: usize,
    /// Pipeline registers in the twiddle multiplier path.
    pub mult_regs: usize,
    pub mult_structure: MultStructure,
    /// Include the ping-pong permutation stage (input side for
    /// decimation-in-time, output side for decimation-in-frequency).
    pub bit_reverse: bool,
    /// Delay-line depth at which a stage switches from a register chain to
    /// an addressed memory.
    pub mem_threshold: usize,
    pub numeric: Numeric,
}

impl Default for FftParams {
    fn default() -> Self {
        Self {
            size: 256,
            family: TransformFamily::StreamingSdf,
            radix: Radix::Radix2,
            decimation: Decimation::InFrequency,
            direction: Direction::Forward,
            runtime_direction: false,
            runtime_size: false,
            full_runtime_radix22: false,
            expand: Vec::new(),
            round: RoundMode::HalfUp,
            retention: TrimSel::KeepMsb,
            runtime_retention: false,
            overflow_status: false,
            adder_regs: 1,
            mult_regs: 1,
            mult_structure: MultStructure::FourMult,
            bit_reverse: true,
            mem_threshold: 64,
            numeric: Numeric::Float64,
        }
    }
}

impl FftParams {
    /// Number of butterfly stages in the full chain.
    pub fn stages(&self) -> usize {
        self.size.trailing_zeros() as usize
    }

    /// Bit growth at a stage, with the empty schedule meaning zero.
    pub fn expand_at(&self, stage: usize) -> u8 {
        self.expand.get(stage).copied().unwrap_or(0)
    }

    /// Run every validator. All must pass before a chain may be built.
    pub fn validate(&self) -> Result<(), ParamError> {
        self.check_size_power_of_two()?;
        self.check_family()?;
        self.check_radix()?;
        self.check_expand_logic()?;
        self.check_pipeline_depth()?;
        self.check_numeric()?;
        Ok(())
    }

    /// The transform size must be a power of two, at least 2.
    pub fn check_size_power_of_two(&self) -> Result<(), ParamError> {
        if self.size < 2 || !self.size.is_power_of_two() {
            return Err(ParamError::SizeNotPowerOfTwo(self.size));
        }
        Ok(())
    }

    /// The transform family must be one this crate generates.
    pub fn check_family(&self) -> Result<(), ParamError> {
        match self.family {
            TransformFamily::StreamingSdf => Ok(()),
        }
    }

    /// The radix must be known and structurally possible: radix-2^2 needs
    /// at least two stages and a decimation-in-frequency dataflow. A plain
    /// delay-feedback cascade cannot express the decimation-in-time
    /// dual-stage grouping without extra reorder memory between groups.
    pub fn check_radix(&self) -> Result<(), ParamError> {
        match self.radix {
            Radix::Radix2 => Ok(()),
            Radix::Radix22 => {
                if self.size < 4 {
                    return Err(ParamError::RadixTooSmall(self.size));
                }
                if self.decimation == Decimation::InTime {
                    return Err(ParamError::RadixDecimationUnsupported);
                }
                Ok(())
            }
        }
    }

    /// Growth is only allowed where the following combine logic can take
    /// the wider operand without a width-reconciling multiplexer: for
    /// decimation-in-frequency, and for decimation-in-time with an even
    /// stage count, every odd-indexed growth entry must be zero; otherwise
    /// every even-indexed entry past position 0 must be zero.
    pub fn check_expand_logic(&self) -> Result<(), ParamError> {
        let stages = self.stages();
        if !self.expand.is_empty() && self.expand.len() != stages {
            return Err(ParamError::ExpandLength {
                got: self.expand.len(),
                want: stages,
            });
        }
        let odd_forbidden = self.decimation == Decimation::InFrequency || stages % 2 == 0;
        for (index, &growth) in self.expand.iter().enumerate() {
            if growth == 0 || index == 0 {
                continue;
            }
            let forbidden = if odd_forbidden {
                index % 2 == 1
            } else {
                index % 2 == 0
            };
            if forbidden {
                return Err(ParamError::ExpandConflict(index));
            }
        }
        Ok(())
    }

    /// A fully combinational feedback cycle is forbidden: at least one of
    /// the two pipeline depths must be nonzero.
    pub fn check_pipeline_depth(&self) -> Result<(), ParamError> {
        if self.adder_regs == 0 && self.mult_regs == 0 {
            return Err(ParamError::ZeroPipelineDepth);
        }
        Ok(())
    }

    /// Fixed-point formats must fit the kernel mantissa, growth included.
    pub fn check_numeric(&self) -> Result<(), ParamError> {
        if let Numeric::Fixed { width, frac } = self.numeric {
            if frac >= width {
                return Err(ParamError::BadFixedFormat { width, frac });
            }
            let grown = width + self.expand.iter().map(|&g| g as u32).sum::<u32>();
            if grown > 30 {
                return Err(ParamError::WidthTooLarge(grown));
            }
        }
        Ok(())
    }
}

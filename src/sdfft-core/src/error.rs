// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Error taxonomies of the engine.
//!
//! Configuration problems are fatal at construction time and surface as
//! [`ParamError`]. Runtime control-register misuse surfaces as
//! [`ControlError`]. Numeric conditions during streaming (overflow,
//! truncation) are never errors; they only raise the sticky status flags.

use thiserror::Error;

/// A configuration was rejected before any engine could be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("transform size {0} is not a power of two of at least 2")]
    SizeNotPowerOfTwo(usize),

    #[error("unknown transform family")]
    UnknownFamily,

    #[error("radix-2^2 needs a transform size of at least 4, got {0}")]
    RadixTooSmall(usize),

    #[error("radix-2^2 is only available for decimation-in-frequency")]
    RadixDecimationUnsupported,

    #[error("bit-growth schedule has {got} entries, the chain has {want} stages")]
    ExpandLength { got: usize, want: usize },

    #[error("bit-growth at stage {0} needs a width-reconciling multiplexer in this decimation order")]
    ExpandConflict(usize),

    #[error("adder and multiplier pipeline depths are both zero")]
    ZeroPipelineDepth,

    #[error("fixed-point width {0} (after growth) exceeds the 30-bit mantissa limit")]
    WidthTooLarge(u32),

    #[error("fixed-point format has {frac} fractional bits but only {width} total bits")]
    BadFixedFormat { width: u32, frac: u32 },

    #[error("numeric prototype does not match the selected kernel")]
    NumericMismatch,
}

/// A runtime control register was poked in a way the configuration or the
/// current engine state does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("register is not present in this configuration")]
    NotConfigured,

    #[error("register can only change while idle (engine is {0})")]
    NotIdle(&'static str),

    #[error("log2 size {got} is outside the supported range 1..={max}")]
    SizeOutOfRange { got: u8, max: u8 },

    #[error("radix-2^2 runtime size must keep the log2 parity of the full chain")]
    SizeParity,

    #[error("stage index {0} is out of range")]
    StageOutOfRange(usize),
}

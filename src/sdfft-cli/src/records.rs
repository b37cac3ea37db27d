// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! JSON-line sample records.

use num_complex::Complex;
use serde::{Deserialize, Serialize};

/// One complex sample on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SampleRec {
    pub re: f64,
    pub im: f64,
}

/// Parse one input line.
///
/// First tries the `{"re": .., "im": ..}` record form; falls back to a bare
/// `[re, im]` pair.
pub fn parse_sample(line: &str) -> Result<Complex<f64>, serde_json::Error> {
    match serde_json::from_str::<SampleRec>(line) {
        Ok(rec) => Ok(Complex::new(rec.re, rec.im)),
        Err(_) => {
            let pair: [f64; 2] = serde_json::from_str(line)?;
            Ok(Complex::new(pair[0], pair[1]))
        }
    }
}

/// Format one output line.
pub fn format_sample(x: Complex<f64>) -> Result<String, serde_json::Error> {
    serde_json::to_string(&SampleRec { re: x.re, im: x.im })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_form() {
        let x = parse_sample(r#"{"re": 1.5, "im": -0.25}"#).unwrap();
        assert_eq!(x, Complex::new(1.5, -0.25));
    }

    #[test]
    fn test_parse_pair_fallback() {
        let x = parse_sample("[2.0, 3.0]").unwrap();
        assert_eq!(x, Complex::new(2.0, 3.0));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_sample("not a sample").is_err());
    }

    #[test]
    fn test_round_trip() {
        let x = Complex::new(0.125, -8.0);
        let line = format_sample(x).unwrap();
        assert_eq!(parse_sample(&line).unwrap(), x);
    }
}

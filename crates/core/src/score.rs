//! Recovery path for realism scores returned as free text.

/// Value recorded when an oracle's score cannot be read as a number.
pub const FALLBACK_REALISM_SCORE: f64 = 0.0;

/// A realism score read from oracle output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedScore {
    pub value: f64,
    /// `true` when the raw text was unusable and `value` is the fallback.
    pub recovered: bool,
}

/// Reads a realism score, substituting [`FALLBACK_REALISM_SCORE`] when the
/// text is not a finite floating-point number.
///
/// Non-finite values count as unusable so every recorded score stays
/// comparable against a threshold.
pub fn parse_realism_score(raw: &str) -> ParsedScore {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => ParsedScore {
            value,
            recovered: false,
        },
        _ => ParsedScore {
            value: FALLBACK_REALISM_SCORE,
            recovered: true,
        },
    }
}

//! Gain (display stretch) algorithm codes.

/// Code every unknown, empty, or missing algorithm resolves to.
pub const DEFAULT_ALGORITHM_CODE: &str = "linear";

/// Codes seeded by the initial migration, in seed order.
pub const SEEDED_ALGORITHM_CODES: &[&str] = &[
    "percentile-gamma",
    "percentile",
    "gamma",
    "linear",
    "log",
    "histogram",
    "raw",
];

/// Normalize a submitted algorithm code for lookup.
///
/// Surrounding whitespace is trimmed; `None`, empty, and whitespace-only
/// codes become [`DEFAULT_ALGORITHM_CODE`].
pub fn normalize_code(code: Option<&str>) -> &str {
    match code.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => DEFAULT_ALGORITHM_CODE,
    }
}

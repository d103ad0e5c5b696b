use crate::errors::{AppError, AppResult};
use crate::models::Tier;
use regex::Regex;
use std::sync::OnceLock;

/// Cached public market code pattern, e.g. `3955-54-LE24`.
static CODE_REGEX: OnceLock<Regex> = OnceLock::new();

fn code_regex() -> &'static Regex {
    CODE_REGEX.get_or_init(|| {
        Regex::new(r"^\d{4,6}-\d{1,2}-(L1|LE|LP|LQ|LR|LS|O1|E2|CO|B2|H2|I2|O2|R1|R2|R3)\d{2}$")
            .expect("public market code pattern is a valid regex")
    })
}

/// Checks a code against the public market grammar
/// `^\d{4,6}-\d{1,2}-(TIER)\d{2}$`.
///
/// # Errors
///
/// Returns `InvalidInput` for an empty code. A malformed code is not an error,
/// it yields `Ok(false)`.
pub fn is_valid_public_market_code(code: &str) -> AppResult<bool> {
    if code.is_empty() {
        return Err(AppError::InvalidInput(
            "Invalid public market code: code cannot be an empty string".into(),
        ));
    }
    Ok(code_regex().is_match(code))
}

/// Validates a code, turning a malformed one into `InvalidTenderCode`.
pub fn ensure_valid_code(code: &str) -> AppResult<()> {
    if is_valid_public_market_code(code)? {
        Ok(())
    } else {
        Err(AppError::InvalidTenderCode(code.to_string()))
    }
}

/// Derives the budget tier from the code suffix: the first two characters of the
/// last `-` segment (`3955-54-LE24` is `LE`).
///
/// # Errors
///
/// Returns `ValueFormat` when the suffix is not a known tier.
pub fn tender_tier(code: &str) -> AppResult<Tier> {
    let suffix = code.rsplit('-').next().unwrap_or_default();
    let prefix: String = suffix.chars().take(2).collect();
    prefix
        .parse::<Tier>()
        .map_err(|_| AppError::ValueFormat(format!("Unknown tier in tender code: {code}")))
}

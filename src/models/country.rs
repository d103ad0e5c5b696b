use crate::errors::AppError;
use std::fmt;
use std::str::FromStr;

const CHILE_ALIASES: &[&str] = &["cl", "chile"];
const EUROPE_ALIASES: &[&str] = &["eu", "europe", "ted"];

/// Procurement portal jurisdiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Country {
    /// Chile (Mercado Publico)
    CL,
    /// European Union (TED)
    EU,
}

impl Country {
    /// Returns a human-readable name for the country.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CL => "Chile",
            Self::EU => "European Union",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CL => write!(f, "CL"),
            Self::EU => write!(f, "EU"),
        }
    }
}

impl FromStr for Country {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // Trim whitespace and compare case-insensitively
        let lower = value.trim().to_lowercase();

        if CHILE_ALIASES.contains(&lower.as_str()) {
            Ok(Self::CL)
        } else if EUROPE_ALIASES.contains(&lower.as_str()) {
            Ok(Self::EU)
        } else {
            Err(AppError::UnsupportedCountry(value.trim().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Country;

    #[test]
    fn test_country_aliases() {
        assert_eq!("cl".parse::<Country>().unwrap(), Country::CL);
        assert_eq!(" Chile ".parse::<Country>().unwrap(), Country::CL);
        assert_eq!("EU".parse::<Country>().unwrap(), Country::EU);
        assert_eq!("ted".parse::<Country>().unwrap(), Country::EU);
    }

    #[test]
    fn test_country_unknown_is_error() {
        let err = "ar".parse::<Country>().unwrap_err();
        assert_eq!(err.to_string(), "Country ar is not supported.");
    }

    #[test]
    fn test_country_display() {
        assert_eq!(Country::CL.to_string(), "CL");
        assert_eq!(Country::EU.display_name(), "European Union");
    }
}

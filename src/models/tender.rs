use crate::errors::{AppError, AppResult};
use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Canonical tender status.
///
/// Mercado Publico exposes the status in three vocabularies (OCDS, the status icon
/// on the tender page, and the bulk CSV). They are not equivalent: OCDS `active`
/// covers both open and recently closed tenders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Published,
    Closed,
    Awarded,
    Unsuccessful,
    Revoked,
    Suspended,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Published,
        Status::Closed,
        Status::Awarded,
        Status::Unsuccessful,
        Status::Revoked,
        Status::Suspended,
    ];

    /// Spanish label used by the portal and the bulk CSV.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Published => "Publicada",
            Self::Closed => "Cerrada",
            Self::Awarded => "Adjudicada",
            Self::Unsuccessful => "Desierta",
            Self::Revoked => "Revocada",
            Self::Suspended => "Suspendida",
        }
    }

    /// Maps an OCDS `tender.status` value.
    pub fn from_open_contract(value: &str) -> AppResult<Self> {
        match value.trim() {
            "active" => Ok(Self::Published),
            "complete" => Ok(Self::Awarded),
            "unsuccessful" => Ok(Self::Unsuccessful),
            "cancelled" => Ok(Self::Revoked),
            "withdrawn" => Ok(Self::Suspended),
            other => Err(AppError::ValueFormat(format!(
                "Unknown OCDS tender status: {other}"
            ))),
        }
    }

    /// Maps the `src` of the `imgEstado` icon, e.g.
    /// `../../Includes/images/FichaLight/iconos_estados/desierta.png`.
    pub fn from_image(src: &str) -> AppResult<Self> {
        let file_name = src
            .split(['?', '#'])
            .next()
            .unwrap_or(src)
            .rsplit('/')
            .next()
            .unwrap_or(src)
            .to_lowercase();

        match file_name.as_str() {
            "publicada.png" | "publicadas.png" => Ok(Self::Published),
            "cerrada.png" | "cerradas.png" => Ok(Self::Closed),
            "adjudicada.png" | "adjudicadas.png" => Ok(Self::Awarded),
            "desierta.png" | "desiertas.png" => Ok(Self::Unsuccessful),
            "revocada.png" | "revocadas.png" => Ok(Self::Revoked),
            "suspendida.png" | "suspendidas.png" => Ok(Self::Suspended),
            _ => Err(AppError::ValueFormat(format!(
                "Unknown status image: {src}"
            ))),
        }
    }

    /// Maps the `Estado` column of the bulk CSV.
    pub fn from_csv(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.display_name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| AppError::ValueFormat(format!("Unknown CSV status: {trimmed}")))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Published => "PUBLISHED",
            Self::Closed => "CLOSED",
            Self::Awarded => "AWARDED",
            Self::Unsuccessful => "UNSUCCESSFUL",
            Self::Revoked => "REVOKED",
            Self::Suspended => "SUSPENDED",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Status {
    type Err = AppError;

    /// Accepts the canonical name (`AWARDED`) or the Spanish label (`Adjudicada`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|status| {
                status.to_string().eq_ignore_ascii_case(trimmed)
                    || status.display_name().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| AppError::ValueFormat(format!("Unknown status: {trimmed}")))
    }
}

/// Budget tier encoded in the tender code suffix (`3955-54-LE24` is `LE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Tier {
    L1,
    LE,
    LP,
    LQ,
    LR,
    LS,
    O1,
    E2,
    CO,
    B2,
    H2,
    I2,
    O2,
    R1,
    R2,
    R3,
}

impl Tier {
    pub const ALL: [Tier; 16] = [
        Tier::L1,
        Tier::LE,
        Tier::LP,
        Tier::LQ,
        Tier::LR,
        Tier::LS,
        Tier::O1,
        Tier::E2,
        Tier::CO,
        Tier::B2,
        Tier::H2,
        Tier::I2,
        Tier::O2,
        Tier::R1,
        Tier::R2,
        Tier::R3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::LE => "LE",
            Self::LP => "LP",
            Self::LQ => "LQ",
            Self::LR => "LR",
            Self::LS => "LS",
            Self::O1 => "O1",
            Self::E2 => "E2",
            Self::CO => "CO",
            Self::B2 => "B2",
            Self::H2 => "H2",
            Self::I2 => "I2",
            Self::O2 => "O2",
            Self::R1 => "R1",
            Self::R2 => "R2",
            Self::R3 => "R3",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Tier {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let upper = value.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == upper)
            .ok_or_else(|| AppError::ValueFormat(format!("Unknown tier: {}", value.trim())))
    }
}

/// Chilean administrative region of the procuring entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Region {
    XV,
    I,
    II,
    III,
    IV,
    V,
    RM,
    VI,
    VII,
    XVI,
    VIII,
    IX,
    XIV,
    X,
    XI,
    XII,
    International,
}

impl Region {
    pub const ALL: [Region; 17] = [
        Region::XV,
        Region::I,
        Region::II,
        Region::III,
        Region::IV,
        Region::V,
        Region::RM,
        Region::VI,
        Region::VII,
        Region::XVI,
        Region::VIII,
        Region::IX,
        Region::XIV,
        Region::X,
        Region::XI,
        Region::XII,
        Region::International,
    ];

    /// Short code (`VIII`, `RM`, `INTERNATIONAL`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::XV => "XV",
            Self::I => "I",
            Self::II => "II",
            Self::III => "III",
            Self::IV => "IV",
            Self::V => "V",
            Self::RM => "RM",
            Self::VI => "VI",
            Self::VII => "VII",
            Self::XVI => "XVI",
            Self::VIII => "VIII",
            Self::IX => "IX",
            Self::XIV => "XIV",
            Self::X => "X",
            Self::XI => "XI",
            Self::XII => "XII",
            Self::International => "INTERNATIONAL",
        }
    }

    /// Official name as published by the portal.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::XV => "Región de Arica y Parinacota",
            Self::I => "Región de Tarapacá",
            Self::II => "Región de Antofagasta",
            Self::III => "Región de Atacama",
            Self::IV => "Región de Coquimbo",
            Self::V => "Región de Valparaíso",
            Self::RM => "Región Metropolitana de Santiago",
            Self::VI => "Región del Libertador General Bernardo O´Higgins",
            Self::VII => "Región del Maule",
            Self::XVI => "Región del Ñuble",
            Self::VIII => "Región del Biobío",
            Self::IX => "Región de la Araucanía",
            Self::XIV => "Región de Los Ríos",
            Self::X => "Región de los Lagos",
            Self::XI => "Región Aysén del General Carlos Ibáñez del Campo",
            Self::XII => "Región de Magallanes y de la Antártica",
            Self::International => "Extranjero",
        }
    }

    /// Resolves a region from its published name, ignoring surrounding whitespace.
    pub fn from_name(name: &str) -> AppResult<Self> {
        let trimmed = name.trim();
        Self::ALL
            .into_iter()
            .find(|region| region.display_name() == trimmed)
            .ok_or_else(|| AppError::ValueFormat(format!("Unknown region: {trimmed}")))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Region {
    type Err = AppError;

    /// Accepts the short code (`VIII`) or the published name.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|region| region.code().eq_ignore_ascii_case(trimmed))
            .map(Ok)
            .unwrap_or_else(|| Self::from_name(trimmed))
    }
}

/// A line of the tender's product grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub index: u32,
    pub title: String,
    pub category: u64,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
}

/// A published answer to a forum question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Tz>,
}

/// A question asked in the tender forum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Tz>,
    pub answer: Option<Answer>,
}

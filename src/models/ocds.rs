//! Typed mirror of the Open Contracting Data Standard record served by
//! `apis.mercadopublico.cl/OCDS/data/record/{code}`. Only the fields the crate
//! reads are modelled; unknown keys are ignored.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OpenContract {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default, rename = "publishedDate")]
    pub published_date: Option<String>,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Record {
    #[serde(default)]
    pub ocid: Option<String>,
    #[serde(rename = "compiledRelease")]
    pub compiled_release: CompiledRelease,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CompiledRelease {
    #[serde(default)]
    pub ocid: Option<String>,
    pub tender: OcdsTender,
    #[serde(default)]
    pub parties: Vec<Party>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OcdsTender {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: String,
    #[serde(rename = "tenderPeriod")]
    pub tender_period: TenderPeriod,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TenderPeriod {
    #[serde(default, rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, rename = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Party {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Address {
    #[serde(default, rename = "streetAddress")]
    pub street_address: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, rename = "countryName")]
    pub country_name: Option<String>,
}

impl OpenContract {
    /// The first record's compiled release, which carries the current tender state.
    pub fn compiled_release(&self) -> AppResult<&CompiledRelease> {
        self.records
            .first()
            .map(|record| &record.compiled_release)
            .ok_or_else(|| AppError::FieldNotFound("OCDS payload has no records".into()))
    }

    pub fn tender(&self) -> AppResult<&OcdsTender> {
        Ok(&self.compiled_release()?.tender)
    }
}

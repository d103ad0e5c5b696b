//! Common test utilities for integration tests

use async_trait::async_trait;
use chrono::NaiveDate;
use licitpy::config::Settings;
use licitpy::errors::{AppError, AppResult};
use licitpy::models::{Country, Item, OpenContract};
use licitpy::sources::TenderAdapter;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Code of the OCDS fixture used across tests.
#[allow(dead_code)]
pub const FIXTURE_CODE: &str = "3955-54-LE24";

/// Settings for tests: no cache, no progress bars, millisecond retries.
#[allow(dead_code)]
pub fn test_settings() -> Settings {
    Settings {
        use_cache: false,
        disable_progress_bar: true,
        max_retries: 2,
        retry_initial_delay_ms: 5,
        retry_max_delay_ms: 20,
        ..Settings::default()
    }
}

/// OCDS record payload as served by the record endpoint.
#[allow(dead_code)]
pub fn ocds_record(code: &str, status: &str, start: &str, end: Option<&str>, region: &str) -> Value {
    json!({
        "uri": format!("https://apis.mercadopublico.cl/OCDS/data/record/{code}"),
        "records": [{
            "ocid": format!("ocds-70d2nz-{code}"),
            "compiledRelease": {
                "ocid": format!("ocds-70d2nz-{code}"),
                "tender": {
                    "id": code,
                    "title": "Adquisición de tubos de acero",
                    "description": "Suministro de tubos de acero galvanizado para obras menores",
                    "status": status,
                    "tenderPeriod": {"startDate": start, "endDate": end}
                },
                "parties": [
                    {
                        "name": "Municipalidad de Coronel",
                        "roles": ["procuringEntity", "buyer"],
                        "address": {"streetAddress": "Calle Principal 123", "region": region}
                    },
                    {"name": "Proveedor Uno", "roles": ["tenderer"]}
                ]
            }
        }]
    })
}

/// The `3955-54-LE24` record: awarded, published 2024-10-04, closed 2024-10-10.
#[allow(dead_code)]
pub fn fixture_record() -> Value {
    ocds_record(
        FIXTURE_CODE,
        "complete",
        "2024-10-04T15:25:56Z",
        Some("2024-10-10T12:42:00Z"),
        "Región del Biobío",
    )
}

#[allow(dead_code)]
pub fn open_contract(value: Value) -> OpenContract {
    serde_json::from_value(value).unwrap()
}

/// Minimal tender page with a status icon, a closing date and one item.
#[allow(dead_code)]
pub fn tender_page(icon: &str, closing: &str) -> String {
    format!(
        r#"<html><body>
        <img id="imgEstado" src="../../Includes/images/FichaLight/iconos_estados/{icon}" />
        <span id="lblFicha3Cierre">{closing}</span>
        <span id="grvProducto_ctl02_lblNumero">1</span>
        <span id="grvProducto_ctl02_lblCategoria">40141700</span>
        <span id="grvProducto_ctl02_lblProducto">Tubos de acero</span>
        <span id="grvProducto_ctl02_lblDescripcion">Tubo galvanizado 2 pulgadas</span>
        <span id="grvProducto_ctl02_lblCantidad">12,5</span>
        <span id="grvProducto_ctl02_lblUnidad">Metro</span>
        </body></html>"#
    )
}

/// Helper function to create an in-memory ZIP with the given files
#[allow(dead_code)]
pub fn create_test_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    use zip::write::FileOptions;
    use zip::ZipWriter;

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buffer);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, content) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }
    buffer.into_inner()
}

/// Call counters of [`FakeAdapter`].
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct Calls {
    pub url: AtomicUsize,
    pub html: AtomicUsize,
    pub open_contract: AtomicUsize,
    pub codes: AtomicUsize,
}

impl Calls {
    #[allow(dead_code)]
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// In-memory Chilean source counting every call.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FakeAdapter {
    pub codes: Vec<String>,
    pub records: HashMap<String, OpenContract>,
    pub pages: HashMap<String, String>,
    pub calls: Calls,
    pub requested_dates: Mutex<Vec<NaiveDate>>,
}

impl FakeAdapter {
    #[allow(dead_code)]
    pub fn with_record(mut self, code: &str, record: Value) -> Self {
        self.records.insert(code.to_string(), open_contract(record));
        self
    }

    #[allow(dead_code)]
    pub fn with_page(mut self, code: &str, html: String) -> Self {
        self.pages.insert(Self::page_url(code), html);
        self
    }

    #[allow(dead_code)]
    pub fn with_codes(mut self, codes: &[&str]) -> Self {
        self.codes = codes.iter().map(|code| code.to_string()).collect();
        self
    }

    #[allow(dead_code)]
    pub fn page_url(code: &str) -> String {
        format!("https://fake.mercadopublico.cl/tender/{code}")
    }
}

#[async_trait]
impl TenderAdapter for FakeAdapter {
    fn country(&self) -> Country {
        Country::CL
    }

    async fn url(&self, code: &str) -> AppResult<String> {
        self.calls.url.fetch_add(1, Ordering::SeqCst);
        Ok(Self::page_url(code))
    }

    async fn html(&self, url: &str) -> AppResult<String> {
        self.calls.html.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
    }

    async fn codes_published_on(&self, date: NaiveDate) -> AppResult<Vec<String>> {
        self.calls.codes.fetch_add(1, Ordering::SeqCst);
        self.requested_dates.lock().unwrap().push(date);
        Ok(self.codes.clone())
    }

    async fn open_contract(&self, code: &str) -> AppResult<OpenContract> {
        self.calls.open_contract.fetch_add(1, Ordering::SeqCst);
        self.records
            .get(code)
            .cloned()
            .ok_or_else(|| AppError::IncompleteRecord(code.to_string()))
    }

    fn items(&self, tender_html: &str) -> AppResult<Vec<Item>> {
        licitpy::parser::tender::items(tender_html)
    }
}

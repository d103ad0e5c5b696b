//! Lazy tender fields against an in-memory source.

mod common;

use common::{fixture_record, ocds_record, tender_page, Calls, FakeAdapter, FIXTURE_CODE};
use licitpy::models::{Item, Region, Status, Tier};
use licitpy::{Award, Tender};
use std::sync::Arc;

fn tender(adapter: &Arc<FakeAdapter>, code: &str) -> Tender {
    Tender::new(code, adapter.clone()).unwrap()
}

#[tokio::test]
async fn test_fixture_fields() {
    let adapter = Arc::new(FakeAdapter::default().with_record(FIXTURE_CODE, fixture_record()));
    let tender = tender(&adapter, FIXTURE_CODE);

    assert_eq!(tender.code(), FIXTURE_CODE);
    assert_eq!(tender.tier().unwrap(), Tier::LE);
    assert_eq!(tender.title().await.unwrap(), "Adquisición de tubos de acero");
    assert_eq!(
        tender.description().await.unwrap(),
        "Suministro de tubos de acero galvanizado para obras menores"
    );
    assert_eq!(tender.region().await.unwrap(), Region::VIII);
    assert_eq!(
        tender.opening_date().await.unwrap().to_rfc3339(),
        "2024-10-04T15:25:56-03:00"
    );
    assert_eq!(
        tender.closing_date().await.unwrap().to_rfc3339(),
        "2024-10-10T12:42:00-03:00"
    );
    assert_eq!(tender.status().await.unwrap(), Status::Awarded);

    // Awarded in OCDS, so the page is never needed
    assert_eq!(Calls::get(&adapter.calls.html), 0);
}

#[tokio::test]
async fn test_fields_are_fetched_once() {
    let adapter = Arc::new(FakeAdapter::default().with_record(FIXTURE_CODE, fixture_record()));
    let tender = tender(&adapter, FIXTURE_CODE);

    for _ in 0..3 {
        tender.title().await.unwrap();
        tender.region().await.unwrap();
        tender.status().await.unwrap();
    }

    assert_eq!(Calls::get(&adapter.calls.open_contract), 1);
}

#[tokio::test]
async fn test_clones_share_cache() {
    let adapter = Arc::new(FakeAdapter::default().with_record(FIXTURE_CODE, fixture_record()));
    let first = tender(&adapter, FIXTURE_CODE);
    let second = first.clone();

    first.title().await.unwrap();
    second.description().await.unwrap();

    assert_eq!(Calls::get(&adapter.calls.open_contract), 1);
}

#[tokio::test]
async fn test_published_past_closing_reads_page_status() {
    let code = "2345-12-LP24";
    let record = ocds_record(
        code,
        "active",
        "2024-10-01T09:00:00Z",
        Some("2024-10-15T15:00:00Z"),
        "Región Metropolitana de Santiago",
    );
    let adapter = Arc::new(
        FakeAdapter::default()
            .with_record(code, record)
            .with_page(code, tender_page("cerrada.png", "15-10-2024 15:00:00")),
    );
    let tender = tender(&adapter, code);

    assert_eq!(tender.status().await.unwrap(), Status::Closed);
    assert_eq!(tender.status().await.unwrap(), Status::Closed);
    assert_eq!(Calls::get(&adapter.calls.url), 1);
    assert_eq!(Calls::get(&adapter.calls.html), 1);
}

#[tokio::test]
async fn test_open_tender_keeps_ocds_status() {
    let code = "2345-13-LE24";
    let record = ocds_record(
        code,
        "active",
        "2024-10-01T09:00:00Z",
        Some("2099-01-01T12:00:00Z"),
        "Región de Valparaíso",
    );
    let adapter = Arc::new(FakeAdapter::default().with_record(code, record));
    let tender = tender(&adapter, code);

    assert_eq!(tender.status().await.unwrap(), Status::Published);
    assert_eq!(Calls::get(&adapter.calls.html), 0);
}

#[tokio::test]
async fn test_missing_ocds_closing_date_falls_back_to_page() {
    let code = "2345-14-L124";
    let record = ocds_record(code, "active", "2024-10-01T09:00:00Z", None, "Región del Maule");
    let adapter = Arc::new(
        FakeAdapter::default()
            .with_record(code, record)
            .with_page(code, tender_page("adjudicada.png", "11-11-2024 15:00:00")),
    );
    let tender = tender(&adapter, code);

    assert_eq!(
        tender.closing_date().await.unwrap().to_rfc3339(),
        "2024-11-11T15:00:00-03:00"
    );
    assert_eq!(tender.status().await.unwrap(), Status::Awarded);
    // The closing date and the status share one page fetch
    assert_eq!(Calls::get(&adapter.calls.html), 1);
}

#[tokio::test]
async fn test_items_from_page() {
    let code = "2345-15-LE24";
    let adapter = Arc::new(
        FakeAdapter::default().with_page(code, tender_page("publicada.png", "11-11-2024 15:00:00")),
    );
    let tender = tender(&adapter, code);

    assert_eq!(
        tender.items().await.unwrap(),
        &[Item {
            index: 1,
            title: "Tubos de acero".into(),
            category: 40141700,
            description: "Tubo galvanizado 2 pulgadas".into(),
            quantity: 12.5,
            unit: "Metro".into(),
        }]
    );
}

#[tokio::test]
async fn test_failed_fetch_is_not_cached() {
    let code = "2345-16-LE24";
    let adapter = Arc::new(FakeAdapter::default());
    let tender = tender(&adapter, code);

    assert!(tender.title().await.is_err());
    assert!(tender.title().await.is_err());
    assert_eq!(Calls::get(&adapter.calls.open_contract), 2);
}

#[tokio::test]
async fn test_unsupported_operations_surface_errors() {
    let adapter = Arc::new(
        FakeAdapter::default().with_page(FIXTURE_CODE, tender_page("publicada.png", "11-11-2024 15:00:00")),
    );
    let tender = tender(&adapter, FIXTURE_CODE);

    let err = tender.attachment_url().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Operation 'attachment_url' is not supported for Chile"
    );
}

#[test]
fn test_invalid_chilean_code_is_rejected() {
    let adapter = Arc::new(FakeAdapter::default());
    assert!(Tender::new("3955-54-XX24", adapter.clone()).is_err());
    assert!(Tender::new("", adapter).is_err());
}

#[tokio::test]
async fn test_award_fields_are_parsed_once() {
    let page = r#"<html><body>
        <span id="lblAwardTypeShow">Adjudicación Múltiple</span>
        <span id="lblAmountShow">$ 1.250.000</span>
        <span id="lblEstimatedAmountShow">$ 1.500.000</span>
        </body></html>"#;
    let adapter = Arc::new(FakeAdapter::default().with_page("award-1001", page.to_string()));
    let award = Award::new(FakeAdapter::page_url("award-1001"), adapter.clone());

    let first = award.method().await.unwrap().to_string();
    assert_eq!(award.method().await.unwrap(), first);
    assert_eq!(award.amount().await.unwrap(), 1_250_000);
    assert_eq!(award.amount().await.unwrap(), 1_250_000);
    assert_eq!(award.estimated_amount().await.unwrap(), 1_500_000);
    assert_eq!(Calls::get(&adapter.calls.html), 1);
}

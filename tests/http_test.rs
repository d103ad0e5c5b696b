//! Network flows against a mock server.

#[path = "common/mod.rs"]
mod common;

use chrono::NaiveDate;
use common::{create_test_zip, fixture_record, ocds_record, test_settings, FIXTURE_CODE};
use licitpy::config::Endpoints;
use licitpy::downloader::{download_attachment, AttachmentDownload, Backoff, HttpClient, RetryConfig};
use licitpy::errors::AppError;
use licitpy::models::Status;
use licitpy::Licitpy;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DETAILS_PATH: &str = "/Procurement/Modules/RFB/DetailsAcquisition.aspx";

fn friday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, 4).unwrap()
}

fn client(server: &MockServer) -> Licitpy {
    Licitpy::with_endpoints(test_settings(), Endpoints::single_host(&server.uri())).unwrap()
}

#[tokio::test]
async fn test_tender_url_follows_redirect_query_string() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path(DETAILS_PATH))
        .and(query_param("idlicitacion", FIXTURE_CODE))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{DETAILS_PATH}?qs=abc123").as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tender = client(&server).cl().unwrap().get(FIXTURE_CODE).unwrap();
    let expected = format!("{}{DETAILS_PATH}?qs=abc123", server.uri());

    assert_eq!(tender.url().await.unwrap(), expected);
    assert_eq!(tender.url().await.unwrap(), expected);
}

#[tokio::test]
async fn test_tender_url_without_redirect_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path(DETAILS_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let tender = client(&server).cl().unwrap().get(FIXTURE_CODE).unwrap();
    let err = tender.url().await.unwrap_err();
    assert_eq!(err.to_string(), "No redirect found for tender 3955-54-LE24");
}

#[tokio::test]
async fn test_incomplete_ocds_record_is_retried() {
    let server = MockServer::start().await;
    let record_path = format!("/OCDS/data/record/{FIXTURE_CODE}");

    Mock::given(method("GET"))
        .and(path(record_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uri": "partial"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(record_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture_record()))
        .mount(&server)
        .await;

    let tender = client(&server).cl().unwrap().get(FIXTURE_CODE).unwrap();
    assert_eq!(tender.title().await.unwrap(), "Adquisición de tubos de acero");
    assert_eq!(tender.status().await.unwrap(), Status::Awarded);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_search_merges_listing_and_bulk_export() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/APISOCDS/OCDS/listaOCDSAgnoMes/2024/10/0/1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pagination": {"total": 4},
            "data": [
                {"urlTender": "https://apis.mercadopublico.cl/OCDS/data/tender/1001-1-LE24"},
                {"urlTender": "https://apis.mercadopublico.cl/OCDS/data/tender/1001-9-LE24"},
                {"urlTender": "https://apis.mercadopublico.cl/OCDS/data/tender/1001-8-LE24"},
                {"urlTender": "https://apis.mercadopublico.cl/OCDS/data/tender/"}
            ]
        })))
        .mount(&server)
        .await;

    let csv = "CodigoExterno;FechaPublicacion;Nombre\n\
               1001-1-LE24;2024-10-04 09:12:00.000;Tubos\n\
               1001-1-LE24;2024-10-04 09:12:00.000;Tubos\n\
               1001-2-LE24;2024-10-03 11:00:00;Cemento\n\
               500977-2-LE24;2024-10-04 08:00:00;Prueba\n";
    Mock::given(method("GET"))
        .and(path("/lic-da/2024-10.zip"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(create_test_zip(&[("lic_2024-10.csv", csv.as_bytes())])),
        )
        .mount(&server)
        .await;

    // Only in the listing: one published that day, one the day after
    Mock::given(method("GET"))
        .and(path("/OCDS/data/record/1001-9-LE24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ocds_record(
            "1001-9-LE24",
            "active",
            "2024-10-04T18:00:00Z",
            None,
            "Región del Maule",
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/OCDS/data/record/1001-8-LE24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ocds_record(
            "1001-8-LE24",
            "active",
            "2024-10-05T10:00:00Z",
            None,
            "Región del Maule",
        )))
        .mount(&server)
        .await;

    let tenders = client(&server)
        .cl()
        .unwrap()
        .search()
        .published_on(friday(), false)
        .unwrap()
        .collect()
        .await
        .unwrap();

    let codes: Vec<&str> = tenders.iter().map(|tender| tender.code()).collect();
    assert_eq!(codes, vec!["1001-1-LE24", "1001-9-LE24"]);
}

#[tokio::test]
async fn test_missing_bulk_export_uses_listing_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/APISOCDS/OCDS/listaOCDSAgnoMes/2024/10/0/1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pagination": {"total": 1},
            "data": [{"urlTender": "https://apis.mercadopublico.cl/OCDS/data/tender/1001-9-LE24"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lic-da/2024-10.zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/OCDS/data/record/1001-9-LE24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ocds_record(
            "1001-9-LE24",
            "active",
            "2024-10-04T18:00:00Z",
            None,
            "Región del Maule",
        )))
        .mount(&server)
        .await;

    let tenders = client(&server)
        .cl()
        .unwrap()
        .search()
        .published_on(friday(), false)
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(tenders.len(), 1);
    assert_eq!(tenders[0].code(), "1001-9-LE24");
}

#[tokio::test]
async fn test_search_fails_when_publication_date_cannot_be_resolved() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/APISOCDS/OCDS/listaOCDSAgnoMes/2024/10/0/1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pagination": {"total": 2},
            "data": [
                {"urlTender": "https://apis.mercadopublico.cl/OCDS/data/tender/1001-1-LE24"},
                {"urlTender": "https://apis.mercadopublico.cl/OCDS/data/tender/1002-1-LE24"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lic-da/2024-10.zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/OCDS/data/record/1001-1-LE24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ocds_record(
            "1001-1-LE24",
            "active",
            "2024-10-04T09:00:00Z",
            None,
            "Región del Maule",
        )))
        .mount(&server)
        .await;
    // Never carries `records`, so every retry is spent
    Mock::given(method("GET"))
        .and(path("/OCDS/data/record/1002-1-LE24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uri": "partial"})))
        .mount(&server)
        .await;

    let result = client(&server)
        .cl()
        .unwrap()
        .search()
        .published_on(friday(), false)
        .unwrap()
        .collect()
        .await;

    assert!(matches!(result, Err(AppError::IncompleteRecord(code)) if code == "1002-1-LE24"));
}

#[tokio::test]
async fn test_ted_search_pages_until_total() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/notices/search"))
        .and(body_partial_json(json!({"query": "publication-date=20241004", "page": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notices": [
                {"publication-number": "600123-2024"},
                {"publication-number": "600001-2024"}
            ],
            "totalNoticeCount": 3
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/notices/search"))
        .and(body_partial_json(json!({"page": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notices": [{"publication-number": "600050-2024"}],
            "totalNoticeCount": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let eu = client(&server).eu().unwrap();
    let tenders = eu.search().published_on(friday(), false).unwrap().collect().await.unwrap();

    let codes: Vec<&str> = tenders.iter().map(|tender| tender.code()).collect();
    assert_eq!(codes, vec!["600001-2024", "600050-2024", "600123-2024"]);
    assert_eq!(
        tenders[0].url().await.unwrap(),
        format!("{}/en/notice/600001-2024/html", server.uri())
    );
}

#[tokio::test]
async fn test_attachment_download_is_base64() {
    let server = MockServer::start().await;
    let page = r#"<html><body><form>
        <input type="hidden" id="__VIEWSTATE" value="state123" />
        <input type="hidden" id="__VIEWSTATEGENERATOR" value="ABCDEF01" />
    </form></body></html>"#;

    Mock::given(method("GET"))
        .and(path("/attachments"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/attachments"))
        .and(body_string_contains("__VIEWSTATE=state123"))
        .and(body_string_contains("__VIEWSTATEGENERATOR=ABCDEF01"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello".to_vec()))
        .expect(2)
        .mount(&server)
        .await;

    let http = HttpClient::new(&test_settings()).unwrap();
    let page_url = format!("{}/attachments", server.uri());
    let request = AttachmentDownload {
        page_url: &page_url,
        attachment_id: "02",
        file_name: "bases.pdf",
        size: 5,
    };
    let retry = RetryConfig {
        max_retries: 1,
        initial_delay_ms: 5,
        max_delay_ms: 10,
        backoff: Backoff::Linear,
    };

    let content = download_attachment(&http, &request, &retry, true).await.unwrap();
    assert_eq!(content, "aGVsbG8=");

    // A bogus size label ("4000000000 Mb") does not size the buffer
    let oversized = AttachmentDownload {
        size: 4_000_000_000 * 1024 * 1024,
        ..request
    };
    let content = download_attachment(&http, &oversized, &retry, true).await.unwrap();
    assert_eq!(content, "aGVsbG8=");
}

#[tokio::test]
async fn test_monthly_package_download() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/packages/monthly/2024-03"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"package".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let settings = licitpy::config::Settings {
        download_dir: dir.path().to_path_buf(),
        ..test_settings()
    };
    let client = Licitpy::with_endpoints(settings, Endpoints::single_host(&server.uri())).unwrap();
    let eu = client.eu().unwrap();

    let path = eu.download_monthly(2024, 3).await.unwrap();
    assert_eq!(path, dir.path().join("2024-03.tar.gz"));
    assert_eq!(std::fs::read(&path).unwrap(), b"package");
    assert!(!dir.path().join("2024-03.tar.gz.part").exists());

    // Present files are not downloaded again
    let again = eu.download_monthly(2024, 3).await.unwrap();
    assert_eq!(again, path);
}

#[tokio::test]
async fn test_unsupported_country_operation() {
    let server = MockServer::start().await;
    let eu = client(&server).eu().unwrap();
    let tender = eu.get("600001-2024").unwrap();

    let err = tender.title().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Operation 'open_contract' is not supported for European Union"
    );
}

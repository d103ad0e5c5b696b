//! Purchase order pages: the list popup of a tender and the order detail page.

use super::html::{cached_selector, element_text, HtmlPage};
use super::values::parse_portal_date;
use crate::constants::PURCHASE_ORDER_DETAILS_PATH;
use crate::errors::AppResult;
use crate::models::PurchaseOrderStatus;
use chrono::NaiveDate;
use regex::Regex;
use scraper::Selector;
use std::sync::OnceLock;

static ORDER_LINK_SELECTOR: OnceLock<Selector> = OnceLock::new();
static ORDER_LINK_REGEX: OnceLock<Regex> = OnceLock::new();

fn order_link_regex() -> &'static Regex {
    ORDER_LINK_REGEX.get_or_init(|| {
        Regex::new(r"^rptSearchOCDetail_ctl\d+_lkNumOC$").expect("order link pattern is a valid regex")
    })
}

pub fn url(code: &str, base_url: &str) -> String {
    format!("{base_url}{PURCHASE_ORDER_DETAILS_PATH}?codigoOC={code}")
}

/// Order codes listed in the tender's purchase order popup, in page order.
pub fn codes(html: &str) -> AppResult<Vec<String>> {
    let page = HtmlPage::parse(html)?;
    Ok(page
        .document()
        .select(cached_selector(&ORDER_LINK_SELECTOR, "[id]"))
        .filter(|element| {
            element
                .value()
                .id()
                .is_some_and(|id| order_link_regex().is_match(id))
        })
        .map(|element| element_text(&element))
        .filter(|code| !code.is_empty())
        .collect())
}

pub fn status(html: &str) -> AppResult<PurchaseOrderStatus> {
    HtmlPage::parse(html)?.text_by_id("lblStatusPOValue")?.parse()
}

pub fn title(html: &str) -> AppResult<String> {
    HtmlPage::parse(html)?.text_by_id("lblNamePOValue")
}

pub fn issue_date(html: &str) -> AppResult<NaiveDate> {
    parse_portal_date(&HtmlPage::parse(html)?.text_by_id("lblCreationDatePOValue")?)
}

/// Code of the tender the order came from. Direct purchases have none.
pub fn tender_code(html: &str) -> AppResult<Option<String>> {
    let page = HtmlPage::parse(html)?;
    if !page.has_element_id("lblProvenience") {
        return Ok(None);
    }
    let code = page.text_by_id("lblProvenience")?;
    Ok((!code.is_empty()).then_some(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER_HTML: &str = r#"<html><body>
        <span id="lblStatusPOValue">Recepción Conforme</span>
        <span id="lblNamePOValue">Orden de Compra Ejemplo</span>
        <span id="lblCreationDatePOValue">06-12-2024</span>
        <span id="lblProvenience">750301-54-L124</span>
    </body></html>"#;

    #[test]
    fn test_url_from_code() {
        assert_eq!(
            url("12345678", "https://www.mercadopublico.cl"),
            "https://www.mercadopublico.cl/PurchaseOrder/Modules/PO/DetailsPurchaseOrder.aspx?codigoOC=12345678"
        );
    }

    #[test]
    fn test_codes_in_page_order() {
        let html = r#"<html><body>
            <a id="rptSearchOCDetail_ctl00_lkNumOC">750301-261-SE24</a>
            <a id="rptSearchOCDetail_ctl01_lkNumOC">750301-262-SE24</a>
            <a id="rptSearchOCDetail_ctl02_lkNumOC">750301-263-SE24</a>
            <a id="rptSearchOCDetail_ctl02_lkOther">ignored</a>
        </body></html>"#;
        assert_eq!(
            codes(html).unwrap(),
            vec!["750301-261-SE24", "750301-262-SE24", "750301-263-SE24"]
        );
    }

    #[test]
    fn test_order_fields() {
        assert_eq!(status(ORDER_HTML).unwrap(), PurchaseOrderStatus::ReceivedConforming);
        assert_eq!(title(ORDER_HTML).unwrap(), "Orden de Compra Ejemplo");
        assert_eq!(
            issue_date(ORDER_HTML).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 6).unwrap()
        );
        assert_eq!(tender_code(ORDER_HTML).unwrap().as_deref(), Some("750301-54-L124"));
    }

    #[test]
    fn test_invalid_issue_date() {
        let html = r#"<html><body><span id="lblCreationDatePOValue">invalid-date</span></body></html>"#;
        let err = issue_date(html).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The date string 'invalid-date' does not match ISO (YYYY-MM-DD) or dd-mm-yyyy formats."
        );
    }

    #[test]
    fn test_tender_code_absent() {
        let html = "<html><body></body></html>";
        assert!(tender_code(html).unwrap().is_none());
    }
}

//! Tender field extraction from the OCDS record and the tender detail page.

use super::html::HtmlPage;
use super::values::{parse_ocds_datetime, parse_portal_datetime};
use crate::constants::{
    ATTACHMENT_VIEW_PATH, AWARD_PREVIEW_PATH, PURCHASE_ORDER_LIST_PATH, QUESTIONS_VIEW_PATH,
};
use crate::errors::{AppError, AppResult};
use crate::models::{Item, OpenContract, Region, Status};
use chrono::DateTime;
use chrono_tz::Tz;
use regex::Regex;
use std::sync::OnceLock;

const PROCURING_ENTITY_ROLE: &str = "procuringEntity";

static ATTACHMENT_HASH_REGEX: OnceLock<Regex> = OnceLock::new();
static QUERY_STRING_REGEX: OnceLock<Regex> = OnceLock::new();
static ITEM_CODE_REGEX: OnceLock<Regex> = OnceLock::new();

fn attachment_hash_regex() -> &'static Regex {
    ATTACHMENT_HASH_REGEX.get_or_init(|| {
        Regex::new(r"ViewAttachment\.aspx\?enc=(.*)','").expect("attachment pattern is a valid regex")
    })
}

pub(crate) fn query_string_regex() -> &'static Regex {
    QUERY_STRING_REGEX
        .get_or_init(|| Regex::new(r"qs=(.*)$").expect("query string pattern is a valid regex"))
}

fn item_code_regex() -> &'static Regex {
    ITEM_CODE_REGEX.get_or_init(|| {
        Regex::new(r"grvProducto_ctl(\d{2})_lblNumero").expect("item pattern is a valid regex")
    })
}

pub fn code(contract: &OpenContract) -> AppResult<String> {
    Ok(contract.tender()?.id.clone())
}

pub fn title(contract: &OpenContract) -> AppResult<String> {
    Ok(contract.tender()?.title.trim().to_string())
}

pub fn description(contract: &OpenContract) -> AppResult<String> {
    Ok(contract.tender()?.description.trim().to_string())
}

/// Status as reported by OCDS, before any reconciliation with the page.
pub fn ocds_status(contract: &OpenContract) -> AppResult<Status> {
    Status::from_open_contract(&contract.tender()?.status)
}

/// `tenderPeriod.startDate` in Santiago time.
pub fn opening_date(contract: &OpenContract) -> AppResult<DateTime<Tz>> {
    let start = contract
        .tender()?
        .tender_period
        .start_date
        .as_deref()
        .ok_or_else(|| AppError::FieldNotFound("tenderPeriod.startDate not found".into()))?;
    parse_ocds_datetime(start)
}

/// `tenderPeriod.endDate` in Santiago time, `None` when OCDS publishes `null`.
pub fn closing_date_from_ocds(contract: &OpenContract) -> AppResult<Option<DateTime<Tz>>> {
    contract
        .tender()?
        .tender_period
        .end_date
        .as_deref()
        .map(parse_ocds_datetime)
        .transpose()
}

/// Region of the single procuring entity among the OCDS parties.
///
/// # Errors
///
/// Returns `ProcuringEntity` when zero or several parties hold the role, or when
/// the party has no address or region.
pub fn region(contract: &OpenContract) -> AppResult<Region> {
    let parties = &contract.compiled_release()?.parties;
    let entities: Vec<_> = parties
        .iter()
        .filter(|party| party.roles.iter().any(|role| role == PROCURING_ENTITY_ROLE))
        .collect();

    let [entity] = entities.as_slice() else {
        return Err(AppError::ProcuringEntity(
            "There must be exactly one entity with the role of procuringEntity.".into(),
        ));
    };

    let region = entity
        .address
        .as_ref()
        .and_then(|address| address.region.as_deref())
        .ok_or_else(|| {
            AppError::ProcuringEntity(
                "The address or region is missing for the procuring entity.".into(),
            )
        })?;

    Region::from_name(region)
}

/// Status derived from the `imgEstado` icon on the tender page.
pub fn status_from_html(html: &str) -> AppResult<Status> {
    let page = HtmlPage::parse(html)?;
    let src = page.attribute_by_id("imgEstado", "src")?;
    Status::from_image(&src)
}

/// Closing date shown on the tender page.
///
/// Tenders with an eligibility stage publish `lblFicha3CierreIdoneidad`; the
/// others only `lblFicha3Cierre`.
pub fn closing_date_from_html(html: &str) -> AppResult<DateTime<Tz>> {
    let page = HtmlPage::parse(html)?;
    let id = if page.has_element_id("lblFicha3CierreIdoneidad") {
        "lblFicha3CierreIdoneidad"
    } else {
        "lblFicha3Cierre"
    };
    parse_portal_datetime(&page.required_text_by_id(id)?)
}

/// Whether the OCDS status must be replaced by the icon status.
///
/// OCDS `active` stays set after bidding closes, so a published tender whose
/// closing date has passed has to be checked against the page.
pub fn needs_html_status(
    status: Status,
    closing_date: Option<&DateTime<Tz>>,
    now: &DateTime<Tz>,
) -> bool {
    let is_open = closing_date.map(|closing| now < closing).unwrap_or(false);
    status == Status::Published && !is_open
}

/// Attachment page URL embedded in the `imgAdjuntos` onclick handler.
pub fn attachment_url(html: &str, base_url: &str) -> AppResult<String> {
    let page = HtmlPage::parse(html)?;
    let onclick = page.attribute_by_id("imgAdjuntos", "onclick")?;
    let hash = attachment_hash_regex()
        .captures(&onclick)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| AppError::FieldNotFound("Attachment URL hash not found".into()))?;

    Ok(format!("{base_url}{ATTACHMENT_VIEW_PATH}?enc={hash}"))
}

/// Purchase order list URL behind `imgOrdenCompra`.
///
/// Returns `Ok(None)` when the tender has no purchase orders yet (the link is
/// rendered without a target).
pub fn purchase_orders_url(html: &str, base_url: &str) -> AppResult<Option<String>> {
    let page = HtmlPage::parse(html)?;
    if !page.has_element_id("imgOrdenCompra") {
        return Ok(None);
    }
    let href = page
        .attribute_by_id("imgOrdenCompra", "href")
        .unwrap_or_default();
    if href.trim().is_empty() {
        return Ok(None);
    }

    let query = extract_query_string(&href)
        .ok_or_else(|| AppError::FieldNotFound("Purchase Order query string not found".into()))?;
    Ok(Some(format!("{base_url}{PURCHASE_ORDER_LIST_PATH}?qs={query}")))
}

/// Public forum URL behind `imgPreguntasLicitacion`.
pub fn questions_url(html: &str, base_url: &str) -> AppResult<String> {
    let page = HtmlPage::parse(html)?;
    let href = page.attribute_by_id("imgPreguntasLicitacion", "href")?;
    let query = extract_query_string(&href)
        .ok_or_else(|| AppError::FieldNotFound("Questions query string not found".into()))?;
    Ok(format!("{base_url}{QUESTIONS_VIEW_PATH}?qs={query}"))
}

/// Internal forum code stored in the `h_intRBFCode` input of the forum page.
pub fn question_code(html: &str) -> AppResult<String> {
    let page = HtmlPage::parse(html)?;
    let element = page.element_by_id("h_intRBFCode")?;
    Ok(element.value().attr("value").unwrap_or_default().trim().to_string())
}

/// Award act URL behind `imgAdjudicacion`.
pub fn award_url(html: &str, base_url: &str) -> AppResult<String> {
    let page = HtmlPage::parse(html)?;
    let href = page.attribute_by_id("imgAdjudicacion", "href")?;
    let query = extract_query_string(&href)
        .ok_or_else(|| AppError::FieldNotFound("Awarded query string not found".into()))?;
    Ok(format!("{base_url}{AWARD_PREVIEW_PATH}?qs={query}"))
}

/// Row suffixes (`02`, `03`, ...) of the product grid.
pub fn item_codes(html: &str) -> AppResult<Vec<String>> {
    let page = HtmlPage::parse(html)?;
    Ok(page.scan_ids(item_code_regex()))
}

/// Reads one row of the product grid.
pub fn item(html: &str, code: &str) -> AppResult<Item> {
    let page = HtmlPage::parse(html)?;
    item_from_page(&page, code)
}

/// Reads every row of the product grid.
pub fn items(html: &str) -> AppResult<Vec<Item>> {
    let page = HtmlPage::parse(html)?;
    page.scan_ids(item_code_regex())
        .iter()
        .map(|code| item_from_page(&page, code))
        .collect()
}

fn item_from_page(page: &HtmlPage<'_>, code: &str) -> AppResult<Item> {
    let field = |name: &str| page.text_by_id(&format!("grvProducto_ctl{code}_{name}"));

    let index = field("lblNumero")?;
    let title = field("lblProducto")?;
    let category = field("lblCategoria")?;
    let description = field("lblDescripcion")?;
    let quantity = field("lblCantidad")?;
    let unit = field("lblUnidad")?;

    Ok(Item {
        index: index
            .parse()
            .map_err(|_| AppError::ValueFormat(format!("Invalid item index: {index}")))?,
        title,
        category: category
            .parse()
            .map_err(|_| AppError::ValueFormat(format!("Invalid item category: {category}")))?,
        description,
        quantity: parse_quantity(&quantity)?,
        unit,
    })
}

/// Quantities use `,` as the decimal separator and `.` for thousands.
fn parse_quantity(text: &str) -> AppResult<f64> {
    text.trim()
        .replace('.', "")
        .replace(',', ".")
        .parse()
        .map_err(|_| AppError::ValueFormat(format!("Invalid item quantity: {text}")))
}

pub(crate) fn extract_query_string(href: &str) -> Option<String> {
    query_string_regex()
        .captures(href.trim())
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|query| !query.is_empty())
}

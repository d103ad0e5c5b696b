//! Attachment table (`DWNL_grdId`) parsing for the `ViewAttachment.aspx` page.

use super::html::{cached_selector, element_text, HtmlPage};
use super::values::parse_size;
use crate::constants::SIGNED_BASE_TYPE;
use crate::errors::{AppError, AppResult};
use crate::models::AttachmentInfo;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::OnceLock;

const TABLE_ID: &str = "DWNL_grdId";

static ROW_SELECTOR: OnceLock<Selector> = OnceLock::new();
static CELL_SELECTOR: OnceLock<Selector> = OnceLock::new();
static INPUT_SELECTOR: OnceLock<Selector> = OnceLock::new();
static SPAN_SELECTOR: OnceLock<Selector> = OnceLock::new();
static ATTACHMENT_ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn attachment_id_regex() -> &'static Regex {
    ATTACHMENT_ID_REGEX
        .get_or_init(|| Regex::new(r"ctl(\d+)").expect("attachment id pattern is a valid regex"))
}

/// Parses every row of the attachment table.
///
/// Only `tr` elements carrying a `class` attribute are data rows; the header
/// and pager rows have none.
///
/// # Errors
///
/// Fails when the table or its data rows are missing, or when a required cell
/// (id, name, type, size, upload date) is absent or malformed.
pub fn attachments(html: &str) -> AppResult<Vec<AttachmentInfo>> {
    let page = HtmlPage::parse(html)?;
    let table = page.element_by_id(TABLE_ID).map_err(|_| {
        AppError::FieldNotFound(format!("Table with ID '{TABLE_ID}' not found"))
    })?;

    let rows: Vec<ElementRef<'_>> = table
        .select(cached_selector(&ROW_SELECTOR, "tr[class]"))
        .collect();

    if rows.is_empty() {
        return Err(AppError::FieldNotFound("No rows found in the table".into()));
    }

    rows.iter().map(attachment_from_row).collect()
}

/// The attachment holding the signed tender base.
pub fn signed_base<A: AsRef<AttachmentInfo>>(attachments: &[A]) -> AppResult<&A> {
    attachments
        .iter()
        .find(|attachment| attachment.as_ref().attachment_type.contains(SIGNED_BASE_TYPE))
        .ok_or(AppError::SignedBaseNotFound)
}

/// ASP.NET `__VIEWSTATE` of the page, required to post back a download.
pub fn view_state(html: &str) -> AppResult<String> {
    HtmlPage::parse(html)?.attribute_by_id("__VIEWSTATE", "value")
}

/// ASP.NET `__VIEWSTATEGENERATOR`, absent on some page versions.
pub fn view_state_generator(html: &str) -> AppResult<Option<String>> {
    let page = HtmlPage::parse(html)?;
    if !page.has_element_id("__VIEWSTATEGENERATOR") {
        return Ok(None);
    }
    page.attribute_by_id("__VIEWSTATEGENERATOR", "value").map(Some)
}

fn attachment_from_row(row: &ElementRef<'_>) -> AppResult<AttachmentInfo> {
    let cells: Vec<ElementRef<'_>> = row
        .select(cached_selector(&CELL_SELECTOR, "td"))
        .collect();
    let cell = |index: usize| cells.get(index);

    let required = |index: usize, field: &str| {
        cell(index)
            .and_then(span_text)
            .ok_or_else(|| AppError::FieldNotFound(format!("Attachment {field} not found")))
    };

    let id = attachment_id(cell(0))?;
    let name = required(1, "name")?;
    let attachment_type = required(2, "type")?;
    let description = cell(3).and_then(span_text).unwrap_or_default();
    let size = parse_size(&required(4, "size")?)?;
    let upload_date = required(5, "upload date")?;

    Ok(AttachmentInfo {
        id,
        name,
        attachment_type,
        description,
        size,
        upload_date,
    })
}

fn attachment_id(cell: Option<&ElementRef<'_>>) -> AppResult<String> {
    let input_id = cell
        .and_then(|td| td.select(cached_selector(&INPUT_SELECTOR, "input")).next())
        .and_then(|input| input.value().id())
        .ok_or_else(|| AppError::FieldNotFound("No input ID found in the first column".into()))?;

    attachment_id_regex()
        .captures(input_id)
        .map(|captures| captures[1].to_string())
        .ok_or_else(|| AppError::FieldNotFound("No match found for attachment ID".into()))
}

fn span_text(cell: &ElementRef<'_>) -> Option<String> {
    cell.select(cached_selector(&SPAN_SELECTOR, "span"))
        .next()
        .map(|span| element_text(&span))
        .filter(|text| !text.is_empty())
}

//! Award act (`PreviewAwardAct.aspx`) parsing.

use super::html::HtmlPage;
use super::values::parse_amount;
use crate::errors::{AppError, AppResult};
use crate::models::{AwardResult, ItemAward, SupplierBid};
use regex::Regex;
use std::sync::OnceLock;

static ITEM_CODE_REGEX: OnceLock<Regex> = OnceLock::new();
static RUT_REGEX: OnceLock<Regex> = OnceLock::new();

fn item_code_regex() -> &'static Regex {
    ITEM_CODE_REGEX.get_or_init(|| {
        Regex::new(r"grdItemOC_ctl(\d{2})_ucAward__lblNumber")
            .expect("award item pattern is a valid regex")
    })
}

fn rut_regex() -> &'static Regex {
    RUT_REGEX.get_or_init(|| {
        Regex::new(r"^\s*(\d{1,2}(?:\.\d{3}){2}-[\dkK])\s+(.+?)\s*$")
            .expect("rut pattern is a valid regex")
    })
}

/// Award method label (`lblAwardTypeShow`), kept verbatim.
pub fn method(html: &str) -> AppResult<String> {
    HtmlPage::parse(html)?.text_by_id("lblAwardTypeShow")
}

pub fn amount(html: &str) -> AppResult<i64> {
    parse_amount(&HtmlPage::parse(html)?.text_by_id("lblAmountShow")?)
}

pub fn estimated_amount(html: &str) -> AppResult<i64> {
    parse_amount(&HtmlPage::parse(html)?.text_by_id("lblEstimatedAmountShow")?)
}

/// Row suffixes of the awarded item grid.
pub fn item_codes(html: &str) -> AppResult<Vec<String>> {
    Ok(HtmlPage::parse(html)?.scan_ids(item_code_regex()))
}

/// Row suffixes of the supplier grid nested under item `item_code`.
pub fn supplier_codes(html: &str, item_code: &str) -> AppResult<Vec<String>> {
    let page = HtmlPage::parse(html)?;
    Ok(supplier_codes_in_page(&page, item_code))
}

fn supplier_codes_in_page(page: &HtmlPage<'_>, item_code: &str) -> Vec<String> {
    // Built per item; the item code only ever holds two digits.
    match Regex::new(&format!(
        r"grdItemOC_ctl{item_code}_ucAward_gvLines_ctl(\d{{2}})_gvLines_lblOrganization"
    )) {
        Ok(pattern) => page.scan_ids(&pattern),
        Err(_) => Vec::new(),
    }
}

/// Splits `"76.123.456-7 EMPRESA SPA"` into rut and name.
///
/// # Errors
///
/// Returns `ValueFormat` when the label does not start with a formatted rut.
pub fn split_rut_and_name(label: &str) -> AppResult<(String, String)> {
    let captures = rut_regex().captures(label).ok_or_else(|| {
        AppError::ValueFormat(format!("Supplier label without rut: '{}'", label.trim()))
    })?;
    Ok((captures[1].to_string(), captures[2].to_string()))
}

/// Reads the whole results table with every nested supplier bid.
pub fn results(html: &str) -> AppResult<AwardResult> {
    let page = HtmlPage::parse(html)?;

    let items = page
        .scan_ids(item_code_regex())
        .iter()
        .map(|code| item_award(&page, code))
        .collect::<AppResult<Vec<_>>>()?;

    let total_awarded_amount = parse_amount(&page.text_by_id("lblAmountTotalDetail")?)?;

    Ok(AwardResult {
        items,
        total_awarded_amount,
    })
}

fn item_award(page: &HtmlPage<'_>, code: &str) -> AppResult<ItemAward> {
    let field = |name: &str| page.text_by_id(&format!("grdItemOC_ctl{code}_ucAward_{name}"));

    let index = field("_lblNumber")?;
    let suppliers = supplier_codes_in_page(page, code)
        .iter()
        .map(|supplier| supplier_bid(page, code, supplier))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ItemAward {
        index: index
            .parse()
            .map_err(|_| AppError::ValueFormat(format!("Invalid award item index: {index}")))?,
        onu_code: field("lblCodeonu")?,
        name: field("_LblSchemaTittle")?,
        description: field("lblDescription")?,
        quantity: field("_LblRBICuantityNumber")?,
        total_awarded_amount: parse_amount(&field("lblTotalLine")?)?,
        suppliers,
    })
}

fn supplier_bid(page: &HtmlPage<'_>, item: &str, supplier: &str) -> AppResult<SupplierBid> {
    let field = |name: &str| {
        page.text_by_id(&format!(
            "grdItemOC_ctl{item}_ucAward_gvLines_ctl{supplier}_gvLines_{name}"
        ))
    };

    let (rut, name) = split_rut_and_name(&field("lblOrganization")?)?;

    Ok(SupplierBid {
        rut,
        name,
        item_description: field("lblSupplierComment")?,
        total_price: parse_amount(&field("lblTotalNetPrice")?)?,
        awarded_quantity: field("txtAwardedQuantity")?,
        total_awarded_amount: parse_amount(&field("lblTotalNetAward")?)?,
        result: field("lblIsSelected")?.parse()?,
    })
}

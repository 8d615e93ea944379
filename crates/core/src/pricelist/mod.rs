//! Price-list document parser.
//!
//! Turns the vendor's price-list PDF into a provisional, operator-reviewable
//! extraction. Pure transform: the same bytes always produce the same
//! preview, and nothing is written anywhere.
//!
//! Document layout this understands:
//! - page 1 is a cover page and is skipped
//! - product pages carry ALL-CAPS block titles, `Modelo:`/`MODELO:`
//!   sub-segments, bulleted spec lines, `U$S X.XXX.=` price lines and
//!   `OPCIONALES` sub-lists
//! - a block whose body starts with `PRECIO` is a price summary for the
//!   preceding product
//! - the page titled `CONDICIONES COMERCIALES` lists payment conditions
//!   as `a) ... e)` entries
//!
//! Anything ambiguous is emitted with `price = None` rather than guessed;
//! the operator resolves it during review. Page-level `OPCIONALES PARA
//! <category>` blocks are not auto-linked to the category's products; they
//! are dropped from the product list and left for manual assignment.

mod conditions;
mod lines;
mod product;
mod text;

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::machine::Currency;
use crate::errors::ParseError;

pub use text::extract_pages;

/// Heading that marks the payment-conditions page.
const CONDITIONS_HEADING: &str = "CONDICIONES COMERCIALES";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedOptional {
    pub name: String,
    pub price: Option<Decimal>,
}

/// One provisional product extracted from the document. Not persisted
/// until the operator confirms the import.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedProduct {
    pub code: String,
    pub product_title: String,
    pub model_name: String,
    pub name: String,
    pub category: String,
    pub price: Option<Decimal>,
    pub price_currency: Currency,
    pub specs: Vec<String>,
    pub optionals: Vec<ParsedOptional>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedCondition {
    pub name: String,
    pub discount_percent: Decimal,
    pub description: String,
    pub sort_order: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviewResult {
    pub products: Vec<ParsedProduct>,
    pub payment_conditions: Vec<ParsedCondition>,
    pub total_products: usize,
    pub total_with_price: usize,
}

/// Parse a price-list PDF from raw bytes.
pub fn parse(document: &[u8]) -> Result<PreviewResult, ParseError> {
    let pages = text::extract_pages(document)?;
    Ok(parse_pages(&pages))
}

/// Like [`parse`] but rejecting documents above `max_bytes` before any
/// extraction work happens.
pub fn parse_with_limit(document: &[u8], max_bytes: usize) -> Result<PreviewResult, ParseError> {
    if document.len() > max_bytes {
        return Err(ParseError::TooLarge { limit: max_bytes });
    }
    parse(document)
}

/// Parse already-extracted page texts. Exposed so the layout logic can be
/// exercised without a PDF in front of it.
pub fn parse_pages(pages: &[String]) -> PreviewResult {
    let mut products: Vec<ParsedProduct> = Vec::new();
    let mut payment_conditions: Vec<ParsedCondition> = Vec::new();
    let mut next_index = 1usize;

    for (page_number, page) in pages.iter().enumerate() {
        if page_number == 0 {
            // cover page
            continue;
        }
        if page.contains(CONDITIONS_HEADING) {
            payment_conditions.extend(conditions::parse_conditions(page));
            continue;
        }

        let page_products = parse_page(page, next_index);
        next_index += page_products.len();
        products.extend(page_products);
    }

    dedup_codes(&mut products);
    let total_with_price = products.iter().filter(|product| product.price.is_some()).count();

    PreviewResult {
        total_products: products.len(),
        total_with_price,
        products,
        payment_conditions,
    }
}

/// Parse one product page: split into title blocks, fold price-summary
/// blocks into the preceding product, skip unattached category-wide
/// optional blocks.
fn parse_page(page: &str, start_index: usize) -> Vec<ParsedProduct> {
    let page_lines: Vec<String> = page
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !lines::is_page_header(line))
        .map(str::to_string)
        .collect();

    let mut blocks: Vec<(String, Vec<String>)> = Vec::new();
    let mut current_title: Option<String> = None;
    let mut current_body: Vec<String> = Vec::new();
    // Category-wide `OPCIONALES PARA <X>` lists are not attributable to a
    // single product; everything until the next title is left for manual
    // assignment by the operator.
    let mut skipping_unattached = false;

    for line in page_lines {
        if lines::is_product_title(&line) {
            skipping_unattached = false;
            if let Some(title) = current_title.take() {
                blocks.push((title, std::mem::take(&mut current_body)));
            }
            current_title = Some(line);
        } else if lines::is_unattached_optional_marker(&line) {
            skipping_unattached = true;
        } else if !skipping_unattached {
            current_body.push(line);
        }
    }
    if let Some(title) = current_title {
        blocks.push((title, current_body));
    }

    let mut products: Vec<ParsedProduct> = Vec::new();
    let mut index = start_index;

    for (title, body) in blocks {
        let is_summary = body.first().map(String::as_str) == Some("PRECIO");
        if is_summary {
            attach_summary(&mut products, &body);
        } else {
            let block_products = product::parse_product_block(&title, &body, index);
            index += block_products.len();
            products.extend(block_products);
        }
    }

    products
}

/// A summary block repeats the previous product with its price and
/// optionals; fold those into that product instead of emitting a new one.
fn attach_summary(products: &mut [ParsedProduct], body: &[String]) {
    let mut price: Option<Decimal> = None;
    let mut optional_lines: Vec<String> = Vec::new();
    let mut in_optionals = false;

    for line in body {
        if lines::is_optional_section(line) {
            in_optionals = true;
            continue;
        }
        if in_optionals {
            optional_lines.push(line.clone());
        } else if price.is_none() {
            price = lines::parse_price(line);
        }
    }

    if let Some(last) = products.last_mut() {
        if last.price.is_none() {
            last.price = price;
        }
        if !optional_lines.is_empty() {
            last.optionals.extend(product::parse_optionals(&optional_lines));
        }
    }
}

/// Guarantee unique codes across the whole document: repeats get a
/// positional `-N` suffix in document order.
fn dedup_codes(products: &mut [ParsedProduct]) {
    let mut seen: HashMap<String, u32> = HashMap::new();
    for product in products {
        match seen.get_mut(&product.code) {
            Some(count) => {
                *count += 1;
                product.code = format!("{}-{}", product.code, count);
            }
            None => {
                seen.insert(product.code.clone(), 0);
            }
        }
    }
}

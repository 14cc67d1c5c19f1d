//! Tolerant, data-driven field extraction.
//!
//! Every field is described by an ordered list of [`Locator`]s. The first
//! locator that produces a non-empty value wins; a field nobody can locate is
//! simply absent. Only a missing product name discards a record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::parser::{
    clean_text, extract_count, extract_price, extract_rating, is_out_of_stock,
};
use super::{DetailedOffer, RawOffer, SourceId};

const MAX_DESCRIPTION_CHARS: usize = 500;
const MAX_SPEC_ROWS: usize = 10;

/// Where to look for one field value.
#[derive(Debug, Clone, Copy)]
pub struct Locator {
    pub selector: &'static str,
    /// Attributes tried in order before falling back to text
    pub attrs: &'static [&'static str],
    pub text: bool,
}

impl Locator {
    pub const fn text(selector: &'static str) -> Self {
        Self {
            selector,
            attrs: &[],
            text: true,
        }
    }

    pub const fn attr(selector: &'static str, attrs: &'static [&'static str]) -> Self {
        Self {
            selector,
            attrs,
            text: false,
        }
    }

    pub const fn attr_or_text(selector: &'static str, attrs: &'static [&'static str]) -> Self {
        Self {
            selector,
            attrs,
            text: true,
        }
    }
}

/// Locators for a search results page.
#[derive(Debug, Clone, Copy)]
pub struct ListingPolicy {
    /// Alternative item node selectors, one per known page template
    pub item_selectors: &'static [&'static str],
    pub name: &'static [Locator],
    pub url: &'static [Locator],
    pub price: &'static [Locator],
    pub image: &'static [Locator],
    pub availability: &'static [Locator],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceStrategy {
    /// Price of the first matching element
    First,
    /// Lowest price across all matching store rows; available when any row has a price
    LowestOfStores,
}

/// Locators for a single product page.
#[derive(Debug, Clone, Copy)]
pub struct DetailPolicy {
    pub name: &'static [Locator],
    pub description: &'static [Locator],
    pub price: &'static [Locator],
    pub price_strategy: PriceStrategy,
    pub old_price: &'static [Locator],
    pub image: &'static [Locator],
    pub availability: &'static [Locator],
    pub rating: &'static [Locator],
    pub review_count: &'static [Locator],
    pub sku: &'static [Locator],
    /// Breadcrumb containers; the last link's text is the category
    pub breadcrumbs: &'static [&'static str],
    /// Specification table rows; first two cells are key and value
    pub spec_rows: &'static [&'static str],
}

/// Per-fetch values stamped onto every extracted record.
#[derive(Debug, Clone)]
pub struct ExtractContext<'a> {
    pub source: SourceId,
    pub base_url: &'a Url,
    pub currency: &'a str,
    pub out_of_stock_phrases: &'a [String],
    pub observed_at: DateTime<Utc>,
}

/// Parse a search results page into at most `max_results` offers.
pub fn parse_listing(
    html: &str,
    policy: &ListingPolicy,
    ctx: &ExtractContext<'_>,
    max_results: usize,
) -> Vec<RawOffer> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let Some(items) = first_matching_nodes(root, policy.item_selectors) else {
        tracing::debug!("[{}] No product nodes matched any item selector", ctx.source);
        return Vec::new();
    };

    let total = items.len();
    let offers: Vec<RawOffer> = items
        .into_iter()
        .filter_map(|item| parse_item(item, policy, ctx))
        .take(max_results)
        .collect();

    tracing::debug!(
        "[{}] Extracted {} offers from {} candidate nodes",
        ctx.source,
        offers.len(),
        total
    );

    offers
}

fn parse_item(
    item: ElementRef<'_>,
    policy: &ListingPolicy,
    ctx: &ExtractContext<'_>,
) -> Option<RawOffer> {
    let name = first_value(item, policy.name)?;

    let availability = first_value(item, policy.availability)
        .map(|text| !is_out_of_stock(&text, ctx.out_of_stock_phrases))
        .unwrap_or(true);

    Some(RawOffer {
        source: ctx.source,
        name,
        price: first_value(item, policy.price).and_then(|t| extract_price(&t)),
        currency: ctx.currency.to_string(),
        url: first_value(item, policy.url).and_then(|href| resolve_url(ctx.base_url, &href)),
        image_url: first_value(item, policy.image).and_then(|src| resolve_url(ctx.base_url, &src)),
        description: None,
        category: None,
        availability,
        observed_at: ctx.observed_at,
    })
}

/// Parse a product page. `None` when no product name can be found.
pub fn parse_detail(
    html: &str,
    policy: &DetailPolicy,
    ctx: &ExtractContext<'_>,
    product_url: &str,
) -> Option<DetailedOffer> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let name = first_value(root, policy.name)?;

    let (price, store_available) = match policy.price_strategy {
        PriceStrategy::First => (first_value(root, policy.price).and_then(|t| extract_price(&t)), None),
        PriceStrategy::LowestOfStores => {
            let lowest = lowest_price(&all_values(root, policy.price));
            (lowest, Some(lowest.is_some()))
        }
    };

    let marked_available = first_value(root, policy.availability)
        .map(|text| !is_out_of_stock(&text, ctx.out_of_stock_phrases))
        .unwrap_or(true);
    let availability = marked_available && store_available.unwrap_or(true);

    let old_price = first_value(root, policy.old_price).and_then(|t| extract_price(&t));
    let on_sale = matches!((old_price, price), (Some(old), Some(current)) if old > current);

    let description = first_value(root, policy.description)
        .map(|text| text.chars().take(MAX_DESCRIPTION_CHARS).collect::<String>());

    let offer = RawOffer {
        source: ctx.source,
        name,
        price,
        currency: ctx.currency.to_string(),
        url: Some(product_url.to_string()),
        image_url: first_value(root, policy.image).and_then(|src| resolve_url(ctx.base_url, &src)),
        description,
        category: last_breadcrumb(root, policy.breadcrumbs),
        availability,
        observed_at: ctx.observed_at,
    };

    Some(DetailedOffer {
        offer,
        sku: first_value(root, policy.sku),
        rating: first_value(root, policy.rating).and_then(|t| extract_rating(&t)),
        review_count: first_value(root, policy.review_count).and_then(|t| extract_count(&t)),
        old_price,
        on_sale,
        specs: spec_table(root, policy.spec_rows),
    })
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!("Skipping invalid selector '{}': {}", selector, e);
            None
        }
    }
}

/// Nodes of the first selector that matches anything.
fn first_matching_nodes<'a>(
    scope: ElementRef<'a>,
    selectors: &[&str],
) -> Option<Vec<ElementRef<'a>>> {
    selectors.iter().find_map(|raw| {
        let selector = parse_selector(raw)?;
        let nodes: Vec<ElementRef<'a>> = scope.select(&selector).collect();
        if nodes.is_empty() { None } else { Some(nodes) }
    })
}

fn locate(element: ElementRef<'_>, locator: &Locator) -> Option<String> {
    for attr in locator.attrs {
        if let Some(value) = element.value().attr(attr) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    if locator.text {
        let text = element_text(element);
        if !text.is_empty() {
            return Some(text);
        }
    }

    None
}

/// First non-empty value produced by the locators, in order.
pub fn first_value(scope: ElementRef<'_>, locators: &[Locator]) -> Option<String> {
    locators.iter().find_map(|locator| {
        let selector = parse_selector(locator.selector)?;
        scope
            .select(&selector)
            .find_map(|element| locate(element, locator))
    })
}

/// Every value produced by the first locator that matches anything.
fn all_values(scope: ElementRef<'_>, locators: &[Locator]) -> Vec<String> {
    locators
        .iter()
        .find_map(|locator| {
            let selector = parse_selector(locator.selector)?;
            let values: Vec<String> = scope
                .select(&selector)
                .filter_map(|element| locate(element, locator))
                .collect();
            if values.is_empty() { None } else { Some(values) }
        })
        .unwrap_or_default()
}

/// Visible text of an element, ignoring script and style contents.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut pieces: Vec<&str> = Vec::new();

    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style"))
        });
        if !hidden {
            pieces.push(&**text);
        }
    }

    clean_text(&pieces.join(" "))
}

fn last_breadcrumb(root: ElementRef<'_>, containers: &[&str]) -> Option<String> {
    let container = first_matching_nodes(root, containers)?.into_iter().next()?;
    let link = parse_selector("a")?;
    container
        .select(&link)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .last()
}

fn spec_table(root: ElementRef<'_>, row_selectors: &[&str]) -> BTreeMap<String, String> {
    let mut specs = BTreeMap::new();
    let (Some(rows), Some(cell)) = (
        first_matching_nodes(root, row_selectors),
        parse_selector("td, th"),
    ) else {
        return specs;
    };

    for row in rows.into_iter().take(MAX_SPEC_ROWS) {
        let cells: Vec<String> = row.select(&cell).map(element_text).collect();
        if let [key, value, ..] = cells.as_slice() {
            if !key.is_empty() {
                specs.insert(key.clone(), value.clone());
            }
        }
    }

    specs
}

/// Resolve a possibly relative link against the site's base URL.
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    base.join(href).ok().map(String::from)
}

/// Lowest parseable price among several store prices.
pub fn lowest_price(values: &[String]) -> Option<Decimal> {
    values.iter().filter_map(|t| extract_price(t)).min()
}

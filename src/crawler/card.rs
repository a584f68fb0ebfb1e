//! Card parsing
//!
//! A search results page carries up to [`crate::crawler::PAGE_SIZE`] listing
//! cards. Card markup is inconsistent: newer cards embed a JSON-LD block
//! with the canonical listing URL, older ones only carry a relative link in
//! the title anchor, and any summary attribute may be missing. Parsing is
//! therefore total: each field is extracted independently and falls back to
//! empty instead of failing the record.

use crate::records::ListingRecord;
use chrono::Utc;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

/// Selector identifying one listing card
pub const CARD_SELECTOR: &str = "div.mb-srp__card";

/// Origin used to absolutize relative listing links
const SITE_ORIGIN: &str = "https://www.magicbricks.com";

/// Parses every listing card out of a rendered results page
pub fn parse_cards(html: &str) -> Vec<ListingRecord> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(CARD_SELECTOR) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|card| parse_card(&card))
        .collect()
}

/// Extracts one record from a card fragment
///
/// Never fails: a field whose markup is absent or malformed comes back as
/// `None` and the remaining fields are still extracted.
pub fn parse_card(card: &ElementRef<'_>) -> ListingRecord {
    let title = select_text(card, ".mb-srp__card--title");
    let listing_url = extract_listing_url(card);
    let summary = extract_summary(card);

    let locality = extract_locality(title.as_deref());
    let bhk = extract_bhk(title.as_deref());
    let property_id = extract_property_id(listing_url.as_deref());
    let price_raw = select_text(card, ".mb-srp__card__price--amount");

    ListingRecord {
        title,
        listing_url,
        area_raw: summary.area,
        status: summary.status,
        floor: summary.floor,
        transaction: summary.transaction,
        furnishing: summary.furnishing,
        facing: summary.facing,
        bhk,
        locality,
        property_id,
        scraped_timestamp: Utc::now().to_rfc3339(),
        price_raw,
    }
}

/// Trimmed text of the first element matching `css`, if any
fn select_text(card: &ElementRef<'_>, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    let element = card.select(&selector).next()?;
    let text = element.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Listing URL, preferring the embedded JSON-LD block
///
/// The JSON-LD payload is either a list of objects or a single object; the
/// first `url` key wins. When the block is missing, malformed, or lacks a
/// URL, falls back to the title anchor, resolving leading-slash hrefs
/// against the site origin.
fn extract_listing_url(card: &ElementRef<'_>) -> Option<String> {
    json_ld_url(card).or_else(|| title_anchor_url(card))
}

fn json_ld_url(card: &ElementRef<'_>) -> Option<String> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    let script = card.select(&selector).next()?;
    let raw = script.text().collect::<String>();

    let data: Value = match serde_json::from_str(raw.trim()) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Could not parse JSON-LD block: {}", e);
            return None;
        }
    };

    let url = match &data {
        Value::Array(items) => items.first().and_then(|item| item.get("url")),
        Value::Object(_) => data.get("url"),
        _ => None,
    };
    url.and_then(Value::as_str).map(str::to_string)
}

fn title_anchor_url(card: &ElementRef<'_>) -> Option<String> {
    let selector = Selector::parse("h2.mb-srp__card__title a").ok()?;
    let href = card.select(&selector).next()?.value().attr("href")?;
    if let Some(relative) = href.strip_prefix('/') {
        Some(format!("{}/{}", SITE_ORIGIN, relative))
    } else {
        Some(href.to_string())
    }
}

/// Locality is whatever follows the last " in " of the title
fn extract_locality(title: Option<&str>) -> Option<String> {
    let (_, locality) = title?.rsplit_once(" in ")?;
    let locality = locality.trim();
    (!locality.is_empty()).then(|| locality.to_string())
}

/// Bedroom count: the integer preceding "BHK" in the title
fn extract_bhk(title: Option<&str>) -> Option<u32> {
    let pattern = Regex::new(r"(?i)(\d+)\s*BHK").ok()?;
    pattern
        .captures(title?)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Property identifier from the listing URL
///
/// An `id=<hex>` query parameter takes precedence over the `pdpid-<hex>`
/// slug found in JSON-LD URLs.
fn extract_property_id(listing_url: Option<&str>) -> Option<String> {
    let url = listing_url?;

    let id_pattern = Regex::new(r"[&?]id=([a-fA-F0-9]+)").ok()?;
    if let Some(captures) = id_pattern.captures(url) {
        return Some(captures.get(1)?.as_str().to_string());
    }

    let pdpid_pattern = Regex::new(r"pdpid-([a-fA-F0-9]+)").ok()?;
    Some(pdpid_pattern.captures(url)?.get(1)?.as_str().to_string())
}

#[derive(Debug, Default)]
struct SummaryFields {
    area: Option<String>,
    status: Option<String>,
    floor: Option<String>,
    transaction: Option<String>,
    furnishing: Option<String>,
    facing: Option<String>,
}

/// Walks the summary block's label/value pairs
///
/// Labels are matched on lowercased substrings; the value is the next
/// sibling value element. Last write wins if a label repeats.
fn extract_summary(card: &ElementRef<'_>) -> SummaryFields {
    let mut fields = SummaryFields::default();

    let (Ok(container_selector), Ok(label_selector)) = (
        Selector::parse("div.mb-srp__card__summary"),
        Selector::parse("div.mb-srp__card__summary--label"),
    ) else {
        return fields;
    };

    let Some(container) = card.select(&container_selector).next() else {
        return fields;
    };

    for label_element in container.select(&label_selector) {
        let label = label_element
            .text()
            .collect::<String>()
            .trim()
            .to_lowercase();
        let Some(value_element) = next_value_sibling(&label_element) else {
            continue;
        };
        let value = value_element.text().collect::<String>().trim().to_string();

        if label.contains("area") {
            fields.area = Some(value);
        } else if label.contains("status") {
            fields.status = Some(value);
        } else if label.contains("floor") {
            fields.floor = Some(value);
        } else if label.contains("transaction") {
            fields.transaction = Some(value);
        } else if label.contains("furnishing") {
            fields.furnishing = Some(value);
        } else if label.contains("facing") {
            fields.facing = Some(value);
        }
    }

    fields
}

/// First following sibling that is a summary value element
fn next_value_sibling<'a>(label: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    label
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|element| {
            element
                .value()
                .classes()
                .any(|class| class == "mb-srp__card__summary--value")
        })
}

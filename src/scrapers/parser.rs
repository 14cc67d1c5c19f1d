use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

lazy_static! {
    // First number in the text. Thousands groups may be split by commas or
    // whitespace ("₪1,299", "₪1 299") and the fraction may sit in its own
    // node ("₪1,299 .90" from `1,299<sup>.90</sup>`).
    static ref PRICE_REGEX: Regex = Regex::new(r"\d+(?:[,\s]\d{3})*(?:\s*\.\s*\d+)?").unwrap();

    static ref RATING_REGEX: Regex = Regex::new(r"\d+(?:\.\d+)?").unwrap();
}

/// Extract a positive price from display text.
///
/// Currency symbols, labels and thousands separators are ignored; the value is
/// rounded to 2 decimal places. Anything unparseable yields `None`.
pub fn extract_price(text: &str) -> Option<Decimal> {
    let matched = PRICE_REGEX.find(text)?;
    let digits: String = matched
        .as_str()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let price = Decimal::from_str(&digits).ok()?.round_dp(2);
    if price > Decimal::ZERO {
        Some(price)
    } else {
        None
    }
}

/// Extract a star rating such as "4.5" from "4.5 / 5".
pub fn extract_rating(text: &str) -> Option<f64> {
    RATING_REGEX
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Keep only the digits: "1,234 reviews" -> 1234.
pub fn extract_count(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// True when the text contains one of the configured out-of-stock phrases.
pub fn is_out_of_stock(text: &str, phrases: &[String]) -> bool {
    let text = text.to_lowercase();
    phrases
        .iter()
        .any(|phrase| !phrase.is_empty() && text.contains(&phrase.to_lowercase()))
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

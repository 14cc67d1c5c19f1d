//! KSP.co.il, computer and electronics chain.

use super::SourceId;
use super::extract::{DetailPolicy, ListingPolicy, Locator, PriceStrategy};
use super::site::SiteProfile;

pub const BASE_URL: &str = "https://ksp.co.il";

const LISTING: ListingPolicy = ListingPolicy {
    item_selectors: &["div.product-item", "div.item", "div[data-product-id]"],
    name: &[
        Locator::text("a.product-name"),
        Locator::text("h3"),
        Locator::text("a.name"),
    ],
    url: &[
        Locator::attr("a.product-name", &["href"]),
        Locator::attr("h3 a", &["href"]),
        Locator::attr("a.name", &["href"]),
    ],
    price: &[
        Locator::attr_or_text("span.price", &["data-price"]),
        Locator::text("div.price-wrapper"),
        Locator::attr_or_text("span[data-price]", &["data-price"]),
    ],
    image: &[
        Locator::attr("img.product-image", &["src", "data-src"]),
        Locator::attr("img", &["src", "data-src"]),
    ],
    availability: &[Locator::text("span.availability"), Locator::text("div.stock")],
};

const DETAIL: DetailPolicy = DetailPolicy {
    name: &[Locator::text("h1.product-name"), Locator::text("h1.title")],
    description: &[
        Locator::text("div.product-description"),
        Locator::text("div.description"),
    ],
    price: &[
        Locator::attr_or_text("span.price-value", &["data-price"]),
        Locator::attr_or_text("span[data-price]", &["data-price"]),
    ],
    price_strategy: PriceStrategy::First,
    old_price: &[Locator::text("span.old-price")],
    image: &[
        Locator::attr("img.main-image", &["src", "data-src"]),
        Locator::attr("img.product-image-main", &["src", "data-src"]),
    ],
    availability: &[
        Locator::text("span.availability"),
        Locator::text("div.stock-status"),
    ],
    rating: &[],
    review_count: &[],
    sku: &[Locator::text("span.sku"), Locator::text("span.product-code")],
    breadcrumbs: &["div.breadcrumbs", "nav.breadcrumb"],
    spec_rows: &["table.specifications tr", "div.specs tr"],
};

pub fn profile() -> SiteProfile {
    SiteProfile {
        source: SourceId::Ksp,
        base_url: BASE_URL.to_string(),
        search_endpoint_template: "/web/he/search?q={query}",
        listing: LISTING,
        detail: DETAIL,
    }
}

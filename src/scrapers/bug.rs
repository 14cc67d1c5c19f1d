//! Bug.co.il, electronics chain.

use super::SourceId;
use super::extract::{DetailPolicy, ListingPolicy, Locator, PriceStrategy};
use super::site::SiteProfile;

pub const BASE_URL: &str = "https://www.bug.co.il";

const LISTING: ListingPolicy = ListingPolicy {
    item_selectors: &["div.product-card", "div.item-product", "article.product"],
    name: &[
        Locator::text("a.product-title"),
        Locator::text("h3"),
        Locator::text("a.title"),
        Locator::text("div.name"),
    ],
    url: &[Locator::attr("a[href]", &["href"])],
    price: &[
        Locator::attr_or_text("span.price", &["data-price"]),
        Locator::text("div.price-box"),
        Locator::attr_or_text("span[data-price]", &["data-price"]),
    ],
    image: &[
        Locator::attr("img.product-img", &["src", "data-src", "data-lazy-src"]),
        Locator::attr("img", &["src", "data-src", "data-lazy-src"]),
    ],
    availability: &[Locator::text("span.stock"), Locator::text("div.availability")],
};

const DETAIL: DetailPolicy = DetailPolicy {
    name: &[Locator::text("h1.product-title"), Locator::text("h1")],
    description: &[
        Locator::text("div.product-description"),
        Locator::text("div.description"),
    ],
    price: &[
        Locator::attr_or_text("span.price-current", &["data-price"]),
        Locator::attr_or_text("span.final-price", &["data-price"]),
    ],
    price_strategy: PriceStrategy::First,
    old_price: &[Locator::text("span.price-old"), Locator::text("span.old-price")],
    image: &[
        Locator::attr("img.main-product-image", &["src", "data-src"]),
        Locator::attr("img[itemprop='image']", &["src", "data-src"]),
    ],
    availability: &[
        Locator::text("div.stock-status"),
        Locator::text("span.availability"),
    ],
    rating: &[
        Locator::attr_or_text("div.product-rating", &["data-rating", "content"]),
        Locator::attr_or_text("span[itemprop='ratingValue']", &["content"]),
    ],
    review_count: &[
        Locator::attr_or_text("span[itemprop='reviewCount']", &["content"]),
        Locator::text("span.review-count"),
    ],
    sku: &[
        Locator::text("span.product-code"),
        Locator::attr_or_text("span[itemprop='sku']", &["content"]),
    ],
    breadcrumbs: &["nav.breadcrumb", "div.breadcrumbs"],
    spec_rows: &["table.specifications tr"],
};

pub fn profile() -> SiteProfile {
    SiteProfile {
        source: SourceId::Bug,
        base_url: BASE_URL.to_string(),
        search_endpoint_template: "/search?q={query}",
        listing: LISTING,
        detail: DETAIL,
    }
}

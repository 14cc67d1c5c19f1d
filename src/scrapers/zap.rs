//! Zap.co.il, Israel's largest price comparison site.
//!
//! Search results list one card per model with a price range; the model page
//! lists individual stores, so the detail price is the cheapest store.

use super::SourceId;
use super::extract::{DetailPolicy, ListingPolicy, Locator, PriceStrategy};
use super::site::SiteProfile;

pub const BASE_URL: &str = "https://www.zap.co.il";

const LISTING: ListingPolicy = ListingPolicy {
    item_selectors: &["div.ProdBox", "div.product-item"],
    name: &[Locator::text("a.ModelTitle"), Locator::text("h3")],
    url: &[
        Locator::attr("a.ModelTitle", &["href"]),
        Locator::attr("h3 a", &["href"]),
        Locator::attr("a[href]", &["href"]),
    ],
    price: &[Locator::text("span.Price"), Locator::text("div.price")],
    image: &[Locator::attr("img", &["src", "data-src"])],
    availability: &[],
};

const DETAIL: DetailPolicy = DetailPolicy {
    name: &[Locator::text("h1.ModelTitle"), Locator::text("h1")],
    description: &[Locator::text("div.ModelDesc"), Locator::text("div.description")],
    price: &[
        Locator::text("tr.BizRow span.Price"),
        Locator::text("div.store-item span.Price"),
    ],
    price_strategy: PriceStrategy::LowestOfStores,
    old_price: &[],
    image: &[
        Locator::attr("img.MainImg", &["src", "data-src"]),
        Locator::attr("img[itemprop='image']", &["src", "data-src"]),
    ],
    availability: &[],
    rating: &[],
    review_count: &[],
    sku: &[],
    breadcrumbs: &["div.breadcrumbs", "nav.breadcrumb"],
    spec_rows: &["table.specifications tr"],
};

pub fn profile() -> SiteProfile {
    SiteProfile {
        source: SourceId::Zap,
        base_url: BASE_URL.to_string(),
        search_endpoint_template: "/search.aspx?keyword={query}",
        listing: LISTING,
        detail: DETAIL,
    }
}

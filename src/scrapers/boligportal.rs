use crate::models::{DetailValue, ListingDetails, SchemaVariant};
use crate::normalize;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use std::collections::HashMap;

/// Site origin, used to absolutize relative listing links.
pub const ORIGIN: &str = "https://www.boligportal.dk";

const TITLE_SELECTOR: &str = "span.css-v34a4n";
const DESCRIPTION_SELECTOR: &str = "div.css-1j674uz";
const DATE_SELECTOR: &str = "span.css-avchh2";
const BREADCRUMB_SELECTOR: &str = "a.css-10zxfph";
const CARD_LINK_SELECTOR: &str = "a.AdCardSrp__Link";
const DETAIL_ROW_SELECTOR: &str = "div.css-1ksgrzt";
const DETAIL_LABEL_SELECTOR: &str = "span.css-1td16zm";
const DETAIL_VALUE_SELECTOR: &str = "span.css-1f8murc";

// Three known gallery template variants, tried in priority order.
const IMAGE_SELECTORS: [&str; 3] = ["img.css-1dz0toi", "img.css-i2cz4f", "img.css-1aus8y6"];

const TRI_STATE_TOKENS: [&str; 3] = ["Ja", "Nej", "Ikke angivet"];

/// Extract every listing-card link from a search-results page.
///
/// An empty result is the pagination termination signal, not an error.
pub fn parse_listing_urls(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(CARD_LINK_SELECTOR).unwrap();

    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| {
            if href.starts_with('/') {
                format!("{ORIGIN}{href}")
            } else {
                href.to_string()
            }
        })
        .collect()
}

/// Extract the structured fields of one listing detail page.
///
/// Every field falls back to a sentinel on absence; a missing marker never
/// fails the whole parse. `now` anchors relative publish-date phrases.
pub fn parse_listing_details(
    html: &str,
    variant: SchemaVariant,
    now: DateTime<Utc>,
) -> ListingDetails {
    let document = Html::parse_document(html);

    let title = first_text(&document, TITLE_SELECTOR)
        .unwrap_or_else(|| "No title found".to_string());

    let description = match variant {
        SchemaVariant::Basic => Some(
            first_text(&document, DESCRIPTION_SELECTOR)
                .unwrap_or_else(|| "No description found".to_string()),
        ),
        SchemaVariant::Extended => None,
    };

    let published_date = match variant {
        SchemaVariant::Extended => Some(
            first_text(&document, DATE_SELECTOR)
                .map(|raw| normalize::normalize_date(&raw, now))
                .unwrap_or_else(|| "No date found".to_string()),
        ),
        SchemaVariant::Basic => None,
    };

    // Breadcrumb trail is "home / category / city / ..."; the city sits at
    // index 2. Known to be positional and fragile.
    let breadcrumb = Selector::parse(BREADCRUMB_SELECTOR).unwrap();
    let city = document
        .select(&breadcrumb)
        .nth(2)
        .map(element_text)
        .unwrap_or_else(|| "No city found".to_string());

    let images = extract_images(&document);
    let details = extract_detail_rows(&document);

    ListingDetails {
        title,
        description,
        published_date,
        city,
        images,
        details,
    }
}

/// First selector that yields at least one image src wins; later template
/// variants are not consulted once an earlier one matches.
fn extract_images(document: &Html) -> Vec<String> {
    for css in IMAGE_SELECTORS {
        let selector = Selector::parse(css).unwrap();
        let images: Vec<String> = document
            .select(&selector)
            .filter_map(|img| img.value().attr("src"))
            .map(str::to_string)
            .collect();
        if !images.is_empty() {
            return images;
        }
    }
    Vec::new()
}

/// One scan over the detail rows builds the combined label/value map that
/// both the housing and rental groupings are derived from.
fn extract_detail_rows(document: &Html) -> HashMap<String, DetailValue> {
    let row = Selector::parse(DETAIL_ROW_SELECTOR).unwrap();
    let label = Selector::parse(DETAIL_LABEL_SELECTOR).unwrap();
    let value = Selector::parse(DETAIL_VALUE_SELECTOR).unwrap();

    let mut details = HashMap::new();
    for element in document.select(&row) {
        let key = element.select(&label).next().map(element_text);
        let raw = element.select(&value).next().map(element_text);
        if let (Some(key), Some(raw)) = (key, raw) {
            let entry = if TRI_STATE_TOKENS.contains(&raw.as_str()) {
                match normalize::tri_state(&raw) {
                    Some(flag) => DetailValue::Flag(flag),
                    None => DetailValue::Text(raw),
                }
            } else {
                DetailValue::Text(raw)
            };
            details.insert(key, entry);
        }
    }
    details
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).unwrap();
    document.select(&selector).next().map(element_text)
}

fn element_text(element: scraper::ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    const INDEX_PAGE: &str = r#"
        <html><body>
            <a class="AdCardSrp__Link" href="/lejebolig/1">one</a>
            <a class="AdCardSrp__Link" href="https://www.boligportal.dk/lejebolig/2">two</a>
            <a class="OtherLink" href="/ignored">nope</a>
        </body></html>
    "#;

    const DETAIL_PAGE: &str = r#"
        <html><body>
            <span class="css-v34a4n">Lys 3-værelses lejlighed</span>
            <div class="css-1j674uz">Dejlig bolig tæt på centrum.</div>
            <span class="css-avchh2">I går</span>
            <a class="css-10zxfph" href="/">Forside</a>
            <a class="css-10zxfph" href="/lejeboliger">Lejeboliger</a>
            <a class="css-10zxfph" href="/lejeboliger/aarhus">Aarhus</a>
            <img class="css-1dz0toi" src="https://cdn.example/a.jpg" />
            <img class="css-1dz0toi" src="https://cdn.example/b.jpg" />
            <div class="css-1ksgrzt">
                <span class="css-1td16zm">Boligtype</span>
                <span class="css-1f8murc">Lejlighed</span>
            </div>
            <div class="css-1ksgrzt">
                <span class="css-1td16zm">Møbleret</span>
                <span class="css-1f8murc">Ja</span>
            </div>
            <div class="css-1ksgrzt">
                <span class="css-1td16zm">Elevator</span>
                <span class="css-1f8murc">Ikke angivet</span>
            </div>
            <div class="css-1ksgrzt">
                <span class="css-1td16zm">Depositum</span>
                <span class="css-1f8murc">30.000 kr.</span>
            </div>
        </body></html>
    "#;

    #[test]
    fn index_page_yields_absolute_urls() {
        let urls = parse_listing_urls(INDEX_PAGE);
        assert_eq!(
            urls,
            vec![
                "https://www.boligportal.dk/lejebolig/1".to_string(),
                "https://www.boligportal.dk/lejebolig/2".to_string(),
            ]
        );
    }

    #[test]
    fn empty_index_page_yields_no_urls() {
        assert!(parse_listing_urls("<html><body></body></html>").is_empty());
    }

    #[test]
    fn detail_page_extracts_all_fields() {
        let details = parse_listing_details(DETAIL_PAGE, SchemaVariant::Basic, now());
        assert_eq!(details.title, "Lys 3-værelses lejlighed");
        assert_eq!(
            details.description.as_deref(),
            Some("Dejlig bolig tæt på centrum.")
        );
        assert_eq!(details.published_date, None);
        assert_eq!(details.city, "Aarhus");
        assert_eq!(details.images.len(), 2);
        assert_eq!(
            details.details.get("Boligtype"),
            Some(&DetailValue::Text("Lejlighed".to_string()))
        );
        assert_eq!(
            details.details.get("Møbleret"),
            Some(&DetailValue::Flag(true))
        );
        assert_eq!(
            details.details.get("Elevator"),
            Some(&DetailValue::Flag(false))
        );
        assert_eq!(
            details.details.get("Depositum"),
            Some(&DetailValue::Text("30.000 kr.".to_string()))
        );
    }

    #[test]
    fn extended_variant_tracks_publish_date_instead_of_description() {
        let details = parse_listing_details(DETAIL_PAGE, SchemaVariant::Extended, now());
        assert_eq!(details.description, None);
        assert_eq!(details.published_date.as_deref(), Some("2024-06-14"));
    }

    #[test]
    fn missing_markers_fall_back_to_sentinels() {
        let details =
            parse_listing_details("<html><body></body></html>", SchemaVariant::Extended, now());
        assert_eq!(details.title, "No title found");
        assert_eq!(details.published_date.as_deref(), Some("No date found"));
        assert_eq!(details.city, "No city found");
        assert!(details.images.is_empty());
        assert!(details.details.is_empty());
    }

    #[test]
    fn fallback_image_selectors_are_tried_in_order() {
        let second_variant = r#"
            <html><body>
                <img class="css-i2cz4f" src="https://cdn.example/alt.jpg" />
                <img class="css-1aus8y6" src="https://cdn.example/never.jpg" />
            </body></html>
        "#;
        let details = parse_listing_details(second_variant, SchemaVariant::Basic, now());
        assert_eq!(details.images, vec!["https://cdn.example/alt.jpg".to_string()]);
    }

    #[test]
    fn shallow_breadcrumbs_leave_city_sentinel() {
        let page = r#"
            <html><body>
                <a class="css-10zxfph" href="/">Forside</a>
                <a class="css-10zxfph" href="/lejeboliger">Lejeboliger</a>
            </body></html>
        "#;
        let details = parse_listing_details(page, SchemaVariant::Basic, now());
        assert_eq!(details.city, "No city found");
    }
}

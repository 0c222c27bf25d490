use crate::config::ClientConfig;
use crate::crawlers::client::HttpClient;
use crate::crawlers::traits::Crawler;
use crate::error::CrawlError;
use crate::models::Expose;
use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::json;
use tracing::debug;
use url::Url;

const BASE_URL: &str = "https://www.booli.se";

const E: &str = "Invalid selector";
lazy_static! {
    static ref CARD: Selector = Selector::parse("a.object-card-link").expect(E);
    static ref LI: Selector = Selector::parse("li").expect(E);
    static ref PRICE: Selector = Selector::parse("span.object-card__price--logo").expect(E);
    static ref TAG: Selector = Selector::parse("div.tag").expect(E);
}

/// Crawler for booli.se search result pages
pub struct BooliCrawler {
    base_url: String,
    pattern: Regex,
    http: HttpClient,
}

impl BooliCrawler {
    pub fn new(config: &ClientConfig) -> Result<Self, CrawlError> {
        Self::with_base_url(config, BASE_URL)
    }

    /// Crawler for a Booli site served from `base_url`. Accepts search URLs
    /// under `{base_url}/sok/` and resolves relative listing links against it.
    pub fn with_base_url(config: &ClientConfig, base_url: &str) -> Result<Self, CrawlError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let pattern = Regex::new(&format!("^{}/sok/", regex::escape(&base_url)))?;

        Ok(Self {
            base_url,
            pattern,
            http: HttpClient::new(config)?,
        })
    }

    fn parse_card(&self, card: ElementRef) -> Option<Expose> {
        let href = card.value().attr("href").unwrap_or("");
        // Labels read like "2 rum lägenhet på Götgatan 120 Södermalm, Stockholms kommun"
        let title = card
            .value()
            .attr("aria-label")
            .unwrap_or("")
            .replace("&nbsp;", " ")
            .replace('\u{a0}', " ");

        let id = href.rsplit('/').next().unwrap_or("unknown").to_string();
        let rooms = parse_rooms(&title);
        let (address, area) = parse_address(&title);

        let mut size: Option<f64> = None;
        let mut monthly_fee: Option<String> = None;
        for li in card.select(&LI) {
            let Some(label) = li.value().attr("aria-label") else {
                continue;
            };
            let label = label.replace("&nbsp;", " ").replace('\u{a0}', " ");

            if label.contains("kvadratmeter") {
                let digits: String = label
                    .chars()
                    .filter(|c| c.is_numeric() || *c == ',' || *c == '.')
                    .collect();
                size = digits.replace(',', ".").parse().ok();
            }
            if label.contains("kr/mån") {
                monthly_fee = Some(label);
            }
        }

        let price: Option<i64> = card.select(&PRICE).next().and_then(|el| {
            let digits: String = el.text().collect::<String>().chars().filter(|c| c.is_numeric()).collect();
            digits.parse().ok()
        });

        let features: Vec<String> = card
            .select(&TAG)
            .map(|tag| tag.text().collect::<String>().trim().to_string())
            .filter(|feature| !feature.is_empty() && feature != "Snart till salu")
            .collect();

        if address.is_empty() || (price.is_none() && size.is_none()) {
            debug!(
                "Skipped card {}: address='{}', price={:?}, size={:?}",
                id, address, price, size
            );
            return None;
        }

        let url = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{}{}", self.base_url, href)
        };

        let expose = json!({
            "id": id,
            "url": url,
            "title": title,
            "address": address,
            "area": area,
            "rooms": rooms,
            "size": size,
            "price": price,
            "monthly_fee": monthly_fee,
            "features": features,
            "crawled_at": Utc::now().to_rfc3339(),
        });

        match expose {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        }
    }
}

#[async_trait]
impl Crawler for BooliCrawler {
    fn url_pattern(&self) -> &Regex {
        &self.pattern
    }

    fn http(&self) -> &HttpClient {
        &self.http
    }

    fn extract_data(&self, document: &Html) -> Vec<Expose> {
        let exposes: Vec<Expose> = document
            .select(&CARD)
            .filter_map(|card| self.parse_card(card))
            .collect();
        debug!("Extracted {} exposes from listing page", exposes.len());
        exposes
    }

    async fn get_page(&self, search_url: &str, page_no: Option<u32>) -> Result<Html, CrawlError> {
        let url = match page_no {
            Some(page_no) if page_no > 1 => page_url(search_url, page_no)?,
            _ => search_url.to_string(),
        };
        self.get_soup_from_url(&url).await
    }

    /// Walks result pages until `max_pages` (default 1) or an empty page.
    async fn get_results(
        &self,
        search_url: &str,
        max_pages: Option<u32>,
    ) -> Result<Vec<Expose>, CrawlError> {
        debug!("Got search URL {}", search_url);

        let mut entries = {
            let soup = self.get_page(search_url, None).await?;
            self.extract_data(&soup)
        };

        for page_no in 2..=max_pages.unwrap_or(1) {
            let page_entries = {
                let soup = self.get_page(search_url, Some(page_no)).await?;
                self.extract_data(&soup)
            };
            if page_entries.is_empty() {
                break;
            }
            entries.extend(page_entries);
        }

        debug!("Number of found entries: {}", entries.len());
        Ok(entries)
    }
}

/// `search_url` with its `page` query parameter set to `page_no`
fn page_url(search_url: &str, page_no: u32) -> Result<String, CrawlError> {
    let mut url = Url::parse(search_url).map_err(|source| CrawlError::InvalidUrl {
        url: search_url.to_string(),
        source,
    })?;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("page", &page_no.to_string());

    Ok(url.into())
}

fn parse_rooms(title: &str) -> Option<f64> {
    let before = title.split(" rum").next()?;
    if before.len() == title.len() {
        return None;
    }
    before.split_whitespace().last()?.replace(',', ".").parse().ok()
}

/// Address and area from the card label. The address runs from "på " to the
/// first comma; its last word is the area unless it is a house number.
fn parse_address(title: &str) -> (String, Option<String>) {
    let Some(pos) = title.find("på ") else {
        return (String::new(), None);
    };
    let after = &title[pos + "på ".len()..];
    let address = after.split(',').next().unwrap_or(after).trim();

    let area = address
        .rsplit(' ')
        .next()
        .filter(|word| *word != address)
        .filter(|word| !word.chars().next().is_some_and(char::is_numeric))
        .map(ToString::to_string);

    (address.to_string(), area)
}

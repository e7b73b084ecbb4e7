// crates/shared/src/toolbelts/price_scraper.rs

use anyhow::{Context, Result, anyhow};
use scraper::{Html, Selector};
use serde::Serialize;

use crate::register_toolbelt;

#[derive(Default)]
pub struct PriceScraper;

register_toolbelt! {
    PriceScraper {
        description: "Extract product pricing from a product page",
        tools: {
            "check_price" => check_price {
                description: "Fetches a product page and returns the product name, old price, new price, installment price and a timestamp.",
                params: ["url": "string" => "Product page URL"]
            }
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PriceSnapshot {
    pub product_name: String,
    pub old_price: i64,
    pub new_price: i64,
    pub installment_price: i64,
    pub timestamp: String,
}

impl PriceScraper {
    fn check_price(&self, args: &serde_json::Value) -> Result<String> {
        let url = args["url"].as_str().unwrap_or("");
        if url.is_empty() {
            return Err(anyhow!("url cannot be empty"));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(anyhow!("URL must start with http:// or https://"));
        }

        // Handlers run on a blocking thread inside the runtime.
        let runtime = tokio::runtime::Handle::current();
        let html = runtime.block_on(async { self.fetch_page_async(url).await })?;

        let snapshot = parse_price_page(&html)?;
        Ok(serde_json::to_string(&snapshot)?)
    }

    async fn fetch_page_async(&self, url: &str) -> Result<String> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0")
            .build()?;

        let response = client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Failed to fetch page: {}", response.status()));
        }

        Ok(response.text().await?)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector '{}': {}", css, e))
}

fn price_to_int(text: &str) -> Result<i64> {
    let digits = text.trim().replace('.', "");
    digits
        .parse::<i64>()
        .with_context(|| format!("price '{}' is not a whole number", text.trim()))
}

/// Reads a product page: the title heading and the first three price
/// fractions (old, current, installment). Thousands separators are dots.
pub fn parse_price_page(html: &str) -> Result<PriceSnapshot> {
    let document = Html::parse_document(html);

    let title_selector = selector("h1.ui-pdp-title")?;
    let price_selector = selector("span.andes-money-amount__fraction")?;

    let product_name = document
        .select(&title_selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .ok_or_else(|| anyhow!("product title not found on page"))?;

    let prices = document
        .select(&price_selector)
        .take(3)
        .map(|el| price_to_int(&el.text().collect::<String>()))
        .collect::<Result<Vec<_>>>()?;

    let &[old_price, new_price, installment_price] = prices.as_slice() else {
        return Err(anyhow!(
            "expected 3 prices on page, found {}",
            prices.len()
        ));
    };

    Ok(PriceSnapshot {
        product_name,
        old_price,
        new_price,
        installment_price,
        timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <h1 class="ui-pdp-title"> Notebook Pro 14 </h1>
          <span class="andes-money-amount__fraction">5.499</span>
          <span class="andes-money-amount__fraction">4.299</span>
          <span class="andes-money-amount__fraction">358</span>
          <span class="andes-money-amount__fraction">1</span>
        </body></html>
    "#;

    #[test]
    fn parses_name_and_three_prices() {
        let snapshot = parse_price_page(PAGE).unwrap();
        assert_eq!(snapshot.product_name, "Notebook Pro 14");
        assert_eq!(snapshot.old_price, 5499);
        assert_eq!(snapshot.new_price, 4299);
        assert_eq!(snapshot.installment_price, 358);
        assert_eq!(snapshot.timestamp.len(), "2024-01-01 00:00:00".len());
    }

    #[test]
    fn missing_prices_is_an_error() {
        let page = r#"<h1 class="ui-pdp-title">X</h1><span class="andes-money-amount__fraction">10</span>"#;
        let err = parse_price_page(page).unwrap_err();
        assert!(err.to_string().contains("found 1"));
    }

    #[test]
    fn rejects_non_http_urls() {
        let err = INSTANCE.check_price(&serde_json::json!({"url": "ftp://x"})).unwrap_err();
        assert!(err.to_string().contains("http"));
    }
}

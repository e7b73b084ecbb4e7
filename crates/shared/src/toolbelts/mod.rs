pub mod etl;
pub mod price_scraper;

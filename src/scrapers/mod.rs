pub mod boligportal;

pub use boligportal::{parse_listing_details, parse_listing_urls, ORIGIN};

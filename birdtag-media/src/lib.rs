//! Image embedding for the birdtag gallery.
//!
//! - [`DataUrlConverter`] - image locator to `data:` URL, with the network
//!   behind the [`ImageFetcher`] port
//! - [`DataUrl`] - the `data:` URL codec
//! - [`full_image_url`] - thumbnail locator to full-size image locator

mod config;
mod converter;
mod data_url;
mod error;
mod fetcher;
pub mod image_check;
mod locator;

pub use self::config::*;
pub use converter::*;
pub use data_url::*;
pub use error::*;
pub use fetcher::*;
pub use locator::*;

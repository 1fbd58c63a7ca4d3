//! Parsers for filmi2k.com pages, its REST API and embed hosts
//!
//! Every parser is a pure function over fetched text.

pub mod embed;
pub mod listing;
pub mod media;
pub mod packer;

pub use embed::extract_embed_candidates;
pub use listing::{parse_api_posts, parse_listing_page, parse_title, parse_year};
pub use media::{build_stream_descriptors, scan_embed_page};
pub use packer::{detect_packed, unpack};

//! Response decoder module
//!
//! Decodes a paged JSON response envelope into its item records and the
//! link to the next page.
//!
//! # Overview
//!
//! A typical envelope looks like:
//!
//! ```text
//! { "Items": [ {...}, {...} ], "NextPageLink": "https://...&$skip=100", "Count": 100 }
//! ```
//!
//! Both field names are configurable and accept dot-notation paths.

mod decoders;

pub use decoders::{
    extract_path, Envelope, EnvelopeDecoder, DEFAULT_ITEMS_FIELD, DEFAULT_NEXT_FIELD,
};

pub mod aggregator;
pub mod item;
pub mod records;
pub mod source;

pub use aggregator::{EntityState, ListingAggregator};
pub use item::{normalize, ListingItem, ListingStatus, Thumbnail};
pub use records::ListingRecord;
pub use source::{http_sources, HttpListingSource, ListingSource, Pagination, SourcePage};

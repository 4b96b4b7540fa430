use async_trait::async_trait;
use market_core::{ApiClient, EntityType, MarketContext, MarketError, Result};
use serde::Deserialize;
use std::sync::Arc;
use tracing;

use crate::records::ListingRecord;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct SourcePage {
    pub records: Vec<ListingRecord>,
    pub has_more: bool,
}

impl SourcePage {
    pub fn exhausted() -> Self {
        SourcePage {
            records: Vec::new(),
            has_more: false,
        }
    }
}

/// One independently paginated listing collection.
#[async_trait]
pub trait ListingSource: Send + Sync {
    fn entity_type(&self) -> EntityType;

    fn page_size(&self) -> u32 {
        DEFAULT_PAGE_SIZE
    }

    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<SourcePage>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// `?page&size&sort`, answered with `{content, last}`.
    Paged,
    /// The whole collection in one response; page 0 has everything.
    SinglePage,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CollectionBody {
    List(Vec<serde_json::Value>),
    Page {
        #[serde(default)]
        content: Option<Vec<serde_json::Value>>,
        #[serde(default)]
        last: Option<bool>,
    },
}

pub struct HttpListingSource {
    api: ApiClient,
    entity_type: EntityType,
    path: String,
    sort: String,
    page_size: u32,
    pagination: Pagination,
}

impl HttpListingSource {
    pub fn new(
        api: ApiClient,
        entity_type: EntityType,
        path: impl Into<String>,
        pagination: Pagination,
    ) -> Self {
        Self {
            api,
            entity_type,
            path: path.into(),
            sort: "createdAt,DESC".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            pagination,
        }
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn decode(&self, values: Vec<serde_json::Value>) -> Result<Vec<ListingRecord>> {
        values
            .into_iter()
            .map(|value| {
                ListingRecord::from_value(self.entity_type, value).map_err(|e| {
                    MarketError::Decode(format!("invalid {} record: {}", self.entity_type, e))
                })
            })
            .collect()
    }
}

#[async_trait]
impl ListingSource for HttpListingSource {
    fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<SourcePage> {
        if self.pagination == Pagination::SinglePage && page > 0 {
            return Ok(SourcePage::exhausted());
        }

        let query = match self.pagination {
            Pagination::Paged => vec![
                ("page", page.to_string()),
                ("size", page_size.to_string()),
                ("sort", self.sort.clone()),
            ],
            Pagination::SinglePage => Vec::new(),
        };

        let body: CollectionBody = self.api.get_json(&self.path, &query).await?;
        let (values, last) = match body {
            CollectionBody::Page { content, last } => (content.unwrap_or_default(), last),
            CollectionBody::List(values) => (values, None),
        };

        let has_more = match self.pagination {
            Pagination::Paged => last == Some(false),
            Pagination::SinglePage => false,
        };

        let records = self.decode(values)?;
        tracing::debug!(
            "Fetched page {} for {} ({} items, has_more={})",
            page,
            self.entity_type,
            records.len(),
            has_more
        );

        Ok(SourcePage { records, has_more })
    }
}

/// The four backend collections. Mobiles and cars paginate server-side;
/// bikes and laptops come back whole.
pub fn http_sources(ctx: &MarketContext) -> Vec<Arc<dyn ListingSource>> {
    let listings = &ctx.config.listings;

    EntityType::ORDER
        .iter()
        .map(|&entity_type| {
            let pagination = match entity_type {
                EntityType::Mobile | EntityType::Car => Pagination::Paged,
                EntityType::Bike | EntityType::Laptop => Pagination::SinglePage,
            };
            let source = HttpListingSource::new(
                ctx.api.clone(),
                entity_type,
                listings.path_for(entity_type),
                pagination,
            )
            .with_sort(listings.sort.clone())
            .with_page_size(listings.page_size);

            Arc::new(source) as Arc<dyn ListingSource>
        })
        .collect()
}

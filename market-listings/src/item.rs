use market_core::types::RawTimestamp;
use market_core::EntityType;
use serde::{Deserialize, Serialize};

use crate::records::{BikeRecord, CarRecord, LaptopRecord, ListingRecord, MobileRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingStatus {
    Active,
    Draft,
    Sold,
    Deleted,
    Other(String),
}

impl ListingStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => ListingStatus::Active,
            "DRAFT" => ListingStatus::Draft,
            "SOLD" => ListingStatus::Sold,
            "DELETED" => ListingStatus::Deleted,
            _ => ListingStatus::Other(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Thumbnail {
    Remote(String),
    Placeholder(EntityType),
}

/// Common projection of the four listing collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingItem {
    /// `<entity type>-<native id>`, unique across all sources.
    pub id: String,
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub title: String,
    pub subtitle: String,
    pub price: i64,
    pub status: Option<ListingStatus>,
    /// Epoch millis. `normalize` falls back to the native id when the
    /// record carries no parseable timestamp, so only hand-built items lack it.
    pub created_at: Option<i64>,
    pub location: Option<String>,
    pub thumbnail: Thumbnail,
    pub payload: ListingRecord,
}

impl ListingItem {
    /// Sort key; `created_at`, or 0 for an item built without one.
    pub fn sort_time(&self) -> i64 {
        self.created_at.unwrap_or(0)
    }

    pub fn is_live(&self) -> bool {
        self.status == Some(ListingStatus::Active)
    }
}

pub fn normalize(record: ListingRecord) -> ListingItem {
    match record {
        ListingRecord::Mobile(r) => normalize_mobile(r),
        ListingRecord::Car(r) => normalize_car(r),
        ListingRecord::Bike(r) => normalize_bike(r),
        ListingRecord::Laptop(r) => normalize_laptop(r),
    }
}

fn normalize_mobile(record: MobileRecord) -> ListingItem {
    let title = non_empty(record.title.as_deref()).unwrap_or_else(|| "Untitled Mobile".to_string());
    let subtitle = join_parts(
        &[
            record.brand.clone(),
            record.model.clone(),
            record.year_of_purchase.map(|y| y.to_string()),
        ],
        " | ",
    );
    let first_image = record.images.as_ref().and_then(|images| images.first()).map(String::as_str);

    ListingItem {
        id: listing_id(EntityType::Mobile, record.mobile_id),
        entity_type: EntityType::Mobile,
        entity_id: record.mobile_id,
        title,
        subtitle,
        price: minor_units(record.price),
        status: record.status.as_deref().map(ListingStatus::parse),
        created_at: created_at(&[&record.created_at, &record.updated_at], record.mobile_id),
        location: None,
        thumbnail: thumbnail(first_image, EntityType::Mobile),
        payload: ListingRecord::Mobile(record),
    }
}

fn normalize_car(record: CarRecord) -> ListingItem {
    let title = non_empty(record.title.as_deref())
        .or_else(|| non_empty(Some(join_parts(&[record.brand.clone(), record.model.clone()], " ").as_str())))
        .unwrap_or_else(|| "Untitled Car".to_string());
    let subtitle = join_parts(
        &[record.variant.clone(), record.year_of_purchase.map(|y| y.to_string())],
        " | ",
    );
    let location = non_empty(Some(join_parts(&[record.city.clone(), record.state.clone()], ", ").as_str()));
    let first_image = record.images.as_ref().and_then(|images| images.first()).map(String::as_str);

    ListingItem {
        id: listing_id(EntityType::Car, record.car_id),
        entity_type: EntityType::Car,
        entity_id: record.car_id,
        title,
        subtitle,
        price: minor_units(record.price),
        status: record.status.as_deref().map(ListingStatus::parse),
        created_at: created_at(&[&record.created_at, &record.updated_at], record.car_id),
        location,
        thumbnail: thumbnail(first_image, EntityType::Car),
        payload: ListingRecord::Car(record),
    }
}

fn normalize_bike(record: BikeRecord) -> ListingItem {
    let title = non_empty(Some(join_parts(&[record.brand.clone(), record.model.clone()], " ").as_str()))
        .unwrap_or_else(|| "Untitled Bike".to_string());
    let subtitle = join_parts(
        &[record.variant.clone(), record.manufacture_year.map(|y| y.to_string())],
        " | ",
    );
    let first_image = record
        .images
        .as_ref()
        .and_then(|images| images.first())
        .and_then(|image| image.image_link.as_deref());

    ListingItem {
        id: listing_id(EntityType::Bike, record.bike_id),
        entity_type: EntityType::Bike,
        entity_id: record.bike_id,
        title,
        subtitle,
        price: minor_units(record.prize),
        status: record.status.as_deref().map(ListingStatus::parse),
        created_at: created_at(&[&record.created_at], record.bike_id),
        location: None,
        thumbnail: thumbnail(first_image, EntityType::Bike),
        payload: ListingRecord::Bike(record),
    }
}

fn normalize_laptop(record: LaptopRecord) -> ListingItem {
    let title = non_empty(Some(join_parts(&[record.brand.clone(), record.model.clone()], " ").as_str()))
        .unwrap_or_else(|| format!("Laptop #{}", record.id));
    let subtitle = join_parts(&[record.processor.clone(), record.ram.clone()], " | ");
    let first_photo = record
        .laptop_photos
        .as_ref()
        .and_then(|photos| photos.first())
        .and_then(|photo| photo.photo_link.as_deref());

    ListingItem {
        id: listing_id(EntityType::Laptop, record.id),
        entity_type: EntityType::Laptop,
        entity_id: record.id,
        title,
        subtitle,
        price: minor_units(record.price),
        status: record.status.as_deref().map(ListingStatus::parse),
        created_at: created_at(&[&record.created_at], record.id),
        location: non_empty(record.dealer.as_deref()),
        thumbnail: thumbnail(first_photo, EntityType::Laptop),
        payload: ListingRecord::Laptop(record),
    }
}

fn listing_id(entity_type: EntityType, native_id: i64) -> String {
    format!("{}-{}", entity_type.as_str(), native_id)
}

/// First parseable timestamp, else the native id as a stable proxy.
fn created_at(candidates: &[&Option<RawTimestamp>], native_id: i64) -> Option<i64> {
    candidates
        .iter()
        .find_map(|candidate| candidate.as_ref().and_then(RawTimestamp::to_millis))
        .or(Some(native_id))
}

fn minor_units(price: Option<f64>) -> i64 {
    price
        .filter(|p| p.is_finite())
        .map(|p| p.round() as i64)
        .unwrap_or(0)
}

fn thumbnail(uri: Option<&str>, entity_type: EntityType) -> Thumbnail {
    match uri.map(str::trim) {
        Some(uri) if uri.len() > 4 => Thumbnail::Remote(uri.to_string()),
        _ => Thumbnail::Placeholder(entity_type),
    }
}

fn join_parts(parts: &[Option<String>], separator: &str) -> String {
    parts
        .iter()
        .filter_map(|part| part.as_deref())
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{BikeImage, LaptopPhoto};

    fn mobile() -> MobileRecord {
        MobileRecord {
            mobile_id: 42,
            title: None,
            brand: Some("Apple".to_string()),
            model: Some("iPhone 14".to_string()),
            year_of_purchase: Some(2023),
            price: Some(85000.4),
            status: Some("ACTIVE".to_string()),
            images: Some(vec!["  https://cdn/iphone.jpg ".to_string()]),
            created_at: None,
            updated_at: Some(RawTimestamp::Text("1970-01-01T00:00:05Z".to_string())),
        }
    }

    #[test]
    fn test_normalize_mobile() {
        let item = normalize(ListingRecord::Mobile(mobile()));
        assert_eq!(item.id, "mobile-42");
        assert_eq!(item.title, "Untitled Mobile");
        assert_eq!(item.subtitle, "Apple | iPhone 14 | 2023");
        assert_eq!(item.price, 85000);
        assert!(item.is_live());
        assert_eq!(item.created_at, Some(5000));
        assert_eq!(item.thumbnail, Thumbnail::Remote("https://cdn/iphone.jpg".to_string()));
        assert_eq!(item.payload, ListingRecord::Mobile(mobile()));
    }

    #[test]
    fn test_normalize_car_title_and_location() {
        let record = CarRecord {
            car_id: 3,
            title: Some("  ".to_string()),
            brand: Some("Honda".to_string()),
            model: Some("City".to_string()),
            variant: Some("VX".to_string()),
            year_of_purchase: None,
            price: None,
            status: Some("SOLD".to_string()),
            images: Some(vec!["x.jp".to_string()]),
            city: Some("Pune".to_string()),
            state: None,
            created_at: Some(RawTimestamp::Millis(1_000)),
            updated_at: None,
        };

        let item = normalize(ListingRecord::Car(record));
        assert_eq!(item.title, "Honda City");
        assert_eq!(item.subtitle, "VX");
        assert_eq!(item.location.as_deref(), Some("Pune"));
        assert_eq!(item.price, 0);
        assert_eq!(item.status, Some(ListingStatus::Sold));
        assert_eq!(item.created_at, Some(1_000));
        assert_eq!(item.thumbnail, Thumbnail::Placeholder(EntityType::Car));
    }

    #[test]
    fn test_native_id_is_timestamp_proxy() {
        let record = BikeRecord {
            bike_id: 17,
            brand: None,
            model: None,
            variant: None,
            manufacture_year: Some(2019),
            prize: Some(99999.5),
            status: Some("PENDING_REVIEW".to_string()),
            images: Some(vec![BikeImage { image_link: Some("https://cdn/bike.png".to_string()) }]),
            created_at: Some(RawTimestamp::Text("not a date".to_string())),
        };

        let item = normalize(ListingRecord::Bike(record));
        assert_eq!(item.id, "bike-17");
        assert_eq!(item.title, "Untitled Bike");
        assert_eq!(item.price, 100000);
        assert_eq!(item.created_at, Some(17));
        assert_eq!(item.status, Some(ListingStatus::Other("PENDING_REVIEW".to_string())));
    }

    #[test]
    fn test_normalize_laptop() {
        let record = LaptopRecord {
            id: 8,
            brand: None,
            model: None,
            processor: Some("M2".to_string()),
            ram: Some("16GB".to_string()),
            price: Some(150000.0),
            status: None,
            dealer: Some("Croma".to_string()),
            laptop_photos: Some(vec![LaptopPhoto { photo_link: None }]),
            created_at: None,
        };

        let item = normalize(ListingRecord::Laptop(record));
        assert_eq!(item.title, "Laptop #8");
        assert_eq!(item.subtitle, "M2 | 16GB");
        assert_eq!(item.location.as_deref(), Some("Croma"));
        assert_eq!(item.status, None);
        assert_eq!(item.thumbnail, Thumbnail::Placeholder(EntityType::Laptop));
    }
}

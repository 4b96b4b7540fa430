//! Listing records exactly as each backend collection returns them.

use market_core::types::RawTimestamp;
use market_core::EntityType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileRecord {
    pub mobile_id: i64,
    pub title: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year_of_purchase: Option<i32>,
    pub price: Option<f64>,
    pub status: Option<String>,
    pub images: Option<Vec<String>>,
    pub created_at: Option<RawTimestamp>,
    pub updated_at: Option<RawTimestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarRecord {
    pub car_id: i64,
    pub title: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub variant: Option<String>,
    pub year_of_purchase: Option<i32>,
    pub price: Option<f64>,
    pub status: Option<String>,
    pub images: Option<Vec<String>>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub created_at: Option<RawTimestamp>,
    pub updated_at: Option<RawTimestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeImage {
    pub image_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeRecord {
    pub bike_id: i64,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub variant: Option<String>,
    #[serde(rename = "manufactureYear")]
    pub manufacture_year: Option<i32>,
    /// The bike collection spells its price field `prize`.
    pub prize: Option<f64>,
    pub status: Option<String>,
    pub images: Option<Vec<BikeImage>>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<RawTimestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaptopPhoto {
    #[serde(alias = "photoLink")]
    pub photo_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaptopRecord {
    pub id: i64,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub processor: Option<String>,
    pub ram: Option<String>,
    pub price: Option<f64>,
    pub status: Option<String>,
    pub dealer: Option<String>,
    pub laptop_photos: Option<Vec<LaptopPhoto>>,
    pub created_at: Option<RawTimestamp>,
}

/// Untouched source record, tagged by the collection it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entityType", rename_all = "lowercase")]
pub enum ListingRecord {
    Mobile(MobileRecord),
    Car(CarRecord),
    Bike(BikeRecord),
    Laptop(LaptopRecord),
}

impl ListingRecord {
    pub fn entity_type(&self) -> EntityType {
        match self {
            ListingRecord::Mobile(_) => EntityType::Mobile,
            ListingRecord::Car(_) => EntityType::Car,
            ListingRecord::Bike(_) => EntityType::Bike,
            ListingRecord::Laptop(_) => EntityType::Laptop,
        }
    }

    /// Decodes one JSON object of the given collection.
    pub fn from_value(
        entity_type: EntityType,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match entity_type {
            EntityType::Mobile => ListingRecord::Mobile(serde_json::from_value(value)?),
            EntityType::Car => ListingRecord::Car(serde_json::from_value(value)?),
            EntityType::Bike => ListingRecord::Bike(serde_json::from_value(value)?),
            EntityType::Laptop => ListingRecord::Laptop(serde_json::from_value(value)?),
        })
    }
}

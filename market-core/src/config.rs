use serde::{Deserialize, Serialize};
use std::env;

use crate::session::Session;
use crate::types::EntityType;

const API_PORT: u16 = 8087;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub listings: ListingsConfig,
    pub negotiation: NegotiationConfig,
    pub session: Option<Session>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Desktop,
}

impl Platform {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "android" => Platform::Android,
            "ios" => Platform::Ios,
            _ => Platform::Desktop,
        }
    }

    /// Base URL the app talks to when no explicit override is set.
    /// The Android emulator reaches the host loopback through 10.0.2.2.
    pub fn default_base_url(self) -> String {
        match self {
            Platform::Android => format!("http://10.0.2.2:{}", API_PORT),
            Platform::Ios | Platform::Desktop => format!("http://localhost:{}", API_PORT),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub platform: Platform,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingsConfig {
    pub page_size: u32,
    pub sort: String,
    pub mobile_path: String,
    pub car_path: String,
    pub bike_path: String,
    pub laptop_path: String,
}

impl ListingsConfig {
    pub fn path_for(&self, entity_type: EntityType) -> &str {
        match entity_type {
            EntityType::Mobile => &self.mobile_path,
            EntityType::Car => &self.car_path,
            EntityType::Bike => &self.bike_path,
            EntityType::Laptop => &self.laptop_path,
        }
    }
}

impl Default for ListingsConfig {
    fn default() -> Self {
        ListingsConfig {
            page_size: 20,
            sort: "createdAt,DESC".to_string(),
            mobile_path: "/api/v1/mobiles/getAllMobiles".to_string(),
            car_path: "/api/v1/cars/getAllCars".to_string(),
            bike_path: "/api/v1/bikes/getAllBikes".to_string(),
            laptop_path: "/api/v1/laptops/getAllLaptops".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationConfig {
    pub requests_path: String,
    pub sellers_path: String,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        NegotiationConfig {
            requests_path: "/api/v1/mobile/requests".to_string(),
            sellers_path: "/api/v1/sellers".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();

        let platform = Platform::parse(&env::var("MARKET_PLATFORM").unwrap_or_default());
        let defaults = ListingsConfig::default();
        let negotiation_defaults = NegotiationConfig::default();

        Config {
            api: ApiConfig {
                platform,
                base_url: env::var("MARKET_API_BASE_URL")
                    .unwrap_or_else(|_| platform.default_base_url()),
                timeout_secs: env::var("MARKET_HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            },
            listings: ListingsConfig {
                page_size: env::var("MARKET_PAGE_SIZE")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .unwrap_or(20),
                sort: env::var("MARKET_SORT").unwrap_or(defaults.sort),
                mobile_path: env::var("MARKET_MOBILE_PATH").unwrap_or(defaults.mobile_path),
                car_path: env::var("MARKET_CAR_PATH").unwrap_or(defaults.car_path),
                bike_path: env::var("MARKET_BIKE_PATH").unwrap_or(defaults.bike_path),
                laptop_path: env::var("MARKET_LAPTOP_PATH").unwrap_or(defaults.laptop_path),
            },
            negotiation: NegotiationConfig {
                requests_path: env::var("MARKET_REQUESTS_PATH")
                    .unwrap_or(negotiation_defaults.requests_path),
                sellers_path: env::var("MARKET_SELLERS_PATH")
                    .unwrap_or(negotiation_defaults.sellers_path),
            },
            session: session_from_env(),
        }
    }

    /// Config pointing at an explicit base URL with default paths and no session.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Config {
            api: ApiConfig {
                platform: Platform::Desktop,
                base_url: base_url.into(),
                timeout_secs: 30,
            },
            listings: ListingsConfig::default(),
            negotiation: NegotiationConfig::default(),
            session: None,
        }
    }
}

/// Persisted session values. A session only exists when a token is present.
fn session_from_env() -> Option<Session> {
    let access_token = env::var("MARKET_ACCESS_TOKEN").ok().filter(|t| !t.trim().is_empty())?;
    let parse_id = |key: &str| env::var(key).ok().and_then(|v| v.trim().parse::<i64>().ok());

    Some(Session {
        access_token,
        user_id: parse_id("MARKET_USER_ID"),
        seller_id: parse_id("MARKET_SELLER_ID"),
        buyer_id: parse_id("MARKET_BUYER_ID"),
        roles: env::var("MARKET_ROLES")
            .map(|roles| {
                roles
                    .split(',')
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
    })
}

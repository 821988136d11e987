use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter, EnumString};

use crate::error::{ServiceError, ServiceResult};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    Villa,
    Land,
    Commercial,
    Office,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ListingType {
    Sale,
    Rent,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PropertyStatus {
    Active,
    Pending,
    Sold,
    Rented,
    Archived,
}

impl PropertyStatus {
    /// Whether the listing still counts toward the open portfolio.
    pub fn is_open(&self) -> bool {
        matches!(self, PropertyStatus::Active | PropertyStatus::Pending)
    }
}

/// Row of the `properties` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub workspace_id: String,
    /// Profile id of the responsible agent
    pub agent_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub status: PropertyStatus,
    pub price: f64,
    pub currency: String,
    pub city: String,
    pub district: String,
    pub address: String,
    pub area_m2: Option<f64>,
    pub rooms: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProperty {
    pub workspace_id: String,
    pub agent_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub city: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub address: String,
    pub area_m2: Option<f64>,
    pub rooms: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

fn default_currency() -> String {
    "TRY".to_string()
}

fn validate_price(price: f64) -> ServiceResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(ServiceError::validation("Fiyat negatif olamaz."));
    }
    Ok(())
}

impl NewProperty {
    pub fn validate(&self) -> ServiceResult<()> {
        if self.title.trim().is_empty() {
            return Err(ServiceError::validation("İlan başlığı zorunludur."));
        }
        if self.city.trim().is_empty() {
            return Err(ServiceError::validation("Şehir bilgisi zorunludur."));
        }
        validate_price(self.price)
    }

    pub fn into_property(self, id: String, now: DateTime<Utc>) -> Property {
        Property {
            id,
            workspace_id: self.workspace_id,
            agent_id: self.agent_id,
            title: self.title.trim().to_string(),
            description: self.description,
            property_type: self.property_type,
            listing_type: self.listing_type,
            status: PropertyStatus::Active,
            price: self.price,
            currency: self.currency,
            city: self.city,
            district: self.district,
            address: self.address,
            area_m2: self.area_m2,
            rooms: self.rooms,
            latitude: self.latitude,
            longitude: self.longitude,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a listing. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<PropertyStatus>,
    pub price: Option<f64>,
    pub agent_id: Option<String>,
    pub address: Option<String>,
    pub area_m2: Option<f64>,
    pub rooms: Option<String>,
}

impl PropertyUpdate {
    pub fn validate(&self) -> ServiceResult<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ServiceError::validation("İlan başlığı zorunludur."));
            }
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }

    pub fn apply(self, property: &mut Property, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            property.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            property.description = description;
        }
        if let Some(status) = self.status {
            property.status = status;
        }
        if let Some(price) = self.price {
            property.price = price;
        }
        if let Some(agent_id) = self.agent_id {
            property.agent_id = agent_id;
        }
        if let Some(address) = self.address {
            property.address = address;
        }
        if let Some(area_m2) = self.area_m2 {
            property.area_m2 = Some(area_m2);
        }
        if let Some(rooms) = self.rooms {
            property.rooms = Some(rooms);
        }
        property.updated_at = now;
    }
}

/// Dashboard summary of a workspace portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub total: usize,
    pub by_status: BTreeMap<PropertyStatus, usize>,
    /// Sum of asking prices of open sale listings
    pub open_sale_value: f64,
    /// Sum of monthly rents of open rental listings
    pub open_rent_value: f64,
}

impl PortfolioStats {
    pub fn from_properties<'a>(properties: impl IntoIterator<Item = &'a Property>) -> Self {
        let mut stats = Self::default();
        for property in properties {
            stats.total += 1;
            *stats.by_status.entry(property.status).or_default() += 1;
            if property.status.is_open() {
                match property.listing_type {
                    ListingType::Sale => stats.open_sale_value += property.price,
                    ListingType::Rent => stats.open_rent_value += property.price,
                }
            }
        }
        stats
    }
}

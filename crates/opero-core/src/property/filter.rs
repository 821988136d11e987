use serde::{Deserialize, Serialize};

use super::model::{ListingType, Property, PropertyStatus, PropertyType};

/// Filter applied when listing a workspace's properties.
///
/// The filter doubles as part of the cache key, so it renders to a stable
/// list of `(name, value)` pairs via [`PropertyFilter::cache_params`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
    pub status: Option<PropertyStatus>,
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Case-insensitive match on title or address
    pub search: Option<String>,
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        if self.status.is_some_and(|s| s != property.status) {
            return false;
        }
        if self.property_type.is_some_and(|t| t != property.property_type) {
            return false;
        }
        if self.listing_type.is_some_and(|t| t != property.listing_type) {
            return false;
        }
        if let Some(city) = &self.city {
            if fold_case(city) != fold_case(&property.city) {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| property.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| property.price > max) {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = fold_case(search);
            if !fold_case(&property.title).contains(&needle)
                && !fold_case(&property.address).contains(&needle)
            {
                return false;
            }
        }
        true
    }

    pub fn cache_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status".to_string(), status.to_string()));
        }
        if let Some(property_type) = self.property_type {
            params.push(("property_type".to_string(), property_type.to_string()));
        }
        if let Some(listing_type) = self.listing_type {
            params.push(("listing_type".to_string(), listing_type.to_string()));
        }
        if let Some(city) = &self.city {
            params.push(("city".to_string(), city.clone()));
        }
        if let Some(min) = self.min_price {
            params.push(("min_price".to_string(), min.to_string()));
        }
        if let Some(max) = self.max_price {
            params.push(("max_price".to_string(), max.to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search".to_string(), fold_case(search)));
        }
        params
    }
}

/// Lowercases for matching, treating the dotted and dotless i as one letter.
fn fold_case(value: &str) -> String {
    value
        .chars()
        .flat_map(|ch| match ch {
            'İ' | 'I' | 'ı' => 'i'.to_lowercase(),
            other => other.to_lowercase(),
        })
        .collect()
}

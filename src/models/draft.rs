use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GeoCoordinates, Neighborhood, Property, PropertyStatus, PropertyType};

/// Default map pin for new listings (La Paloma)
pub const DEFAULT_COORDINATES: GeoCoordinates = GeoCoordinates {
    lat: -34.6345508,
    lng: -54.1634234,
};

/// Listing values as edited in the admin form, before the backend assigns an id.
///
/// Numeric fields stay optional until the admin fills them in; they are
/// omitted from the JSON payload while unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyDraft {
    pub title: String,
    pub short_description: String,
    pub long_description: String,
    #[serde(rename = "type")]
    pub property_type: Option<PropertyType>,
    pub status: Vec<PropertyStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contribution: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
    pub pool: bool,
    pub garage: bool,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<Neighborhood>,
    pub geo_coordinates: GeoCoordinates,
    pub features: String,
    pub image_src: Vec<String>,
    pub pinned: bool,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Default for PropertyDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            short_description: String::new(),
            long_description: String::new(),
            property_type: Some(PropertyType::House),
            status: vec![PropertyStatus::ForSale],
            price: None,
            contribution: None,
            lot_size: None,
            area: None,
            rooms: None,
            bathrooms: None,
            year_built: None,
            pool: false,
            garage: false,
            address: String::new(),
            neighborhood: None,
            geo_coordinates: DEFAULT_COORDINATES,
            features: String::new(),
            image_src: Vec::new(),
            pinned: false,
            approved: true,
            created_at: Utc::now(),
        }
    }
}

impl From<&Property> for PropertyDraft {
    fn from(p: &Property) -> Self {
        Self {
            title: p.title.clone(),
            short_description: p.short_description.clone(),
            long_description: p.long_description.clone(),
            property_type: Some(p.property_type),
            status: p.status.clone(),
            price: Some(p.price),
            contribution: p.contribution,
            lot_size: Some(p.lot_size),
            area: p.area,
            rooms: p.rooms,
            bathrooms: p.bathrooms,
            year_built: p.year_built,
            pool: p.pool,
            garage: p.garage,
            address: p.address.clone(),
            neighborhood: Some(p.neighborhood),
            geo_coordinates: p.geo_coordinates,
            features: p.features.clone(),
            image_src: p.image_src.clone(),
            pinned: p.pinned,
            approved: p.approved,
            created_at: p.created_at,
        }
    }
}

/// Update payload: the draft with the listing id folded in
#[derive(Debug, Serialize)]
pub struct DraftWithId<'a> {
    pub id: i64,
    #[serde(flatten)]
    pub draft: &'a PropertyDraft,
}

pub mod draft;
pub mod property;
pub mod user;

pub use draft::{DraftWithId, PropertyDraft, DEFAULT_COORDINATES};

pub use property::{
    parse_features, FeatureGroup, FeatureItem, GeoCoordinates, Neighborhood, Property,
    PropertyStatus, PropertyType, UnknownSlug,
};
pub use user::{AuthResponse, ChangePassword, RegisterUser, User, UserUpdate};

use serde::{Deserialize, Serialize};

/// Curated listings shown on the homepage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Home {
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub land: Vec<Property>,
    #[serde(default)]
    pub pinned: Vec<Property>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favourites: Option<Vec<Property>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Vec<Property>>,
}

impl Home {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.land.is_empty() && self.pinned.is_empty()
    }
}

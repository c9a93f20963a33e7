use crate::models::UnknownSlug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Location value the search form uses for "any neighborhood"
pub const ANY_LOCATION: &str = "cualquiera";
/// Type value the search form uses for "any type"
pub const ANY_TYPE: &str = "any";

/// The six orderings offered on the search page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    DateDesc,
    DateAsc,
    PriceAsc,
    PriceDesc,
    AreaDesc,
    AreaAsc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 6] = [
        SortOrder::DateDesc,
        SortOrder::DateAsc,
        SortOrder::PriceAsc,
        SortOrder::PriceDesc,
        SortOrder::AreaDesc,
        SortOrder::AreaAsc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::DateDesc => "date-desc",
            SortOrder::DateAsc => "date-asc",
            SortOrder::PriceAsc => "price-asc",
            SortOrder::PriceDesc => "price-desc",
            SortOrder::AreaDesc => "area-desc",
            SortOrder::AreaAsc => "area-asc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::DateDesc => "Más recientes",
            SortOrder::DateAsc => "Menos recientes",
            SortOrder::PriceAsc => "Precio: Menor a mayor",
            SortOrder::PriceDesc => "Precio: Mayor a menor",
            SortOrder::AreaDesc => "Mayor tamaño",
            SortOrder::AreaAsc => "Menor tamaño",
        }
    }
}

impl FromStr for SortOrder {
    type Err = UnknownSlug;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.as_str() == s.trim())
            .ok_or_else(|| UnknownSlug {
                kind: "sort order",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search page filter state.
///
/// Upper bounds default to infinity and lower bounds to zero, so a default
/// `Filters` matches every listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Filters {
    pub search_text: String,
    /// Neighborhood slug, empty or `cualquiera` for any
    pub location: String,
    /// Property type slug, empty or `any` for any
    pub property_type: String,
    pub rooms_min: f64,
    pub rooms_max: f64,
    pub baths_min: f64,
    pub baths_max: f64,
    pub garage: Option<bool>,
    pub pool: Option<bool>,
    pub price_min: f64,
    pub price_max: f64,
    pub area_min: f64,
    pub area_max: f64,
    pub land_min: f64,
    pub land_max: f64,
    pub order_by: SortOrder,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            location: String::new(),
            property_type: String::new(),
            rooms_min: 0.0,
            rooms_max: f64::INFINITY,
            baths_min: 0.0,
            baths_max: f64::INFINITY,
            garage: None,
            pool: None,
            price_min: 0.0,
            price_max: f64::INFINITY,
            area_min: 0.0,
            area_max: f64::INFINITY,
            land_min: 0.0,
            land_max: f64::INFINITY,
            order_by: SortOrder::DateDesc,
        }
    }
}

impl Filters {
    /// Back to the defaults, as the homepage does on every visit
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_sort_slug() {
        for order in SortOrder::ALL {
            assert_eq!(order.as_str().parse::<SortOrder>().unwrap(), order);
        }
        assert!("relevance".parse::<SortOrder>().is_err());
    }

    #[test]
    fn reset_restores_defaults() {
        let mut filters = Filters {
            search_text: "playa".into(),
            price_max: 10.0,
            pool: Some(true),
            order_by: SortOrder::AreaAsc,
            ..Filters::default()
        };
        assert!(!filters.is_default());
        filters.reset();
        assert!(filters.is_default());
        assert_eq!(filters.order_by, SortOrder::DateDesc);
    }

    #[test]
    fn default_upper_bounds_are_open() {
        let filters = Filters::default();
        for max in [
            filters.rooms_max,
            filters.baths_max,
            filters.price_max,
            filters.area_max,
            filters.land_max,
        ] {
            assert!(max.is_infinite() && max > 0.0);
        }
    }
}

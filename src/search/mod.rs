//! Client-side listing search
//!
//! A full linear scan over the cached catalog on every filter change,
//! followed by a stable sort. No pagination and no index.

pub mod filters;

pub use filters::{Filters, SortOrder, ANY_LOCATION, ANY_TYPE};

use crate::models::Property;
use std::cmp::Ordering;

/// Properties matching `filters`, in `filters.order_by` order
pub fn apply(properties: &[Property], filters: &Filters) -> Vec<Property> {
    let needle = filters.search_text.to_lowercase();

    let mut matched: Vec<Property> = properties
        .iter()
        .filter(|p| matches(p, filters, &needle))
        .cloned()
        .collect();

    sort(&mut matched, filters.order_by);
    matched
}

/// Whether a single listing passes every predicate.
///
/// `needle` is the lower-cased search text, hoisted out of the scan.
pub fn matches(property: &Property, filters: &Filters, needle: &str) -> bool {
    matches_text(property, &filters.search_text, needle)
        && matches_location(property, &filters.location)
        && matches_type(property, &filters.property_type)
        && in_range(property.rooms.unwrap_or(0) as f64, filters.rooms_min, filters.rooms_max)
        && in_range(property.bathrooms.unwrap_or(0) as f64, filters.baths_min, filters.baths_max)
        && filters.garage.map_or(true, |g| property.garage == g)
        && filters.pool.map_or(true, |p| property.pool == p)
        && in_range(property.price, filters.price_min, filters.price_max)
        && in_range(property.area.unwrap_or(0.0), filters.area_min, filters.area_max)
        && in_range(property.lot_size, filters.land_min, filters.land_max)
}

fn matches_text(property: &Property, raw: &str, needle: &str) -> bool {
    if raw.is_empty() {
        return true;
    }

    let contains = |haystack: &str| haystack.to_lowercase().contains(needle);

    contains(&property.title)
        || contains(&property.short_description)
        || contains(&property.long_description)
        || contains(property.neighborhood.as_str())
        || contains(property.property_type.as_str())
        || contains(&property.address)
        || property.status.iter().any(|s| contains(s.as_str()))
        || property.id.to_string().contains(raw)
}

fn matches_location(property: &Property, location: &str) -> bool {
    location.is_empty()
        || location == ANY_LOCATION
        || property.neighborhood.as_str().eq_ignore_ascii_case(location)
}

fn matches_type(property: &Property, property_type: &str) -> bool {
    property_type.is_empty() || property_type == ANY_TYPE || property.property_type.as_str() == property_type
}

fn in_range(value: f64, min: f64, max: f64) -> bool {
    value >= min && value <= max
}

/// Stable sort; listings without an area sort as area 0
pub fn sort(properties: &mut [Property], order: SortOrder) {
    let by_f64 = |a: f64, b: f64| a.partial_cmp(&b).unwrap_or(Ordering::Equal);

    match order {
        SortOrder::PriceAsc => properties.sort_by(|a, b| by_f64(a.price, b.price)),
        SortOrder::PriceDesc => properties.sort_by(|a, b| by_f64(b.price, a.price)),
        SortOrder::DateAsc => properties.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortOrder::DateDesc => properties.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::AreaDesc => {
            properties.sort_by(|a, b| by_f64(b.area.unwrap_or(0.0), a.area.unwrap_or(0.0)))
        }
        SortOrder::AreaAsc => {
            properties.sort_by(|a, b| by_f64(a.area.unwrap_or(0.0), b.area.unwrap_or(0.0)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::property::fixtures::property;
    use crate::models::{Neighborhood, PropertyStatus, PropertyType};
    use chrono::{Duration, TimeZone, Utc};

    fn catalog() -> Vec<Property> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let mut casa = property(1, "Casa en La Paloma");
        casa.price = 180_000.0;
        casa.area = Some(150.0);
        casa.rooms = Some(3);
        casa.bathrooms = Some(2);
        casa.pool = true;
        casa.address = "Av. Solari s/n".into();
        casa.created_at = base;

        let mut terreno = property(12, "Terreno amplio");
        terreno.property_type = PropertyType::Land;
        terreno.neighborhood = Neighborhood::LaPedrera;
        terreno.price = 45_000.0;
        terreno.area = None;
        terreno.rooms = None;
        terreno.bathrooms = None;
        terreno.lot_size = 2_000.0;
        terreno.created_at = base + Duration::days(10);

        let mut apto = property(21, "Apartamento céntrico");
        apto.property_type = PropertyType::Apartment;
        apto.neighborhood = Neighborhood::Rocha;
        apto.status = vec![PropertyStatus::ForRent];
        apto.price = 700.0;
        apto.area = Some(60.0);
        apto.rooms = Some(1);
        apto.garage = true;
        apto.long_description = "Cerca de la PLAZA".into();
        apto.created_at = base + Duration::days(5);

        vec![casa, terreno, apto]
    }

    fn ids(list: &[Property]) -> Vec<i64> {
        list.iter().map(|p| p.id).collect()
    }

    #[test]
    fn default_filters_keep_everything_newest_first() {
        let result = apply(&catalog(), &Filters::default());
        assert_eq!(ids(&result), vec![12, 21, 1]);
    }

    #[test]
    fn text_search_is_case_insensitive_across_fields() {
        let catalog = catalog();
        let search = |text: &str| {
            let filters = Filters {
                search_text: text.into(),
                ..Filters::default()
            };
            let mut found = ids(&apply(&catalog, &filters));
            found.sort();
            found
        };

        assert_eq!(search("plaza"), vec![21]);
        assert_eq!(search("LA-PEDRERA"), vec![12]);
        assert_eq!(search("land"), vec![12]);
        assert_eq!(search("for_rent"), vec![21]);
        assert_eq!(search("solari"), vec![1]);
        assert_eq!(search("2"), vec![12, 21]);
        assert!(search("castillo").is_empty());
    }

    #[test]
    fn location_and_type_wildcards() {
        let catalog = catalog();
        let mut filters = Filters {
            location: ANY_LOCATION.into(),
            property_type: ANY_TYPE.into(),
            ..Filters::default()
        };
        assert_eq!(apply(&catalog, &filters).len(), 3);

        filters.location = "LA-PALOMA".into();
        assert_eq!(ids(&apply(&catalog, &filters)), vec![1]);

        filters.location.clear();
        filters.property_type = "apartment".into();
        assert_eq!(ids(&apply(&catalog, &filters)), vec![21]);
    }

    #[test]
    fn ranges_are_inclusive_and_missing_counts_as_zero() {
        let catalog = catalog();
        let filters = Filters {
            rooms_min: 0.0,
            rooms_max: 1.0,
            ..Filters::default()
        };
        assert_eq!(ids(&apply(&catalog, &filters)), vec![12, 21]);

        let filters = Filters {
            price_min: 700.0,
            price_max: 45_000.0,
            ..Filters::default()
        };
        assert_eq!(ids(&apply(&catalog, &filters)), vec![12, 21]);

        let filters = Filters {
            area_min: 1.0,
            ..Filters::default()
        };
        assert_eq!(ids(&apply(&catalog, &filters)), vec![21, 1]);

        let filters = Filters {
            land_min: 1_000.0,
            ..Filters::default()
        };
        assert_eq!(ids(&apply(&catalog, &filters)), vec![12]);
    }

    #[test]
    fn boolean_toggles() {
        let catalog = catalog();
        let filters = Filters {
            pool: Some(true),
            ..Filters::default()
        };
        assert_eq!(ids(&apply(&catalog, &filters)), vec![1]);

        let filters = Filters {
            garage: Some(false),
            ..Filters::default()
        };
        assert_eq!(ids(&apply(&catalog, &filters)), vec![12, 1]);
    }

    #[test]
    fn every_sort_order() {
        let catalog = catalog();
        let sorted = |order| {
            let filters = Filters {
                order_by: order,
                ..Filters::default()
            };
            ids(&apply(&catalog, &filters))
        };

        assert_eq!(sorted(SortOrder::DateAsc), vec![1, 21, 12]);
        assert_eq!(sorted(SortOrder::DateDesc), vec![12, 21, 1]);
        assert_eq!(sorted(SortOrder::PriceAsc), vec![21, 12, 1]);
        assert_eq!(sorted(SortOrder::PriceDesc), vec![1, 12, 21]);
        assert_eq!(sorted(SortOrder::AreaAsc), vec![12, 21, 1]);
        assert_eq!(sorted(SortOrder::AreaDesc), vec![1, 21, 12]);
    }

    #[test]
    fn leaves_input_untouched() {
        let catalog = catalog();
        let before = ids(&catalog);
        let _ = apply(
            &catalog,
            &Filters {
                order_by: SortOrder::PriceAsc,
                ..Filters::default()
            },
        );
        assert_eq!(ids(&catalog), before);
    }
}

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Returned when a slug does not name any variant of a listing enum
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownSlug {
    pub kind: &'static str,
    pub value: String,
}

/// Kind of property being listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    House,
    Apartment,
    Land,
    Office,
    Store,
    Farm,
    Chakras,
    /// Also absorbs any type the backend adds later
    #[serde(other)]
    Other,
}

impl PropertyType {
    pub const ALL: [PropertyType; 8] = [
        PropertyType::House,
        PropertyType::Apartment,
        PropertyType::Land,
        PropertyType::Office,
        PropertyType::Store,
        PropertyType::Farm,
        PropertyType::Chakras,
        PropertyType::Other,
    ];

    /// Wire slug, as sent to and received from the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::House => "house",
            PropertyType::Apartment => "apartment",
            PropertyType::Land => "land",
            PropertyType::Office => "office",
            PropertyType::Store => "store",
            PropertyType::Farm => "farm",
            PropertyType::Chakras => "chakras",
            PropertyType::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::House => "Casa",
            PropertyType::Apartment => "Apartamento",
            PropertyType::Land => "Terreno",
            PropertyType::Office => "Oficina",
            PropertyType::Store => "Local comercial",
            PropertyType::Farm => "Campo",
            PropertyType::Chakras => "Chacra",
            PropertyType::Other => "Otro",
        }
    }
}

impl FromStr for PropertyType {
    type Err = UnknownSlug;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSlug {
                kind: "property type",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commercial status of a listing; a property may carry several at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    ForSale,
    ForRent,
    Sold,
    Rented,
    UnderConstruction,
    Reserved,
}

impl PropertyStatus {
    pub const ALL: [PropertyStatus; 6] = [
        PropertyStatus::ForSale,
        PropertyStatus::ForRent,
        PropertyStatus::Sold,
        PropertyStatus::Rented,
        PropertyStatus::UnderConstruction,
        PropertyStatus::Reserved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::ForSale => "for_sale",
            PropertyStatus::ForRent => "for_rent",
            PropertyStatus::Sold => "sold",
            PropertyStatus::Rented => "rented",
            PropertyStatus::UnderConstruction => "under_construction",
            PropertyStatus::Reserved => "reserved",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PropertyStatus::ForSale => "En venta",
            PropertyStatus::ForRent => "En alquiler",
            PropertyStatus::Sold => "Vendida",
            PropertyStatus::Rented => "Alquilada",
            PropertyStatus::UnderConstruction => "En construcción",
            PropertyStatus::Reserved => "Reservada",
        }
    }
}

impl FromStr for PropertyStatus {
    type Err = UnknownSlug;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSlug {
                kind: "property status",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic zone a listing belongs to, used for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Neighborhood {
    Anaconda,
    Antoniopolis,
    Arachania,
    Atlantica,
    BarrioCountry,
    BarrioParque,
    CerroAsperoGarzon,
    CostaAzul,
    LaAguada,
    LaPaloma,
    LaPedrera,
    OceaniaDelPolonio,
    PlayaSerena,
    PuebloNuevo,
    PuntaRubia,
    Rocha,
    SanAntonio,
    SanSebastianDeLaPedrera,
    SantaIsabel,
    SierraDeRocha,
}

impl Neighborhood {
    pub const ALL: [Neighborhood; 20] = [
        Neighborhood::Anaconda,
        Neighborhood::Antoniopolis,
        Neighborhood::Arachania,
        Neighborhood::Atlantica,
        Neighborhood::BarrioCountry,
        Neighborhood::BarrioParque,
        Neighborhood::CerroAsperoGarzon,
        Neighborhood::CostaAzul,
        Neighborhood::LaAguada,
        Neighborhood::LaPaloma,
        Neighborhood::LaPedrera,
        Neighborhood::OceaniaDelPolonio,
        Neighborhood::PlayaSerena,
        Neighborhood::PuebloNuevo,
        Neighborhood::PuntaRubia,
        Neighborhood::Rocha,
        Neighborhood::SanAntonio,
        Neighborhood::SanSebastianDeLaPedrera,
        Neighborhood::SantaIsabel,
        Neighborhood::SierraDeRocha,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Neighborhood::Anaconda => "anaconda",
            Neighborhood::Antoniopolis => "antoniopolis",
            Neighborhood::Arachania => "arachania",
            Neighborhood::Atlantica => "atlantica",
            Neighborhood::BarrioCountry => "barrio-country",
            Neighborhood::BarrioParque => "barrio-parque",
            Neighborhood::CerroAsperoGarzon => "cerro-aspero-garzon",
            Neighborhood::CostaAzul => "costa-azul",
            Neighborhood::LaAguada => "la-aguada",
            Neighborhood::LaPaloma => "la-paloma",
            Neighborhood::LaPedrera => "la-pedrera",
            Neighborhood::OceaniaDelPolonio => "oceania-del-polonio",
            Neighborhood::PlayaSerena => "playa-serena",
            Neighborhood::PuebloNuevo => "pueblo-nuevo",
            Neighborhood::PuntaRubia => "punta-rubia",
            Neighborhood::Rocha => "rocha",
            Neighborhood::SanAntonio => "san-antonio",
            Neighborhood::SanSebastianDeLaPedrera => "san-sebastian-de-la-pedrera",
            Neighborhood::SantaIsabel => "santa-isabel",
            Neighborhood::SierraDeRocha => "sierra-de-rocha",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Neighborhood::Anaconda => "Anaconda",
            Neighborhood::Antoniopolis => "Antoniopolis",
            Neighborhood::Arachania => "Arachania",
            Neighborhood::Atlantica => "Atlántica",
            Neighborhood::BarrioCountry => "Barrio Country",
            Neighborhood::BarrioParque => "Barrio Parque",
            Neighborhood::CerroAsperoGarzon => "Cerro Áspero Garzón",
            Neighborhood::CostaAzul => "Costa Azul",
            Neighborhood::LaAguada => "La Aguada",
            Neighborhood::LaPaloma => "La Paloma",
            Neighborhood::LaPedrera => "La Pedrera",
            Neighborhood::OceaniaDelPolonio => "Oceanía del Polonio",
            Neighborhood::PlayaSerena => "Playa Serena",
            Neighborhood::PuebloNuevo => "Pueblo Nuevo",
            Neighborhood::PuntaRubia => "Punta Rubia",
            Neighborhood::Rocha => "Rocha",
            Neighborhood::SanAntonio => "San Antonio",
            Neighborhood::SanSebastianDeLaPedrera => "San Sebastián de la Pedrera",
            Neighborhood::SantaIsabel => "Santa Isabel",
            Neighborhood::SierraDeRocha => "Sierra de Rocha",
        }
    }
}

impl FromStr for Neighborhood {
    type Err = UnknownSlug;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|n| n.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSlug {
                kind: "neighborhood",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Neighborhood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GeoCoordinates {
    pub lat: f64,
    pub lng: f64,
}

/// One labelled row inside a feature group ("Dormitorio principal": "En suite")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FeatureItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub value: String,
}

/// A titled block of construction details, stored JSON-encoded in `Property::features`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FeatureGroup {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub values: Vec<FeatureItem>,
}

impl FeatureGroup {
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.values.is_empty()
    }
}

/// Decode a JSON-encoded feature list; the empty string means no features
pub fn parse_features(raw: &str) -> Result<Vec<FeatureGroup>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).context("Failed to parse property features")
}

/// Listing as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub long_description: String,
    pub price: f64,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default)]
    pub status: Vec<PropertyStatus>,
    #[serde(default)]
    pub lot_size: f64,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub pool: bool,
    #[serde(default)]
    pub garage: bool,
    #[serde(default)]
    pub rooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub geo_coordinates: GeoCoordinates,
    pub neighborhood: Neighborhood,
    #[serde(default)]
    pub year_built: Option<i32>,
    #[serde(default)]
    pub image_src: Vec<String>,
    #[serde(default)]
    pub contribution: Option<f64>,
    #[serde(default)]
    pub features: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Property {
    pub fn feature_groups(&self) -> Result<Vec<FeatureGroup>> {
        parse_features(&self.features)
    }

    pub fn has_status(&self, status: PropertyStatus) -> bool {
        self.status.contains(&status)
    }

    /// Price as shown on listing cards, e.g. `USD 150.000` or `USD 800 / mes`
    pub fn formatted_price(&self) -> String {
        let amount = format_thousands(self.price.round() as i64);
        if self.has_status(PropertyStatus::ForRent) && !self.has_status(PropertyStatus::ForSale) {
            format!("USD {} / mes", amount)
        } else {
            format!("USD {}", amount)
        }
    }

    /// Main picture, if the listing has any
    pub fn cover_image(&self) -> Option<&str> {
        self.image_src.first().map(String::as_str)
    }
}

fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    if value < 0 {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// Minimal listing for tests; callers tweak fields as needed
    pub fn property(id: i64, title: &str) -> Property {
        Property {
            id,
            title: title.to_string(),
            short_description: String::new(),
            long_description: String::new(),
            price: 100_000.0,
            property_type: PropertyType::House,
            status: vec![PropertyStatus::ForSale],
            lot_size: 500.0,
            area: Some(120.0),
            pool: false,
            garage: false,
            rooms: Some(2),
            bathrooms: Some(1),
            address: String::new(),
            geo_coordinates: GeoCoordinates {
                lat: -34.66,
                lng: -54.16,
            },
            neighborhood: Neighborhood::LaPaloma,
            year_built: None,
            image_src: Vec::new(),
            contribution: None,
            features: String::new(),
            pinned: false,
            approved: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_backend_payload() {
        let raw = r#"{
            "id": 7,
            "title": "Casa frente al mar",
            "shortDescription": "Vista al océano",
            "longDescription": "Amplia casa",
            "price": 250000,
            "type": "house",
            "status": ["for_sale", "for_rent"],
            "lotSize": 600,
            "area": 140.5,
            "pool": true,
            "rooms": 3,
            "bathrooms": 2,
            "address": "Calle 1",
            "geoCoordinates": { "lat": -34.66, "lng": -54.16 },
            "neighborhood": "oceania-del-polonio",
            "imageSrc": ["https://cdn/a.jpg"],
            "longDescriptionExtra": null,
            "createdBy": { "id": 1 },
            "rents": [],
            "features": "",
            "garage": false,
            "pinned": true,
            "approved": true,
            "createdAt": "2024-03-01T10:00:00.000Z"
        }"#;

        let property: Property = serde_json::from_str(raw).unwrap();
        assert_eq!(property.id, 7);
        assert_eq!(property.property_type, PropertyType::House);
        assert_eq!(property.neighborhood, Neighborhood::OceaniaDelPolonio);
        assert_eq!(property.status, vec![PropertyStatus::ForSale, PropertyStatus::ForRent]);
        assert_eq!(property.cover_image(), Some("https://cdn/a.jpg"));
        assert!(property.pinned);
    }

    #[test]
    fn unknown_type_becomes_other() {
        let t: PropertyType = serde_json::from_str("\"castle\"").unwrap();
        assert_eq!(t, PropertyType::Other);
    }

    #[test]
    fn slugs_round_trip_through_from_str() {
        for n in Neighborhood::ALL {
            assert_eq!(n.as_str().parse::<Neighborhood>().unwrap(), n);
            let json = serde_json::to_string(&n).unwrap();
            assert_eq!(json, format!("\"{}\"", n.as_str()));
        }
        assert_eq!("FOR_RENT".parse::<PropertyStatus>().unwrap(), PropertyStatus::ForRent);
        assert!("mansion".parse::<PropertyType>().is_err());
    }

    #[test]
    fn formats_sale_and_rent_prices() {
        let mut p = fixtures::property(1, "x");
        p.price = 1_250_000.0;
        assert_eq!(p.formatted_price(), "USD 1.250.000");

        p.price = 800.0;
        p.status = vec![PropertyStatus::ForRent];
        assert_eq!(p.formatted_price(), "USD 800 / mes");

        p.status = vec![PropertyStatus::ForRent, PropertyStatus::ForSale];
        assert_eq!(p.formatted_price(), "USD 800");
    }

    #[test]
    fn parses_feature_groups() {
        let mut p = fixtures::property(1, "x");
        assert!(p.feature_groups().unwrap().is_empty());

        p.features = r#"[{"title":"Interior","values":[{"title":"Pisos","value":"Madera"}]},{"title":"","values":[]}]"#.to_string();
        let groups = p.feature_groups().unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups[0].is_complete());
        assert!(!groups[1].is_complete());
        assert_eq!(groups[0].values[0].value, "Madera");

        p.features = "{not json".to_string();
        assert!(p.feature_groups().is_err());
    }
}

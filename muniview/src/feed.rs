use anyhow::Result;
use serde::{Deserialize, Deserializer};

use mapgeom::LonLat;

use crate::config::AppConfig;
use crate::download;

/// One vehicle as the feed reports it, before any filtering.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedVehicle {
    pub id: String,
    pub route_tag: Option<String>,
    pub pos: LonLat,
}

/// A vehicle that'll actually be drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub id: String,
    pub route: String,
    pub pos: LonLat,
}

/// Builds request URLs for the NextBus publicJSONFeed and fetches them.
#[derive(Clone)]
pub struct FeedClient {
    url: String,
    agency: String,
}

impl FeedClient {
    pub fn new(cfg: &AppConfig) -> FeedClient {
        FeedClient {
            url: cfg.feed_url.clone(),
            agency: cfg.agency.clone(),
        }
    }

    pub fn locations_url(&self, route: Option<&str>) -> String {
        let mut url = format!("{}?command=vehicleLocations&a={}", self.url, self.agency);
        if let Some(route) = route {
            url.push_str(&format!("&r={}", route));
        }
        url
    }

    pub fn route_list_url(&self) -> String {
        format!("{}?command=routeList&a={}", self.url, self.agency)
    }

    pub async fn vehicle_locations(&self, route: Option<&str>) -> Result<Vec<FeedVehicle>> {
        let raw = download::download_bytes(self.locations_url(route)).await?;
        parse_vehicle_locations(&raw)
    }

    pub async fn fetch_route_list(&self) -> Result<Vec<u8>> {
        download::download_bytes(self.route_list_url()).await
    }
}

// The publicJSONFeed has quirks: every number arrives as a string, a single
// result is a bare object instead of a one-element list, and an empty result
// omits the key entirely.

#[derive(Deserialize)]
struct LocationsResponse {
    #[serde(default)]
    vehicle: OneOrMany<RawVehicle>,
}

#[derive(Deserialize)]
struct RawVehicle {
    id: String,
    #[serde(rename = "routeTag")]
    route_tag: Option<String>,
    #[serde(deserialize_with = "string_or_f64")]
    lon: f64,
    #[serde(deserialize_with = "string_or_f64")]
    lat: f64,
}

#[derive(Deserialize)]
struct RouteListResponse {
    #[serde(default)]
    route: OneOrMany<RawRoute>,
}

#[derive(Deserialize)]
struct RawRoute {
    tag: String,
    title: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(list) => list,
            OneOrMany::One(x) => vec![x],
        }
    }
}

fn string_or_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    match Raw::deserialize(d)? {
        Raw::Number(x) => Ok(x),
        Raw::Text(x) => x.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

pub fn parse_vehicle_locations(raw: &[u8]) -> Result<Vec<FeedVehicle>> {
    let resp: LocationsResponse = serde_json::from_slice(raw)?;
    Ok(resp
        .vehicle
        .into_vec()
        .into_iter()
        .map(|v| FeedVehicle {
            id: v.id,
            route_tag: v.route_tag,
            pos: LonLat::new(v.lon, v.lat),
        })
        .collect())
}

pub fn parse_route_list(raw: &[u8]) -> Result<Vec<(String, String)>> {
    let resp: RouteListResponse = serde_json::from_slice(raw)?;
    Ok(resp
        .route
        .into_vec()
        .into_iter()
        .map(|r| {
            let title = r.title.unwrap_or_else(|| r.tag.clone());
            (r.tag, title)
        })
        .collect())
}

/// Applies the filtering every poll goes through: vehicles with no route tag
/// are unpredictable and skipped, and a few routes have bad map data.
pub fn keep_vehicles(raw: Vec<FeedVehicle>, dropped: &[String]) -> Vec<Vehicle> {
    raw.into_iter()
        .filter_map(|v| {
            let route = v.route_tag?;
            if dropped.contains(&route) {
                return None;
            }
            Some(Vehicle {
                id: v.id,
                route,
                pos: v.pos,
            })
        })
        .collect()
}

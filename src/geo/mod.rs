//! Conversion between `{x, y}` coordinate pairs and the text form points are
//! stored in (`POINT(<x> <y>)`).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("coordinate {0} is required")]
    MissingAxis(&'static str),

    #[error("coordinate {0} must be a finite number")]
    NonFinite(&'static str),

    #[error("malformed geometry: {0}")]
    MalformedGeometry(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub x: f64,
    pub y: f64,
}

impl GeoPoint {
    pub fn new(x: f64, y: f64) -> Result<Self, GeoError> {
        if !x.is_finite() {
            return Err(GeoError::NonFinite("x"));
        }
        if !y.is_finite() {
            return Err(GeoError::NonFinite("y"));
        }
        Ok(Self { x, y })
    }
}

/// A point as it appears in request bodies, where either axis may be absent.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PointInput {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl PointInput {
    pub fn into_point(self) -> Result<GeoPoint, GeoError> {
        let x = self.x.ok_or(GeoError::MissingAxis("x"))?;
        let y = self.y.ok_or(GeoError::MissingAxis("y"))?;
        GeoPoint::new(x, y)
    }
}

/// A decoded point in read responses. Both axes are null when nothing is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NullablePoint {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl From<GeoPoint> for NullablePoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            x: Some(point.x),
            y: Some(point.y),
        }
    }
}

pub fn encode(point: &GeoPoint) -> Result<String, GeoError> {
    let point = GeoPoint::new(point.x, point.y)?;
    Ok(format!("POINT({} {})", point.x, point.y))
}

/// Parses `(<x> <y>)`, with or without a leading geometry tag.
pub fn decode(text: &str) -> Result<GeoPoint, GeoError> {
    let malformed = || GeoError::MalformedGeometry(text.to_string());

    let open = text.find('(').ok_or_else(malformed)?;
    let close = text[open..].find(')').ok_or_else(malformed)? + open;

    let mut tokens = text[open + 1..close].split_whitespace();
    let (Some(raw_x), Some(raw_y), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(malformed());
    };

    let x = raw_x.parse::<f64>().map_err(|_| malformed())?;
    let y = raw_y.parse::<f64>().map_err(|_| malformed())?;

    GeoPoint::new(x, y).map_err(|_| malformed())
}

/// Decodes a stored column for a read response. Malformed text degrades to
/// null coordinates so one bad row does not fail a whole listing.
pub fn decode_stored(stored: Option<&str>) -> NullablePoint {
    match stored.map(decode) {
        None => NullablePoint::default(),
        Some(Ok(point)) => point.into(),
        Some(Err(err)) => {
            warn!(error = %err, "stored point could not be decoded");
            NullablePoint::default()
        }
    }
}

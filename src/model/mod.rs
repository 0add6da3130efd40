mod postal_code;
mod temperature;

pub use postal_code::{is_valid_postal_code, PostalCode, PostalCodeRequest, POSTAL_CODE_LEN};
pub use temperature::Temperature;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Locality name as reported by the geocoding provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, ToSchema, Serialize, Deserialize)]
#[schema(example = json!("São Paulo"))]
#[serde(transparent)]
#[repr(transparent)]
pub struct City(String);

impl City {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for City {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for City {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Resolved weather for a postal code: the success body of the resolution stage.
#[derive(Debug, Clone, PartialEq, ToSchema, Serialize, Deserialize)]
pub struct WeatherResult {
    pub city: String,

    #[serde(rename = "temp_C")]
    pub temp_celsius: f64,

    #[serde(rename = "temp_F")]
    pub temp_fahrenheit: f64,

    #[serde(rename = "temp_K")]
    pub temp_kelvin: f64,
}

impl WeatherResult {
    pub fn new(city: City, temperature: Temperature) -> Self {
        Self {
            city: city.0,
            temp_celsius: temperature.celsius,
            temp_fahrenheit: temperature.fahrenheit,
            temp_kelvin: temperature.kelvin,
        }
    }
}

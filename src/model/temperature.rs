/// A reading expressed in all three scales, derived once from Celsius.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Temperature {
    pub celsius: f64,
    pub fahrenheit: f64,
    pub kelvin: f64,
}

impl Temperature {
    pub fn from_celsius(celsius: f64) -> Self {
        Self {
            celsius,
            fahrenheit: celsius * 1.8 + 32.0,
            kelvin: celsius + 273.15,
        }
    }
}

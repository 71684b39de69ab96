pub mod distance;
pub mod geocode;

pub use distance::{nearby, Coordinate, DEFAULT_RADIUS_METERS};
pub use geocode::{
    display_address, FallbackLocality, GeocodeError, NominatimGeocoder, ReverseGeocoder,
    ReverseLookup,
};

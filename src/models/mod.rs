pub mod location;

pub use location::{FieldError, Location, LocationRequest, NewLocation, ValidationErrors};

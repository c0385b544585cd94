mod handler;

pub use handler::{create_location, get_location, get_route, list_locations, update_location};

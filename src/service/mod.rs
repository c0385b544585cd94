pub mod route;

pub use route::{DEFAULT_ROUTE_TTL, RouteError, RouteService, sort_by_distance};

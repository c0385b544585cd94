use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState,
    error::AppError,
    models::{Location, LocationRequest, NewLocation},
};

const DEFAULT_PAGE_LIMIT: i64 = 10;

// 分页查询参数，保留原始字符串以便返回统一的 400
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    limit: Option<String>,
    offset: Option<String>,
}

// 路线查询参数
#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    lat: Option<String>,
    lng: Option<String>,
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>().map_err(|_| {
        tracing::warn!("Invalid ID parameter: {}", raw);
        AppError::BadRequest("Invalid ID")
    })
}

fn parse_body(payload: Result<Json<LocationRequest>, JsonRejection>) -> Result<NewLocation, AppError> {
    let Json(req) = payload.map_err(|e| AppError::InvalidJson(e.body_text()))?;
    Ok(NewLocation::try_from(req)?)
}

fn parse_page(query: &PageQuery) -> Result<(i64, i64), AppError> {
    let limit = match query.limit.as_deref() {
        Some(raw) => raw.trim().parse::<i64>().ok(),
        None => Some(DEFAULT_PAGE_LIMIT),
    };
    let offset = match query.offset.as_deref() {
        Some(raw) => raw.trim().parse::<i64>().ok(),
        None => Some(0),
    };

    match (limit, offset) {
        (Some(limit), Some(offset)) if limit >= 1 && offset >= 0 => Ok((limit, offset)),
        _ => {
            tracing::warn!("Invalid pagination parameters: {:?}", query);
            Err(AppError::BadRequest("Invalid pagination parameters"))
        }
    }
}

fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

pub async fn create_location(
    State(state): State<AppState>,
    payload: Result<Json<LocationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let new_location = parse_body(payload)?;
    let location = state
        .store
        .create(new_location)
        .await
        .map_err(|e| AppError::from_store("Could not create location", e))?;

    tracing::info!("Location created: {} ({})", location.name, location.id);
    Ok((StatusCode::CREATED, Json(location)))
}

pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Location>>, AppError> {
    let (limit, offset) = parse_page(&query)?;
    let locations = state
        .store
        .paginate(limit, offset)
        .await
        .map_err(|e| AppError::from_store("Could not fetch locations", e))?;

    tracing::info!("Fetched {} locations", locations.len());
    Ok(Json(locations))
}

pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Location>, AppError> {
    let id = parse_id(&id)?;
    let location = state
        .store
        .find_by_id(id)
        .await
        .map_err(|e| AppError::from_store("Could not fetch location", e))?;

    Ok(Json(location))
}

pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<LocationRequest>, JsonRejection>,
) -> Result<Json<Location>, AppError> {
    let id = parse_id(&id)?;
    let new_location = parse_body(payload)?;
    let location = state
        .store
        .update(id, new_location)
        .await
        .map_err(|e| AppError::from_store("Could not update location", e))?;

    tracing::info!("Location updated: {}", id);
    Ok(Json(location))
}

pub async fn get_route(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<Vec<Location>>, AppError> {
    let (Some(lat), Some(lng)) = (
        parse_coordinate(query.lat.as_deref()),
        parse_coordinate(query.lng.as_deref()),
    ) else {
        tracing::warn!("Invalid lat/lng parameters: {:?}", query);
        return Err(AppError::InvalidCoordinate);
    };

    let route = state
        .routes
        .get_route_within(lat, lng, state.config.route_timeout())
        .await?;

    tracing::info!("Route fetched: {} locations", route.len());
    Ok(Json(route))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(limit: Option<&str>, offset: Option<&str>) -> PageQuery {
        PageQuery {
            limit: limit.map(String::from),
            offset: offset.map(String::from),
        }
    }

    #[test]
    fn pagination_defaults() {
        assert_eq!(parse_page(&page(None, None)).unwrap(), (10, 0));
        assert_eq!(parse_page(&page(Some("3"), Some("6"))).unwrap(), (3, 6));
    }

    #[test]
    fn pagination_rejects_out_of_range_values() {
        assert!(parse_page(&page(Some("0"), None)).is_err());
        assert!(parse_page(&page(None, Some("-1"))).is_err());
        assert!(parse_page(&page(Some("abc"), None)).is_err());
    }

    #[test]
    fn coordinates_must_be_finite_numbers() {
        assert_eq!(parse_coordinate(Some("41.11")), Some(41.11));
        assert_eq!(parse_coordinate(Some("NaN")), None);
        assert_eq!(parse_coordinate(Some("")), None);
        assert_eq!(parse_coordinate(None), None);
    }
}

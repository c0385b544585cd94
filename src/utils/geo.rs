/// 地球平均半径（千米）
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// 纬度合法范围
pub fn is_valid_latitude(latitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude)
}

/// 经度合法范围
pub fn is_valid_longitude(longitude: f64) -> bool {
    (-180.0..=180.0).contains(&longitude)
}

/// 使用 Haversine 公式计算两点间的大圆距离（千米）
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // 浮点误差可能让 a 略微超出 [0, 1]
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero() {
        assert!(haversine_km(41.0082, 28.9784, 41.0082, 28.9784).abs() < 1e-9);
        assert!(haversine_km(-90.0, 0.0, -90.0, 0.0).abs() < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = haversine_km(40.7128, -74.0060, 34.0522, -118.2437);
        let ba = haversine_km(34.0522, -118.2437, 40.7128, -74.0060);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn new_york_to_los_angeles() {
        let d = haversine_km(40.7128, -74.0060, 34.0522, -118.2437);
        assert!((d - 3935.7).abs() < 1.0, "got {d}");
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = haversine_km(0.0, 0.0, 0.0, 180.0);
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn coordinate_ranges_are_inclusive() {
        assert!(is_valid_latitude(90.0));
        assert!(is_valid_latitude(-90.0));
        assert!(!is_valid_latitude(90.0001));
        assert!(is_valid_longitude(-180.0));
        assert!(!is_valid_longitude(200.0));
        assert!(!is_valid_latitude(f64::NAN));
    }
}

/// 路线缓存键前缀
const ROUTE_PREFIX: &str = "route:";

/// 坐标量化精度：小数点后 4 位，约 11 米
const QUANTIZE_SCALE: f64 = 10_000.0;

/// 将坐标四舍五入到小数点后 4 位
pub fn quantize(value: f64) -> f64 {
    // 加 0.0 把 -0.0 归一成 0.0，保证格式化结果一致
    (value * QUANTIZE_SCALE).round() / QUANTIZE_SCALE + 0.0
}

/// 生成路线缓存键，格式为 `route:<lat>:<lon>`
pub fn route_key(lat: f64, lon: f64) -> String {
    format!("{}{:.4}:{:.4}", ROUTE_PREFIX, quantize(lat), quantize(lon))
}

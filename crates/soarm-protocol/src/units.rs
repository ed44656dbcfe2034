//! 物理单位与寄存器原始值互转
//!
//! 位置寄存器为 12 位无符号整数（0–4095）：关节位置线性覆盖
//! ±180° 行程，夹爪位置线性覆盖 0–100% 开合度。
//!
//! 全部为无失败分支的纯函数。硬件返回的越界原始值映射到物理
//! 范围之外，由调用方读取后重新夹取。

/// 位置寄存器最大原始值（12 位）
pub const RAW_MAX: u16 = 4095;

/// 单个原始单位对应的角度（往返转换的舍入误差上界）
pub const DEGREES_PER_RAW: f64 = 360.0 / RAW_MAX as f64;

/// 角度转原始值，饱和到 [0, 4095]
pub fn degrees_to_raw(degrees: f64) -> u16 {
    let raw = ((degrees + 180.0) * f64::from(RAW_MAX) / 360.0).round();
    raw.clamp(0.0, f64::from(RAW_MAX)) as u16
}

/// 原始值转角度
pub fn raw_to_degrees(raw: u16) -> f64 {
    f64::from(raw) * 360.0 / f64::from(RAW_MAX) - 180.0
}

/// 开合百分比转原始值
///
/// 百分比由调用方预先夹取到 [0, 100]，此处只做浮点到整数的
/// 饱和转换，不再按关节限位夹取。
pub fn percent_to_raw(percent: f64) -> u16 {
    (percent * f64::from(RAW_MAX) / 100.0).round() as u16
}

/// 原始值转开合百分比
pub fn raw_to_percent(raw: u16) -> f64 {
    f64::from(raw) * 100.0 / f64::from(RAW_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degree_endpoints() {
        assert_eq!(degrees_to_raw(-180.0), 0);
        assert_eq!(degrees_to_raw(180.0), RAW_MAX);
        assert_eq!(degrees_to_raw(0.0), 2048);
    }

    /// 越界角度饱和到寄存器边界
    #[test]
    fn degree_saturation() {
        assert_eq!(degrees_to_raw(-200.0), 0);
        assert_eq!(degrees_to_raw(250.0), RAW_MAX);
    }

    /// 往返转换误差不超过一个原始单位对应的角度
    #[test]
    fn degree_round_trip_error_bound() {
        let mut degrees = -180.0;
        while degrees <= 180.0 {
            let restored = raw_to_degrees(degrees_to_raw(degrees));
            assert!(
                (restored - degrees).abs() <= DEGREES_PER_RAW,
                "round trip of {degrees} drifted to {restored}"
            );
            degrees += 0.37;
        }
    }

    #[test]
    fn percent_endpoints() {
        assert_eq!(percent_to_raw(0.0), 0);
        assert_eq!(percent_to_raw(100.0), RAW_MAX);
        assert!((raw_to_percent(RAW_MAX) - 100.0).abs() < 1e-9);
    }

    /// 百分比转换单调不减
    #[test]
    fn percent_monotonic() {
        let mut previous = percent_to_raw(0.0);
        let mut percent = 0.0;
        while percent <= 100.0 {
            let raw = percent_to_raw(percent);
            assert!(raw >= previous, "percent_to_raw not monotonic at {percent}");
            previous = raw;
            percent += 0.13;
        }
    }
}

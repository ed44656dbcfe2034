//! 关节定义与电机注册表

use crate::error::DriverError;
use std::fmt;
use std::str::FromStr;

/// 六个固定关节，声明顺序即总线扫描与位置查询顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    ShoulderPan,
    ShoulderLift,
    ElbowFlex,
    WristFlex,
    WristRoll,
    Gripper,
}

impl Joint {
    /// 全部关节（固定顺序）
    pub const ALL: [Joint; 6] = [
        Joint::ShoulderPan,
        Joint::ShoulderLift,
        Joint::ElbowFlex,
        Joint::WristFlex,
        Joint::WristRoll,
        Joint::Gripper,
    ];

    /// 关节名（与命令行参数、日志输出一致）
    pub fn name(self) -> &'static str {
        match self {
            Joint::ShoulderPan => "shoulder_pan",
            Joint::ShoulderLift => "shoulder_lift",
            Joint::ElbowFlex => "elbow_flex",
            Joint::WristFlex => "wrist_flex",
            Joint::WristRoll => "wrist_roll",
            Joint::Gripper => "gripper",
        }
    }

    /// 夹爪使用百分比单位，其余关节使用角度
    pub fn is_gripper(self) -> bool {
        self == Joint::Gripper
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Joint {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Joint::ALL
            .into_iter()
            .find(|joint| joint.name() == s)
            .ok_or_else(|| DriverError::UnknownMotor(s.to_string()))
    }
}

/// 舵机固件工作模式；本驱动只写入位置模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum OperatingMode {
    /// 位置模式（默认）
    #[default]
    Position = 0,
    /// 速度模式
    Velocity = 1,
    /// PWM 模式
    Pwm = 2,
    /// 步进模式
    Step = 3,
}

impl OperatingMode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// 单个电机的静态配置与位置缓存
#[derive(Debug, Clone)]
pub struct Motor {
    /// 总线地址（每关节唯一）
    pub id: u8,

    /// 舵机型号标识
    pub model: &'static str,

    /// 最近一次已知物理位置（角度或百分比）
    pub position: f64,

    /// 位置缓存是否可信
    ///
    /// 读失败置 `false`，使合法的 0.0 位置与"读不到"可区分。
    pub position_valid: bool,

    /// 软限位下限
    pub min_pos: f64,

    /// 软限位上限
    pub max_pos: f64,
}

impl Motor {
    pub fn new(id: u8, model: &'static str, min_pos: f64, max_pos: f64) -> Self {
        Self {
            id,
            model,
            position: 0.0,
            position_valid: false,
            min_pos,
            max_pos,
        }
    }

    /// 夹取到软限位
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min_pos, self.max_pos)
    }
}

/// 电机注册表：六个命名关节到总线地址、型号与软限位的固定映射
///
/// 条目在构造时一次建立，之后只刷新位置缓存字段。注册表按
/// 控制器实例持有而非全局单例，便于用替代关节表与 Mock 总线
/// 测试。
#[derive(Debug, Clone)]
pub struct MotorRegistry {
    motors: [Motor; 6],
}

impl Default for MotorRegistry {
    fn default() -> Self {
        Self::so_arm()
    }
}

impl MotorRegistry {
    /// SO-ARM 默认配置：STS3215 × 6，关节 ±180°，夹爪 0–100%
    pub fn so_arm() -> Self {
        let joint = |id| Motor::new(id, "sts3215", -180.0, 180.0);
        Self {
            motors: [
                joint(1),
                joint(2),
                joint(3),
                joint(4),
                joint(5),
                Motor::new(6, "sts3215", 0.0, 100.0),
            ],
        }
    }

    /// 自定义关节表（顺序与 [`Joint::ALL`] 对应）
    pub fn new(motors: [Motor; 6]) -> Self {
        Self { motors }
    }

    pub fn get(&self, joint: Joint) -> &Motor {
        &self.motors[joint as usize]
    }

    pub fn get_mut(&mut self, joint: Joint) -> &mut Motor {
        &mut self.motors[joint as usize]
    }

    /// 夹取到关节软限位
    pub fn clamp(&self, joint: Joint, value: f64) -> f64 {
        self.get(joint).clamp(value)
    }

    /// 以固定顺序遍历 (关节, 电机)
    pub fn iter(&self) -> impl Iterator<Item = (Joint, &Motor)> {
        Joint::ALL.into_iter().map(|joint| (joint, self.get(joint)))
    }
}

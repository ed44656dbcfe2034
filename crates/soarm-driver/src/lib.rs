//! # SO-ARM 驱动层
//!
//! 六关节串行舵机机械臂的设备驱动：连接/断开生命周期、逐关节
//! 配置、运动指令、位置查询与急停。
//!
//! 驱动以度（关节）和百分比（夹爪）为对外单位，寄存器原始值
//! 只存在于传输边界，永不缓存。

pub mod arm;
mod error;
pub mod motor;

pub use arm::{Arm, ConnectionState, SerialArm};
pub use error::DriverError;
pub use motor::{Joint, Motor, MotorRegistry, OperatingMode};

//! STS3215 控制表寄存器地址
//!
//! 只列出本 SDK 实际访问的寄存器。

/// 型号（2 字节，只读）
pub const MODEL_NUMBER: u8 = 3;

/// 工作模式（1 字节）
pub const OPERATING_MODE: u8 = 33;

/// 扭矩开关（1 字节）
pub const TORQUE_ENABLE: u8 = 40;

/// 目标位置（2 字节）
pub const GOAL_POSITION: u8 = 42;

/// 当前位置（2 字节，只读）
pub const PRESENT_POSITION: u8 = 56;

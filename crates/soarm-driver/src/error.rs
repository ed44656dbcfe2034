//! 驱动层错误类型定义

use crate::motor::Joint;
use soarm_bus::BusError;
use thiserror::Error;

/// 驱动层错误类型
///
/// 只有连接序列会把错误返回给调用方；稳态运动与查询的单关节
/// 失败按关节记录日志后降级，不向上传播。
#[derive(Error, Debug)]
pub enum DriverError {
    /// 传输层错误（串口打开失败、应答超时等）
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// 连接时某关节舵机无应答
    #[error("Motor not found: {joint} (bus id {id})")]
    MotorNotFound { joint: Joint, id: u8 },

    /// 调用方传入未知关节名
    #[error("Unknown motor: {0}")]
    UnknownMotor(String),
}

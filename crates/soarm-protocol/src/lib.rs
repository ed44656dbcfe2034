//! # SO-ARM 舵机总线协议
//!
//! SCS/STS 系列串行智能舵机的寄存器协议定义（无硬件依赖）。
//!
//! ## 模块
//!
//! - `packet`: 指令包构建与应答包解析
//! - `registers`: 控制表寄存器地址常量
//! - `units`: 物理单位（角度/百分比）与 12 位原始寄存器值互转
//!
//! ## 字节序
//!
//! 多字节寄存器值低位在前（STS 字节序），由 `packet` 模块统一处理。

pub mod packet;
pub mod registers;
pub mod units;

pub use packet::StatusPacket;

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid packet header: {0:02X?}")]
    InvalidHeader([u8; 2]),

    #[error("Invalid length field: {0}")]
    InvalidLength(u8),

    #[error("Truncated packet: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("Unexpected responder id: expected {expected}, got {actual}")]
    UnexpectedId { expected: u8, actual: u8 },

    #[error("Missing parameter bytes: expected {expected}, got {actual}")]
    MissingParams { expected: usize, actual: usize },
}

//! # SO-ARM 串行总线适配层
//!
//! 半双工舵机总线的硬件抽象，提供统一的字节流适配接口
//! （`BusAdapter`）与一问一答的寄存器交换引擎（`ServoBus`）。
//!
//! 总线上同一时刻至多一笔在途交换：每次请求要么在固定超时内
//! 收到应答，要么报告失败，本层不做重试与退避。

mod bus;
pub mod serial;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use bus::{BusOpener, ServoBus};
pub use serial::{DEFAULT_BAUD, PROBE_BAUDS, SerialBusAdapter, SerialOpener};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockBus;

use soarm_protocol::ProtocolError;
use thiserror::Error;

/// 总线适配层统一错误类型
#[derive(Error, Debug)]
pub enum BusError {
    /// 串口打开或配置失败
    #[error("Serial port error: {0}")]
    Port(#[from] serialport::Error),

    /// 底层 IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 固定超时内未收到应答
    #[error("Response timeout")]
    Timeout,

    /// 应答帧不合法（包头、校验和、应答者地址）
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// 字节流适配器：串口或测试替身
///
/// 实现者只负责搬运字节；帧语义由 [`ServoBus`] 负责。
pub trait BusAdapter: Send {
    /// 写出全部字节
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), BusError>;

    /// 读满缓冲区；固定超时内不足时返回 [`BusError::Timeout`]
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BusError>;

    /// 丢弃输入缓冲中的残留字节（半双工换向前调用）
    fn discard_input(&mut self) -> Result<(), BusError>;
}

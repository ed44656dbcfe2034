//! 寄存器交换引擎
//!
//! 在单条半双工总线上做一问一答的寄存器读写。每次交换前丢弃
//! 输入缓冲中的残留字节，交换在固定超时内完成或报错。重试策略
//! 属于调用方，本层不重发。

use crate::{BusAdapter, BusError};
use soarm_protocol::ProtocolError;
use soarm_protocol::packet::{self, STATUS_HEADER_LEN, StatusPacket};
use soarm_protocol::registers;
use tracing::trace;

/// 传输层开启器：每次 `connect` 产生一个新的 [`ServoBus`]
pub trait BusOpener {
    type Adapter: BusAdapter;

    fn open_bus(&self) -> Result<ServoBus<Self::Adapter>, BusError>;
}

/// 舵机总线：封装适配器并按协议帧交换寄存器数据
///
/// 释放即关闭底层句柄；持有方以 `Option<ServoBus>` 表达开/关，
/// 重复释放自然为空操作。
pub struct ServoBus<A: BusAdapter> {
    adapter: A,
}

impl ServoBus<crate::SerialBusAdapter> {
    /// 打开串口总线
    pub fn open(path: &str, baud: u32) -> Result<Self, BusError> {
        Ok(Self::new(crate::SerialBusAdapter::open(path, baud)?))
    }
}

impl<A: BusAdapter> ServoBus<A> {
    pub fn new(adapter: A) -> Self {
        Self { adapter }
    }

    /// PING 指定地址，在线时返回型号寄存器的值
    ///
    /// `Ok(None)` 表示该地址无在线舵机：超时、校验失败或应答者
    /// 地址不符都按不在线处理，不作为错误向上传播。
    pub fn ping(&mut self, id: u8) -> Result<Option<u16>, BusError> {
        match self.exchange(id, &packet::ping_packet(id)) {
            Ok(_) => {}
            Err(BusError::Timeout | BusError::Protocol(_)) => return Ok(None),
            Err(e) => return Err(e),
        }
        match self.read_u16(id, registers::MODEL_NUMBER) {
            Ok(model) => Ok(Some(model)),
            Err(BusError::Timeout | BusError::Protocol(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 写单字节寄存器
    pub fn write_u8(&mut self, id: u8, address: u8, value: u8) -> Result<(), BusError> {
        self.exchange(id, &packet::write_u8_packet(id, address, value))?;
        Ok(())
    }

    /// 写双字节寄存器（低位在前）
    pub fn write_u16(&mut self, id: u8, address: u8, value: u16) -> Result<(), BusError> {
        self.exchange(id, &packet::write_u16_packet(id, address, value))?;
        Ok(())
    }

    /// 读双字节寄存器
    pub fn read_u16(&mut self, id: u8, address: u8) -> Result<u16, BusError> {
        let status = self.exchange(id, &packet::read_packet(id, address, 2))?;
        Ok(status.param_u16()?)
    }

    /// 单次一问一答交换
    fn exchange(&mut self, id: u8, request: &[u8]) -> Result<StatusPacket, BusError> {
        self.adapter.discard_input()?;
        trace!(id, len = request.len(), "tx");
        self.adapter.write_all(request)?;
        self.receive_status(id)
    }

    fn receive_status(&mut self, expected_id: u8) -> Result<StatusPacket, BusError> {
        let mut bytes = vec![0u8; STATUS_HEADER_LEN];
        self.adapter.read_exact(&mut bytes)?;

        if bytes[0..2] != packet::HEADER {
            return Err(ProtocolError::InvalidHeader([bytes[0], bytes[1]]).into());
        }
        let len = bytes[3];
        if len < 2 {
            return Err(ProtocolError::InvalidLength(len).into());
        }

        bytes.resize(STATUS_HEADER_LEN + len as usize, 0);
        self.adapter.read_exact(&mut bytes[STATUS_HEADER_LEN..])?;

        let status = StatusPacket::parse(&bytes)?;
        trace!(id = status.id, error = status.error, "rx");
        if status.id != expected_id {
            return Err(ProtocolError::UnexpectedId {
                expected: expected_id,
                actual: status.id,
            }
            .into());
        }
        Ok(status)
    }
}

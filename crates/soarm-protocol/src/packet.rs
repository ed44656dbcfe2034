//! 指令包构建与应答包解析
//!
//! 半双工一问一答协议，帧格式：
//!
//! ```text
//! 指令包: [0xFF, 0xFF, ID, LEN, INST, PARAM..., CHECKSUM]
//! 应答包: [0xFF, 0xFF, ID, LEN, ERROR, PARAM..., CHECKSUM]
//! ```
//!
//! `LEN` 统计 LEN 字段之后的全部字节（指令/错误位 + 参数 + 校验和），
//! 即 `参数字节数 + 2`；`CHECKSUM = !(ID + LEN + INST + ΣPARAM)`。

use crate::ProtocolError;

/// 包头（两个同步字节）
pub const HEADER: [u8; 2] = [0xFF, 0xFF];

/// 广播地址（全体舵机，无应答）
pub const BROADCAST_ID: u8 = 0xFE;

/// 最大合法舵机地址
pub const MAX_ID: u8 = 0xFC;

/// PING 指令
pub const INST_PING: u8 = 0x01;

/// 读寄存器指令
pub const INST_READ: u8 = 0x02;

/// 写寄存器指令
pub const INST_WRITE: u8 = 0x03;

/// 应答包定长头部：包头 2 字节 + ID + LEN
pub const STATUS_HEADER_LEN: usize = 4;

/// 校验和：对 ID 起（含）到参数末尾的所有字节求和后取反
pub fn checksum(bytes: &[u8]) -> u8 {
    !bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// 构建任意指令包
pub fn instruction_packet(id: u8, instruction: u8, params: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(HEADER.len() + 4 + params.len());
    packet.extend_from_slice(&HEADER);
    packet.push(id);
    packet.push(params.len() as u8 + 2);
    packet.push(instruction);
    packet.extend_from_slice(params);
    let sum = checksum(&packet[2..]);
    packet.push(sum);
    packet
}

/// PING 指令包
pub fn ping_packet(id: u8) -> Vec<u8> {
    instruction_packet(id, INST_PING, &[])
}

/// 读寄存器指令包，`count` 为读取字节数
pub fn read_packet(id: u8, address: u8, count: u8) -> Vec<u8> {
    instruction_packet(id, INST_READ, &[address, count])
}

/// 写单字节寄存器指令包
pub fn write_u8_packet(id: u8, address: u8, value: u8) -> Vec<u8> {
    instruction_packet(id, INST_WRITE, &[address, value])
}

/// 写双字节寄存器指令包（低位在前）
pub fn write_u16_packet(id: u8, address: u8, value: u16) -> Vec<u8> {
    let [lo, hi] = value.to_le_bytes();
    instruction_packet(id, INST_WRITE, &[address, lo, hi])
}

/// 解析后的应答包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPacket {
    /// 应答舵机地址
    pub id: u8,

    /// 舵机错误位（0 表示无错误）
    pub error: u8,

    /// 应答参数
    pub params: Vec<u8>,
}

impl StatusPacket {
    /// 由完整应答字节解析（含包头与校验和）
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < STATUS_HEADER_LEN {
            return Err(ProtocolError::Truncated {
                expected: STATUS_HEADER_LEN,
                actual: bytes.len(),
            });
        }
        if bytes[0..2] != HEADER {
            return Err(ProtocolError::InvalidHeader([bytes[0], bytes[1]]));
        }

        let id = bytes[2];
        let len = bytes[3];
        // LEN 至少覆盖错误位与校验和
        if len < 2 {
            return Err(ProtocolError::InvalidLength(len));
        }
        let total = STATUS_HEADER_LEN + len as usize;
        if bytes.len() < total {
            return Err(ProtocolError::Truncated {
                expected: total,
                actual: bytes.len(),
            });
        }

        let expected = checksum(&bytes[2..total - 1]);
        let actual = bytes[total - 1];
        if expected != actual {
            return Err(ProtocolError::ChecksumMismatch { expected, actual });
        }

        Ok(Self {
            id,
            error: bytes[4],
            params: bytes[5..total - 1].to_vec(),
        })
    }

    /// 取双字节参数（低位在前）
    pub fn param_u16(&self) -> Result<u16, ProtocolError> {
        if self.params.len() < 2 {
            return Err(ProtocolError::MissingParams {
                expected: 2,
                actual: self.params.len(),
            });
        }
        Ok(u16::from_le_bytes([self.params[0], self.params[1]]))
    }
}

//! `serialport` 后端适配器

use crate::{BusAdapter, BusError};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::info;

/// 默认波特率
pub const DEFAULT_BAUD: u32 = 1_000_000;

/// 探测候选波特率（按优先级）
pub const PROBE_BAUDS: [u32; 4] = [1_000_000, 115_200, 57_600, 9_600];

/// 单次交换的应答超时
pub const RESPONSE_TIMEOUT: Duration = Duration::from_millis(100);

/// 半双工串口适配器（8N1，无流控）
pub struct SerialBusAdapter {
    port: Box<dyn SerialPort>,
}

impl SerialBusAdapter {
    /// 打开并配置串口
    pub fn open(path: &str, baud: u32) -> Result<Self, BusError> {
        let port = serialport::new(path, baud)
            .timeout(RESPONSE_TIMEOUT)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .open()?;
        info!(path, baud, "serial port opened");
        Ok(Self { port })
    }
}

impl BusAdapter for SerialBusAdapter {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BusError> {
        match self.port.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                Err(BusError::Timeout)
            }
            Err(e) => Err(BusError::Io(e)),
        }
    }

    fn discard_input(&mut self) -> Result<(), BusError> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }
}

/// 串口开启器（路径 + 波特率）
#[derive(Debug, Clone)]
pub struct SerialOpener {
    path: String,
    baud: u32,
}

impl SerialOpener {
    pub fn new(path: impl Into<String>, baud: u32) -> Self {
        Self {
            path: path.into(),
            baud,
        }
    }
}

impl crate::BusOpener for SerialOpener {
    type Adapter = SerialBusAdapter;

    fn open_bus(&self) -> Result<crate::ServoBus<SerialBusAdapter>, BusError> {
        Ok(crate::ServoBus::new(SerialBusAdapter::open(
            &self.path, self.baud,
        )?))
    }
}

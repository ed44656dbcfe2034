//! 寄存器级 Mock 总线
//!
//! 在内存中模拟一条挂有若干舵机的半双工总线：解析写入的指令包，
//! 将应答字节放入读取队列，供无硬件的单元与集成测试使用。
//!
//! 句柄可克隆，内部状态共享：测试先克隆一份探针句柄，再把原
//! 句柄交给被测对象，之后通过探针注入故障、检查寄存器与写入记录。

use crate::{BusAdapter, BusError, BusOpener, ServoBus};
use soarm_protocol::packet;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

/// 模拟舵机默认上报的型号（STS3215）
pub const DEFAULT_MODEL: u16 = 777;

/// 模拟舵机默认的当前位置原始值（行程中点）
pub const DEFAULT_PRESENT_RAW: u16 = 2048;

/// 控制表大小（字节）
const CONTROL_TABLE_LEN: usize = 128;

/// 记录的一次写寄存器操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub id: u8,
    pub address: u8,
    pub params: Vec<u8>,
}

struct MockServo {
    online: bool,
    regs: [u8; CONTROL_TABLE_LEN],
}

impl MockServo {
    fn new() -> Self {
        let mut regs = [0u8; CONTROL_TABLE_LEN];
        let model = soarm_protocol::registers::MODEL_NUMBER as usize;
        regs[model..model + 2].copy_from_slice(&DEFAULT_MODEL.to_le_bytes());
        let present = soarm_protocol::registers::PRESENT_POSITION as usize;
        regs[present..present + 2].copy_from_slice(&DEFAULT_PRESENT_RAW.to_le_bytes());
        Self { online: true, regs }
    }
}

struct MockState {
    servos: HashMap<u8, MockServo>,
    rx: VecDeque<u8>,
    writes: Vec<WriteRecord>,
    fail_reads: HashSet<(u8, u8)>,
    fail_open: bool,
}

/// 模拟总线句柄
#[derive(Clone)]
pub struct MockBus {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBus {
    /// 空总线（无舵机）
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                servos: HashMap::new(),
                rx: VecDeque::new(),
                writes: Vec::new(),
                fail_reads: HashSet::new(),
                fail_open: false,
            })),
        }
    }

    /// 挂上给定地址的在线舵机
    pub fn with_servos(ids: &[u8]) -> Self {
        let bus = Self::new();
        {
            let mut state = bus.state();
            for &id in ids {
                state.servos.insert(id, MockServo::new());
            }
        }
        bus
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock bus state poisoned")
    }

    /// 指定舵机掉线（收包但不应答）
    pub fn set_offline(&self, id: u8) {
        if let Some(servo) = self.state().servos.get_mut(&id) {
            servo.online = false;
        }
    }

    /// 令后续 `open_bus` 失败，模拟串口不可用
    pub fn set_fail_open(&self, fail: bool) {
        self.state().fail_open = fail;
    }

    /// 注入读失败：对该 (地址, 寄存器) 的 READ 不再应答
    pub fn fail_reads_at(&self, id: u8, address: u8) {
        self.state().fail_reads.insert((id, address));
    }

    /// 直接写控制表（双字节，低位在前）
    pub fn set_register_u16(&self, id: u8, address: u8, value: u16) {
        if let Some(servo) = self.state().servos.get_mut(&id) {
            let at = address as usize;
            servo.regs[at..at + 2].copy_from_slice(&value.to_le_bytes());
        }
    }

    /// 读控制表单字节
    pub fn register_u8(&self, id: u8, address: u8) -> Option<u8> {
        let state = self.state();
        state.servos.get(&id).map(|s| s.regs[address as usize])
    }

    /// 读控制表双字节（低位在前）
    pub fn register_u16(&self, id: u8, address: u8) -> Option<u16> {
        let state = self.state();
        state.servos.get(&id).map(|s| {
            let at = address as usize;
            u16::from_le_bytes([s.regs[at], s.regs[at + 1]])
        })
    }

    /// 全部写入记录
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.state().writes.clone()
    }

    /// 对指定 (地址, 寄存器) 的写入记录
    pub fn writes_to(&self, id: u8, address: u8) -> Vec<WriteRecord> {
        self.state()
            .writes
            .iter()
            .filter(|w| w.id == id && w.address == address)
            .cloned()
            .collect()
    }
}

impl BusOpener for MockBus {
    type Adapter = MockBus;

    fn open_bus(&self) -> Result<ServoBus<MockBus>, BusError> {
        if self.state().fail_open {
            return Err(BusError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "mock port unavailable",
            )));
        }
        Ok(ServoBus::new(self.clone()))
    }
}

impl BusAdapter for MockBus {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        let mut state = self.state();
        process_packet(&mut state, bytes);
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BusError> {
        let mut state = self.state();
        if state.rx.len() < buf.len() {
            state.rx.clear();
            return Err(BusError::Timeout);
        }
        for slot in buf.iter_mut() {
            *slot = state.rx.pop_front().expect("rx length checked above");
        }
        Ok(())
    }

    fn discard_input(&mut self) -> Result<(), BusError> {
        self.state().rx.clear();
        Ok(())
    }
}

/// 解析一个指令包并产生应答；坏包与掉线舵机不应答
fn process_packet(state: &mut MockState, bytes: &[u8]) {
    if bytes.len() < 6 || bytes[0..2] != packet::HEADER {
        return;
    }
    let id = bytes[2];
    let len = bytes[3] as usize;
    if len < 2 || bytes.len() < STATUS_FIXED + len {
        return;
    }
    let instruction = bytes[4];
    let params = &bytes[5..3 + len];
    if bytes[3 + len] != packet::checksum(&bytes[2..3 + len]) {
        return;
    }

    let Some(servo) = state.servos.get_mut(&id) else {
        return;
    };
    if !servo.online {
        return;
    }

    let response: Option<Vec<u8>> = match instruction {
        packet::INST_PING => Some(Vec::new()),
        packet::INST_READ if params.len() == 2 => {
            let (address, count) = (params[0], params[1] as usize);
            let at = address as usize;
            if state.fail_reads.contains(&(id, address)) || at + count > CONTROL_TABLE_LEN {
                None
            } else {
                Some(servo.regs[at..at + count].to_vec())
            }
        }
        packet::INST_WRITE if !params.is_empty() => {
            let address = params[0];
            let data = &params[1..];
            let at = address as usize;
            if at + data.len() > CONTROL_TABLE_LEN {
                None
            } else {
                servo.regs[at..at + data.len()].copy_from_slice(data);
                state.writes.push(WriteRecord {
                    id,
                    address,
                    params: data.to_vec(),
                });
                Some(Vec::new())
            }
        }
        _ => None,
    };

    if let Some(resp_params) = response {
        let mut status = vec![0xFF, 0xFF, id, resp_params.len() as u8 + 2, 0x00];
        status.extend_from_slice(&resp_params);
        let sum = packet::checksum(&status[2..]);
        status.push(sum);
        state.rx.extend(status);
    }
}

/// 指令包定长部分：包头 + ID + LEN
const STATUS_FIXED: usize = 4;

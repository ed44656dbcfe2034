//! 机械臂控制器
//!
//! 负责连接/断开生命周期、逐关节配置、运动指令、位置查询与
//! 急停。所有方法获取 `&mut self`，连接与断开序列天然串行化；
//! 总线交换全部经由控制器发起，任意时刻至多一笔在途请求。

use crate::error::DriverError;
use crate::motor::{Joint, MotorRegistry, OperatingMode};
use soarm_bus::{BusOpener, SerialOpener, ServoBus};
use soarm_protocol::{registers, units};
use tracing::{debug, info, warn};

/// 连接状态机
///
/// `Disconnected --connect--> Connecting --(全部在线)--> Connected`，
/// `disconnect` 从任意状态回到 `Disconnected`。状态由控制器独占
/// 持有，外部只读。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// 未连接（初始与终止状态）
    #[default]
    Disconnected,
    /// 连接序列进行中
    Connecting,
    /// 全部关节在线并完成配置
    Connected,
}

/// 机械臂控制器
pub struct Arm<O: BusOpener> {
    opener: O,
    registry: MotorRegistry,
    bus: Option<ServoBus<O::Adapter>>,
    state: ConnectionState,
}

/// 串口机械臂（默认后端）
pub type SerialArm = Arm<SerialOpener>;

impl<O: BusOpener> Arm<O> {
    /// 以默认 SO-ARM 关节表构造（未连接）
    pub fn new(opener: O) -> Self {
        Self::with_registry(opener, MotorRegistry::so_arm())
    }

    /// 以自定义关节表构造
    pub fn with_registry(opener: O, registry: MotorRegistry) -> Self {
        Self {
            opener,
            registry,
            bus: None,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn registry(&self) -> &MotorRegistry {
        &self.registry
    }

    /// 关节的缓存位置（最近一次成功写入或读取的物理值）
    pub fn cached_position(&self, joint: Joint) -> f64 {
        self.registry.get(joint).position
    }

    /// 缓存位置是否可信（最近一次读取是否成功）
    pub fn position_valid(&self, joint: Joint) -> bool {
        self.registry.get(joint).position_valid
    }

    /// 连接序列
    ///
    /// 打开传输层 → 按注册表顺序 PING 六个关节（任一无应答即
    /// [`DriverError::MotorNotFound`]）→ 逐关节写位置模式、使能
    /// 扭矩并缓存当前位置。
    ///
    /// 任一步失败都会中止整个序列：此时部分关节可能已被使能，
    /// 因此尽力关闭全部扭矩、释放串口并回到 `Disconnected`。
    pub fn connect(&mut self) -> Result<(), DriverError> {
        if self.state == ConnectionState::Connected {
            warn!("connect called while already connected");
            return Ok(());
        }

        self.state = ConnectionState::Connecting;
        let mut bus = match self.opener.open_bus() {
            Ok(bus) => bus,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(e.into());
            }
        };

        let setup = Self::ping_all(&mut bus, &self.registry)
            .and_then(|()| Self::configure_all(&mut bus, &mut self.registry));
        match setup {
            Ok(()) => {
                self.bus = Some(bus);
                self.state = ConnectionState::Connected;
                info!("connected, all joints online");
                Ok(())
            }
            Err(e) => {
                Self::torque_sweep(&mut bus, &self.registry, false);
                drop(bus);
                self.state = ConnectionState::Disconnected;
                Err(e)
            }
        }
    }

    /// 断开连接：尽力关闭扭矩并释放串口
    ///
    /// 未连接时为空操作；连接序列中途失败后调用同样安全。
    pub fn disconnect(&mut self) {
        if let Some(mut bus) = self.bus.take() {
            Self::torque_sweep(&mut bus, &self.registry, false);
            info!("disconnected");
        }
        self.state = ConnectionState::Disconnected;
    }

    /// 移动单个关节到目标物理位置（角度；夹爪为百分比）
    ///
    /// 未连接时记录告警并保持原状。目标先夹取到软限位再转换为
    /// 原始值；位置缓存乐观地更新为夹取后的请求值，不等待回读
    /// 确认，因此紧随其后的缓存读取可能与实机位置短暂不一致。
    pub fn move_motor(&mut self, joint: Joint, position: f64) {
        let Some(bus) = self.bus.as_mut() else {
            warn!(joint = %joint, "robot not connected, move ignored");
            return;
        };

        let motor = self.registry.get_mut(joint);
        let clamped = motor.clamp(position);
        let raw = if joint.is_gripper() {
            units::percent_to_raw(clamped)
        } else {
            units::degrees_to_raw(clamped)
        };

        if let Err(e) = bus.write_u16(motor.id, registers::GOAL_POSITION, raw) {
            warn!(
                joint = %joint,
                id = motor.id,
                address = registers::GOAL_POSITION,
                error = %e,
                "goal position write failed"
            );
        }
        motor.position = clamped;
        motor.position_valid = true;
        debug!(joint = %joint, position = clamped, raw, "move issued");
    }

    /// 字符串关节名入口，供脚本等薄调用方使用
    ///
    /// 未知名字记录告警后忽略，不产生任何总线交换。
    pub fn move_motor_named(&mut self, name: &str, position: f64) {
        match name.parse::<Joint>() {
            Ok(joint) => self.move_motor(joint, position),
            Err(e) => warn!(name, error = %e, "move ignored"),
        }
    }

    /// 查询全部关节当前位置（注册表顺序，恒为六项）
    ///
    /// 单关节读失败降级为 0.0 并把该关节缓存标记为不可信，
    /// 不中止整个查询；调用方可用 [`Arm::position_valid`] 区分
    /// 真实零位与读失败。
    pub fn get_positions(&mut self) -> Vec<(Joint, f64)> {
        let Some(bus) = self.bus.as_mut() else {
            warn!("robot not connected, positions unavailable");
            return Joint::ALL.into_iter().map(|joint| (joint, 0.0)).collect();
        };

        let mut positions = Vec::with_capacity(Joint::ALL.len());
        for joint in Joint::ALL {
            let id = self.registry.get(joint).id;
            match bus.read_u16(id, registers::PRESENT_POSITION) {
                Ok(raw) => {
                    let value = if joint.is_gripper() {
                        units::raw_to_percent(raw)
                    } else {
                        units::raw_to_degrees(raw)
                    };
                    let motor = self.registry.get_mut(joint);
                    motor.position = value;
                    motor.position_valid = true;
                    positions.push((joint, value));
                }
                Err(e) => {
                    warn!(
                        joint = %joint,
                        id,
                        address = registers::PRESENT_POSITION,
                        error = %e,
                        "position read failed"
                    );
                    self.registry.get_mut(joint).position_valid = false;
                    positions.push((joint, 0.0));
                }
            }
        }
        positions
    }

    /// 使能全部关节扭矩（逐关节尽力而为）
    pub fn enable_torque(&mut self) {
        let Some(bus) = self.bus.as_mut() else {
            warn!("robot not connected");
            return;
        };
        Self::torque_sweep(bus, &self.registry, true);
    }

    /// 关闭全部关节扭矩（逐关节尽力而为）
    pub fn disable_torque(&mut self) {
        let Some(bus) = self.bus.as_mut() else {
            warn!("robot not connected");
            return;
        };
        Self::torque_sweep(bus, &self.registry, false);
    }

    /// 急停：立即关闭全部扭矩
    ///
    /// 串口保持打开、连接状态不变，可在任意时刻（包括运动中）
    /// 调用。
    pub fn emergency_stop(&mut self) {
        warn!("EMERGENCY STOP");
        self.disable_torque();
    }

    /// 按注册表顺序 PING 全部关节
    fn ping_all(
        bus: &mut ServoBus<O::Adapter>,
        registry: &MotorRegistry,
    ) -> Result<(), DriverError> {
        for (joint, motor) in registry.iter() {
            match bus.ping(motor.id)? {
                Some(model) => debug!(joint = %joint, id = motor.id, model, "joint online"),
                None => {
                    return Err(DriverError::MotorNotFound {
                        joint,
                        id: motor.id,
                    });
                }
            }
        }
        Ok(())
    }

    /// 逐关节写位置模式、使能扭矩并读入初始位置
    ///
    /// 配置写失败中止连接；初始位置读失败只告警，缓存标记为
    /// 不可信。
    fn configure_all(
        bus: &mut ServoBus<O::Adapter>,
        registry: &mut MotorRegistry,
    ) -> Result<(), DriverError> {
        for joint in Joint::ALL {
            let id = registry.get(joint).id;
            bus.write_u8(id, registers::OPERATING_MODE, OperatingMode::Position.as_u8())?;
            bus.write_u8(id, registers::TORQUE_ENABLE, 1)?;

            match bus.read_u16(id, registers::PRESENT_POSITION) {
                Ok(raw) => {
                    let motor = registry.get_mut(joint);
                    motor.position = if joint.is_gripper() {
                        units::raw_to_percent(raw)
                    } else {
                        units::raw_to_degrees(raw)
                    };
                    motor.position_valid = true;
                }
                Err(e) => {
                    warn!(joint = %joint, id, error = %e, "initial position read failed");
                    registry.get_mut(joint).position_valid = false;
                }
            }
        }
        info!("motors configured for position control");
        Ok(())
    }

    /// 对全部关节写扭矩开关，单关节失败只告警不中断
    fn torque_sweep(bus: &mut ServoBus<O::Adapter>, registry: &MotorRegistry, enable: bool) {
        let value = u8::from(enable);
        for (joint, motor) in registry.iter() {
            if let Err(e) = bus.write_u8(motor.id, registers::TORQUE_ENABLE, value) {
                warn!(
                    joint = %joint,
                    id = motor.id,
                    address = registers::TORQUE_ENABLE,
                    error = %e,
                    "torque write failed"
                );
            }
        }
        debug!(enable, "torque sweep finished");
    }
}

//! 基于 Mock 总线的控制器集成测试
//!
//! 验证连接生命周期、限位夹取、降级查询与急停行为，不依赖硬件。

use soarm_bus::mock::{DEFAULT_PRESENT_RAW, MockBus};
use soarm_driver::{Arm, ConnectionState, DriverError, Joint};
use soarm_protocol::{registers, units};

const ALL_IDS: [u8; 6] = [1, 2, 3, 4, 5, 6];

fn mock_arm() -> (MockBus, Arm<MockBus>) {
    let bus = MockBus::with_servos(&ALL_IDS);
    let arm = Arm::new(bus.clone());
    (bus, arm)
}

fn connected_arm() -> (MockBus, Arm<MockBus>) {
    let (bus, mut arm) = mock_arm();
    arm.connect().expect("mock connect");
    (bus, arm)
}

/// 连接成功：状态 Connected，六关节全部写入位置模式并使能扭矩
#[test]
fn connect_configures_all_motors() {
    let (bus, arm) = connected_arm();
    assert_eq!(arm.state(), ConnectionState::Connected);
    assert!(arm.is_connected());
    for id in ALL_IDS {
        assert_eq!(bus.register_u8(id, registers::OPERATING_MODE), Some(0));
        assert_eq!(bus.register_u8(id, registers::TORQUE_ENABLE), Some(1));
    }
    // 初始位置已读入缓存
    for joint in Joint::ALL {
        assert!(arm.position_valid(joint));
    }
}

/// 关节 3 无应答：连接失败、尽力回滚、状态回到 Disconnected
#[test]
fn connect_fails_when_motor_missing() {
    let (bus, mut arm) = mock_arm();
    bus.set_offline(3);

    let err = arm.connect().unwrap_err();
    assert!(matches!(
        err,
        DriverError::MotorNotFound {
            joint: Joint::ElbowFlex,
            id: 3
        }
    ));
    assert_eq!(arm.state(), ConnectionState::Disconnected);

    // 回滚对在线关节发出了扭矩关闭写入
    let disables = bus.writes_to(1, registers::TORQUE_ENABLE);
    assert!(disables.iter().any(|w| w.params == [0]));
}

/// 串口打开失败：连接报错且状态保持 Disconnected
#[test]
fn connect_fails_when_port_unavailable() {
    let (bus, mut arm) = mock_arm();
    bus.set_fail_open(true);

    let err = arm.connect().unwrap_err();
    assert!(matches!(err, DriverError::Bus(_)));
    assert_eq!(arm.state(), ConnectionState::Disconnected);
}

/// 目标超出软限位时先夹取再转换：夹爪 150% → 100%
#[test]
fn move_gripper_clamps_to_upper_limit() {
    let (bus, mut arm) = connected_arm();
    arm.move_motor(Joint::Gripper, 150.0);

    assert_eq!(
        bus.register_u16(6, registers::GOAL_POSITION),
        Some(units::percent_to_raw(100.0))
    );
    assert_eq!(arm.cached_position(Joint::Gripper), 100.0);
}

/// 关节 -200° → -180°
#[test]
fn move_joint_clamps_to_lower_limit() {
    let (bus, mut arm) = connected_arm();
    arm.move_motor(Joint::ShoulderPan, -200.0);

    let goals = bus.writes_to(1, registers::GOAL_POSITION);
    assert_eq!(goals.len(), 1);
    assert_eq!(
        goals[0].params,
        units::degrees_to_raw(-180.0).to_le_bytes().to_vec()
    );
    assert_eq!(arm.cached_position(Joint::ShoulderPan), -180.0);
}

/// 未知关节名：不产生任何总线交换、不改动任何缓存
#[test]
fn move_unknown_motor_is_noop() {
    let (bus, mut arm) = connected_arm();
    let writes_before = bus.writes().len();
    let cached_before: Vec<f64> = Joint::ALL
        .into_iter()
        .map(|j| arm.cached_position(j))
        .collect();

    arm.move_motor_named("nonexistent_joint", 0.0);

    assert_eq!(bus.writes().len(), writes_before);
    let cached_after: Vec<f64> = Joint::ALL
        .into_iter()
        .map(|j| arm.cached_position(j))
        .collect();
    assert_eq!(cached_before, cached_after);
}

/// 未连接时运动指令被忽略
#[test]
fn move_when_disconnected_is_noop() {
    let (bus, mut arm) = mock_arm();
    arm.move_motor(Joint::WristRoll, 45.0);
    assert!(bus.writes().is_empty());
}

/// 缓存为夹取后的请求值（乐观更新，不回读）
#[test]
fn move_updates_cache_optimistically() {
    let (bus, mut arm) = connected_arm();
    arm.move_motor(Joint::ElbowFlex, 30.0);

    assert_eq!(arm.cached_position(Joint::ElbowFlex), 30.0);
    // 当前位置寄存器保持原值，证明缓存未经回读
    assert_eq!(
        bus.register_u16(3, registers::PRESENT_POSITION),
        Some(DEFAULT_PRESENT_RAW)
    );
}

/// 位置查询恒为六项且按注册表顺序
#[test]
fn get_positions_returns_all_joints_in_order() {
    let (bus, mut arm) = connected_arm();
    bus.set_register_u16(2, registers::PRESENT_POSITION, units::degrees_to_raw(90.0));
    bus.set_register_u16(6, registers::PRESENT_POSITION, units::percent_to_raw(50.0));

    let positions = arm.get_positions();
    let joints: Vec<Joint> = positions.iter().map(|&(j, _)| j).collect();
    assert_eq!(joints, Joint::ALL.to_vec());

    assert!((positions[1].1 - 90.0).abs() <= units::DEGREES_PER_RAW);
    assert!((positions[5].1 - 50.0).abs() <= 100.0 / 4095.0);
}

/// 单关节读失败降级为 0.0，缓存标记为不可信，查询不中止
#[test]
fn get_positions_degrades_failed_joint() {
    let (bus, mut arm) = connected_arm();
    bus.fail_reads_at(2, registers::PRESENT_POSITION);

    let positions = arm.get_positions();
    assert_eq!(positions.len(), 6);
    assert_eq!(positions[1], (Joint::ShoulderLift, 0.0));
    assert!(!arm.position_valid(Joint::ShoulderLift));

    // 其余关节正常读回且可信
    assert!(arm.position_valid(Joint::ShoulderPan));
    assert!(arm.position_valid(Joint::Gripper));
}

/// 断开：对全部关节尝试关闭扭矩，重复调用为空操作
#[test]
fn disconnect_disables_torque_and_is_idempotent() {
    let (bus, mut arm) = connected_arm();
    arm.disconnect();
    assert_eq!(arm.state(), ConnectionState::Disconnected);
    for id in ALL_IDS {
        assert_eq!(bus.register_u8(id, registers::TORQUE_ENABLE), Some(0));
    }

    let writes_before = bus.writes().len();
    arm.disconnect();
    assert_eq!(bus.writes().len(), writes_before);
}

/// 某关节掉线时断开不中止，其余关节仍完成扭矩关闭
#[test]
fn disconnect_survives_offline_joint() {
    let (bus, mut arm) = connected_arm();
    bus.set_offline(4);

    arm.disconnect();
    assert_eq!(arm.state(), ConnectionState::Disconnected);
    for id in [1, 2, 3, 5, 6] {
        assert_eq!(bus.register_u8(id, registers::TORQUE_ENABLE), Some(0));
    }
}

/// 急停：扭矩全关但连接状态不变，随后仍可继续下发指令
#[test]
fn emergency_stop_keeps_connection() {
    let (bus, mut arm) = connected_arm();
    arm.emergency_stop();

    assert_eq!(arm.state(), ConnectionState::Connected);
    for id in ALL_IDS {
        assert_eq!(bus.register_u8(id, registers::TORQUE_ENABLE), Some(0));
    }

    arm.enable_torque();
    assert_eq!(bus.register_u8(1, registers::TORQUE_ENABLE), Some(1));
}

/// 重复连接为空操作，不重复配置
#[test]
fn connect_twice_is_noop() {
    let (bus, mut arm) = connected_arm();
    let writes_before = bus.writes().len();
    arm.connect().expect("second connect");
    assert_eq!(bus.writes().len(), writes_before);
}

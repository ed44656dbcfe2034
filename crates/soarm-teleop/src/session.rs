//! 遥操作消费循环
//!
//! 单一消费线程持有 [`Arm`]，从通道取动作并应用；空闲时以固定
//! 节拍等待，不忙转。
//!
//! [`Arm`]: soarm_driver::Arm

use crate::keymap::TeleopAction;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use soarm_bus::BusOpener;
use soarm_driver::Arm;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

/// 空闲等待节拍
pub const IDLE_TICK: Duration = Duration::from_millis(100);

/// 应用单个动作；返回 `false` 表示会话应当结束
///
/// 增量运动以缓存位置为基准累加，连续按键因此逐次叠加，
/// 越界由控制器的软限位夹取兜底。
pub fn apply_action<O: BusOpener>(arm: &mut Arm<O>, action: TeleopAction) -> bool {
    match action {
        TeleopAction::Jog { joint, delta } => {
            let target = arm.cached_position(joint) + delta;
            arm.move_motor(joint, target);
            true
        }
        TeleopAction::EmergencyStop => {
            arm.emergency_stop();
            true
        }
        TeleopAction::Quit => {
            info!("quit requested");
            false
        }
    }
}

/// 运行消费循环，直到收到 Quit、通道关闭或运行标志被清除
pub fn run_session<O: BusOpener>(
    arm: &mut Arm<O>,
    events: &Receiver<TeleopAction>,
    running: &AtomicBool,
) {
    while running.load(Ordering::Relaxed) {
        match events.recv_timeout(IDLE_TICK) {
            Ok(action) => {
                if !apply_action(arm, action) {
                    running.store(false, Ordering::Relaxed);
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::KeyBindings;
    use crossterm::event::KeyCode;
    use soarm_bus::mock::MockBus;
    use soarm_driver::Joint;
    use soarm_protocol::{registers, units};
    use std::sync::atomic::AtomicBool;

    fn connected_arm() -> (MockBus, Arm<MockBus>) {
        let bus = MockBus::with_servos(&[1, 2, 3, 4, 5, 6]);
        // 固定起始原始值，便于断言逐次步进的目标
        bus.set_register_u16(1, registers::PRESENT_POSITION, units::degrees_to_raw(0.0));
        let mut arm = Arm::new(bus.clone());
        arm.connect().expect("mock connect");
        (bus, arm)
    }

    /// 同一按键连按两次：目标位置逐次累加（0 → 5 → 10）
    #[test]
    fn repeated_jog_accumulates() {
        let (bus, mut arm) = connected_arm();
        let start = arm.cached_position(Joint::ShoulderPan);

        let bindings = KeyBindings::default();
        let action = bindings.action(KeyCode::Right).expect("bound key");
        assert!(apply_action(&mut arm, action));
        assert!(apply_action(&mut arm, action));

        let goals = bus.writes_to(1, registers::GOAL_POSITION);
        assert_eq!(goals.len(), 2);
        assert_eq!(
            goals[0].params,
            units::degrees_to_raw(start + 5.0).to_le_bytes().to_vec()
        );
        assert_eq!(
            goals[1].params,
            units::degrees_to_raw(start + 10.0).to_le_bytes().to_vec()
        );
        assert_eq!(arm.cached_position(Joint::ShoulderPan), start + 10.0);
    }

    /// 急停动作触发扭矩关闭且不结束会话
    #[test]
    fn emergency_stop_keeps_session_alive() {
        let (bus, mut arm) = connected_arm();
        assert!(apply_action(&mut arm, TeleopAction::EmergencyStop));
        for id in 1..=6 {
            assert_eq!(bus.register_u8(id, registers::TORQUE_ENABLE), Some(0));
        }
    }

    #[test]
    fn quit_ends_session() {
        let (_bus, mut arm) = connected_arm();
        assert!(!apply_action(&mut arm, TeleopAction::Quit));
    }

    /// 消费循环：执行队列中的动作，遇 Quit 退出并清除运行标志
    #[test]
    fn run_session_drains_until_quit() {
        let (bus, mut arm) = connected_arm();
        let (tx, rx) = crossbeam_channel::bounded(16);
        let running = AtomicBool::new(true);

        let jog = TeleopAction::Jog {
            joint: Joint::WristRoll,
            delta: 5.0,
        };
        tx.send(jog).unwrap();
        tx.send(TeleopAction::Quit).unwrap();
        // Quit 之后的动作不再被执行
        tx.send(jog).unwrap();

        run_session(&mut arm, &rx, &running);

        assert!(!running.load(Ordering::Relaxed));
        assert_eq!(bus.writes_to(5, registers::GOAL_POSITION).len(), 1);
    }

    /// 通道关闭（监听线程退出）时循环自行结束
    #[test]
    fn run_session_stops_on_disconnected_channel() {
        let (_bus, mut arm) = connected_arm();
        let (tx, rx) = crossbeam_channel::bounded::<TeleopAction>(1);
        drop(tx);
        let running = AtomicBool::new(true);
        run_session(&mut arm, &rx, &running);
    }
}

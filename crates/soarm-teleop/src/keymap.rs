//! 按键到遥操作动作的映射表

use crossterm::event::KeyCode;
use soarm_driver::Joint;
use std::collections::HashMap;

/// 默认关节步长（度）
pub const DEFAULT_STEP_DEG: f64 = 5.0;

/// 默认夹爪步长（百分比）
pub const DEFAULT_GRIPPER_STEP_PCT: f64 = 10.0;

/// 单次按键产生的遥操作动作
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TeleopAction {
    /// 关节增量运动（基于缓存位置累加，由控制器按软限位夹取）
    Jog { joint: Joint, delta: f64 },
    /// 急停（不结束会话）
    EmergencyStop,
    /// 结束会话
    Quit,
}

/// 固定按键表
///
/// 方向键控制肩部两关节，W/S、A/D、Q/E 控制肘与腕，Z/X 控制
/// 夹爪开合，空格急停，Esc 退出。
#[derive(Debug, Clone)]
pub struct KeyBindings {
    actions: HashMap<KeyCode, TeleopAction>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::with_steps(DEFAULT_STEP_DEG, DEFAULT_GRIPPER_STEP_PCT)
    }
}

impl KeyBindings {
    /// 以给定步长构建映射表
    pub fn with_steps(step: f64, gripper_step: f64) -> Self {
        use Joint::*;
        use KeyCode::{Char, Down, Esc, Left, Right, Up};

        let jog = |joint, delta| TeleopAction::Jog { joint, delta };
        let actions = HashMap::from([
            (Up, jog(ShoulderLift, step)),
            (Down, jog(ShoulderLift, -step)),
            (Left, jog(ShoulderPan, -step)),
            (Right, jog(ShoulderPan, step)),
            (Char('w'), jog(ElbowFlex, step)),
            (Char('s'), jog(ElbowFlex, -step)),
            (Char('a'), jog(WristFlex, -step)),
            (Char('d'), jog(WristFlex, step)),
            (Char('q'), jog(WristRoll, -step)),
            (Char('e'), jog(WristRoll, step)),
            (Char('z'), jog(Gripper, -gripper_step)),
            (Char('x'), jog(Gripper, gripper_step)),
            (Char(' '), TeleopAction::EmergencyStop),
            (Esc, TeleopAction::Quit),
        ]);
        Self { actions }
    }

    /// 查表；字符键不区分大小写，松开事件由监听方过滤
    pub fn action(&self, code: KeyCode) -> Option<TeleopAction> {
        let normalized = match code {
            KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
            other => other,
        };
        self.actions.get(&normalized).copied()
    }
}

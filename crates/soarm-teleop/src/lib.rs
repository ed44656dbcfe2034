//! # SO-ARM 键盘遥操作
//!
//! 将离散按键事件翻译为有界的增量运动。监听线程产生
//! [`TeleopAction`]，经有界通道送入持有 [`Arm`] 的单一消费循环；
//! 传输层访问全部发生在消费线程上，总线上任意时刻至多一笔在途
//! 交换。
//!
//! 关停顺序：先停监听线程（不再产生指令），再断开机械臂。
//!
//! [`Arm`]: soarm_driver::Arm

pub mod keymap;
pub mod listener;
pub mod session;

pub use keymap::{DEFAULT_GRIPPER_STEP_PCT, DEFAULT_STEP_DEG, KeyBindings, TeleopAction};
pub use listener::KeyboardListener;
pub use session::{apply_action, run_session};

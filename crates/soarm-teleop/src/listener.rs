//! 键盘监听线程
//!
//! 在独立线程上以终端原始模式读取按键事件，查映射表后送入
//! 有界通道。只处理按下事件，松开为空操作（无按住连续运动）。
//! 队列满时丢弃本次按键，绝不在监听线程上阻塞等待总线。

use crate::keymap::{KeyBindings, TeleopAction};
use crossbeam_channel::{Sender, TrySendError};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// 事件轮询节拍
const POLL_TICK: Duration = Duration::from_millis(100);

/// 键盘监听线程句柄
///
/// 释放句柄即停止监听：清除运行标志、等待线程退出并恢复终端
/// 模式。
pub struct KeyboardListener {
    thread: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl KeyboardListener {
    /// 启动监听线程并切换终端到原始模式
    ///
    /// Esc（映射为 Quit）会同时清除运行标志并结束线程；其余按键
    /// 仅产生动作。
    pub fn spawn(
        bindings: KeyBindings,
        events: Sender<TeleopAction>,
        running: Arc<AtomicBool>,
    ) -> std::io::Result<Self> {
        terminal::enable_raw_mode()?;
        let flag = Arc::clone(&running);
        let thread = thread::spawn(move || listen_loop(&bindings, &events, &flag));
        debug!("keyboard listener started");
        Ok(Self {
            thread: Some(thread),
            running,
        })
    }

    /// 停止监听并等待线程退出（等价于释放句柄）
    pub fn stop(self) {}
}

impl Drop for KeyboardListener {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("keyboard listener thread panicked");
            }
        }
        if let Err(e) = terminal::disable_raw_mode() {
            warn!(error = %e, "failed to restore terminal mode");
        }
        debug!("keyboard listener stopped");
    }
}

fn listen_loop(bindings: &KeyBindings, events: &Sender<TeleopAction>, running: &AtomicBool) {
    while running.load(Ordering::Relaxed) {
        match event::poll(POLL_TICK) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                warn!(error = %e, "keyboard poll failed");
                break;
            }
        }

        let Ok(Event::Key(key)) = event::read() else {
            continue;
        };
        // 松开事件忽略
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let Some(action) = bindings.action(key.code) else {
            continue;
        };

        let quit = action == TeleopAction::Quit;
        match events.try_send(action) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("event queue full, key dropped"),
            Err(TrySendError::Disconnected(_)) => break,
        }
        if quit {
            running.store(false, Ordering::Relaxed);
            break;
        }
    }
}

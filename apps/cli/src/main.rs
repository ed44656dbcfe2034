//! # SO-ARM CLI
//!
//! 机械臂命令行工具：键盘遥操作与一次性查询/急停/探测命令。
//! 仅为驱动层的薄调用方，不包含协议逻辑。
//!
//! ```bash
//! # 配置默认串口
//! soarm-cli config set --port /dev/ttyUSB0
//!
//! # 键盘遥操作
//! soarm-cli teleop
//!
//! # 一次性操作（内部：连接 → 执行 → 断开）
//! soarm-cli position
//! soarm-cli stop
//!
//! # 逐个波特率探测总线
//! soarm-cli probe
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use soarm_bus::{DEFAULT_BAUD, PROBE_BAUDS, SerialOpener, ServoBus};
use soarm_driver::SerialArm;
use soarm_teleop::{
    DEFAULT_GRIPPER_STEP_PCT, DEFAULT_STEP_DEG, KeyBindings, KeyboardListener, TeleopAction,
    run_session,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

mod config;

/// SO-ARM CLI - 机械臂命令行工具
#[derive(Parser, Debug)]
#[command(name = "soarm-cli")]
#[command(about = "Command-line interface for SO-ARM robot arm control", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 键盘遥操作
    Teleop {
        #[command(flatten)]
        conn: ConnectArgs,

        /// 关节步长（度）
        #[arg(long, default_value_t = DEFAULT_STEP_DEG)]
        step: f64,

        /// 夹爪步长（百分比）
        #[arg(long, default_value_t = DEFAULT_GRIPPER_STEP_PCT)]
        gripper_step: f64,
    },

    /// 查询当前关节位置
    Position {
        #[command(flatten)]
        conn: ConnectArgs,
    },

    /// 急停（关闭全部扭矩）
    Stop {
        #[command(flatten)]
        conn: ConnectArgs,
    },

    /// 逐个波特率探测总线上的舵机
    Probe {
        /// 串口设备路径（缺省读取配置文件）
        #[arg(long)]
        port: Option<String>,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(config::ConfigCommand),
}

#[derive(Args, Debug)]
struct ConnectArgs {
    /// 串口设备路径（缺省读取配置文件）
    #[arg(long)]
    port: Option<String>,

    /// 波特率
    #[arg(long)]
    baud: Option<u32>,
}

impl ConnectArgs {
    /// 命令行参数 > 配置文件 > 内置默认波特率
    fn resolve(self) -> Result<(String, u32)> {
        let file = config::load()?;
        let port = self
            .port
            .or(file.port)
            .context("no serial port given (use --port or `soarm-cli config set --port ...`)")?;
        let baud = self.baud.or(file.baud).unwrap_or(DEFAULT_BAUD);
        Ok((port, baud))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Teleop {
            conn,
            step,
            gripper_step,
        } => teleop(conn, step, gripper_step),
        Commands::Position { conn } => position(conn),
        Commands::Stop { conn } => stop(conn),
        Commands::Probe { port } => probe(port),
        Commands::Config(cmd) => cmd.execute(),
    }
}

fn teleop(conn: ConnectArgs, step: f64, gripper_step: f64) -> Result<()> {
    let (port, baud) = conn.resolve()?;
    println!("Connecting to SO-ARM on {port} at {baud} baud...");

    let mut arm = SerialArm::new(SerialOpener::new(&port, baud));
    arm.connect()?;

    let (tx, rx) = crossbeam_channel::bounded(16);
    let running = Arc::new(AtomicBool::new(true));

    // Ctrl-C 等价于退出键
    {
        let tx = tx.clone();
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            running.store(false, Ordering::Relaxed);
            let _ = tx.try_send(TeleopAction::Quit);
        })?;
    }

    print_help(step, gripper_step);
    let listener = KeyboardListener::spawn(
        KeyBindings::with_steps(step, gripper_step),
        tx,
        Arc::clone(&running),
    )?;

    run_session(&mut arm, &rx, &running);

    // 关停顺序：先停监听线程，再断开机械臂
    listener.stop();
    arm.disconnect();
    println!("Session ended");
    Ok(())
}

fn position(conn: ConnectArgs) -> Result<()> {
    let (port, baud) = conn.resolve()?;
    let mut arm = SerialArm::new(SerialOpener::new(&port, baud));
    arm.connect()?;

    for (joint, value) in arm.get_positions() {
        let unit = if joint.is_gripper() { "%" } else { "deg" };
        let mark = if arm.position_valid(joint) {
            ""
        } else {
            "  (read failed)"
        };
        println!("{:>13}: {value:8.2} {unit}{mark}", joint.name());
    }

    arm.disconnect();
    Ok(())
}

fn stop(conn: ConnectArgs) -> Result<()> {
    let (port, baud) = conn.resolve()?;
    let mut arm = SerialArm::new(SerialOpener::new(&port, baud));
    arm.connect()?;
    arm.emergency_stop();
    arm.disconnect();
    println!("Torque disabled on all joints");
    Ok(())
}

fn probe(port: Option<String>) -> Result<()> {
    let file = config::load()?;
    let port = port
        .or(file.port)
        .context("no serial port given (use --port or `soarm-cli config set --port ...`)")?;

    for baud in PROBE_BAUDS {
        println!("=== Probing {port} at {baud} baud ===");
        let mut bus = match ServoBus::open(&port, baud) {
            Ok(bus) => bus,
            Err(e) => {
                println!("  cannot open port: {e}");
                continue;
            }
        };

        let mut found = 0;
        for id in 1..=6u8 {
            match bus.ping(id) {
                Ok(Some(model)) => {
                    println!("  id {id}: online, model {model}");
                    found += 1;
                }
                Ok(None) => println!("  id {id}: no response"),
                Err(e) => {
                    println!("  id {id}: bus error: {e}");
                    break;
                }
            }
        }
        if found > 0 {
            println!("{found} servo(s) responded at {baud} baud");
            return Ok(());
        }
    }
    anyhow::bail!("no servos responded at any baud rate")
}

/// 打印控制说明面板
fn print_help(step: f64, gripper_step: f64) {
    println!();
    println!("==================================================");
    println!("SO-ARM Keyboard Control");
    println!("==================================================");
    println!("  Arrow Keys   - Shoulder Pan/Lift ({step:.0} deg per press)");
    println!("  W/S          - Elbow Flex");
    println!("  A/D          - Wrist Flex");
    println!("  Q/E          - Wrist Roll");
    println!("  Z/X          - Gripper Close/Open ({gripper_step:.0} % per press)");
    println!("  SPACE        - Emergency Stop");
    println!("  ESC          - Exit");
    println!("==================================================");
    println!("Move the robot carefully!");
    println!();
}

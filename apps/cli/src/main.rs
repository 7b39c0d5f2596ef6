//! # RobotArm CLI
//!
//! Command-line controller for the OWI robotic arm.
//!
//! ## 双模式架构
//!
//! ### One-shot 模式（每条命令：连接 -> 执行 -> 安全关闭）
//!
//! ```bash
//! # 张开夹爪 300ms
//! robotarm-cli move grip-open --duration-ms 300
//!
//! # 底座顺时针转动，直到 Ctrl-C
//! robotarm-cli move base-cw
//!
//! robotarm-cli light on --duration-ms 2000
//! robotarm-cli stop
//! ```
//!
//! ### REPL 模式（小键盘遥控）
//!
//! ```bash
//! $ robotarm-cli shell
//! robotarm> 8
//! robotarm> move wrist-up|grip-close 400
//! robotarm> q
//! ```

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use robotarm_driver::{ArmBuilder, ArmSession, ErrorPolicy};

mod commands;
mod keymap;
mod modes;

use commands::{LightCommand, MoveCommand, StopCommand};
use modes::repl::{ShellOptions, run_repl};

/// RobotArm CLI - 机械臂命令行工具
#[derive(Parser, Debug)]
#[command(name = "robotarm-cli")]
#[command(about = "Command-line controller for the OWI robotic arm", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// 所有子命令共享的参数
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// 单次控制传输超时（毫秒）
    #[arg(long, global = true, default_value_t = 500)]
    pub timeout_ms: u64,

    /// 任意命令失败即退出（默认记录警告后继续）
    #[arg(long, global = true)]
    pub strict: bool,

    /// 输出调试日志（-v；设置了 RUST_LOG 时以 RUST_LOG 为准）
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalArgs {
    pub fn policy(&self) -> ErrorPolicy {
        ErrorPolicy::from_strict(self.strict)
    }

    /// 查找并打开机械臂
    pub fn connect(&self) -> Result<ArmSession> {
        println!("⏳ 查找机械臂...");
        let arm = ArmBuilder::new()
            .command_timeout(Duration::from_millis(self.timeout_ms))
            .find()?;
        println!("✅ 已连接");
        Ok(arm)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 驱动关节（指定时长，或直到 Ctrl-C）
    Move {
        #[command(flatten)]
        args: MoveCommand,
    },

    /// 停止所有运动
    Stop {
        #[command(flatten)]
        args: StopCommand,
    },

    /// 控制灯光
    Light {
        #[command(flatten)]
        args: LightCommand,
    },

    /// 启动交互式 Shell（REPL 模式）
    Shell {
        #[command(flatten)]
        args: ShellOptions,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.global.verbose, rust_log.as_deref())?)
        .init();

    match cli.command {
        Commands::Move { args } => args.execute(&cli.global),
        Commands::Stop { args } => args.execute(&cli.global),
        Commands::Light { args } => args.execute(&cli.global),
        Commands::Shell { args } => {
            let arm = cli.global.connect()?;
            run_repl(arm, cli.global.policy(), &args)
        },
    }
}

/// 日志过滤器：RUST_LOG 优先，否则按 `-v` 选择默认级别
fn log_filter(verbose: u8, rust_log: Option<&str>) -> Result<EnvFilter> {
    match rust_log {
        Some(directives) if !directives.trim().is_empty() => Ok(EnvFilter::try_new(directives)?),
        _ => {
            let level = if verbose > 0 { "robotarm=debug" } else { "robotarm=info" };
            Ok(EnvFilter::new(level))
        },
    }
}

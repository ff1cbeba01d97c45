//! Build Notify 命令行入口
//!
//! 按配置的策略评估构建快照 (JSON)，打印或发送生成的通知

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use build_notify::{AppConfig, Build, BuildPhase, DecisionEngine, NotificationBuilder, SendResult};

#[derive(Parser)]
#[command(name = "build-notify")]
#[command(about = "Build Notify - CI 构建生命周期的聊天通知")]
#[command(version)]
struct Cli {
    /// 配置文件 (默认: ~/.config/build-notify/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 对构建事件做决策并渲染通知
    Evaluate {
        #[command(flatten)]
        event: EventArgs,
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 决策、渲染并通过已配置的渠道发送
    Send {
        #[command(flatten)]
        event: EventArgs,
        /// 只打印将要发送的内容
        #[arg(long)]
        dry_run: bool,
    },
    /// 打印生效的策略
    Policy,
}

#[derive(Args)]
struct EventArgs {
    /// 事件所处的生命周期阶段
    #[arg(long, value_enum)]
    phase: BuildPhase,
    /// 构建快照 JSON 文件，`-` 表示 stdin
    #[arg(long)]
    build: PathBuf,
}

fn main() -> Result<()> {
    // RUST_LOG 可覆盖，例如 RUST_LOG=debug build-notify evaluate ...
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("build_notify=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Evaluate { event, json } => {
            let build = read_build(&event.build)?;
            let engine = DecisionEngine::new(config.policy.clone());
            let notification = engine.evaluate(event.phase, &build);

            match (notification, json) {
                (Some(n), true) => println!("{}", serde_json::to_string_pretty(&n)?),
                (Some(n), false) => println!("{}", n),
                (None, true) => println!("null"),
                (None, false) => println!("suppressed"),
            }
        }
        Commands::Send { event, dry_run } => {
            let build = read_build(&event.build)?;
            let engine = DecisionEngine::new(config.policy.clone());

            let Some(notification) = engine.evaluate(event.phase, &build) else {
                info!(phase = %event.phase, build = %build.display_name, "Nothing to send");
                return Ok(());
            };

            let dispatcher = NotificationBuilder::from_config(&config)
                .dry_run(dry_run)
                .build()?;
            if dry_run {
                println!("{}", notification);
            }
            for delivery in dispatcher.send(&notification)? {
                let channel = delivery.channel;
                match delivery.result {
                    SendResult::Sent => info!(channel = %channel, "Sent"),
                    SendResult::Skipped(reason) => {
                        info!(channel = %channel, reason = %reason, "Skipped")
                    }
                    SendResult::Failed(reason) => {
                        warn!(channel = %channel, reason = %reason, "Failed")
                    }
                }
            }
        }
        Commands::Policy => {
            println!("{}", serde_json::to_string_pretty(&config.policy)?);
        }
    }

    Ok(())
}

/// 读取并校验构建快照
fn read_build(path: &Path) -> Result<Build> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read build snapshot from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read build snapshot {}", path.display()))?
    };

    let build: Build = serde_json::from_str(&content).context("Invalid build snapshot")?;
    build.validate()?;
    debug!(
        project = %build.project_display_name,
        build = %build.display_name,
        "Loaded build snapshot"
    );
    Ok(build)
}

//! Seguros 命令行
//!
//! 入口：初始化日志、加载配置与页面 HTML，构建工具注册表，然后按子命令输出声明 / setup，
//! 或对页面执行一次调用。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use seguros::assistant::SYSTEM_INSTRUCTION;
use seguros::config::{load_config, AppConfig};
use seguros::live::{ClientMessage, ServerMessage, Setup, ToolCallHandler};
use seguros::page::DomPage;
use seguros::tools::call_request_schema_json;
use seguros::{build_registry, CallRequest};

#[derive(Parser)]
#[command(name = "seguros", about = "Insurance site assistant tool registry")]
struct Cli {
    /// 额外的配置文件（TOML）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 页面 HTML 文件；覆盖 [page].snapshot
    #[arg(long)]
    page: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 输出所有函数声明
    Declarations,
    /// 输出完整的会话 setup 消息
    Setup,
    /// 对页面执行一次调用
    Call {
        name: String,
        /// 参数（JSON 对象）
        #[arg(long, default_value = "{}")]
        args: String,
        #[arg(long, default_value = "cli-1")]
        id: String,
    },
    /// 读取服务端 toolCall 消息（JSON 文件），输出 toolResponse
    Replay { file: PathBuf },
    /// 输出调用请求的 JSON Schema
    Schema,
}

fn load_page(path: Option<&PathBuf>) -> anyhow::Result<DomPage> {
    match path {
        Some(path) => {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read page {}", path.display()))?;
            Ok(DomPage::new(html))
        }
        None => {
            tracing::warn!("No page given, using an empty page");
            Ok(DomPage::empty())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    seguros::observability::init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.clone()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let page_path = cli.page.clone().or_else(|| cfg.page.snapshot.clone());
    let page = Arc::new(load_page(page_path.as_ref())?);
    let registry = Arc::new(build_registry(&cfg, page).context("Failed to build tool registry")?);

    match cli.command {
        Commands::Declarations => {
            println!("{}", registry.to_schema_json());
        }
        Commands::Setup => {
            let setup = ClientMessage::Setup(Setup::from_config(
                &cfg,
                SYSTEM_INSTRUCTION,
                registry.describe_all(),
            ));
            println!("{}", serde_json::to_string_pretty(&setup)?);
        }
        Commands::Call { name, args, id } => {
            let args: serde_json::Value =
                serde_json::from_str(&args).context("--args must be a JSON value")?;
            let result = registry.dispatch(CallRequest::new(name, args, id)).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Replay { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let msg = ServerMessage::parse(&text).context("Invalid server message")?;
            let call = msg.tool_call.context("Message has no toolCall")?;
            let response = ToolCallHandler::new(registry).handle(&call).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&ClientMessage::ToolResponse(response))?
            );
        }
        Commands::Schema => {
            println!("{}", call_request_schema_json());
        }
    }

    Ok(())
}

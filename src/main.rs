//! 应用程序入口 (Application Entrypoint)
//!
//! 负责 CLI 指令解析、遥测层初始化及订阅服务的装配。
//! 查询类指令将结果以 JSON 输出到 stdout，供下游规则生成消费。

use std::path::Path;
use std::str::FromStr;

use clap::{Parser, Subcommand};

use subhub::core::config::AppConfig;
use subhub::subscription::SubscriptionService;
use subhub::subscription::fetch::SubscriptionType;
use subhub::subscription::filter::FilterSet;

/// 命令行界面脚手架 (CLI Scaffolding)
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 抓取订阅并刷新缓存
    Update {
        /// 仅更新指定小节；缺省更新全部小节
        #[arg(short, long)]
        section: Option<String>,
    },
    /// 列出过滤后的出口标签
    Tags {
        /// 订阅地址
        #[arg(short, long)]
        url: String,
        /// 订阅类型 (auto / structured / legacy)
        #[arg(short = 't', long = "type", default_value = "auto")]
        sub_type: String,
        /// 空白分隔的过滤词
        #[arg(short, long, default_value = "")]
        filter: String,
    },
    /// 列出过滤后的完整出口对象
    Outbounds {
        #[arg(short, long)]
        url: String,
        #[arg(short = 't', long = "type", default_value = "auto")]
        sub_type: String,
        #[arg(short, long, default_value = "")]
        filter: String,
    },
    /// 列出原始连接链接 (始终按旧式列表抓取)
    Links {
        #[arg(short, long)]
        url: String,
        #[arg(short, long, default_value = "")]
        filter: String,
    },
    /// 输出小节手动钉选的标签
    Selected {
        #[arg(short, long)]
        section: String,
    },
    /// 清除订阅缓存
    Clear {
        /// 仅清除指定订阅地址的条目；缺省清空全部
        #[arg(short, long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 遥测层初始化 (Telemetry Layer Initialization)
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_from(Path::new(&cli.config))?;
    let service = SubscriptionService::new(&config)?;

    match cli.command {
        Commands::Update { section: Some(name) } => {
            let Some(section) = config.sections.get(&name) else {
                anyhow::bail!("unknown section: {}", name);
            };
            service.update_section(&name, section).await?;
            tracing::info!("Section {} updated", name);
        }
        Commands::Update { section: None } => {
            let updated = service.update_all(&config).await;
            tracing::info!("{}/{} sections updated", updated, config.sections.len());
        }
        Commands::Tags { url, sub_type, filter } => {
            let ty = SubscriptionType::from_str(&sub_type)?;
            let tags = service
                .list_outbound_tags(&url, ty, &FilterSet::parse(&filter))
                .await?;
            println!("{}", serde_json::to_string_pretty(&tags)?);
        }
        Commands::Outbounds { url, sub_type, filter } => {
            let ty = SubscriptionType::from_str(&sub_type)?;
            let objects = service
                .list_outbound_objects(&url, ty, &FilterSet::parse(&filter))
                .await?;
            println!("{}", serde_json::to_string_pretty(&objects)?);
        }
        Commands::Links { url, filter } => {
            let links = service.list_raw_links(&url, &FilterSet::parse(&filter)).await?;
            println!("{}", serde_json::to_string_pretty(&links)?);
        }
        Commands::Selected { section } => {
            let Some(sec) = config.sections.get(&section) else {
                anyhow::bail!("unknown section: {}", section);
            };
            let tags = SubscriptionService::selected_outbounds(sec);
            println!("{}", serde_json::to_string_pretty(&tags)?);
        }
        Commands::Clear { url } => {
            service.cache().clear(url.as_deref()).await?;
            tracing::info!("Cache cleared");
        }
    }

    Ok(())
}

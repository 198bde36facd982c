// ==========================================
// 自助终端管理后台 - 批量导入命令行入口
// ==========================================
// 用法:
//   kiosk-bulk-import excel <file> [--dry-run]
//   kiosk-bulk-import zip <file> [--dry-run]
//   kiosk-bulk-import api <url> [token] [data_path] [--dry-run]
//   kiosk-bulk-import template <output>
//   kiosk-bulk-import config
//
// 环境变量: KIOSK_API_URL / KIOSK_REQUEST_TIMEOUT_SECS / KIOSK_CONFIG_FILE ...
// 加载结果与后端返回结果以 JSON 输出到 stdout
// ==========================================

use anyhow::{bail, Context, Result};
use kiosk_bulk_import::api::{ApiError, ImportApi, SessionView};
use kiosk_bulk_import::app::AppState;
use kiosk_bulk_import::config::ConfigManager;
use kiosk_bulk_import::domain::{AdapterState, SourceKind};
use kiosk_bulk_import::importer::ExternalApiConfig;
use kiosk_bulk_import::logging;
use serde::Serialize;

const USAGE: &str = "用法: kiosk-bulk-import <excel|zip|api|template|config> [参数...] [--dry-run]";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let dry_run = take_flag(&mut args, "--dry-run");
    let mut args = args.into_iter();
    let command = args.next().context(USAGE)?;

    let config = match std::env::var("KIOSK_CONFIG_FILE") {
        Ok(path) if !path.trim().is_empty() => ConfigManager::from_json_file(&path)
            .map_err(|e| anyhow::anyhow!("配置文件加载失败 {}: {}", path, e))?,
        _ => ConfigManager::from_env(),
    };

    tracing::info!("==================================================");
    tracing::info!("{} v{}", kiosk_bulk_import::APP_NAME, kiosk_bulk_import::VERSION);
    tracing::info!("==================================================");

    if command == "config" {
        let snapshot = config
            .get_config_snapshot()
            .map_err(|e| anyhow::anyhow!("配置快照生成失败: {}", e))?;
        println!("{}", snapshot);
        return Ok(());
    }

    let state = AppState::new(config).context("无法初始化AppState")?;
    let api = state.import_api.clone();

    match command.as_str() {
        "excel" => {
            let file = args.next().context("缺少参数: <file>")?;
            let view = report(api.load_spreadsheet(&file).await)?;
            submit_if_ready(&api, SourceKind::Spreadsheet, &view, dry_run).await
        }
        "zip" => {
            let file = args.next().context("缺少参数: <file>")?;
            let loaded = report(api.load_zip(&file).await)?;
            submit_if_ready(&api, SourceKind::Zip, &loaded.session, dry_run).await
        }
        "api" => {
            let url = args.next().context("缺少参数: <url>")?;
            let config = ExternalApiConfig {
                url,
                token: args.next().filter(|t| !t.is_empty() && t != "-"),
                data_path: args.next().filter(|p| !p.is_empty()),
            };
            let loaded = report(api.test_api_connection(&config).await)?;
            submit_if_ready(&api, SourceKind::ExternalApi, &loaded.session, dry_run).await
        }
        "template" => {
            let output = args.next().context("缺少参数: <output>")?;
            report(api.download_template(&output).await)?;
            Ok(())
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }
}

/// 从参数列表中移除开关参数
fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != flag);
    args.len() != before
}

/// 输出 JSON 结果；错误时输出错误 JSON 并返回失败
fn report<T: Serialize>(result: Result<T, ApiError>) -> Result<T> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(value)
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&e.to_response())?);
            Err(anyhow::Error::new(e))
        }
    }
}

async fn submit_if_ready(
    api: &ImportApi,
    source: SourceKind,
    view: &SessionView,
    dry_run: bool,
) -> Result<()> {
    if view.state != AdapterState::Validated {
        bail!("数据未通过校验，未提交（{} 个错误）", view.errors.len());
    }
    if dry_run {
        tracing::info!("dry-run 模式，跳过提交");
        return Ok(());
    }

    let response = report(api.submit(source).await)?;
    eprintln!("{}", response.summary);
    Ok(())
}

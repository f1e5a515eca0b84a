/// 日志工具模块
///
/// 提供日志初始化和控制台摘要输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::workflow::UsageSummary;

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先；未设置时默认 `info`，开启详细日志时为 `debug`。
/// 重复调用不会报错（测试中会多次调用）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 JSON 合并工具启动");
    info!("🌐 合并服务: {}", config.merge_url());
    info!(
        "🔀 合并策略: {}",
        if config.override_keys {
            "后上传的文件覆盖重复键"
        } else {
            "保留先上传文件的值"
        }
    );
    info!("{}", "=".repeat(60));
}

/// 记录配额使用情况
pub fn log_usage(usage: &UsageSummary) {
    info!("\n{}", "─".repeat(60));
    info!("📊 使用情况");
    info!("套餐上限:   {} MB", usage.limit_mb);
    info!("已使用:     {:.2} MB", usage.used_mb);
    info!("本次上传:   {:.2} MB", usage.session_mb);
    info!("当前总用量: {:.2} MB", usage.total_mb);
    if let Some(percent) = usage.percent {
        info!("已使用套餐的 {:.2}%", percent);
    }
    info!("{}", "─".repeat(60));
}

/// 打印最终结果
///
/// # 参数
/// - `file_count`: 参与合并的文件数量
/// - `output_path`: 合并结果保存路径（合并失败时为 None）
pub fn log_final_stats(file_count: usize, output_path: Option<&str>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 处理完成");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📄 参与合并的文件: {}", file_count);
    match output_path {
        Some(path) => info!("✅ 合并结果已保存至: {}", path),
        None => info!("❌ 未生成合并结果"),
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

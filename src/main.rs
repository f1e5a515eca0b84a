use std::path::PathBuf;

use anyhow::Result;
use json_merge_uploader::utils::logging;
use json_merge_uploader::{Config, DirectorySink, HttpMergeClient, JsonFileBatch, MergeWorkspace};
use tracing::{error, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::log_startup(&config);

    let client = HttpMergeClient::new(&config)?;
    let mut workspace = MergeWorkspace::from_config(&config, client)?;

    // 命令行给出的文件作为一个批次，否则扫描输入目录
    let args: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    let mut batch = if args.is_empty() {
        JsonFileBatch::from_folder(&config.input_folder).await?
    } else {
        JsonFileBatch::from_paths(args)
    };

    if batch.is_empty() {
        warn!("⚠️ 没有找到待合并的 JSON 文件，程序结束");
        return Ok(());
    }

    let report = workspace.ingest_source(&mut batch).await?;
    for name in &report.skipped_duplicates {
        warn!("⚠️ 跳过重复文件: {}", name);
    }
    logging::log_usage(&workspace.usage());

    if !workspace.can_merge() {
        warn!("⚠️ 至少需要 2 个 JSON 文件才能合并");
        logging::log_final_stats(workspace.session().len(), None);
        return Ok(());
    }

    let merged = workspace.merge().await.map(|_| ());
    if let Err(e) = merged {
        error!("❌ 合并失败: {}", e);
        logging::log_final_stats(workspace.session().len(), None);
        return Err(e.into());
    }

    let output = workspace.download(&DirectorySink::new(&config.output_folder))?;
    logging::log_final_stats(workspace.session().len(), Some(&output));

    Ok(())
}

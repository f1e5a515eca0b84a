use std::net::SocketAddr;
use std::path::Path;
use std::process::Output;

use axum::routing::post;
use axum::{Json, Router};
use json_merge_uploader::infrastructure::DOWNLOAD_FILE_NAME;
use serde_json::{json, Value};
use tokio::process::Command;

/// 返回第一个文档的合并服务
async fn echo_first(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "merged": body["jsons"][0].clone() }))
}

async fn spawn_service() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/merge-json", post(echo_first));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// 没有进程监听的地址
fn closed_address() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

fn write_inputs(dir: &Path) {
    std::fs::write(dir.join("a.json"), r#"{"a": 1}"#).unwrap();
    std::fs::write(dir.join("b.json"), r#"{"b": 2}"#).unwrap();
}

/// 在没有 merge.toml 的目录中运行，配置只来自环境变量
async fn run_cli(workdir: &Path, service: SocketAddr) -> Output {
    Command::new(env!("CARGO_BIN_EXE_json_merge_uploader"))
        .current_dir(workdir)
        .env_remove("MERGE_CONFIG")
        .env("MERGE_SERVICE_URL", format!("http://{service}"))
        .env("INPUT_FOLDER", "input")
        .env("OUTPUT_FOLDER", "output")
        .output()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_merge_failure_exits_with_error() {
    let workdir = tempfile::tempdir().unwrap();
    let input = workdir.path().join("input");
    std::fs::create_dir(&input).unwrap();
    write_inputs(&input);

    let output = run_cli(workdir.path(), closed_address()).await;

    assert!(!output.status.success());
    assert!(!workdir.path().join("output").join(DOWNLOAD_FILE_NAME).exists());
}

#[tokio::test]
async fn test_successful_merge_uses_env_config() {
    let workdir = tempfile::tempdir().unwrap();
    let input = workdir.path().join("input");
    std::fs::create_dir(&input).unwrap();
    write_inputs(&input);
    let addr = spawn_service().await;

    let output = run_cli(workdir.path(), addr).await;

    assert!(output.status.success());
    let saved = workdir.path().join("output").join(DOWNLOAD_FILE_NAME);
    let merged: Value = serde_json::from_str(&std::fs::read_to_string(saved).unwrap()).unwrap();
    assert_eq!(merged, json!({"a": 1}));
}

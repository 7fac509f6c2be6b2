//! 按环境变量（以及当前目录下的 `.env` 文件）生成数据并写入 LinDB
//!
//! ```text
//! LOADGEN_USE_CASE=cpu-only LOADGEN_SCALE=100 LINDB_ENDPOINT=http://localhost:9000 generate
//! ```

use std::process::ExitCode;

use lindb_loadgen::{config::GeneratorConfig, generate};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    if let Err(e) = simple_logger::init_with_level(log::Level::Info) {
        eprintln!("init logger failed: {}", e);
    }

    let config = match GeneratorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("invalid config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match generate(config).await {
        Ok(summary) => {
            log::info!("done. {}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("generate failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

//! 서비스 부트스트랩 메인 애플리케이션
//!
//! 설정을 로딩하고, 로깅을 초기화한 뒤 내장 플러그인(DB, Redis, Local)을 시작합니다.
//! Ctrl-C를 받으면 모든 플러그인을 닫고 종료합니다.
//!
//! # Exit Codes
//!
//! * `0` - 시그널에 의한 정상 종료
//! * `1` - 설정 로딩, 로깅 초기화, 플러그인 시작 중 치명적 에러

use std::path::PathBuf;
use std::process::ExitCode;
use clap::Parser;
use dotenv::dotenv;
use log::{error, info};
use service_bootstrap::config::ConfigStore;
use service_bootstrap::utils::display_terminal::{print_shutdown_summary, print_startup_summary};
use service_bootstrap::{logging, plugins};

#[derive(Parser, Debug)]
#[command(name = "service_bootstrap", version, about = "Process bootstrap: config, logging and plugin lifecycle")]
struct Cli {
    /// 설정 파일 경로 (기본값: conf/config.toml)
    #[arg(short, long)]
    conf: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let env_status = load_env_file();

    let store = ConfigStore::default();
    let live = match store.get(cli.conf.as_deref()) {
        Ok(live) => live,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    let conf = live.snapshot();
    let router = match logging::init(&conf.log) {
        Ok(router) => router,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("{}", env_status);
    info!(
        "🚀 {} starting ({:?}, config: {})",
        conf.app.app_name,
        conf.app.environment(),
        live.path().display()
    );

    let builtin = plugins::builtin(live.clone(), router);
    if let Err(e) = builtin.registry.start_all().await {
        error!("❌ startup aborted: {}", e);
        builtin.registry.stop_all().await;
        log::logger().flush();
        return ExitCode::FAILURE;
    }

    print_startup_summary(&conf.app.app_name, &builtin.registry.statuses());

    let exit = match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("🛑 shutdown signal received");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("❌ signal handler failed: {}", e);
            ExitCode::FAILURE
        }
    };

    let report = builtin.registry.stop_all().await;
    print_shutdown_summary(&report);
    log::logger().flush();
    exit
}

/// 환경별 설정 파일을 로드합니다
///
/// 로거가 아직 없으므로 결과 메시지를 반환하고, 호출자가 로깅 초기화 후에 남깁니다.
///
/// # Environment Variables
///
/// * `PROFILE=dev` - .env.dev 파일 로드 (기본값)
/// * `PROFILE=prod` - .env.prod 파일 로드
/// * 기타 - 기본 .env 파일 로드
fn load_env_file() -> String {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "dev".to_string());

    let filename = match profile.as_str() {
        "prod" => ".env.prod",
        "dev" => ".env.dev",
        _ => {
            return match dotenv() {
                Ok(path) => format!("Current profile: {}, {} 로드 됨", profile, path.display()),
                Err(_) => format!("Current profile: {}, .env 파일 없음", profile),
            };
        }
    };

    match dotenv::from_filename(filename) {
        Ok(_) => format!("Current profile: {}, {} 파일 로드 됨", profile, filename),
        Err(e) => format!("Current profile: {}, {} 파일 로드 실패: {}", profile, filename, e),
    }
}

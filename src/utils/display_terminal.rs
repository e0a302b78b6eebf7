//! 터미널 출력 포맷팅 유틸리티
//!
//! 부트스트랩 과정의 시작/종료 요약을 박스 형태로 출력합니다.

use crate::core::registry::{PluginStatus, ShutdownReport};

/// 박스 형태로 둘러싸인 제목을 출력합니다
///
/// ```text
/// ╔══════════════════════════════════════════════════╗
/// ║                  System Started                  ║
/// ╚══════════════════════════════════════════════════╝
/// ```
pub fn print_boxed_title(title: &str) {
    // 고정 너비 50칸 사용 (박스 내부 콘텐츠)
    let content_width = 50;
    let border = "═".repeat(content_width);

    println!("╔{}╗", border);
    println!("║{:^50}║", title);
    println!("╚{}╝", border);
}

/// 플러그인 상태 한 줄
///
/// ```text
///    ├─ DB: ready since 2026-10-14T09:00:00Z
///    ├─ Local: disabled
/// ```
pub fn format_status(identity: &str, status: &PluginStatus) -> String {
    let status = match status {
        PluginStatus::Registered => "registered".to_string(),
        PluginStatus::Disabled => "disabled".to_string(),
        PluginStatus::Ready { since } => format!("ready since {}", since.format("%Y-%m-%dT%H:%M:%SZ")),
        PluginStatus::Failed { reason } => format!("failed ({})", reason),
        PluginStatus::Closed { at } => format!("closed at {}", at.format("%Y-%m-%dT%H:%M:%SZ")),
    };
    format!("   ├─ {}: {}", identity, status)
}

/// 시작 완료 요약을 출력합니다
pub fn print_startup_summary(app_name: &str, statuses: &[(&'static str, PluginStatus)]) {
    println!();
    print_boxed_title(&format!("🎉 {} STARTED", app_name.to_uppercase()));
    for (identity, status) in statuses {
        println!("{}", format_status(identity, status));
    }
    let ready = statuses
        .iter()
        .filter(|(_, s)| matches!(s, PluginStatus::Ready { .. }))
        .count();
    println!("   🚀 Ready plugins: {}/{}", ready, statuses.len());
    println!();
}

/// 종료 요약을 출력합니다
pub fn print_shutdown_summary(report: &ShutdownReport) {
    print_boxed_title("👋 SHUTDOWN");
    println!("   📦 Closed: {}", report.closed.join(", "));
    for (identity, e) in &report.failures {
        println!("   ❌ {}: {}", identity, e);
    }
}

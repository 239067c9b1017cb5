use std::sync::Arc;
use gst_reco_rust::{api, portal::CsvPortalSource, AppConfig, ReconciliationService};
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置，容差非法时直接退出
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);
    let defaults = config.recon_options()?;

    let portal = Arc::new(CsvPortalSource::new(&config.portal.cache_dir));
    info!("GSTR-2B cache directory: {}", config.portal.cache_dir);

    let service = Arc::new(ReconciliationService::new(defaults, portal));

    let app = api::router(service).layer(ServiceBuilder::new());

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/reco/2b         - books vs uploaded GSTR-2B");
    info!("  POST /api/reco/2b/portal  - books vs portal GSTR-2B");
    info!("  POST /api/reco/2b/export  - CSV export");
    info!("  POST /api/reco/2b/batch   - parallel batches");
    info!("  POST /api/reco/returns    - GSTR-1 / 3B / 2B period comparison");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

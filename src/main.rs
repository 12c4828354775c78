use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use dsb_backoffice::{
    config::Config,
    db::init_pool,
    health::{health, health_db},
    routes::{
        admin, approvals, charges, exceptions, masters, month_lock, reconciliation, remittances,
        uploads,
    },
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    tracing::info!("Starting back-office service...");

    let config = Config::from_env().expect("Failed to load configuration from environment");
    tracing::info!("Configuration loaded: host={}, port={}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let pool = init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running migrations...");
    sqlx::migrate!("./db/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let state = Arc::new(pool);

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/health/db", get(health_db))
        // Uploads
        .route("/api/uploads/ledger", post(uploads::upload_ledger).get(uploads::list_ledger_batches))
        .route("/api/uploads/vendor", post(uploads::upload_vendor).get(uploads::list_vendor_batches))
        .route("/api/uploads/vendor/validate", post(uploads::validate_vendor))
        .route("/api/uploads/ledger/{batch_id}/invalid", get(uploads::list_ledger_invalid))
        .route("/api/uploads/vendor/{batch_id}/invalid", get(uploads::list_vendor_invalid))
        // Reconciliation
        .route("/api/reconciliation/run", post(reconciliation::run_reconciliation))
        .route("/api/reconciliation/results", get(reconciliation::list_results))
        .route("/api/reconciliation/corrections", get(reconciliation::list_corrections))
        .route(
            "/api/reconciliation/{recon_id}/corrections",
            post(reconciliation::request_correction),
        )
        // Exceptions
        .route(
            "/api/exceptions",
            get(exceptions::list_exceptions).post(exceptions::create_exception),
        )
        .route(
            "/api/exceptions/{exception_id}/resolve-request",
            post(exceptions::request_resolution),
        )
        // Remittances
        .route("/api/remittances", get(remittances::list_remittances))
        .route("/api/remittances/{remittance_id}/validate", post(remittances::validate_remittance))
        .route(
            "/api/remittances/{remittance_id}/approve-request",
            post(remittances::request_approval),
        )
        .route("/api/remittances/{remittance_id}/close", post(remittances::close_remittance))
        // Charges
        .route("/api/charges/vendor/compute", post(charges::compute_vendor))
        .route("/api/charges/customer/compute", post(charges::compute_customer))
        .route("/api/charges/vendor", get(charges::list_vendor_summaries))
        .route("/api/charges/customer", get(charges::list_customer_summaries))
        // Approvals
        .route("/api/approvals/pending", get(approvals::list_pending))
        .route("/api/approvals/clarifications", get(approvals::list_clarifications))
        .route("/api/approvals/{approval_id}", get(approvals::get_approval))
        .route("/api/approvals/{approval_id}/approve", post(approvals::approve))
        .route("/api/approvals/{approval_id}/reject", post(approvals::reject))
        .route("/api/approvals/{approval_id}/clarify", post(approvals::clarify))
        .route("/api/approvals/{approval_id}/resubmit", post(approvals::resubmit))
        // Masters
        .route(
            "/api/masters/vendors",
            get(masters::list_vendors).post(masters::request_vendor),
        )
        .route(
            "/api/masters/bank-stores",
            get(masters::list_bank_stores).post(masters::request_bank_store),
        )
        .route(
            "/api/masters/store-mappings",
            get(masters::list_mappings).post(masters::request_mapping),
        )
        .route(
            "/api/masters/store-mappings/{mapping_id}/deactivate-request",
            post(masters::request_mapping_deactivation),
        )
        .route(
            "/api/masters/charge-configs",
            get(masters::list_charge_configs).post(masters::request_charge_config),
        )
        .route(
            "/api/masters/pickup-rules",
            get(masters::list_pickup_rules).post(masters::request_pickup_rule),
        )
        .route(
            "/api/masters/vendor-charges",
            get(masters::list_vendor_charges).post(masters::request_vendor_charge),
        )
        .route(
            "/api/masters/customer-slabs",
            get(masters::list_customer_slabs).post(masters::request_customer_slab),
        )
        .route(
            "/api/masters/waivers",
            get(masters::list_waivers).post(masters::request_waiver),
        )
        .route(
            "/api/masters/file-formats",
            get(masters::list_file_formats).post(masters::request_file_format),
        )
        // Month locks
        .route(
            "/api/month-locks",
            post(month_lock::lock_month).get(month_lock::list_locks),
        )
        // Admin
        .route("/api/admin/cleanup", post(admin::cleanup))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid HOST/PORT");
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");
    axum::serve(listener, app)
        .await
        .expect("Server error");
}

//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{AllocationEngine, LotRegistry, ReservationLedger};
use crate::domain::RepositoryProvider;
use crate::shared::time::SharedClock;

use super::common::{ApiResponse, EmptyData, PaginatedResponse};
use super::modules::health::{self, HealthState};
use super::modules::lots::{self, LotAppState};
use super::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use super::modules::request_id::request_id_middleware;
use super::modules::reservations::{self, ReservationAppState};
use super::modules::spots;

/// Unified state for all `/api/v1` routes.
/// Axum extracts the specific handler state via `FromRef`.
#[derive(Clone)]
pub struct ParkingState {
    pub registry: Arc<LotRegistry>,
    pub ledger: Arc<ReservationLedger>,
    pub engine: Arc<AllocationEngine>,
    pub health: HealthState,
    pub currency: Arc<str>,
}

impl ParkingState {
    /// Wire the three services over one repository provider.
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        clock: SharedClock,
        backend: &'static str,
        currency: &str,
    ) -> Self {
        Self {
            registry: Arc::new(LotRegistry::new(repos.clone(), clock.clone())),
            ledger: Arc::new(ReservationLedger::new(repos.clone())),
            engine: Arc::new(AllocationEngine::new(repos.clone(), clock)),
            health: HealthState {
                repos,
                backend,
                started_at: Arc::new(Instant::now()),
            },
            currency: Arc::from(currency),
        }
    }
}

// -- FromRef implementations so each handler keeps its own State<T> extractor --

impl FromRef<ParkingState> for LotAppState {
    fn from_ref(s: &ParkingState) -> Self {
        LotAppState {
            registry: Arc::clone(&s.registry),
            engine: Arc::clone(&s.engine),
            currency: Arc::clone(&s.currency),
        }
    }
}

impl FromRef<ParkingState> for ReservationAppState {
    fn from_ref(s: &ParkingState) -> Self {
        ReservationAppState {
            ledger: Arc::clone(&s.ledger),
            engine: Arc::clone(&s.engine),
            currency: Arc::clone(&s.currency),
        }
    }
}

impl FromRef<ParkingState> for HealthState {
    fn from_ref(s: &ParkingState) -> Self {
        s.health.clone()
    }
}

/// Documents the `X-User-Id` header forwarded by the gateway
struct ActingUserAddon;

impl Modify for ActingUserAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "acting_user",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-User-Id"))),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Lots
        lots::list_lots,
        lots::create_lot,
        lots::lot_summary,
        lots::get_lot,
        lots::update_lot,
        lots::delete_lot,
        lots::list_lot_spots,
        // Spots
        spots::get_spot,
        spots::delete_spot,
        // Reservations
        lots::reserve_spot,
        reservations::list_all_reservations,
        reservations::list_active_reservations,
        reservations::release_active,
        reservations::release_reservation,
        reservations::parking_stats,
        // Me
        reservations::my_reservations,
        reservations::my_active_reservation,
        reservations::my_summary,
    ),
    components(
        schemas(
            // Common
            ApiResponse<String>,
            EmptyData,
            PaginatedResponse<reservations::HistoryEntryDto>,
            // Health
            health::HealthResponse,
            health::ComponentHealth,
            // Lots
            lots::LotDto,
            lots::CreateLotRequest,
            lots::UpdateLotRequest,
            lots::LotOccupancyDto,
            lots::SpotDto,
            lots::ReserveSpotRequest,
            spots::SpotDetailDto,
            // Reservations
            reservations::ReservationDto,
            reservations::AllocationDto,
            reservations::ReleaseDto,
            reservations::HistoryEntryDto,
            reservations::LotUsageDto,
            reservations::ParkingStatsDto,
        )
    ),
    modifiers(&ActingUserAddon),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Lots", description = "Parking lot capacity management and occupancy"),
        (name = "Spots", description = "Single spot inspection and removal"),
        (name = "Reservations", description = "Claiming and releasing spots, history, totals"),
        (name = "Me", description = "The acting user's own reservations"),
    ),
    info(
        title = "Parking Service API",
        version = "1.0.0",
        description = "REST API for parking lots, spots and hourly-billed reservations",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes.
///
/// `/metrics` is mounted only when a Prometheus recorder handle is given.
pub fn create_api_router(state: ParkingState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let lot_routes = Router::new()
        .route("/", get(lots::list_lots).post(lots::create_lot))
        .route("/summary", get(lots::lot_summary))
        .route(
            "/{lot_id}",
            get(lots::get_lot)
                .put(lots::update_lot)
                .delete(lots::delete_lot),
        )
        .route("/{lot_id}/spots", get(lots::list_lot_spots))
        .route("/{lot_id}/reservations", post(lots::reserve_spot));

    let spot_routes = Router::new().route(
        "/{spot_id}",
        get(spots::get_spot).delete(spots::delete_spot),
    );

    let reservation_routes = Router::new()
        .route("/", get(reservations::list_all_reservations))
        .route("/active", get(reservations::list_active_reservations))
        .route("/release", post(reservations::release_active))
        .route(
            "/{reservation_id}/release",
            post(reservations::release_reservation),
        );

    let me_routes = Router::new()
        .route("/reservations", get(reservations::my_reservations))
        .route("/reservation", get(reservations::my_active_reservation))
        .route("/summary", get(reservations::my_summary));

    let api = Router::new()
        .nest("/lots", lot_routes)
        .nest("/spots", spot_routes)
        .nest("/reservations", reservation_routes)
        .nest("/me", me_routes)
        .route("/stats", get(reservations::parking_stats));

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    let mut router = Router::new()
        // Swagger UI
        .merge(swagger_routes)
        // Health
        .route("/health", get(health::health_check))
        .nest("/api/v1", api)
        .with_state(state);

    if let Some(handle) = metrics_handle {
        router = router.merge(
            Router::new()
                .route("/metrics", get(prometheus_metrics))
                .with_state(MetricsState { handle }),
        );
    }

    router
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

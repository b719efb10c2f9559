// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod pool;
mod types;

pub use pool::ComputePool;
pub use types::*;

use actix_web::{
    error::InternalError, http::StatusCode, middleware::Logger, web, App, HttpResponse,
    HttpServer,
};
use anyhow::Result;
use privagator_compute::{Availability, AvailabilityStatus, ComputeError, ComputeRouter};
use std::time::Instant;
use tracing::{error, info, warn};

/// Default cap on `/compute` request bodies
pub const DEFAULT_JSON_LIMIT: usize = 1024 * 1024;

pub struct ComputeServerBuilder {
    router: ComputeRouter,
    availability: Availability,
    port: Option<u16>,
    host: Option<String>,
    workers: Option<usize>,
    json_limit: Option<usize>,
    pool: Option<ComputePool>,
}

impl ComputeServerBuilder {
    /// Create a new builder serving `router`, reporting the probe outcome in `availability`
    pub fn new(router: ComputeRouter, availability: &Availability) -> Self {
        Self {
            router,
            availability: availability.clone(),
            port: None,
            host: None,
            workers: None,
            json_limit: None,
            pool: None,
        }
    }

    /// Set the port number (default: 8765)
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the host address (default: "127.0.0.1")
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the number of HTTP workers (default: one per physical core)
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    /// Cap JSON request bodies at `bytes` (default: 1 MiB)
    pub fn with_json_limit(mut self, bytes: usize) -> Self {
        self.json_limit = Some(bytes);
        self
    }

    /// Run compute jobs on `pool` instead of a default sized one
    pub fn with_pool(mut self, pool: ComputePool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn build(self) -> Result<ComputeServer> {
        let pool = match self.pool {
            Some(pool) => pool,
            None => ComputePool::new(None, 64)?,
        };
        Ok(ComputeServer {
            state: AppState::new(self.router, &self.availability, pool),
            port: self.port.unwrap_or(8765),
            host: self.host.unwrap_or_else(|| "127.0.0.1".to_string()),
            workers: self.workers,
            json_limit: self.json_limit.unwrap_or(DEFAULT_JSON_LIMIT),
        })
    }
}

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    router: ComputeRouter,
    pool: ComputePool,
    health: HealthResponse,
    status: AvailabilityStatus,
}

impl AppState {
    pub fn new(router: ComputeRouter, availability: &Availability, pool: ComputePool) -> Self {
        let status = availability.status().clone();
        Self {
            router,
            pool,
            health: HealthResponse {
                ok: true,
                status: "running".to_string(),
                fhe_backend: availability.backend().to_string(),
                message: status.message.clone(),
            },
            status,
        }
    }
}

pub struct ComputeServer {
    state: AppState,
    port: u16,
    host: String,
    workers: Option<usize>,
    json_limit: usize,
}

impl ComputeServer {
    pub fn builder(router: ComputeRouter, availability: &Availability) -> ComputeServerBuilder {
        ComputeServerBuilder::new(router, availability)
    }

    /// Get the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Run the HTTP server until it is shut down
    pub async fn run(&self) -> Result<()> {
        let bind_addr = self.bind_address();
        let state = web::Data::new(self.state.clone());
        let json_limit = self.json_limit;
        let mut server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .wrap(Logger::default())
                .configure(routes(json_limit))
        });
        if let Some(workers) = self.workers {
            server = server.workers(workers);
        }
        let server = server.bind(&bind_addr)?;

        info!(
            backend = %self.state.health.fhe_backend,
            "Privagator listening on http://{}", bind_addr
        );
        server.run().await.map_err(Into::into)
    }
}

/// Register every route. The app must carry `web::Data<AppState>`.
///
/// Request bodies are parsed as JSON whatever their content type, and bodies
/// larger than `json_limit` bytes are rejected with 400.
pub fn routes(json_limit: usize) -> impl Fn(&mut web::ServiceConfig) + Clone {
    move |cfg: &mut web::ServiceConfig| {
        let json = web::JsonConfig::default()
            .limit(json_limit)
            .content_type_required(false)
            .content_type(|_| true)
            .error_handler(|err, _req| {
                let response =
                    HttpResponse::BadRequest().json(ErrorResponse::new(err.to_string()));
                InternalError::from_response(err, response).into()
            });
        cfg.app_data(json)
            .route("/compute", web::post().to(handle_compute))
            .route("/health", web::get().to(handle_health_check))
            .route("/health", web::head().to(handle_health_check))
            .route("/status", web::get().to(handle_status));
    }
}

fn status_code(err: &ComputeError) -> StatusCode {
    if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

async fn handle_compute(
    state: web::Data<AppState>,
    req: web::Json<ComputeRequest>,
) -> HttpResponse {
    let started = Instant::now();
    let ComputeRequest { op, inputs } = req.into_inner();
    let Some(op) = op.filter(|op| !op.is_empty()) else {
        return HttpResponse::BadRequest().json(ErrorResponse::new("Missing 'op' parameter"));
    };

    let router = state.router.clone();
    let task_name = format!("compute {op}");
    let outcome = state
        .pool
        .spawn(task_name, move || router.compute(&op, &inputs))
        .await;

    match outcome {
        Ok(Ok(computation)) => {
            HttpResponse::Ok().json(ComputeResponse::new(computation, started.elapsed()))
        }
        Ok(Err(err)) => {
            let status = status_code(&err);
            if status.is_server_error() {
                error!("{err}");
            } else {
                warn!("Rejected compute request: {err}");
            }
            HttpResponse::build(status).json(ErrorResponse::new(err.to_string()))
        }
        Err(err) => {
            error!("Compute job failed: {err:#}");
            HttpResponse::InternalServerError().json(ErrorResponse::new(format!("{err:#}")))
        }
    }
}

async fn handle_health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(&state.health)
}

async fn handle_status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(&state.status)
}

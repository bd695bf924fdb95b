use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router, middleware};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::info;

use kafka_service_broker::KafkaServiceBroker;
use kafka_service_broker::broker::{
    BindDetails, Binding, DeprovisionDetails, LastOperation, ProvisionDetails, UnbindDetails,
    UpdateDetails,
};
use kafka_service_broker::catalog::Catalog;

use crate::auth::{BasicCredentials, basic_auth};
use crate::error::{ApiError, Operation};

type Broker = Arc<KafkaServiceBroker>;

/// Routes of the service broker API, every one behind basic authentication
pub fn router(broker: Broker, credentials: BasicCredentials) -> Router {
    Router::new()
        .route("/v2/catalog", get(catalog))
        .route(
            "/v2/service_instances/:instance_id",
            put(provision).patch(update).delete(deprovision),
        )
        .route(
            "/v2/service_instances/:instance_id/last_operation",
            get(last_operation),
        )
        .route(
            "/v2/service_instances/:instance_id/service_bindings/:binding_id",
            put(bind).delete(unbind),
        )
        .with_state(broker)
        .layer(middleware::from_fn_with_state(
            Arc::new(credentials),
            basic_auth,
        ))
        .layer(TraceLayer::new_for_http())
}

/// HTTP server hosting the broker
#[derive(Debug)]
pub struct BrokerServer {
    broker: Broker,
    credentials: BasicCredentials,
}

impl BrokerServer {
    pub fn new(broker: KafkaServiceBroker, credentials: BasicCredentials) -> Self {
        Self {
            broker: Arc::new(broker),
            credentials,
        }
    }

    pub fn router(&self) -> Router {
        router(self.broker.clone(), self.credentials.clone())
    }

    pub async fn run(self, addr: SocketAddr) -> std::io::Result<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(%addr, "service broker listening");
        axum::serve(listener, router).await
    }
}

async fn catalog(State(broker): State<Broker>) -> Json<Catalog> {
    Json(Catalog {
        services: broker.services().to_vec(),
    })
}

async fn provision(
    State(broker): State<Broker>,
    Path(instance_id): Path<String>,
    Json(details): Json<ProvisionDetails>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    broker
        .provision(&instance_id, details)
        .await
        .map_err(|err| ApiError::new(Operation::Provision, err))?;
    Ok((StatusCode::CREATED, Json(json!({}))))
}

async fn update(
    State(broker): State<Broker>,
    Path(instance_id): Path<String>,
    Json(details): Json<UpdateDetails>,
) -> Result<Json<Value>, ApiError> {
    broker
        .update(&instance_id, details)
        .await
        .map_err(|err| ApiError::new(Operation::Update, err))?;
    Ok(Json(json!({})))
}

async fn deprovision(
    State(broker): State<Broker>,
    Path(instance_id): Path<String>,
    Query(details): Query<DeprovisionDetails>,
) -> Result<Json<Value>, ApiError> {
    let spec = broker
        .deprovision(&instance_id, details)
        .await
        .map_err(|err| ApiError::new(Operation::Deprovision, err))?;

    if spec.report.is_complete() {
        Ok(Json(json!({})))
    } else {
        Ok(Json(json!({
            "description": format!(
                "failed to delete topics: {}",
                spec.report.failed_topics().join(", ")
            ),
        })))
    }
}

async fn last_operation(
    State(broker): State<Broker>,
    Path(instance_id): Path<String>,
) -> Json<LastOperation> {
    Json(broker.last_operation(&instance_id))
}

async fn bind(
    State(broker): State<Broker>,
    Path((instance_id, binding_id)): Path<(String, String)>,
    Json(details): Json<BindDetails>,
) -> Result<(StatusCode, Json<Binding>), ApiError> {
    let binding = broker
        .bind(&instance_id, &binding_id, details)
        .await
        .map_err(|err| ApiError::new(Operation::Bind, err))?;
    Ok((StatusCode::CREATED, Json(binding)))
}

async fn unbind(
    State(broker): State<Broker>,
    Path((instance_id, binding_id)): Path<(String, String)>,
    Query(details): Query<UnbindDetails>,
) -> Result<Json<Value>, ApiError> {
    broker
        .unbind(&instance_id, &binding_id, details)
        .await
        .map_err(|err| ApiError::new(Operation::Unbind, err))?;
    Ok(Json(json!({})))
}

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use kafka_service_broker::BrokerError;

/// Operation a broker error came from; the same error maps to different codes per operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Provision,
    Deprovision,
    Update,
    Bind,
    Unbind,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    description: String,
}

impl ErrorBody {
    pub(crate) fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// Broker error rendered as an HTTP status with a `description` body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    description: String,
}

impl ApiError {
    pub(crate) fn new(operation: Operation, err: BrokerError) -> Self {
        let status = status_for(operation, &err);
        if status.is_server_error() {
            error!(?operation, %err, "request failed");
        }
        Self {
            status,
            description: err.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

fn status_for(operation: Operation, err: &BrokerError) -> StatusCode {
    use Operation::*;

    match (operation, err) {
        (_, BrokerError::InvalidRequest(_) | BrokerError::PlanNotRecognized(_)) => {
            StatusCode::BAD_REQUEST
        }
        (Provision, BrokerError::InstanceAlreadyExists) => StatusCode::CONFLICT,
        (Deprovision, BrokerError::InstanceDoesNotExist) => StatusCode::GONE,
        (Bind | Unbind | Update, BrokerError::InstanceDoesNotExist) => StatusCode::NOT_FOUND,
        (Unbind, BrokerError::BindingDoesNotExist) => StatusCode::GONE,
        (Update, BrokerError::PlanChangeNotSupported { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.description))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use kafka_service_broker::cluster::ClusterError;
    use kafka_service_broker::plan::PlanName;

    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Operation::Provision, BrokerError::InstanceAlreadyExists, 409),
            (Operation::Provision, BrokerError::PlanNotRecognized("x".into()), 400),
            (Operation::Provision, BrokerError::PlanNotConfigured("x".into()), 500),
            (Operation::Deprovision, BrokerError::InstanceDoesNotExist, 410),
            (Operation::Bind, BrokerError::InstanceDoesNotExist, 404),
            (Operation::Unbind, BrokerError::InstanceDoesNotExist, 404),
            (Operation::Unbind, BrokerError::BindingDoesNotExist, 410),
            (Operation::Bind, BrokerError::InvalidRequest("plan_id required".into()), 400),
            (
                Operation::Update,
                BrokerError::PlanChangeNotSupported {
                    from: PlanName::Topic,
                    to: PlanName::Shared,
                },
                422,
            ),
            (
                Operation::Provision,
                BrokerError::Cluster(ClusterError::request("create topic", "boom")),
                500,
            ),
        ];

        for (operation, err, expected) in cases {
            let description = err.to_string();
            let api_error = ApiError::new(operation, err);
            assert_eq!(api_error.status().as_u16(), expected, "{operation:?}: {description}");
            assert_eq!(api_error.description(), description);
        }
    }
}

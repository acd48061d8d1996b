//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CatalogError, InventoryError, OrderError};
use placement::{PlacementError, Shortage};
use storage::StorageError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order placement or cancellation error.
    Placement(PlacementError),
    /// Stock ledger error.
    Inventory(InventoryError),
    /// Order store error.
    Order(OrderError),
    /// Catalog error.
    Catalog(CatalogError),
    /// Storage error outside any service.
    Storage(StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut shortages: Option<Vec<Shortage>> = None;
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Placement(PlacementError::InsufficientStock(list)) => {
                let message = PlacementError::InsufficientStock(list.clone()).to_string();
                shortages = Some(list);
                (StatusCode::CONFLICT, message)
            }
            ApiError::Placement(err) => placement_status(&err),
            ApiError::Inventory(err) => (inventory_status(&err), err.to_string()),
            ApiError::Order(err) => (order_status(&err), err.to_string()),
            ApiError::Catalog(err) => (catalog_status(&err), err.to_string()),
            ApiError::Storage(err) => (storage_status(&err), err.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = match shortages {
            Some(shortages) => serde_json::json!({ "error": message, "shortages": shortages }),
            None => serde_json::json!({ "error": message }),
        };
        (status, axum::Json(body)).into_response()
    }
}

fn placement_status(err: &PlacementError) -> (StatusCode, String) {
    let status = match err {
        PlacementError::EmptyOrder | PlacementError::InvalidQuantity { .. } => {
            StatusCode::BAD_REQUEST
        }
        PlacementError::InsufficientStock(_)
        | PlacementError::ReservationConflict { .. }
        | PlacementError::NotCancellable { .. } => StatusCode::CONFLICT,
        PlacementError::NotFound(_) => StatusCode::NOT_FOUND,
        PlacementError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PlacementError::Inventory(e) => inventory_status(e),
        PlacementError::Order(e) => order_status(e),
        PlacementError::Catalog(e) => catalog_status(e),
    };
    (status, err.to_string())
}

fn inventory_status(err: &InventoryError) -> StatusCode {
    match err {
        InventoryError::InsufficientStock { .. } => StatusCode::CONFLICT,
        InventoryError::InvalidAmount { .. } => StatusCode::BAD_REQUEST,
        InventoryError::NotFound(_) => StatusCode::NOT_FOUND,
        InventoryError::Storage(e) => storage_status(e),
    }
}

fn order_status(err: &OrderError) -> StatusCode {
    match err {
        OrderError::EmptyOrder | OrderError::InvalidQuantity { .. } => StatusCode::BAD_REQUEST,
        OrderError::NotFound(_) => StatusCode::NOT_FOUND,
        OrderError::NotCancellable { .. }
        | OrderError::InvalidTransition { .. }
        | OrderError::StatusChanged { .. } => StatusCode::CONFLICT,
        OrderError::Storage(e) => storage_status(e),
    }
}

fn catalog_status(err: &CatalogError) -> StatusCode {
    match err {
        CatalogError::InvalidName => StatusCode::BAD_REQUEST,
        CatalogError::AlreadyExists(_) => StatusCode::CONFLICT,
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Storage(e) => storage_status(e),
    }
}

fn storage_status(err: &StorageError) -> StatusCode {
    match err {
        StorageError::Duplicate(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<PlacementError> for ApiError {
    fn from(err: PlacementError) -> Self {
        ApiError::Placement(err)
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        ApiError::Inventory(err)
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err)
    }
}

#[cfg(test)]
mod tests {
    use common::{OrderId, ProductId, Variant};

    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Placement(PlacementError::EmptyOrder), StatusCode::BAD_REQUEST),
            (
                ApiError::Placement(PlacementError::ReservationConflict {
                    product_id: ProductId::new("P1"),
                    variant: Variant::Ml30,
                    available: 0,
                    requested: 1,
                }),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Placement(PlacementError::PersistenceFailure("down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Order(OrderError::NotFound(OrderId::new())),
                StatusCode::NOT_FOUND,
            ),
            (ApiError::Catalog(CatalogError::InvalidName), StatusCode::BAD_REQUEST),
            (
                ApiError::Storage(StorageError::Unavailable("down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}

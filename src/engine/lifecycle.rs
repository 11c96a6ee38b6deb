//! Delivery lifecycle: creation, claiming and status progression.
//!
//! Every status write is conditional on the state the decision was made
//! against, so two racing requests cannot both succeed.

use tracing::{info, warn};

use crate::db::deliveries;
use crate::error::AppError;
use crate::models::delivery::{Delivery, DeliveryStatus, NewDelivery};
use crate::state::AppState;

/// A validated request to move a delivery to a new status on behalf of a rider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryUpdate {
    pub delivery_id: i64,
    pub rider_id: i64,
    pub status: DeliveryStatus,
}

impl DeliveryUpdate {
    pub fn from_parts(
        delivery_id: Option<i64>,
        rider_id: Option<i64>,
        status: Option<&str>,
    ) -> Result<Self, AppError> {
        let status = status.map(str::trim).filter(|s| !s.is_empty());
        let (Some(delivery_id), Some(rider_id), Some(status)) = (delivery_id, rider_id, status) else {
            return Err(AppError::Validation(
                "delivery_id, rider_id, and delivery_status are required".to_string(),
            ));
        };

        Ok(Self {
            delivery_id,
            rider_id,
            status: status.parse().map_err(AppError::Validation)?,
        })
    }
}

pub async fn create_delivery(state: &AppState, delivery: &NewDelivery) -> Result<i64, AppError> {
    let delivery_id = deliveries::create(state.db.pool(), delivery).await?;

    state.metrics.deliveries_created_total.inc();
    info!(delivery_id, sender_id = delivery.sender_id, "delivery created");

    Ok(delivery_id)
}

/// Deliveries a rider may claim. An empty list is a normal outcome.
pub async fn list_pending(state: &AppState) -> Result<Vec<Delivery>, AppError> {
    Ok(deliveries::list_pending(state.db.pool()).await?)
}

pub async fn list_all(state: &AppState) -> Result<Vec<Delivery>, AppError> {
    Ok(deliveries::list_all(state.db.pool()).await?)
}

pub async fn find_by_sender(state: &AppState, sender_id: i64) -> Result<Vec<Delivery>, AppError> {
    Ok(deliveries::list_by_sender(state.db.pool(), sender_id).await?)
}

pub async fn find_by_receiver_phone(state: &AppState, phone_number: &str) -> Result<Vec<Delivery>, AppError> {
    Ok(deliveries::list_by_receiver_phone(state.db.pool(), phone_number).await?)
}

/// Attaches `rider_id` to an unclaimed delivery and sets `status` in the same write.
pub async fn claim(
    state: &AppState,
    delivery_id: i64,
    rider_id: i64,
    status: DeliveryStatus,
) -> Result<(), AppError> {
    if status != DeliveryStatus::Assigned {
        return Err(AppError::InvalidTransition {
            from: DeliveryStatus::AwaitingRider,
            to: status,
        });
    }

    if deliveries::claim(state.db.pool(), delivery_id, rider_id, status).await? {
        state.metrics.claims_total.with_label_values(&["success"]).inc();
        state
            .metrics
            .status_transitions_total
            .with_label_values(&[status.as_str()])
            .inc();
        info!(delivery_id, rider_id, "delivery claimed");
        return Ok(());
    }

    let current = deliveries::get(state.db.pool(), delivery_id).await?;
    if current.rider_id.is_some() {
        state.metrics.claims_total.with_label_values(&["already_claimed"]).inc();
        warn!(delivery_id, rider_id, "claim lost: delivery already has a rider");
        return Err(AppError::AlreadyClaimed(delivery_id));
    }

    state.metrics.claims_total.with_label_values(&["rejected"]).inc();
    Err(AppError::InvalidTransition {
        from: current.delivery_status,
        to: status,
    })
}

/// Applies a status change requested by a rider. Moving to `assigned` is a claim.
///
/// Other moves must follow the transition table and come from the assigned
/// rider. A delivery nobody has claimed yet may only be cancelled.
pub async fn update_status(state: &AppState, update: DeliveryUpdate) -> Result<(), AppError> {
    let DeliveryUpdate {
        delivery_id,
        rider_id,
        status: next,
    } = update;

    if next == DeliveryStatus::Assigned {
        return claim(state, delivery_id, rider_id, next).await;
    }

    let current = deliveries::get(state.db.pool(), delivery_id).await?;

    if !current.delivery_status.can_transition_to(next) {
        return Err(AppError::InvalidTransition {
            from: current.delivery_status,
            to: next,
        });
    }

    if let Some(assigned) = current.rider_id {
        if assigned != rider_id {
            return Err(AppError::Conflict(format!(
                "delivery {delivery_id} is assigned to another rider"
            )));
        }
    }

    let applied = deliveries::compare_and_set_status(
        state.db.pool(),
        delivery_id,
        current.delivery_status,
        current.rider_id,
        next,
    )
    .await?;

    if !applied {
        warn!(delivery_id, rider_id, "status write lost to a concurrent change");
        return Err(AppError::Conflict(format!(
            "delivery {delivery_id} changed while updating, reload and retry"
        )));
    }

    state
        .metrics
        .status_transitions_total
        .with_label_values(&[next.as_str()])
        .inc();
    info!(
        delivery_id,
        rider_id,
        from = %current.delivery_status,
        to = %next,
        "delivery status updated"
    );

    Ok(())
}

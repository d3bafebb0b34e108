//! Vehicle reservation request handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::VEHICLE_TAG;
use crate::api::dto::{
    AvailableVehiclesQuery, CreateVehicleReservationRequest, UpdateVehicleReservationRequest,
    VehicleAvailabilityQuery, VehicleReservationListQuery, VehicleReservationResponse,
    VehicleResponse,
};
use crate::availability::VehicleAvailability;
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};

pub fn vehicle_reservation_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            list_vehicle_reservations,
            create_vehicle_reservation
        ))
        .routes(routes!(check_vehicle_availability))
        .routes(routes!(list_available_vehicles))
        .routes(routes!(
            get_vehicle_reservation,
            update_vehicle_reservation,
            delete_vehicle_reservation
        ))
}

#[utoipa::path(
    get,
    path = "/prenotazioni-mezzi",
    tag = VEHICLE_TAG,
    params(VehicleReservationListQuery),
    responses(
        (status = 200, description = "Matching reservations", body = Vec<VehicleReservationResponse>),
        (status = 400, description = "Malformed filter")
    )
)]
async fn list_vehicle_reservations(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<VehicleReservationListQuery>,
) -> AppResult<Json<Vec<VehicleReservationResponse>>> {
    let filter = query.into_filter();
    let reservations = state.services.vehicle_reservations.list(&filter).await?;
    Ok(Json(
        reservations
            .into_iter()
            .map(VehicleReservationResponse::from)
            .collect(),
    ))
}

/// Check a vehicle against reservations, maintenance and its own status
#[utoipa::path(
    get,
    path = "/prenotazioni-mezzi/check-disponibilita",
    tag = VEHICLE_TAG,
    params(VehicleAvailabilityQuery),
    responses(
        (status = 200, description = "Computed availability", body = VehicleAvailability),
        (status = 400, description = "Invalid window"),
        (status = 404, description = "Vehicle not found")
    )
)]
async fn check_vehicle_availability(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<VehicleAvailabilityQuery>,
) -> AppResult<Json<VehicleAvailability>> {
    let window = query.window()?;
    let availability = state
        .services
        .vehicle_reservations
        .check_availability(query.veicolo_id, window, query.exclude_id)
        .await?;
    Ok(Json(availability))
}

/// Bookable vehicles with no overlapping active reservation
#[utoipa::path(
    get,
    path = "/prenotazioni-mezzi/veicoli-disponibili",
    tag = VEHICLE_TAG,
    params(AvailableVehiclesQuery),
    responses(
        (status = 200, description = "Free vehicles", body = Vec<VehicleResponse>),
        (status = 400, description = "Invalid window")
    )
)]
async fn list_available_vehicles(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<AvailableVehiclesQuery>,
) -> AppResult<Json<Vec<VehicleResponse>>> {
    let window = query.window()?;
    let vehicles = state
        .services
        .vehicle_reservations
        .list_available(window, query.tipo.as_deref())
        .await?;
    Ok(Json(vehicles.into_iter().map(VehicleResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/prenotazioni-mezzi/{id}",
    tag = VEHICLE_TAG,
    params(("id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation found", body = VehicleReservationResponse),
        (status = 404, description = "Reservation not found")
    )
)]
async fn get_vehicle_reservation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<VehicleReservationResponse>> {
    let reservation = state.services.vehicle_reservations.get(id).await?;
    Ok(Json(reservation.into()))
}

#[utoipa::path(
    post,
    path = "/prenotazioni-mezzi",
    tag = VEHICLE_TAG,
    request_body = CreateVehicleReservationRequest,
    responses(
        (status = 201, description = "Reservation created", body = VehicleReservationResponse),
        (status = 400, description = "Invalid request or scheduling conflict"),
        (status = 404, description = "Vehicle not found")
    )
)]
async fn create_vehicle_reservation(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateVehicleReservationRequest>,
) -> AppResult<(StatusCode, Json<VehicleReservationResponse>)> {
    let new_reservation = req.into_new_reservation()?;
    let created = state
        .services
        .vehicle_reservations
        .create(new_reservation)
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    put,
    path = "/prenotazioni-mezzi/{id}",
    tag = VEHICLE_TAG,
    params(("id" = i32, Path, description = "Reservation ID")),
    request_body = UpdateVehicleReservationRequest,
    responses(
        (status = 200, description = "Reservation updated", body = VehicleReservationResponse),
        (status = 400, description = "Invalid change"),
        (status = 404, description = "Reservation not found")
    )
)]
async fn update_vehicle_reservation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<UpdateVehicleReservationRequest>,
) -> AppResult<Json<VehicleReservationResponse>> {
    let updated = state
        .services
        .vehicle_reservations
        .update(id, req.into_changes())
        .await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/prenotazioni-mezzi/{id}",
    tag = VEHICLE_TAG,
    params(("id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation deleted", body = VehicleReservationResponse),
        (status = 404, description = "Reservation not found")
    )
)]
async fn delete_vehicle_reservation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<VehicleReservationResponse>> {
    let deleted = state.services.vehicle_reservations.delete(id).await?;
    Ok(Json(deleted.into()))
}

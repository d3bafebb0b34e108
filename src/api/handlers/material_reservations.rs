//! Material reservation request handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::MATERIAL_TAG;
use crate::api::dto::{
    CreateMaterialReservationRequest, MaterialAvailabilityQuery, MaterialReservationListQuery,
    MaterialReservationResponse, UpdateMaterialReservationRequest,
};
use crate::availability::MaterialAvailability;
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};

pub fn material_reservation_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            list_material_reservations,
            create_material_reservation
        ))
        .routes(routes!(check_material_availability))
        .routes(routes!(
            get_material_reservation,
            update_material_reservation,
            delete_material_reservation
        ))
}

/// List reservations, ordered by start
#[utoipa::path(
    get,
    path = "/prenotazioni-materiali",
    tag = MATERIAL_TAG,
    params(MaterialReservationListQuery),
    responses(
        (status = 200, description = "Matching reservations", body = Vec<MaterialReservationResponse>),
        (status = 400, description = "Malformed filter")
    )
)]
async fn list_material_reservations(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<MaterialReservationListQuery>,
) -> AppResult<Json<Vec<MaterialReservationResponse>>> {
    let filter = query.into_filter();
    let reservations = state.services.material_reservations.list(&filter).await?;
    Ok(Json(
        reservations
            .into_iter()
            .map(MaterialReservationResponse::from)
            .collect(),
    ))
}

/// Check how much of a material is free over a window
#[utoipa::path(
    get,
    path = "/prenotazioni-materiali/check-disponibilita",
    tag = MATERIAL_TAG,
    params(MaterialAvailabilityQuery),
    responses(
        (status = 200, description = "Computed availability", body = MaterialAvailability),
        (status = 400, description = "Invalid window or quantity"),
        (status = 404, description = "Material not found")
    )
)]
async fn check_material_availability(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<MaterialAvailabilityQuery>,
) -> AppResult<Json<MaterialAvailability>> {
    let window = query.window()?;
    let availability = state
        .services
        .material_reservations
        .check_availability(query.materiale_id, window, query.quantita, query.exclude_id)
        .await?;
    Ok(Json(availability))
}

#[utoipa::path(
    get,
    path = "/prenotazioni-materiali/{id}",
    tag = MATERIAL_TAG,
    params(("id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation found", body = MaterialReservationResponse),
        (status = 404, description = "Reservation not found")
    )
)]
async fn get_material_reservation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<MaterialReservationResponse>> {
    let reservation = state.services.material_reservations.get(id).await?;
    Ok(Json(reservation.into()))
}

/// Book a material; the availability check is repeated server-side
#[utoipa::path(
    post,
    path = "/prenotazioni-materiali",
    tag = MATERIAL_TAG,
    request_body = CreateMaterialReservationRequest,
    responses(
        (status = 201, description = "Reservation created", body = MaterialReservationResponse),
        (status = 400, description = "Invalid request or insufficient quantity"),
        (status = 404, description = "Material not found")
    )
)]
async fn create_material_reservation(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateMaterialReservationRequest>,
) -> AppResult<(StatusCode, Json<MaterialReservationResponse>)> {
    let new_reservation = req.into_new_reservation()?;
    let created = state
        .services
        .material_reservations
        .create(new_reservation)
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    put,
    path = "/prenotazioni-materiali/{id}",
    tag = MATERIAL_TAG,
    params(("id" = i32, Path, description = "Reservation ID")),
    request_body = UpdateMaterialReservationRequest,
    responses(
        (status = 200, description = "Reservation updated", body = MaterialReservationResponse),
        (status = 400, description = "Invalid change"),
        (status = 404, description = "Reservation not found")
    )
)]
async fn update_material_reservation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<UpdateMaterialReservationRequest>,
) -> AppResult<Json<MaterialReservationResponse>> {
    let updated = state
        .services
        .material_reservations
        .update(id, req.into_changes())
        .await?;
    Ok(Json(updated.into()))
}

/// Hard delete; the removed record is returned
#[utoipa::path(
    delete,
    path = "/prenotazioni-materiali/{id}",
    tag = MATERIAL_TAG,
    params(("id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation deleted", body = MaterialReservationResponse),
        (status = 404, description = "Reservation not found")
    )
)]
async fn delete_material_reservation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<MaterialReservationResponse>> {
    let deleted = state.services.material_reservations.delete(id).await?;
    Ok(Json(deleted.into()))
}

//! PostgreSQL store for vehicle reservations.

use async_trait::async_trait;
use diesel::dsl::{self, not};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::QueryFragment;
use diesel::sql_types::{BigInt, Integer};
use diesel_async::methods::LoadQuery;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use jiff::civil::DateTime;
use jiff_diesel::ToDiesel;

use crate::availability::vehicle::{
    ACTIVE_MAINTENANCE_STATUSES, ACTIVE_RESERVATION_STATUSES, BOOKABLE_VEHICLE_STATUS,
    VehicleAvailability,
};
use crate::availability::Window;
use crate::config::ReservationsConfig;
use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    NewVehicleReservation, Vehicle, VehicleReservation, VehicleReservationChanges,
    VehicleReservationDetails, check_status_change, display_name, timestamp_now,
};
use crate::repositories::traits::{Booking, ReservationFilter, VehicleReservationStore};
use crate::schema::{manutenzioni_mezzi, prenotazioni_mezzi, utenti, veicoli};

type DetailsRow = (
    VehicleReservation,
    String,
    Option<String>,
    Option<String>,
    Option<(String, String)>,
);

fn into_details((reservation, targa, modello, tipo, creator): DetailsRow) -> VehicleReservationDetails {
    VehicleReservationDetails {
        reservation,
        veicolo_targa: targa,
        veicolo_modello: modello,
        veicolo_tipo: tipo,
        created_by_nome: creator.map(|(n, c)| display_name(&n, &c)),
    }
}

/// Vehicle reservation repository holding an async connection pool.
#[derive(Clone)]
pub struct VehicleReservationRepository {
    pool: AsyncDbPool,
}

impl VehicleReservationRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

async fn load_details(
    conn: &mut AsyncPgConnection,
    reservation_id: i32,
) -> AppResult<Option<VehicleReservationDetails>> {
    let row: Option<DetailsRow> = prenotazioni_mezzi::table
        .inner_join(veicoli::table)
        .left_join(utenti::table)
        .filter(prenotazioni_mezzi::id.eq(reservation_id))
        .select((
            VehicleReservation::as_select(),
            veicoli::targa,
            veicoli::modello,
            veicoli::tipo,
            (utenti::nome, utenti::cognome).nullable(),
        ))
        .first(conn)
        .await
        .optional()?;

    Ok(row.map(into_details))
}

/// Reservations still running at or after `at`
fn ends_on_or_after(
    at: DateTime,
) -> dsl::GtEq<prenotazioni_mezzi::data_fine, jiff_diesel::DateTime> {
    prenotazioni_mezzi::data_fine.ge(at.to_diesel())
}

/// Reservations already started at or before `at`
fn starts_on_or_before(
    at: DateTime,
) -> dsl::LtEq<prenotazioni_mezzi::data_inizio, jiff_diesel::DateTime> {
    prenotazioni_mezzi::data_inizio.le(at.to_diesel())
}

type VehicleRow = dsl::Select<dsl::Find<veicoli::table, i32>, dsl::AsSelect<Vehicle, Pg>>;

fn vehicle_row(vehicle_id: i32) -> VehicleRow {
    veicoli::table.find(vehicle_id).select(Vehicle::as_select())
}

/// Vehicle row held until the surrounding transaction ends
fn locked_vehicle_row(vehicle_id: i32) -> dsl::ForUpdate<VehicleRow> {
    vehicle_row(vehicle_id).for_update()
}

/// Active reservations on the vehicle strictly overlapping `window`.
fn conflicting_bookings_query(
    vehicle_id: i32,
    window: &Window,
    exclude_id: Option<i32>,
) -> prenotazioni_mezzi::BoxedQuery<'static, Pg, BigInt> {
    let mut query = prenotazioni_mezzi::table
        .filter(prenotazioni_mezzi::veicolo_id.eq(vehicle_id))
        .filter(prenotazioni_mezzi::stato.eq_any(ACTIVE_RESERVATION_STATUSES))
        .filter(prenotazioni_mezzi::data_inizio.lt(window.end.to_diesel()))
        .filter(prenotazioni_mezzi::data_fine.gt(window.start.to_diesel()))
        .count()
        .into_boxed();

    if let Some(excluded) = exclude_id {
        query = query.filter(prenotazioni_mezzi::id.ne(excluded));
    }

    query
}

/// Scheduled or running maintenance on the vehicle strictly overlapping `window`.
fn conflicting_maintenance_query(
    vehicle_id: i32,
    window: &Window,
) -> manutenzioni_mezzi::BoxedQuery<'static, Pg, BigInt> {
    manutenzioni_mezzi::table
        .filter(manutenzioni_mezzi::veicolo_id.eq(vehicle_id))
        .filter(manutenzioni_mezzi::stato.eq_any(ACTIVE_MAINTENANCE_STATUSES))
        .filter(manutenzioni_mezzi::data_inizio.lt(window.end.to_diesel()))
        .filter(manutenzioni_mezzi::data_fine.gt(window.start.to_diesel()))
        .count()
        .into_boxed()
}

/// Ids of vehicles with an active reservation strictly overlapping `window`
fn booked_vehicles_query(window: &Window) -> prenotazioni_mezzi::BoxedQuery<'static, Pg, Integer> {
    prenotazioni_mezzi::table
        .filter(prenotazioni_mezzi::stato.eq_any(ACTIVE_RESERVATION_STATUSES))
        .filter(prenotazioni_mezzi::data_inizio.lt(window.end.to_diesel()))
        .filter(prenotazioni_mezzi::data_fine.gt(window.start.to_diesel()))
        .select(prenotazioni_mezzi::veicolo_id)
        .distinct()
        .into_boxed()
}

/// Ids of vehicles with active maintenance strictly overlapping `window`
fn vehicles_in_workshop_query(
    window: &Window,
) -> manutenzioni_mezzi::BoxedQuery<'static, Pg, Integer> {
    manutenzioni_mezzi::table
        .filter(manutenzioni_mezzi::stato.eq_any(ACTIVE_MAINTENANCE_STATUSES))
        .filter(manutenzioni_mezzi::data_inizio.lt(window.end.to_diesel()))
        .filter(manutenzioni_mezzi::data_fine.gt(window.start.to_diesel()))
        .select(manutenzioni_mezzi::veicolo_id)
        .distinct()
        .into_boxed()
}

/// Removes the reservation and hands back the removed row in one statement.
///
/// A concurrent delete of the same id waits on the row lock and then finds
/// nothing to return.
fn delete_returning(
    reservation_id: i32,
) -> impl LoadQuery<'static, AsyncPgConnection, VehicleReservation> + QueryFragment<Pg> + Send {
    diesel::delete(prenotazioni_mezzi::table.find(reservation_id))
        .returning(VehicleReservation::as_returning())
}

/// Joins display fields onto a reservation row that may no longer exist in
/// the table.
async fn describe(
    conn: &mut AsyncPgConnection,
    reservation: VehicleReservation,
) -> AppResult<VehicleReservationDetails> {
    let (targa, modello, tipo): (String, Option<String>, Option<String>) = veicoli::table
        .find(reservation.veicolo_id)
        .select((veicoli::targa, veicoli::modello, veicoli::tipo))
        .first(conn)
        .await?;

    let creator: Option<(String, String)> = match reservation.created_by {
        Some(user_id) => utenti::table
            .find(user_id)
            .select((utenti::nome, utenti::cognome))
            .first(conn)
            .await
            .optional()?,
        None => None,
    };

    Ok(into_details((reservation, targa, modello, tipo, creator)))
}

async fn load_vehicle(
    conn: &mut AsyncPgConnection,
    vehicle_id: i32,
    lock: bool,
) -> AppResult<Option<Vehicle>> {
    let vehicle = if lock {
        locked_vehicle_row(vehicle_id).first(conn).await.optional()?
    } else {
        vehicle_row(vehicle_id).first(conn).await.optional()?
    };

    Ok(vehicle)
}

/// Runs the three conflict sources for one vehicle.
///
/// Both reservations and maintenance use the exclusive rule: a window
/// ending exactly when another starts does not collide.
///
/// # Arguments
/// * `exclude_id` - Reservation ignored as a conflict, used when re-checking an update
/// * `lock` - Holds the vehicle row `FOR UPDATE` until the surrounding
///   transaction ends
///
/// # Returns
/// The resolved availability, or `NotFound` when the vehicle does not exist
async fn vehicle_availability(
    conn: &mut AsyncPgConnection,
    vehicle_id: i32,
    window: &Window,
    exclude_id: Option<i32>,
    lock: bool,
) -> AppResult<VehicleAvailability> {
    let vehicle = load_vehicle(conn, vehicle_id, lock)
        .await?
        .ok_or_else(AppError::vehicle_not_found)?;

    let booking_conflicts: i64 = conflicting_bookings_query(vehicle_id, window, exclude_id)
        .get_result(conn)
        .await?;

    let maintenance_conflicts: i64 = conflicting_maintenance_query(vehicle_id, window)
        .get_result(conn)
        .await?;

    Ok(VehicleAvailability::resolve(
        vehicle.id,
        &vehicle.stato,
        booking_conflicts,
        maintenance_conflicts,
    ))
}

#[async_trait]
impl VehicleReservationStore for VehicleReservationRepository {
    async fn list(&self, filter: &ReservationFilter) -> AppResult<Vec<VehicleReservationDetails>> {
        let mut conn = self.pool.get().await?;

        let mut query = prenotazioni_mezzi::table
            .inner_join(veicoli::table)
            .left_join(utenti::table)
            .select((
                VehicleReservation::as_select(),
                veicoli::targa,
                veicoli::modello,
                veicoli::tipo,
                (utenti::nome, utenti::cognome).nullable(),
            ))
            .order((
                prenotazioni_mezzi::data_inizio.asc(),
                prenotazioni_mezzi::id.asc(),
            ))
            .into_boxed();

        if let Some(from) = filter.bounds.from {
            query = query.filter(ends_on_or_after(from));
        }
        if let Some(to) = filter.bounds.to {
            query = query.filter(starts_on_or_before(to));
        }
        if let Some(stato) = &filter.stato {
            query = query.filter(prenotazioni_mezzi::stato.eq(stato.clone()));
        }
        if let Some(vehicle_id) = filter.resource_id {
            query = query.filter(prenotazioni_mezzi::veicolo_id.eq(vehicle_id));
        }

        let rows: Vec<DetailsRow> = query.load(&mut conn).await?;
        Ok(rows.into_iter().map(into_details).collect())
    }

    async fn find(&self, id: i32) -> AppResult<Option<VehicleReservationDetails>> {
        let mut conn = self.pool.get().await?;
        load_details(&mut conn, id).await
    }

    async fn check_availability(
        &self,
        veicolo_id: i32,
        window: Window,
        exclude_id: Option<i32>,
    ) -> AppResult<VehicleAvailability> {
        let mut conn = self.pool.get().await?;
        vehicle_availability(&mut conn, veicolo_id, &window, exclude_id, false).await
    }

    async fn list_available(
        &self,
        window: Window,
        tipo: Option<&str>,
        exclude_maintenance: bool,
    ) -> AppResult<Vec<Vehicle>> {
        let mut conn = self.pool.get().await?;

        let mut busy: Vec<i32> = booked_vehicles_query(&window).load(&mut conn).await?;

        if exclude_maintenance {
            let in_workshop: Vec<i32> =
                vehicles_in_workshop_query(&window).load(&mut conn).await?;
            busy.extend(in_workshop);
        }

        let mut query = veicoli::table
            .filter(veicoli::stato.eq(BOOKABLE_VEHICLE_STATUS))
            .filter(not(veicoli::id.eq_any(busy)))
            .select(Vehicle::as_select())
            .order(veicoli::targa.asc())
            .into_boxed();

        if let Some(tipo) = tipo {
            query = query.filter(veicoli::tipo.eq(tipo.to_string()));
        }

        query.load(&mut conn).await.map_err(AppError::from)
    }

    async fn create(
        &self,
        reservation: NewVehicleReservation,
    ) -> AppResult<Booking<VehicleReservationDetails, VehicleAvailability>> {
        let window = Window::new(
            reservation.data_inizio.to_jiff(),
            reservation.data_fine.to_jiff(),
        )?;
        let mut conn = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let availability =
                    vehicle_availability(conn, reservation.veicolo_id, &window, None, true).await?;
                if !availability.disponibile {
                    return Ok(Booking::Rejected(availability));
                }

                let created_id: i32 = diesel::insert_into(prenotazioni_mezzi::table)
                    .values(&reservation)
                    .returning(prenotazioni_mezzi::id)
                    .get_result(conn)
                    .await?;

                let details = load_details(conn, created_id)
                    .await?
                    .ok_or_else(AppError::reservation_not_found)?;
                Ok(Booking::Accepted(details))
            }
            .scope_boxed()
        })
        .await
    }

    async fn update(
        &self,
        id: i32,
        changes: VehicleReservationChanges,
        policy: ReservationsConfig,
    ) -> AppResult<Option<Booking<VehicleReservationDetails, VehicleAvailability>>> {
        let changes = VehicleReservationChanges {
            updated_at: Some(timestamp_now()),
            ..changes
        };
        let mut conn = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let current: Option<VehicleReservation> = prenotazioni_mezzi::table
                    .find(id)
                    .select(VehicleReservation::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                let Some(current) = current else {
                    return Ok(None);
                };

                if let Some(next) = changes.stato.as_deref() {
                    check_status_change(&current.stato, next, policy.enforce_status_transitions)?;
                }

                let merged = changes.merged(&current);
                let window = merged.window()?;

                if policy.revalidate_on_update
                    && ACTIVE_RESERVATION_STATUSES.contains(&merged.stato.as_str())
                {
                    let availability =
                        vehicle_availability(conn, merged.veicolo_id, &window, Some(id), true)
                            .await?;
                    if !availability.disponibile {
                        return Ok(Some(Booking::Rejected(availability)));
                    }
                }

                diesel::update(prenotazioni_mezzi::table.find(id))
                    .set(&changes)
                    .execute(conn)
                    .await?;

                let details = load_details(conn, id)
                    .await?
                    .ok_or_else(AppError::reservation_not_found)?;
                Ok(Some(Booking::Accepted(details)))
            }
            .scope_boxed()
        })
        .await
    }

    async fn delete(&self, id: i32) -> AppResult<Option<VehicleReservationDetails>> {
        let mut conn = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let deleted: Option<VehicleReservation> =
                    delete_returning(id).get_result(conn).await.optional()?;
                match deleted {
                    Some(reservation) => Ok(Some(describe(conn, reservation).await?)),
                    None => Ok(None),
                }
            }
            .scope_boxed()
        })
        .await
    }
}

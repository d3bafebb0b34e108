//! PostgreSQL store for material reservations.

use async_trait::async_trait;
use diesel::dsl::{self, sum};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::QueryFragment;
use diesel::sql_types::{BigInt, Nullable};
use diesel_async::methods::LoadQuery;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use jiff::civil::DateTime;
use jiff_diesel::ToDiesel;

use crate::availability::material::{ACTIVE_STATUSES, MaterialAvailability};
use crate::availability::Window;
use crate::config::ReservationsConfig;
use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    Material, MaterialReservation, MaterialReservationChanges, MaterialReservationDetails,
    NewMaterialReservation, check_status_change, display_name, timestamp_now,
};
use crate::repositories::traits::{Booking, MaterialReservationStore, ReservationFilter};
use crate::schema::{materiali, prenotazioni_materiali, utenti};

type DetailsRow = (
    MaterialReservation,
    String,
    Option<String>,
    Option<(String, String)>,
);

fn into_details((reservation, nome, categoria, creator): DetailsRow) -> MaterialReservationDetails {
    MaterialReservationDetails {
        reservation,
        materiale_nome: nome,
        materiale_categoria: categoria,
        created_by_nome: creator.map(|(n, c)| display_name(&n, &c)),
    }
}

/// Material reservation repository holding an async connection pool.
#[derive(Clone)]
pub struct MaterialReservationRepository {
    pool: AsyncDbPool,
}

impl MaterialReservationRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

async fn load_details(
    conn: &mut AsyncPgConnection,
    reservation_id: i32,
) -> AppResult<Option<MaterialReservationDetails>> {
    let row: Option<DetailsRow> = prenotazioni_materiali::table
        .inner_join(materiali::table)
        .left_join(utenti::table)
        .filter(prenotazioni_materiali::id.eq(reservation_id))
        .select((
            MaterialReservation::as_select(),
            materiali::nome,
            materiali::categoria,
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
) -> dsl::GtEq<prenotazioni_materiali::data_fine, jiff_diesel::DateTime> {
    prenotazioni_materiali::data_fine.ge(at.to_diesel())
}

/// Reservations already started at or before `at`
fn starts_on_or_before(
    at: DateTime,
) -> dsl::LtEq<prenotazioni_materiali::data_inizio, jiff_diesel::DateTime> {
    prenotazioni_materiali::data_inizio.le(at.to_diesel())
}

type MaterialRow = dsl::Select<dsl::Find<materiali::table, i32>, dsl::AsSelect<Material, Pg>>;

fn material_row(material_id: i32) -> MaterialRow {
    materiali::table
        .find(material_id)
        .select(Material::as_select())
}

/// Material row held until the surrounding transaction ends
fn locked_material_row(material_id: i32) -> dsl::ForUpdate<MaterialRow> {
    material_row(material_id).for_update()
}

/// Sum of quantities held by active reservations on the material whose
/// window touches `window` (inclusive rule).
fn reserved_quantity_query(
    material_id: i32,
    window: &Window,
    exclude_id: Option<i32>,
) -> prenotazioni_materiali::BoxedQuery<'static, Pg, Nullable<BigInt>> {
    let mut query = prenotazioni_materiali::table
        .filter(prenotazioni_materiali::materiale_id.eq(material_id))
        .filter(prenotazioni_materiali::stato.eq_any(ACTIVE_STATUSES))
        .filter(starts_on_or_before(window.end))
        .filter(ends_on_or_after(window.start))
        .select(sum(prenotazioni_materiali::quantita))
        .into_boxed();

    if let Some(excluded) = exclude_id {
        query = query.filter(prenotazioni_materiali::id.ne(excluded));
    }

    query
}

/// Removes the reservation and hands back the removed row in one statement.
///
/// A concurrent delete of the same id waits on the row lock and then finds
/// nothing to return.
fn delete_returning(
    reservation_id: i32,
) -> impl LoadQuery<'static, AsyncPgConnection, MaterialReservation> + QueryFragment<Pg> + Send {
    diesel::delete(prenotazioni_materiali::table.find(reservation_id))
        .returning(MaterialReservation::as_returning())
}

/// Joins display fields onto a reservation row that may no longer exist in
/// the table.
async fn describe(
    conn: &mut AsyncPgConnection,
    reservation: MaterialReservation,
) -> AppResult<MaterialReservationDetails> {
    let (nome, categoria): (String, Option<String>) = materiali::table
        .find(reservation.materiale_id)
        .select((materiali::nome, materiali::categoria))
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

    Ok(into_details((reservation, nome, categoria, creator)))
}

async fn load_material(
    conn: &mut AsyncPgConnection,
    material_id: i32,
    lock: bool,
) -> AppResult<Option<Material>> {
    let material = if lock {
        locked_material_row(material_id).first(conn).await.optional()?
    } else {
        material_row(material_id).first(conn).await.optional()?
    };

    Ok(material)
}

/// Quantity figures for one material over `window`.
///
/// # Arguments
/// * `exclude_id` - Reservation left out of the sum, used when re-checking an update
/// * `lock` - Holds the material row `FOR UPDATE` until the surrounding
///   transaction ends, serializing concurrent bookings
///
/// # Returns
/// The computed figures, or `NotFound` when the material does not exist
async fn material_availability(
    conn: &mut AsyncPgConnection,
    material_id: i32,
    window: &Window,
    quantita: i32,
    exclude_id: Option<i32>,
    lock: bool,
) -> AppResult<MaterialAvailability> {
    let material = load_material(conn, material_id, lock)
        .await?
        .ok_or_else(AppError::material_not_found)?;

    let reserved: Option<i64> = reserved_quantity_query(material_id, window, exclude_id)
        .first(conn)
        .await?;

    Ok(MaterialAvailability::compute(
        material.id,
        material.quantita_totale,
        material.quantita_assegnata,
        reserved.unwrap_or(0),
        quantita,
    ))
}

#[async_trait]
impl MaterialReservationStore for MaterialReservationRepository {
    async fn list(&self, filter: &ReservationFilter) -> AppResult<Vec<MaterialReservationDetails>> {
        let mut conn = self.pool.get().await?;

        let mut query = prenotazioni_materiali::table
            .inner_join(materiali::table)
            .left_join(utenti::table)
            .select((
                MaterialReservation::as_select(),
                materiali::nome,
                materiali::categoria,
                (utenti::nome, utenti::cognome).nullable(),
            ))
            .order((
                prenotazioni_materiali::data_inizio.asc(),
                prenotazioni_materiali::id.asc(),
            ))
            .into_boxed();

        if let Some(from) = filter.bounds.from {
            query = query.filter(ends_on_or_after(from));
        }
        if let Some(to) = filter.bounds.to {
            query = query.filter(starts_on_or_before(to));
        }
        if let Some(stato) = &filter.stato {
            query = query.filter(prenotazioni_materiali::stato.eq(stato.clone()));
        }
        if let Some(material_id) = filter.resource_id {
            query = query.filter(prenotazioni_materiali::materiale_id.eq(material_id));
        }

        let rows: Vec<DetailsRow> = query.load(&mut conn).await?;
        Ok(rows.into_iter().map(into_details).collect())
    }

    async fn find(&self, id: i32) -> AppResult<Option<MaterialReservationDetails>> {
        let mut conn = self.pool.get().await?;
        load_details(&mut conn, id).await
    }

    async fn check_availability(
        &self,
        materiale_id: i32,
        window: Window,
        quantita: i32,
        exclude_id: Option<i32>,
    ) -> AppResult<MaterialAvailability> {
        let mut conn = self.pool.get().await?;
        material_availability(&mut conn, materiale_id, &window, quantita, exclude_id, false).await
    }

    async fn create(
        &self,
        reservation: NewMaterialReservation,
    ) -> AppResult<Booking<MaterialReservationDetails, MaterialAvailability>> {
        let window = Window::new(
            reservation.data_inizio.to_jiff(),
            reservation.data_fine.to_jiff(),
        )?;
        let mut conn = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let availability = material_availability(
                    conn,
                    reservation.materiale_id,
                    &window,
                    reservation.quantita,
                    None,
                    true,
                )
                .await?;
                if !availability.sufficiente {
                    return Ok(Booking::Rejected(availability));
                }

                let created_id: i32 = diesel::insert_into(prenotazioni_materiali::table)
                    .values(&reservation)
                    .returning(prenotazioni_materiali::id)
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
        changes: MaterialReservationChanges,
        policy: ReservationsConfig,
    ) -> AppResult<Option<Booking<MaterialReservationDetails, MaterialAvailability>>> {
        let changes = MaterialReservationChanges {
            updated_at: Some(timestamp_now()),
            ..changes
        };
        let mut conn = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let current: Option<MaterialReservation> = prenotazioni_materiali::table
                    .find(id)
                    .select(MaterialReservation::as_select())
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

                if policy.revalidate_on_update && ACTIVE_STATUSES.contains(&merged.stato.as_str())
                {
                    let availability = material_availability(
                        conn,
                        merged.materiale_id,
                        &window,
                        merged.quantita,
                        Some(id),
                        true,
                    )
                    .await?;
                    if !availability.sufficiente {
                        return Ok(Some(Booking::Rejected(availability)));
                    }
                }

                diesel::update(prenotazioni_materiali::table.find(id))
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

    async fn delete(&self, id: i32) -> AppResult<Option<MaterialReservationDetails>> {
        let mut conn = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut conn;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let deleted: Option<MaterialReservation> =
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

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::debug_query;
    use jiff::civil::date;

    fn window() -> Window {
        Window::new(date(2024, 1, 1).at(0, 0, 0, 0), date(2024, 1, 5).at(0, 0, 0, 0)).unwrap()
    }

    #[test]
    fn test_reserved_quantity_uses_inclusive_overlap() {
        let sql = debug_query::<Pg, _>(&reserved_quantity_query(3, &window(), None)).to_string();

        assert!(
            sql.to_lowercase().contains("sum(\"prenotazioni_materiali\".\"quantita\")"),
            "{sql}"
        );
        assert!(sql.contains("\"prenotazioni_materiali\".\"data_inizio\" <= $"), "{sql}");
        assert!(sql.contains("\"prenotazioni_materiali\".\"data_fine\" >= $"), "{sql}");
        assert!(!sql.contains(" < $") && !sql.contains(" > $"), "{sql}");
        assert!(!sql.contains("\"prenotazioni_materiali\".\"id\" != $"), "{sql}");
    }

    #[test]
    fn test_reserved_quantity_counts_only_active_statuses() {
        let sql = debug_query::<Pg, _>(&reserved_quantity_query(3, &window(), None)).to_string();

        assert!(sql.contains("\"prenotazioni_materiali\".\"stato\" = ANY($"), "{sql}");
        assert!(sql.contains("\"prenotata\"") && sql.contains("\"confermata\""), "{sql}");
        assert!(!sql.contains("\"in_corso\""), "{sql}");
        assert!(!sql.contains("\"annullata\""), "{sql}");
    }

    #[test]
    fn test_reserved_quantity_leaves_out_excluded_reservation() {
        let sql = debug_query::<Pg, _>(&reserved_quantity_query(3, &window(), Some(7))).to_string();

        assert!(sql.contains("\"prenotazioni_materiali\".\"id\" != $"), "{sql}");
    }

    #[test]
    fn test_list_bounds_are_inclusive() {
        let day = date(2024, 1, 5).at(0, 0, 0, 0);

        let from = debug_query::<Pg, _>(&ends_on_or_after(day)).to_string();
        let to = debug_query::<Pg, _>(&starts_on_or_before(day)).to_string();

        assert!(from.contains("\"prenotazioni_materiali\".\"data_fine\" >= $"), "{from}");
        assert!(to.contains("\"prenotazioni_materiali\".\"data_inizio\" <= $"), "{to}");
    }

    #[test]
    fn test_booking_locks_material_row() {
        let locked = debug_query::<Pg, _>(&locked_material_row(3)).to_string();
        let plain = debug_query::<Pg, _>(&material_row(3)).to_string();

        assert!(locked.contains("\"materiali\".\"id\" = $"), "{locked}");
        assert!(locked.contains("FOR UPDATE"), "{locked}");
        assert!(!plain.contains("FOR UPDATE"), "{plain}");
    }

    #[test]
    fn test_delete_returns_the_removed_row() {
        let sql = debug_query::<Pg, _>(&delete_returning(9)).to_string();

        assert!(sql.starts_with("DELETE FROM \"prenotazioni_materiali\""), "{sql}");
        assert!(sql.contains("RETURNING"), "{sql}");
    }
}

use crate::domain::ids::{ReservationId, RoomId, UserId};
use crate::domain::listing::{Room, User};
use crate::domain::page::{Page, PageRequest};
use crate::domain::ports::{ReservationStore, RoomCatalog, UserDirectory};
use crate::domain::reservation::Reservation;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for reservations.
///
/// Uses `Arc<RwLock<HashMap<ReservationId, Reservation>>>` so clones share the
/// same data. Used when no database path is configured, and in tests.
#[derive(Default, Clone)]
pub struct InMemoryReservationStore {
    reservations: Arc<RwLock<HashMap<ReservationId, Reservation>>>,
}

impl InMemoryReservationStore {
    /// Creates a new, empty in-memory reservation store.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.reservations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.reservations.read().await.is_empty()
    }
}

/// Latest check-in first; id breaks ties so paging is stable.
pub(crate) fn sort_for_listing(reservations: &mut [Reservation]) {
    reservations.sort_by(|a, b| {
        b.check_in()
            .cmp(&a.check_in())
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn find_by_room(&self, room_id: RoomId) -> Result<Vec<Reservation>> {
        let reservations = self.reservations.read().await;
        Ok(reservations
            .values()
            .filter(|r| r.room_id == room_id)
            .cloned()
            .collect())
    }

    async fn save(&self, reservation: Reservation) -> Result<Reservation> {
        let mut reservations = self.reservations.write().await;
        reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let reservations = self.reservations.read().await;
        Ok(reservations.get(&id).cloned())
    }

    async fn find_by_user(&self, user_id: UserId, page: PageRequest) -> Result<Page<Reservation>> {
        let mut matching: Vec<Reservation> = {
            let reservations = self.reservations.read().await;
            reservations
                .values()
                .filter(|r| r.user_id == user_id && !r.is_cancelled())
                .cloned()
                .collect()
        };
        sort_for_listing(&mut matching);
        Ok(page.slice(matching))
    }

    async fn find_by_receipt(&self, receipt_id: &str) -> Result<Vec<Reservation>> {
        let reservations = self.reservations.read().await;
        Ok(reservations
            .values()
            .filter(|r| r.payment.receipt_id == receipt_id)
            .cloned()
            .collect())
    }
}

/// Rooms and users loaded at startup.
///
/// Both are owned by other services; this directory only answers lookups.
#[derive(Default, Clone)]
pub struct InMemoryDirectory {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    rooms: Arc<RwLock<HashMap<RoomId, Room>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn add_room(&self, room: Room) {
        self.rooms.write().await.insert(room.id, room);
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl RoomCatalog for InMemoryDirectory {
    async fn find_room(&self, id: RoomId) -> Result<Option<Room>> {
        Ok(self.rooms.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reservation::{Cost, Payment, StayPeriod};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn reservation(user: u64, room: u64, check_in: &str, check_out: &str) -> Reservation {
        let mut reservation = Reservation::pending(
            RoomId(room),
            UserId(user),
            StayPeriod::new(
                NaiveDate::parse_from_str(check_in, "%Y-%m-%d").unwrap(),
                NaiveDate::parse_from_str(check_out, "%Y-%m-%d").unwrap(),
            )
            .unwrap(),
            1,
            Cost::new(dec!(100)).unwrap(),
            Payment::new(format!("receipt-{check_in}")),
            Utc::now(),
        );
        reservation.confirm().unwrap();
        reservation
    }

    #[tokio::test]
    async fn test_in_memory_reservation_store() {
        let store = InMemoryReservationStore::new();
        let r = reservation(1, 7, "2030-01-01", "2030-01-03");

        store.save(r.clone()).await.unwrap();
        assert_eq!(store.find_by_id(r.id).await.unwrap(), Some(r.clone()));
        assert_eq!(store.find_by_room(RoomId(7)).await.unwrap(), vec![r]);
        assert!(store.find_by_room(RoomId(8)).await.unwrap().is_empty());
        assert!(
            store
                .find_by_id(ReservationId::new())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_find_by_user_orders_and_skips_cancelled() {
        let store = InMemoryReservationStore::new();
        let early = reservation(1, 1, "2030-01-01", "2030-01-02");
        let late = reservation(1, 2, "2030-03-01", "2030-03-02");
        let mut cancelled = reservation(1, 3, "2030-02-01", "2030-02-02");
        cancelled.cancel("no", Utc::now()).unwrap();
        let other_user = reservation(2, 1, "2030-05-01", "2030-05-02");

        for r in [early.clone(), late.clone(), cancelled, other_user] {
            store.save(r).await.unwrap();
        }

        let page = store
            .find_by_user(UserId(1), PageRequest::new(1, 10).unwrap())
            .await
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![late.id, early.id]);
        assert_eq!(page.total_items, 2);
    }

    #[tokio::test]
    async fn test_find_by_receipt() {
        let store = InMemoryReservationStore::new();
        let r = reservation(1, 1, "2030-01-01", "2030-01-02");
        store.save(r.clone()).await.unwrap();
        store
            .save(reservation(1, 1, "2030-02-01", "2030-02-02"))
            .await
            .unwrap();

        assert_eq!(store.find_by_receipt("receipt-2030-01-01").await.unwrap(), vec![r]);
        assert!(store.find_by_receipt("receipt").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_directory_lookups() {
        let directory = InMemoryDirectory::new();
        directory
            .add_user(User {
                id: UserId(1),
                name: "test".to_string(),
                email: "test@gmail.com".to_string(),
            })
            .await;

        assert!(directory.find_user(UserId(1)).await.unwrap().is_some());
        assert!(directory.find_user(UserId(2)).await.unwrap().is_none());
        assert!(directory.find_room(RoomId(1)).await.unwrap().is_none());
        assert_eq!(directory.user_count().await, 1);
    }
}

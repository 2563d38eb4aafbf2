use super::in_memory::sort_for_listing;
use crate::domain::ids::{ReservationId, RoomId, UserId};
use crate::domain::page::{Page, PageRequest};
use crate::domain::ports::ReservationStore;
use crate::domain::reservation::Reservation;
use crate::error::{ReservationError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding reservations as JSON, keyed by reservation uuid.
pub const CF_RESERVATIONS: &str = "reservations";
/// Column Family indexing reservations by room: `room_id ++ reservation uuid`.
pub const CF_ROOM_INDEX: &str = "room_index";
/// Column Family indexing reservations by guest: `user_id ++ reservation uuid`.
pub const CF_USER_INDEX: &str = "user_index";
/// Column Family indexing reservations by payment: `receipt id ++ reservation uuid`.
pub const CF_RECEIPT_INDEX: &str = "receipt_index";

const UUID_LEN: usize = 16;

/// A persistent `ReservationStore` backed by RocksDB.
///
/// Reservations live in one column family; index families map a room, a user
/// or a receipt to its reservation ids so no lookup scans the whole table. A
/// save writes the record and every index key in one batch.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the reservation and index column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [CF_RESERVATIONS, CF_ROOM_INDEX, CF_USER_INDEX, CF_RECEIPT_INDEX]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, families)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            ReservationError::Internal(Box::new(std::io::Error::other(format!(
                "Column family {name} not found"
            ))))
        })
    }

    fn load(&self, id: &[u8]) -> Result<Option<Reservation>> {
        let cf = self.cf(CF_RESERVATIONS)?;
        match self.db.get_cf(cf, id)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Loads every reservation whose index key starts with `prefix`. Index
    /// keys end with the reservation uuid.
    fn load_indexed(&self, index: &str, prefix: &[u8]) -> Result<Vec<Reservation>> {
        let cf = self.cf(index)?;
        let mut reservations = Vec::new();
        for item in self.db.prefix_iterator_cf(cf, prefix) {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            if key.len() < prefix.len() + UUID_LEN {
                continue;
            }
            if let Some(reservation) = self.load(&key[key.len() - UUID_LEN..])? {
                reservations.push(reservation);
            }
        }
        Ok(reservations)
    }
}

fn index_key(owner: &[u8], id: ReservationId) -> Vec<u8> {
    let mut key = Vec::with_capacity(owner.len() + UUID_LEN);
    key.extend_from_slice(owner);
    key.extend_from_slice(id.0.as_bytes());
    key
}

#[async_trait]
impl ReservationStore for RocksDBStore {
    async fn find_by_room(&self, room_id: RoomId) -> Result<Vec<Reservation>> {
        self.load_indexed(CF_ROOM_INDEX, &room_id.0.to_be_bytes())
    }

    async fn save(&self, reservation: Reservation) -> Result<Reservation> {
        let value = serde_json::to_vec(&reservation)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_RESERVATIONS)?, reservation.id.0.as_bytes(), value);
        batch.put_cf(
            self.cf(CF_ROOM_INDEX)?,
            index_key(&reservation.room_id.0.to_be_bytes(), reservation.id),
            b"",
        );
        batch.put_cf(
            self.cf(CF_USER_INDEX)?,
            index_key(&reservation.user_id.0.to_be_bytes(), reservation.id),
            b"",
        );
        batch.put_cf(
            self.cf(CF_RECEIPT_INDEX)?,
            index_key(reservation.payment.receipt_id.as_bytes(), reservation.id),
            b"",
        );
        self.db.write(batch)?;

        Ok(reservation)
    }

    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        self.load(id.0.as_bytes())
    }

    async fn find_by_user(&self, user_id: UserId, page: PageRequest) -> Result<Page<Reservation>> {
        let mut reservations: Vec<Reservation> = self
            .load_indexed(CF_USER_INDEX, &user_id.0.to_be_bytes())?
            .into_iter()
            .filter(|r| !r.is_cancelled())
            .collect();
        sort_for_listing(&mut reservations);
        Ok(page.slice(reservations))
    }

    async fn find_by_receipt(&self, receipt_id: &str) -> Result<Vec<Reservation>> {
        // "r-1" is also a prefix of "r-10"; keep exact matches only.
        Ok(self
            .load_indexed(CF_RECEIPT_INDEX, receipt_id.as_bytes())?
            .into_iter()
            .filter(|r| r.payment.receipt_id == receipt_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reservation::{Cost, Payment, StayPeriod};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn confirmed(room: u64, user: u64, check_in: (u32, u32), check_out: (u32, u32)) -> Reservation {
        paid_with("receipt", room, user, check_in, check_out)
    }

    fn paid_with(
        receipt_id: &str,
        room: u64,
        user: u64,
        check_in: (u32, u32),
        check_out: (u32, u32),
    ) -> Reservation {
        let period = StayPeriod::new(
            NaiveDate::from_ymd_opt(2021, check_in.0, check_in.1).unwrap(),
            NaiveDate::from_ymd_opt(2021, check_out.0, check_out.1).unwrap(),
        )
        .unwrap();
        let mut reservation = Reservation::pending(
            RoomId(room),
            UserId(user),
            period,
            2,
            Cost::new(dec!(50000)).unwrap(),
            Payment::new(receipt_id),
            Utc::now(),
        );
        reservation.confirm().unwrap();
        reservation
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_RESERVATIONS).is_some());
        assert!(store.db.cf_handle(CF_ROOM_INDEX).is_some());
        assert!(store.db.cf_handle(CF_USER_INDEX).is_some());
        assert!(store.db.cf_handle(CF_RECEIPT_INDEX).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_room_index() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let first = confirmed(1, 1, (2, 1), (2, 5));
        let second = confirmed(1, 2, (2, 5), (2, 8));
        let other_room = confirmed(2, 1, (2, 1), (2, 5));
        for reservation in [&first, &second, &other_room] {
            store.save(reservation.clone()).await.unwrap();
        }

        let mut on_room = store.find_by_room(RoomId(1)).await.unwrap();
        on_room.sort_by_key(|r| r.check_in());
        assert_eq!(on_room, vec![first.clone(), second]);
        assert_eq!(store.find_by_id(first.id).await.unwrap(), Some(first));
        assert!(store.find_by_id(ReservationId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_user_listing_skips_cancelled() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let early = confirmed(1, 7, (3, 1), (3, 2));
        let late = confirmed(2, 7, (4, 1), (4, 2));
        let mut cancelled = confirmed(3, 7, (5, 1), (5, 2));
        cancelled.cancel("plans changed", Utc::now()).unwrap();
        for reservation in [&early, &late, &cancelled] {
            store.save(reservation.clone()).await.unwrap();
        }

        let page = store
            .find_by_user(UserId(7), PageRequest::new(1, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(page.total_items, 2);
        assert_eq!(page.items, vec![late, early]);
    }

    #[tokio::test]
    async fn test_rocksdb_survives_reopen() {
        let dir = tempdir().unwrap();
        let reservation = confirmed(1, 1, (2, 1), (2, 5));
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            store.save(reservation.clone()).await.unwrap();
        }

        let store = RocksDBStore::open(dir.path()).unwrap();
        assert_eq!(store.find_by_room(RoomId(1)).await.unwrap(), vec![reservation]);
    }

    #[tokio::test]
    async fn test_rocksdb_receipt_index_matches_exactly() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let short = paid_with("r-1", 1, 1, (2, 1), (2, 5));
        let long = paid_with("r-10", 2, 1, (2, 1), (2, 5));
        store.save(short.clone()).await.unwrap();
        store.save(long.clone()).await.unwrap();

        assert_eq!(store.find_by_receipt("r-1").await.unwrap(), vec![short]);
        assert_eq!(store.find_by_receipt("r-10").await.unwrap(), vec![long]);
        assert!(store.find_by_receipt("r-").await.unwrap().is_empty());
    }
}

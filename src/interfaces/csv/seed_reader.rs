use crate::domain::ids::{RoomId, UserId};
use crate::domain::listing::{Location, Room, User};
use crate::error::{ReservationError, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io::Read;

/// One line of a rooms seed file. Location columns are flattened.
#[derive(Debug, Deserialize)]
struct RoomRecord {
    id: u64,
    name: String,
    host_name: String,
    #[serde(default)]
    host_image: String,
    #[serde(default)]
    room_image: String,
    country: String,
    city: String,
    #[serde(default)]
    borough: String,
    #[serde(default)]
    neighborhood: String,
    #[serde(default)]
    detail_address: String,
    latitude: f64,
    longitude: f64,
    people_limit: u32,
    bed_num: u32,
    bedroom_num: u32,
    bathroom_num: u32,
    is_parking: bool,
    is_smoking: bool,
}

impl From<RoomRecord> for Room {
    fn from(record: RoomRecord) -> Self {
        Room {
            id: RoomId(record.id),
            name: record.name,
            host_name: record.host_name,
            host_image: record.host_image,
            room_image: record.room_image,
            location: Location {
                country: record.country,
                city: record.city,
                borough: record.borough,
                neighborhood: record.neighborhood,
                detail_address: record.detail_address,
                latitude: record.latitude,
                longitude: record.longitude,
            },
            people_limit: record.people_limit,
            bed_num: record.bed_num,
            bedroom_num: record.bedroom_num,
            bathroom_num: record.bathroom_num,
            is_parking: record.is_parking,
            is_smoking: record.is_smoking,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: u64,
    name: String,
    email: String,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            id: UserId(record.id),
            name: record.name,
            email: record.email,
        }
    }
}

/// Reads room and user seed data from a CSV source.
///
/// This reader wraps `csv::Reader` and yields one `Result` per row, so a
/// malformed line can be reported and skipped without stopping the load.
/// Whitespace around fields is trimmed.
pub struct SeedReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> SeedReader<R> {
    /// Creates a new `SeedReader` from any `Read` source (e.g., File).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    fn records<T, U>(self) -> impl Iterator<Item = Result<U>>
    where
        T: DeserializeOwned,
        U: From<T>,
    {
        self.reader
            .into_deserialize::<T>()
            .map(|result| result.map(U::from).map_err(ReservationError::from))
    }

    /// Lazily reads rooms, one per row.
    pub fn rooms(self) -> impl Iterator<Item = Result<Room>> {
        self.records::<RoomRecord, Room>()
    }

    /// Lazily reads users, one per row.
    pub fn users(self) -> impl Iterator<Item = Result<User>> {
        self.records::<UserRecord, User>()
    }
}

use super::ids::{RoomId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub country: String,
    pub city: String,
    pub borough: String,
    pub neighborhood: String,
    pub detail_address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Single-line postal address, skipping empty parts.
    pub fn address(&self) -> String {
        [
            &self.country,
            &self.city,
            &self.borough,
            &self.neighborhood,
            &self.detail_address,
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| part.as_str())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// A bookable room as seen by the reservation workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub host_name: String,
    pub host_image: String,
    pub room_image: String,
    pub location: Location,
    /// Maximum number of guests.
    pub people_limit: u32,
    pub bed_num: u32,
    pub bedroom_num: u32,
    pub bathroom_num: u32,
    pub is_parking: bool,
    pub is_smoking: bool,
}

//! Domain model: reservations, the rooms and users they reference, and the
//! ports the admission engine talks to.

pub mod clock;
pub mod ids;
pub mod listing;
pub mod page;
pub mod ports;
pub mod reservation;

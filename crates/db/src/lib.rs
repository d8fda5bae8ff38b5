pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{connect_with_settings, ping, DbPool};
pub use repositories::{
    ActivityRepository, InMemoryActivityRepository, InMemoryItineraryRepository,
    InMemorySequenceSource, ItineraryRepository, RepositoryError, SqlActivityRepository,
    SqlItineraryRepository, SqlSequenceSource, StoredItinerary,
};

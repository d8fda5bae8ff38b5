pub mod activity;
pub mod guide;
pub mod itinerary;

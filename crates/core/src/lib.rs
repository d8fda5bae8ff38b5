pub mod config;
pub mod domain;
pub mod errors;
pub mod identifier;
pub mod model_output;
pub mod reconcile;
pub mod resolver;
pub mod response;

pub use domain::activity::{ActivityDocument, ActivityId, ActivityRecord};
pub use domain::guide::{GuideQuery, GuideRequest};
pub use domain::itinerary::{ActivityEntry, Itinerary, ItineraryDay};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use identifier::{GuideId, IdentifierGenerator, SequenceSource};
pub use model_output::parse_model_output;
pub use reconcile::{reconcile, Reconciliation};
pub use resolver::{ActivityLookup, ActivityResolver, ResolvedActivities};
pub use response::{assemble_response, GuideEnvelope};

//! Itinerary reconciliation.
//!
//! The model proposes activities by id and name only. Reconciliation keeps the
//! entries whose id resolves to a canonical activity, drops the rest, and
//! attaches the canonical attributes to every survivor. Day structure and
//! ordering are preserved, including days that end up empty.

use crate::domain::itinerary::{ActivityDetails, ActivityEntry, Itinerary, ItineraryDay};
use crate::resolver::ResolvedActivities;

#[derive(Clone, Debug, PartialEq)]
pub struct Reconciliation {
    pub itinerary: Itinerary,
    pub dropped: Vec<ActivityEntry>,
}

impl Reconciliation {
    pub fn kept(&self) -> usize {
        self.itinerary.activity_count()
    }
}

pub fn reconcile(itinerary: Itinerary, resolved: &ResolvedActivities) -> Reconciliation {
    let mut dropped = Vec::new();

    let days = itinerary
        .days
        .into_iter()
        .map(|day| {
            let mut activities = Vec::with_capacity(day.activities.len());
            for entry in day.activities {
                match enrich(&entry, resolved) {
                    Some(enriched) => activities.push(enriched),
                    None => dropped.push(entry),
                }
            }
            ItineraryDay { day: day.day, activities }
        })
        .collect();

    Reconciliation { itinerary: Itinerary::new(days), dropped }
}

fn enrich(entry: &ActivityEntry, resolved: &ResolvedActivities) -> Option<ActivityEntry> {
    let principal_id = entry.principal_id.as_ref()?;
    let record = resolved.get(principal_id)?;

    Some(ActivityEntry {
        principal_id: Some(principal_id.clone()),
        name: entry.name.clone(),
        details: Some(ActivityDetails::from(record)),
    })
}

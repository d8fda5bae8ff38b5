use tera::{Context, Tera};
use thiserror::Error;

use tutur_core::domain::guide::GuideQuery;

use crate::retrieval::KnowledgeDocument;

const GUIDE_TEMPLATE_NAME: &str = "guide_prompt.txt";

const GUIDE_TEMPLATE: &str = r#"You are a travel assistant specialised in {{ group | default(value="family") }} tourism in {{ city }}, {{ country }}.
Build a personalised tourist itinerary for a group made up of {{ participants }}.
Activities must belong to these categories: {{ activities }}. The itinerary runs from {{ start }} to {{ end }}.

Rules:
- Only propose places inside {{ city }}. This is mandatory. Never include activities from other cities.
- Every place must match the requested categories: {{ activities }}.
- Every place must be open on the selected dates and hours; respect each opening schedule.
- The estimated time of all activities in one day must add up to at most 10 hours.
- Prefer the places that best fit the group by popularity, reviews and suitability.
- Consecutive activities must be at most 5 km apart in a straight line.
- Split the itinerary by day, numbered from 1 to N.
- If there are not enough suitable activities, stop the guide at that point instead of filling time.
- Never repeat an activity.

Additional data:
Start: {{ start }}
End: {{ end }}
Participants: {{ participants }}
{% if knowledge | length > 0 %}
Knowledge base (use only these places):
{% for doc in knowledge -%}
- principalId: {{ doc.principal_id }} | name: {{ doc.name }} | estimated time: {{ doc.estimated_time }} | opening hours: {{ doc.opening_hours }} | score: {{ doc.total_score }} ({{ doc.reviews_count }} reviews) | location: {{ doc.latitude }},{{ doc.longitude }}
{% endfor -%}
{% endif %}
For every place return exactly two attributes and nothing else:
- principalId: taken from the knowledge base, never invented
- name: taken from the knowledge base, never invented

Answer with JSON only, keys in lower camel case, wrapped in a parent object named "itinerary" holding the array of days, each day shaped as {"day": <n>, "activities": [{"principalId": "...", "name": "..."}]}.
"#;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt template is invalid: {0}")]
    Template(#[source] tera::Error),
    #[error("prompt rendering failed: {0}")]
    Render(#[source] tera::Error),
}

pub struct PromptRenderer {
    tera: Tera,
}

impl PromptRenderer {
    pub fn new() -> Result<Self, PromptError> {
        let mut tera = Tera::default();
        tera.add_raw_template(GUIDE_TEMPLATE_NAME, GUIDE_TEMPLATE).map_err(PromptError::Template)?;
        Ok(Self { tera })
    }

    pub fn render(
        &self,
        query: &GuideQuery,
        knowledge: &[KnowledgeDocument],
    ) -> Result<String, PromptError> {
        let mut context = Context::new();
        context.insert("country", &query.country);
        context.insert("city", &query.city);
        if !query.group.is_empty() {
            context.insert("group", &query.group);
        }
        context.insert("participants", &query.participants_text());
        context.insert("activities", &query.activities_text());
        context.insert("start", &query.start_text());
        context.insert("end", &query.end_text());
        context.insert("knowledge", knowledge);

        self.tera.render(GUIDE_TEMPLATE_NAME, &context).map_err(PromptError::Render)
    }
}

/// Organization-wide analytics
///
/// ```text
/// GET /api/analytics?from=2025-01-01&to=2025-06-30
/// ```
///
/// `from`/`to` bound event dates and registration dates (both inclusive).
/// Per-event analytics live at `GET /api/events/:id/analytics`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiQuery,
    response::{self, JsonResponse},
};
use axum::extract::State;
use chrono::Utc;
use hearth_shared::{
    analytics,
    models::{
        event::{DateRange, Event},
        registration::Registration,
    },
};

pub async fn summary(
    State(state): State<AppState>,
    ApiQuery(range): ApiQuery<DateRange>,
) -> ApiResult<JsonResponse> {
    if let (Some(from), Some(to)) = (range.from, range.to) {
        if from > to {
            return Err(ApiError::invalid("from", "`from` must not be after `to`"));
        }
    }

    let events = Event::list_in_range(&state.db, &range).await?;
    let registrations = Registration::list_for_analytics(&state.db, None, &range).await?;

    tracing::debug!(
        events = events.len(),
        registrations = registrations.len(),
        "Computing analytics"
    );

    let today = Utc::now().date_naive();
    response::ok(
        "analytics",
        analytics::organization_summary(&events, &registrations, today),
    )
}

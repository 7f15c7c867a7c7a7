use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Extension;
use futures_util::stream::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tracing::instrument;

use crate::state::{AppState, CredentialContext};

/// SSE fan-out endpoint. Delivery is fire-and-forget: a lagging client
/// (its bounded channel full) silently drops the oldest notifications
/// rather than applying backpressure to the hub — per spec.md §4.2, a
/// slow subscriber must never block delivery to the others.
#[instrument(skip_all, fields(project_id = %context.project_id))]
pub async fn stream(
    State(state): State<AppState>,
    Extension(context): Extension<CredentialContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.notification_hub.subscribe(&context.project_id);
    let stream = BroadcastStream::new(receiver).filter_map(|item| match item {
        Ok(notification) => serde_json::to_string(&notification).ok().map(|json| Ok(Event::default().data(json))),
        // A lagged receiver means we dropped notifications under load;
        // skip the gap rather than erroring the whole connection.
        Err(_lagged) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("keep-alive"))
}

//! SSE framing for [`ProgressStream`]: one `data: {json}` frame per event.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use nodes::ProgressStream;

/// Frames each event as JSON `data`, with the default keep-alive comment.
pub fn event_stream(progress: ProgressStream) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    Sse::new(progress.map(|event| Event::default().json_data(event))).keep_alive(KeepAlive::default())
}

//! SSE 端點：訂閱 EventHub，把事件轉成 Server-Sent Events 推給前端。

use crate::web::AppState;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

pub async fn stream_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.hub.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(value) => {
            let event_type = value
                .get("type")
                .and_then(|t| t.as_str())
                .unwrap_or("message")
                .to_string();
            Some(Ok(Event::default().event(event_type).data(value.to_string())))
        }
        // 訂閱者落後太多時 broadcast 會丟事件；告知前端而不是斷線
        Err(BroadcastStreamRecvError::Lagged(missed)) => Some(Ok(Event::default()
            .event("lagged")
            .data(format!("{{\"missed\":{}}}", missed)))),
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

//! Server-Sent Events (SSE) stream of alarm edges and actuator commands.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use homeguard_app::ports::{ActuatorStateStore, AlarmEventStore, SensorReadingStore};
use homeguard_domain::event::EventType;

use crate::state::AppState;

/// `GET /api/events/stream`: one JSON `data:` frame per hub event.
///
/// A subscriber that falls behind skips the events it missed; the stream
/// itself stays open until the client disconnects.
pub async fn stream<AS, RS, SS>(
    State(state): State<AppState<AS, RS, SS>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    let event_rx = state.event_bus.subscribe();
    let event_stream = BroadcastStream::new(event_rx).filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json) => Some(Ok(Event::default()
                .event(event_name(event.event_type))
                .data(json))),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize event for SSE stream");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE subscriber lagged, events dropped");
            None
        }
    });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}

fn event_name(event_type: EventType) -> &'static str {
    match event_type {
        EventType::AlarmChanged => "alarm_changed",
        EventType::ActuatorCommanded => "actuator_commanded",
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use homeguard_app::ports::EventPublisher;
    use homeguard_domain::event::Event as HubEvent;

    use crate::test_support::TestApp;

    use super::*;

    #[tokio::test]
    async fn should_subscribe_to_event_bus_when_stream_created() {
        let app = TestApp::new();
        let mut rx = app.state.event_bus.subscribe();

        let _sse = stream(State(app.state.clone())).await;
        let event = HubEvent::new(
            EventType::AlarmChanged,
            serde_json::json!({ "event": "on", "reason": "manual" }),
        );
        let id = event.id;
        app.state.event_bus.publish(event).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, id);
        assert_eq!(received.event_type, EventType::AlarmChanged);
    }

    #[test]
    fn should_name_events_after_their_type() {
        assert_eq!(event_name(EventType::AlarmChanged), "alarm_changed");
        assert_eq!(
            event_name(EventType::ActuatorCommanded),
            "actuator_commanded"
        );
    }

    #[tokio::test]
    async fn should_respond_with_event_stream_content_type() {
        let app = TestApp::new();
        let request = axum::http::Request::builder()
            .method(Method::GET)
            .uri("/api/events/stream")
            .body(axum::body::Body::empty())
            .unwrap();

        let response = tower::ServiceExt::oneshot(crate::router::build(app.state.clone()), request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/event-stream"
        );
    }
}

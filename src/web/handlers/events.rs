use futures::stream;
use salvo::prelude::*;
use salvo::sse::{self, SseEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::web::web_state;

use super::{current_user, render_chat_error, render_error};

/// Live room events as server-sent events. A subscriber that falls behind
/// the broadcast buffer skips the gap and keeps streaming; it is never
/// disconnected for being slow.
#[handler]
pub async fn room_events(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(user) = current_user(depot, res) else {
        return;
    };
    let Some(room_id) = req.param::<String>("room_id") else {
        render_error(res, StatusCode::BAD_REQUEST, "missing room id");
        return;
    };

    // Membership gate before any channel is handed out.
    if let Err(err) = web_state()
        .chat
        .get_room_for_user(&room_id, &user.user_id)
        .await
    {
        render_chat_error(res, &err);
        return;
    }

    let rx = web_state().chat.hub().subscribe(&room_id);
    let event_stream = stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!(error = %err, "dropping unserializable room event");
                            continue;
                        }
                    };
                    let sse_event = SseEvent::default().name(event.name()).text(payload);
                    return Some((Ok::<SseEvent, salvo::Error>(sse_event), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event subscriber lagged, skipping ahead");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    sse::stream(res, event_stream);
}

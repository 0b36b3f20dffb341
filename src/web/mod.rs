use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use once_cell::sync::OnceCell;
use salvo::prelude::*;
use tracing::info;

use crate::ai::OpenAiClient;
use crate::blog::BlogComposer;
use crate::chain::ChainRegistry;
use crate::chat::ChatCore;
use crate::config::Config;
use crate::db::DatabaseManager;

pub mod auth;
pub mod handlers;
pub mod metrics;
pub mod middleware;

use self::auth::TokenVerifier;
use self::handlers::{admin, ai, events, health, messages, notifications, pitch, projects, rooms};
use self::middleware::auth::require_auth;

pub struct WebState {
    pub config: Arc<Config>,
    pub chat: ChatCore,
    pub db: Arc<DatabaseManager>,
    pub verifier: TokenVerifier,
    pub blog: BlogComposer,
    pub chain: ChainRegistry,
    pub started_at: Instant,
}

static WEB_STATE: OnceCell<WebState> = OnceCell::new();

pub fn web_state() -> &'static WebState {
    WEB_STATE
        .get()
        .expect("web state is not initialized before handler execution")
}

pub struct WebServer {
    config: Arc<Config>,
}

impl WebServer {
    pub async fn new(
        config: Arc<Config>,
        chat: ChatCore,
        db: Arc<DatabaseManager>,
    ) -> Result<Self> {
        let verifier = TokenVerifier::new(config.auth.token_secret.clone());
        let blog = BlogComposer::new(OpenAiClient::new(&config.ai), &config.publisher);
        let chain = ChainRegistry::new(config.chain.clone());

        let _ = WEB_STATE.set(WebState {
            config: config.clone(),
            chat,
            db,
            verifier,
            blog,
            chain,
            started_at: Instant::now(),
        });

        Ok(Self { config })
    }

    pub async fn start(&self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.config.server.bind_address, self.config.server.port
        );
        info!("starting web server on {}", bind_addr);

        let acceptor = TcpListener::new(bind_addr).bind().await;
        Server::new(acceptor).serve(create_router()).await;

        Ok(())
    }
}

pub fn create_router() -> Router {
    Router::with_path("api")
        .push(Router::with_path("health").get(health::health_check))
        .push(Router::with_path("status").get(health::get_status))
        .push(Router::with_path("metrics").get(health::metrics_endpoint))
        .push(
            Router::new()
                .hoop(require_auth)
                .push(Router::with_path("agency/accept-pitch").post(pitch::accept_pitch_agency))
                .push(Router::with_path("ido/accept-pitch").post(pitch::accept_pitch_ido))
                .push(
                    Router::with_path("rooms")
                        .get(rooms::list_my_rooms)
                        .push(
                            Router::with_path("{room_id}")
                                .get(rooms::get_room)
                                .push(Router::with_path("status").post(rooms::set_room_status))
                                .push(Router::with_path("events").get(events::room_events))
                                .push(
                                    Router::with_path("messages")
                                        .get(messages::list_messages)
                                        .post(messages::send_message)
                                        .push(
                                            Router::with_path("{message_id}")
                                                .patch(messages::edit_message)
                                                .delete(messages::delete_message)
                                                .push(
                                                    Router::with_path("reactions")
                                                        .post(messages::toggle_reaction),
                                                )
                                                .push(
                                                    Router::with_path("read")
                                                        .post(messages::mark_message_read),
                                                )
                                                .push(
                                                    Router::with_path("pin")
                                                        .post(messages::toggle_pin),
                                                ),
                                        ),
                                ),
                        ),
                )
                .push(
                    Router::with_path("notifications")
                        .get(notifications::list_notifications)
                        .push(
                            Router::with_path("{notification_id}/read")
                                .post(notifications::mark_notification_read),
                        ),
                )
                .push(Router::with_path("ai/vc-command").post(ai::vc_command))
                .push(
                    Router::with_path("projects")
                        .get(projects::list_projects)
                        .push(
                            Router::with_path("{project_id}/attestation")
                                .get(projects::project_attestation),
                        ),
                )
                .push(
                    Router::with_path("admin")
                        .push(
                            Router::with_path("create-demo-projects")
                                .post(admin::create_demo_projects),
                        )
                        .push(Router::with_path("compose-blog").post(admin::compose_blog)),
                ),
        )
}

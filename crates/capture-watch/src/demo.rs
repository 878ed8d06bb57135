//! Scripted session over simulated tabs.
//!
//! Drives three tabs through the capture patterns the pipeline has to get
//! right and logs what the consumer sees after every step:
//! - tab 1: a camera call that hangs up
//! - tab 2: a screen recording whose screen share ends before the recorder
//! - tab 3: a canvas published to a peer connection, then the tab is closed

use crate::{
    AppCommand, AppError, AppResult, BadgeIndicator, QueryConsumer, TabSessions,
    config::DemoConfig,
};

use capture_watch_core::{
    TabId,
    host::{HostEnvironment, MediaElement, PeerConnection, sim},
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use serde_json::json;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, instrument};

const CAMERA_TAB: TabId = TabId(1);
const SCREEN_TAB: TabId = TabId(2);
const CANVAS_TAB: TabId = TabId(3);

/// The scripted demo.
pub struct DemoSession {
    pub(crate) sessions: Arc<Mutex<TabSessions>>,
    pub(crate) consumer: QueryConsumer,
    pub(crate) badges: Arc<BadgeIndicator>,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) config: DemoConfig,
}

impl DemoSession {
    /// Run every scenario in order.
    #[instrument(skip(self))]
    pub async fn run(self) -> AppResult<()> {
        info!(step_delay_ms = self.config.step_delay_ms, "Demo session starting");

        self.camera_call().await?;
        self.screen_recording().await?;
        self.published_canvas().await?;

        info!("Demo session finished");

        if self.config.exit_when_done {
            self.send(AppCommand::Shutdown).await?;
        }

        Ok(())
    }

    async fn camera_call(&self) -> AppResult<()> {
        let host = self.open(CAMERA_TAB).await?;

        let stream = host
            .get_user_media(json!({ "audio": true, "video": true }))
            .await?;
        self.step(CAMERA_TAB, "camera and microphone live").await;

        stream.stop();
        self.step(CAMERA_TAB, "call hung up").await;

        Ok(())
    }

    async fn screen_recording(&self) -> AppResult<()> {
        let host = self.open(SCREEN_TAB).await?;

        let screen = host.get_display_media(json!({ "video": true })).await?;
        let recorder =
            host.new_recorder(Some(screen.clone()), json!({ "mimeType": "video/webm" }))?;
        recorder.start();
        self.step(SCREEN_TAB, "screen shared and recorded").await;

        screen.stop();
        self.step(SCREEN_TAB, "screen share ended, recorder still draining")
            .await;

        recorder.stop();
        self.step(SCREEN_TAB, "recorder stopped").await;

        Ok(())
    }

    async fn published_canvas(&self) -> AppResult<()> {
        let host = self.open(CANVAS_TAB).await?;

        let element = MediaElement {
            tag_name: "CANVAS".to_string(),
            id: Some("whiteboard".to_string()),
            class_name: Some("shared".to_string()),
        };
        let stream = host.capture_stream(&element, Some(30.0))?;
        if let Some(track) = stream.tracks().first() {
            host.add_track(&PeerConnection::new(), track, std::slice::from_ref(&stream))?;
        }
        self.step(CANVAS_TAB, "canvas captured and published").await;

        self.send(AppCommand::CloseTab { tab_id: CANVAS_TAB }).await?;
        self.step(CANVAS_TAB, "tab closed").await;

        Ok(())
    }

    async fn open(&self, tab_id: TabId) -> AppResult<HostEnvironment> {
        self.sessions
            .lock()
            .await
            .open_tab(tab_id, sim::full_host())
            .await
    }

    async fn send(&self, command: AppCommand) -> AppResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send {:?}", e.0),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Let the pipeline settle, then log what the consumer shows.
    async fn step(&self, tab_id: TabId, step: &str) {
        tokio::time::sleep(self.config.step_delay()).await;

        let cached = self.consumer.refresh(tab_id).await;
        let live = self.consumer.ask_page(tab_id).await;

        info!(
            tab_id = %tab_id,
            step,
            badge = %self.badges.describe(tab_id),
            cached = %cached.headline,
            live = %live.headline,
            "Demo step"
        );
        debug!(tab_id = %tab_id, "Cached view:\n{}", cached.render());
    }
}

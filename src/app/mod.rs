#![allow(clippy::arc_with_non_send_sync)]

use crate::api::{ApiServer, ApiState, SessionApiState, SessionCommand};
use crate::config::Config;
use crate::identity::StaticTokenProvider;
use crate::model::build_model;
use crate::pipeline::SopGenerator;
use crate::session::{MicCapture, RecordingMachine, SessionStatusHandle};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

pub async fn run_service() -> Result<()> {
    info!("Starting VoiceSOP service");

    let config = Config::load()?;

    // Warm the database (and its schema) before serving requests.
    crate::db::init_db()?;

    let model = build_model(&config.model)?;
    let generator = Arc::new(SopGenerator::new(model, config.quota.free_monthly_limit));

    let identity = Arc::new(StaticTokenProvider::new(&config.accounts));

    // The cpal stream is !Send, so the machine lives on this task and the
    // API reaches it through a command channel.
    let (tx, mut rx) = mpsc::channel::<SessionCommand>(10);
    let status = SessionStatusHandle::default();
    let capture = Box::new(MicCapture::new(config.recording.sample_rate));
    let mut machine = RecordingMachine::new(capture, None, status.clone());

    let api_server = ApiServer::new(
        ApiState {
            identity,
            generator,
            session: SessionApiState { tx, status },
            free_monthly_limit: config.quota.free_monthly_limit,
        },
        &config,
    );
    tokio::spawn(async move {
        if let Err(e) = api_server.start().await {
            error!("API server failed: {}", e);
        }
    });

    info!("VoiceSOP is ready!");
    info!(
        "Try: curl -X POST http://{}:{}/session/start",
        config.server.bind, config.server.port
    );

    while let Some(command) = rx.recv().await {
        match command {
            SessionCommand::Start(reply) => {
                let result = machine.start().await;
                if let Err(e) = &result {
                    error!("Failed to start session: {}", e);
                }
                let _ = reply.send(result);
            }
            SessionCommand::Stop(reply) => {
                let result = machine.stop().await;
                match &result {
                    Ok(summary) => info!(
                        "Recording stopped after {}s ({} transcript chars)",
                        summary.elapsed_seconds,
                        summary.transcript.len()
                    ),
                    Err(e) => error!("Failed to stop session: {}", e),
                }
                let _ = reply.send(result);
            }
            SessionCommand::Reset(reply) => {
                let _ = reply.send(machine.reset().await);
            }
            SessionCommand::Pause(reply) => {
                let _ = reply.send(machine.pause().await);
            }
            SessionCommand::Resume(reply) => {
                let _ = reply.send(machine.resume().await);
            }
            SessionCommand::SetTranscript(text, reply) => {
                let _ = reply.send(machine.set_transcript(&text).await);
            }
            SessionCommand::Finish(reply) => {
                let _ = reply.send(machine.finish().await);
            }
        }
    }

    Ok(())
}

//! # sensord: edge telemetry daemon
//!
//! Composition root for the edge device.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Connect the MQTT transport and spawn the telemetry publisher
//! - Drive the sampler until Ctrl-C or a fatal sensor error
//! - Drain the publisher outbox and disconnect from the broker on shutdown
//!
//! ## Dependency rule
//! This is the wiring layer for the edge side. No domain logic belongs here.

mod config;

use std::time::Duration;

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use sensorlink_adapter_mqtt::{MqttConnection, MqttTransport};
use sensorlink_adapter_virtual::VirtualSensor;
use sensorlink_app::services::publisher::TelemetryPublisher;
use sensorlink_app::services::sampler::Sampler;

use crate::config::Config;

const EVENT_LOOP_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    init_tracing(&config.logging.filter);

    let device_id = config.device_id()?;

    // Transport
    let MqttConnection {
        transport,
        lifecycle,
        event_loop,
    } = MqttTransport::connect(&config.mqtt)?;

    // Publisher
    let (outbox_tx, outbox_rx) = mpsc::channel(config.sampling.outbox_capacity);
    let publisher =
        TelemetryPublisher::new(transport.clone(), config.retry.clone()).with_lifecycle(lifecycle);
    let publisher_task = tokio::spawn(publisher.run(outbox_rx));

    // Sampler
    let sensor = VirtualSensor::new(config.sensor.clone());
    let mut sampler = Sampler::new(sensor, device_id, config.interval(), outbox_tx)?;

    let outcome = tokio::select! {
        result = sampler.run() => result,
        () = shutdown_signal() => {
            tracing::info!("shutdown requested, draining outbox");
            Ok(())
        }
    };

    // Dropping the sampler closes the outbox so the publisher finishes.
    drop(sampler);
    if let Err(err) = publisher_task.await {
        tracing::error!(%err, "publisher task failed");
    }
    if let Err(err) = transport.disconnect().await {
        tracing::warn!(%err, "failed to disconnect from MQTT broker");
    }
    event_loop.join(EVENT_LOOP_SHUTDOWN_TIMEOUT).await;

    outcome?;
    tracing::info!("sensord stopped");
    Ok(())
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {filter:?} ({err}), falling back to info");
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

//! Live progress for one simulation.

use anyhow::{Context, Result, bail};
use riskdash_client::ApiClient;
use riskdash_realtime::prelude::{
    RealtimeClient, SimulationProgress, SimulationStatusUpdate, TungsteniteConnector, events,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Prints progress and status events for `id` until the run reaches a terminal status.
pub async fn watch(client: &ApiClient, id: Uuid) -> Result<()> {
    let simulation = client
        .simulations()
        .get(id)
        .await
        .context("Failed to fetch simulation")?;
    println!("{} [{}] {:.0}%", simulation.name, simulation.status, simulation.progress_percent());
    if simulation.status.is_terminal() {
        return Ok(());
    }

    let realtime = client.realtime(Arc::new(TungsteniteConnector));
    let result = follow(&realtime, &id.to_string()).await;
    realtime.shutdown().await;
    result
}

async fn follow(realtime: &RealtimeClient, simulation_id: &str) -> Result<()> {
    let mut connected = realtime.stream(events::CONNECTED);
    let mut progress = realtime.stream(events::SIMULATION_PROGRESS);
    let mut status = realtime.stream(events::SIMULATION_STATUS);
    let mut gave_up = realtime.stream(events::RECONNECT_FAILED);

    realtime.connect(None).await?;

    loop {
        tokio::select! {
            Some(_) = connected.recv() => {
                // Subscriptions do not survive a reconnect.
                if !realtime.subscribe_simulation(simulation_id)? {
                    warn!(simulation_id, "Socket closed before subscribing");
                }
            }
            Some(payload) = progress.recv() => {
                if let Some(update) = parse::<SimulationProgress>(payload, simulation_id) {
                    println!(
                        "{:>5.1}% {}",
                        update.percentage,
                        update.message.unwrap_or_default()
                    );
                }
            }
            Some(payload) = status.recv() => {
                if let Some(update) = parse::<SimulationStatusUpdate>(payload, simulation_id) {
                    println!("Status: {}", update.status);
                    if let Some(message) = &update.message {
                        println!("  {message}");
                    }
                    if update.status.is_terminal() {
                        let _ = realtime.unsubscribe_simulation(simulation_id);
                        return Ok(());
                    }
                }
            }
            Some(_) = gave_up.recv() => {
                bail!("Lost connection to the live update service");
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Stopped watching");
                return Ok(());
            }
        }
    }
}

/// Decodes `payload` and keeps it only if it is about `simulation_id`.
fn parse<T>(payload: Value, simulation_id: &str) -> Option<T>
where
    T: serde::de::DeserializeOwned + HasSimulationId,
{
    match serde_json::from_value::<T>(payload) {
        Ok(update) if update.simulation_id() == simulation_id => Some(update),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "Ignoring malformed event");
            None
        }
    }
}

trait HasSimulationId {
    fn simulation_id(&self) -> &str;
}

impl HasSimulationId for SimulationProgress {
    fn simulation_id(&self) -> &str {
        &self.simulation_id
    }
}

impl HasSimulationId for SimulationStatusUpdate {
    fn simulation_id(&self) -> &str {
        &self.simulation_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_filters_other_simulations() {
        let payload = json!({ "simulation_id": "42", "percentage": 37.5 });
        let update = parse::<SimulationProgress>(payload.clone(), "42").unwrap();
        assert_eq!(update.percentage, 37.5);
        assert!(parse::<SimulationProgress>(payload, "7").is_none());
        assert!(parse::<SimulationStatusUpdate>(json!({ "simulation_id": "42" }), "42").is_none());
    }
}

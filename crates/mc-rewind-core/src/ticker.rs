//! Periodic tick driver for every open session.

use std::sync::Arc;

use mc_rewind_proto::Packet;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::config::RewindConfig;
use crate::session::{SessionId, SessionRegistry};

/// Tick `registry` at the configured interval and forward what each session emits.
///
/// The task ends once the receiving side of `sink` is dropped.
pub fn spawn_ticker(
    registry: Arc<SessionRegistry>,
    config: &RewindConfig,
    sink: mpsc::Sender<(SessionId, Vec<Packet>)>,
) -> JoinHandle<()> {
    let period = config.tick_interval();
    debug!("Ticking sessions every {period:?}");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                instant = interval.tick() => {
                    for output in registry.tick(instant.into_std()) {
                        if sink.send(output).await.is_err() {
                            debug!("Tick output receiver dropped, stopping ticker");
                            return;
                        }
                    }
                }
                _ = sink.closed() => {
                    debug!("Tick output receiver dropped, stopping ticker");
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::CooldownIndicator;
    use crate::cooldown::Cooldown;
    use crate::protocol::ProtocolPair;
    use crate::session::Session;
    use mc_rewind_proto::packets::v1_8;

    #[tokio::test]
    async fn ticks_reach_the_sink() {
        let registry = Arc::new(SessionRegistry::new());
        let config = Arc::new(RewindConfig {
            cooldown_indicator: CooldownIndicator::ActionBar,
            tick_interval_ms: 5,
            ..RewindConfig::default()
        });
        let (id, session) =
            registry.open(Session::new(ProtocolPair::V1_9To1_8, "Steve", config.clone()));
        {
            let mut session = session.lock().unwrap();
            // a swing 100 ms ago is mid-cooldown at speed 4
            let swing = std::time::Instant::now() - Duration::from_millis(100);
            session.get::<Cooldown>().hit(swing);
        }

        let (tx, mut rx) = mpsc::channel(16);
        let handle = spawn_ticker(registry.clone(), &config, tx);

        let (from, packets) = rx.recv().await.unwrap();
        assert_eq!(from, id);
        assert_eq!(packets[0].id, v1_8::clientbound::CHAT_MESSAGE);

        drop(rx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn idle_sessions_send_nothing() {
        let registry = Arc::new(SessionRegistry::new());
        let config = Arc::new(RewindConfig {
            tick_interval_ms: 5,
            ..RewindConfig::default()
        });
        registry.open(Session::new(ProtocolPair::V1_9To1_8, "Alex", config.clone()));
        let (tx, mut rx) = mpsc::channel(16);
        let handle = spawn_ticker(registry, &config, tx);

        let waited = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(waited.is_err());

        drop(rx);
        handle.await.unwrap();
    }
}

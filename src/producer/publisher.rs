//! MQTT link to the broker, authenticated with a mutual-TLS credential set.

use std::{future::Future, path::Path, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
    TlsConfiguration, Transport,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::ProducerConfig;

const KEEP_ALIVE: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DISCONNECT_GRACE: Duration = Duration::from_secs(5);
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

// ---

/// Something readings can be published to.
pub trait Publish {
    fn publish(&self, topic: &str, payload: &str) -> impl Future<Output = Result<()>> + Send;
}

/// A connected broker client plus the task driving its network I/O.
pub struct BrokerLink {
    client: AsyncClient,
    network: JoinHandle<()>,
}

/// Connect to the broker and wait for its CONNACK.
///
/// Unreadable credentials, a refused connection or no answer within
/// `CONNECT_TIMEOUT` are errors; the producer treats them as fatal.
pub async fn connect(cfg: &ProducerConfig) -> Result<BrokerLink> {
    // ---
    let ca = read_pem(&cfg.ca_cert_path, "CA certificate")?;
    let client_cert = read_pem(&cfg.client_cert_path, "client certificate")?;
    let client_key = read_pem(&cfg.client_key_path, "client private key")?;

    let mut options = MqttOptions::new(&cfg.client_id, &cfg.broker_address, cfg.broker_port);
    options.set_keep_alive(KEEP_ALIVE);
    options.set_transport(Transport::Tls(TlsConfiguration::Simple {
        ca,
        alpn: None,
        client_auth: Some((client_cert, client_key)),
    }));

    info!(
        "Connecting to broker {}:{} as {}",
        cfg.broker_address, cfg.broker_port, cfg.client_id
    );
    let (client, mut eventloop) = AsyncClient::new(options, 64);

    tokio::time::timeout(CONNECT_TIMEOUT, wait_for_connack(&mut eventloop))
        .await
        .map_err(|_| {
            anyhow!(
                "Timed out connecting to broker {}:{}",
                cfg.broker_address,
                cfg.broker_port
            )
        })??;
    info!("Connected to broker");

    let network = tokio::spawn(drive(eventloop));
    Ok(BrokerLink { client, network })
}

impl BrokerLink {
    /// Send DISCONNECT and stop the network task.
    pub async fn disconnect(mut self) {
        // ---
        if let Err(e) = self.client.disconnect().await {
            warn!("Failed to request disconnect: {}", e);
        }
        if tokio::time::timeout(DISCONNECT_GRACE, &mut self.network)
            .await
            .is_err()
        {
            debug!("Network task still busy after disconnect, aborting it");
            self.network.abort();
        }
        info!("Disconnected from broker");
    }
}

impl Publish for BrokerLink {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        // ---
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload.as_bytes().to_vec())
            .await
            .with_context(|| format!("Failed to queue publish on {}", topic))
    }
}

// ---

fn read_pem(path: &Path, what: &str) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {} '{}'", what, path.display()))
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<()> {
    // ---
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    return Ok(());
                }
                bail!("Broker refused connection: {:?}", ack.code);
            }
            Ok(event) => trace!("MQTT event before CONNACK: {:?}", event),
            Err(e) => bail!("Failed to connect to broker: {}", e),
        }
    }
}

/// Keep polling the event loop so queued publishes reach the broker.
///
/// Connection errors are logged and the next poll reconnects; the task ends
/// once our own DISCONNECT has gone out.
async fn drive(mut eventloop: EventLoop) {
    // ---
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::PubAck(ack))) => trace!("PUBACK {}", ack.pkid),
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("DISCONNECT sent, network task stopping");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("MQTT connection error: {}; reconnecting", e);
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

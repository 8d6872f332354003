//! Roster snapshot: the live connected-client list, filtered to real users.

use std::time::Duration;

use roster_core::{LiveClient, TransportError, VoiceTransport};

/// Bounded wait for the roster query.
pub const ROSTER_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetch the currently connected real users from the voice server.
///
/// Server-query and monitor connections are dropped. Returns an empty list
/// when nobody is connected; transport failures propagate verbatim, and a
/// query exceeding [`ROSTER_QUERY_TIMEOUT`] surfaces as
/// [`TransportError::Timeout`].
pub async fn fetch_online_clients(
    transport: &dyn VoiceTransport,
) -> Result<Vec<LiveClient>, TransportError> {
    let clients = tokio::time::timeout(ROSTER_QUERY_TIMEOUT, transport.client_list())
        .await
        .map_err(|_| TransportError::Timeout(ROSTER_QUERY_TIMEOUT))??;
    Ok(clients.into_iter().filter(LiveClient::is_regular).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::broadcast;

    use roster_core::{ClientType, PresenceEvent};

    struct FixedTransport {
        clients: Vec<LiveClient>,
        tx: broadcast::Sender<PresenceEvent>,
    }

    impl FixedTransport {
        fn new(clients: Vec<LiveClient>) -> Self {
            let (tx, _) = broadcast::channel(16);
            Self { clients, tx }
        }
    }

    #[async_trait]
    impl VoiceTransport for FixedTransport {
        async fn client_list(&self) -> Result<Vec<LiveClient>, TransportError> {
            Ok(self.clients.clone())
        }

        fn subscribe(&self) -> broadcast::Receiver<PresenceEvent> {
            self.tx.subscribe()
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl VoiceTransport for FailingTransport {
        async fn client_list(&self) -> Result<Vec<LiveClient>, TransportError> {
            Err(TransportError::NotConnected)
        }

        fn subscribe(&self) -> broadcast::Receiver<PresenceEvent> {
            broadcast::channel(1).1.resubscribe()
        }
    }

    fn live(unique_id: &str, client_type: ClientType) -> LiveClient {
        LiveClient {
            unique_id: unique_id.to_string(),
            nickname: "nick".to_string(),
            database_id: 1,
            created: 0,
            last_connected: 0,
            ip_address: None,
            platform: None,
            country: None,
            client_type,
        }
    }

    #[tokio::test]
    async fn filters_out_server_query_connections() {
        let transport = FixedTransport::new(vec![
            live("uid=a", ClientType::Regular),
            live("uid=query", ClientType::ServerQuery),
            live("uid=b", ClientType::Regular),
        ]);

        let online = fetch_online_clients(&transport).await.unwrap();
        assert_eq!(online.len(), 2);
        assert_eq!(online[0].unique_id, "uid=a");
        assert_eq!(online[1].unique_id, "uid=b");
    }

    #[tokio::test]
    async fn empty_roster_is_not_an_error() {
        let transport = FixedTransport::new(vec![]);
        let online = fetch_online_clients(&transport).await.unwrap();
        assert!(online.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let result = fetch_online_clients(&FailingTransport).await;
        assert!(matches!(result, Err(TransportError::NotConnected)));
    }
}

//! MQTT adapter error types.

use homeguard_domain::error::HomeGuardError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client rejected a request.
    #[error("MQTT client error")]
    Client(#[from] rumqttc::ClientError),

    /// The connection to the broker failed.
    #[error("MQTT connection error")]
    Connection(#[from] rumqttc::ConnectionError),

    /// Failed to parse an incoming MQTT payload as JSON.
    #[error("failed to parse MQTT payload")]
    PayloadParse(#[source] serde_json::Error),
}

impl MqttError {
    /// Convert into a [`HomeGuardError::Storage`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> HomeGuardError {
        HomeGuardError::Storage(Box::new(self))
    }
}

impl From<MqttError> for HomeGuardError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_payload_error_to_storage_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad").unwrap_err();
        let err: HomeGuardError = MqttError::PayloadParse(json_err).into();
        assert!(matches!(err, HomeGuardError::Storage(_)));
    }

    #[test]
    fn should_keep_client_error_as_source() {
        let options = rumqttc::MqttOptions::new("homeguard-test", "127.0.0.1", 1);
        let (client, _eventloop) = rumqttc::AsyncClient::new(options, 1);
        client
            .try_publish("a", rumqttc::QoS::AtMostOnce, false, "1")
            .unwrap();
        let client_err = client
            .try_publish("b", rumqttc::QoS::AtMostOnce, false, "2")
            .unwrap_err();

        let err: HomeGuardError = MqttError::from(client_err).into();
        let HomeGuardError::Storage(source) = err else {
            panic!("expected a storage error");
        };
        assert_eq!(source.to_string(), "MQTT client error");
    }

    #[test]
    fn should_display_payload_parse_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad").unwrap_err();
        let err = MqttError::PayloadParse(json_err);
        assert_eq!(err.to_string(), "failed to parse MQTT payload");
    }
}

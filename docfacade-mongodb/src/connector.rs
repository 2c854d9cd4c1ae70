//! Connection configuration for the MongoDB engine.

use async_trait::async_trait;
use mongodb::{
    Client,
    options::{ClientOptions, Credential},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use docfacade_core::{
    engine::EngineConnector,
    error::{FacadeError, FacadeResult},
};

use crate::store::MongoEngine;


/// Settings for reaching a MongoDB deployment.
///
/// Can be loaded from JSON with [`MongoConnectorConfig::from_json`]; every
/// field except `uri` is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MongoConnectorConfig {
    pub uri: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Database holding the user's credentials.
    #[serde(default)]
    pub auth_source: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
}

impl MongoConnectorConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            username: None,
            password: None,
            auth_source: None,
            app_name: None,
        }
    }

    pub fn from_json(json: &str) -> FacadeResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| FacadeError::Connection(format!("invalid connector configuration: {e}")))
    }
}


/// Builds a [`MongoEngine`] from a [`MongoConnectorConfig`].
///
/// # Example
///
/// ```ignore
/// use docfacade::{prelude::*, mongodb::MongoConnector};
///
/// let connector = MongoConnector::from_host("localhost", 27017)
///     .credentials("app", "secret")
///     .app_name("inventory")
///     .build();
///
/// let client = Client::connect(connector).await?;
/// ```
#[derive(Debug, Clone)]
pub struct MongoConnector {
    config: MongoConnectorConfig,
}

impl MongoConnector {
    pub fn new(config: MongoConnectorConfig) -> Self {
        Self { config }
    }

    /// Starts from a connection string such as `mongodb://localhost:27017`.
    pub fn builder(uri: impl Into<String>) -> MongoConnectorBuilder {
        MongoConnectorBuilder {
            config: MongoConnectorConfig::new(uri),
        }
    }

    /// Starts from a single host and port.
    pub fn from_host(host: &str, port: u16) -> MongoConnectorBuilder {
        Self::builder(format!("mongodb://{host}:{port}"))
    }

    pub fn config(&self) -> &MongoConnectorConfig {
        &self.config
    }

    async fn client_options(&self) -> FacadeResult<ClientOptions> {
        let mut options = ClientOptions::parse(&self.config.uri)
            .await
            .map_err(|e| FacadeError::Connection(e.to_string()))?;

        if let Some(app_name) = &self.config.app_name {
            options.app_name = Some(app_name.clone());
        }

        if let Some(username) = &self.config.username {
            let mut credential = Credential::default();
            credential.username = Some(username.clone());
            credential.password = self.config.password.clone();
            credential.source = self.config.auth_source.clone();

            options.credential = Some(credential);
        }

        Ok(options)
    }
}

#[async_trait]
impl EngineConnector for MongoConnector {
    type Engine = MongoEngine;

    async fn connect(self) -> FacadeResult<MongoEngine> {
        let options = self.client_options().await?;
        let hosts = options.hosts.len();

        let client = Client::with_options(options)
            .map_err(|e| FacadeError::Connection(e.to_string()))?;

        info!(hosts, "mongodb client created");

        Ok(MongoEngine::new(client))
    }
}


#[derive(Debug, Clone)]
pub struct MongoConnectorBuilder {
    config: MongoConnectorConfig,
}

impl MongoConnectorBuilder {
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self.config.password = Some(password.into());
        self
    }

    pub fn auth_source(mut self, database: impl Into<String>) -> Self {
        self.config.auth_source = Some(database.into());
        self
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.config.app_name = Some(app_name.into());
        self
    }

    pub fn build(self) -> MongoConnector {
        MongoConnector::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_host_builds_uri() {
        let connector = MongoConnector::from_host("db.internal", 27018)
            .credentials("app", "secret")
            .auth_source("admin")
            .app_name("inventory")
            .build();

        assert_eq!(connector.config().uri, "mongodb://db.internal:27018");
        assert_eq!(connector.config().username.as_deref(), Some("app"));
        assert_eq!(connector.config().auth_source.as_deref(), Some("admin"));
        assert_eq!(connector.config().app_name.as_deref(), Some("inventory"));
    }

    #[test]
    fn config_from_json() {
        let config = MongoConnectorConfig::from_json(r#"{ "uri": "mongodb://localhost:27017", "app_name": "svc" }"#)
            .unwrap();

        assert_eq!(config.uri, "mongodb://localhost:27017");
        assert_eq!(config.app_name.as_deref(), Some("svc"));
        assert_eq!(config.username, None);
    }

    #[test]
    fn config_without_uri_is_rejected() {
        let err = MongoConnectorConfig::from_json(r#"{ "app_name": "svc" }"#).unwrap_err();

        assert!(matches!(err, FacadeError::Connection(_)));
    }

    #[tokio::test]
    async fn malformed_uri_is_a_connection_error() {
        let err = MongoConnector::builder("not-a-uri").build().connect().await.unwrap_err();

        assert!(matches!(err, FacadeError::Connection(_)));
    }

    #[tokio::test]
    async fn options_carry_credentials() {
        let options = MongoConnector::builder("mongodb://localhost:27017")
            .credentials("app", "secret")
            .app_name("inventory")
            .build()
            .client_options()
            .await
            .unwrap();

        assert_eq!(options.app_name.as_deref(), Some("inventory"));
        assert_eq!(
            options.credential.and_then(|c| c.username).as_deref(),
            Some("app"),
        );
    }
}

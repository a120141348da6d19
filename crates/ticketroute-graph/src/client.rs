//! Graph REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use ticketroute_core::{
    MailFolder, MailboxApi, MessageRef, MessageRule, RemoteResult, RuleDraft,
};
use tracing::{debug, warn};
use url::Url;

use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::filter;
use crate::model::{
    Destination, ErrorEnvelope, GraphFolder, GraphMessage, GraphRule, NewFolder, Page, RuleBody,
    RuleStatePatch,
};
use crate::retry::RetryPolicy;
use crate::token::AccessToken;

const USER_AGENT: &str = concat!("ticketroute/", env!("CARGO_PKG_VERSION"));

/// Microsoft Graph client for one user's mailbox.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct GraphClient {
    http: Client,
    config: GraphConfig,
    token: AccessToken,
}

impl GraphClient {
    /// Creates a client against the public Graph endpoint with default
    /// timeouts and retry policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(token: AccessToken) -> Result<Self> {
        Self::with_config(token, GraphConfig::builder().build()?)
    }

    /// Creates a client with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn with_config(token: AccessToken, config: GraphConfig) -> Result<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            config,
            token,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Builds `<base>/<segments...>`. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidConfig("base_url cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Like [`Self::endpoint`] with a `$filter` query.
    fn filtered(&self, segments: &[&str], filter: &str) -> Result<Url> {
        let mut url = self.endpoint(segments)?;
        url.query_pairs_mut().append_pair("$filter", filter);
        // Form encoding turns spaces into '+'; OData wants %20.
        let query = url.query().map(|q| q.replace('+', "%20"));
        url.set_query(query.as_deref());
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        if self.token.is_expired() {
            return Err(Error::TokenExpired);
        }
        Ok(request.bearer_auth(&self.token.access_token))
    }

    /// Sends a `GET`, retrying throttling, server errors and transport
    /// failures according to the retry policy.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let policy = self.config.retry;
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(%url, attempt, "GET");
            let request = self.authorize(self.http.get(url.clone()))?;
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    return Ok(response.json().await?);
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    if RetryPolicy::is_retryable_status(status) && policy.allows_retry(attempt) {
                        let delay = policy.delay_for(attempt, retry_after(&response));
                        warn!(%url, status, ?delay, "Graph request failed, retrying");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(api_error(response).await);
                }
                Err(e) if (e.is_timeout() || e.is_connect()) && policy.allows_retry(attempt) => {
                    let delay = policy.delay_for(attempt, None);
                    warn!(%url, error = %e, ?delay, "Graph request failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Collects every page of a collection, following `@odata.nextLink`.
    async fn get_all_pages<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next {
            let page: Page<T> = self.get_json(url).await?;
            items.extend(page.value);
            next = page.next_link.as_deref().map(Url::parse).transpose()?;
        }
        Ok(items)
    }

    /// Sends a non-idempotent request once and returns the successful
    /// response.
    async fn send<B: Serialize + Sync>(&self, method: Method, url: Url, body: &B) -> Result<Response> {
        debug!(%method, %url, "sending");
        let request = self.authorize(self.http.request(method, url))?;
        let response = request.json(body).send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(api_error(response).await)
        }
    }

    async fn send_json<B, T>(&self, method: Method, url: Url, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        Ok(self.send(method, url, body).await?.json().await?)
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Turns a failed response into [`Error::Api`], keeping Graph's own code
/// and message when the body is the standard error envelope.
async fn api_error(response: Response) -> Error {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&text) {
        Ok(envelope) => Error::api(status.as_u16(), envelope.error.code, envelope.error.message),
        Err(_) => {
            let message = if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("Unknown error").to_string()
            } else {
                text
            };
            Error::api(status.as_u16(), "UnknownError", message)
        }
    }
}

#[async_trait]
impl MailboxApi for GraphClient {
    async fn find_top_level_folder(&self, name: &str) -> RemoteResult<Option<MailFolder>> {
        let url = self.filtered(&["me", "mailFolders"], &filter::display_name_eq(name))?;
        let page: Page<GraphFolder> = self.get_json(url).await?;
        Ok(page.value.into_iter().next().map(MailFolder::from))
    }

    async fn find_child_folders(
        &self,
        parent_id: &str,
        name: &str,
    ) -> RemoteResult<Vec<MailFolder>> {
        let url = self.filtered(
            &["me", "mailFolders", parent_id, "childFolders"],
            &filter::display_name_eq(name),
        )?;
        let page: Page<GraphFolder> = self.get_json(url).await?;
        Ok(page.value.into_iter().map(MailFolder::from).collect())
    }

    async fn list_child_folders(&self, parent_id: &str) -> RemoteResult<Vec<MailFolder>> {
        let url = self.endpoint(&["me", "mailFolders", parent_id, "childFolders"])?;
        let folders: Vec<GraphFolder> = self.get_all_pages(url).await?;
        Ok(folders.into_iter().map(MailFolder::from).collect())
    }

    async fn create_child_folder(&self, parent_id: &str, name: &str) -> RemoteResult<MailFolder> {
        let url = self.endpoint(&["me", "mailFolders", parent_id, "childFolders"])?;
        let folder: GraphFolder = self
            .send_json(Method::POST, url, &NewFolder { display_name: name })
            .await?;
        debug!(parent_id, name, id = %folder.id, "Created folder");
        Ok(folder.into())
    }

    async fn list_rules(&self) -> RemoteResult<Vec<MessageRule>> {
        let url = self.endpoint(&["me", "mailFolders", "inbox", "messageRules"])?;
        let rules: Vec<GraphRule> = self.get_all_pages(url).await?;
        Ok(rules.into_iter().map(MessageRule::from).collect())
    }

    async fn create_rule(&self, draft: &RuleDraft) -> RemoteResult<MessageRule> {
        let url = self.endpoint(&["me", "mailFolders", "inbox", "messageRules"])?;
        let rule: GraphRule = self
            .send_json(Method::POST, url, &RuleBody::from(draft))
            .await?;
        Ok(rule.into())
    }

    async fn replace_rule(&self, rule_id: &str, draft: &RuleDraft) -> RemoteResult<MessageRule> {
        let url = self.endpoint(&["me", "mailFolders", "inbox", "messageRules", rule_id])?;
        let rule: GraphRule = self
            .send_json(Method::PATCH, url, &RuleBody::from(draft))
            .await?;
        Ok(rule.into())
    }

    async fn set_rule_enabled(&self, rule_id: &str, enabled: bool) -> RemoteResult<()> {
        let url = self.endpoint(&["me", "mailFolders", "inbox", "messageRules", rule_id])?;
        self.send(
            Method::PATCH,
            url,
            &RuleStatePatch {
                is_enabled: enabled,
            },
        )
        .await?;
        Ok(())
    }

    async fn move_message(
        &self,
        message_id: &str,
        destination_id: &str,
    ) -> RemoteResult<MessageRef> {
        let url = self.endpoint(&["me", "messages", message_id, "move"])?;
        let message: GraphMessage = self
            .send_json(Method::POST, url, &Destination { destination_id })
            .await?;
        Ok(message.into())
    }

    async fn copy_message(
        &self,
        message_id: &str,
        destination_id: &str,
    ) -> RemoteResult<MessageRef> {
        let url = self.endpoint(&["me", "messages", message_id, "copy"])?;
        let message: GraphMessage = self
            .send_json(Method::POST, url, &Destination { destination_id })
            .await?;
        Ok(message.into())
    }

    async fn list_messages(&self, folder_id: &str, top: usize) -> RemoteResult<Vec<MessageRef>> {
        let mut url = self.endpoint(&["me", "mailFolders", folder_id, "messages"])?;
        url.query_pairs_mut()
            .append_pair("$top", &top.to_string())
            .append_pair("$select", "id");
        let page: Page<GraphMessage> = self.get_json(url).await?;
        Ok(page.value.into_iter().map(MessageRef::from).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> GraphClient {
        let config = GraphConfig::builder().base_url(base).build().unwrap();
        GraphClient::with_config(AccessToken::new("token"), config).unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let client = client("https://graph.microsoft.com/v1.0");
        let url = client
            .endpoint(&["me", "mailFolders", "AAMk=", "childFolders"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://graph.microsoft.com/v1.0/me/mailFolders/AAMk=/childFolders"
        );
    }

    #[test]
    fn test_endpoint_with_trailing_slash_base() {
        let client = client("http://127.0.0.1:8080/v1.0/");
        let url = client.endpoint(&["me", "messages", "m1", "move"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/v1.0/me/messages/m1/move");
    }

    #[test]
    fn test_endpoint_escapes_ids() {
        let client = client("https://graph.microsoft.com/v1.0");
        let url = client.endpoint(&["me", "messages", "a/b c", "copy"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://graph.microsoft.com/v1.0/me/messages/a%2Fb%20c/copy"
        );
    }

    #[test]
    fn test_filter_query_uses_percent_twenty() {
        let client = client("https://graph.microsoft.com/v1.0");
        let url = client
            .filtered(&["me", "mailFolders"], &filter::display_name_eq("Bob's a+b"))
            .unwrap();
        assert_eq!(
            url.query(),
            Some("%24filter=displayName%20eq%20%27Bob%27%27s%20a%2Bb%27")
        );
    }

    #[test]
    fn test_expired_token_is_refused() {
        let config = GraphConfig::builder().build().unwrap();
        let token = AccessToken::new("t").with_expires_in(-10);
        let client = GraphClient::with_config(token, config).unwrap();
        let request = client.http.get("https://graph.microsoft.com/v1.0/me");
        assert!(matches!(client.authorize(request), Err(Error::TokenExpired)));
    }
}

use anyhow::Context;
use async_trait::async_trait;
use crews::{ChannelEdit, ChatApi};
use reqwest::{header::AUTHORIZATION, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use shared::{
    domain::{ChannelId, ChannelKind, GuildId, MessageId},
    error::{ApiException, ErrorCode},
    protocol::ChannelSummary,
};
use url::Url;

/// Channel type code the platform uses for voice channels.
const VOICE_CHANNEL_TYPE: u8 = 2;

/// Platform ids arrive as decimal strings, older payloads send bare numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Snowflake {
    Text(String),
    Number(i64),
}

impl Snowflake {
    fn parse(&self) -> Result<i64, ApiException> {
        match self {
            Self::Number(id) => Ok(*id),
            Self::Text(raw) => raw.parse().map_err(|_| {
                ApiException::new(ErrorCode::Internal, format!("malformed id '{raw}'"))
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlatformError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CreatedChannel {
    id: Snowflake,
    name: String,
    #[serde(default)]
    parent_id: Option<Snowflake>,
}

#[derive(Debug, Deserialize)]
struct CreatedInvite {
    code: String,
}

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: Snowflake,
}

/// `ChatApi` over the platform's HTTP API.
#[derive(Clone)]
pub struct RestChatApi {
    http: Client,
    base_url: Url,
    token: String,
}

impl RestChatApi {
    pub fn new(base_url: &str, token: impl Into<String>) -> anyhow::Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid api base url '{base_url}'"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            token: token.into(),
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiException> {
        let url = self.base_url.join(path).map_err(|err| {
            ApiException::new(ErrorCode::Internal, format!("invalid endpoint '{path}': {err}"))
        })?;
        Ok(self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bot {}", self.token)))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiException> {
        let response = request
            .send()
            .await
            .map_err(|err| ApiException::new(ErrorCode::Internal, format!("request failed: {err}")))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<PlatformError>(&body)
            .map(|err| err.message)
            .unwrap_or(body);
        Err(ApiException::new(
            ErrorCode::from_http_status(status.as_u16()),
            message,
        ))
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiException> {
        self.execute(request)
            .await?
            .json::<T>()
            .await
            .map_err(|err| ApiException::new(ErrorCode::Internal, format!("invalid response: {err}")))
    }
}

#[async_trait]
impl ChatApi for RestChatApi {
    async fn create_voice_channel(
        &self,
        guild_id: GuildId,
        parent_id: ChannelId,
        name: &str,
        user_limit: Option<u32>,
    ) -> Result<ChannelSummary, ApiException> {
        let mut body = json!({
            "name": name,
            "type": VOICE_CHANNEL_TYPE,
            "parent_id": parent_id.to_string(),
        });
        if let Some(limit) = user_limit {
            body["user_limit"] = json!(limit);
        }
        let request = self
            .request(Method::POST, &format!("guilds/{guild_id}/channels"))?
            .json(&body);
        let created: CreatedChannel = self.execute_json(request).await?;

        Ok(ChannelSummary {
            channel_id: ChannelId(created.id.parse()?),
            guild_id,
            kind: ChannelKind::Voice,
            name: created.name,
            parent_id: match created.parent_id {
                Some(parent) => Some(ChannelId(parent.parse()?)),
                None => Some(parent_id),
            },
        })
    }

    async fn modify_channel(
        &self,
        channel_id: ChannelId,
        edit: ChannelEdit,
    ) -> Result<(), ApiException> {
        let request = self
            .request(Method::PATCH, &format!("channels/{channel_id}"))?
            .json(&edit);
        self.execute(request).await?;
        Ok(())
    }

    async fn delete_channel(&self, channel_id: ChannelId) -> Result<(), ApiException> {
        let request = self.request(Method::DELETE, &format!("channels/{channel_id}"))?;
        self.execute(request).await?;
        Ok(())
    }

    async fn create_invite(
        &self,
        channel_id: ChannelId,
        max_age_secs: u64,
    ) -> Result<String, ApiException> {
        let request = self
            .request(Method::POST, &format!("channels/{channel_id}/invites"))?
            .json(&json!({ "max_age": max_age_secs, "unique": true }));
        let invite: CreatedInvite = self.execute_json(request).await?;
        Ok(invite.code)
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<MessageId, ApiException> {
        let request = self
            .request(Method::POST, &format!("channels/{channel_id}/messages"))?
            .json(&json!({ "content": content }));
        let message: CreatedMessage = self.execute_json(request).await?;
        Ok(MessageId(message.id.parse()?))
    }

    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), ApiException> {
        let request = self.request(
            Method::DELETE,
            &format!("channels/{channel_id}/messages/{message_id}"),
        )?;
        self.execute(request).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/rest_tests.rs"]
mod tests;

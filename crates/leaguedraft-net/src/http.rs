// REST collaborator over reqwest.
//
// Each `DraftApi` call is one HTTP request. Non-2xx responses are classified
// by `classify_error_response`; anything that leaves the outcome unknown
// (timeouts, connection failures, undecodable bodies) becomes a
// `TransportError`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use leaguedraft_core::api::DraftApi;
use leaguedraft_core::config::Config;
use leaguedraft_core::draft::order::{DraftOrder, DraftSettings, DraftType};
use leaguedraft_core::draft::player::{AvailablePlayer, CatalogQuery};
use leaguedraft_core::draft::snapshot::{DraftSnapshot, Pick};
use leaguedraft_core::error::{ApiError, TransportError};
use leaguedraft_core::protocol::{
    classify_error_response, DraftStateResponse, ErrorBody, MakePickRequest, PickResponse,
    PlayersResponse,
};
use leaguedraft_core::{LeagueId, PlayerId, TeamId};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeRequest<'a> {
    league_id: LeagueId,
    settings: &'a DraftSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartRequest {
    league_id: LeagueId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AutoPickRequest {
    team_id: TeamId,
}

/// `DraftApi` backed by the league's REST endpoints.
pub struct HttpDraftApi {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpDraftApi {
    pub fn new(base_url: &str, timeout: Duration, api_token: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(
            &config.api.base_url,
            config.api.request_timeout(),
            config.credentials.api_token.clone(),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and return the status code with the body text.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(u16, String), TransportError> {
        let request = match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await.map_err(|e| transport_from_reqwest(&e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport_from_reqwest(&e))?;
        Ok((status, body))
    }

    /// Read-only calls have no race outcomes: any non-2xx is a transport
    /// failure.
    async fn get(&self, request: reqwest::RequestBuilder) -> Result<String, TransportError> {
        let (status, body) = self.send(request).await?;
        if (200..300).contains(&status) {
            return Ok(body);
        }
        warn!("Collaborator returned {status} for a read");
        Err(read_failure(status, &body))
    }

    /// Mutating calls classify non-2xx responses into race outcomes and
    /// refusals.
    async fn mutate(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let (status, body) = self.send(request).await?;
        if (200..300).contains(&status) {
            return Ok(body);
        }
        let error = classify_error_response(status, &body);
        debug!("Collaborator refused mutation with {status}: {error}");
        Err(error)
    }
}

/// Map a reqwest failure to the transport taxonomy.
pub fn transport_from_reqwest(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}

fn read_failure(status: u16, body: &str) -> TransportError {
    if status == 401 {
        return TransportError::Unauthorized;
    }
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| body.trim().chars().take(200).collect());
    TransportError::Status { status, message }
}

fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, TransportError> {
    serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))
}

#[async_trait]
impl DraftApi for HttpDraftApi {
    async fn fetch_draft_state(&self, league_id: LeagueId) -> Result<DraftSnapshot, TransportError> {
        let body = self
            .get(self.http.get(self.url(&format!("/api/draft/{league_id}"))))
            .await?;
        let response: DraftStateResponse = decode(&body)?;
        response.into_snapshot(league_id, Utc::now())
    }

    async fn fetch_available_players(
        &self,
        league_id: LeagueId,
        query: &CatalogQuery,
    ) -> Result<Vec<AvailablePlayer>, TransportError> {
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(position) = query.position.as_query_param() {
            params.push(("position", position));
        }
        let search = query.search.trim();
        if !search.is_empty() {
            params.push(("search", search));
        }
        let request = self
            .http
            .get(self.url(&format!("/api/draft/{league_id}/available-players")))
            .query(&params);
        let body = self.get(request).await?;
        let response: PlayersResponse = decode(&body)?;
        Ok(response.into_players())
    }

    async fn initialize_draft(&self, league_id: LeagueId, settings: &DraftSettings) -> Result<(), ApiError> {
        let request = self
            .http
            .post(self.url("/api/draft/initialize"))
            .json(&InitializeRequest { league_id, settings });
        self.mutate(request).await?;
        Ok(())
    }

    async fn start_draft(&self, league_id: LeagueId) -> Result<(), ApiError> {
        let request = self
            .http
            .post(self.url("/api/draft/start"))
            .json(&StartRequest { league_id });
        self.mutate(request).await?;
        Ok(())
    }

    async fn make_pick(
        &self,
        league_id: LeagueId,
        team_id: TeamId,
        player_id: PlayerId,
    ) -> Result<Pick, ApiError> {
        let request = self.http.post(self.url("/api/draft/pick")).json(&MakePickRequest {
            league_id,
            team_id,
            player_id,
        });
        let body = self.mutate(request).await?;
        // The pick may have committed even if its body is unreadable.
        decode_pick(&body)
    }

    async fn auto_pick(&self, league_id: LeagueId, team_id: TeamId) -> Result<Pick, ApiError> {
        let request = self
            .http
            .post(self.url(&format!("/api/draft/{league_id}/auto-pick")))
            .json(&AutoPickRequest { team_id });
        let body = self.mutate(request).await?;
        decode_pick(&body)
    }
}

fn decode_pick(body: &str) -> Result<Pick, ApiError> {
    let response: PickResponse = decode(body)?;
    Ok(response.into_pick(&DraftOrder::new(Vec::new(), DraftType::Snake)))
}

//! MCP Server implementation
//!
//! This module defines the MCP server that exposes identity lookups as
//! tools, resources and prompts. Handler implementations are in the
//! handlers/ module.
//!
//! # Credential-gated Tool Groups
//!
//! Lookup tools are always listed. Other tool groups depend on the
//! authentication mode resolved at startup:
//! - API key: `check_credits`, `set_credit_alert`
//! - x402 payment: `purchase_credits`

use std::sync::Arc;

use mcp_common::{
    async_trait, resource_not_found, EmbeddableError, EmbeddableMcp, EmbeddableResult, McpError,
};
use rmcp::{
    handler::server::{
        router::{prompt::PromptRouter, tool::ToolRouter},
        wrapper::Parameters,
    },
    model::*,
    prompt, prompt_handler, prompt_router,
    service::RequestContext,
    tool, tool_handler, tool_router, Peer, RoleServer,
};
use serde_json::Value;
use tracing::debug;

use crate::api::client::IdentityApi;
use crate::api::transport::{HttpTransport, Transport};
use crate::auth::{AuthContext, AuthMode};
use crate::config::Config;
use crate::credits::CreditTracker;
use crate::error::IdentityResult;
use crate::handlers;
use crate::notify::{LevelFilter, Notifier};
use crate::params::*;
use crate::prompts::{self, BulkLookupArgs, InvestigateAddressArgs, InvestigateTwitterArgs};
use crate::resources;

/// The main Identity MCP Server
#[derive(Clone)]
pub struct IdentityMcpServer {
    api: IdentityApi,
    /// Receives events for calls made through [`EmbeddableMcp`]
    embedded_notifier: Notifier,
    /// Set by the host through `logging/setLevel`
    log_level: LevelFilter,
    tool_router: ToolRouter<Self>,
    prompt_router: PromptRouter<Self>,
}

// ============================================================================
// Lookup Tools (always available)
// ============================================================================

#[tool_router]
impl IdentityMcpServer {
    #[tool(description = "Check whether a crypto address is linked to a known social identity")]
    async fn check_address(
        &self,
        Parameters(params): Parameters<AddressParams>,
        peer: Peer<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        handlers::check_address(&self.api, params, &self.peer_notifier(peer)).await
    }

    #[tool(description = "Check whether a Twitter handle is linked to a known crypto address")]
    async fn check_twitter(
        &self,
        Parameters(params): Parameters<TwitterParams>,
        peer: Peer<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        handlers::check_twitter(&self.api, params, &self.peer_notifier(peer)).await
    }

    #[tool(
        description = "Get identity data for a crypto address: linked Twitter/Farcaster accounts, display names, address cluster and sources"
    )]
    async fn get_address_data(
        &self,
        Parameters(params): Parameters<AddressParams>,
        peer: Peer<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        handlers::get_address_data(&self.api, params, &self.peer_notifier(peer)).await
    }

    #[tool(
        description = "Get identity data for a Twitter handle: linked addresses, display names and sources"
    )]
    async fn get_twitter_data(
        &self,
        Parameters(params): Parameters<TwitterParams>,
        peer: Peer<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        handlers::get_twitter_data(&self.api, params, &self.peer_notifier(peer)).await
    }

    #[tool(
        description = "Check many crypto addresses at once. Processed in chunks of 50 with progress notifications"
    )]
    async fn batch_check_addresses(
        &self,
        Parameters(params): Parameters<BatchAddressParams>,
        peer: Peer<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        handlers::batch_check_addresses(&self.api, params, &self.peer_notifier(peer)).await
    }

    #[tool(
        description = "Check many Twitter handles at once. Processed in chunks of 50 with progress notifications"
    )]
    async fn batch_check_twitters(
        &self,
        Parameters(params): Parameters<BatchTwitterParams>,
        peer: Peer<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        handlers::batch_check_twitters(&self.api, params, &self.peer_notifier(peer)).await
    }

    #[tool(
        description = "Get identity data for many crypto addresses at once. Processed in chunks of 50 with progress notifications"
    )]
    async fn batch_get_address_data(
        &self,
        Parameters(params): Parameters<BatchAddressParams>,
        peer: Peer<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        handlers::batch_get_address_data(&self.api, params, &self.peer_notifier(peer)).await
    }

    #[tool(
        description = "Get identity data for many Twitter handles at once. Processed in chunks of 50 with progress notifications"
    )]
    async fn batch_get_twitter_data(
        &self,
        Parameters(params): Parameters<BatchTwitterParams>,
        peer: Peer<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        handlers::batch_get_twitter_data(&self.api, params, &self.peer_notifier(peer)).await
    }
}

// ============================================================================
// Credit Tools (API key mode)
// ============================================================================

#[tool_router(router = credit_tool_router)]
impl IdentityMcpServer {
    #[tool(description = "Show the current credit balance and alert thresholds")]
    async fn check_credits(
        &self,
        Parameters(_): Parameters<EmptyParams>,
        peer: Peer<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        handlers::check_credits(&self.api, &self.peer_notifier(peer)).await
    }

    #[tool(description = "Set the credit balance at which a low-credit alert is sent")]
    async fn set_credit_alert(
        &self,
        Parameters(params): Parameters<SetCreditAlertParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::set_credit_alert(&self.api, params).await
    }
}

// ============================================================================
// Purchase Tools (x402 payment mode)
// ============================================================================

#[tool_router(router = payment_tool_router)]
impl IdentityMcpServer {
    #[tool(
        description = "Buy a credit package ('starter', 'growth' or 'scale') with USDC from the configured wallet"
    )]
    async fn purchase_credits(
        &self,
        Parameters(params): Parameters<PurchaseCreditsParams>,
        peer: Peer<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        handlers::purchase_credits(&self.api, params, &self.peer_notifier(peer)).await
    }
}

// ============================================================================
// Prompts
// ============================================================================

#[prompt_router]
impl IdentityMcpServer {
    #[prompt(
        name = "investigate_address",
        description = "Work out who is behind a crypto address"
    )]
    async fn investigate_address(
        &self,
        Parameters(args): Parameters<InvestigateAddressArgs>,
    ) -> Vec<PromptMessage> {
        vec![PromptMessage::new_text(
            PromptMessageRole::User,
            prompts::investigate_address(&args.address),
        )]
    }

    #[prompt(
        name = "investigate_twitter",
        description = "Find the crypto addresses tied to a Twitter handle"
    )]
    async fn investigate_twitter(
        &self,
        Parameters(args): Parameters<InvestigateTwitterArgs>,
    ) -> Vec<PromptMessage> {
        vec![PromptMessage::new_text(
            PromptMessageRole::User,
            prompts::investigate_twitter(&args.handle),
        )]
    }

    #[prompt(
        name = "bulk_lookup",
        description = "Look up a list of addresses or Twitter handles with the batch tools"
    )]
    async fn bulk_lookup(&self, Parameters(args): Parameters<BulkLookupArgs>) -> Vec<PromptMessage> {
        vec![PromptMessage::new_text(
            PromptMessageRole::User,
            prompts::bulk_lookup(&args.items, args.kind.as_deref()),
        )]
    }
}

// ============================================================================
// Router Composition & Server Initialization
// ============================================================================

impl IdentityMcpServer {
    /// Create a server talking to the configured API over HTTP
    pub fn new(config: &Config) -> IdentityResult<Self> {
        let transport = HttpTransport::new(&config.api.url, config.api.timeout())?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a server over any transport
    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> IdentityResult<Self> {
        let auth = AuthContext::resolve(
            config.credentials.api_key.as_deref(),
            config.credentials.private_key.as_deref(),
        )?;
        let credits = Arc::new(CreditTracker::new(
            auth.mode(),
            config.credits.alert_threshold,
        ));
        let api = IdentityApi::new(transport, Arc::new(auth), credits, config.api.url.clone());
        Ok(Self::from_api(api))
    }

    /// Build the catalog for the API's auth mode
    pub fn from_api(api: IdentityApi) -> Self {
        let router = Self::tool_router();
        let router = match api.auth().mode() {
            AuthMode::ApiKey => router + Self::credit_tool_router(),
            AuthMode::Payment => router + Self::payment_tool_router(),
            AuthMode::None => router,
        };

        Self {
            api,
            embedded_notifier: Notifier::disabled(),
            log_level: LevelFilter::default(),
            tool_router: router,
            prompt_router: Self::prompt_router(),
        }
    }

    /// Route notifications from embedded calls to `notifier`
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.embedded_notifier = notifier.with_filter(self.log_level.clone());
        self
    }

    /// Drop host notifications below `level` from now on
    pub fn set_log_level(&self, level: LoggingLevel) {
        debug!(?level, "host logging level set");
        self.log_level.set(&level);
    }

    fn peer_notifier(&self, peer: Peer<RoleServer>) -> Notifier {
        Notifier::for_peer(peer, self.log_level.clone())
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.api.auth().mode()
    }

    pub fn api(&self) -> &IdentityApi {
        &self.api
    }

    /// Render a resource in-process
    pub fn read_resource_text(&self, uri: &str) -> Option<String> {
        resources::render(uri, &self.api)
    }

    fn instructions(&self) -> String {
        let access = match self.auth_mode() {
            AuthMode::ApiKey => "Authenticated with an API key; calls draw on a credit balance \
                                 (see check_credits)."
                .to_string(),
            AuthMode::Payment => {
                let wallet = self
                    .api
                    .auth()
                    .wallet()
                    .map(|w| w.address().to_string())
                    .unwrap_or_default();
                format!(
                    "Paying per call in USDC on Base from wallet {}; use purchase_credits to buy \
                     a credit package.",
                    wallet
                )
            }
            AuthMode::None => "No credentials configured: set IDENTITY_API_KEY or \
                               IDENTITY_PRIVATE_KEY before calling lookup tools."
                .to_string(),
        };

        format!(
            "Identity MCP Server - maps crypto addresses to social identities (Twitter, \
             Farcaster) and back. Use check_* tools for a quick yes/no, get_*_data for full \
             records and batch_* tools for lists of any size. Read identity://status for the \
             current session. {}",
            access
        )
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
#[prompt_handler]
impl rmcp::ServerHandler for IdentityMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_logging()
                .enable_prompts()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(self.instructions()),
            ..Default::default()
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn set_level(
        &self,
        request: SetLevelRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<(), McpError>> + Send + '_ {
        async move {
            self.set_log_level(request.level);
            Ok(())
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        async move { Ok(ListResourcesResult::with_all_items(resources::catalog())) }
    }

    #[allow(clippy::manual_async_fn)]
    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            debug!(uri = %request.uri, "reading resource");
            let text = self
                .read_resource_text(&request.uri)
                .ok_or_else(|| resource_not_found(&request.uri))?;

            Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(text, request.uri.clone())],
            })
        }
    }
}

// ============================================================================
// EmbeddableMcp Implementation
// ============================================================================

#[async_trait]
impl EmbeddableMcp for IdentityMcpServer {
    fn server_name(&self) -> &str {
        "identity"
    }

    fn server_description(&self) -> Option<&str> {
        Some(
            "Identity MCP Server - crypto address and social handle lookups with API-key \
             or x402 pay-per-call access.",
        )
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
        if !self.tool_router.list_all().iter().any(|t| t.name == name) {
            return Err(EmbeddableError::ToolNotFound(name.to_string()));
        }

        let api = &self.api;
        let notifier = &self.embedded_notifier;
        let result = match name {
            "check_address" => {
                handlers::check_address(api, serde_json::from_value(params)?, notifier).await
            }
            "check_twitter" => {
                handlers::check_twitter(api, serde_json::from_value(params)?, notifier).await
            }
            "get_address_data" => {
                handlers::get_address_data(api, serde_json::from_value(params)?, notifier).await
            }
            "get_twitter_data" => {
                handlers::get_twitter_data(api, serde_json::from_value(params)?, notifier).await
            }
            "batch_check_addresses" => {
                handlers::batch_check_addresses(api, serde_json::from_value(params)?, notifier)
                    .await
            }
            "batch_check_twitters" => {
                handlers::batch_check_twitters(api, serde_json::from_value(params)?, notifier)
                    .await
            }
            "batch_get_address_data" => {
                handlers::batch_get_address_data(api, serde_json::from_value(params)?, notifier)
                    .await
            }
            "batch_get_twitter_data" => {
                handlers::batch_get_twitter_data(api, serde_json::from_value(params)?, notifier)
                    .await
            }
            "check_credits" => handlers::check_credits(api, notifier).await,
            "set_credit_alert" => {
                handlers::set_credit_alert(api, serde_json::from_value(params)?).await
            }
            "purchase_credits" => {
                handlers::purchase_credits(api, serde_json::from_value(params)?, notifier).await
            }
            _ => return Err(EmbeddableError::ToolNotFound(name.to_string())),
        };

        result.map_err(Into::into)
    }
}

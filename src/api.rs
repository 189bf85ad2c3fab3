use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::{
    wire::{
        ConfigDefaults, ContentCreate, ContentRetrieve, PropertyCreate, PropertyUpdate, Register,
        ThemeRetrieve, TokenExchange, TokenSend, UpdateConfig,
    },
    AtmError, AttemptFailure, ClientOptions, ContentQuery, JsonRequest, NewProperty,
    PropertyBuild, PropertyConfig, ResilientJsonClient, Result, ThemeQuery,
};

const API_KEY_HEADER: &str = "X-Api-Key";
const USERNAME_EXISTS: &str = "usernameexistsexception";

/// Typed client for the AdTechMedia property, content and account endpoints.
#[derive(Clone)]
pub struct AdtechmediaClient {
    core: ResilientJsonClient,
    end_point: String,
    api_key: Option<String>,
}

impl fmt::Debug for AdtechmediaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdtechmediaClient")
            .field("end_point", &self.end_point)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("core", &self.core)
            .finish()
    }
}

impl AdtechmediaClient {
    /// Creates a client for the API rooted at `end_point`.
    ///
    /// Endpoint paths are appended to it, so a missing trailing `/` is added.
    pub fn new(end_point: impl Into<String>) -> Self {
        Self::with_core(end_point, ResilientJsonClient::new())
    }

    /// Creates a client on an already configured request core.
    pub fn with_core(end_point: impl Into<String>, core: ResilientJsonClient) -> Self {
        let mut end_point = end_point.into().trim().to_owned();
        if !end_point.ends_with('/') {
            end_point.push('/');
        }
        Self {
            core,
            end_point,
            api_key: None,
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `ADTECHMEDIA_API_END_POINT` — base API URL (required)
    /// - `ADTECHMEDIA_API_KEY` — API key for `atm-admin` endpoints (optional)
    /// - timeout and retry overrides, see [`ClientOptions::from_env`]
    pub fn from_env() -> std::result::Result<Self, String> {
        let end_point = std::env::var("ADTECHMEDIA_API_END_POINT")
            .map_err(|_| "missing ADTECHMEDIA_API_END_POINT environment variable".to_owned())?;
        if end_point.trim().is_empty() {
            return Err("ADTECHMEDIA_API_END_POINT is set but empty".to_owned());
        }
        let options = ClientOptions::from_env()?;
        let mut client = Self::new(end_point).with_options(options);
        if let Ok(key) = std::env::var("ADTECHMEDIA_API_KEY") {
            client = client.with_api_key(key);
        }
        Ok(client)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Applies timeout and retry options to the underlying request core.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.core = self.core.with_options(opts);
        self
    }

    pub fn end_point(&self) -> &str {
        &self.end_point
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_ok()
    }

    /// Stores `content` for a property and returns the content id assigned by the service.
    pub async fn content_create(
        &self,
        content_id: &str,
        property_id: &str,
        content: &str,
    ) -> Result<String> {
        let key = self.api_key()?;
        let payload = ContentCreate {
            content_id,
            property_id,
            content,
        };
        let request = JsonRequest::put(self.url("atm-admin/content/create"))
            .header(API_KEY_HEADER, key)
            .body(to_body(&payload)?);
        let body = self.core.request(&request, &["Id"]).await?;
        string_field(&body, "Id")
    }

    /// Fetches the scrambled/locked rendition of previously stored content.
    pub async fn content_retrieve(&self, query: &ContentQuery) -> Result<JsonValue> {
        let key = self.api_key()?;
        let payload = ContentRetrieve {
            content_id: &query.content_id,
            property_id: &query.property_id,
            scramble_strategy: &query.scramble_strategy,
            offset_type: query.offset_type,
            offset_element_selector: &query.offset_element_selector,
            offset: query.offset,
        };
        let request = JsonRequest::get(self.url("atm-admin/content/retrieve"))
            .header(API_KEY_HEADER, key)
            .body(to_body(&payload)?);
        let body = self.core.request(&request, &["Content"]).await?;
        take_field(body, "Content")
    }

    /// Lists the countries a property can be registered in.
    pub async fn supported_countries(&self) -> Result<Vec<JsonValue>> {
        let key = self.api_key()?;
        let request = JsonRequest::get(self.url("atm-admin/property/supported-countries"))
            .header(API_KEY_HEADER, key);
        let body = self.core.request(&request, &["Countries"]).await?;
        match take_field(body, "Countries")? {
            JsonValue::Array(countries) => Ok(countries),
            other => Err(AtmError::Decode(format!(
                "expected Countries to be an array, got {other}"
            ))),
        }
    }

    /// Asks the service to email a temporary login token.
    ///
    /// Any JSON response is accepted.
    pub async fn request_api_token(&self, email: &str, link_template: &str) -> Result<()> {
        let payload = TokenSend {
            email,
            link_tpl: link_template,
        };
        let request =
            JsonRequest::put(self.url("deep-account/client/token-send")).body(to_body(&payload)?);
        self.core.request(&request, &[]).await?;
        Ok(())
    }

    /// Exchanges a temporary token for a permanent API key.
    pub async fn api_token_to_key(&self, email: &str, temp_token: &str) -> Result<String> {
        let payload = TokenExchange { email, temp_token };
        let request = JsonRequest::get(self.url("deep-account/client/token-exchange"))
            .body(to_body(&payload)?);
        let body = self.core.request(&request, &["apiKey"]).await?;
        string_field(&body, "apiKey")
    }

    /// Registers a client account for `email` and returns its API key.
    ///
    /// Returns [`AtmError::AccountExists`] when the email is already
    /// registered, in which case the user should log in instead.
    pub async fn api_key_create(&self, email: &str) -> Result<String> {
        let payload = Register { email };
        let request =
            JsonRequest::post(self.url("deep-account/client/register")).body(to_body(&payload)?);
        let body = self.core.request(&request, &[]).await?;

        let Some(object) = body.as_object() else {
            return Err(AtmError::RetriesExhausted {
                last: AttemptFailure::ResponseFormat(
                    "registration response is not a JSON object".to_owned(),
                ),
            });
        };
        if object.contains_key("apiKey") {
            return string_field(&body, "apiKey");
        }
        if let Some(raw) = object.get("errorMessage") {
            return Err(registration_error(email, raw));
        }
        Err(AtmError::RetriesExhausted {
            last: AttemptFailure::IncompleteResponse {
                missing: vec!["apiKey".to_owned()],
            },
        })
    }

    /// Registers a new property.
    pub async fn property_create(&self, property: &NewProperty) -> Result<PropertyBuild> {
        let key = self.api_key()?;
        let payload = PropertyCreate {
            name: &property.name,
            website: &property.website,
            support_email: &property.support_email,
            country: &property.country,
        };
        let request = JsonRequest::put(self.url("atm-admin/property/create"))
            .header(API_KEY_HEADER, key)
            .body(to_body(&payload)?);
        self.property_build(&request).await
    }

    /// Updates the support email and country of property `id`.
    pub async fn property_update(
        &self,
        id: &str,
        support_email: &str,
        country: &str,
    ) -> Result<PropertyBuild> {
        let key = self.api_key()?;
        let payload = PropertyUpdate {
            name: id,
            support_email,
            country,
        };
        let request = JsonRequest::post(self.url("atm-admin/property/update"))
            .header(API_KEY_HEADER, key)
            .body(to_body(&payload)?);
        self.property_build(&request).await
    }

    /// Pushes paywall, payment and ad settings as the property's `ConfigDefaults`.
    pub async fn property_update_config(
        &self,
        id: &str,
        config: &PropertyConfig,
    ) -> Result<PropertyBuild> {
        self.update_config(id, ConfigDefaults::from_config(config)).await
    }

    /// Pushes a caller-built `ConfigDefaults` document verbatim.
    pub async fn property_update_config_raw(
        &self,
        id: &str,
        config_defaults: JsonValue,
    ) -> Result<PropertyBuild> {
        self.update_config(id, config_defaults).await
    }

    pub async fn theme_config_create(&self, config: JsonValue) -> Result<JsonValue> {
        let key = self.api_key()?;
        let request = JsonRequest::put(self.url("atm-admin/theme-config/create"))
            .header(API_KEY_HEADER, key)
            .body(config);
        self.core.request(&request, &[]).await
    }

    /// Looks up a theme config by owner id, theme name, or both.
    pub async fn theme_config_retrieve(&self, query: &ThemeQuery) -> Result<JsonValue> {
        let key = self.api_key()?;
        if query.id.is_none() && query.theme.is_none() {
            return Err(AtmError::InvalidInput(
                "theme config lookup needs an id or a theme".to_owned(),
            ));
        }
        let payload = ThemeRetrieve {
            id: query.id.as_deref(),
            theme: query.theme.as_deref(),
        };
        let request = JsonRequest::get(self.url("atm-admin/theme-config/retrieve"))
            .header(API_KEY_HEADER, key)
            .body(to_body(&payload)?);
        self.core.request(&request, &[]).await
    }

    pub async fn theme_config_update(&self, config: JsonValue) -> Result<JsonValue> {
        let key = self.api_key()?;
        let request = JsonRequest::post(self.url("atm-admin/theme-config/update"))
            .header(API_KEY_HEADER, key)
            .body(config);
        self.core.request(&request, &[]).await
    }

    async fn update_config<C: Serialize>(
        &self,
        id: &str,
        config_defaults: C,
    ) -> Result<PropertyBuild> {
        let key = self.api_key()?;
        let payload = UpdateConfig {
            id,
            config_defaults,
        };
        let request = JsonRequest::patch(self.url("atm-admin/property/update-config"))
            .header(API_KEY_HEADER, key)
            .body(to_body(&payload)?);
        self.property_build(&request).await
    }

    async fn property_build(&self, request: &JsonRequest) -> Result<PropertyBuild> {
        let body = self.core.request(request, &["BuildPath", "Id"]).await?;
        Ok(PropertyBuild {
            build_path: string_field(&body, "BuildPath")?,
            id: string_field(&body, "Id")?,
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(AtmError::MissingApiKey)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.end_point)
    }
}

fn to_body<T: Serialize>(payload: &T) -> Result<JsonValue> {
    serde_json::to_value(payload)
        .map_err(|err| AtmError::InvalidInput(format!("unserializable payload: {err}")))
}

fn take_field(body: JsonValue, field: &str) -> Result<JsonValue> {
    match body {
        JsonValue::Object(mut map) => map
            .remove(field)
            .ok_or_else(|| AtmError::Decode(format!("missing field '{field}'"))),
        _ => Err(AtmError::Decode("expected a JSON object".to_owned())),
    }
}

/// Reads a string field; numeric ids are accepted and rendered as text.
fn string_field(body: &JsonValue, field: &str) -> Result<String> {
    match body.get(field) {
        Some(JsonValue::String(value)) => Ok(value.clone()),
        Some(JsonValue::Number(value)) => Ok(value.to_string()),
        Some(other) => Err(AtmError::Decode(format!(
            "expected '{field}' to be a string, got {other}"
        ))),
        None => Err(AtmError::Decode(format!("missing field '{field}'"))),
    }
}

/// Maps a registration `errorMessage` to a caller-facing error.
///
/// The service nests a JSON document `{"errorMessage": "..."}` inside the string.
fn registration_error(email: &str, raw: &JsonValue) -> AtmError {
    let message = match raw {
        JsonValue::String(text) => match serde_json::from_str::<Map<String, JsonValue>>(text) {
            Ok(nested) => nested_message(&nested).unwrap_or_else(|| text.clone()),
            Err(_) => text.clone(),
        },
        JsonValue::Object(nested) => nested_message(nested).unwrap_or_else(|| raw.to_string()),
        other => other.to_string(),
    };

    if message.to_ascii_lowercase().contains(USERNAME_EXISTS) {
        #[cfg(feature = "tracing")]
        tracing::info!(email, "registration rejected: account already exists");

        return AtmError::AccountExists {
            email: email.to_owned(),
            message: format!(
                "An existing client found for email \"{email}\". Please login to be able to use the plugin."
            ),
        };
    }
    AtmError::Api { message }
}

fn nested_message(nested: &Map<String, JsonValue>) -> Option<String> {
    nested
        .get("errorMessage")
        .and_then(JsonValue::as_str)
        .map(str::to_owned)
}

use serde::Serialize;

use crate::{OffsetType, PledgedType, PropertyConfig};

/// Author widget callback; reads globals injected by the page.
pub const AUTHOR_CB: &str = "function(onReady) {
\tvar fullName = window.WP_ATM_AUTHOR_NAME;
\tvar avatarUrl = window.WP_ATM_AUTHOR_AVATAR;
\tonReady({
\t\tfullName: fullName,
\t\tavatar: avatarUrl,
\t});
}";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContentCreate<'a> {
    pub content_id: &'a str,
    pub property_id: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContentRetrieve<'a> {
    pub content_id: &'a str,
    pub property_id: &'a str,
    pub scramble_strategy: &'a str,
    pub offset_type: OffsetType,
    pub offset_element_selector: &'a str,
    pub offset: u32,
}

#[derive(Debug, Serialize)]
pub struct TokenSend<'a> {
    pub email: &'a str,
    pub link_tpl: &'a str,
}

#[derive(Debug, Serialize)]
pub struct TokenExchange<'a> {
    pub email: &'a str,
    pub temp_token: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Register<'a> {
    #[serde(rename = "Email")]
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PropertyCreate<'a> {
    pub name: &'a str,
    pub website: &'a str,
    pub support_email: &'a str,
    pub country: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PropertyUpdate<'a> {
    pub name: &'a str,
    pub support_email: &'a str,
    pub country: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateConfig<'a, C: Serialize> {
    pub id: &'a str,
    pub config_defaults: C,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDefaults<'a> {
    pub content: ContentSettings<'a>,
    pub revenue_method: &'a str,
    pub ads: AdsSettings,
    pub payment: PaymentSettings<'a>,
    pub target_modal: TargetModal<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSettings<'a> {
    pub container: &'a str,
    pub selector: &'a str,
    pub offset: u32,
    pub lock: &'a str,
    pub offset_type: OffsetType,
    pub author_cb: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdsSettings {
    pub related_video_cb: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSettings<'a> {
    pub price: f64,
    pub pledged: u32,
    pub currency: &'a str,
    pub pledged_type: PledgedType,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetModal<'a> {
    pub toggle_cb: &'a str,
    pub target_cb: &'a str,
}

impl<'a> ConfigDefaults<'a> {
    pub fn from_config(config: &'a PropertyConfig) -> Self {
        Self {
            content: ContentSettings {
                container: &config.container,
                selector: &config.selector,
                offset: config.content_offset,
                lock: &config.content_lock,
                offset_type: config.offset_type,
                author_cb: AUTHOR_CB,
            },
            revenue_method: &config.revenue_method,
            ads: AdsSettings {
                related_video_cb: format!("function (onReady) {{ onReady('{}') }}", config.ads_video),
            },
            payment: PaymentSettings {
                price: config.price,
                pledged: config.payment_pledged,
                currency: &config.currency,
                pledged_type: config.pledged_type,
            },
            target_modal: TargetModal {
                toggle_cb: &config.toggle_cb_js,
                target_cb: &config.target_cb_js,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ThemeRetrieve<'a> {
    #[serde(rename = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    #[serde(rename = "Theme", skip_serializing_if = "Option::is_none")]
    pub theme: Option<&'a str>,
}

use crate::utils::error::ReportError;
use crate::utils::models::RawGeoFields;

use log::{ debug, warn };
use reqwest::Client;
use serde::{ Deserialize, Deserializer };
use serde_json::Value;
use std::{ future::Future, time::Duration };
use url::Url;

pub const DEFAULT_GEO_URL: &str = "http://www.geoplugin.net/json.gp";

/// 远程查询IP地理位置的服务，方便在测试中替换成假的实现
pub trait GeoProvider {
    fn lookup(&self, ip: &str) -> impl Future<Output = Option<RawGeoFields>>;
}

/// geoplugin.net 的JSON接口
pub struct GeoPluginProvider {
    client: Client,
    base_url: Url,
}

impl GeoPluginProvider {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ReportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(timeout)
            .build()?;
        Ok(GeoPluginProvider { client, base_url })
    }

    pub fn lookup_url(&self, ip: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("ip", ip);
        url
    }

    async fn fetch(&self, ip: &str) -> Result<String, reqwest::Error> {
        self.client.get(self.lookup_url(ip)).send().await?.error_for_status()?.text().await
    }
}

impl GeoProvider for GeoPluginProvider {
    async fn lookup(&self, ip: &str) -> Option<RawGeoFields> {
        let body = match self.fetch(ip).await {
            Ok(body) => body,
            Err(e) => {
                warn!("{} | 查询地理位置失败: {}", ip, e);
                return None;
            }
        };
        let fields = decode_response(&body);
        if fields.is_none() {
            debug!("{} | geoplugin没有返回可用的数据", ip);
        }
        fields
    }
}

#[derive(Debug, Deserialize)]
struct GeoPluginResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    geoplugin_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    geoplugin_city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    geoplugin_region: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", rename = "geoplugin_countryCode")]
    geoplugin_country_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", rename = "geoplugin_continentName")]
    geoplugin_continent_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    geoplugin_latitude: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    geoplugin_longitude: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    geoplugin_timezone: Option<String>,
}

// 服务返回的值可能是字符串、数字或者null，统一转成字符串
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where D: Deserializer<'de>
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

// 200是完整数据，206是部分数据，其它状态视为查不到
fn decode_response(body: &str) -> Option<RawGeoFields> {
    let response: GeoPluginResponse = serde_json::from_str(body).ok()?;
    if let Some(status) = response.geoplugin_status.as_deref() {
        if status != "200" && status != "206" {
            return None;
        }
    }

    let fields = RawGeoFields {
        city: response.geoplugin_city,
        region: response.geoplugin_region,
        country_code: response.geoplugin_country_code,
        continent_name: response.geoplugin_continent_name,
        latitude: response.geoplugin_latitude,
        longitude: response.geoplugin_longitude,
        timezone: response.geoplugin_timezone,
    };
    if fields.is_empty() { None } else { Some(fields) }
}

use serde::{ Deserialize, Serialize };
use std::{ collections::BTreeMap, fmt, str::FromStr };

// HTTP请求行不完整时，使用的占位标记
pub const UNKNOWN_MARKER: &str = "unknown";

// 时区偏移字段固定写入"0"，不是解析出来的偏移量
pub const TZ_OFFSET_PLACEHOLDER: &str = "0";

/// 报告中的一列：CSV中使用的键名 + 表头名称
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Ip,
    Endpoint,
    Status,
    Method,
    Protocol,
    City,
    Region,
    Country,
    Continent,
    Latitude,
    Longitude,
    Timezone,
    Date,
    Time,
    TzOffset,
    Extra,
    Raw,
}

impl Field {
    // 默认的CSV列顺序
    pub const ALL: [Field; 17] = [
        Field::Ip,
        Field::Endpoint,
        Field::Status,
        Field::Method,
        Field::Protocol,
        Field::City,
        Field::Region,
        Field::Country,
        Field::Continent,
        Field::Latitude,
        Field::Longitude,
        Field::Timezone,
        Field::Date,
        Field::Time,
        Field::TzOffset,
        Field::Extra,
        Field::Raw,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::Ip => "ip_addr",
            Field::Endpoint => "http_endpoint",
            Field::Status => "http_status",
            Field::Method => "http_method",
            Field::Protocol => "http_protocol",
            Field::City => "geo_city",
            Field::Region => "geo_region",
            Field::Country => "geo_country",
            Field::Continent => "geo_continent",
            Field::Latitude => "geo_lat",
            Field::Longitude => "geo_lng",
            Field::Timezone => "geo_tz",
            Field::Date => "date",
            Field::Time => "time",
            Field::TzOffset => "tz_offset",
            Field::Extra => "extra_1",
            Field::Raw => "raw",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Ip => "IP Address",
            Field::Endpoint => "Endpoint",
            Field::Status => "HTTP Status",
            Field::Method => "HTTP Method",
            Field::Protocol => "HTTP Protocol",
            Field::City => "Requesting City",
            Field::Region => "Requesting Region",
            Field::Country => "Requesting Country",
            Field::Continent => "Requesting Continent",
            Field::Latitude => "Requesting Latitude",
            Field::Longitude => "Requesting Longitude",
            Field::Timezone => "Requesting Timezone",
            Field::Date => "Request Date",
            Field::Time => "Request Time",
            Field::TzOffset => "Request Timezone",
            Field::Extra => "unused",
            Field::Raw => "Raw Entry",
        }
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL.iter()
            .copied()
            .find(|field| field.key() == s.trim())
            .ok_or_else(|| format!("未知的列名: {}", s))
    }
}

/// 报告中的一行。解析不到的字段为None，不会用空字符串代替
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogRecord {
    pub ip: Option<String>,
    pub endpoint: Option<String>,
    pub status: Option<String>,
    pub method: Option<String>,
    pub protocol: Option<String>,
    pub geo: GeoLocation,
    pub date: Option<String>,
    pub time: Option<String>,
    pub tz_offset: Option<String>,
    pub extra: Option<String>,
    pub raw: Option<String>,
}

impl LogRecord {
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Ip => &self.ip,
            Field::Endpoint => &self.endpoint,
            Field::Status => &self.status,
            Field::Method => &self.method,
            Field::Protocol => &self.protocol,
            Field::City => &self.geo.city,
            Field::Region => &self.geo.region,
            Field::Country => &self.geo.country,
            Field::Continent => &self.geo.continent,
            Field::Latitude => &self.geo.latitude,
            Field::Longitude => &self.geo.longitude,
            Field::Timezone => &self.geo.timezone,
            Field::Date => &self.date,
            Field::Time => &self.time,
            Field::TzOffset => &self.tz_offset,
            Field::Extra => &self.extra,
            Field::Raw => &self.raw,
        };
        value.as_deref()
    }

    // 请求行不完整（方法被标记为unknown）
    pub fn is_degraded(&self) -> bool {
        self.method.as_deref() == Some(UNKNOWN_MARKER)
    }
}

/// IP地址对应的地理位置，字段原样来自查询服务
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLocation {
    #[serde(rename = "geo_city", default)]
    pub city: Option<String>,
    #[serde(rename = "geo_region", default)]
    pub region: Option<String>,
    #[serde(rename = "geo_country", default)]
    pub country: Option<String>,
    #[serde(rename = "geo_continent", default)]
    pub continent: Option<String>,
    #[serde(rename = "geo_lat", default)]
    pub latitude: Option<String>,
    #[serde(rename = "geo_lng", default)]
    pub longitude: Option<String>,
    #[serde(rename = "geo_tz", default)]
    pub timezone: Option<String>,
}

impl From<RawGeoFields> for GeoLocation {
    fn from(raw: RawGeoFields) -> Self {
        GeoLocation {
            city: raw.city,
            region: raw.region,
            country: raw.country_code,
            continent: raw.continent_name,
            latitude: raw.latitude,
            longitude: raw.longitude,
            timezone: raw.timezone,
        }
    }
}

/// 查询服务返回的原始字段，与具体的服务商格式无关
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawGeoFields {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country_code: Option<String>,
    pub continent_name: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub timezone: Option<String>,
}

impl RawGeoFields {
    pub fn is_empty(&self) -> bool {
        [
            &self.city,
            &self.region,
            &self.country_code,
            &self.continent_name,
            &self.latitude,
            &self.longitude,
            &self.timezone,
        ]
            .iter()
            .all(|value| value.is_none())
    }
}

/// 缓存文件中的一条记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedGeo {
    #[serde(flatten)]
    pub location: GeoLocation,
    // 写入缓存时的时间戳，方便以后清理旧数据
    #[serde(rename = "_timestamp", default)]
    pub timestamp: i64,
}

// 缓存文件的整体结构：IP -> 地理位置
pub type GeoCacheMap = BTreeMap<String, CachedGeo>;

/// 被丢弃的行及原因（不是错误）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    NoTimestamp,
    DateMismatch,
    LoopbackAddress,
    NoIp,
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejected::NoTimestamp => "没有时间戳",
            Rejected::DateMismatch => "日期不匹配",
            Rejected::LoopbackAddress => "本地回环地址",
            Rejected::NoIp => "没有IP地址",
        };
        f.write_str(reason)
    }
}

/// 一次运行的统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportStats {
    pub lines: usize,
    pub records: usize,
    pub degraded: usize,
    pub geolocated: usize,
    pub no_timestamp: usize,
    pub date_mismatch: usize,
    pub loopback: usize,
    pub no_ip: usize,
}

impl ReportStats {
    pub fn reject(&mut self, reason: Rejected) {
        match reason {
            Rejected::NoTimestamp => self.no_timestamp += 1,
            Rejected::DateMismatch => self.date_mismatch += 1,
            Rejected::LoopbackAddress => self.loopback += 1,
            Rejected::NoIp => self.no_ip += 1,
        }
    }

    pub fn rejected(&self) -> usize {
        self.no_timestamp + self.date_mismatch + self.loopback + self.no_ip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_keys_round_trip_through_from_str() {
        for field in Field::ALL {
            assert_eq!(field.key().parse::<Field>(), Ok(field));
        }
        assert!("geo_altitude".parse::<Field>().is_err());
    }

    #[test]
    fn cached_geo_uses_cache_file_keys() {
        let entry = CachedGeo {
            location: GeoLocation {
                city: Some("Mountain View".to_string()),
                ..Default::default()
            },
            timestamp: 1_600_000_000,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["geo_city"], "Mountain View");
        assert!(json["geo_region"].is_null());
        assert_eq!(json["_timestamp"], 1_600_000_000);
    }

    #[test]
    fn cached_geo_without_timestamp_defaults_to_zero() {
        let entry: CachedGeo = serde_json::from_str(r#"{"geo_city":"Paris"}"#).unwrap();
        assert_eq!(entry.timestamp, 0);
        assert_eq!(entry.location.city.as_deref(), Some("Paris"));
        assert_eq!(entry.location.country, None);
    }

    #[test]
    fn raw_fields_with_only_nulls_are_empty() {
        assert!(RawGeoFields::default().is_empty());
        let raw = RawGeoFields { timezone: Some("UTC".to_string()), ..Default::default() };
        assert!(!raw.is_empty());
    }
}

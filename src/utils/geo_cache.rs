use crate::utils::error::ReportError;
use crate::utils::geoplugin::GeoProvider;
use crate::utils::models::{ CachedGeo, GeoCacheMap, GeoLocation };
use crate::utils::network::is_local_ip;

use log::{ debug, info, warn };
use std::{ fs, path::{ Path, PathBuf } };

pub const DEFAULT_CACHE_FILE: &str = "geo-ip.db.json";

/// IP地理位置缓存：先查本地，查不到再调用远程服务，查到的结果写回本地。
///
/// 运行开始时调用一次`load`，结束时调用一次`save`，中途只会新增记录。
pub struct GeoLookupCache<P> {
    path: PathBuf,
    provider: P,
    entries: GeoCacheMap,
}

impl<P: GeoProvider> GeoLookupCache<P> {
    pub fn new<T: AsRef<Path>>(path: T, provider: P) -> Self {
        GeoLookupCache {
            path: path.as_ref().to_path_buf(),
            provider,
            entries: GeoCacheMap::new(),
        }
    }

    // 文件不存在、读取失败或者内容损坏，都从空缓存开始
    pub fn load(&mut self) {
        self.entries = match fs::read_to_string(&self.path) {
            Ok(contents) =>
                match serde_json::from_str::<GeoCacheMap>(&contents) {
                    Ok(entries) => entries,
                    Err(e) => {
                        warn!("{} 缓存文件内容无效，从空缓存开始: {}", self.path.display(), e);
                        GeoCacheMap::new()
                    }
                }
            Err(e) => {
                debug!("{} 缓存文件读取失败，从空缓存开始: {}", self.path.display(), e);
                GeoCacheMap::new()
            }
        };
        info!("已加载{}条IP地理位置缓存", self.entries.len());
    }

    pub async fn resolve(&mut self, ip: &str) -> Option<GeoLocation> {
        if is_local_ip(ip) {
            return None;
        }

        if let Some(cached) = self.entries.get(ip) {
            return Some(cached.location.clone());
        }

        // 查询失败的不写入缓存，下次运行会再查
        let raw = self.provider.lookup(ip).await?;
        let location = GeoLocation::from(raw);
        self.entries.insert(ip.to_string(), CachedGeo {
            location: location.clone(),
            timestamp: chrono::Utc::now().timestamp(),
        });
        debug!("{} | 新增地理位置缓存", ip);
        Some(location)
    }

    // 整个覆盖写入
    pub fn save(&self) -> Result<(), ReportError> {
        let json = serde_json::to_string(&self.entries)?;
        fs::write(&self.path, json)?;
        info!("已保存{}条IP地理位置缓存到 {}", self.entries.len(), self.path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

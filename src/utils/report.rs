use crate::utils::geo_cache::GeoLookupCache;
use crate::utils::geoplugin::GeoProvider;
use crate::utils::models::{ LogRecord, ReportStats };
use crate::utils::parser::parse_line;

use chrono::NaiveDate;
use log::{ debug, warn };

/// 逐行解析访问日志，给保留下来的行补上地理位置，按原来的顺序收集起来
pub struct ReportBuilder<'a, P> {
    cache: &'a mut GeoLookupCache<P>,
    stats: ReportStats,
}

impl<'a, P: GeoProvider> ReportBuilder<'a, P> {
    pub fn new(cache: &'a mut GeoLookupCache<P>) -> Self {
        ReportBuilder { cache, stats: ReportStats::default() }
    }

    pub async fn build<S: AsRef<str>>(&mut self, lines: &[S], target_date: NaiveDate) -> Vec<LogRecord> {
        let mut records = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            self.stats.lines += 1;
            let mut record = match parse_line(line.as_ref(), target_date) {
                Ok(record) => record,
                Err(reason) => {
                    debug!("第{}行已跳过: {}", index + 1, reason);
                    self.stats.reject(reason);
                    continue;
                }
            };

            if let Some(ip) = record.ip.as_deref() {
                if let Some(geo) = self.cache.resolve(ip).await {
                    record.geo = geo;
                    self.stats.geolocated += 1;
                }
            }
            if record.is_degraded() {
                self.stats.degraded += 1;
            }

            self.stats.records += 1;
            records.push(record);
        }

        // 缓存保存失败不影响报告的生成
        if let Err(e) = self.cache.save() {
            warn!("保存IP地理位置缓存失败: {}", e);
        }

        records
    }

    pub fn stats(&self) -> &ReportStats {
        &self.stats
    }
}

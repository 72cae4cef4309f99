use crate::utils::files::DEFAULT_REPORT_FILE;
use crate::utils::geo_cache::DEFAULT_CACHE_FILE;
use crate::utils::geoplugin::DEFAULT_GEO_URL;
use crate::utils::models::Field;

use chrono::NaiveDate;
use clap::Parser;
use std::{ path::PathBuf, time::Duration };
use url::Url;

/// 把某一天的访问日志转换成带地理位置的CSV报告
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// 访问日志文件
    #[arg(short, long)]
    pub file: PathBuf,

    /// 要统计的日期（YYYY-MM-DD），默认是今天
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// CSV报告文件，日期会插入到扩展名前面
    #[arg(short, long, default_value = DEFAULT_REPORT_FILE)]
    pub output: PathBuf,

    /// IP地理位置缓存文件
    #[arg(short, long, default_value = DEFAULT_CACHE_FILE)]
    pub cache: PathBuf,

    /// 查询IP地理位置的接口
    #[arg(long, default_value = DEFAULT_GEO_URL)]
    pub geo_url: Url,

    /// 查询接口的超时时间（秒）
    #[arg(short, long, default_value_t = 10)]
    pub timeout: u64,

    /// CSV的列顺序，用逗号分隔，例如：ip_addr,http_endpoint,geo_city
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<Field>,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn target_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn columns(&self) -> Vec<Field> {
        if self.columns.is_empty() { Field::ALL.to_vec() } else { self.columns.clone() }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let args = Args::try_parse_from(["app", "-f", "access.log"]).unwrap();
        assert_eq!(args.output, PathBuf::from("reports/log-report.csv"));
        assert_eq!(args.cache, PathBuf::from("geo-ip.db.json"));
        assert_eq!(args.geo_url.as_str(), "http://www.geoplugin.net/json.gp");
        assert_eq!(args.timeout(), Duration::from_secs(10));
        assert_eq!(args.columns(), Field::ALL.to_vec());
        assert_eq!(args.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn parses_date_and_columns() {
        let args = Args::try_parse_from([
            "app",
            "--file",
            "access.log",
            "--date",
            "2020-10-10",
            "--columns",
            "ip_addr,geo_city,raw",
            "-v",
        ]).unwrap();
        assert_eq!(args.target_date(), NaiveDate::from_ymd_opt(2020, 10, 10).unwrap());
        assert_eq!(args.columns(), vec![Field::Ip, Field::City, Field::Raw]);
        assert_eq!(args.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn rejects_bad_date_and_unknown_column() {
        assert!(Args::try_parse_from(["app", "-f", "a.log", "-d", "10/10/2020"]).is_err());
        assert!(Args::try_parse_from(["app", "-f", "a.log", "--columns", "ip_addr,nope"]).is_err());
        assert!(Args::try_parse_from(["app", "-d", "2020-10-10"]).is_err());
    }
}

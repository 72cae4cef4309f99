mod utils;

use crate::utils::cli::Args;
use crate::utils::common::format_duration;
use crate::utils::files::{ append_report, read_log_file, report_file_name };
use crate::utils::geo_cache::GeoLookupCache;
use crate::utils::geoplugin::GeoPluginProvider;
use crate::utils::logger::init_logger;
use crate::utils::report::ReportBuilder;

use clap::Parser;
use log::info;
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    let args = Args::parse();
    init_logger(args.log_level())?;

    let date = args.target_date();
    let lines = read_log_file(&args.file)?;

    info!("文件: {}", args.file.display());
    info!("日期: {}", date);
    info!("共{}行，开始解析...", lines.len());

    let provider = GeoPluginProvider::new(args.geo_url.clone(), args.timeout())?;
    let mut cache = GeoLookupCache::new(&args.cache, provider);
    cache.load();

    let mut builder = ReportBuilder::new(&mut cache);
    let records = builder.build(&lines, date).await;
    let stats = builder.stats().clone();

    let csv_file = report_file_name(&args.output, date);
    append_report(&csv_file, &args.columns(), &records)?;

    info!(
        "共{}行，保留{}行，跳过{}行（日期不匹配{}，没有时间戳{}，回环地址{}，没有IP{}）",
        stats.lines,
        stats.records,
        stats.rejected(),
        stats.date_mismatch,
        stats.no_timestamp,
        stats.loopback,
        stats.no_ip
    );
    info!(
        "请求行不完整{}行，有地理位置{}行，缓存共{}个IP",
        stats.degraded,
        stats.geolocated,
        cache.len()
    );
    info!("报告已写入 {}", csv_file.display());

    let (elapsed_time, unit) = format_duration(start_time.elapsed());
    info!("程序运行结束，耗时：{:.2} {}", elapsed_time, unit);

    Ok(())
}

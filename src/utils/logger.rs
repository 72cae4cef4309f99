// 初始化日志（设置日志格式）
pub fn init_logger(level: log::LevelFilter) -> Result<(), fern::InitError> {
    fern::Dispatch
        ::new()
        .format(|out, message, record| {
            out.finish(
                format_args!(
                    "{} {:<5} {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    message
                )
            )
        })
        .level(level)
        // reqwest/hyper 的调试日志太多
        .level_for("hyper_util", log::LevelFilter::Warn)
        .level_for("reqwest", log::LevelFilter::Warn)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

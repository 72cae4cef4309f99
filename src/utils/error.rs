use std::{ io, path::PathBuf };
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    // 访问日志不存在或者无法读取
    #[error("打开{}文件失败，错误原因是:{source}", .path.display())]
    ReadLog {
        path: PathBuf,
        source: io::Error,
    },

    #[error("{}文件是空的", .0.display())]
    EmptyLog(PathBuf),

    #[error("写入CSV报告失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("文件读写失败: {0}")]
    Io(#[from] io::Error),

    #[error("JSON序列化失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP客户端初始化失败: {0}")]
    Http(#[from] reqwest::Error),
}

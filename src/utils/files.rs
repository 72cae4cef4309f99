use crate::utils::error::ReportError;
use crate::utils::models::{ Field, LogRecord };

use chrono::NaiveDate;
use csv::WriterBuilder;
use std::{ fs::{ self, OpenOptions }, path::{ Path, PathBuf } };

pub const DEFAULT_REPORT_FILE: &str = "reports/log-report.csv";

// 按行读取访问日志，保留原来的顺序
pub fn read_log_file<P>(filename: P) -> Result<Vec<String>, ReportError> where P: AsRef<Path> {
    let path = filename.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ReportError::ReadLog {
        path: path.to_path_buf(),
        source,
    })?;

    let lines: Vec<String> = contents.lines().map(String::from).collect();
    if lines.iter().all(|line| line.trim().is_empty()) {
        return Err(ReportError::EmptyLog(path.to_path_buf()));
    }
    Ok(lines)
}

// reports/log-report.csv -> reports/log-report.2020-10-10.csv
pub fn report_file_name(base: &Path, date: NaiveDate) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "log-report".to_string());
    let extension = base
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csv".to_string());
    base.with_file_name(format!("{}.{}.{}", stem, date.format("%Y-%m-%d"), extension))
}

/// 把记录追加到CSV文件中。文件不存在时先写表头；
/// 所有值里的双引号都会被去掉（不是转义）。
pub fn append_report(
    csv_file: &Path,
    columns: &[Field],
    records: &[LogRecord]
) -> Result<(), ReportError> {
    if let Some(parent) = csv_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let is_new = !csv_file.exists();

    let file = OpenOptions::new().create(true).append(true).open(csv_file)?;
    let mut wtr = WriterBuilder::new().flexible(false).from_writer(file);

    if is_new {
        wtr.write_record(columns.iter().map(|field| field.label()))?;
    }
    for record in records {
        wtr.write_record(
            columns.iter().map(|field| record.get(*field).unwrap_or_default().replace('"', ""))
        )?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_record() -> LogRecord {
        LogRecord {
            ip: Some("8.8.8.8".to_string()),
            endpoint: Some("/search?q=\"rust\"".to_string()),
            status: Some("200".to_string()),
            method: Some("GET".to_string()),
            date: Some("2020-10-10".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn inserts_date_before_extension() {
        let date = NaiveDate::from_ymd_opt(2020, 10, 10).unwrap();
        assert_eq!(
            report_file_name(Path::new("reports/log-report.csv"), date),
            PathBuf::from("reports/log-report.2020-10-10.csv")
        );
        assert_eq!(report_file_name(Path::new("daily"), date), PathBuf::from("daily.2020-10-10.csv"));
    }

    #[test]
    fn header_is_written_only_for_new_file() {
        let dir = TempDir::new().unwrap();
        let csv_file = dir.path().join("out").join("report.2020-10-10.csv");
        let columns = [Field::Ip, Field::Method, Field::Endpoint, Field::City];

        append_report(&csv_file, &columns, &[sample_record()]).unwrap();
        append_report(&csv_file, &columns, &[sample_record()]).unwrap();

        let contents = fs::read_to_string(&csv_file).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec![
            "IP Address,HTTP Method,Endpoint,Requesting City",
            "8.8.8.8,GET,/search?q=rust,",
            "8.8.8.8,GET,/search?q=rust,"
        ]);
    }

    #[test]
    fn default_columns_write_every_label() {
        let dir = TempDir::new().unwrap();
        let csv_file = dir.path().join("report.csv");
        append_report(&csv_file, &Field::ALL, &[]).unwrap();

        let contents = fs::read_to_string(&csv_file).unwrap();
        assert!(contents.starts_with("IP Address,Endpoint,HTTP Status,HTTP Method,"));
        assert!(contents.trim_end().ends_with("Request Timezone,unused,Raw Entry"));
    }

    #[test]
    fn missing_log_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = read_log_file(dir.path().join("access.log"));
        assert!(matches!(result, Err(ReportError::ReadLog { .. })));
    }

    #[test]
    fn blank_log_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access.log");
        fs::write(&path, "\n  \n").unwrap();
        assert!(matches!(read_log_file(&path), Err(ReportError::EmptyLog(_))));
    }

    #[test]
    fn keeps_line_order_and_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access.log");
        fs::write(&path, "b\r\na\nb\n").unwrap();
        assert_eq!(read_log_file(&path).unwrap(), vec!["b", "a", "b"]);
    }
}

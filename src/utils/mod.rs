pub mod cli; // 命令行参数
pub mod common; // 公共的函数，不好分类，可以迁移到其它项目的可能性高
pub mod error; // 错误类型
pub mod files; // 与文件相关：读取访问日志、写入CSV报告
pub mod geo_cache; // IP地理位置的本地缓存
pub mod geoplugin; // 远程查询IP地理位置（geoplugin.net）
pub mod logger; // 日志初始化
pub mod models; // 数据结构
pub mod network; // 与IP地址相关的判断
pub mod parser; // 解析访问日志的一行
pub mod report; // 汇总生成报告的记录

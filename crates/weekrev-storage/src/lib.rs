//! 周报系统的持久层。
//!
//! [`store::ReportStore`] 是管理数据库的统一访问入口（SeaORM + SQLite，
//! 连接 URL 可配置）。周统计计数（report_count / locked_count /
//! unlocked_count）只通过 `recompute_week_statistics` 一个路径写入，
//! 且与触发它的写操作同属一个事务。
//!
//! 报告正文同时镜像到数据目录下的 Markdown 文件（[`files::ReportFileStore`]），
//! 作为文档导出的数据源；数据库列是兜底。

pub mod entities;
pub mod error;
pub mod files;
pub mod store;


pub use error::{Result, StorageError};
pub use store::ReportStore;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 报告正文的磁盘镜像。
///
/// 周报正文写入 `<root>/reports/<id>.md`，整合报告写入
/// `<root>/integration/<id>.md`。文档导出优先读镜像文件，数据库列兜底。
pub struct ReportFileStore {
    root: PathBuf,
}

impl ReportFileStore {
    pub fn new(root: &Path) -> io::Result<Self> {
        fs::create_dir_all(root.join("reports"))?;
        fs::create_dir_all(root.join("integration"))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn report_path(&self, id: &str) -> PathBuf {
        self.root.join("reports").join(format!("{id}.md"))
    }

    fn integration_path(&self, id: &str) -> PathBuf {
        self.root.join("integration").join(format!("{id}.md"))
    }

    pub fn write_report(&self, id: &str, content: &str) -> io::Result<()> {
        fs::write(self.report_path(id), content)
    }

    /// 读取镜像文件；不存在或不可读时返回 `None`，由调用方回退到数据库列。
    pub fn read_report(&self, id: &str) -> Option<String> {
        fs::read_to_string(self.report_path(id)).ok()
    }

    pub fn remove_report(&self, id: &str) {
        if let Err(e) = fs::remove_file(self.report_path(id)) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(report_id = %id, error = %e, "Failed to remove report mirror file");
            }
        }
    }

    /// 写整合报告镜像，返回相对路径（存入 `file_path` 列）。
    pub fn write_integration(&self, id: &str, content: &str) -> io::Result<String> {
        fs::write(self.integration_path(id), content)?;
        Ok(format!("integration/{id}.md"))
    }

    pub fn read_integration(&self, id: &str) -> Option<String> {
        fs::read_to_string(self.integration_path(id)).ok()
    }

    pub fn remove_integration(&self, id: &str) {
        if let Err(e) = fs::remove_file(self.integration_path(id)) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(report_id = %id, error = %e, "Failed to remove integration mirror file");
            }
        }
    }
}

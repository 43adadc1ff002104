use std::{collections::HashSet, fs, path::Path};

use mention_core::{directory::Directory, model::Candidate};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("读取候选文件失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("候选文件不是合法 JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("第 {0} 条候选缺少 id/name")]
    MissingField(usize),

    #[error("第 {index} 条候选的 id 重复: {id}")]
    DuplicateId { index: usize, id: String },
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
}

/// 静态候选目录（代替真实的用户查询服务）。
///
/// JSON 格式：
///
/// - `[{"id": "1", "name": "Alice Johnson"}, ...]`
/// - 顺序即展示顺序
/// - id 不能为空且不能重复，name 不能为空
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: Vec<Candidate>,
}

impl StaticDirectory {
    /// 内置的演示用户列表。
    pub fn mock() -> Self {
        const USERS: [(&str, &str); 10] = [
            ("1", "Alice Johnson"),
            ("2", "Albert Chen"),
            ("3", "Bob Smith"),
            ("4", "Carol Williams"),
            ("5", "David Brown"),
            ("6", "Eve Davis"),
            ("7", "Frank Miller"),
            ("8", "Grace Lee"),
            ("9", "Hannah Wilson"),
            ("10", "Ivan Petrov"),
        ];
        Self {
            users: USERS
                .iter()
                .map(|(id, name)| Candidate::new(*id, *name))
                .collect(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let s = fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }

    pub fn from_json_str(s: &str) -> Result<Self, DirectoryError> {
        let entries: Vec<Entry> = serde_json::from_str(s)?;
        let mut seen: HashSet<String> = HashSet::new();
        let mut users = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.into_iter().enumerate() {
            let id = entry.id.trim();
            let name = entry.name.trim();
            if id.is_empty() || name.is_empty() {
                return Err(DirectoryError::MissingField(idx + 1));
            }
            if !seen.insert(id.to_owned()) {
                return Err(DirectoryError::DuplicateId {
                    index: idx + 1,
                    id: id.to_owned(),
                });
            }
            users.push(Candidate::new(id, name));
        }
        debug!(count = users.len(), "loaded candidate directory");
        Ok(Self { users })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Directory for StaticDirectory {
    fn list_all(&self) -> Vec<Candidate> {
        self.users.clone()
    }
}

use std::path::PathBuf;

/// Name of the project-local state directory.
pub const DATAOPS_DIR: &str = ".dataops";

/// Locations derived from the project root.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub dataops_dir: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: PathBuf) -> Self {
        let dataops_dir = root.join(DATAOPS_DIR);
        Self { root, dataops_dir }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dataops_dir.join("config.toml")
    }

    pub fn default_data_dir(&self) -> PathBuf {
        self.dataops_dir.join("data")
    }

    pub fn default_log_dir(&self) -> PathBuf {
        self.dataops_dir.join("logs")
    }

    pub fn default_state_dir(&self) -> PathBuf {
        self.dataops_dir.join("run")
    }

    pub fn default_database_path(&self) -> PathBuf {
        self.dataops_dir.join("data.db")
    }
}

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const EXAMPLE_SITE: &str = r#"
site "example.com" {
    index "index.html"
    error "error.html"
    source "dist"
}

zone "example.com" id="Z0123456789"
"#;

pub struct TestProject {
    pub root: TempDir,
    config_home: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let config_home = tempfile::tempdir().unwrap();
        Self { root, config_home }
    }

    pub fn write_site_kdl(&self, content: &str) {
        fs::write(self.root.path().join("site.kdl"), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_asset(&self, relative: &str, content: &str) {
        let path = self.root.path().join("dist").join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// プロジェクト内で実行する sitestack コマンド
    ///
    /// グローバル設定や呼び出し元の環境変数の影響を受けないようにする
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("sitestack").unwrap();
        cmd.current_dir(self.root.path())
            .env_remove("SITESTACK_CONFIG_PATH")
            .env("XDG_CONFIG_HOME", self.config_home.path())
            .env("NO_COLOR", "1");
        cmd
    }
}

pub mod error;

pub use error::*;

use std::path::{Path, PathBuf};

/// サイト定義ファイルのパスを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "SITESTACK_CONFIG_PATH";

/// プロジェクト内の設定ディレクトリ名
pub const PROJECT_CONFIG_DIR: &str = ".sitestack";

/// 検索するファイル名（優先順）
const CANDIDATES: [&str; 4] = ["site.local.kdl", ".site.local.kdl", "site.kdl", ".site.kdl"];

/// グローバル設定ファイルのパス（~/.config/sitestack/site.kdl）
///
/// ディレクトリは作成しない。存在確認は呼び出し側で行う。
pub fn global_site_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sitestack").join("site.kdl"))
}

/// プロジェクトのsite.kdlファイルを探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 SITESTACK_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: site.local.kdl, .site.local.kdl, site.kdl, .site.kdl
/// 3. ./.sitestack/ ディレクトリ内: 同様の順序
/// 4. ~/.config/sitestack/site.kdl (グローバル設定)
pub fn find_site_file() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if !path.is_file() {
            return Err(ConfigError::ConfigPathNotFound(path));
        }
        tracing::debug!(path = %path.display(), "Using site file from environment");
        return Ok(path);
    }

    let current_dir = std::env::current_dir()?;
    let global = global_site_file();

    find_site_file_in(&current_dir, global.as_deref()).ok_or(ConfigError::SiteFileNotFound)
}

/// 指定ディレクトリを起点に検索（手順2〜4）
pub fn find_site_file_in(dir: &Path, global: Option<&Path>) -> Option<PathBuf> {
    // 2. 指定ディレクトリで検索
    if let Some(path) = first_existing(dir) {
        return Some(path);
    }

    // 3. ./.sitestack/ ディレクトリで検索
    let project_dir = dir.join(PROJECT_CONFIG_DIR);
    if project_dir.is_dir() {
        if let Some(path) = first_existing(&project_dir) {
            return Some(path);
        }
    }

    // 4. グローバル設定ファイル
    global.filter(|path| path.is_file()).map(Path::to_path_buf)
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// サイト定義ファイルからプロジェクトルートを決定
///
/// ファイルを含むディレクトリ。ただし `.sitestack/` 内にある場合はその親。
pub fn project_root_for(site_file: &Path) -> PathBuf {
    let dir = site_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    if dir.file_name().is_some_and(|name| name == PROJECT_CONFIG_DIR) {
        if let Some(parent) = dir.parent().filter(|p| !p.as_os_str().is_empty()) {
            return parent.to_path_buf();
        }
        return PathBuf::from(".");
    }

    dir.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial]
    fn test_global_site_file_does_not_create_dir() {
        let home = tempfile::tempdir().unwrap();
        let original = std::env::var_os("XDG_CONFIG_HOME");

        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", home.path());
        }
        let global = global_site_file();
        unsafe {
            match original {
                Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
                None => std::env::remove_var("XDG_CONFIG_HOME"),
            }
        }

        if let Some(path) = global {
            assert!(path.ends_with("sitestack/site.kdl"));
        }
        assert!(!home.path().join("sitestack").exists());
    }

    #[test]
    fn test_find_in_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("site.kdl"), "// test").unwrap();

        let found = find_site_file_in(temp_dir.path(), None).unwrap();
        assert!(found.ends_with("site.kdl"));
    }

    #[test]
    fn test_local_file_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("site.kdl"), "// shared").unwrap();
        fs::write(temp_dir.path().join("site.local.kdl"), "// local").unwrap();

        let found = find_site_file_in(temp_dir.path(), None).unwrap();
        assert!(found.ends_with("site.local.kdl"));
    }

    #[test]
    fn test_hidden_local_before_visible() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(".site.local.kdl"), "// hidden local").unwrap();
        fs::write(temp_dir.path().join("site.kdl"), "// visible").unwrap();

        let found = find_site_file_in(temp_dir.path(), None).unwrap();
        assert!(found.ends_with(".site.local.kdl"));
    }

    #[test]
    fn test_find_in_project_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_dir = temp_dir.path().join(PROJECT_CONFIG_DIR);
        fs::create_dir(&project_dir).unwrap();
        fs::write(project_dir.join("site.kdl"), "// in project dir").unwrap();

        let found = find_site_file_in(temp_dir.path(), None).unwrap();
        assert!(found.ends_with(".sitestack/site.kdl"));
        assert_eq!(project_root_for(&found), temp_dir.path());
    }

    #[test]
    fn test_global_fallback() {
        let temp_dir = tempfile::tempdir().unwrap();
        let global_dir = tempfile::tempdir().unwrap();
        let global = global_dir.path().join("site.kdl");

        assert!(find_site_file_in(temp_dir.path(), Some(&global)).is_none());

        fs::write(&global, "// global").unwrap();
        assert_eq!(
            find_site_file_in(temp_dir.path(), Some(&global)).unwrap(),
            global
        );
    }

    #[test]
    fn test_project_root_for() {
        assert_eq!(
            project_root_for(Path::new("/srv/web/site.kdl")),
            PathBuf::from("/srv/web")
        );
        assert_eq!(
            project_root_for(Path::new("/srv/web/.sitestack/site.kdl")),
            PathBuf::from("/srv/web")
        );
        assert_eq!(project_root_for(Path::new("site.kdl")), PathBuf::from("."));
        assert_eq!(
            project_root_for(Path::new(".sitestack/site.kdl")),
            PathBuf::from(".")
        );
    }

    #[test]
    #[serial]
    fn test_find_site_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("site.kdl"), "// test").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_site_file();

        // 元のディレクトリに戻る
        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.unwrap().ends_with("site.kdl"));
    }

    #[test]
    #[serial]
    fn test_find_site_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.kdl");
        fs::write(&config_path, "// custom").unwrap();

        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        }
        let result = find_site_file();
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    #[serial]
    fn test_env_var_pointing_nowhere() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing.kdl");

        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, missing.to_str().unwrap());
        }
        let result = find_site_file();
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }

        assert!(matches!(result, Err(ConfigError::ConfigPathNotFound(p)) if p == missing));
    }
}

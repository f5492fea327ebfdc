//! mecabrc の読み込み
//!
//! このモジュールは、辞書ディレクトリやユーザー辞書の場所を定義する
//! 設定ファイル（mecabrc）を探索・解析します。

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use hashbrown::HashMap;
use regex::Regex;

use crate::errors::{HinokiError, Result};

static ENTRY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s*=\s*(\S+)").unwrap());

/// mecabrc の場所を指定する環境変数
pub const MECABRC_ENV: &str = "MECABRC";

/// 環境変数が未設定のときに探索するパス
pub const DEFAULT_MECABRC_PATHS: &[&str] = &["/usr/local/etc/mecabrc", "/etc/mecabrc"];

/// 辞書ディレクトリを指定するキー
pub const DICDIR_KEY: &str = "dicdir";

/// ユーザー辞書を指定するキー
pub const USERDIC_KEY: &str = "userdic";

/// 解析済みの mecabrc
///
/// `key = value` 形式の行をキーと値の組として保持します。
/// それ以外の行（コメントや空行）は無視し、同じキーは後の行が優先されます。
#[derive(Debug, Clone, Default)]
pub struct MecabRc {
    path: Option<PathBuf>,
    entries: HashMap<String, String>,
}

impl MecabRc {
    /// 設定ファイルを探索して読み込みます。
    ///
    /// `path`が指定されていればそのファイルを、そうでなければ
    /// 環境変数`MECABRC`、`/usr/local/etc/mecabrc`、`/etc/mecabrc`の順に探索します。
    ///
    /// # エラー
    ///
    /// 設定ファイルが見つからない場合、または読み込めない場合にエラーを返します。
    pub fn find(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_path(path);
        }
        let candidates = env::var_os(MECABRC_ENV)
            .map(PathBuf::from)
            .into_iter()
            .chain(DEFAULT_MECABRC_PATHS.iter().map(PathBuf::from));
        for candidate in candidates {
            if candidate.is_file() {
                return Self::from_path(candidate);
            }
        }
        Err(HinokiError::invalid_config(
            "rcfile",
            format!(
                "no mecabrc found (${MECABRC_ENV}, {})",
                DEFAULT_MECABRC_PATHS.join(", ")
            ),
        ))
    }

    /// ファイルから設定を読み込みます。
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            return Err(HinokiError::PathIsDirectory(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        let mut rc = Self::parse(&String::from_utf8_lossy(&bytes));
        rc.path = Some(path.to_path_buf());
        log::debug!("[hinoki] mecabrc: {} ({} keys)", path.display(), rc.entries.len());
        Ok(rc)
    }

    /// 設定ファイルの内容を解析します。
    pub fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();
        for line in text.lines() {
            if let Some(caps) = ENTRY_PATTERN.captures(line) {
                entries.insert(caps[1].to_string(), caps[2].to_string());
            }
        }
        Self {
            path: None,
            entries,
        }
    }

    /// 読み込んだファイルのパスを返します。
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// キーに対応する値を返します。
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// キーの値を上書きします。
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.entries.insert(key.into(), value.into());
    }

    /// 辞書ディレクトリ内のファイルパスを返します。
    ///
    /// # 引数
    ///
    /// * `name` - 辞書ファイル名（`sys.dic`など）
    ///
    /// # エラー
    ///
    /// `dicdir`が定義されていない場合にエラーを返します。
    pub fn dic_path(&self, name: &str) -> Result<PathBuf> {
        let dicdir = self.get(DICDIR_KEY).ok_or_else(|| {
            HinokiError::invalid_config(DICDIR_KEY, format!("required to locate {name}"))
        })?;
        Ok(Path::new(dicdir).join(name))
    }

    /// ユーザー辞書のパスを返します。
    pub fn user_dic_path(&self) -> Option<PathBuf> {
        self.get(USERDIC_KEY).map(PathBuf::from)
    }
}

//! トークン化のための辞書モジュール。
//!
//! このモジュールは、形態素解析に必要な辞書データの読み込みと管理を行います。
//! MeCab形式でコンパイル済みの次のファイルを扱います:
//!
//! - `sys.dic`: システム辞書
//! - `unk.dic`: 未知語辞書
//! - `char.bin`: 文字カテゴリ定義
//! - `matrix.bin`: 連接コスト行列
//! - ユーザー辞書（任意、システム辞書と同じ形式）
//!
//! # 辞書の読み込み方法
//!
//! - [`Dictionary::from_mecabrc`]: mecabrc から辞書ディレクトリを解決して読み込む
//! - [`Dictionary::from_paths`]: 各ファイルのパスを直接指定して読み込む
//! - [`Dictionary::from_parts`]: 読み込み済みの構成要素から組み立てる
//!
//! すべてのファイルは読み取り専用でメモリマップされ、`Dictionary`が破棄されるまで保持されます。
pub(crate) mod buffer;
pub(crate) mod character;
pub(crate) mod config;
pub(crate) mod connector;
pub(crate) mod lexicon;
pub(crate) mod unknown;
pub(crate) mod word_idx;

use std::path::{Path, PathBuf};

use crate::errors::Result;

pub use crate::dictionary::character::{CharInfo, CharProperty, decode_char};
pub use crate::dictionary::config::MecabRc;
pub use crate::dictionary::connector::{ConnectorCost, ConnectorView, MatrixConnector};
pub use crate::dictionary::lexicon::{DicEntry, Lexicon, TrieMatch, WordParam};
pub use crate::dictionary::unknown::UnkHandler;
pub use crate::dictionary::word_idx::WordIdx;

/// 辞書の種類
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LexType {
    /// システム辞書
    #[default]
    System,
    /// ユーザー辞書
    User,
    /// 未知語辞書
    Unknown,
}

impl LexType {
    /// エラーやログで辞書を指す名前を返します。
    pub(crate) const fn file_name(self) -> &'static str {
        match self {
            Self::System => "sys.dic",
            Self::User => "userdic",
            Self::Unknown => "unk.dic",
        }
    }
}

/// 辞書を構成する各ファイルのパス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryPaths {
    /// システム辞書
    pub sys_dic: PathBuf,
    /// 未知語辞書
    pub unk_dic: PathBuf,
    /// 文字カテゴリ定義
    pub char_bin: PathBuf,
    /// 連接コスト行列
    pub matrix_bin: PathBuf,
    /// ユーザー辞書
    pub user_dic: Option<PathBuf>,
}

impl DictionaryPaths {
    /// 辞書ディレクトリ内の標準的なファイル名からパスを組み立てます。
    pub fn from_dicdir<P: AsRef<Path>>(dicdir: P) -> Self {
        let dicdir = dicdir.as_ref();
        Self {
            sys_dic: dicdir.join("sys.dic"),
            unk_dic: dicdir.join("unk.dic"),
            char_bin: dicdir.join("char.bin"),
            matrix_bin: dicdir.join("matrix.bin"),
            user_dic: None,
        }
    }

    /// mecabrc の設定からパスを解決します。
    ///
    /// # エラー
    ///
    /// `dicdir`が定義されていない場合にエラーを返します。
    pub fn from_mecabrc(rc: &MecabRc) -> Result<Self> {
        Ok(Self {
            sys_dic: rc.dic_path("sys.dic")?,
            unk_dic: rc.dic_path("unk.dic")?,
            char_bin: rc.dic_path("char.bin")?,
            matrix_bin: rc.dic_path("matrix.bin")?,
            user_dic: rc.user_dic_path(),
        })
    }
}

/// 形態素解析に用いる辞書一式
///
/// 構築後は変更されず、複数のスレッドから同時に参照できます。
pub struct Dictionary {
    system_lexicon: Lexicon,
    user_lexicon: Option<Lexicon>,
    unk_handler: UnkHandler,
    char_prop: CharProperty,
    connector: MatrixConnector,
}

impl Dictionary {
    /// mecabrc を探索し、そこに記述された辞書を読み込みます。
    ///
    /// # 引数
    ///
    /// * `rcfile` - mecabrc のパス。`None`の場合は標準の場所を探索します。
    ///
    /// # エラー
    ///
    /// 設定ファイルが見つからない場合や、必須の辞書ファイルを読み込めない場合にエラーを返します。
    pub fn from_mecabrc(rcfile: Option<&Path>) -> Result<Self> {
        let rc = MecabRc::find(rcfile)?;
        Self::from_paths(&DictionaryPaths::from_mecabrc(&rc)?)
    }

    /// 各ファイルのパスから辞書を読み込みます。
    ///
    /// ユーザー辞書を開けない場合は警告を出力し、ユーザー辞書なしで続行します。
    ///
    /// # エラー
    ///
    /// 必須の辞書ファイルを開けない場合、またはフォーマットが不正な場合にエラーを返します。
    pub fn from_paths(paths: &DictionaryPaths) -> Result<Self> {
        log::debug!("[hinoki] loading dictionary from {}", paths.sys_dic.display());
        let system_lexicon = Lexicon::from_path(&paths.sys_dic, LexType::System)?;
        let unk_handler = UnkHandler::from_path(&paths.unk_dic)?;
        let char_prop = CharProperty::from_path(&paths.char_bin)?;
        let connector = MatrixConnector::from_path(&paths.matrix_bin)?;

        let user_lexicon = paths.user_dic.as_ref().and_then(|path| {
            Lexicon::from_path(path, LexType::User)
                .inspect_err(|e| {
                    log::warn!(
                        "[hinoki] user dictionary {} is disabled: {e}",
                        path.display()
                    );
                })
                .ok()
        });

        Ok(Self::from_parts(
            system_lexicon,
            unk_handler,
            char_prop,
            connector,
        )
        .with_user_lexicon(user_lexicon))
    }

    /// 読み込み済みの構成要素から辞書を組み立てます。
    ///
    /// 辞書と接続行列の文脈IDの数が一致しない場合は警告を出力します。
    pub fn from_parts(
        system_lexicon: Lexicon,
        unk_handler: UnkHandler,
        char_prop: CharProperty,
        connector: MatrixConnector,
    ) -> Self {
        check_context_sizes(&system_lexicon, &connector);
        check_context_sizes(unk_handler.lexicon(), &connector);
        Self {
            system_lexicon,
            user_lexicon: None,
            unk_handler,
            char_prop,
            connector,
        }
    }

    /// ユーザー辞書を設定します。
    ///
    /// # 引数
    ///
    /// * `user_lexicon` - ユーザー辞書。`None`の場合はユーザー辞書を無効にします。
    pub fn with_user_lexicon(mut self, user_lexicon: Option<Lexicon>) -> Self {
        if let Some(lex) = &user_lexicon {
            check_context_sizes(lex, &self.connector);
        }
        self.user_lexicon = user_lexicon;
        self
    }

    /// システム辞書を返します。
    #[inline(always)]
    pub const fn system_lexicon(&self) -> &Lexicon {
        &self.system_lexicon
    }

    /// ユーザー辞書を返します。
    #[inline(always)]
    pub const fn user_lexicon(&self) -> Option<&Lexicon> {
        self.user_lexicon.as_ref()
    }

    /// 未知語ハンドラーを返します。
    #[inline(always)]
    pub const fn unk_handler(&self) -> &UnkHandler {
        &self.unk_handler
    }

    /// 文字プロパティを返します。
    #[inline(always)]
    pub const fn char_prop(&self) -> &CharProperty {
        &self.char_prop
    }

    /// 接続行列を返します。
    #[inline(always)]
    pub const fn connector(&self) -> &MatrixConnector {
        &self.connector
    }
}

impl std::fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dictionary")
            .field("system_lexicon", &self.system_lexicon)
            .field("user_lexicon", &self.user_lexicon)
            .field("connector", &self.connector)
            .finish_non_exhaustive()
    }
}

fn check_context_sizes(lexicon: &Lexicon, connector: &MatrixConnector) {
    let (left, right) = (lexicon.num_left() as usize, lexicon.num_right() as usize);
    if left != connector.num_left() || right != connector.num_right() {
        log::warn!(
            "[hinoki] {}: context size {left}x{right} differs from matrix.bin {}x{}",
            lexicon.lex_type().file_name(),
            connector.num_left(),
            connector.num_right(),
        );
    }
}

//! Viterbiアルゴリズムに基づくトークナイザー。
//!
//! このモジュールは、日本語形態素解析のためのメイントークナイザーを提供します。
//! 入力の先頭から順に、ユーザー辞書、システム辞書、未知語処理の候補を
//! ラティスに挿入し、Viterbiアルゴリズムで最適な形態素列を求めます。
//!
//! # 主要な構造体
//!
//! - [`Tokenizer`]: 辞書を共有する読み取り専用のトークナイザー
//! - [`Worker`]: トークナイザーのワーカー。実際の解析処理を行う
//!
//! # 例
//!
//! ```no_run
//! use hinoki::Tokenizer;
//!
//! let tokenizer = Tokenizer::from_mecabrc(None)?;
//! let mut worker = tokenizer.new_worker();
//!
//! worker.reset_sentence("すもももももももものうち");
//! worker.tokenize()?;
//!
//! for token in worker.token_iter() {
//!     println!("{}\t{}", token.surface(), token.feature());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod lattice;
pub mod nbest_generator;
pub mod worker;

use std::path::Path;
use std::sync::Arc;

use crate::dictionary::Dictionary;
use crate::dictionary::connector::ConnectorCost;
use crate::dictionary::lexicon::DicEntry;
use crate::errors::Result;
use crate::sentence::Sentence;
use crate::token::TokenBuf;
use crate::tokenizer::lattice::Lattice;
use crate::tokenizer::worker::Worker;

/// 形態素解析を実行するトークナイザー
///
/// 辞書は[`Arc`]で共有されるため、複製は安価で、複数のスレッドから同時に使用できます。
/// 解析ごとの状態は[`Worker`]が保持します。
#[derive(Clone)]
pub struct Tokenizer {
    dict: Arc<Dictionary>,
}

impl Tokenizer {
    /// 新しいトークナイザーを作成します。
    ///
    /// # 引数
    ///
    /// * `dict` - 辞書
    pub fn new(dict: Dictionary) -> Self {
        Self {
            dict: Arc::new(dict),
        }
    }

    /// 共有された辞書から新しいトークナイザーを作成します。
    pub fn from_shared_dictionary(dict: Arc<Dictionary>) -> Self {
        Self { dict }
    }

    /// mecabrc に記述された辞書を読み込んでトークナイザーを作成します。
    ///
    /// # 引数
    ///
    /// * `rcfile` - mecabrc のパス。`None`の場合は標準の場所を探索します。
    ///
    /// # エラー
    ///
    /// 設定ファイルや必須の辞書ファイルを読み込めない場合にエラーを返します。
    pub fn from_mecabrc(rcfile: Option<&Path>) -> Result<Self> {
        Ok(Self::new(Dictionary::from_mecabrc(rcfile)?))
    }

    /// 辞書を返します。
    #[inline(always)]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    /// 新しいワーカーを作成します。
    pub fn new_worker(&self) -> Worker<'_> {
        Worker::new(self)
    }

    /// 入力文を最良の形態素列に分割します。
    ///
    /// # 戻り値
    ///
    /// 文頭から順に並んだトークン
    ///
    /// # エラー
    ///
    /// 辞書が壊れている場合にエラーを返します。
    pub fn tokenize<S>(&self, text: S) -> Result<Vec<TokenBuf>>
    where
        S: AsRef<str>,
    {
        let mut worker = self.new_worker();
        worker.reset_sentence(text);
        worker.tokenize()?;
        Ok(worker.token_iter().map(|t| t.to_buf()).collect())
    }

    /// 入力文をコストの低い順に最大`n`通りの形態素列に分割します。
    ///
    /// # 戻り値
    ///
    /// 総コストの昇順に並んだ分割結果
    ///
    /// # エラー
    ///
    /// 辞書が壊れている場合にエラーを返します。
    pub fn tokenize_nbest<S>(&self, text: S, n: usize) -> Result<Vec<Vec<TokenBuf>>>
    where
        S: AsRef<str>,
    {
        let mut worker = self.new_worker();
        worker.reset_sentence(text);
        worker.tokenize_nbest(n)?;
        Ok((0..worker.num_nbest_paths())
            .filter_map(|i| worker.nbest_token_iter(i))
            .map(|iter| iter.map(|t| t.to_buf()).collect())
            .collect())
    }

    /// 入力文からラティスを構築して閉じます。
    pub(crate) fn build_lattice<'t>(
        &'t self,
        sent: &Sentence,
        lattice: &mut Lattice<'t>,
    ) -> Result<()> {
        let dict: &'t Dictionary = &self.dict;
        let connector = dict.connector();
        let input = sent.raw().as_bytes();

        lattice.reset(input.len());

        while lattice.position() <= input.len() {
            let offset = lattice.position() - 1;
            let rest = &input[offset..];

            let mut matched = false;
            if let Some(user_lexicon) = dict.user_lexicon() {
                let entries = user_lexicon.lookup(rest)?;
                matched |= Self::insert_entries(sent, lattice, offset, &entries, connector)?;
            }
            let entries = dict.system_lexicon().lookup(rest)?;
            matched |= Self::insert_entries(sent, lattice, offset, &entries, connector)?;

            let (entries, invoke) = dict
                .unk_handler()
                .lookup_unknowns(rest, dict.char_prop())?;
            if invoke || !matched {
                Self::insert_entries(sent, lattice, offset, &entries, connector)?;
            }

            lattice.advance()?;
        }

        lattice.close(connector)
    }

    fn insert_entries<'t, C>(
        sent: &Sentence,
        lattice: &mut Lattice<'t>,
        offset: usize,
        entries: &[DicEntry<'_, 't>],
        connector: &C,
    ) -> Result<bool>
    where
        C: ConnectorCost + ?Sized,
    {
        let mut inserted = false;
        for entry in entries {
            let end = offset + entry.surface.len();
            if !sent.is_char_boundary(end) {
                log::trace!(
                    "[hinoki] skipped {:?} at {offset}: ends inside a character",
                    entry.word_idx
                );
                continue;
            }
            lattice.insert_entry(entry, connector)?;
            inserted = true;
        }
        Ok(inserted)
    }
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("dict", &self.dict)
            .finish()
    }
}

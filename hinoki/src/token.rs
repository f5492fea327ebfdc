//! トークンの結果コンテナ
//!
//! このモジュールは、形態素解析の結果として得られるトークンを表現する型を提供します。
//! トークンは入力文とラティスのノードへの参照を保持し、表層形、素性、
//! 位置情報などへのアクセスを提供します。

use std::ops::Range;

use crate::dictionary::{LexType, WordIdx};
use crate::sentence::Sentence;
use crate::tokenizer::lattice::Node;

/// 形態素解析の結果トークン
///
/// このトークンは[`Worker`](crate::tokenizer::worker::Worker)への軽量な参照であり、
/// 実際のデータはWorkerが保持しています。トークンはWorkerが生存している間のみ有効です。
///
/// A lightweight view of a token, borrowing the `Worker`.
#[derive(Clone, Copy)]
pub struct Token<'w> {
    sent: &'w Sentence,
    node: &'w Node<'w>,
}

impl<'w> Token<'w> {
    #[inline(always)]
    pub(crate) const fn new(sent: &'w Sentence, node: &'w Node<'w>) -> Self {
        Self { sent, node }
    }

    /// トークンのバイト単位の位置範囲を取得します。
    ///
    /// Gets the position range of the token in bytes.
    #[inline(always)]
    pub fn range_byte(&self) -> Range<usize> {
        self.node.start - 1..self.node.end - 1
    }

    /// トークンの文字単位の位置範囲を取得します。
    ///
    /// Gets the position range of the token in characters.
    #[inline(always)]
    pub fn range_char(&self) -> Range<usize> {
        let range = self.range_byte();
        self.sent.char_position(range.start)..self.sent.char_position(range.end)
    }

    /// トークンの表層形（元のテキスト中の文字列）を取得します。
    ///
    /// Gets the surface string of the token.
    #[inline(always)]
    pub fn surface(&self) -> &'w str {
        &self.sent.raw()[self.range_byte()]
    }

    /// トークンの素性（品詞などの情報）を取得します。
    ///
    /// 素性の形式は辞書によって異なります。
    ///
    /// Gets the feature string of the token.
    #[inline(always)]
    pub fn feature(&self) -> &'w str {
        self.node.feature()
    }

    /// トークンの単語インデックスを取得します。
    ///
    /// Gets the word index of the token.
    #[inline(always)]
    pub fn word_idx(&self) -> WordIdx {
        self.node.word_idx()
    }

    /// トークンが由来する辞書のタイプを取得します。
    ///
    /// Gets the lexicon type where the token is from.
    #[inline(always)]
    pub fn lex_type(&self) -> LexType {
        self.word_idx().lex_type
    }

    /// トークンノードの左文脈IDを取得します。
    ///
    /// Gets the left id of the token's node.
    #[inline(always)]
    pub fn left_id(&self) -> u16 {
        self.node.left_id
    }

    /// トークンノードの右文脈IDを取得します。
    ///
    /// Gets the right id of the token's node.
    #[inline(always)]
    pub fn right_id(&self) -> u16 {
        self.node.right_id
    }

    /// トークンノードの品詞IDを取得します。
    ///
    /// Gets the part-of-speech id of the token's node.
    #[inline(always)]
    pub fn pos_id(&self) -> u16 {
        self.node.pos_id()
    }

    /// トークンノードの単語コストを取得します。
    ///
    /// 値が低いほど出現しやすい単語です。
    ///
    /// Gets the word cost of the token's node.
    #[inline(always)]
    pub fn word_cost(&self) -> i32 {
        self.node.word_cost
    }

    /// 文頭からこのトークンノードまでの累積コストを取得します。
    ///
    /// 最良パスでは前向きのViterbi計算で求めた最小コストです。
    /// N-best解では、そのトークンを含むパスに沿った累積コストです。
    ///
    /// Gets the total cost from BOS to the token's node along its path.
    #[inline(always)]
    pub fn total_cost(&self) -> i64 {
        self.node.min_cost
    }

    /// このトークンビューを所有型の[`TokenBuf`]に変換します。
    ///
    /// Converts this token view into an owned `TokenBuf`.
    pub fn to_buf(&self) -> TokenBuf {
        TokenBuf {
            surface: self.surface().to_string(),
            feature: self.feature().to_string(),
            range_char: self.range_char(),
            range_byte: self.range_byte(),
            lex_type: self.lex_type(),
            word_idx: self.word_idx(),
            left_id: self.left_id(),
            right_id: self.right_id(),
            pos_id: self.pos_id(),
            word_cost: self.word_cost(),
            total_cost: self.total_cost(),
        }
    }
}

impl std::fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("surface", &self.surface())
            .field("range_char", &self.range_char())
            .field("range_byte", &self.range_byte())
            .field("feature", &self.feature())
            .field("lex_type", &self.lex_type())
            .field("word_idx", &self.word_idx())
            .field("left_id", &self.left_id())
            .field("right_id", &self.right_id())
            .field("pos_id", &self.pos_id())
            .field("word_cost", &self.word_cost())
            .field("total_cost", &self.total_cost())
            .finish()
    }
}

/// トークンのイテレータ
///
/// 前方および後方からの走査をサポートしています（[`DoubleEndedIterator`]を実装）。
///
/// Iterator of tokens.
pub struct TokenIter<'w> {
    sent: &'w Sentence,
    nodes: std::slice::Iter<'w, Node<'w>>,
}

impl<'w> TokenIter<'w> {
    #[inline(always)]
    pub(crate) fn new(sent: &'w Sentence, nodes: &'w [Node<'w>]) -> Self {
        Self {
            sent,
            nodes: nodes.iter(),
        }
    }
}

impl<'w> Iterator for TokenIter<'w> {
    type Item = Token<'w>;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        self.nodes.next().map(|node| Token::new(self.sent, node))
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

impl DoubleEndedIterator for TokenIter<'_> {
    #[inline(always)]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.nodes.next_back().map(|node| Token::new(self.sent, node))
    }
}

impl ExactSizeIterator for TokenIter<'_> {}

/// 特定のN-best解析パス内のトークンをイテレートするイテレータ
///
/// An iterator over tokens in a specific N-best path.
pub struct NbestTokenIter<'w> {
    inner: TokenIter<'w>,
    path_cost: i64,
}

impl<'w> NbestTokenIter<'w> {
    pub(crate) fn new(sent: &'w Sentence, nodes: &'w [Node<'w>], path_cost: i64) -> Self {
        Self {
            inner: TokenIter::new(sent, nodes),
            path_cost,
        }
    }

    /// このパスの総コストを返します。
    ///
    /// Gets the total cost of this path.
    #[inline(always)]
    pub const fn path_cost(&self) -> i64 {
        self.path_cost
    }
}

impl<'w> Iterator for NbestTokenIter<'w> {
    type Item = Token<'w>;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// 所有型の自己完結したトークン
///
/// このトークンは[`Token`]の所有型版です。形態素解析の結果を長期保存したり、
/// スレッド間で送信する際に有用です。
///
/// An owned, self-contained token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBuf {
    /// トークンの表層形（元のテキスト中の文字列）
    pub surface: String,

    /// トークンの素性情報（品詞など）
    pub feature: String,

    /// トークンの文字単位の位置範囲
    pub range_char: Range<usize>,

    /// トークンのバイト単位の位置範囲
    pub range_byte: Range<usize>,

    /// トークンが由来する辞書のタイプ
    pub lex_type: LexType,

    /// トークンの単語インデックス
    pub word_idx: WordIdx,

    /// トークンノードの左文脈ID
    pub left_id: u16,

    /// トークンノードの右文脈ID
    pub right_id: u16,

    /// トークンノードの品詞ID
    pub pos_id: u16,

    /// トークンノードの単語コスト
    pub word_cost: i32,

    /// 文頭からこのトークンノードまでの累積コスト
    pub total_cost: i64,
}

impl<'w> From<Token<'w>> for TokenBuf {
    fn from(token: Token<'w>) -> Self {
        token.to_buf()
    }
}

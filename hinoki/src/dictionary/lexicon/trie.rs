//! ダブル配列トライによる表層形の検索
//!
//! このモジュールは、MeCab形式の辞書に格納されたダブル配列を直接たどる
//! 完全一致検索と共通接頭辞検索を提供します。

use byteorder::{ByteOrder, LittleEndian};

const UNIT_LEN: usize = 8;

/// ダブル配列トライの読み取り専用ビュー
///
/// 各ユニットは`i32`のbaseと`u32`のcheckからなる8バイトのレコードです。
/// 終端ユニットのbaseは負の値で、`-base - 1`がトークン参照値になります。
#[derive(Clone, Copy)]
pub(crate) struct DoubleArray<'a> {
    units: &'a [u8],
}

impl<'a> DoubleArray<'a> {
    /// ダブル配列領域のバイト列からビューを作成します。
    #[inline(always)]
    pub const fn new(units: &'a [u8]) -> Self {
        Self { units }
    }

    /// ユニット数を返します。
    #[cfg(test)]
    pub const fn num_units(&self) -> usize {
        self.units.len() / UNIT_LEN
    }

    /// キーに完全一致する値を検索します。
    ///
    /// # 引数
    ///
    /// * `key` - 検索するバイト列
    ///
    /// # 戻り値
    ///
    /// 一致した場合はトークン参照値、一致しない場合は`None`
    pub fn exact_match_search(&self, key: &[u8]) -> Option<u32> {
        let mut b = self.base(0)?;
        for &c in key {
            b = self.transition(b, c)?;
        }
        self.terminal_value(b)
    }

    /// キーの接頭辞に一致する値をすべて検索します。
    ///
    /// 一致は短い順に並びます。
    ///
    /// # 引数
    ///
    /// * `key` - 検索するバイト列
    ///
    /// # 戻り値
    ///
    /// トークン参照値と一致したバイト長の組のベクトル
    pub fn common_prefix_search(&self, key: &[u8]) -> Vec<TrieMatch> {
        let mut matches = vec![];
        let Some(mut b) = self.base(0) else {
            return matches;
        };
        for (i, &c) in key.iter().enumerate() {
            if let Some(value) = self.terminal_value(b) {
                matches.push(TrieMatch::new(value, i));
            }
            match self.transition(b, c) {
                Some(next) => b = next,
                None => return matches,
            }
        }
        if let Some(value) = self.terminal_value(b) {
            matches.push(TrieMatch::new(value, key.len()));
        }
        matches
    }

    /// `b`から`c`で遷移した先のbaseを返します。
    #[inline(always)]
    fn transition(&self, b: i32, c: u8) -> Option<i32> {
        let p = i64::from(b) + i64::from(c) + 1;
        let p = usize::try_from(p).ok()?;
        if self.check(p)? != u32::try_from(b).ok()? {
            return None;
        }
        self.base(p)
    }

    #[inline(always)]
    fn terminal_value(&self, b: i32) -> Option<u32> {
        let p = usize::try_from(b).ok()?;
        let n = self.base(p)?;
        if self.check(p)? == u32::try_from(b).ok()? && n < 0 {
            u32::try_from(-i64::from(n) - 1).ok()
        } else {
            None
        }
    }

    #[inline(always)]
    fn base(&self, i: usize) -> Option<i32> {
        let off = i.checked_mul(UNIT_LEN)?;
        self.units.get(off..off + 4).map(LittleEndian::read_i32)
    }

    #[inline(always)]
    fn check(&self, i: usize) -> Option<u32> {
        let off = i.checked_mul(UNIT_LEN)?.checked_add(4)?;
        self.units.get(off..off + 4).map(LittleEndian::read_u32)
    }
}

/// トライの検索結果
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub struct TrieMatch {
    /// トークン参照値
    pub value: u32,

    /// 一致したバイト長
    pub end_byte: usize,
}

impl TrieMatch {
    /// 新しい検索結果を作成します。
    #[inline(always)]
    pub const fn new(value: u32, end_byte: usize) -> Self {
        Self { value, end_byte }
    }
}

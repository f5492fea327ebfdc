//! 辞書の語彙情報を管理するモジュール
//!
//! このモジュールは、MeCab形式のバイナリ辞書（`sys.dic`、`unk.dic`、ユーザー辞書）を読み込み、
//! 表層形の検索とトークンレコードの取得を提供します。
//!
//! # ファイルレイアウト
//!
//! ```text
//! [0, 72)                          ヘッダ
//! [72, 72 + dsize)                 ダブル配列
//! [.., .. + tsize)                 トークンテーブル（16バイト/レコード）
//! [.., .. + fsize)                 NUL終端の素性文字列
//! ```

mod param;
pub(crate) mod trie;

use std::fmt;
use std::ops::Range;
use std::path::Path;

use crate::dictionary::LexType;
use crate::dictionary::buffer::{BinaryCursor, DictBuffer};
use crate::dictionary::lexicon::trie::DoubleArray;
use crate::dictionary::word_idx::WordIdx;
use crate::errors::{HinokiError, Result};

pub use crate::dictionary::lexicon::param::WordParam;
pub use crate::dictionary::lexicon::trie::TrieMatch;

const DICTIONARY_MAGIC_ID: u32 = 0xef71_8f77;
const HEADER_LEN: usize = 72;
const CHARSET_OFFSET: usize = 40;
const TOKEN_LEN: usize = 16;

/// 辞書ヘッダ
#[derive(Debug, Clone)]
struct Header {
    version: u32,
    dic_type: u32,
    num_tokens: u32,
    num_left: u32,
    num_right: u32,
    charset: String,
}

/// 辞書検索で得られた単語エントリ
///
/// `surface`は入力文字列の一部を、`feature`は辞書のメモリ領域を借用します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DicEntry<'s, 'd> {
    /// 表層形（入力のバイト列）
    pub surface: &'s [u8],

    /// 単語の識別子
    pub word_idx: WordIdx,

    /// 接続IDとコスト
    pub param: WordParam,

    /// 素性文字列
    pub feature: &'d str,
}

/// 単語の語彙情報
///
/// MeCab形式のバイナリ辞書1つ分を保持します。
pub struct Lexicon {
    buffer: DictBuffer,
    name: &'static str,
    lex_type: LexType,
    header: Header,
    da: Range<usize>,
    tokens: Range<usize>,
    features: Range<usize>,
}

impl Lexicon {
    /// ファイルから辞書を読み込みます。
    ///
    /// # 引数
    ///
    /// * `path` - 辞書ファイルのパス
    /// * `lex_type` - 辞書の種類
    ///
    /// # エラー
    ///
    /// ファイルを開けない場合、またはフォーマットが不正な場合にエラーを返します。
    pub fn from_path<P: AsRef<Path>>(path: P, lex_type: LexType) -> Result<Self> {
        Self::new(DictBuffer::open(path)?, lex_type)
    }

    /// バイト列から辞書を読み込みます。
    pub fn from_bytes(bytes: Vec<u8>, lex_type: LexType) -> Result<Self> {
        Self::new(DictBuffer::from_vec(bytes), lex_type)
    }

    pub(crate) fn new(buffer: DictBuffer, lex_type: LexType) -> Result<Self> {
        let name = lex_type.file_name();
        let cur = buffer.cursor(name);
        if cur.len() < HEADER_LEN {
            return Err(HinokiError::invalid_format(
                name,
                format!("{} bytes is shorter than the header", cur.len()),
            ));
        }

        let magic = cur.u32_at(0)? ^ DICTIONARY_MAGIC_ID;
        if usize::try_from(magic).ok() != Some(cur.len()) {
            return Err(HinokiError::invalid_format(
                name,
                format!(
                    "dictionary file is broken: magic says {magic} bytes, but the file has {}",
                    cur.len()
                ),
            ));
        }

        let dsize = Self::region_size(&cur, 24)?;
        let tsize = Self::region_size(&cur, 28)?;
        let fsize = Self::region_size(&cur, 32)?;
        let da = HEADER_LEN..HEADER_LEN + dsize;
        let tokens = da.end..da.end + tsize;
        let features = tokens.end..tokens.end + fsize;
        if features.end > cur.len() {
            return Err(HinokiError::invalid_format(
                name,
                format!(
                    "regions end at {}, beyond the file of {} bytes",
                    features.end,
                    cur.len()
                ),
            ));
        }

        let charset = cur.cstr_at(CHARSET_OFFSET, HEADER_LEN)?;
        let charset = String::from_utf8_lossy(charset).into_owned();
        if !is_utf8_charset(&charset) {
            log::warn!("[hinoki] {name}: charset is {charset:?}; features are decoded as UTF-8");
        }

        let header = Header {
            version: cur.u32_at(4)?,
            dic_type: cur.u32_at(8)?,
            num_tokens: cur.u32_at(12)?,
            num_left: cur.u32_at(16)?,
            num_right: cur.u32_at(20)?,
            charset,
        };
        log::debug!(
            "[hinoki] {name}: version={}, type={}, tokens={}, left={}, right={}",
            header.version,
            header.dic_type,
            header.num_tokens,
            header.num_left,
            header.num_right,
        );

        Ok(Self {
            buffer,
            name,
            lex_type,
            header,
            da,
            tokens,
            features,
        })
    }

    fn region_size(cur: &BinaryCursor<'_>, offset: usize) -> Result<usize> {
        usize::try_from(cur.u32_at(offset)?).map_err(|_| {
            HinokiError::invalid_format(cur.name(), "region size does not fit in memory")
        })
    }

    #[inline(always)]
    fn double_array(&self) -> DoubleArray<'_> {
        DoubleArray::new(&self.buffer[self.da.clone()])
    }

    /// 表層形に完全一致するトークン参照値を検索します。
    ///
    /// # 戻り値
    ///
    /// 一致した場合はトークン参照値、一致しない場合は`None`
    #[inline(always)]
    pub fn exact_match_search(&self, key: &[u8]) -> Option<u32> {
        self.double_array().exact_match_search(key)
    }

    /// 入力の接頭辞に一致するトークン参照値を短い順に検索します。
    #[inline(always)]
    pub fn common_prefix_search(&self, key: &[u8]) -> Vec<TrieMatch> {
        self.double_array().common_prefix_search(key)
    }

    /// トークン参照値が指すトークンレコードを読み出します。
    ///
    /// 参照値の上位24ビットが先頭レコードの番号、下位8ビットがレコード数です。
    ///
    /// # 引数
    ///
    /// * `value` - トークン参照値
    /// * `surface` - 返すエントリに設定する表層形
    ///
    /// # エラー
    ///
    /// レコードや素性文字列が辞書の領域外にある場合、
    /// または素性文字列がUTF-8でない場合にエラーを返します。
    pub fn get_entries<'s>(&self, value: u32, surface: &'s [u8]) -> Result<Vec<DicEntry<'s, '_>>> {
        let first = value >> 8;
        let count = value & 0xff;
        let cur = self.buffer.cursor(self.name);
        let mut entries = Vec::with_capacity(count as usize);
        for word_id in first..first + count {
            let offset = self.tokens.start + word_id as usize * TOKEN_LEN;
            if offset + TOKEN_LEN > self.tokens.end {
                return Err(HinokiError::invalid_format(
                    self.name,
                    format!("token #{word_id} lies outside the token table"),
                ));
            }
            let param = WordParam::new(
                cur.u16_at(offset)?,
                cur.u16_at(offset + 2)?,
                cur.u16_at(offset + 4)?,
                cur.i16_at(offset + 6)?,
            );
            let feature_offset = cur.u32_at(offset + 8)? as usize;
            entries.push(DicEntry {
                surface,
                word_idx: WordIdx::new(self.lex_type, word_id),
                param,
                feature: self.feature_at(&cur, feature_offset)?,
            });
        }
        Ok(entries)
    }

    fn feature_at<'d>(&self, cur: &BinaryCursor<'d>, offset: usize) -> Result<&'d str> {
        let start = self.features.start + offset;
        if start >= self.features.end {
            return Err(HinokiError::invalid_format(
                self.name,
                format!("feature offset {offset} lies outside the feature region"),
            ));
        }
        let bytes = cur.cstr_at(start, self.features.end)?;
        std::str::from_utf8(bytes).map_err(|e| {
            HinokiError::invalid_format(self.name, format!("feature at offset {offset}: {e}"))
        })
    }

    /// 入力の先頭から始まる単語をすべて検索します。
    ///
    /// 一致した表層形の短い順に、同じ表層形のエントリは辞書の格納順に並びます。
    ///
    /// # 引数
    ///
    /// * `input` - 検索開始位置以降の入力
    ///
    /// # 戻り値
    ///
    /// 一致した単語エントリのベクトル
    pub fn lookup<'s>(&self, input: &'s [u8]) -> Result<Vec<DicEntry<'s, '_>>> {
        let mut entries = vec![];
        for m in self.common_prefix_search(input) {
            if m.end_byte == 0 {
                continue;
            }
            entries.extend(self.get_entries(m.value, &input[..m.end_byte])?);
        }
        Ok(entries)
    }

    /// 辞書の種類を返します。
    #[inline(always)]
    pub const fn lex_type(&self) -> LexType {
        self.lex_type
    }

    /// ヘッダに記録されたバージョンを返します。
    #[inline(always)]
    pub const fn version(&self) -> u32 {
        self.header.version
    }

    /// ヘッダに記録された辞書タイプ（0: システム、1: ユーザー、2: 未知語）を返します。
    #[inline(always)]
    pub const fn dic_type(&self) -> u32 {
        self.header.dic_type
    }

    /// トークン数を返します。
    #[inline(always)]
    pub const fn num_tokens(&self) -> u32 {
        self.header.num_tokens
    }

    /// 左文脈IDの数を返します。
    #[inline(always)]
    pub const fn num_left(&self) -> u32 {
        self.header.num_left
    }

    /// 右文脈IDの数を返します。
    #[inline(always)]
    pub const fn num_right(&self) -> u32 {
        self.header.num_right
    }

    /// 文字コード名を返します。
    #[inline(always)]
    pub fn charset(&self) -> &str {
        &self.header.charset
    }
}

impl fmt::Debug for Lexicon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lexicon")
            .field("name", &self.name)
            .field("lex_type", &self.lex_type)
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

fn is_utf8_charset(charset: &str) -> bool {
    charset.eq_ignore_ascii_case("utf-8") || charset.eq_ignore_ascii_case("utf8")
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_utils::{LexiconWriter, sumomo_sys_dic};

    #[test]
    fn test_lookup_returns_matches_in_length_order() {
        let lex = Lexicon::from_bytes(sumomo_sys_dic(), LexType::System).unwrap();
        let input = "もももの".as_bytes();
        let surfaces: Vec<_> = lex
            .lookup(input)
            .unwrap()
            .iter()
            .map(|e| std::str::from_utf8(e.surface).unwrap())
            .collect();
        assert_eq!(surfaces, vec!["も", "もも"]);
    }

    #[test]
    fn test_common_prefix_on_stored_surface() {
        let lex = Lexicon::from_bytes(sumomo_sys_dic(), LexType::System).unwrap();
        let matches = lex.common_prefix_search("すもも".as_bytes());
        assert_eq!(matches.last().unwrap().end_byte, "すもも".len());
        assert!(lex.exact_match_search("すもも".as_bytes()).is_some());
        assert!(lex.exact_match_search("すも".as_bytes()).is_none());
    }

    #[test]
    fn test_get_entries_reads_token_record() {
        let lex = Lexicon::from_bytes(sumomo_sys_dic(), LexType::System).unwrap();
        let value = lex.exact_match_search("うち".as_bytes()).unwrap();
        let entries = lex.get_entries(value, "うち".as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.param, WordParam::new(5, 5, 5, 10));
        assert_eq!(e.feature, "名詞,非自立,副詞可能,*,*,*,うち,ウチ,ウチ");
        assert_eq!(e.word_idx.lex_type, LexType::System);
    }

    #[test]
    fn test_homonyms_share_a_surface() {
        let mut w = LexiconWriter::new(2);
        w.push("橋", 1, 1, 1, 100, "名詞,はし");
        w.push("橋", 2, 2, 2, 200, "名詞,きょう");
        let lex = Lexicon::from_bytes(w.to_bytes(0), LexType::System).unwrap();
        let entries = lex.lookup("橋".as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].feature, "名詞,はし");
        assert_eq!(entries[1].feature, "名詞,きょう");
        assert_eq!(entries[1].param.word_cost, 200);
    }

    #[test]
    fn test_metadata() {
        let lex = Lexicon::from_bytes(sumomo_sys_dic(), LexType::System).unwrap();
        assert_eq!(lex.version(), 102);
        assert_eq!(lex.dic_type(), 0);
        assert_eq!(lex.num_tokens(), 5);
        assert_eq!(lex.num_left(), 6);
        assert_eq!(lex.num_right(), 6);
        assert_eq!(lex.charset(), "utf-8");
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = sumomo_sys_dic();
        bytes[0] ^= 1;
        assert!(matches!(
            Lexicon::from_bytes(bytes, LexType::System),
            Err(HinokiError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_truncated_file() {
        let mut bytes = sumomo_sys_dic();
        bytes.truncate(40);
        assert!(matches!(
            Lexicon::from_bytes(bytes, LexType::System),
            Err(HinokiError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_regions_beyond_file() {
        let mut bytes = sumomo_sys_dic();
        let len = bytes.len() as u32;
        // Grow the feature region size while keeping the magic consistent.
        let fsize = u32::from_le_bytes(bytes[32..36].try_into().unwrap());
        bytes[32..36].copy_from_slice(&(fsize + 64).to_le_bytes());
        bytes[0..4].copy_from_slice(&(len ^ DICTIONARY_MAGIC_ID).to_le_bytes());
        assert!(matches!(
            Lexicon::from_bytes(bytes, LexType::System),
            Err(HinokiError::InvalidFormat(_))
        ));
    }
}

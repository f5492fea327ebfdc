//! 文字プロパティ定義
//!
//! このモジュールは、`char.bin`で定義される文字情報を管理します。
//! 各文字のカテゴリ、グループ化、未知語処理などの属性を保持します。

use std::fmt;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};

use crate::dictionary::buffer::DictBuffer;
use crate::errors::{HinokiError, Result};

const CATE_IDSET_BITS: usize = 18;
const CATE_IDSET_MASK: u32 = (1 << CATE_IDSET_BITS) - 1;
const BASE_ID_BITS: usize = 8;
const BASE_ID_MASK: u32 = (1 << BASE_ID_BITS) - 1;
const LENGTH_BITS: usize = 4;
const LENGTH_MASK: u32 = (1 << LENGTH_BITS) - 1;
const GROUP_SHIFT: usize = CATE_IDSET_BITS + BASE_ID_BITS + LENGTH_BITS;
const INVOKE_SHIFT: usize = GROUP_SHIFT + 1;

const CATE_NAME_LEN: usize = 32;
const NUM_CODES: usize = 0x10000;

/// `char.bin`で定義される文字の情報
///
/// この構造体は、文字の各種属性を32ビット整数にパックして保持します。
///
/// # メモリレイアウト
///
/// ```text
/// cate_idset = 18 ビット (bit  0..18)
///    base_id =  8 ビット (bit 18..26)
///     length =  4 ビット (bit 26..30)
///      group =  1 ビット (bit 30)
///     invoke =  1 ビット (bit 31)
/// ```
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct CharInfo(u32);

impl fmt::Debug for CharInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharInfo")
            .field("cate_idset", &self.cate_idset())
            .field("base_id", &self.base_id())
            .field("length", &self.length())
            .field("group", &self.group())
            .field("invoke", &self.invoke())
            .finish()
    }
}

impl CharInfo {
    /// パック済みの値から作成します。
    #[inline(always)]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// パック済みの値を返します。
    #[inline(always)]
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// カテゴリIDセットを取得します。
    ///
    /// # 戻り値
    ///
    /// 18ビットのカテゴリIDセット
    #[inline(always)]
    pub const fn cate_idset(&self) -> u32 {
        self.0 & CATE_IDSET_MASK
    }

    /// ベースID（デフォルトカテゴリ）を取得します。
    ///
    /// # 戻り値
    ///
    /// 8ビットのベースID
    #[inline(always)]
    pub const fn base_id(&self) -> u32 {
        (self.0 >> CATE_IDSET_BITS) & BASE_ID_MASK
    }

    /// 最大連続文字数を取得します。
    ///
    /// # 戻り値
    ///
    /// 4ビットの長さ値
    #[inline(always)]
    pub const fn length(&self) -> u32 {
        (self.0 >> (CATE_IDSET_BITS + BASE_ID_BITS)) & LENGTH_MASK
    }

    /// group フラグを取得します。
    ///
    /// # 戻り値
    ///
    /// 同じカテゴリの文字をまとめるかどうか
    #[inline(always)]
    pub const fn group(&self) -> bool {
        (self.0 >> GROUP_SHIFT) & 1 != 0
    }

    /// invoke フラグを取得します。
    ///
    /// # 戻り値
    ///
    /// 辞書に一致する単語があっても未知語処理を起動するかどうか
    #[inline(always)]
    pub const fn invoke(&self) -> bool {
        (self.0 >> INVOKE_SHIFT) & 1 != 0
    }

    /// この文字が`cate_id`のカテゴリに属するかどうかを判定します。
    #[inline(always)]
    pub const fn is_kind_of(&self, cate_id: u32) -> bool {
        cate_id < CATE_IDSET_BITS as u32 && (self.cate_idset() >> cate_id) & 1 != 0
    }
}

/// UTF-8のバイト列の先頭から1文字を16ビットの文字コードとして読み出します。
///
/// BMP外の文字はサロゲートペアに分解したうえで16ビットに切り詰められるため、
/// 下位サロゲートの値で分類されます。
///
/// # 戻り値
///
/// 文字コードと、消費したバイト数のタプル。不正な先頭バイトは1バイトの文字として扱います。
pub fn decode_char(bytes: &[u8]) -> (u16, usize) {
    let Some(&lead) = bytes.first() else {
        return (0, 0);
    };
    let len = match lead {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => 0,
    };
    if len == 0 || bytes.len() < len {
        return (u16::from(lead), 1);
    }
    let trail = |i: usize| u32::from(bytes[i] & 0x3f);
    let code = match len {
        1 => u32::from(lead),
        2 => (u32::from(lead & 0x1f) << 6) | trail(1),
        3 => (u32::from(lead & 0x0f) << 12) | (trail(1) << 6) | trail(2),
        _ => (u32::from(lead & 0x07) << 18) | (trail(1) << 12) | (trail(2) << 6) | trail(3),
    };
    if code >= 0x10000 {
        let hi = 0xd800 + ((code - 0x10000) >> 10);
        let lo = 0xdc00 + ((code - 0x10000) & 0x3ff);
        return ((((hi << 16) | lo) & 0xffff) as u16, len);
    }
    (code as u16, len)
}

/// 文字から情報へのマッピング
///
/// `char.bin`をメモリ上に保持し、各文字コード（BMP）に対応する文字情報と
/// カテゴリ名を引けるようにします。
///
/// # ファイルレイアウト
///
/// ```text
/// u32                    カテゴリ数 n
/// [u8; 32] × n          NUL終端のカテゴリ名
/// u32 × 65536           文字コードごとの CharInfo
/// ```
pub struct CharProperty {
    buffer: DictBuffer,
    categories: Vec<String>,
    offset: usize,
}

impl CharProperty {
    const NAME: &'static str = "char.bin";

    /// ファイルから文字プロパティを読み込みます。
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(DictBuffer::open(path)?)
    }

    /// バイト列から文字プロパティを読み込みます。
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::new(DictBuffer::from_vec(bytes))
    }

    pub(crate) fn new(buffer: DictBuffer) -> Result<Self> {
        let cur = buffer.cursor(Self::NAME);
        let num_categories = usize::try_from(cur.u32_at(0)?).map_err(|_| {
            HinokiError::invalid_format(Self::NAME, "category count does not fit in memory")
        })?;
        if num_categories > CATE_IDSET_BITS {
            return Err(HinokiError::invalid_format(
                Self::NAME,
                format!("{num_categories} categories exceed the limit of {CATE_IDSET_BITS}"),
            ));
        }

        let mut categories = Vec::with_capacity(num_categories);
        for i in 0..num_categories {
            let start = 4 + i * CATE_NAME_LEN;
            let name = cur.cstr_at(start, start + CATE_NAME_LEN)?;
            let name = std::str::from_utf8(name).map_err(|e| {
                HinokiError::invalid_format(Self::NAME, format!("category name #{i}: {e}"))
            })?;
            categories.push(name.to_string());
        }

        let offset = 4 + num_categories * CATE_NAME_LEN;
        // Checks that every code point has a record so that lookups never fail.
        cur.bytes(offset, NUM_CODES * 4)?;

        log::debug!("[hinoki] {}: {} categories", Self::NAME, categories.len());

        Ok(Self {
            buffer,
            categories,
            offset,
        })
    }

    /// 文字コードに対応する文字情報を取得します。
    #[inline(always)]
    pub fn char_info(&self, code: u16) -> CharInfo {
        let i = self.offset + usize::from(code) * 4;
        CharInfo(LittleEndian::read_u32(&self.buffer[i..i + 4]))
    }

    /// カテゴリIDに対応するカテゴリ名を取得します。
    #[inline(always)]
    pub fn category_name(&self, cate_id: u32) -> Option<&str> {
        self.categories
            .get(usize::try_from(cate_id).ok()?)
            .map(String::as_str)
    }

    /// カテゴリ名に対応するカテゴリIDを取得します。
    pub fn cate_id(&self, name: &str) -> Option<u32> {
        self.categories
            .iter()
            .position(|c| c == name)
            .and_then(|i| u32::try_from(i).ok())
    }

    /// カテゴリ数を返します。
    #[inline(always)]
    pub fn num_categories(&self) -> usize {
        self.categories.len()
    }

    /// 未知語として切り出す長さの候補を計算します。
    ///
    /// 先頭文字の group フラグが立っている場合は、先頭文字のデフォルトカテゴリに属する文字が
    /// 続く限り（最大連続文字数が0でなければその数まで）まとめます。
    /// そうでない場合は、カテゴリに関係なく最大連続文字数の文字を切り出します。
    ///
    /// # 引数
    ///
    /// * `bytes` - 未知語の開始位置以降の入力
    ///
    /// # 戻り値
    ///
    /// デフォルトカテゴリ、バイト長の候補、invoke フラグのタプル
    pub fn unknown_lengths(&self, bytes: &[u8]) -> (u32, Vec<usize>, bool) {
        let (code, mut len) = decode_char(bytes);
        let info = self.char_info(code);
        let base_id = info.base_id();
        let max_count = info.length();

        let mut count = 1;
        if info.group() {
            while len < bytes.len() && (max_count == 0 || count < max_count) {
                let (next, next_len) = decode_char(&bytes[len..]);
                if !self.char_info(next).is_kind_of(base_id) {
                    break;
                }
                len += next_len;
                count += 1;
            }
        } else {
            while len < bytes.len() && count < max_count {
                let (_, next_len) = decode_char(&bytes[len..]);
                len += next_len;
                count += 1;
            }
        }

        (base_id, vec![len], info.invoke())
    }
}

impl fmt::Debug for CharProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharProperty")
            .field("categories", &self.categories)
            .finish_non_exhaustive()
    }
}

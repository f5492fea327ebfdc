//! 未知語処理モジュール
//!
//! このモジュールは、辞書に登録されていない未知語を処理するための
//! 機能を提供します。未知語辞書（`unk.dic`）はカテゴリ名を表層形とする
//! 通常のバイナリ辞書です。

use std::path::Path;

use crate::dictionary::LexType;
use crate::dictionary::character::CharProperty;
use crate::dictionary::lexicon::{DicEntry, Lexicon};
use crate::errors::{HinokiError, Result};

/// 未知語ハンドラー
///
/// 文字カテゴリに応じて未知語の候補を生成します。
#[derive(Debug)]
pub struct UnkHandler {
    lexicon: Lexicon,
}

impl UnkHandler {
    /// ファイルから未知語辞書を読み込みます。
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Lexicon::from_path(path, LexType::Unknown)?))
    }

    /// バイト列から未知語辞書を読み込みます。
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Ok(Self::new(Lexicon::from_bytes(bytes, LexType::Unknown)?))
    }

    pub(crate) const fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// 未知語辞書を返します。
    #[inline(always)]
    pub const fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// 入力の先頭から始まる未知語の候補を生成します。
    ///
    /// 先頭文字のデフォルトカテゴリ名で未知語辞書を完全一致検索し、
    /// 切り出し長の候補ごとにエントリを返します。
    ///
    /// # 引数
    ///
    /// * `input` - 未知語の開始位置以降の入力
    /// * `char_prop` - 文字プロパティ
    ///
    /// # 戻り値
    ///
    /// 未知語エントリと、先頭文字の invoke フラグのタプル
    ///
    /// # エラー
    ///
    /// カテゴリが未知語辞書に登録されていない場合にエラーを返します。
    pub fn lookup_unknowns<'s>(
        &self,
        input: &'s [u8],
        char_prop: &CharProperty,
    ) -> Result<(Vec<DicEntry<'s, '_>>, bool)> {
        if input.is_empty() {
            return Ok((vec![], false));
        }
        let (cate_id, lengths, invoke) = char_prop.unknown_lengths(input);
        let name = char_prop.category_name(cate_id).ok_or_else(|| {
            HinokiError::invalid_format(
                "char.bin",
                format!("default category {cate_id} has no name"),
            )
        })?;
        let value = self
            .lexicon
            .exact_match_search(name.as_bytes())
            .ok_or_else(|| {
                HinokiError::invalid_format(
                    "unk.dic",
                    format!("no unknown-word entry for category {name}"),
                )
            })?;

        let mut entries = vec![];
        for len in lengths {
            entries.extend(self.lexicon.get_entries(value, &input[..len])?);
        }
        Ok((entries, invoke))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_utils::{LexiconWriter, fixture_char_bin, fixture_unk_dic};

    fn setup() -> (UnkHandler, CharProperty) {
        (
            UnkHandler::from_bytes(fixture_unk_dic()).unwrap(),
            CharProperty::from_bytes(fixture_char_bin()).unwrap(),
        )
    }

    fn surfaces<'a>(entries: &[DicEntry<'a, '_>]) -> Vec<&'a str> {
        entries
            .iter()
            .map(|e| std::str::from_utf8(e.surface).unwrap())
            .collect()
    }

    #[test]
    fn test_group_consumes_run() {
        let (unk, prop) = setup();
        let (entries, invoke) = unk.lookup_unknowns("カタカナ語".as_bytes(), &prop).unwrap();
        assert!(invoke);
        assert_eq!(surfaces(&entries), vec!["カタカナ"]);
        assert!(entries[0].feature.starts_with("名詞"));
        assert_eq!(entries[0].word_idx.lex_type, LexType::Unknown);
    }

    #[test]
    fn test_non_group_consumes_fixed_count() {
        let (unk, prop) = setup();
        let (entries, invoke) = unk.lookup_unknowns("東京都庁".as_bytes(), &prop).unwrap();
        assert!(!invoke);
        assert_eq!(surfaces(&entries), vec!["東京"]);
    }

    #[test]
    fn test_non_group_stops_at_input_end() {
        let (unk, prop) = setup();
        let (entries, _) = unk.lookup_unknowns("東".as_bytes(), &prop).unwrap();
        assert_eq!(surfaces(&entries), vec!["東"]);
    }

    #[test]
    fn test_group_uses_bitmask_of_following_chars() {
        let (unk, prop) = setup();
        // U+3007 belongs to both KANJI and NUMERIC.
        let (entries, _) = unk.lookup_unknowns("12〇3x".as_bytes(), &prop).unwrap();
        assert_eq!(surfaces(&entries), vec!["12〇3"]);
    }

    #[test]
    fn test_empty_input() {
        let (unk, prop) = setup();
        let (entries, invoke) = unk.lookup_unknowns(b"", &prop).unwrap();
        assert!(entries.is_empty());
        assert!(!invoke);
    }

    #[test]
    fn test_missing_category_entry() {
        let prop = CharProperty::from_bytes(fixture_char_bin()).unwrap();
        let mut w = LexiconWriter::new(1);
        w.push("DEFAULT", 0, 0, 0, 0, "記号,一般");
        let unk = UnkHandler::from_bytes(w.to_bytes(2)).unwrap();
        assert!(matches!(
            unk.lookup_unknowns("あ".as_bytes(), &prop),
            Err(HinokiError::InvalidFormat(_))
        ));
    }
}

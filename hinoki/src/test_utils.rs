//! テスト用ユーティリティ
//!
//! テストコードで使用する小さなMeCab形式のバイナリ辞書
//! （`sys.dic`、`unk.dic`、`char.bin`、`matrix.bin`）をメモリ上で組み立てます。

use std::fs;
use std::path::Path;

use hashbrown::HashSet;

use crate::dictionary::{
    CharProperty, Dictionary, DictionaryPaths, LexType, Lexicon, MatrixConnector, UnkHandler,
};

const DICTIONARY_MAGIC_ID: u32 = 0xef71_8f77;
const DIC_VERSION: u32 = 102;

/// ダブル配列を組み立てます。
///
/// 兄弟ノードの遷移コードは、キーの終端が0、それ以外がバイト値 + 1 です。
/// 各ノードのbaseは他のノードと重複しない値を選びます。
pub(crate) fn build_double_array(records: &[(Vec<u8>, u32)]) -> Vec<u8> {
    let mut keys: Vec<(&[u8], u32)> = records.iter().map(|(k, v)| (k.as_slice(), *v)).collect();
    keys.sort_by(|a, b| a.0.cmp(b.0));
    keys.dedup_by(|a, b| a.0 == b.0);

    let mut builder = DoubleArrayBuilder::default();
    builder.ensure(1);
    builder.used[0] = true;
    if !keys.is_empty() {
        builder.insert(0, &keys, 0);
    }

    let mut bytes = Vec::with_capacity(builder.base.len() * 8);
    for (base, check) in builder.base.iter().zip(&builder.check) {
        bytes.extend_from_slice(&base.to_le_bytes());
        bytes.extend_from_slice(&check.to_le_bytes());
    }
    bytes
}

#[derive(Default)]
struct DoubleArrayBuilder {
    base: Vec<i32>,
    check: Vec<u32>,
    used: Vec<bool>,
    begins: HashSet<usize>,
}

impl DoubleArrayBuilder {
    fn ensure(&mut self, len: usize) {
        if self.base.len() < len {
            self.base.resize(len, 0);
            self.check.resize(len, 0);
            self.used.resize(len, false);
        }
    }

    fn insert(&mut self, node: usize, keys: &[(&[u8], u32)], depth: usize) {
        // Sibling groups in code order; keys are sorted so each group is contiguous.
        let mut groups: Vec<(usize, usize, usize)> = vec![];
        for (i, (key, _)) in keys.iter().enumerate() {
            let code = key.get(depth).map_or(0, |&b| usize::from(b) + 1);
            match groups.last_mut() {
                Some((c, _, end)) if *c == code => *end = i + 1,
                _ => groups.push((code, i, i + 1)),
            }
        }

        let mut begin = 1;
        loop {
            let max_slot = begin + groups.last().map_or(0, |g| g.0);
            self.ensure(max_slot + 1);
            if !self.begins.contains(&begin) && groups.iter().all(|g| !self.used[begin + g.0]) {
                break;
            }
            begin += 1;
        }
        self.begins.insert(begin);
        self.base[node] = begin as i32;
        for &(code, _, _) in &groups {
            self.used[begin + code] = true;
            self.check[begin + code] = begin as u32;
        }
        for &(code, start, end) in &groups {
            let slot = begin + code;
            if code == 0 {
                self.base[slot] = -(keys[start].1 as i32) - 1;
            } else {
                self.insert(slot, &keys[start..end], depth + 1);
            }
        }
    }
}

/// MeCab形式のバイナリ辞書を組み立てるライター
pub(crate) struct LexiconWriter {
    num_ctx: u32,
    entries: Vec<(String, [u16; 3], i16, String)>,
}

impl LexiconWriter {
    pub fn new(num_ctx: u32) -> Self {
        Self {
            num_ctx,
            entries: vec![],
        }
    }

    pub fn push(
        &mut self,
        surface: &str,
        left_id: u16,
        right_id: u16,
        pos_id: u16,
        word_cost: i16,
        feature: &str,
    ) -> &mut Self {
        self.entries.push((
            surface.to_string(),
            [left_id, right_id, pos_id],
            word_cost,
            feature.to_string(),
        ));
        self
    }

    /// 辞書ファイルのバイト列を返します。
    ///
    /// # 引数
    ///
    /// * `dic_type` - 0: システム辞書、1: ユーザー辞書、2: 未知語辞書
    pub fn to_bytes(&self, dic_type: u32) -> Vec<u8> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

        let mut records: Vec<(Vec<u8>, u32)> = vec![];
        let mut tokens = vec![];
        let mut features = vec![];
        let mut i = 0;
        while i < entries.len() {
            let surface = &entries[i].0;
            let mut j = i;
            while j < entries.len() && &entries[j].0 == surface {
                let (_, ids, cost, feature) = entries[j];
                tokens.extend_from_slice(&ids[0].to_le_bytes());
                tokens.extend_from_slice(&ids[1].to_le_bytes());
                tokens.extend_from_slice(&ids[2].to_le_bytes());
                tokens.extend_from_slice(&cost.to_le_bytes());
                tokens.extend_from_slice(&(features.len() as u32).to_le_bytes());
                tokens.extend_from_slice(&0u32.to_le_bytes());
                features.extend_from_slice(feature.as_bytes());
                features.push(0);
                j += 1;
            }
            let value = ((i as u32) << 8) | (j - i) as u32;
            records.push((surface.as_bytes().to_vec(), value));
            i = j;
        }
        let da = build_double_array(&records);

        let total = 72 + da.len() + tokens.len() + features.len();
        let mut bytes = Vec::with_capacity(total);
        for v in [
            total as u32 ^ DICTIONARY_MAGIC_ID,
            DIC_VERSION,
            dic_type,
            entries.len() as u32,
            self.num_ctx,
            self.num_ctx,
            da.len() as u32,
            tokens.len() as u32,
            features.len() as u32,
            0,
        ] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let mut charset = [0u8; 32];
        charset[..5].copy_from_slice(b"utf-8");
        bytes.extend_from_slice(&charset);
        bytes.extend_from_slice(&da);
        bytes.extend_from_slice(&tokens);
        bytes.extend_from_slice(&features);
        bytes
    }
}

/// 連接コスト行列のバイト列を組み立てます。
///
/// `costs`は`(右文脈ID, 左文脈ID, コスト)`の組で、それ以外は0になります。
pub(crate) fn matrix_bytes(num_left: u16, num_right: u16, costs: &[(u16, u16, i16)]) -> Vec<u8> {
    let mut matrix = vec![0i16; usize::from(num_left) * usize::from(num_right)];
    for &(right_id, left_id, cost) in costs {
        matrix[usize::from(left_id) * usize::from(num_left) + usize::from(right_id)] = cost;
    }
    let mut bytes = vec![];
    bytes.extend_from_slice(&num_left.to_le_bytes());
    bytes.extend_from_slice(&num_right.to_le_bytes());
    for c in matrix {
        bytes.extend_from_slice(&c.to_le_bytes());
    }
    bytes
}

/// 文字カテゴリの定義: (名前, invoke, group, length)
pub(crate) const FIXTURE_CATEGORIES: &[(&str, bool, bool, u32)] = &[
    ("DEFAULT", false, true, 0),
    ("SPACE", false, true, 0),
    ("KANJI", false, false, 2),
    ("HIRAGANA", false, true, 2),
    ("KATAKANA", true, true, 0),
    ("ALPHA", true, true, 0),
    ("NUMERIC", true, true, 0),
    ("SYMBOL", true, true, 0),
];

const DEFAULT: u32 = 0;
const SPACE: u32 = 1;
const KANJI: u32 = 2;
const HIRAGANA: u32 = 3;
const KATAKANA: u32 = 4;
const ALPHA: u32 = 5;
const NUMERIC: u32 = 6;
const SYMBOL: u32 = 7;

fn pack_char_info(cate_ids: &[u32], base_id: u32) -> u32 {
    let (_, invoke, group, length) = FIXTURE_CATEGORIES[base_id as usize];
    let idset = cate_ids.iter().fold(0, |acc, &id| acc | (1 << id));
    idset | (base_id << 18) | (length << 26) | (u32::from(group) << 30) | (u32::from(invoke) << 31)
}

/// テスト用の`char.bin`を組み立てます。
pub(crate) fn fixture_char_bin() -> Vec<u8> {
    let mut infos = vec![pack_char_info(&[DEFAULT], DEFAULT); 0x10000];
    let mut set = |range: std::ops::RangeInclusive<u32>, cate_ids: &[u32]| {
        for code in range {
            infos[code as usize] = pack_char_info(cate_ids, cate_ids[0]);
        }
    };
    set(0x20..=0x20, &[SPACE]);
    set(0x09..=0x09, &[SPACE]);
    set(0x21..=0x2f, &[SYMBOL]);
    set(0x30..=0x39, &[NUMERIC]);
    set(0x41..=0x5a, &[ALPHA]);
    set(0x61..=0x7a, &[ALPHA]);
    set(0x3041..=0x309f, &[HIRAGANA]);
    set(0x30a1..=0x30ff, &[KATAKANA]);
    set(0x4e00..=0x9fff, &[KANJI]);
    set(0x3007..=0x3007, &[KANJI, NUMERIC]);

    let mut bytes = vec![];
    bytes.extend_from_slice(&(FIXTURE_CATEGORIES.len() as u32).to_le_bytes());
    for (name, ..) in FIXTURE_CATEGORIES {
        let mut record = [0u8; 32];
        record[..name.len()].copy_from_slice(name.as_bytes());
        bytes.extend_from_slice(&record);
    }
    for info in infos {
        bytes.extend_from_slice(&info.to_le_bytes());
    }
    bytes
}

/// テスト用の`unk.dic`を組み立てます。すべての文脈IDは5です。
pub(crate) fn fixture_unk_dic() -> Vec<u8> {
    let mut w = LexiconWriter::new(6);
    w.push("DEFAULT", 5, 5, 5, 5000, "記号,一般,*,*,*,*,*")
        .push("SPACE", 5, 5, 5, 100, "記号,空白,*,*,*,*,*")
        .push("KANJI", 5, 5, 5, 1000, "名詞,一般,*,*,*,*,*")
        .push("HIRAGANA", 5, 5, 5, 1000, "名詞,一般,*,*,*,*,*")
        .push("KATAKANA", 5, 5, 5, 1000, "名詞,一般,*,*,*,*,*")
        .push("ALPHA", 5, 5, 5, 1000, "名詞,固有名詞,組織,*,*,*,*")
        .push("NUMERIC", 5, 5, 5, 1000, "名詞,数,*,*,*,*,*")
        .push("SYMBOL", 5, 5, 5, 1000, "記号,一般,*,*,*,*,*");
    w.to_bytes(2)
}

/// 「すもももももももものうち」用の`sys.dic`を組み立てます。
///
/// 文脈IDと品詞IDは BOS/EOS: 0、すもも: 1、も: 2、の: 3、もも: 4、うち: 5 です。
pub(crate) fn sumomo_sys_dic() -> Vec<u8> {
    let mut w = LexiconWriter::new(6);
    w.push("すもも", 1, 1, 1, 10, "名詞,一般,*,*,*,*,すもも,スモモ,スモモ")
        .push("も", 2, 2, 2, 20, "助詞,係助詞,*,*,*,*,も,モ,モ")
        .push("の", 3, 3, 3, 10, "助詞,連体化,*,*,*,*,の,ノ,ノ")
        .push("もも", 4, 4, 4, 20, "名詞,一般,*,*,*,*,もも,モモ,モモ")
        .push("うち", 5, 5, 5, 10, "名詞,非自立,副詞可能,*,*,*,うち,ウチ,ウチ");
    w.to_bytes(0)
}

/// 「すもももももももものうち」用の`matrix.bin`を組み立てます。
pub(crate) fn sumomo_matrix() -> Vec<u8> {
    matrix_bytes(6, 6, &[(1, 4, 20), (4, 4, 30), (2, 2, 10), (2, 3, 100)])
}

/// 任意の`sys.dic`とテスト用の他のファイルから辞書を組み立てます。
pub(crate) fn fixture_dictionary(sys_dic: Vec<u8>) -> Dictionary {
    fixture_dictionary_with_matrix(sys_dic, sumomo_matrix())
}

/// 任意の`sys.dic`と`matrix.bin`から辞書を組み立てます。
pub(crate) fn fixture_dictionary_with_matrix(sys_dic: Vec<u8>, matrix: Vec<u8>) -> Dictionary {
    Dictionary::from_parts(
        Lexicon::from_bytes(sys_dic, LexType::System).unwrap(),
        UnkHandler::from_bytes(fixture_unk_dic()).unwrap(),
        CharProperty::from_bytes(fixture_char_bin()).unwrap(),
        MatrixConnector::from_bytes(matrix).unwrap(),
    )
}

/// テスト用の辞書ファイル一式をディレクトリに書き出します。
pub(crate) fn write_dicdir(dir: &Path) -> DictionaryPaths {
    fs::write(dir.join("sys.dic"), sumomo_sys_dic()).unwrap();
    fs::write(dir.join("unk.dic"), fixture_unk_dic()).unwrap();
    fs::write(dir.join("char.bin"), fixture_char_bin()).unwrap();
    fs::write(dir.join("matrix.bin"), sumomo_matrix()).unwrap();
    DictionaryPaths::from_dicdir(dir)
}

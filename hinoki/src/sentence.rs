//! 入力テキストの内部表現を提供するモジュール
//!
//! このモジュールは、形態素解析のために入力テキストを保持し、
//! バイト位置から文字位置へのマッピングを計算します。

/// 入力テキストの内部表現を保持する構造体
///
/// # フィールド
///
/// * `input` - 元の入力文字列
/// * `b2c` - バイト位置から文字位置へのマッピング配列（長さは入力のバイト長 + 1）
#[derive(Default, Clone, Debug)]
pub struct Sentence {
    input: String,
    b2c: Vec<usize>,
}

impl Sentence {
    /// 新しい空の `Sentence` インスタンスを生成します
    pub fn new() -> Self {
        Self::default()
    }

    /// 内部状態をクリアします
    #[inline(always)]
    pub fn clear(&mut self) {
        self.input.clear();
        self.b2c.clear();
    }

    /// 入力文字列を設定し、位置のマッピングを計算します
    ///
    /// # 引数
    ///
    /// * `input` - 設定する入力文字列
    pub fn set_sentence<S>(&mut self, input: S)
    where
        S: AsRef<str>,
    {
        self.clear();
        self.input.push_str(input.as_ref());
        self.b2c.resize(self.input.len() + 1, 0);
        let mut num_chars = 0;
        for (ci, (bi, ch)) in self.input.char_indices().enumerate() {
            self.b2c[bi..bi + ch.len_utf8()].fill(ci);
            num_chars = ci + 1;
        }
        self.b2c[self.input.len()] = num_chars;
    }

    /// 元の入力文字列を取得します
    #[inline(always)]
    pub fn raw(&self) -> &str {
        &self.input
    }

    /// 入力のバイト長を取得します
    #[inline(always)]
    pub fn len_byte(&self) -> usize {
        self.input.len()
    }

    /// 入力の文字数を取得します
    #[inline(always)]
    pub fn len_char(&self) -> usize {
        self.b2c.last().copied().unwrap_or(0)
    }

    /// バイト位置に対応する文字位置を取得します
    ///
    /// 文字の途中を指すバイト位置には、その文字の位置を返します。
    #[inline(always)]
    pub fn char_position(&self, pos_byte: usize) -> usize {
        self.b2c[pos_byte]
    }

    /// バイト位置が文字境界かどうかを判定します
    #[inline(always)]
    pub fn is_char_boundary(&self, pos_byte: usize) -> bool {
        self.input.is_char_boundary(pos_byte)
    }
}

//! 単語のパラメータ情報
//!
//! このモジュールは、トークンレコードに格納された接続IDとコストを表します。

/// 単語のパラメータ（接続ID、品詞ID、コスト）
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct WordParam {
    /// 左文脈ID
    pub left_id: u16,

    /// 右文脈ID
    pub right_id: u16,

    /// 品詞ID
    pub pos_id: u16,

    /// 単語コスト
    pub word_cost: i16,
}

impl WordParam {
    /// 新しい単語パラメータを作成します。
    #[inline(always)]
    pub const fn new(left_id: u16, right_id: u16, pos_id: u16, word_cost: i16) -> Self {
        Self {
            left_id,
            right_id,
            pos_id,
            word_cost,
        }
    }
}

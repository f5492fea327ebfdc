//! 接続コスト計算のためのコネクター
//!
//! このモジュールは、`matrix.bin`に格納された連接コスト行列を読み出す
//! コネクターを提供します。

use std::fmt;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};

use crate::dictionary::buffer::DictBuffer;
use crate::errors::{HinokiError, Result};

const HEADER_LEN: usize = 4;

/// コネクターのビュー機能を提供するトレイト
pub trait ConnectorView {
    /// 左接続IDの最大数を返します。
    fn num_left(&self) -> usize;

    /// 右接続IDの最大数を返します。
    fn num_right(&self) -> usize;
}

/// 接続コスト計算機能を提供するトレイト
pub trait ConnectorCost: ConnectorView {
    /// 接続行列の値を取得します。
    ///
    /// # 引数
    ///
    /// * `right_id` - 左側のノードの右接続ID
    /// * `left_id` - 右側のノードの左接続ID
    ///
    /// # 戻り値
    ///
    /// 接続コスト
    fn cost(&self, right_id: u16, left_id: u16) -> i32;
}

/// 接続コストの行列
///
/// `matrix.bin`をメモリ上に保持します。
///
/// # ファイルレイアウト
///
/// ```text
/// u16                    左サイズ
/// u16                    右サイズ
/// i16 × 左サイズ × 右サイズ  コスト（`left_id * 左サイズ + right_id` の順）
/// ```
pub struct MatrixConnector {
    buffer: DictBuffer,
    num_left: usize,
    num_right: usize,
}

impl MatrixConnector {
    const NAME: &'static str = "matrix.bin";

    /// ファイルから接続行列を読み込みます。
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(DictBuffer::open(path)?)
    }

    /// バイト列から接続行列を読み込みます。
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::new(DictBuffer::from_vec(bytes))
    }

    pub(crate) fn new(buffer: DictBuffer) -> Result<Self> {
        let cur = buffer.cursor(Self::NAME);
        let num_left = usize::from(cur.u16_at(0)?);
        let num_right = usize::from(cur.u16_at(2)?);
        let expected = HEADER_LEN + num_left * num_right * 2;
        if cur.len() != expected {
            return Err(HinokiError::invalid_format(
                Self::NAME,
                format!(
                    "{num_left}x{num_right} matrix needs {expected} bytes, but the file has {}",
                    cur.len()
                ),
            ));
        }
        log::debug!("[hinoki] {}: {num_left}x{num_right}", Self::NAME);
        Ok(Self {
            buffer,
            num_left,
            num_right,
        })
    }
}

impl ConnectorView for MatrixConnector {
    #[inline(always)]
    fn num_left(&self) -> usize {
        self.num_left
    }

    #[inline(always)]
    fn num_right(&self) -> usize {
        self.num_right
    }
}

impl ConnectorCost for MatrixConnector {
    /// # パニック
    ///
    /// IDが行列の範囲外の場合にパニックします。
    #[inline(always)]
    fn cost(&self, right_id: u16, left_id: u16) -> i32 {
        let index = usize::from(left_id) * self.num_left + usize::from(right_id);
        let i = HEADER_LEN + index * 2;
        i32::from(LittleEndian::read_i16(&self.buffer[i..i + 2]))
    }
}

impl fmt::Debug for MatrixConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatrixConnector")
            .field("num_left", &self.num_left)
            .field("num_right", &self.num_right)
            .finish_non_exhaustive()
    }
}

//! 辞書ファイルのバイト列へのアクセス
//!
//! このモジュールは、辞書ファイルを読み取り専用で保持するバッファと、
//! 境界チェック付きでリトルエンディアンの値を読み出すカーソルを提供します。

use std::fs::File;
use std::ops::{Deref, Range};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use memmap2::Mmap;

use crate::errors::{HinokiError, Result};

/// 辞書データを保持するメモリバッファ。
///
/// - `Mmap`: メモリマップドファイルによるゼロコピーアクセス
/// - `Heap`: ヒープ上のバイト列
pub(crate) enum DictBuffer {
    Mmap(Mmap),
    Heap(Vec<u8>),
}

impl DictBuffer {
    /// ファイルを読み取り専用でメモリマップします。
    ///
    /// # 引数
    ///
    /// * `path` - 辞書ファイルのパス
    ///
    /// # エラー
    ///
    /// パスがディレクトリの場合、またはファイルを開けない場合にエラーを返します。
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            return Err(HinokiError::PathIsDirectory(path.to_path_buf()));
        }
        let file = File::open(path)?;
        // The file is opened read-only and never written by this process.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self::Mmap(mmap))
    }

    /// ヒープ上のバイト列からバッファを作成します。
    pub const fn from_vec(bytes: Vec<u8>) -> Self {
        Self::Heap(bytes)
    }

    /// 名前付きカーソルを作成します。
    #[inline(always)]
    pub fn cursor(&self, name: &'static str) -> BinaryCursor<'_> {
        BinaryCursor::new(self, name)
    }
}

impl Deref for DictBuffer {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Mmap(m) => m,
            Self::Heap(v) => v,
        }
    }
}

/// 境界チェック付きのバイト列リーダー。
///
/// すべての読み出しは絶対オフセットで行い、範囲外へのアクセスは
/// 辞書名を含む [`HinokiError::InvalidFormat`] になります。
#[derive(Clone, Copy)]
pub(crate) struct BinaryCursor<'a> {
    data: &'a [u8],
    name: &'static str,
}

impl<'a> BinaryCursor<'a> {
    #[inline(always)]
    pub const fn new(data: &'a [u8], name: &'static str) -> Self {
        Self { data, name }
    }

    /// 辞書ファイル名を返します。
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// `offset`から`len`バイトの範囲を返します。
    pub fn bytes(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let range = self.range(offset, len)?;
        Ok(&self.data[range])
    }

    #[inline(always)]
    pub fn u16_at(&self, offset: usize) -> Result<u16> {
        self.bytes(offset, 2).map(LittleEndian::read_u16)
    }

    #[inline(always)]
    pub fn i16_at(&self, offset: usize) -> Result<i16> {
        self.bytes(offset, 2).map(LittleEndian::read_i16)
    }

    #[inline(always)]
    pub fn u32_at(&self, offset: usize) -> Result<u32> {
        self.bytes(offset, 4).map(LittleEndian::read_u32)
    }

    #[inline(always)]
    pub fn i32_at(&self, offset: usize) -> Result<i32> {
        self.bytes(offset, 4).map(LittleEndian::read_i32)
    }

    /// `offset`から始まるNUL終端のバイト列を返します（NUL自体は含みません）。
    ///
    /// # 引数
    ///
    /// * `offset` - 読み出し開始位置
    /// * `limit` - 探索を打ち切る位置（排他的）
    pub fn cstr_at(&self, offset: usize, limit: usize) -> Result<&'a [u8]> {
        let limit = limit.min(self.data.len());
        let tail = self
            .data
            .get(offset..limit)
            .ok_or_else(|| self.out_of_bounds(offset, 1))?;
        let end = tail.iter().position(|&b| b == 0).ok_or_else(|| {
            HinokiError::invalid_format(
                self.name,
                format!("string at offset {offset} is not NUL-terminated"),
            )
        })?;
        Ok(&tail[..end])
    }

    fn range(&self, offset: usize, len: usize) -> Result<Range<usize>> {
        match offset.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(offset..end),
            _ => Err(self.out_of_bounds(offset, len)),
        }
    }

    fn out_of_bounds(&self, offset: usize, len: usize) -> HinokiError {
        HinokiError::invalid_format(
            self.name,
            format!(
                "read of {len} bytes at offset {offset} exceeds the buffer of {} bytes",
                self.data.len()
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_little_endian() {
        let data = [0x01, 0x02, 0xff, 0xff, 0x78, 0x56, 0x34, 0x12];
        let cur = BinaryCursor::new(&data, "test");
        assert_eq!(cur.u16_at(0).unwrap(), 0x0201);
        assert_eq!(cur.i16_at(2).unwrap(), -1);
        assert_eq!(cur.u32_at(4).unwrap(), 0x1234_5678);
        assert_eq!(cur.i32_at(0).unwrap(), -65023);
    }

    #[test]
    fn test_out_of_bounds() {
        let data = [0u8; 6];
        let cur = BinaryCursor::new(&data, "test");
        assert!(cur.u32_at(2).is_ok());
        assert!(matches!(cur.u32_at(3), Err(HinokiError::InvalidFormat(_))));
        assert!(matches!(cur.bytes(usize::MAX, 2), Err(HinokiError::InvalidFormat(_))));
    }

    #[test]
    fn test_cstr() {
        let data = b"abc\0de\0fg";
        let cur = BinaryCursor::new(data, "test");
        assert_eq!(cur.cstr_at(0, data.len()).unwrap(), b"abc");
        assert_eq!(cur.cstr_at(4, data.len()).unwrap(), b"de");
        assert_eq!(cur.cstr_at(3, data.len()).unwrap(), b"");
        assert!(cur.cstr_at(7, data.len()).is_err());
        assert!(cur.cstr_at(0, 2).is_err());
        assert!(cur.cstr_at(10, data.len()).is_err());
    }

    #[test]
    fn test_heap_buffer() {
        let buf = DictBuffer::from_vec(vec![7, 0, 0, 0]);
        assert_eq!(buf.cursor("heap").u32_at(0).unwrap(), 7);
        assert_eq!(buf.cursor("heap").name(), "heap");
    }
}

//! # Hinoki
//!
//! Hinokiは、MeCab形式のバイナリ辞書を読み込み、ビタビアルゴリズムに基づいて
//! 形態素解析（トークン化）を行うライブラリです。
//!
//! ## 概要
//!
//! `mecab-dict-index`で作成された辞書ディレクトリ（`sys.dic`、`unk.dic`、`char.bin`、
//! `matrix.bin`）をメモリマップで読み込み、変換せずにそのまま解析に使用します。
//!
//! ## 主な機能
//!
//! - **ダブル配列による辞書引き**: 共通接頭辞検索で辞書の候補を列挙
//! - **未知語処理**: 文字カテゴリの定義に基づく未知語候補の生成
//! - **最良解の探索**: ラティス上のビタビアルゴリズム
//! - **N-best解析**: A*探索によるコストの低い順の解析候補の生成
//! - **ユーザー辞書**: mecabrc の `userdic` で指定された辞書の併用
//!
//! ## 使用例
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use hinoki::{Dictionary, DictionaryPaths, Tokenizer};
//!
//! let paths = DictionaryPaths::from_dicdir("/usr/local/lib/mecab/dic/ipadic");
//! let dict = Dictionary::from_paths(&paths)?;
//!
//! let tokenizer = Tokenizer::new(dict);
//! let mut worker = tokenizer.new_worker();
//!
//! worker.reset_sentence("すもももももももものうち");
//! worker.tokenize()?;
//!
//! for token in worker.token_iter() {
//!     println!("{}\t{}", token.surface(), token.feature());
//! }
//!
//! for path in tokenizer.tokenize_nbest("すもももももももものうち", 3)? {
//!     let surfaces: Vec<_> = path.iter().map(|t| t.surface.as_str()).collect();
//!     println!("{}", surfaces.join(" "));
//! }
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("`target_pointer_width` must be 32 or 64");

/// 辞書データ構造と読み込み
pub mod dictionary;

/// エラー型の定義
pub mod errors;

/// 文の内部表現
mod sentence;

/// トークン型の定義
pub mod token;

/// トークナイザーの実装
pub mod tokenizer;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

// Re-exports
pub use dictionary::{Dictionary, DictionaryPaths, LexType, MecabRc};
pub use errors::{HinokiError, Result};
pub use token::{Token, TokenBuf};
pub use tokenizer::Tokenizer;
pub use tokenizer::worker::Worker;

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

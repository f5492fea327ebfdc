//! Hinokiのテストモジュール群
//!
//! 各コンポーネント(connector、dictionary、tokenizer)を組み合わせた
//! 動作を検証するテストを含みます。

//! トークン化処理のためのルーチンを提供するモジュール。
//!
//! このモジュールは、形態素解析のための主要なワーカー構造体を提供します。
//! ワーカーは内部データ構造を保持し、再利用することで不要なメモリアロケーションを避けます。
use crate::errors::Result;
use crate::sentence::Sentence;
use crate::token::{NbestTokenIter, Token, TokenIter};
use crate::tokenizer::Tokenizer;
use crate::tokenizer::lattice::{Lattice, Node};
use crate::tokenizer::nbest_generator::NbestGenerator;

/// トークン化処理のためのルーチンを提供する構造体。
///
/// トークン化に使用される内部データ構造を保持し、それらを再利用することで
/// 不要なメモリ再割り当てを回避します。1つのワーカーを複数の解析で同時に使うことはできません。
///
/// # 例
///
/// ```no_run
/// # use hinoki::Tokenizer;
/// # let tokenizer = Tokenizer::from_mecabrc(None)?;
/// let mut worker = tokenizer.new_worker();
/// worker.reset_sentence("日本語の文章");
/// worker.tokenize()?;
/// for token in worker.token_iter() {
///     println!("{}", token.surface());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Worker<'t> {
    tokenizer: &'t Tokenizer,
    sent: Sentence,
    lattice: Lattice<'t>,
    top_nodes: Vec<Node<'t>>,
    best_cost: Option<i64>,
    nbest_paths: Vec<(Vec<Node<'t>>, i64)>,
}

impl<'t> Worker<'t> {
    /// 新しいインスタンスを作成します。
    ///
    /// # 引数
    ///
    /// * `tokenizer` - 使用するトークナイザー
    pub(crate) fn new(tokenizer: &'t Tokenizer) -> Self {
        Self {
            tokenizer,
            sent: Sentence::new(),
            lattice: Lattice::default(),
            top_nodes: vec![],
            best_cost: None,
            nbest_paths: Vec::with_capacity(0),
        }
    }

    /// トークン化する入力文をリセットします。
    ///
    /// 新しい文を設定し、以前の結果をクリアします。
    ///
    /// # 引数
    ///
    /// * `input` - トークン化する入力文字列
    pub fn reset_sentence<S>(&mut self, input: S)
    where
        S: AsRef<str>,
    {
        self.sent.set_sentence(input);
        self.top_nodes.clear();
        self.best_cost = None;
        self.nbest_paths.clear();
    }

    /// 設定された入力文をトークン化します。
    ///
    /// トークン化結果は内部状態に保存され、`token_iter()`や`token()`メソッドで
    /// アクセスできます。空の文の場合、トークンは0個になります。
    ///
    /// # エラー
    ///
    /// 辞書が壊れている場合にエラーを返します。
    pub fn tokenize(&mut self) -> Result<()> {
        self.top_nodes.clear();
        self.best_cost = None;

        let tokenizer = self.tokenizer;
        tokenizer.build_lattice(&self.sent, &mut self.lattice)?;
        self.top_nodes = self.lattice.best_path()?;
        self.best_cost = self.lattice.eos().map(|eos| eos.min_cost);
        Ok(())
    }

    /// 文をトークン化し、上位N個の最良結果を内部に保存します。
    ///
    /// この関数を呼び出した後、結果は`num_nbest_paths()`, `path_cost(path_idx)`,
    /// `nbest_token_iter(path_idx)`を通じてアクセスできます。
    /// 空の文の場合、トークンを含まないパスが1つ得られます。
    ///
    /// # 引数
    ///
    /// * `n` - 取得する候補パスの最大数
    ///
    /// # エラー
    ///
    /// 辞書が壊れている場合にエラーを返します。
    pub fn tokenize_nbest(&mut self, n: usize) -> Result<()> {
        self.nbest_paths.clear();

        let tokenizer = self.tokenizer;
        tokenizer.build_lattice(&self.sent, &mut self.lattice)?;
        let connector = tokenizer.dictionary().connector();
        let generator = NbestGenerator::new(&self.lattice, connector)?;
        self.nbest_paths = generator.take(n).collect();
        Ok(())
    }

    /// トークン化結果のトークン数を取得します。
    #[inline(always)]
    pub fn num_tokens(&self) -> usize {
        self.top_nodes.len()
    }

    /// `i`番目のトークンを取得します。
    ///
    /// # 引数
    ///
    /// * `i` - トークンのインデックス（0から始まる）
    ///
    /// # パニック
    ///
    /// `i`がトークン数以上の場合にパニックします。
    #[inline(always)]
    pub fn token(&self, i: usize) -> Token<'_> {
        Token::new(&self.sent, &self.top_nodes[i])
    }

    /// トークン化結果のイテレータを作成します。
    #[inline(always)]
    pub fn token_iter(&self) -> TokenIter<'_> {
        TokenIter::new(&self.sent, &self.top_nodes)
    }

    /// 最良パスの総コストを返します。
    ///
    /// # 戻り値
    ///
    /// [`Self::tokenize()`]が成功していれば`Some(コスト)`、そうでなければ`None`
    #[inline(always)]
    pub const fn best_cost(&self) -> Option<i64> {
        self.best_cost
    }

    /// 見つかったN-bestパスの数を返します。
    pub fn num_nbest_paths(&self) -> usize {
        self.nbest_paths.len()
    }

    /// `path_idx`で指定されたパスの総コストを返します。
    ///
    /// # 戻り値
    ///
    /// パスが存在する場合は`Some(コスト)`、存在しない場合は`None`
    pub fn path_cost(&self, path_idx: usize) -> Option<i64> {
        self.nbest_paths.get(path_idx).map(|(_, cost)| *cost)
    }

    /// `path_idx`で指定されたN-bestパスのトークンイテレータを返します。
    ///
    /// # 戻り値
    ///
    /// パスが存在する場合は`Some(イテレータ)`、存在しない場合は`None`
    pub fn nbest_token_iter(&self, path_idx: usize) -> Option<NbestTokenIter<'_>> {
        self.nbest_paths
            .get(path_idx)
            .map(|(nodes, cost)| NbestTokenIter::new(&self.sent, nodes, *cost))
    }
}

//! ラティス（格子）構造の実装モジュール。
//!
//! このモジュールは、形態素解析におけるViterbiアルゴリズムのための
//! ラティス構造を提供します。ノードは入力のバイト位置で管理され、
//! 挿入時に文頭からの最小コストと後方ポインタが一度だけ計算されます。
//!
//! ラティス上の位置`k`は入力のバイト位置`k - 1`に対応します。
//! BOSは位置0から1、入力の単語は位置1から`len + 1`、EOSは`len + 1`から`len + 2`を占めます。
use std::fmt;

use crate::dictionary::connector::ConnectorCost;
use crate::dictionary::lexicon::DicEntry;
use crate::dictionary::word_idx::WordIdx;
use crate::errors::{HinokiError, Result};

/// BOS/EOSの接続ID
pub const BOS_EOS_CONNECTION_ID: u16 = 0;

const MAX_COST: i64 = i64::MAX;

/// ノードの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
    /// 文頭
    Bos,
    /// 文末
    Eos,
    /// 辞書または未知語処理から得られた単語
    Word {
        /// 単語の識別子
        word_idx: WordIdx,
        /// 品詞ID
        pos_id: u16,
        /// 素性文字列
        feature: &'a str,
    },
}

/// ノードへの参照。`ends[end]`の`index`番目のノードを指します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    /// ノードの終了位置
    pub end: usize,
    /// 終了位置のバケット内のインデックス
    pub index: usize,
}

impl NodeRef {
    #[inline(always)]
    pub const fn new(end: usize, index: usize) -> Self {
        Self { end, index }
    }
}

/// ラティス内のノード。
///
/// 各ノードは単語の候補を表し、位置情報、接続ID、最小コストなどを保持します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node<'a> {
    /// ノードの種類
    pub kind: NodeKind<'a>,
    /// 開始位置（ラティス上の位置）
    pub start: usize,
    /// 終了位置（ラティス上の位置）
    pub end: usize,
    /// 左文脈ID
    pub left_id: u16,
    /// 右文脈ID
    pub right_id: u16,
    /// 単語コスト
    pub word_cost: i32,
    /// BOSからこのノードまでの最小コスト
    ///
    /// N-best解のノードでは、そのパスに沿った累積コストです。
    pub min_cost: i64,
    /// 最小コストを与える左側のノード
    pub back: Option<NodeRef>,
}

impl<'a> Node<'a> {
    fn marker(kind: NodeKind<'a>, start: usize) -> Self {
        Self {
            kind,
            start,
            end: start + 1,
            left_id: BOS_EOS_CONNECTION_ID,
            right_id: BOS_EOS_CONNECTION_ID,
            word_cost: 0,
            min_cost: MAX_COST,
            back: None,
        }
    }

    /// 辞書エントリから`start`で始まるノードを作成します。
    pub fn from_entry(entry: &DicEntry<'_, 'a>, start: usize) -> Self {
        Self {
            kind: NodeKind::Word {
                word_idx: entry.word_idx,
                pos_id: entry.param.pos_id,
                feature: entry.feature,
            },
            start,
            end: start + entry.surface.len(),
            left_id: entry.param.left_id,
            right_id: entry.param.right_id,
            word_cost: i32::from(entry.param.word_cost),
            min_cost: MAX_COST,
            back: None,
        }
    }

    /// このノードがBOS（文頭）ノードかどうかを判定します。
    #[inline(always)]
    pub fn is_bos(&self) -> bool {
        matches!(self.kind, NodeKind::Bos)
    }

    /// このノードがEOS（文末）ノードかどうかを判定します。
    #[inline(always)]
    pub fn is_eos(&self) -> bool {
        matches!(self.kind, NodeKind::Eos)
    }

    /// 単語インデックスを取得します。BOS/EOSの場合は既定値を返します。
    #[inline(always)]
    pub fn word_idx(&self) -> WordIdx {
        match self.kind {
            NodeKind::Word { word_idx, .. } => word_idx,
            _ => WordIdx::default(),
        }
    }

    /// 品詞IDを取得します。BOS/EOSの場合は0を返します。
    #[inline(always)]
    pub fn pos_id(&self) -> u16 {
        match self.kind {
            NodeKind::Word { pos_id, .. } => pos_id,
            _ => 0,
        }
    }

    /// 素性文字列を取得します。BOS/EOSの場合は空文字列を返します。
    #[inline(always)]
    pub fn feature(&self) -> &'a str {
        match self.kind {
            NodeKind::Word { feature, .. } => feature,
            _ => "",
        }
    }
}

/// Viterbi解析のためのラティス構造体。
///
/// `ends[k]`が位置`k`で終わるノードを所有し、`starts[k]`が位置`k`から始まる
/// ノードへの参照を保持します。ノードは現在の走査位置`p`からしか挿入されないため、
/// 緩和処理では`ends[p]`だけを調べれば十分です。
#[derive(Default)]
pub struct Lattice<'a> {
    starts: Vec<Vec<NodeRef>>,
    ends: Vec<Vec<Node<'a>>>,
    p: usize,
    len: usize,
    eos: Option<NodeRef>,
}

impl<'a> Lattice<'a> {
    /// ラティスをリセットし、新しい入力の処理を準備します。
    ///
    /// 確保済みのバケットは再利用されます。
    ///
    /// # 引数
    ///
    /// * `len` - 入力のバイト長
    pub fn reset(&mut self, len: usize) {
        let new_len = len + 3;
        Self::reset_vec(&mut self.starts, new_len);
        Self::reset_vec(&mut self.ends, new_len);
        self.len = len;
        self.eos = None;
        self.insert_bos();
    }

    fn reset_vec<T>(data: &mut Vec<Vec<T>>, new_len: usize) {
        for v in data.iter_mut() {
            v.clear();
        }
        if data.len() < new_len {
            data.resize_with(new_len, || Vec::with_capacity(16));
        } else {
            data.truncate(new_len);
        }
    }

    fn insert_bos(&mut self) {
        let mut bos = Node::marker(NodeKind::Bos, 0);
        bos.min_cost = 0;
        self.push(bos);
        self.p = 1;
    }

    #[inline(always)]
    fn push(&mut self, node: Node<'a>) -> NodeRef {
        let r = NodeRef::new(node.end, self.ends[node.end].len());
        self.ends[node.end].push(node);
        self.starts[node.start].push(r);
        r
    }

    /// 現在の走査位置を返します。
    #[inline(always)]
    pub const fn position(&self) -> usize {
        self.p
    }

    /// 入力のバイト長を返します。
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// 入力が空かどうかを返します。
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// EOSが挿入済みかどうかを返します。
    #[inline(always)]
    pub const fn is_closed(&self) -> bool {
        self.eos.is_some()
    }

    /// EOSノードを返します。
    #[inline(always)]
    pub fn eos(&self) -> Option<&Node<'a>> {
        self.eos.and_then(|r| self.node(r))
    }

    /// BOSノードへの参照を返します。
    #[inline(always)]
    pub const fn bos_ref(&self) -> NodeRef {
        NodeRef::new(1, 0)
    }

    /// EOSノードへの参照を返します。
    #[inline(always)]
    pub const fn eos_ref(&self) -> Option<NodeRef> {
        self.eos
    }

    /// 参照が指すノードを返します。
    #[inline(always)]
    pub fn node(&self, r: NodeRef) -> Option<&Node<'a>> {
        self.ends.get(r.end)?.get(r.index)
    }

    /// ノードを格納する位置の数を返します。
    ///
    /// EOSの挿入後はEOSの終了位置を含みます。
    #[inline(always)]
    pub fn num_positions(&self) -> usize {
        self.ends.len()
    }

    /// 位置`pos`で終わるノードを返します。
    #[inline(always)]
    pub fn ends_at(&self, pos: usize) -> &[Node<'a>] {
        self.ends.get(pos).map(Vec::as_slice).unwrap_or_default()
    }

    /// 位置`pos`から始まるノードへの参照を返します。
    #[inline(always)]
    pub fn starts_at(&self, pos: usize) -> &[NodeRef] {
        self.starts.get(pos).map(Vec::as_slice).unwrap_or_default()
    }

    /// 現在の走査位置で終わるノードの中から、`node`に接続したときの
    /// 累積コストが最小のものを選び、コストと後方ポインタを設定したノードを返します。
    ///
    /// # 引数
    ///
    /// * `node` - 走査位置から始まるノード
    /// * `connector` - 接続コスト計算用のコネクタ
    ///
    /// # エラー
    ///
    /// ラティスが閉じている場合、または走査位置で終わるノードがない場合にエラーを返します。
    pub fn relax<C>(&self, node: Node<'a>, connector: &C) -> Result<Node<'a>>
    where
        C: ConnectorCost + ?Sized,
    {
        if self.is_closed() {
            return Err(HinokiError::invalid_state(
                "cannot relax a node",
                "the lattice is already closed",
            ));
        }
        let mut min_idx = None;
        let mut min_cost = MAX_COST;
        for (i, left_node) in self.ends_at(self.p).iter().enumerate() {
            let new_cost =
                left_node.min_cost + i64::from(connector.cost(left_node.right_id, node.left_id));
            // Depending on the order of tie-breaking, the result can be different from MeCab.
            // Using <= (not <) will produce results identical to MeCab in most case (empirically).
            if new_cost <= min_cost {
                min_idx = Some(i);
                min_cost = new_cost;
            }
        }
        let Some(min_idx) = min_idx else {
            return Err(HinokiError::invalid_state(
                "cannot relax a node",
                format!("no node ends at position {}", self.p),
            ));
        };
        Ok(Node {
            min_cost: min_cost + i64::from(node.word_cost),
            back: Some(NodeRef::new(self.p, min_idx)),
            ..node
        })
    }

    /// 辞書エントリを現在の走査位置から始まるノードとして挿入します。
    ///
    /// # 引数
    ///
    /// * `entry` - 辞書エントリ
    /// * `connector` - 接続コスト計算用のコネクタ
    ///
    /// # 戻り値
    ///
    /// 挿入したノードへの参照
    ///
    /// # エラー
    ///
    /// エントリが空の場合、入力の末尾を越える場合、またはノードを緩和できない場合にエラーを返します。
    pub fn insert_entry<C>(&mut self, entry: &DicEntry<'_, 'a>, connector: &C) -> Result<NodeRef>
    where
        C: ConnectorCost + ?Sized,
    {
        if entry.surface.is_empty() {
            return Err(HinokiError::invalid_argument(
                "entry",
                "surface must not be empty",
            ));
        }
        let node = Node::from_entry(entry, self.p);
        if node.end > self.len + 1 {
            return Err(HinokiError::invalid_state(
                "cannot insert a node",
                format!(
                    "node {}..{} runs past the end of input at {}",
                    node.start,
                    node.end,
                    self.len + 1
                ),
            ));
        }
        let node = self.relax(node, connector)?;
        Ok(self.push(node))
    }

    /// 走査位置を、ノードが終わっている次の位置まで進めます。
    ///
    /// # 戻り値
    ///
    /// 進めた距離
    ///
    /// # エラー
    ///
    /// ラティスが閉じている場合、またはそれ以降にノードが終わる位置がない場合にエラーを返します。
    pub fn advance(&mut self) -> Result<usize> {
        if self.is_closed() {
            return Err(HinokiError::invalid_state(
                "cannot advance",
                "the lattice is already closed",
            ));
        }
        let old = self.p;
        let next = (old + 1..self.ends.len()).find(|&i| !self.ends[i].is_empty());
        match next {
            Some(p) => {
                self.p = p;
                Ok(p - old)
            }
            None => Err(HinokiError::invalid_state(
                "cannot advance",
                format!("no node ends after position {old}"),
            )),
        }
    }

    /// 現在の走査位置にEOSを挿入し、ラティスを閉じます。
    ///
    /// # 引数
    ///
    /// * `connector` - 接続コスト計算用のコネクタ
    ///
    /// # エラー
    ///
    /// すでに閉じている場合、またはEOSに接続するノードがない場合にエラーを返します。
    pub fn close<C>(&mut self, connector: &C) -> Result<()>
    where
        C: ConnectorCost + ?Sized,
    {
        let eos = self.relax(Node::marker(NodeKind::Eos, self.p), connector)?;
        let r = self.push(eos);
        self.eos = Some(r);
        self.starts.truncate(self.p + 2);
        self.ends.truncate(self.p + 2);
        Ok(())
    }

    /// 最良パスのノードを文頭から順に返します。
    ///
    /// EOSから後方ポインタをたどってBOSまで戻ります。BOSとEOSは含みません。
    ///
    /// # エラー
    ///
    /// ラティスが閉じていない場合にエラーを返します。
    pub fn best_path(&self) -> Result<Vec<Node<'a>>> {
        let refs = self.best_path_refs()?;
        let mut nodes = Vec::with_capacity(refs.len());
        for r in refs {
            nodes.push(*self.node_or_err(r)?);
        }
        Ok(nodes)
    }

    /// 最良パスのノードへの参照を文頭から順に返します。BOSとEOSは含みません。
    ///
    /// # エラー
    ///
    /// ラティスが閉じていない場合にエラーを返します。
    pub fn best_path_refs(&self) -> Result<Vec<NodeRef>> {
        let eos = self.eos().ok_or_else(|| {
            HinokiError::invalid_state("cannot take the best path", "the lattice is not closed")
        })?;
        let mut refs = vec![];
        let mut back = eos.back;
        while let Some(r) = back {
            let node = self.node_or_err(r)?;
            if node.is_bos() {
                break;
            }
            refs.push(r);
            back = node.back;
        }
        refs.reverse();
        Ok(refs)
    }

    fn node_or_err(&self, r: NodeRef) -> Result<&Node<'a>> {
        self.node(r).ok_or_else(|| {
            HinokiError::invalid_state(
                "cannot take the best path",
                format!("dangling back-pointer {r:?}"),
            )
        })
    }
}

impl fmt::Debug for Lattice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lattice {{ p: {}, eos: {:?}, ends: [", self.p, &self.eos)?;
        for (i, e) in self.ends.iter().enumerate() {
            writeln!(f, "{i} => {e:?}")?;
        }
        writeln!(f, "]}}")
    }
}

//! N-best解生成モジュール。
//!
//! このモジュールは、A*探索アルゴリズムを使用してトークン化の
//! 上位N個の最良解を生成する機能を提供します。
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;

use crate::dictionary::connector::ConnectorCost;
use crate::errors::{HinokiError, Result};
use crate::tokenizer::lattice::{Lattice, Node, NodeRef};

// A path is stored as a linked list from its leading node toward EOS.
//
// QueueItem -> SearchPath (node: n) -> SearchPath (node: n+1) -> ... -> SearchPath (node: EOS)

/// A*探索によって探索中の部分パス。
///
/// 文の終端から始端への連結リストを形成します。
#[derive(Debug)]
struct SearchPath {
    /// パスの先頭（BOS側）にあるノード。
    node: NodeRef,
    /// 次のノード（EOS方向）。
    next: Option<Rc<SearchPath>>,
    /// EOSからこのノードまでの総コスト（後方コスト）。
    backward_cost: i64,
}

impl SearchPath {
    /// BOSに到達したパスから、BOSとEOSを除くノードへの参照を文頭から順に返します。
    fn word_refs(&self) -> Vec<NodeRef> {
        let mut refs = vec![];
        let mut p = self.next.as_deref();
        while let Some(seg) = p {
            // The last segment is EOS.
            if seg.next.is_none() {
                break;
            }
            refs.push(seg.node);
            p = seg.next.as_deref();
        }
        refs
    }
}

/// A*探索のための優先度付きキュー内のアイテム。
#[derive(Debug)]
struct QueueItem {
    /// 現在の部分パスへのポインタ。
    path: Rc<SearchPath>,
    /// パスの優先度。f(x) = g(x) + h(x)として計算されます。
    ///  - g(x)はEOSからの後方コスト（backward_cost）。
    ///  - h(x)はBOSからの前方コスト（min_cost）で、ノードに保存されています。
    priority: i64,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other.priority.cmp(&self.priority) // Invert to create a min-heap
    }
}

/// N-bestトークン化結果のジェネレータ。
///
/// A*探索アルゴリズムを使用して、コストが低い順に
/// トークン化パスを生成するイテレータとして機能します。
/// ノードの`min_cost`はBOSからの正確な最小コストなので、優先度は
/// 完成したパスのコストの下界となり、取り出された順にパスが確定します。
///
/// 最初のパスは常にビタビ探索の最良パスと一致します。同じコストのパスが複数ある場合でも、
/// A*探索の取り出し順ではなく後方ポインタが選んだパスを先に返し、
/// A*探索で同じパスに到達したときは読み飛ばします。
pub struct NbestGenerator<'l, 'a, C: ?Sized> {
    queue: BinaryHeap<QueueItem>,
    lattice: &'l Lattice<'a>,
    connector: &'l C,
    /// まだ返していない最良パス
    best_pending: bool,
    /// A*探索でまだ読み飛ばしていない最良パス
    best_refs: Option<Vec<NodeRef>>,
}

impl<'l, 'a, C> NbestGenerator<'l, 'a, C>
where
    C: ConnectorCost + ?Sized,
{
    /// 新しいN-bestジェネレータを作成します。
    ///
    /// # 引数
    ///
    /// * `lattice` - 閉じたラティス
    /// * `connector` - 接続コスト計算用のコネクタ
    ///
    /// # エラー
    ///
    /// ラティスが閉じていない場合にエラーを返します。
    pub fn new(lattice: &'l Lattice<'a>, connector: &'l C) -> Result<Self> {
        let (eos_ref, eos) = lattice
            .eos_ref()
            .zip(lattice.eos())
            .ok_or_else(|| {
                HinokiError::invalid_state(
                    "cannot start N-best search",
                    "the lattice is not closed",
                )
            })?;
        let best_refs = lattice.best_path_refs()?;
        let mut queue = BinaryHeap::new();
        queue.push(QueueItem {
            path: Rc::new(SearchPath {
                node: eos_ref,
                next: None,
                backward_cost: 0,
            }),
            priority: eos.min_cost, // f(x) = g(x) + h(x) = 0 + h(BOS->EOS)
        });
        Ok(Self {
            queue,
            lattice,
            connector,
            best_pending: true,
            best_refs: Some(best_refs),
        })
    }

    /// 参照の列からパスを組み立てます。
    ///
    /// コピーしたノードの`min_cost`と`back`は、このパスに沿ったBOSからの累積コストと
    /// 直前のノードに置き換えます。最良パスではラティス上の値と一致します。
    ///
    /// # 戻り値
    ///
    /// ノードのベクトルとEOSまでのパスの総コスト
    fn build_path(&self, refs: &[NodeRef]) -> Option<(Vec<Node<'a>>, i64)> {
        let mut prev_ref = self.lattice.bos_ref();
        let mut prev = *self.lattice.node(prev_ref)?;
        let mut nodes = Vec::with_capacity(refs.len());
        for &r in refs {
            let mut node = *self.lattice.node(r)?;
            node.min_cost = self.extend(&prev, &node);
            node.back = Some(prev_ref);
            nodes.push(node);
            prev = node;
            prev_ref = r;
        }
        let eos = self.lattice.eos()?;
        let cost = self.extend(&prev, eos);
        Some((nodes, cost))
    }

    /// `prev`の累積コストに`node`への接続コストと単語コストを加えます。
    #[inline(always)]
    fn extend(&self, prev: &Node<'a>, node: &Node<'a>) -> i64 {
        prev.min_cost
            + i64::from(self.connector.cost(prev.right_id, node.left_id))
            + i64::from(node.word_cost)
    }
}

impl<'a, C> Iterator for NbestGenerator<'_, 'a, C>
where
    C: ConnectorCost + ?Sized,
{
    /// ノードのベクトル（文頭から順）とパスの総コストのタプル。
    type Item = (Vec<Node<'a>>, i64);

    /// 次のN-bestパスを取得します。
    ///
    /// # 戻り値
    ///
    /// パスが見つかった場合は`Some((ノードのベクトル, コスト))`、
    /// すべてのパスが探索済みの場合は`None`
    fn next(&mut self) -> Option<Self::Item> {
        if self.best_pending {
            self.best_pending = false;
            if let Some(path) = self.best_refs.as_deref().and_then(|r| self.build_path(r)) {
                return Some(path);
            }
        }

        while let Some(item) = self.queue.pop() {
            let current_path = &item.path;
            let Some(current_node) = self.lattice.node(current_path.node) else {
                continue;
            };

            // If we reached the BOS, a full path has been found.
            if current_node.is_bos() {
                let refs = current_path.word_refs();
                if self.best_refs.as_ref() == Some(&refs) {
                    // Already returned first.
                    self.best_refs = None;
                    continue;
                }
                match self.build_path(&refs) {
                    Some(path) => return Some(path),
                    None => continue,
                }
            }

            // Expand to previous nodes.
            for (i, prev_node) in self.lattice.ends_at(current_node.start).iter().enumerate() {
                let conn_cost = self.connector.cost(prev_node.right_id, current_node.left_id);
                let new_backward_cost = current_path.backward_cost
                    + i64::from(current_node.word_cost)
                    + i64::from(conn_cost);
                let new_priority = new_backward_cost + prev_node.min_cost; // f(x) = g(x) + h(x)

                let new_path = Rc::new(SearchPath {
                    node: NodeRef::new(current_node.start, i),
                    next: Some(Rc::clone(current_path)),
                    backward_cost: new_backward_cost,
                });
                self.queue.push(QueueItem {
                    path: new_path,
                    priority: new_priority,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dictionary::LexType;
    use crate::dictionary::connector::ConnectorView;
    use crate::dictionary::lexicon::{DicEntry, WordParam};
    use crate::dictionary::word_idx::WordIdx;

    struct ZeroConnector;

    impl ConnectorView for ZeroConnector {
        fn num_left(&self) -> usize {
            1
        }
        fn num_right(&self) -> usize {
            1
        }
    }

    impl ConnectorCost for ZeroConnector {
        fn cost(&self, _: u16, _: u16) -> i32 {
            0
        }
    }

    fn entry(surface: &[u8], cost: i16) -> DicEntry<'_, 'static> {
        DicEntry {
            surface,
            word_idx: WordIdx::new(LexType::System, 0),
            param: WordParam::new(0, 0, 0, cost),
            feature: "",
        }
    }

    fn homonym<'a>(surface: &'a [u8], id: u32, feature: &'static str) -> DicEntry<'a, 'static> {
        DicEntry {
            surface,
            word_idx: WordIdx::new(LexType::System, id),
            param: WordParam::new(0, 0, 0, 5),
            feature,
        }
    }

    fn build(lattice: &mut Lattice<'static>) {
        let conn = ZeroConnector;
        // "abc": a|b|c = 3, ab|c = 5, a|bc = 4, abc = 10
        lattice.reset(3);
        lattice.insert_entry(&entry(b"a", 1), &conn).unwrap();
        lattice.insert_entry(&entry(b"ab", 4), &conn).unwrap();
        lattice.insert_entry(&entry(b"abc", 10), &conn).unwrap();
        lattice.advance().unwrap();
        lattice.insert_entry(&entry(b"b", 1), &conn).unwrap();
        lattice.insert_entry(&entry(b"bc", 3), &conn).unwrap();
        lattice.advance().unwrap();
        lattice.insert_entry(&entry(b"c", 1), &conn).unwrap();
        lattice.advance().unwrap();
        lattice.close(&conn).unwrap();
    }

    #[test]
    fn test_enumerates_all_paths_in_cost_order() {
        let mut lattice = Lattice::default();
        build(&mut lattice);
        let paths: Vec<_> = NbestGenerator::new(&lattice, &ZeroConnector)
            .unwrap()
            .map(|(nodes, cost)| {
                let spans: Vec<_> = nodes.iter().map(|n| (n.start, n.end)).collect();
                (spans, cost)
            })
            .collect();
        assert_eq!(
            paths,
            vec![
                (vec![(1, 2), (2, 3), (3, 4)], 3),
                (vec![(1, 2), (2, 4)], 4),
                (vec![(1, 3), (3, 4)], 5),
                (vec![(1, 4)], 10),
            ]
        );
    }

    #[test]
    fn test_first_cost_is_viterbi_optimum() {
        let mut lattice = Lattice::default();
        build(&mut lattice);
        let (nodes, cost) = NbestGenerator::new(&lattice, &ZeroConnector)
            .unwrap()
            .next()
            .unwrap();
        assert_eq!(cost, lattice.eos().unwrap().min_cost);
        assert_eq!(nodes, lattice.best_path().unwrap());
    }

    #[test]
    fn test_node_costs_follow_each_path() {
        let mut lattice = Lattice::default();
        build(&mut lattice);
        let paths: Vec<_> = NbestGenerator::new(&lattice, &ZeroConnector)
            .unwrap()
            .collect();
        assert_eq!(paths.len(), 4);
        for (nodes, cost) in &paths {
            let mut sum = 0;
            let mut prev_end = 1;
            for node in nodes {
                sum += i64::from(node.word_cost);
                assert_eq!(node.min_cost, sum);
                let back = lattice.node(node.back.unwrap()).unwrap();
                assert_eq!(back.end, prev_end);
                assert_eq!(back.end, node.start);
                prev_end = node.end;
            }
            assert_eq!(nodes.last().unwrap().min_cost, *cost);
        }
        assert_eq!(paths[0].0[0].back, Some(lattice.bos_ref()));

        // ab|c: the cheapest way to reach c goes through b instead.
        let (nodes, cost) = &paths[2];
        assert_eq!(*cost, 5);
        assert_eq!(nodes[1].min_cost, 5);
        let c = lattice.ends_at(4).iter().find(|n| n.start == 3).unwrap();
        assert_eq!(c.min_cost, 3);
    }

    #[test]
    fn test_equal_cost_homonyms_start_with_viterbi() {
        let conn = ZeroConnector;
        let mut lattice = Lattice::default();
        lattice.reset(2);
        lattice.insert_entry(&homonym(b"ab", 1, "first"), &conn).unwrap();
        lattice.insert_entry(&homonym(b"ab", 2, "second"), &conn).unwrap();
        lattice.advance().unwrap();
        lattice.close(&conn).unwrap();

        let best = lattice.best_path().unwrap();
        let paths: Vec<_> = NbestGenerator::new(&lattice, &conn).unwrap().collect();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].0, best);
        assert_eq!((paths[0].1, paths[1].1), (5, 5));
        let mut features: Vec<_> = paths.iter().map(|(nodes, _)| nodes[0].feature()).collect();
        features.sort_unstable();
        assert_eq!(features, vec!["first", "second"]);
    }

    #[test]
    fn test_requires_closed_lattice() {
        let mut lattice: Lattice<'static> = Lattice::default();
        lattice.reset(1);
        assert!(matches!(
            NbestGenerator::new(&lattice, &ZeroConnector),
            Err(HinokiError::InvalidState(_))
        ));
    }

    #[test]
    fn test_empty_input_yields_one_empty_path() {
        let mut lattice: Lattice<'static> = Lattice::default();
        lattice.reset(0);
        lattice.close(&ZeroConnector).unwrap();
        let paths: Vec<_> = NbestGenerator::new(&lattice, &ZeroConnector)
            .unwrap()
            .collect();
        assert_eq!(paths, vec![(vec![], 0)]);
    }
}

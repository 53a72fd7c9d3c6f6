//! Queue backend of the unsatisfied clause tracker.
//!
//! Members are nodes of a doubly linked list kept in an arena and addressed by index. The arena
//! grows in chunks and free nodes are linked into a free list. When most of the arena is free,
//! live nodes are compacted into a fresh arena in queue order.
use std::time::{Duration, Instant};

use crate::mem::{Mem, MemError};

use super::UnsatTracker;

const NIL: u32 = u32::max_value();

#[derive(Copy, Clone, Debug)]
struct Node {
    cidx: u32,
    prev: u32,
    next: u32,
}

impl Default for Node {
    fn default() -> Node {
        Node {
            cidx: NIL,
            prev: NIL,
            next: NIL,
        }
    }
}

/// Unsatisfied clauses in insertion order.
pub struct UnsatQueue {
    nodes: Vec<Node>,
    /// Node of each clause, `NIL` for non-members.
    node_of: Vec<u32>,
    head: u32,
    tail: u32,
    free: u32,
    free_count: usize,
    len: usize,
    min_chunk_size: usize,
    chunk_count: usize,
    defrag: bool,
    max_chunks: usize,
    max_nodes: usize,
    defrag_count: u64,
    moved: u64,
    defrag_time: Duration,
}

impl UnsatQueue {
    /// An empty queue for clause indices below `clause_count`.
    pub fn new(
        mem: &mut Mem,
        clause_count: usize,
        min_chunk_size: usize,
        defrag: bool,
    ) -> Result<UnsatQueue, MemError> {
        Ok(UnsatQueue {
            nodes: vec![],
            node_of: mem.alloc(clause_count, NIL)?,
            head: NIL,
            tail: NIL,
            free: NIL,
            free_count: 0,
            len: 0,
            min_chunk_size: min_chunk_size.max(2),
            chunk_count: 0,
            defrag,
            max_chunks: 0,
            max_nodes: 0,
            defrag_count: 0,
            moved: 0,
            defrag_time: Duration::default(),
        })
    }

    /// Oldest member.
    pub fn head(&self) -> Option<usize> {
        self.cidx_at(self.head)
    }

    /// Newest member.
    pub fn tail(&self) -> Option<usize> {
        self.cidx_at(self.tail)
    }

    /// Member `offset` positions after the head.
    pub fn nth(&self, offset: usize) -> Option<usize> {
        let mut node = self.head;
        for _ in 0..offset {
            if node == NIL {
                break;
            }
            node = self.nodes[node as usize].next;
        }
        self.cidx_at(node)
    }

    /// Walk from the head while `advance` returns true.
    ///
    /// Stops at the tail. Returns the member reached.
    pub fn walk(&self, mut advance: impl FnMut() -> bool) -> Option<usize> {
        let mut node = self.head;
        if node == NIL {
            return None;
        }
        loop {
            let next = self.nodes[node as usize].next;
            if next == NIL || !advance() {
                break;
            }
            node = next;
        }
        self.cidx_at(node)
    }

    /// Members from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        let mut node = self.head;
        std::iter::from_fn(move || {
            if node == NIL {
                None
            } else {
                let current = &self.nodes[node as usize];
                node = current.next;
                Some(current.cidx as usize)
            }
        })
    }

    fn cidx_at(&self, node: u32) -> Option<usize> {
        if node == NIL {
            None
        } else {
            Some(self.nodes[node as usize].cidx as usize)
        }
    }

    /// Number of chunks the arena grew by since the last compaction.
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Largest number of chunks seen.
    pub fn max_chunks(&self) -> usize {
        self.max_chunks
    }

    /// Largest arena size seen.
    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    /// Number of compactions and of nodes moved by them.
    pub fn defrag_stats(&self) -> (u64, u64) {
        (self.defrag_count, self.moved)
    }

    /// Time spent compacting.
    pub fn defrag_time(&self) -> Duration {
        self.defrag_time
    }

    /// Size of the node arena.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    fn push_free(&mut self, node: u32) {
        self.nodes[node as usize] = Node {
            cidx: NIL,
            prev: NIL,
            next: self.free,
        };
        self.free = node;
        self.free_count += 1;
    }

    /// Grow the arena by one chunk. Chunks double in size.
    fn grow(&mut self, mem: &mut Mem) -> Result<(), MemError> {
        let old_len = self.nodes.len();
        let chunk_size = self.min_chunk_size.max(old_len);
        mem.resize(&mut self.nodes, old_len + chunk_size, Node::default())?;
        for node in (old_len..old_len + chunk_size).rev() {
            self.push_free(node as u32);
        }
        self.chunk_count += 1;
        self.max_chunks = self.max_chunks.max(self.chunk_count);
        self.max_nodes = self.max_nodes.max(self.nodes.len());
        Ok(())
    }

    fn needs_defrag(&self) -> bool {
        self.defrag && self.nodes.len() > self.min_chunk_size && self.free_count > 3 * self.len
    }

    /// Move all live nodes to the front of a fresh arena, in queue order.
    pub fn defragment(&mut self, mem: &mut Mem) -> Result<(), MemError> {
        let start = Instant::now();
        let size = self.min_chunk_size.max(2 * self.len);
        let mut nodes = mem.alloc(size, Node::default())?;

        let mut node = self.head;
        let mut index = 0;
        while node != NIL {
            let old = self.nodes[node as usize];
            nodes[index] = Node {
                cidx: old.cidx,
                prev: if index == 0 { NIL } else { index as u32 - 1 },
                next: if old.next == NIL { NIL } else { index as u32 + 1 },
            };
            self.node_of[old.cidx as usize] = index as u32;
            if index as u32 != node {
                self.moved += 1;
            }
            index += 1;
            node = old.next;
        }
        debug_assert_eq!(index, self.len);

        mem.release(&mut self.nodes);
        self.nodes = nodes;
        self.head = if self.len == 0 { NIL } else { 0 };
        self.tail = if self.len == 0 { NIL } else { self.len as u32 - 1 };
        self.free = NIL;
        self.free_count = 0;
        for node in (self.len..size).rev() {
            self.push_free(node as u32);
        }
        self.chunk_count = 1;
        self.defrag_count += 1;
        self.defrag_time += start.elapsed();
        Ok(())
    }
}

impl UnsatTracker for UnsatQueue {
    #[inline]
    fn contains(&self, cidx: usize) -> bool {
        self.node_of[cidx] != NIL
    }

    fn insert(&mut self, mem: &mut Mem, cidx: usize) -> Result<(), MemError> {
        debug_assert!(!self.contains(cidx));
        if self.free == NIL {
            self.grow(mem)?;
        }
        let node = self.free;
        self.free = self.nodes[node as usize].next;
        self.free_count -= 1;

        self.nodes[node as usize] = Node {
            cidx: cidx as u32,
            prev: self.tail,
            next: NIL,
        };
        if self.tail == NIL {
            self.head = node;
        } else {
            self.nodes[self.tail as usize].next = node;
        }
        self.tail = node;
        self.node_of[cidx] = node;
        self.len += 1;
        Ok(())
    }

    fn remove(&mut self, mem: &mut Mem, cidx: usize) -> Result<(), MemError> {
        debug_assert!(self.contains(cidx));
        let node = self.node_of[cidx];
        let Node { prev, next, .. } = self.nodes[node as usize];

        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev as usize].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next as usize].prev = prev;
        }

        self.node_of[cidx] = NIL;
        self.push_free(node);
        self.len -= 1;

        if self.needs_defrag() {
            self.defragment(mem)?;
        }
        Ok(())
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self, mem: &mut Mem) {
        mem.release(&mut self.nodes);
        mem.release(&mut self.node_of);
    }
}

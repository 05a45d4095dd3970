//! Broad-phase quadtree, rebuilt from scratch every tick
//!
//! Stores `(bounding box, payload)` pairs. Payloads are plain copies (enemy
//! indices), so the tree never owns or outlives the entities it indexes.
//! Objects that straddle a child boundary, or lie outside the root bounds,
//! stay in the node that could not push them down.

use super::geometry::Aabb;

pub const DEFAULT_MAX_OBJECTS: usize = 8;
pub const DEFAULT_MAX_DEPTH: u32 = 6;

#[derive(Debug, Clone)]
struct Node<T: Copy> {
    bounds: Aabb,
    depth: u32,
    objects: Vec<(Aabb, T)>,
    children: Option<Box<[Node<T>; 4]>>,
}

impl<T: Copy> Node<T> {
    fn new(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            objects: Vec::new(),
            children: None,
        }
    }

    /// Index of the child quadrant that fully contains `bbox`
    fn child_for(&self, bbox: &Aabb) -> Option<usize> {
        let children = self.children.as_ref()?;
        children.iter().position(|c| c.bounds.contains(bbox))
    }

    fn split(&mut self) {
        let hw = self.bounds.w / 2.0;
        let hh = self.bounds.h / 2.0;
        let x = self.bounds.x;
        let y = self.bounds.y;
        let d = self.depth + 1;
        self.children = Some(Box::new([
            Node::new(Aabb::new(x, y, hw, hh), d),
            Node::new(Aabb::new(x + hw, y, hw, hh), d),
            Node::new(Aabb::new(x, y + hh, hw, hh), d),
            Node::new(Aabb::new(x + hw, y + hh, hw, hh), d),
        ]));
    }

    fn insert(&mut self, bbox: Aabb, payload: T, max_objects: usize, max_depth: u32) {
        if let Some(i) = self.child_for(&bbox) {
            if let Some(children) = self.children.as_mut() {
                children[i].insert(bbox, payload, max_objects, max_depth);
                return;
            }
        }

        self.objects.push((bbox, payload));

        if self.objects.len() > max_objects && self.depth < max_depth && self.children.is_none() {
            self.split();
            let objects = std::mem::take(&mut self.objects);
            for (b, p) in objects {
                match self.child_for(&b) {
                    Some(i) => {
                        if let Some(children) = self.children.as_mut() {
                            children[i].insert(b, p, max_objects, max_depth);
                        }
                    }
                    None => self.objects.push((b, p)),
                }
            }
        }
    }

    fn query(&self, range: &Aabb, out: &mut Vec<T>) {
        for (b, p) in &self.objects {
            if b.intersects(range) {
                out.push(*p);
            }
        }
        if let Some(children) = &self.children {
            for child in children.iter() {
                if child.bounds.intersects(range) {
                    child.query(range, out);
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.objects.len()
            + self
                .children
                .as_ref()
                .map_or(0, |c| c.iter().map(Node::len).sum())
    }
}

/// Region quadtree over axis-aligned boxes
#[derive(Debug, Clone)]
pub struct Quadtree<T: Copy> {
    root: Node<T>,
    max_objects: usize,
    max_depth: u32,
}

impl<T: Copy> Quadtree<T> {
    pub fn new(bounds: Aabb) -> Self {
        Self::with_limits(bounds, DEFAULT_MAX_OBJECTS, DEFAULT_MAX_DEPTH)
    }

    pub fn with_limits(bounds: Aabb, max_objects: usize, max_depth: u32) -> Self {
        Self {
            root: Node::new(bounds, 0),
            max_objects: max_objects.max(1),
            max_depth,
        }
    }

    /// Drop every entry (call before each rebuild)
    pub fn clear(&mut self) {
        self.root = Node::new(self.root.bounds, 0);
    }

    pub fn insert(&mut self, bbox: Aabb, payload: T) {
        self.root
            .insert(bbox, payload, self.max_objects, self.max_depth);
    }

    /// Every payload whose box touches `range`. Broad phase only: callers
    /// must still run the exact circle test.
    pub fn query(&self, range: &Aabb) -> Vec<T> {
        let mut out = Vec::new();
        self.root.query(range, &mut out);
        out
    }

    /// Same as [`Quadtree::query`] but reuses a caller-owned buffer
    pub fn query_into(&self, range: &Aabb, out: &mut Vec<T>) {
        out.clear();
        self.root.query(range, out);
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

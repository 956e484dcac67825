use eframe::egui::{Vec2, vec2};

const QUADTREE_LEAF_CAPACITY: usize = 12;
const QUADTREE_MAX_DEPTH: usize = 10;

#[derive(Clone, Copy)]
pub(super) struct QuadBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl QuadBounds {
    fn from_points(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let center = (min + max) * 0.5;
        let span_x = (max.x - min.x).max(1.0);
        let span_y = (max.y - min.y).max(1.0);
        let half_extent = (span_x.max(span_y) * 0.5) + 1.0;

        Some(Self {
            center,
            half_extent,
        })
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = match quadrant {
            0 => vec2(-quarter, -quarter),
            1 => vec2(quarter, -quarter),
            2 => vec2(-quarter, quarter),
            _ => vec2(quarter, quarter),
        };

        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_for(self, point: Vec2) -> usize {
        let right = point.x >= self.center.x;
        let lower = point.y >= self.center.y;
        match (right, lower) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }

    fn distance_sq_to(self, other: Self) -> f32 {
        let dx = (self.center.x - other.center.x).abs() - (self.half_extent + other.half_extent);
        let dy = (self.center.y - other.center.y).abs() - (self.half_extent + other.half_extent);
        let clamped_dx = dx.max(0.0);
        let clamped_dy = dy.max(0.0);
        (clamped_dx * clamped_dx) + (clamped_dy * clamped_dy)
    }
}

pub(super) struct QuadNode {
    bounds: QuadBounds,
    indices: Vec<usize>,
    children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = QuadBounds::from_points(positions)?;
        let indices = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::build_node(bounds, indices, positions, 0))
    }

    fn build_node(
        bounds: QuadBounds,
        indices: Vec<usize>,
        positions: &[Vec2],
        depth: usize,
    ) -> Self {
        let mut node = Self {
            bounds,
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= QUADTREE_MAX_DEPTH || node.indices.len() <= QUADTREE_LEAF_CAPACITY {
            return node;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &index in &node.indices {
            let quadrant = bounds.quadrant_for(positions[index]);
            buckets[quadrant].push(index);
        }

        let non_empty = buckets.iter().filter(|bucket| !bucket.is_empty()).count();
        if non_empty <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }

            let child_bounds = bounds.child(quadrant);
            node.children[quadrant] = Some(Box::new(Self::build_node(
                child_bounds,
                bucket,
                positions,
                depth + 1,
            )));
        }
        node.indices.clear();
        node
    }

    fn is_leaf(&self) -> bool {
        self.children.iter().all(|child| child.is_none())
    }
}

/// Visit every unordered pair `(i, j)` whose cells lie within `max_distance`
/// of each other. Pairs farther apart than that are never reported; pairs
/// closer are reported exactly once.
pub(super) fn for_each_candidate_pair(
    tree: &QuadNode,
    max_distance: f32,
    visit: &mut impl FnMut(usize, usize),
) {
    visit_pairs(tree, tree, true, max_distance * max_distance, visit);
}

fn visit_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    max_distance_sq: f32,
    visit: &mut impl FnMut(usize, usize),
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &first) in node_a.indices.iter().enumerate() {
                for &second in &node_a.indices[offset + 1..] {
                    visit(first, second);
                }
            }
        } else {
            for &first in &node_a.indices {
                for &second in &node_b.indices {
                    visit(first, second);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_ref() else {
                continue;
            };

            visit_pairs(child_a, child_a, true, max_distance_sq, visit);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_ref() else {
                    continue;
                };
                visit_pairs(child_a, child_b, false, max_distance_sq, visit);
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            visit_pairs(child, node_b, false, max_distance_sq, visit);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            visit_pairs(node_a, child, false, max_distance_sq, visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn spiral(count: usize, spacing: f32) -> Vec<Vec2> {
        (0..count)
            .map(|index| {
                let angle = (index as f32) * 0.618_034 * std::f32::consts::TAU;
                let radius = spacing * (index as f32).sqrt();
                vec2(angle.cos(), angle.sin()) * radius
            })
            .collect()
    }

    fn normalized(a: usize, b: usize) -> (usize, usize) {
        if a < b { (a, b) } else { (b, a) }
    }

    #[test]
    fn candidate_pairs_cover_every_close_pair_once() {
        let positions = spiral(300, 14.0);
        let cutoff = 60.0;
        let tree = QuadNode::build(&positions).unwrap();

        let mut seen = HashSet::new();
        let mut duplicates = 0;
        for_each_candidate_pair(&tree, cutoff, &mut |a, b| {
            assert_ne!(a, b);
            if !seen.insert(normalized(a, b)) {
                duplicates += 1;
            }
        });
        assert_eq!(duplicates, 0);

        for a in 0..positions.len() {
            for b in (a + 1)..positions.len() {
                if (positions[a] - positions[b]).length() < cutoff {
                    assert!(seen.contains(&(a, b)), "missing close pair {a}-{b}");
                }
            }
        }
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let positions = vec![vec2(5.0, 5.0); 40];
        let tree = QuadNode::build(&positions).unwrap();
        let mut count = 0;
        for_each_candidate_pair(&tree, 1.0, &mut |_, _| count += 1);
        assert_eq!(count, 40 * 39 / 2);
    }

    #[test]
    fn non_finite_positions_build_nothing() {
        assert!(QuadNode::build(&[vec2(f32::NAN, 0.0)]).is_none());
        assert!(QuadNode::build(&[]).is_none());
    }

    fn leaf_indices(node: &QuadNode) -> usize {
        let below = node
            .children
            .iter()
            .flatten()
            .map(|child| leaf_indices(child))
            .sum::<usize>();
        node.indices.len() + below
    }

    fn depth(node: &QuadNode) -> usize {
        node.children
            .iter()
            .flatten()
            .map(|child| 1 + depth(child))
            .max()
            .unwrap_or(0)
    }

    fn grid(count: usize) -> Vec<Vec2> {
        (0..count)
            .map(|index| vec2((index % 4) as f32 * 90.0, (index / 4) as f32 * 70.0))
            .collect()
    }

    #[test]
    fn leaves_split_only_above_capacity() {
        let full = QuadNode::build(&grid(QUADTREE_LEAF_CAPACITY)).unwrap();
        assert!(full.is_leaf());
        assert_eq!(full.indices.len(), QUADTREE_LEAF_CAPACITY);

        let over = QuadNode::build(&grid(QUADTREE_LEAF_CAPACITY + 1)).unwrap();
        assert!(!over.is_leaf());
        assert!(over.indices.is_empty());
        assert_eq!(leaf_indices(&over), QUADTREE_LEAF_CAPACITY + 1);
    }

    #[test]
    fn max_depth_keeps_crowded_cells_as_leaves() {
        let positions = spiral(60, 20.0);
        let bounds = QuadBounds::from_points(&positions).unwrap();
        let all = (0..positions.len()).collect::<Vec<_>>();

        let capped = QuadNode::build_node(bounds, all.clone(), &positions, QUADTREE_MAX_DEPTH);
        assert!(capped.is_leaf());
        assert_eq!(capped.indices.len(), positions.len());

        let last_split = QuadNode::build_node(bounds, all, &positions, QUADTREE_MAX_DEPTH - 1);
        assert!(!last_split.is_leaf());
        assert!(last_split.children.iter().flatten().all(|child| child.is_leaf()));
        assert_eq!(leaf_indices(&last_split), positions.len());
    }

    #[test]
    fn neighbours_just_inside_the_cutoff_are_found_across_cells() {
        let cutoff = 50.0;
        let positions = (0..40)
            .map(|index| vec2(index as f32 * 49.9, 0.0))
            .collect::<Vec<_>>();
        let tree = QuadNode::build(&positions).unwrap();
        assert!(depth(&tree) >= 2);
        assert!(depth(&tree) <= QUADTREE_MAX_DEPTH);

        let mut seen = HashSet::new();
        for_each_candidate_pair(&tree, cutoff, &mut |a, b| {
            seen.insert(normalized(a, b));
        });

        for index in 1..positions.len() {
            assert!(seen.contains(&(index - 1, index)), "missing neighbour {index}");
        }
        // far cells are pruned
        assert!(seen.len() < positions.len() * (positions.len() - 1) / 2);
        assert!(!seen.contains(&(0, positions.len() - 1)));
    }
}

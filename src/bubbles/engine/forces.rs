use eframe::egui::{Vec2, vec2};

use super::super::{ContainerSize, clamp_to_container};
use super::quadtree::QuadNode;

#[derive(Clone, Copy)]
pub(super) struct RepulsionParams {
    pub(super) strength: f32,
    pub(super) softening: f32,
    pub(super) theta: f32,
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) padding: f32,
    pub(super) max_distance_sq: f32,
}

/// Per-pass position corrections gathered from overlapping pairs.
#[derive(Default)]
pub(super) struct CollisionScratch {
    pub(super) shifts: Vec<Vec2>,
    pub(super) contacts: Vec<u32>,
    pub(super) max_overlap: f32,
}

impl CollisionScratch {
    pub(super) fn reset(&mut self, count: usize) {
        self.shifts.clear();
        self.shifts.resize(count, Vec2::ZERO);
        self.contacts.clear();
        self.contacts.resize(count, 0);
        self.max_overlap = 0.0;
    }
}

fn pair_direction(delta: Vec2, distance: f32, from: usize, to: usize) -> Vec2 {
    if distance > 0.0001 {
        delta / distance
    } else {
        let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
        vec2(angle.cos(), angle.sin())
    }
}

fn repulsion_between(point_a: Vec2, point_b: Vec2, weight_b: f32, params: RepulsionParams) -> Vec2 {
    let delta = point_a - point_b;
    let distance_sq = delta.length_sq();
    let distance = distance_sq.sqrt();
    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        vec2(1.0, 0.0)
    };
    direction * (params.strength * weight_b / (distance_sq + params.softening))
}

pub(super) fn accumulate_repulsion_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    weights: &[f32],
    params: RepulsionParams,
    force: &mut Vec2,
) {
    if node.weight <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }
            *force += repulsion_between(point, positions[other_index], weights[other_index], params);
        }
        return;
    }

    let delta = point - node.center_of_mass;
    let distance_sq = delta.length_sq().max(0.0001);
    let distance = distance_sq.sqrt();
    let can_approximate = !node.bounds.contains(point)
        && ((node.bounds.side_length() / distance) < params.theta)
        && node.count > 1;

    if can_approximate {
        let direction = delta / distance;
        *force += direction * (params.strength * node.weight / (distance_sq + params.softening));
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_repulsion_for_node(child, index, positions, weights, params, force);
    }
}

/// Records the correction for one pair if it sits closer than its radii plus padding.
/// The larger bubble moves less.
fn separate_pair(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    scratch: &mut CollisionScratch,
) {
    let delta = positions[from] - positions[to];
    let distance = delta.length();
    let min_distance = radii[from] + radii[to] + params.padding;
    if distance >= min_distance {
        return;
    }

    let overlap = min_distance - distance;
    let direction = pair_direction(delta, distance, from, to);
    let from_weight = radii[from] * radii[from];
    let to_weight = radii[to] * radii[to];
    let total = (from_weight + to_weight).max(f32::EPSILON);

    scratch.shifts[from] += direction * overlap * (to_weight / total);
    scratch.shifts[to] -= direction * overlap * (from_weight / total);
    scratch.contacts[from] += 1;
    scratch.contacts[to] += 1;
    scratch.max_overlap = scratch.max_overlap.max(overlap);
}

pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    scratch: &mut CollisionScratch,
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    separate_pair(from, to, positions, radii, params, scratch);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    separate_pair(from, to, positions, radii, params, scratch);
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

            accumulate_collision_pairs(child_a, child_a, true, positions, radii, params, scratch);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_ref() else {
                    continue;
                };
                accumulate_collision_pairs(
                    child_a, child_b, false, positions, radii, params, scratch,
                );
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
            accumulate_collision_pairs(child, node_b, false, positions, radii, params, scratch);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, params, scratch);
        }
    }
}

/// One Gauss-Seidel sweep over every pair: each correction lands before the
/// next pair is measured, and when a wall stops one bubble its partner takes
/// the rest of the separation. Returns the largest overlap met in the sweep.
pub(super) fn separate_in_sequence(
    positions: &mut [Vec2],
    radii: &[f32],
    padding: f32,
    container: ContainerSize,
) -> f32 {
    let mut max_overlap = 0.0_f32;

    for from in 0..positions.len() {
        for to in (from + 1)..positions.len() {
            let delta = positions[from] - positions[to];
            let min_distance = radii[from] + radii[to] + padding;
            if delta.x.abs() >= min_distance || delta.y.abs() >= min_distance {
                continue;
            }
            let distance = delta.length();
            if distance >= min_distance {
                continue;
            }

            let overlap = min_distance - distance;
            max_overlap = max_overlap.max(overlap);
            let direction = pair_direction(delta, distance, from, to);
            let from_weight = radii[from] * radii[from];
            let to_weight = radii[to] * radii[to];
            let from_share = to_weight / (from_weight + to_weight).max(f32::EPSILON);

            let from_before = positions[from];
            positions[from] = clamp_to_container(
                from_before + direction * (overlap * from_share),
                radii[from],
                container,
            );
            let remaining = overlap - (positions[from] - from_before).dot(direction);

            let to_before = positions[to];
            positions[to] =
                clamp_to_container(to_before - direction * remaining, radii[to], container);
            let blocked = remaining - (to_before - positions[to]).dot(direction);
            if blocked > 0.001 {
                positions[from] = clamp_to_container(
                    positions[from] + direction * blocked,
                    radii[from],
                    container,
                );
            }
        }
    }

    max_overlap
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(positions: &[Vec2], radii: &[f32], padding: f32) -> CollisionScratch {
        let weights = radii.iter().map(|radius| radius * radius).collect::<Vec<_>>();
        let tree = QuadNode::build(positions, &weights).unwrap();
        let max_radius = radii.iter().copied().fold(0.0, f32::max);
        let reach = max_radius * 2.0 + padding;
        let mut scratch = CollisionScratch::default();
        scratch.reset(positions.len());
        accumulate_collision_pairs(
            &tree,
            &tree,
            true,
            positions,
            radii,
            CollisionParams {
                padding,
                max_distance_sq: reach * reach,
            },
            &mut scratch,
        );
        scratch
    }

    #[test]
    fn quadtree_pairs_match_brute_force() {
        let positions = (0..40)
            .map(|index| {
                let angle = index as f32 * 2.4;
                vec2(300.0 + angle.cos() * index as f32 * 6.0, 300.0 + angle.sin() * index as f32 * 6.0)
            })
            .collect::<Vec<_>>();
        let radii = (0..40).map(|index| 10.0 + (index % 5) as f32 * 4.0).collect::<Vec<_>>();

        let from_tree = collect(&positions, &radii, 2.0);

        let mut brute = CollisionScratch::default();
        brute.reset(positions.len());
        let params = CollisionParams {
            padding: 2.0,
            max_distance_sq: f32::INFINITY,
        };
        for from in 0..positions.len() {
            for to in (from + 1)..positions.len() {
                separate_pair(from, to, &positions, &radii, params, &mut brute);
            }
        }

        assert_eq!(from_tree.contacts, brute.contacts);
        assert!((from_tree.max_overlap - brute.max_overlap).abs() < 1e-3);
        for (tree_shift, brute_shift) in from_tree.shifts.iter().zip(&brute.shifts) {
            assert!((*tree_shift - *brute_shift).length() < 1e-2);
        }
    }

    #[test]
    fn overlapping_pair_is_pushed_apart_by_the_full_overlap() {
        let positions = [vec2(100.0, 100.0), vec2(110.0, 100.0)];
        let scratch = collect(&positions, &[10.0, 10.0], 2.0);

        assert_eq!(scratch.contacts, [1, 1]);
        assert!((scratch.max_overlap - 12.0).abs() < 1e-4);
        assert!((scratch.shifts[0].x + 6.0).abs() < 1e-4);
        assert!((scratch.shifts[1].x - 6.0).abs() < 1e-4);
    }

    #[test]
    fn coincident_centres_still_separate() {
        let positions = [vec2(50.0, 50.0), vec2(50.0, 50.0)];
        let scratch = collect(&positions, &[8.0, 8.0], 0.0);
        assert!(scratch.shifts[0].length() > 1.0);
        assert!((scratch.shifts[0] + scratch.shifts[1]).length() < 1e-4);
    }

    #[test]
    fn repulsion_pushes_away_from_neighbours() {
        let positions = [vec2(0.0, 0.0), vec2(30.0, 0.0)];
        let weights = [100.0, 100.0];
        let tree = QuadNode::build(&positions, &weights).unwrap();
        let params = RepulsionParams {
            strength: 1.0,
            softening: 10.0,
            theta: 0.7,
        };

        let mut force = Vec2::ZERO;
        accumulate_repulsion_for_node(&tree, 0, &positions, &weights, params, &mut force);
        assert!(force.x < 0.0);
        assert_eq!(force.y, 0.0);
    }

    #[test]
    fn sequential_sweep_hands_the_push_to_the_free_bubble_at_a_wall() {
        let container = ContainerSize::new(200.0, 200.0);
        let mut positions = [vec2(10.0, 100.0), vec2(25.0, 100.0)];
        let radii = [10.0, 10.0];

        let overlap = separate_in_sequence(&mut positions, &radii, 2.0, container);
        assert!((overlap - 7.0).abs() < 1e-4);
        assert_eq!(positions[0], vec2(10.0, 100.0));
        assert!((positions[1].x - 32.0).abs() < 1e-3);
        assert_eq!(separate_in_sequence(&mut positions, &radii, 2.0, container), 0.0);
    }

    #[test]
    fn sequential_sweeps_clear_a_crowded_row() {
        let container = ContainerSize::new(400.0, 120.0);
        let mut positions = (0..8)
            .map(|index| vec2(180.0 + index as f32 * 5.0, 60.0 + (index % 2) as f32))
            .collect::<Vec<_>>();
        let radii = [20.0; 8];

        let mut overlap = f32::INFINITY;
        for _ in 0..400 {
            overlap = separate_in_sequence(&mut positions, &radii, 2.0, container);
            if overlap <= 0.5 {
                break;
            }
        }
        assert!(overlap <= 0.5, "sweeps stalled at {overlap}");
        for from in 0..positions.len() {
            for to in (from + 1)..positions.len() {
                assert!((positions[from] - positions[to]).length() >= 40.0);
            }
        }
    }
}

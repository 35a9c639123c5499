//! Iterative relaxation of bubble positions.
//!
//! One engine lives per chart. Every `start` (new items, resize, profile
//! change) throws the previous run away and seeds a fresh one; runs are never
//! resumed or blended. The engine advances one step per `tick`, which the
//! chart calls once per frame, and emits container-clamped snapshots until the
//! run settles.

mod forces;
mod quadtree;

use std::time::Instant;

use eframe::egui::{Vec2, vec2};
use tracing::{debug, warn};

use super::prepare::{RenderItem, fit_radii, seed_position};
use super::profile::{LayoutProfile, MIN_ALPHA};
use super::risk::{horizontal_jitter, vertical_target};
use super::{ContainerSize, clamp_to_container};
use forces::{
    CollisionParams, CollisionScratch, RepulsionParams, accumulate_collision_pairs,
    accumulate_repulsion_for_node, separate_in_sequence,
};
use quadtree::QuadNode;

const BARNES_HUT_THETA: f32 = 0.72;
const REPULSION_SOFTENING: f32 = 400.0;
const VERTICAL_PULL: f32 = 1.0;
const MIN_HORIZONTAL_PULL: f32 = 0.05;
const MAX_HORIZONTAL_PULL: f32 = 0.15;
const SETTLE_PASS_LIMIT: usize = 2_000;
const SETTLE_STEP_LIMIT: usize = 200_000;
const SETTLE_FRAME_SECS: f32 = 1.0 / 60.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleReason {
    Converged,
    TimedOut,
    Empty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutPhase {
    /// Items are known but the container has no usable size yet.
    Seeded,
    Relaxing,
    Settled(SettleReason),
}

/// Container-clamped positions, index-aligned with [`ForceLayoutEngine::items`].
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutSnapshot {
    pub generation: u64,
    pub positions: Vec<Vec2>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LayoutEvent {
    Idle,
    Waiting,
    Frame(LayoutSnapshot),
    Settled(LayoutSnapshot),
}

struct LayoutRun {
    generation: u64,
    items: Vec<RenderItem>,
    velocities: Vec<Vec2>,
    targets: Vec<Vec2>,
    container: Option<ContainerSize>,
    phase: LayoutPhase,
    alpha: f32,
    /// Frame time handed to `tick`, summed.
    elapsed_secs: f32,
    started_at: Instant,
}

impl LayoutRun {
    fn begin(&mut self, container: ContainerSize, profile: &LayoutProfile, now: Instant) {
        self.container = Some(container);
        if let Some(scale) = fit_radii(&mut self.items, container, profile) {
            debug!(
                generation = self.generation,
                scale,
                width = container.width,
                "bubbles shrunk to fit the container"
            );
        }
        for (item, target) in self.items.iter_mut().zip(self.targets.iter_mut()) {
            item.position = seed_position(item, container, profile);
            *target = layout_target(item.risk, container, profile);
        }
        self.velocities.fill(Vec2::ZERO);
        self.alpha = 1.0;
        self.elapsed_secs = 0.0;
        self.started_at = now;
        self.phase = LayoutPhase::Relaxing;
    }

    fn snapshot(&self, container: ContainerSize) -> LayoutSnapshot {
        LayoutSnapshot {
            generation: self.generation,
            positions: self
                .items
                .iter()
                .map(|item| clamp_to_container(item.position, item.radius, container))
                .collect(),
        }
    }
}

#[derive(Default)]
struct PhysicsScratch {
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    weights: Vec<f32>,
    forces: Vec<Vec2>,
    collision: CollisionScratch,
}

impl PhysicsScratch {
    fn load(&mut self, items: &[RenderItem]) {
        self.positions.clear();
        self.radii.clear();
        self.weights.clear();
        for item in items {
            self.positions.push(item.position);
            self.radii.push(item.radius);
            self.weights.push((item.radius * item.radius).max(1.0));
        }
        self.forces.clear();
        self.forces.resize(items.len(), Vec2::ZERO);
    }

    fn store(&self, items: &mut [RenderItem]) {
        for (item, position) in items.iter_mut().zip(&self.positions) {
            item.position = *position;
        }
    }

    fn clamp_all(&mut self, container: ContainerSize) {
        for (position, radius) in self.positions.iter_mut().zip(&self.radii) {
            *position = clamp_to_container(*position, *radius, container);
        }
    }

    /// One Jacobi pass of overlap removal; returns the largest overlap found.
    fn project_collisions(&mut self, padding: f32) -> f32 {
        let count = self.positions.len();
        self.collision.reset(count);
        if count < 2 {
            return 0.0;
        }

        let Some(tree) = QuadNode::build(&self.positions, &self.weights) else {
            return 0.0;
        };
        let max_radius = self.radii.iter().copied().fold(0.0, f32::max);
        let reach = max_radius * 2.0 + padding;
        accumulate_collision_pairs(
            &tree,
            &tree,
            true,
            &self.positions,
            &self.radii,
            CollisionParams {
                padding,
                max_distance_sq: reach * reach,
            },
            &mut self.collision,
        );

        for ((position, shift), contacts) in self
            .positions
            .iter_mut()
            .zip(&self.collision.shifts)
            .zip(&self.collision.contacts)
        {
            if *contacts > 0 {
                *position += *shift / *contacts as f32;
            }
        }
        self.collision.max_overlap
    }
}

fn layout_target(risk: f32, container: ContainerSize, profile: &LayoutProfile) -> Vec2 {
    let spread = container.width * profile.horizontal_spread.clamp(0.0, 0.5);
    vec2(
        container.width * 0.5 + horizontal_jitter(risk) * spread,
        vertical_target(risk, container.height, profile),
    )
}

fn step(
    run: &mut LayoutRun,
    container: ContainerSize,
    profile: &LayoutProfile,
    scratch: &mut PhysicsScratch,
) {
    run.alpha *= 1.0 - profile.alpha_decay.clamp(0.0005, 0.5);
    let alpha = run.alpha;

    scratch.load(&run.items);
    let horizontal_pull = (profile.horizontal_pull_scale / container.width)
        .clamp(MIN_HORIZONTAL_PULL, MAX_HORIZONTAL_PULL);

    for ((force, position), target) in scratch
        .forces
        .iter_mut()
        .zip(&scratch.positions)
        .zip(&run.targets)
    {
        force.x += (target.x - position.x) * horizontal_pull * alpha;
        force.y += (target.y - position.y) * VERTICAL_PULL * alpha;
    }

    if scratch.positions.len() > 1
        && let Some(tree) = QuadNode::build(&scratch.positions, &scratch.weights)
    {
        let params = RepulsionParams {
            strength: profile.repulsion_scale.max(0.0) * alpha,
            softening: REPULSION_SOFTENING,
            theta: BARNES_HUT_THETA,
        };
        for (index, force) in scratch.forces.iter_mut().enumerate() {
            accumulate_repulsion_for_node(
                &tree,
                index,
                &scratch.positions,
                &scratch.weights,
                params,
                force,
            );
        }
    }

    let retention = profile.velocity_retention.clamp(0.0, 0.95);
    for ((velocity, position), force) in run
        .velocities
        .iter_mut()
        .zip(scratch.positions.iter_mut())
        .zip(&scratch.forces)
    {
        *velocity = (*velocity + *force) * retention;
        *position += *velocity;
    }
    scratch.clamp_all(container);

    let padding = profile.collision_padding.max(0.0);
    for _ in 0..profile.collision_iterations.clamp(1, 8) {
        scratch.project_collisions(padding);
        scratch.clamp_all(container);
    }

    scratch.store(&mut run.items);
}

/// Runs overlap removal alone until every pair clears its padding.
fn resolve_overlaps(
    run: &mut LayoutRun,
    container: ContainerSize,
    profile: &LayoutProfile,
    scratch: &mut PhysicsScratch,
) {
    let padding = profile.collision_padding.max(0.0);
    let tolerance = (padding * 0.5).max(0.05);

    scratch.load(&run.items);
    scratch.clamp_all(container);
    let mut remaining = 0.0;
    let mut passes = 0;
    while passes < SETTLE_PASS_LIMIT {
        passes += 1;
        remaining =
            separate_in_sequence(&mut scratch.positions, &scratch.radii, padding, container);
        if remaining <= tolerance {
            break;
        }
    }
    if remaining > tolerance {
        let covered = scratch
            .radii
            .iter()
            .map(|radius| std::f32::consts::PI * radius * radius)
            .sum::<f32>()
            / (container.width * container.height);
        warn!(
            generation = run.generation,
            overlap = remaining,
            passes,
            covered,
            "bubbles still overlap after settling"
        );
    }
    scratch.store(&mut run.items);
}

pub struct ForceLayoutEngine {
    profile: LayoutProfile,
    run: Option<LayoutRun>,
    last_generation: u64,
    scratch: PhysicsScratch,
}

impl ForceLayoutEngine {
    pub fn new(profile: LayoutProfile) -> Self {
        Self {
            profile,
            run: None,
            last_generation: 0,
            scratch: PhysicsScratch::default(),
        }
    }

    pub fn profile(&self) -> &LayoutProfile {
        &self.profile
    }

    /// Swapping the profile invalidates the current run; callers re-prepare items.
    pub fn set_profile(&mut self, profile: LayoutProfile) {
        self.cancel();
        self.profile = profile;
    }

    /// Discards any previous run and seeds a new one. Returns its generation.
    pub fn start(&mut self, items: Vec<RenderItem>, container: Option<ContainerSize>) -> u64 {
        self.cancel();

        self.last_generation += 1;
        let generation = self.last_generation;
        let count = items.len();
        let mut run = LayoutRun {
            generation,
            items,
            velocities: vec![Vec2::ZERO; count],
            targets: vec![Vec2::ZERO; count],
            container: None,
            phase: LayoutPhase::Seeded,
            alpha: 1.0,
            elapsed_secs: 0.0,
            started_at: Instant::now(),
        };

        match container.filter(ContainerSize::is_usable) {
            Some(size) => {
                run.begin(size, &self.profile, Instant::now());
                debug!(
                    generation,
                    items = count,
                    width = size.width,
                    height = size.height,
                    "layout run started"
                );
            }
            None => {
                warn!(
                    generation,
                    items = count,
                    "layout container has no usable size; waiting for one"
                );
            }
        }

        self.run = Some(run);
        generation
    }

    /// Restarts the current items against a new container size.
    pub fn set_container(&mut self, container: ContainerSize) -> Option<u64> {
        let run = self.run.as_ref()?;
        if run.container == Some(container) {
            return None;
        }

        let items = self.run.take().map(|run| {
            if run.phase == LayoutPhase::Relaxing {
                debug!(generation = run.generation, "layout run cancelled by resize");
            }
            run.items
        })?;
        Some(self.start(items, Some(container)))
    }

    pub fn cancel(&mut self) {
        if let Some(run) = self.run.take()
            && run.phase == LayoutPhase::Relaxing
        {
            debug!(generation = run.generation, "layout run cancelled");
        }
    }

    /// Drops the run and all scratch buffers.
    pub fn dispose(&mut self) {
        self.cancel();
        self.scratch = PhysicsScratch::default();
    }

    pub fn phase(&self) -> Option<LayoutPhase> {
        self.run.as_ref().map(|run| run.phase)
    }

    pub fn generation(&self) -> Option<u64> {
        self.run.as_ref().map(|run| run.generation)
    }

    pub fn items(&self) -> &[RenderItem] {
        self.run.as_ref().map(|run| run.items.as_slice()).unwrap_or(&[])
    }

    pub fn snapshot(&self) -> Option<LayoutSnapshot> {
        let run = self.run.as_ref()?;
        run.container.map(|container| run.snapshot(container))
    }

    /// Advances the active run by one step.
    ///
    /// The time cap counts whichever is larger: the summed `delta_secs` or the
    /// wall-clock time since the run began.
    pub fn tick(&mut self, delta_secs: f32) -> LayoutEvent {
        self.tick_at(delta_secs, Instant::now())
    }

    fn tick_at(&mut self, delta_secs: f32, now: Instant) -> LayoutEvent {
        let Self {
            profile,
            run,
            scratch,
            ..
        } = self;
        let Some(run) = run.as_mut() else {
            return LayoutEvent::Idle;
        };

        match run.phase {
            LayoutPhase::Seeded => return LayoutEvent::Waiting,
            LayoutPhase::Settled(_) => return LayoutEvent::Idle,
            LayoutPhase::Relaxing => {}
        }
        let Some(container) = run.container else {
            return LayoutEvent::Waiting;
        };

        let reason = if run.items.is_empty() {
            Some(SettleReason::Empty)
        } else {
            step(run, container, profile, scratch);
            if delta_secs.is_finite() {
                run.elapsed_secs += delta_secs.max(0.0);
            }
            let wall_secs = now.saturating_duration_since(run.started_at).as_secs_f32();
            run.elapsed_secs = run.elapsed_secs.max(wall_secs);

            if run.alpha < profile.alpha_min.max(MIN_ALPHA) {
                Some(SettleReason::Converged)
            } else if profile
                .settle_timeout_secs
                .is_some_and(|limit| run.elapsed_secs >= limit)
            {
                Some(SettleReason::TimedOut)
            } else {
                None
            }
        };

        let Some(reason) = reason else {
            return LayoutEvent::Frame(run.snapshot(container));
        };

        resolve_overlaps(run, container, profile, scratch);
        run.phase = LayoutPhase::Settled(reason);
        debug!(
            generation = run.generation,
            ?reason,
            elapsed_secs = run.elapsed_secs,
            "layout run settled"
        );
        LayoutEvent::Settled(run.snapshot(container))
    }

    /// Steps the active run to completion and returns its terminal snapshot.
    pub fn settle(&mut self) -> Option<LayoutSnapshot> {
        for _ in 0..SETTLE_STEP_LIMIT {
            match self.tick(SETTLE_FRAME_SECS) {
                LayoutEvent::Settled(snapshot) => return Some(snapshot),
                LayoutEvent::Frame(_) => {}
                LayoutEvent::Idle => {
                    return match self.phase() {
                        Some(LayoutPhase::Settled(_)) => self.snapshot(),
                        _ => None,
                    };
                }
                LayoutEvent::Waiting => return None,
            }
        }
        None
    }
}

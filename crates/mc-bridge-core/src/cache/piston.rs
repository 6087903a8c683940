//! Moving pistons and the push they apply to the player.

use std::collections::HashMap;

use mc_bridge_proto::types::{BlockPos, Vec3};

/// Largest push a piston may apply per axis in one tick.
pub const MAX_DISPLACEMENT: f32 = 0.51;

/// Java pistons take two ticks to move.
const PROGRESS_PER_TICK: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PistonAction {
    Extending,
    Retracting,
}

/// Block action direction parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Facing {
    pub fn from_java(param: u8) -> Option<Self> {
        Some(match param {
            0 => Self::Down,
            1 => Self::Up,
            2 => Self::North,
            3 => Self::South,
            4 => Self::West,
            5 => Self::East,
            _ => return None,
        })
    }

    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            Self::Down => (0, -1, 0),
            Self::Up => (0, 1, 0),
            Self::North => (0, 0, -1),
            Self::South => (0, 0, 1),
            Self::West => (-1, 0, 0),
            Self::East => (1, 0, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PistonState {
    pub facing: Facing,
    pub action: PistonAction,
    pub sticky: bool,
    /// 0.0 at the start of the move, 1.0 when done.
    pub progress: f32,
}

impl PistonState {
    pub fn new(facing: Facing, action: PistonAction, sticky: bool) -> Self {
        Self {
            facing,
            action,
            sticky,
            progress: 0.0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.progress >= 1.0
    }

    /// Block the moving head occupies.
    pub fn head(&self, base: BlockPos) -> BlockPos {
        let (dx, dy, dz) = self.facing.offset();
        base.offset(dx, dy, dz)
    }
}

#[derive(Debug, Default)]
pub struct PistonCache {
    pistons: HashMap<BlockPos, PistonState>,
    displacement: Vec3,
}

fn clamp(v: f32) -> f32 {
    v.clamp(-MAX_DISPLACEMENT, MAX_DISPLACEMENT)
}

impl PistonCache {
    pub fn update(&mut self, pos: BlockPos, state: PistonState) {
        self.pistons.insert(pos, state);
    }

    pub fn get(&self, pos: BlockPos) -> Option<&PistonState> {
        self.pistons.get(&pos)
    }

    pub fn remove(&mut self, pos: BlockPos) -> Option<PistonState> {
        self.pistons.remove(&pos)
    }

    pub fn len(&self) -> usize {
        self.pistons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pistons.is_empty()
    }

    /// Adds to this tick's push, each axis clamped.
    pub fn displace_player(&mut self, delta: Vec3) {
        self.displacement = Vec3::new(
            clamp(self.displacement.x + delta.x),
            clamp(self.displacement.y + delta.y),
            clamp(self.displacement.z + delta.z),
        );
    }

    pub fn displacement(&self) -> Vec3 {
        self.displacement
    }

    pub fn take_displacement(&mut self) -> Vec3 {
        std::mem::take(&mut self.displacement)
    }

    /// Advances every piston, pushes a player standing in an extending head
    /// and drops finished pistons, returning their positions.
    pub fn tick(&mut self, player: Vec3) -> Vec<BlockPos> {
        let feet = BlockPos::new(
            player.x.floor() as i32,
            player.y.floor() as i32,
            player.z.floor() as i32,
        );
        let mut pushes = Vec::new();
        for (pos, state) in self.pistons.iter_mut() {
            state.progress = (state.progress + PROGRESS_PER_TICK).min(1.0);
            let head = state.head(*pos);
            let touches = head == feet || head == feet.offset(0, 1, 0);
            if touches && state.action == PistonAction::Extending {
                let (dx, dy, dz) = state.facing.offset();
                pushes.push(Vec3::new(
                    dx as f32 * PROGRESS_PER_TICK,
                    dy as f32 * PROGRESS_PER_TICK,
                    dz as f32 * PROGRESS_PER_TICK,
                ));
            }
        }
        for push in pushes {
            self.displace_player(push);
        }

        let mut finished: Vec<BlockPos> = self
            .pistons
            .iter()
            .filter(|(_, s)| s.is_done())
            .map(|(p, _)| *p)
            .collect();
        finished.sort();
        for pos in &finished {
            self.pistons.remove(pos);
        }
        finished
    }

    pub fn clear(&mut self) {
        self.pistons.clear();
        self.displacement = Vec3::default();
    }
}

use super::input::{ActionStates, InputAction};
use super::rendering::DrawList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    HardReset,
    Quit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(quit_requested: bool, actions: ActionStates) -> Self {
        Self {
            quit_requested,
            actions,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_held(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// True only on the tick the action went from released to held.
    pub fn is_pressed(&self, action: InputAction) -> bool {
        self.actions.is_pressed(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self.actions.set_pressed(action, false);
        self
    }

    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.actions.set(action, true);
        self.actions.set_pressed(action, true);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// World-space rectangle in pixels, top-left anchored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub position: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(position: Vec2, size: Vec2) -> Self {
        Self { position, size }
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.position.x < other.position.x + other.size.x
            && self.position.x + self.size.x > other.position.x
            && self.position.y < other.position.y + other.size.y
            && self.position.y + self.size.y > other.position.y
    }

    pub fn center(&self) -> Vec2 {
        Vec2 {
            x: self.position.x + self.size.x * 0.5,
            y: self.position.y + self.size.y * 0.5,
        }
    }
}

/// `position` is the world pixel shown at the viewport's top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
}

impl Camera2D {
    /// Centers on `focus`, clamped so the view never leaves `world_size`.
    pub fn follow(focus: Vec2, viewport: Vec2, world_size: Vec2) -> Self {
        let max_x = (world_size.x - viewport.x).max(0.0);
        let max_y = (world_size.y - viewport.y).max(0.0);
        Self {
            position: Vec2 {
                x: (focus.x - viewport.x * 0.5).clamp(0.0, max_x).round(),
                y: (focus.y - viewport.y * 0.5).clamp(0.0, max_y).round(),
            },
        }
    }
}

pub trait Scene {
    fn load(&mut self);
    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand;
    fn render(&self, frame: &mut DrawList);
    fn unload(&mut self) {}
    fn debug_title(&self) -> Option<String> {
        None
    }
}
